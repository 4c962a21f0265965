use {
    crate::*,
    glam::IVec2,
    nom::{combinator::map_opt, error::Error, Err, IResult},
};

define_cell! {
    #[repr(u8)]
    #[cfg_attr(test, derive(Debug))]
    #[derive(Clone, Copy, Default, PartialEq)]
    enum Cell {
        #[default]
        Empty = EMPTY = b'.',
        Wall = WALL = b'#',
        Start = START = b'S',
        End = END = b'E',
        North = NORTH = b'^',
        East = EAST = b'>',
        South = SOUTH = b'v',
        West = WEST = b'<',
        OnBestPath = ON_BEST_PATH = b'O',
    }
}

impl Cell {
    /// Arrows and best-path markers only appear in rendered output, never in input.
    fn is_render_only(self) -> bool {
        !matches!(self, Self::Empty | Self::Wall | Self::Start | Self::End)
    }
}

impl From<Direction> for Cell {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::North => Self::North,
            Direction::East => Self::East,
            Direction::South => Self::South,
            Direction::West => Self::West,
        }
    }
}

type MazeGraph<'s> = HeadingGraph<'s, Cell, fn(&Cell) -> bool>;

/// A maze of walls with a single start and end cell. Routes step between adjacent cells, paying a
/// premium for every quarter turn along the way.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Solution {
    grid: Grid2D<Cell>,
    start: IVec2,
    end: IVec2,
}

impl Solution {
    const START_DIR: Direction = Direction::East;
    const TURN_COST: u32 = 1000_u32;

    fn heading_graph(&self) -> MazeGraph {
        HeadingGraph::new(
            &self.grid,
            |cell: &Cell| *cell != Cell::Wall,
            PosAndDir::new(self.start, Self::START_DIR),
            Self::TURN_COST,
        )
    }

    fn try_min_score(&self) -> Option<u32> {
        let graph: MazeGraph = self.heading_graph();

        graph
            .try_target_cost_and_seeds(&graph.run(), self.end)
            .map(|(cost, _)| cost)
    }

    fn try_min_score_and_string(&self) -> Option<(u32, String)> {
        let graph: MazeGraph = self.heading_graph();
        let tree: ShortestPathTree<u32> = graph.run();
        let (score, seeds): (u32, Vec<u32>) = graph.try_target_cost_and_seeds(&tree, self.end)?;
        let path: Vec<PosAndDir> = graph.try_optimal_path(&tree, &seeds)?;

        let mut grid: Grid2D<Cell> = self.grid.clone();

        for pos_and_dir in path {
            grid.set(pos_and_dir.pos, pos_and_dir.dir.into());
        }

        grid.set(self.start, Cell::Start);
        grid.set(self.end, Cell::End);

        Some((score, grid.into()))
    }

    fn try_best_path_positions(&self) -> Option<Vec<IVec2>> {
        let graph: MazeGraph = self.heading_graph();
        let tree: ShortestPathTree<u32> = graph.run();
        let (_, seeds): (u32, Vec<u32>) = graph.try_target_cost_and_seeds(&tree, self.end)?;

        Some(graph.optimal_positions(&tree, &seeds))
    }

    fn try_best_path_position_count(&self) -> Option<usize> {
        self.try_best_path_positions()
            .map(|positions| positions.len())
    }

    fn try_best_path_position_count_and_string(&self) -> Option<(usize, String)> {
        self.try_best_path_positions().map(|positions| {
            let count: usize = positions.len();
            let mut grid: Grid2D<Cell> = self.grid.clone();

            for pos in positions {
                grid.set(pos, Cell::OnBestPath);
            }

            (count, grid.into())
        })
    }
}

impl Parse for Solution {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map_opt(Grid2D::parse, |mut grid: Grid2D<Cell>| {
            grid.cells()
                .iter()
                .all(|cell| !cell.is_render_only())
                .then(|| {
                    grid.try_find_single_position_with_cell(&Cell::Start)
                        .zip(grid.try_find_single_position_with_cell(&Cell::End))
                })
                .flatten()
                .map(|(start, end)| {
                    grid.set(start, Cell::Empty);
                    grid.set(end, Cell::Empty);

                    Self { grid, start, end }
                })
        })(input)
    }
}

impl RunQuestions for Solution {
    /// The turn premium dwarfs the step cost, so the cheap routes hug long straight corridors.
    fn q1_internal(&mut self, args: &QuestionArgs) {
        if !args.verbose {
            dbg!(self.try_min_score());
        } else if let Some((min_score, grid_string)) = self.try_min_score_and_string() {
            dbg!(min_score);
            println!("{grid_string}");
        } else {
            eprintln!("Failed to find route to end.");
        }
    }

    /// The tree already holds every tied predecessor, so this is just a union over the seeds.
    fn q2_internal(&mut self, args: &QuestionArgs) {
        if !args.verbose {
            dbg!(self.try_best_path_position_count());
        } else if let Some((best_path_position_count, grid_string)) =
            self.try_best_path_position_count_and_string()
        {
            dbg!(best_path_position_count);
            println!("{grid_string}");
        } else {
            eprintln!("Failed to find route to end.");
        }
    }
}

impl<'i> TryFrom<&'i str> for Solution {
    type Error = Err<Error<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}
