use {
    crate::*,
    bitvec::prelude::*,
    derive_deref::Deref,
    glam::IVec2,
    nom::{
        bytes::complete::tag, character::complete::line_ending, combinator::map, error::Error,
        multi::separated_list0, sequence::separated_pair, Err, IResult,
    },
    rayon::iter::{IntoParallelIterator, ParallelIterator},
};

define_cell! {
    #[repr(u8)]
    #[cfg_attr(test, derive(Debug))]
    #[derive(Clone, Copy, Default, PartialEq)]
    enum Cell {
        #[default]
        Open = OPEN = b'.',
        Blocked = BLOCKED = b'#',
        Route = ROUTE = b'O',
    }
}

type BlockadeGraph<'g> = HeadingGraph<'g, Cell, fn(&Cell) -> bool>;

/// The obstacle positions in the order they fall.
#[cfg_attr(test, derive(Debug, PartialEq))]
#[derive(Deref)]
pub struct Solution(Vec<IVec2>);

impl Solution {
    const FALLEN_OBSTACLE_COUNT: usize = 1024_usize;
    const DIMENSIONS: IVec2 = IVec2::new(71_i32, 71_i32);
    const START: IVec2 = IVec2::ZERO;
    const END: IVec2 = IVec2::new(Self::DIMENSIONS.x - 1_i32, Self::DIMENSIONS.y - 1_i32);

    fn steps_in_route(route: &[IVec2]) -> usize {
        route.len().saturating_sub(1_usize)
    }

    fn heading_graph<'g>(
        grid: &'g Grid2D<Cell>,
        overlay: &'g BitSlice,
        start: IVec2,
    ) -> BlockadeGraph<'g> {
        // Zero turn cost makes the entry heading irrelevant.
        HeadingGraph::with_obstacles(
            grid,
            |cell: &Cell| *cell != Cell::Blocked,
            overlay,
            PosAndDir::new(start, Direction::East),
            0_u32,
        )
    }

    fn fallen_overlay(&self, fallen_obstacle_count: usize, dimensions: IVec2) -> BitVec {
        assert!(dimensions.cmpge(IVec2::ZERO).all());

        let mut overlay: BitVec = bitvec![0; dimensions.x as usize * dimensions.y as usize];

        for obstacle in &self[..fallen_obstacle_count.min(self.len())] {
            if let Some(index) = grid_2d_try_index_from_pos_and_dimensions(*obstacle, dimensions) {
                overlay.set(index, true);
            }
        }

        overlay
    }

    fn try_route(
        &self,
        overlay: &BitSlice,
        dimensions: IVec2,
        start: IVec2,
        end: IVec2,
    ) -> Option<Vec<IVec2>> {
        let grid: Grid2D<Cell> = Grid2D::default(dimensions);
        let graph: BlockadeGraph = Self::heading_graph(&grid, overlay, start);
        let tree: ShortestPathTree<u32> = graph.run();
        let (_, seeds): (u32, Vec<u32>) = graph.try_target_cost_and_seeds(&tree, end)?;

        graph.try_optimal_path(&tree, &seeds).map(|route| {
            route
                .into_iter()
                .map(|pos_and_dir| pos_and_dir.pos)
                .collect()
        })
    }

    fn grid_string_from_route(
        &self,
        overlay: &BitSlice,
        dimensions: IVec2,
        route: &[IVec2],
    ) -> String {
        let mut grid: Grid2D<Cell> = Grid2D::default(dimensions);

        for index in overlay.iter_ones() {
            let pos: IVec2 = grid.pos_from_index(index);

            grid.set(pos, Cell::Blocked);
        }

        for pos in route.iter().copied() {
            grid.set(pos, Cell::Route);
        }

        grid.into()
    }

    fn try_min_steps(
        &self,
        fallen_obstacle_count: usize,
        dimensions: IVec2,
        start: IVec2,
        end: IVec2,
    ) -> Option<usize> {
        let overlay: BitVec = self.fallen_overlay(fallen_obstacle_count, dimensions);
        let grid: Grid2D<Cell> = Grid2D::default(dimensions);
        let graph: BlockadeGraph = Self::heading_graph(&grid, &overlay, start);

        graph
            .try_target_cost_and_seeds(&graph.run(), end)
            .map(|(cost, _)| cost as usize)
    }

    fn try_min_steps_and_grid_string(
        &self,
        fallen_obstacle_count: usize,
        dimensions: IVec2,
        start: IVec2,
        end: IVec2,
    ) -> Option<(usize, String)> {
        let overlay: BitVec = self.fallen_overlay(fallen_obstacle_count, dimensions);

        self.try_route(&overlay, dimensions, start, end).map(|route| {
            (
                Self::steps_in_route(&route),
                self.grid_string_from_route(&overlay, dimensions, &route),
            )
        })
    }

    fn is_exit_cut_off(
        &self,
        grid: &Grid2D<Cell>,
        fallen_obstacle_count: usize,
        start: IVec2,
        end: IVec2,
    ) -> bool {
        let overlay: BitVec = self.fallen_overlay(fallen_obstacle_count, grid.dimensions());
        let graph: BlockadeGraph = Self::heading_graph(grid, &overlay, start);

        graph
            .try_target_cost_and_seeds(&graph.run(), end)
            .is_none()
    }

    /// The index into the fall order of the first obstacle that cuts the exit off from the start.
    ///
    /// Obstacles only ever close cells, so reachability is monotone over prefixes of the fall
    /// order and `find_first` agrees with a serial scan. The trials share one base grid; each owns
    /// its overlay and search tables.
    fn try_first_blocking_index(
        &self,
        dimensions: IVec2,
        start: IVec2,
        end: IVec2,
    ) -> Option<usize> {
        let grid: Grid2D<Cell> = Grid2D::default(dimensions);

        (1_usize..=self.len())
            .into_par_iter()
            .find_first(|&fallen_obstacle_count| {
                self.is_exit_cut_off(&grid, fallen_obstacle_count, start, end)
            })
            .map(|fallen_obstacle_count| fallen_obstacle_count - 1_usize)
    }

    fn blocking_pos_string(&self, index: usize) -> String {
        let pos: IVec2 = self[index];

        format!("{},{}", pos.x, pos.y)
    }

    fn try_first_blocking_pos_string(
        &self,
        dimensions: IVec2,
        start: IVec2,
        end: IVec2,
    ) -> Option<String> {
        self.try_first_blocking_index(dimensions, start, end)
            .map(|index| self.blocking_pos_string(index))
    }

    fn try_first_blocking_pos_string_and_previous_route_grid_string(
        &self,
        dimensions: IVec2,
        start: IVec2,
        end: IVec2,
    ) -> Option<(String, String)> {
        self.try_first_blocking_index(dimensions, start, end)
            .map(|index| {
                (
                    self.blocking_pos_string(index),
                    // `index` is one short of the first cutting prefix, so a route exists.
                    self.try_min_steps_and_grid_string(index, dimensions, start, end)
                        .unwrap()
                        .1,
                )
            })
    }
}

impl Parse for Solution {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map(
            separated_list0(
                line_ending,
                map(
                    separated_pair(parse_integer, tag(","), parse_integer),
                    |(x, y)| IVec2 { x, y },
                ),
            ),
            Self,
        )(input)
    }
}

impl RunQuestions for Solution {
    /// With a zero turn premium every move costs one step, so the heading component is just along
    /// for the ride.
    fn q1_internal(&mut self, args: &QuestionArgs) {
        if !args.verbose {
            dbg!(self.try_min_steps(
                Self::FALLEN_OBSTACLE_COUNT,
                Self::DIMENSIONS,
                Self::START,
                Self::END
            ));
        } else if let Some((min_steps, grid_string)) = self.try_min_steps_and_grid_string(
            Self::FALLEN_OBSTACLE_COUNT,
            Self::DIMENSIONS,
            Self::START,
            Self::END,
        ) {
            dbg!(min_steps);
            println!("{grid_string}");
        } else {
            eprintln!("Failed to find route to exit.");
        }
    }

    /// Each prefix trial stands alone, which makes this embarrassingly parallel.
    fn q2_internal(&mut self, args: &QuestionArgs) {
        if !args.verbose {
            dbg!(self.try_first_blocking_pos_string(Self::DIMENSIONS, Self::START, Self::END));
        } else if let Some((first_blocking_pos_string, previous_route_grid_string)) = self
            .try_first_blocking_pos_string_and_previous_route_grid_string(
                Self::DIMENSIONS,
                Self::START,
                Self::END,
            )
        {
            dbg!(first_blocking_pos_string);
            println!("{previous_route_grid_string}");
        } else {
            eprintln!("Failed to find an obstacle cutting off the exit.");
        }
    }
}

impl<'i> TryFrom<&'i str> for Solution {
    type Error = Err<Error<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::sync::OnceLock};

    const SOLUTION_STRS: &'static [&'static str] = &["\
        5,4\n\
        4,2\n\
        4,5\n\
        3,0\n\
        2,1\n\
        6,3\n\
        2,4\n\
        1,5\n\
        0,6\n\
        3,3\n\
        2,6\n\
        5,1\n\
        1,2\n\
        5,5\n\
        2,5\n\
        6,5\n\
        1,4\n\
        0,4\n\
        6,4\n\
        1,1\n\
        6,1\n\
        1,0\n\
        0,5\n\
        1,6\n\
        2,0\n"];
    const FALLEN_OBSTACLE_COUNT: usize = 12_usize;
    const DIMENSIONS: IVec2 = IVec2::new(7_i32, 7_i32);
    const START: IVec2 = IVec2::ZERO;
    const END: IVec2 = IVec2::new(DIMENSIONS.x - 1_i32, DIMENSIONS.y - 1_i32);

    fn solution(index: usize) -> &'static Solution {
        static ONCE_LOCK: OnceLock<Vec<Solution>> = OnceLock::new();

        &ONCE_LOCK.get_or_init(|| {
            vec![Solution(vec![
                (5_i32, 4_i32).into(),
                (4_i32, 2_i32).into(),
                (4_i32, 5_i32).into(),
                (3_i32, 0_i32).into(),
                (2_i32, 1_i32).into(),
                (6_i32, 3_i32).into(),
                (2_i32, 4_i32).into(),
                (1_i32, 5_i32).into(),
                (0_i32, 6_i32).into(),
                (3_i32, 3_i32).into(),
                (2_i32, 6_i32).into(),
                (5_i32, 1_i32).into(),
                (1_i32, 2_i32).into(),
                (5_i32, 5_i32).into(),
                (2_i32, 5_i32).into(),
                (6_i32, 5_i32).into(),
                (1_i32, 4_i32).into(),
                (0_i32, 4_i32).into(),
                (6_i32, 4_i32).into(),
                (1_i32, 1_i32).into(),
                (6_i32, 1_i32).into(),
                (1_i32, 0_i32).into(),
                (0_i32, 5_i32).into(),
                (1_i32, 6_i32).into(),
                (2_i32, 0_i32).into(),
            ])]
        })[index]
    }

    #[test]
    fn test_try_from_str() {
        for (index, solution_str) in SOLUTION_STRS.iter().copied().enumerate() {
            assert_eq!(
                Solution::try_from(solution_str).as_ref(),
                Ok(solution(index))
            );
        }
    }

    #[test]
    fn test_try_min_steps() {
        for (index, min_steps) in [Some(22_usize)].into_iter().enumerate() {
            assert_eq!(
                solution(index).try_min_steps(FALLEN_OBSTACLE_COUNT, DIMENSIONS, START, END),
                min_steps
            );
        }
    }

    #[test]
    fn test_try_min_steps_with_nothing_fallen() {
        // An empty overlay leaves the straightest routes open.
        assert_eq!(
            solution(0_usize).try_min_steps(0_usize, DIMENSIONS, START, END),
            Some(12_usize)
        );
    }

    #[test]
    fn test_is_exit_cut_off() {
        let solution: &Solution = solution(0_usize);
        let grid: Grid2D<Cell> = Grid2D::default(DIMENSIONS);

        assert!(!solution.is_exit_cut_off(&grid, 20_usize, START, END));
        assert!(solution.is_exit_cut_off(&grid, 21_usize, START, END));
    }

    #[test]
    fn test_try_first_blocking_pos_string() {
        for (index, first_blocking_pos_string) in
            [Some(String::from("6,1"))].into_iter().enumerate()
        {
            assert_eq!(
                solution(index).try_first_blocking_pos_string(DIMENSIONS, START, END),
                first_blocking_pos_string
            );
        }
    }

    #[test]
    fn test_input() {
        // let args: Args = Args::try_parse_from(["gridpath", "-s", "blockade"]).unwrap();

        // Solution::both(&args);
    }
}
