use {
    crate::*,
    bitvec::{bitvec, slice::BitSlice, vec::BitVec},
    glam::IVec2,
    strum::{EnumCount, IntoEnumIterator},
};

/// A search state: a position in a grid plus the heading used to enter it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PosAndDir {
    pub pos: IVec2,
    pub dir: Direction,
}

impl PosAndDir {
    pub const fn new(pos: IVec2, dir: Direction) -> Self {
        Self { pos, dir }
    }
}

/// A grid graph whose vertices are `PosAndDir` states and whose edges fuse a heading change with
/// one step in the new heading.
///
/// An edge exists for each `Turn` whose destination cell is in bounds, passable, and clear of the
/// obstacle overlay. Costs count 1 for the step plus `turn_cost` per quarter turn, so a reverse
/// pays for two.
pub struct HeadingGraph<'g, T, P: Fn(&T) -> bool> {
    grid: &'g Grid2D<T>,
    is_passable: P,
    obstacles: Option<&'g BitSlice>,
    source: PosAndDir,
    turn_cost: u32,
}

impl<'g, T, P: Fn(&T) -> bool> HeadingGraph<'g, T, P> {
    pub fn new(grid: &'g Grid2D<T>, is_passable: P, source: PosAndDir, turn_cost: u32) -> Self {
        Self::new_internal(grid, is_passable, None, source, turn_cost)
    }

    /// `obstacles` is indexed by grid cell index. A set bit closes the cell without touching the
    /// grid itself.
    pub fn with_obstacles(
        grid: &'g Grid2D<T>,
        is_passable: P,
        obstacles: &'g BitSlice,
        source: PosAndDir,
        turn_cost: u32,
    ) -> Self {
        Self::new_internal(grid, is_passable, Some(obstacles), source, turn_cost)
    }

    fn new_internal(
        grid: &'g Grid2D<T>,
        is_passable: P,
        obstacles: Option<&'g BitSlice>,
        source: PosAndDir,
        turn_cost: u32,
    ) -> Self {
        assert!(grid.area() <= INVALID_INDEX as usize / Direction::COUNT);
        assert!(obstacles.map_or(true, |obstacles| obstacles.len() == grid.area()));
        assert!(grid.contains(source.pos));

        Self {
            grid,
            is_passable,
            obstacles,
            source,
            turn_cost,
        }
    }

    pub fn vertex_from_pos_and_dir(&self, pos_and_dir: PosAndDir) -> u32 {
        (self.grid.index_from_pos(pos_and_dir.pos) * Direction::COUNT
            + pos_and_dir.dir as usize) as u32
    }

    pub fn pos_and_dir_from_vertex(&self, vertex: u32) -> PosAndDir {
        let vertex: usize = vertex as usize;

        PosAndDir::new(
            self.grid.pos_from_index(vertex / Direction::COUNT),
            Direction::from_u8((vertex % Direction::COUNT) as u8),
        )
    }

    /// The four vertices at `pos`, one per heading. `pos` must be in bounds.
    pub fn iter_vertices_at(&self, pos: IVec2) -> impl Iterator<Item = u32> + '_ {
        Direction::iter().map(move |dir| self.vertex_from_pos_and_dir(PosAndDir::new(pos, dir)))
    }

    pub fn move_cost(&self, turn: Turn) -> u32 {
        match turn {
            Turn::Straight => 1_u32,
            Turn::Left | Turn::Right => self.turn_cost + 1_u32,
            Turn::Reverse => 2_u32 * self.turn_cost + 1_u32,
        }
    }

    /// Best cost over the four headings at `target`, along with the tying vertices for use as
    /// reconstruction seeds. `None` when `target` cannot be reached.
    pub fn try_target_cost_and_seeds(
        &self,
        tree: &ShortestPathTree<u32>,
        target: IVec2,
    ) -> Option<(u32, Vec<u32>)> {
        tree.try_min_distance_and_vertices(self.iter_vertices_at(target))
    }

    /// The distinct positions lying on at least one optimal route to the seeds, in row-major
    /// order.
    pub fn optimal_positions(&self, tree: &ShortestPathTree<u32>, seeds: &[u32]) -> Vec<IVec2> {
        let visited: BitVec = PathReconstructor::new(tree, seeds).visited_vertices();
        let mut position_set: BitVec = bitvec![0; self.grid.area()];

        for vertex in visited.iter_ones() {
            position_set.set(vertex / Direction::COUNT, true);
        }

        position_set
            .iter_ones()
            .map(|index| self.grid.pos_from_index(index))
            .collect()
    }

    /// One optimal route to the seeds, source first.
    pub fn try_optimal_path(
        &self,
        tree: &ShortestPathTree<u32>,
        seeds: &[u32],
    ) -> Option<Vec<PosAndDir>> {
        PathReconstructor::new(tree, seeds)
            .iter_paths()
            .next()
            .map(|path| {
                path.into_iter()
                    .map(|vertex| self.pos_and_dir_from_vertex(vertex))
                    .collect()
            })
    }

    fn is_open(&self, pos: IVec2) -> bool {
        self.grid.get(pos).map_or(false, |cell| {
            (self.is_passable)(cell)
                && self
                    .obstacles
                    .map_or(true, |obstacles| !obstacles[self.grid.index_from_pos(pos)])
        })
    }
}

impl<'g, T, P: Fn(&T) -> bool> ShortestPathGraph for HeadingGraph<'g, T, P> {
    type Cost = u32;

    fn vertex_count(&self) -> usize {
        self.grid.area() * Direction::COUNT
    }

    fn source(&self) -> u32 {
        self.vertex_from_pos_and_dir(self.source)
    }

    fn neighbors(&self, vertex: u32, neighbors: &mut Vec<OpenSetElement<u32, u32>>) {
        let pos_and_dir: PosAndDir = self.pos_and_dir_from_vertex(vertex);

        neighbors.clear();
        neighbors.extend(Turn::iter().filter_map(|turn| {
            let dir: Direction = pos_and_dir.dir + turn;
            let pos: IVec2 = pos_and_dir.pos + dir.vec();

            self.is_open(pos).then(|| {
                OpenSetElement(
                    self.vertex_from_pos_and_dir(PosAndDir::new(pos, dir)),
                    self.move_cost(turn),
                )
            })
        }));
    }
}
