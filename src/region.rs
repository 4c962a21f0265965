use {
    crate::*,
    glam::IVec2,
    std::{collections::VecDeque, ops::Range},
    strum::IntoEnumIterator,
};

struct Region<T> {
    cell: T,
    pos_range: Range<u32>,
}

/// A full partition of a grid into its 4-connected regions of matching cells.
///
/// Region ids are dense and assigned in row-major order of each region's first cell. Positions
/// live in one shared arena, with each region owning a range of it.
pub struct RegionLabels<T> {
    ids: Grid2D<u32>,
    regions: Vec<Region<T>>,
    positions: Vec<IVec2>,
}

impl<T: Clone> RegionLabels<T> {
    /// Labels regions of cells matching their region's first cell under `is_same_region`.
    pub fn from_grid_by<E: Fn(&T, &T) -> bool>(grid: &Grid2D<T>, is_same_region: E) -> Self {
        let mut ids: Grid2D<u32> = Grid2D::default(grid.dimensions());

        ids.cells_mut().fill(INVALID_INDEX);

        let mut regions: Vec<Region<T>> = Vec::new();
        let mut positions: Vec<IVec2> = Vec::new();
        let mut queue: VecDeque<IVec2> = VecDeque::new();

        for pos in grid.iter_positions() {
            if ids.get(pos) != Some(&INVALID_INDEX) {
                continue;
            }

            let id: u32 = regions.len() as u32;
            let start: u32 = positions.len() as u32;
            let cell: &T = &grid.cells()[grid.index_from_pos(pos)];

            ids.set(pos, id);
            queue.push_back(pos);

            while let Some(pos) = queue.pop_front() {
                positions.push(pos);

                for dir in Direction::iter() {
                    let neighbor_pos: IVec2 = pos + dir.vec();

                    if ids.get(neighbor_pos) == Some(&INVALID_INDEX)
                        && grid
                            .get(neighbor_pos)
                            .map_or(false, |neighbor_cell| is_same_region(cell, neighbor_cell))
                    {
                        ids.set(neighbor_pos, id);
                        queue.push_back(neighbor_pos);
                    }
                }
            }

            regions.push(Region {
                cell: cell.clone(),
                pos_range: start..positions.len() as u32,
            });
        }

        Self {
            ids,
            regions,
            positions,
        }
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn dimensions(&self) -> IVec2 {
        self.ids.dimensions()
    }

    pub fn try_region_of(&self, pos: IVec2) -> Option<u32> {
        self.ids.get(pos).copied()
    }

    pub fn region_cell(&self, id: u32) -> &T {
        &self.regions[id as usize].cell
    }

    pub fn area(&self, id: u32) -> usize {
        let pos_range: &Range<u32> = &self.regions[id as usize].pos_range;

        (pos_range.end - pos_range.start) as usize
    }

    pub fn iter_region_positions(&self, id: u32) -> impl Iterator<Item = IVec2> + '_ {
        let pos_range: &Range<u32> = &self.regions[id as usize].pos_range;

        self.positions[pos_range.start as usize..pos_range.end as usize]
            .iter()
            .copied()
    }
}

impl<T: Clone + PartialEq> RegionLabels<T> {
    pub fn from_grid(grid: &Grid2D<T>) -> Self {
        Self::from_grid_by(grid, T::eq)
    }
}
