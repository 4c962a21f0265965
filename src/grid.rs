use {
    crate::Parse,
    glam::{BVec2, IVec2},
    nom::{
        character::complete::line_ending,
        combinator::{map, map_res, opt},
        error::{Error as NomError, ErrorKind as NomErrorKind},
        multi::many1_count,
        sequence::tuple,
        Err, IResult,
    },
    static_assertions::const_assert,
    std::{
        iter::Peekable,
        mem::transmute,
        ops::{Add, Range},
        str::{from_utf8_unchecked, Lines},
    },
    strum::{EnumCount, EnumIter, IntoEnumIterator},
};

#[derive(Clone, Copy, Debug, Default, EnumCount, EnumIter, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

// This guarantees we can safely convert from `u8` to `Direction` by masking the smallest 2 bits
const_assert!(Direction::COUNT == 4_usize);

impl Direction {
    pub const COUNT_U8: u8 = Self::COUNT as u8;
    pub const MASK: u8 = Self::COUNT_U8 - 1_u8;
    const HALF_COUNT: u8 = Self::COUNT_U8 / 2_u8;
    const PREV_DELTA: u8 = Self::COUNT_U8 - 1_u8;

    pub const VECS: [IVec2; Self::COUNT] = [
        Self::North.vec_internal(),
        Self::East.vec_internal(),
        Self::South.vec_internal(),
        Self::West.vec_internal(),
    ];

    pub const fn from_u8(value: u8) -> Self {
        // SAFETY: `value` is masked down into the range of valid discriminants.
        unsafe { transmute(value & Self::MASK) }
    }

    pub const fn vec(self) -> IVec2 {
        Self::VECS[self as usize]
    }

    pub const fn next(self) -> Self {
        Self::from_u8(self as u8 + 1_u8)
    }

    pub const fn prev(self) -> Self {
        Self::from_u8(self as u8 + Self::PREV_DELTA)
    }

    pub const fn rev(self) -> Self {
        Self::from_u8(self as u8 + Self::HALF_COUNT)
    }

    /// `North` points in the negative-y direction, since positions grow downward through the rows
    /// of a grid string.
    const fn vec_internal(self) -> IVec2 {
        match self {
            Self::North => IVec2::NEG_Y,
            Self::East => IVec2::X,
            Self::South => IVec2::Y,
            Self::West => IVec2::NEG_X,
        }
    }
}

impl Add<Turn> for Direction {
    type Output = Self;

    fn add(self, rhs: Turn) -> Self {
        (self as u8 + rhs as u8).into()
    }
}

impl Add<Rotation> for Direction {
    type Output = Self;

    fn add(self, rhs: Rotation) -> Self {
        (self as u8 + rhs as u8).into()
    }
}

impl From<u8> for Direction {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl TryFrom<IVec2> for Direction {
    type Error = ();

    fn try_from(vec: IVec2) -> Result<Self, Self::Error> {
        Self::iter().find(|dir| dir.vec() == vec).ok_or(())
    }
}

/// A change of heading, relative to the current heading.
///
/// The discriminants match `Direction`, such that adding a turn to a direction is a wrapping `u8`
/// addition of the discriminants.
#[derive(Clone, Copy, Debug, Default, EnumCount, EnumIter, Eq, PartialEq)]
#[repr(u8)]
pub enum Turn {
    Left = Direction::West as u8,
    #[default]
    Straight = Direction::North as u8,
    Right = Direction::East as u8,
    Reverse = Direction::South as u8,
}

const_assert!(Turn::COUNT == Direction::COUNT);

/// An absolute rotation by a whole number of quarter turns.
///
/// Grid positions have no fractional component, so these are the only rotations under which a
/// position grid stays a position grid.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum Rotation {
    #[default]
    Zero = Direction::North as u8,
    Quarter = Direction::East as u8,
    Half = Direction::South as u8,
    ThreeQuarters = Direction::West as u8,
}

#[derive(Debug, PartialEq)]
pub struct InvalidRotation(pub i32);

impl Rotation {
    pub const DEGREES_PER_QUARTER: i32 = 90_i32;
    pub const DEGREES_PER_FULL_TURN: i32 = 360_i32;

    pub const fn from_u8(value: u8) -> Self {
        // SAFETY: `value` is masked down into the range of valid discriminants.
        unsafe { transmute(value & Direction::MASK) }
    }

    /// With y growing downward, `perp` lands a quarter turn clockwise when rendered.
    pub fn rotate(self, vec: IVec2) -> IVec2 {
        match self {
            Self::Zero => vec,
            Self::Quarter => vec.perp(),
            Self::Half => -vec,
            Self::ThreeQuarters => -vec.perp(),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = InvalidRotation;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        if degrees % Self::DEGREES_PER_QUARTER != 0_i32 {
            Err(InvalidRotation(degrees))
        } else {
            Ok(Self::from_u8(
                (degrees.rem_euclid(Self::DEGREES_PER_FULL_TURN) / Self::DEGREES_PER_QUARTER)
                    as u8,
            ))
        }
    }
}

/// Implementing this trait certifies that the type is a single byte in size, and that all values
/// of the type are valid printable ASCII bytes.
///
/// # Safety
///
/// `From<Grid2D<T>> for String` transmutes a cell slice into a byte slice, then treats the bytes
/// as UTF-8 without checking them.
pub unsafe trait IsValidAscii {}

pub fn grid_2d_contains(pos: IVec2, dimensions: IVec2) -> bool {
    pos.cmpge(IVec2::ZERO) == BVec2::TRUE && pos.cmplt(dimensions) == BVec2::TRUE
}

pub fn grid_2d_try_index_from_pos_and_dimensions(pos: IVec2, dimensions: IVec2) -> Option<usize> {
    grid_2d_contains(pos, dimensions).then(|| (pos.y * dimensions.x + pos.x) as usize)
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone, Eq, PartialEq)]
pub struct Grid2D<T> {
    cells: Vec<T>,

    /// Should only contain non-negative components, but is signed for ease of use when iterating
    /// over positions.
    dimensions: IVec2,
}

impl<T> Grid2D<T> {
    pub fn try_from_cells_and_dimensions(cells: Vec<T>, dimensions: IVec2) -> Option<Self> {
        (dimensions.cmpge(IVec2::ZERO) == BVec2::TRUE
            && cells.len() == dimensions.x as usize * dimensions.y as usize)
            .then_some(Self { cells, dimensions })
    }

    pub fn default(dimensions: IVec2) -> Self
    where
        T: Default,
    {
        assert!(dimensions.cmpge(IVec2::ZERO) == BVec2::TRUE);

        let area: usize = dimensions.x as usize * dimensions.y as usize;
        let mut cells: Vec<T> = Vec::with_capacity(area);

        cells.resize_with(area, T::default);

        Self { cells, dimensions }
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    pub const fn dimensions(&self) -> IVec2 {
        self.dimensions
    }

    pub const fn area(&self) -> usize {
        (self.dimensions.x * self.dimensions.y) as usize
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        grid_2d_contains(pos, self.dimensions)
    }

    pub fn index_from_pos(&self, pos: IVec2) -> usize {
        (pos.y * self.dimensions.x + pos.x) as usize
    }

    pub fn try_index_from_pos(&self, pos: IVec2) -> Option<usize> {
        self.contains(pos).then(|| self.index_from_pos(pos))
    }

    pub fn pos_from_index(&self, index: usize) -> IVec2 {
        let index: i32 = index as i32;

        IVec2::new(index % self.dimensions.x, index / self.dimensions.x)
    }

    pub fn get(&self, pos: IVec2) -> Option<&T> {
        self.try_index_from_pos(pos).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, pos: IVec2) -> Option<&mut T> {
        self.try_index_from_pos(pos)
            .map(|index| &mut self.cells[index])
    }

    /// Panics if `pos` lies outside of the grid. Use `get_mut` when the position isn't known to be
    /// in bounds.
    pub fn set(&mut self, pos: IVec2, cell: T) {
        match self.get_mut(pos) {
            Some(old_cell) => *old_cell = cell,
            None => panic!(
                "position {pos} is out of bounds for dimensions {}",
                self.dimensions
            ),
        }
    }

    pub fn iter_positions(&self) -> impl Iterator<Item = IVec2> {
        let dimensions: IVec2 = self.dimensions;

        (0_i32..dimensions.y)
            .filter_map(move |y| {
                CellIter2D::try_from(IVec2::new(0_i32, y)..IVec2::new(dimensions.x, y)).ok()
            })
            .flatten()
    }

    pub fn iter_positions_with_cell<'a>(&'a self, cell: &'a T) -> impl Iterator<Item = IVec2> + 'a
    where
        T: PartialEq,
    {
        self.iter_positions()
            .filter(move |&pos| self.get(pos) == Some(cell))
    }

    /// The first matching position in row-major order, if any cell matches.
    pub fn try_find_position_with_cell(&self, cell: &T) -> Option<IVec2>
    where
        T: PartialEq,
    {
        self.iter_positions_with_cell(cell).next()
    }

    /// `None` both when no cell matches and when more than one does.
    pub fn try_find_single_position_with_cell(&self, cell: &T) -> Option<IVec2>
    where
        T: PartialEq,
    {
        self.iter_positions_with_cell(cell)
            .try_fold(None, |prev: Option<IVec2>, pos| match prev {
                None => Ok(Some(pos)),
                Some(_) => Err(()),
            })
            .ok()
            .flatten()
    }
}

#[allow(dead_code)]
#[derive(Debug, PartialEq)]
pub enum GridParseError<'s, E> {
    NoInitialToken,
    IsNotAscii(&'s str),
    InvalidLength { line: &'s str, expected_len: usize },
    CellParseError(E),
}

impl<'s, T: TryFrom<char>> TryFrom<&'s str> for Grid2D<T> {
    type Error = GridParseError<'s, T::Error>;

    fn try_from(grid_str: &'s str) -> Result<Self, Self::Error> {
        use GridParseError as Error;

        let mut lines: Peekable<Lines> = grid_str.lines().peekable();
        let expected_len: usize = lines.peek().ok_or(Error::NoInitialToken)?.len();
        let mut cells: Vec<T> = Vec::new();
        let mut height: i32 = 0_i32;

        for line in lines {
            if !line.is_ascii() {
                return Err(Error::IsNotAscii(line));
            }

            if line.len() != expected_len {
                return Err(Error::InvalidLength { line, expected_len });
            }

            for c in line.chars() {
                cells.push(T::try_from(c).map_err(Error::CellParseError)?);
            }

            height += 1_i32;
        }

        Ok(Self {
            cells,
            dimensions: IVec2::new(expected_len as i32, height),
        })
    }
}

impl<T: Parse> Parse for Grid2D<T> {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        let mut width: Option<usize> = None;
        let mut cells: Vec<T> = Vec::new();

        let (input, height): (&str, usize) = many1_count(map_res(
            tuple((
                many1_count(map(T::parse, |cell| cells.push(cell))),
                opt(line_ending),
            )),
            |(row_len, _)| match width {
                None => {
                    width = Some(row_len);

                    Ok(())
                }
                Some(width) if width == row_len => Ok(()),
                Some(_) => Err(()),
            },
        ))(input)?;

        let width: usize = width.unwrap_or_default();

        // A row that failed part-way through still pushed its cells before the length check
        // rejected it.
        if cells.len() != width * height {
            Err(Err::Failure(NomError::new(input, NomErrorKind::ManyMN)))
        } else {
            Ok((
                input,
                Self {
                    cells,
                    dimensions: IVec2::new(width as i32, height as i32),
                },
            ))
        }
    }
}

impl<T: IsValidAscii> From<Grid2D<T>> for String {
    fn from(grid: Grid2D<T>) -> Self {
        let width: usize = grid.dimensions.x as usize;

        if width == 0_usize {
            return String::new();
        }

        let mut string: String =
            String::with_capacity(grid.dimensions.y as usize * (width + 1_usize));

        // SAFETY: `T` implementing `IsValidAscii` guarantees single-byte cells holding valid
        // ASCII.
        let bytes: &[u8] = unsafe { transmute(grid.cells()) };

        for row in bytes.chunks_exact(width) {
            // SAFETY: see above.
            string.push_str(unsafe { from_utf8_unchecked(row) });
            string.push('\n');
        }

        string
    }
}

#[derive(Debug, PartialEq)]
pub enum CellIterFromRangeError {
    PositionsIdentical,
    PositionsNotAligned,
}

/// An iterator over the positions along an axis-aligned line segment, start inclusive, end
/// exclusive.
pub struct CellIter2D {
    curr: IVec2,
    end: IVec2,
    dir: Direction,
}

impl TryFrom<Range<IVec2>> for CellIter2D {
    type Error = CellIterFromRangeError;

    fn try_from(range: Range<IVec2>) -> Result<Self, Self::Error> {
        use CellIterFromRangeError as Error;

        let delta: IVec2 = range.end - range.start;

        if delta == IVec2::ZERO {
            Err(Error::PositionsIdentical)
        } else if delta.x != 0_i32 && delta.y != 0_i32 {
            Err(Error::PositionsNotAligned)
        } else {
            Ok(Self {
                curr: range.start,
                end: range.end,
                dir: Direction::try_from(delta.signum())
                    .map_err(|_| Error::PositionsNotAligned)?,
            })
        }
    }
}

impl Iterator for CellIter2D {
    type Item = IVec2;

    fn next(&mut self) -> Option<Self::Item> {
        (self.curr != self.end).then(|| {
            let pos: IVec2 = self.curr;

            self.curr += self.dir.vec();

            pos
        })
    }
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use {
        super::*,
        crate::define_cell,
        nom::{error::ErrorKind as NomErrorKind, Err},
        std::collections::HashSet,
    };

    define_cell! {
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
        enum Track {
            #[default]
            Empty = EMPTY = b'.',
            Rail = RAIL = b'#',
        }
    }

    const TRACK_GRID_STR: &'static str = "\
        .#.\n\
        ..#\n\
        ###\n";

    fn track_grid() -> Grid2D<Track> {
        use Track::{Empty as O, Rail as X};

        Grid2D::try_from_cells_and_dimensions(
            vec![O, X, O, O, O, X, X, X, X],
            IVec2::new(3_i32, 3_i32),
        )
        .unwrap()
    }

    #[test]
    fn test_direction_vecs() {
        assert_eq!(Direction::North.vec(), IVec2::NEG_Y);
        assert_eq!(Direction::East.vec(), IVec2::X);
        assert_eq!(Direction::South.vec(), IVec2::Y);
        assert_eq!(Direction::West.vec(), IVec2::NEG_X);

        for dir in Direction::iter() {
            assert_eq!(dir.next().prev(), dir);
            assert_eq!(dir.rev().rev(), dir);
            assert_eq!(Direction::try_from(dir.vec()), Ok(dir));
        }
    }

    #[test]
    fn test_direction_add_turn() {
        assert_eq!(Direction::North + Turn::Left, Direction::West);
        assert_eq!(Direction::North + Turn::Straight, Direction::North);
        assert_eq!(Direction::North + Turn::Right, Direction::East);
        assert_eq!(Direction::North + Turn::Reverse, Direction::South);

        for dir in Direction::iter() {
            assert_eq!(dir + Turn::Left, dir.prev());
            assert_eq!(dir + Turn::Right, dir.next());
            assert_eq!(dir + Turn::Reverse, dir.rev());
        }
    }

    #[test]
    fn test_rotation_try_from_degrees() {
        for (degrees, rotation) in [
            (0_i32, Rotation::Zero),
            (90_i32, Rotation::Quarter),
            (180_i32, Rotation::Half),
            (270_i32, Rotation::ThreeQuarters),
            (360_i32, Rotation::Zero),
            (450_i32, Rotation::Quarter),
            (-90_i32, Rotation::ThreeQuarters),
            (-180_i32, Rotation::Half),
            (-270_i32, Rotation::Quarter),
        ] {
            assert_eq!(Rotation::try_from(degrees), Ok(rotation));
        }

        for degrees in [45_i32, 1_i32, 91_i32, -89_i32] {
            assert_eq!(Rotation::try_from(degrees), Err(InvalidRotation(degrees)));
        }
    }

    #[test]
    fn test_rotation_rotate() {
        for dir in Direction::iter() {
            assert_eq!(Rotation::Zero.rotate(dir.vec()), dir.vec());
            assert_eq!(Rotation::Quarter.rotate(dir.vec()), dir.next().vec());
            assert_eq!(Rotation::Half.rotate(dir.vec()), dir.rev().vec());
            assert_eq!(Rotation::ThreeQuarters.rotate(dir.vec()), dir.prev().vec());

            for rotation in [
                Rotation::Zero,
                Rotation::Quarter,
                Rotation::Half,
                Rotation::ThreeQuarters,
            ] {
                assert_eq!(rotation.rotate(dir.vec()), (dir + rotation).vec());
            }
        }

        // A full turn in quarters is the identity.
        let vec: IVec2 = IVec2::new(5_i32, -3_i32);

        assert_eq!(
            Rotation::Quarter.rotate(Rotation::Quarter.rotate(Rotation::Half.rotate(vec))),
            vec
        );
    }

    #[test]
    fn test_grid_try_from_str() {
        assert_eq!(Grid2D::try_from(TRACK_GRID_STR), Ok(track_grid()));
        assert_eq!(
            Grid2D::<Track>::try_from(""),
            Err(GridParseError::NoInitialToken)
        );
        assert_eq!(
            Grid2D::<Track>::try_from(".#.\n..\n"),
            Err(GridParseError::InvalidLength {
                line: "..",
                expected_len: 3_usize
            })
        );
        assert_eq!(
            Grid2D::<Track>::try_from(".#.\n.\u{263A}.\n"),
            Err(GridParseError::IsNotAscii(".\u{263A}."))
        );
        assert_eq!(
            Grid2D::<Track>::try_from(".#.\n.x.\n"),
            Err(GridParseError::CellParseError(()))
        );
    }

    #[test]
    fn test_grid_parse() {
        assert_eq!(
            Grid2D::parse(TRACK_GRID_STR),
            Ok(("", track_grid()))
        );

        // A ragged row fails the whole parse instead of truncating it.
        assert!(matches!(
            Grid2D::<Track>::parse(".#.\n..\n"),
            Err(Err::Failure(_))
        ));
    }

    #[test]
    fn test_grid_string_from() {
        assert_eq!(String::from(track_grid()), TRACK_GRID_STR.to_owned());
    }

    #[test]
    fn test_grid_get_and_contains() {
        let mut grid: Grid2D<Track> = track_grid();

        assert!(grid.contains(IVec2::ZERO));
        assert!(grid.contains(IVec2::new(2_i32, 2_i32)));
        assert!(!grid.contains(IVec2::new(3_i32, 0_i32)));
        assert!(!grid.contains(IVec2::new(0_i32, -1_i32)));

        assert_eq!(grid.get(IVec2::new(1_i32, 0_i32)), Some(&Track::Rail));
        assert_eq!(grid.get(IVec2::new(0_i32, 1_i32)), Some(&Track::Empty));
        assert_eq!(grid.get(IVec2::new(-1_i32, 0_i32)), None);
        assert_eq!(grid.get(IVec2::new(0_i32, 3_i32)), None);

        grid.set(IVec2::ZERO, Track::Rail);

        assert_eq!(grid.get(IVec2::ZERO), Some(&Track::Rail));
    }

    #[test]
    #[should_panic]
    fn test_grid_set_out_of_bounds() {
        track_grid().set(IVec2::new(3_i32, 0_i32), Track::Rail);
    }

    #[test]
    fn test_grid_index_round_trip() {
        let grid: Grid2D<Track> = track_grid();

        for (index, pos) in grid.iter_positions().enumerate() {
            assert_eq!(grid.index_from_pos(pos), index);
            assert_eq!(grid.pos_from_index(index), pos);
            assert_eq!(grid.try_index_from_pos(pos), Some(index));
            assert_eq!(
                grid_2d_try_index_from_pos_and_dimensions(pos, grid.dimensions()),
                Some(index)
            );
        }

        assert_eq!(grid.try_index_from_pos(IVec2::new(3_i32, 0_i32)), None);
    }

    #[test]
    fn test_grid_iter_positions_is_row_major() {
        let positions: Vec<IVec2> = track_grid().iter_positions().take(4_usize).collect();

        assert_eq!(
            positions,
            vec![
                IVec2::new(0_i32, 0_i32),
                IVec2::new(1_i32, 0_i32),
                IVec2::new(2_i32, 0_i32),
                IVec2::new(0_i32, 1_i32),
            ]
        );
    }

    #[test]
    fn test_grid_find_positions_with_cell() {
        let grid: Grid2D<Track> = track_grid();

        assert_eq!(
            grid.try_find_position_with_cell(&Track::Rail),
            Some(IVec2::new(1_i32, 0_i32))
        );
        assert_eq!(
            grid.iter_positions_with_cell(&Track::Rail).count(),
            4_usize
        );
        assert_eq!(grid.try_find_single_position_with_cell(&Track::Rail), None);

        let single_rail: Grid2D<Track> = Grid2D::try_from("..\n.#\n").unwrap();

        assert_eq!(
            single_rail.try_find_single_position_with_cell(&Track::Rail),
            Some(IVec2::new(1_i32, 1_i32))
        );
        assert_eq!(
            single_rail.try_find_position_with_cell(&Track::Rail),
            Some(IVec2::new(1_i32, 1_i32))
        );
    }

    #[test]
    fn test_cell_iter() {
        let positions: Vec<IVec2> =
            CellIter2D::try_from(IVec2::ZERO..IVec2::new(0_i32, 3_i32))
                .unwrap()
                .collect();

        assert_eq!(
            positions,
            vec![
                IVec2::new(0_i32, 0_i32),
                IVec2::new(0_i32, 1_i32),
                IVec2::new(0_i32, 2_i32),
            ]
        );

        assert_eq!(
            CellIter2D::try_from(IVec2::ZERO..IVec2::ZERO).map(|_| ()),
            Err(CellIterFromRangeError::PositionsIdentical)
        );
        assert_eq!(
            CellIter2D::try_from(IVec2::ZERO..IVec2::new(1_i32, 2_i32)).map(|_| ()),
            Err(CellIterFromRangeError::PositionsNotAligned)
        );
    }
}
