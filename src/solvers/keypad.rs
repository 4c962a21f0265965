use {
    crate::*,
    derive_deref::Deref,
    glam::IVec2,
    nom::{
        character::complete::line_ending,
        combinator::{map, opt, verify},
        error::Error,
        multi::many1,
        sequence::{terminated, tuple},
        Err, IResult,
    },
    std::{cell::RefCell, rc::Rc},
};

define_cell! {
    /// A key on either pad. `Gap` marks the dead corner a robot arm must never hover over.
    #[repr(u8)]
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    enum Key {
        #[default]
        Gap = GAP = b' ',
        Activate = ACTIVATE = b'A',
        Zero = ZERO = b'0',
        One = ONE = b'1',
        Two = TWO = b'2',
        Three = THREE = b'3',
        Four = FOUR = b'4',
        Five = FIVE = b'5',
        Six = SIX = b'6',
        Seven = SEVEN = b'7',
        Eight = EIGHT = b'8',
        Nine = NINE = b'9',
        Up = UP = b'^',
        Down = DOWN = b'v',
        Left = LEFT = b'<',
        Right = RIGHT = b'>',
    }
}

impl Key {
    fn is_digit(self) -> bool {
        matches!(self as u8, Self::ZERO..=Self::NINE)
    }

    fn parse_digit<'i>(input: &'i str) -> IResult<&'i str, Self> {
        verify(Self::parse, |key: &Self| key.is_digit())(input)
    }

    fn parse_activate<'i>(input: &'i str) -> IResult<&'i str, Self> {
        verify(Self::parse, |key: &Self| *key == Self::Activate)(input)
    }

    fn string_from_iter<I: IntoIterator<Item = Self>>(keys: I) -> String {
        keys.into_iter().map(|key| key as u8 as char).collect()
    }
}

impl From<Direction> for Key {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::North => Self::Up,
            Direction::East => Self::Right,
            Direction::South => Self::Down,
            Direction::West => Self::Left,
        }
    }
}

type PadGraph<'g> = HeadingGraph<'g, Key, fn(&Key) -> bool>;

/// One keypad, numeric or directional, as a grid the robot arm glides over.
struct Pad(Grid2D<Key>);

impl Pad {
    const NUMERIC_STR: &'static str = "789\n456\n123\n 0A\n";
    const DIRECTIONAL_STR: &'static str = " ^A\n<v>\n";

    fn numeric() -> Self {
        Self(Self::NUMERIC_STR.try_into().unwrap())
    }

    fn directional() -> Self {
        Self(Self::DIRECTIONAL_STR.try_into().unwrap())
    }

    fn key_pos(&self, key: Key) -> IVec2 {
        // Every key this gets called with lives on the pad.
        self.0.try_find_position_with_cell(&key).unwrap()
    }

    /// All minimal-step move sequences from hovering over `from` to pressing `to`, each ending in
    /// `Activate`.
    ///
    /// Zero turn cost leaves every minimal-step route tied, so the exhaustive tree holds the full
    /// candidate set, and the entry heading at the source can't bias it.
    fn press_sequences(&self, from: Key, to: Key) -> Vec<Vec<Key>> {
        let source: IVec2 = self.key_pos(from);
        let target: IVec2 = self.key_pos(to);
        let graph: PadGraph = HeadingGraph::new(
            &self.0,
            |key: &Key| *key != Key::Gap,
            PosAndDir::new(source, Direction::East),
            0_u32,
        );
        let tree: ShortestPathTree<u32> = graph.run();

        // No key is walled off from another on either pad.
        let (_, seeds): (u32, Vec<u32>) = graph.try_target_cost_and_seeds(&tree, target).unwrap();

        PathReconstructor::new(&tree, &seeds)
            .iter_paths()
            .map(|path| {
                path.into_iter()
                    .skip(1_usize)
                    .map(|vertex| graph.pos_and_dir_from_vertex(vertex).dir.into())
                    .chain([Key::Activate])
                    .collect()
            })
            .collect()
    }
}

type PressCountMemo = Rc<RefCell<Memo<(Key, Key, usize), u64>>>;

/// The numeric pad at the bottom of a stack of directional pads, each layer driving the robot arm
/// on the layer below.
struct PadStack {
    numeric: Pad,
    directional: Pad,
}

impl PadStack {
    fn new() -> Self {
        Self {
            numeric: Pad::numeric(),
            directional: Pad::directional(),
        }
    }

    fn keys_press_count<I: IntoIterator<Item = Key>>(
        &self,
        pad: &Pad,
        keys: I,
        pads_above: usize,
        memo: &PressCountMemo,
    ) -> u64 {
        keys.into_iter()
            .fold((Key::Activate, 0_u64), |(from, press_count), to| {
                (
                    to,
                    press_count + self.pair_press_count(pad, from, to, pads_above, memo),
                )
            })
            .1
    }

    /// The fewest presses `pads_above` layers up that move `pad`'s arm from `from` to `to` and
    /// press it.
    ///
    /// Digit pairs only occur on the numeric pad and arrow pairs only on the directional pad, so
    /// the pair plus the layer count is a sufficient memo key.
    fn pair_press_count(
        &self,
        pad: &Pad,
        from: Key,
        to: Key,
        pads_above: usize,
        memo: &PressCountMemo,
    ) -> u64 {
        if pads_above == 0_usize {
            // The typist presses `to` directly; getting there is free.
            return 1_u64;
        }

        let memo_key: (Key, Key, usize) = (from, to, pads_above);
        let cached: Option<u64> = memo.borrow().get(&memo_key).copied();

        if let Some(press_count) = cached {
            return press_count;
        }

        let press_count: u64 = pad
            .press_sequences(from, to)
            .into_iter()
            .map(|sequence| {
                self.keys_press_count(&self.directional, sequence, pads_above - 1_usize, memo)
            })
            .min()
            .unwrap();

        memo.borrow_mut().insert(memo_key, press_count);

        press_count
    }
}

/// One door code, digits then the trailing `Activate`.
#[cfg_attr(test, derive(Debug, PartialEq))]
#[derive(Deref)]
struct Code(Vec<Key>);

impl Code {
    fn press_count(
        &self,
        pad_stack: &PadStack,
        directional_pad_count: usize,
        memo: &PressCountMemo,
    ) -> u64 {
        pad_stack.keys_press_count(
            &pad_stack.numeric,
            self.iter().copied(),
            directional_pad_count,
            memo,
        )
    }

    /// The sequence typed on the first directional pad, for checking a code's expansion by hand.
    /// Requires at least one directional pad.
    fn first_layer_keys(
        &self,
        pad_stack: &PadStack,
        directional_pad_count: usize,
        memo: &PressCountMemo,
    ) -> Vec<Key> {
        let mut keys: Vec<Key> = Vec::new();
        let mut from: Key = Key::Activate;

        for to in self.iter().copied() {
            keys.extend(
                pad_stack
                    .numeric
                    .press_sequences(from, to)
                    .into_iter()
                    .min_by_key(|sequence| {
                        pad_stack.keys_press_count(
                            &pad_stack.directional,
                            sequence.iter().copied(),
                            directional_pad_count - 1_usize,
                            memo,
                        )
                    })
                    .unwrap(),
            );
            from = to;
        }

        keys
    }
}

impl Parse for Code {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map(
            tuple((many1(Key::parse_digit), Key::parse_activate)),
            |(mut keys, activate): (Vec<Key>, Key)| {
                keys.push(activate);

                Self(keys)
            },
        )(input)
    }
}

/// The door codes to type.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Solution(Vec<Code>);

impl Solution {
    const DIRECTIONAL_PAD_COUNT: usize = 3_usize;
    const EXTENDED_DIRECTIONAL_PAD_COUNT: usize = 26_usize;

    /// One press count per code, in input order, all served by one memo.
    fn press_counts(&self, directional_pad_count: usize) -> Vec<u64> {
        let pad_stack: PadStack = PadStack::new();
        let memo: PressCountMemo = Rc::new(RefCell::new(Memo::new()));

        self.0
            .iter()
            .map(|code| code.press_count(&pad_stack, directional_pad_count, &memo))
            .collect()
    }
}

impl Parse for Solution {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map(many1(terminated(Code::parse, opt(line_ending))), Self)(input)
    }
}

impl RunQuestions for Solution {
    /// Picking any minimal sequence per pair isn't enough on its own, since layers above can split
    /// the tie. Each candidate gets costed through the whole stack instead.
    fn q1_internal(&mut self, args: &QuestionArgs) {
        if args.verbose {
            let pad_stack: PadStack = PadStack::new();
            let memo: PressCountMemo = Rc::new(RefCell::new(Memo::new()));

            for code in &self.0 {
                println!(
                    "{}: {}",
                    Key::string_from_iter(code.iter().copied()),
                    Key::string_from_iter(code.first_layer_keys(
                        &pad_stack,
                        Self::DIRECTIONAL_PAD_COUNT,
                        &memo
                    ))
                );
            }
        }

        dbg!(self.press_counts(Self::DIRECTIONAL_PAD_COUNT));
    }

    /// Twenty-six layers would be hopeless to walk key by key. Counting pairs through the memo
    /// keeps it linear in the pair alphabet.
    fn q2_internal(&mut self, _args: &QuestionArgs) {
        dbg!(self.press_counts(Self::EXTENDED_DIRECTIONAL_PAD_COUNT));
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
    use {
        super::*,
        std::{collections::HashSet, sync::OnceLock},
    };

    const SOLUTION_STRS: &'static [&'static str] = &["\
        029A\n\
        980A\n\
        179A\n\
        456A\n\
        379A\n"];

    fn solution(index: usize) -> &'static Solution {
        use Key::{Activate, Eight, Five, Four, Nine, One, Seven, Six, Three, Two, Zero};

        static ONCE_LOCK: OnceLock<Vec<Solution>> = OnceLock::new();

        &ONCE_LOCK.get_or_init(|| {
            vec![Solution(vec![
                Code(vec![Zero, Two, Nine, Activate]),
                Code(vec![Nine, Eight, Zero, Activate]),
                Code(vec![One, Seven, Nine, Activate]),
                Code(vec![Four, Five, Six, Activate]),
                Code(vec![Three, Seven, Nine, Activate]),
            ])]
        })[index]
    }

    fn sequence_strings(pad: &Pad, from: Key, to: Key) -> HashSet<String> {
        pad.press_sequences(from, to)
            .into_iter()
            .map(Key::string_from_iter)
            .collect()
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
    fn test_press_sequences() {
        let numeric: Pad = Pad::numeric();
        let directional: Pad = Pad::directional();

        // The third permutation of two lefts and an up crosses the numeric pad's gap.
        assert_eq!(
            sequence_strings(&numeric, Key::Activate, Key::One),
            ["<^<A", "^<<A"].into_iter().map(String::from).collect()
        );

        // Likewise, leading with two lefts crosses the directional pad's gap.
        assert_eq!(
            sequence_strings(&directional, Key::Activate, Key::Left),
            ["v<<A", "<v<A"].into_iter().map(String::from).collect()
        );

        assert_eq!(
            sequence_strings(&numeric, Key::Zero, Key::Activate),
            [">A"].into_iter().map(String::from).collect()
        );

        // Pressing the same key again takes no movement at all.
        assert_eq!(
            sequence_strings(&numeric, Key::Activate, Key::Activate),
            ["A"].into_iter().map(String::from).collect()
        );
    }

    #[test]
    fn test_press_counts() {
        // With no directional pads the typist presses the numeric keys themselves.
        assert_eq!(solution(0_usize).press_counts(0_usize), vec![4_u64; 5_usize]);
        assert_eq!(
            solution(0_usize).press_counts(1_usize),
            vec![12_u64, 12_u64, 14_u64, 12_u64, 14_u64]
        );
        assert_eq!(
            solution(0_usize).press_counts(Solution::DIRECTIONAL_PAD_COUNT),
            vec![68_u64, 60_u64, 68_u64, 64_u64, 64_u64]
        );
        assert_eq!(
            solution(0_usize).press_counts(Solution::EXTENDED_DIRECTIONAL_PAD_COUNT),
            vec![
                82050061710_u64,
                72242026390_u64,
                81251039228_u64,
                80786362258_u64,
                77985628636_u64
            ]
        );
    }

    #[test]
    fn test_first_layer_keys() {
        let pad_stack: PadStack = PadStack::new();
        let memo: PressCountMemo = Rc::new(RefCell::new(Memo::new()));

        // With a single directional pad, the chosen first-layer sequence is exactly what gets
        // typed.
        for (code, press_count) in solution(0_usize)
            .0
            .iter()
            .zip([12_usize, 12_usize, 14_usize, 12_usize, 14_usize])
        {
            assert_eq!(
                code.first_layer_keys(&pad_stack, 1_usize, &memo).len(),
                press_count
            );
        }
    }

    #[test]
    fn test_input() {
        // let args: Args = Args::try_parse_from(["gridpath", "-s", "keypad"]).unwrap();

        // Solution::both(&args);
    }
}
