pub use self::{grid::*, heading::*, memo::*, region::*, search::*};

use {
    clap::Parser,
    memmap::Mmap,
    nom::{
        bytes::complete::tag,
        character::complete::digit1,
        combinator::{map_res, opt, recognize},
        sequence::tuple,
        IResult,
    },
    num::Integer,
    std::{
        any::type_name,
        fmt::Debug,
        fs::File,
        io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
        str::{from_utf8, FromStr},
    },
};

mod grid;
mod heading;
mod memo;
mod region;
mod search;

pub mod solvers;

/// A type parseable from a `nom` `&str` input.
pub trait Parse: Sized {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self>;
}

pub fn parse_integer<'i, I: FromStr + Integer>(input: &'i str) -> IResult<&'i str, I> {
    map_res(recognize(tuple((opt(tag("-")), digit1))), str::parse)(input)
}

/// Opens a memory-mapped UTF-8 file at a specified path, and passes in a `&str` over the file to a
/// provided callback function.
///
/// # Errors
///
/// This function returns a `Result::Err`-wrapped `std::io::Error` if an error has occurred.
/// Possible causes are:
///
/// * `std::fs::File::open` was unable to open a read-only file at `file_path`
/// * `memmap::Mmap::map` fails to create an `Mmap` instance for the opened file
/// * `std::str::from_utf8` determines the file is not in valid UTF-8 format
///
/// `f` is only executed *iff* an error is not encountered.
///
/// # Safety
///
/// This function uses `Mmap::map`, which is an unsafe function. There is no guarantee that an
/// external process won't modify the file while this function is referring to it as an immutable
/// string slice.
pub unsafe fn open_utf8_file<T, F: FnOnce(&str) -> T>(file_path: &str, f: F) -> IoResult<T> {
    let file: File = File::open(file_path)?;

    // SAFETY: This operation is unsafe
    let mmap: Mmap = Mmap::map(&file)?;
    let bytes: &[u8] = &mmap;
    let utf8_str: &str = from_utf8(bytes)
        .map_err(|utf8_error| IoError::new(IoErrorKind::InvalidData, utf8_error))?;

    Ok(f(utf8_str))
}

/// Arguments consumed by an individual question of a solver.
#[derive(Debug, Default, Parser)]
pub struct QuestionArgs {
    /// Print extra state while answering a question
    #[arg(short, long, default_value_t)]
    pub verbose: bool,
}

/// Arguments for program execution
#[derive(Debug, Parser)]
pub struct Args {
    /// The name of the solver to run
    #[arg(short, long)]
    pub solver: String,

    /// The question to answer, answering both when 0
    #[arg(short, long, default_value_t, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub question: u8,

    /// Input file path, defaulting to `input/<solver>.txt` when empty
    #[arg(short, long, default_value_t)]
    input_file_path: String,

    #[command(flatten)]
    pub question_args: QuestionArgs,
}

impl Args {
    pub fn input_file_path(&self) -> String {
        if self.input_file_path.is_empty() {
            format!("input/{}.txt", self.solver)
        } else {
            self.input_file_path.clone()
        }
    }
}

/// The interface between a solver and the binary: parse the input file into `Self`, then answer
/// one or both questions against it.
pub trait RunQuestions: Sized
where
    Self: for<'i> TryFrom<&'i str>,
    for<'i> <Self as TryFrom<&'i str>>::Error: Debug,
{
    fn q1_internal(&mut self, args: &QuestionArgs);

    fn q2_internal(&mut self, args: &QuestionArgs);

    fn try_to_intermediate(args: &Args) -> Option<Self> {
        let file_path: String = args.input_file_path();

        // SAFETY: This isn't truly safe, we're just hoping nobody touches our file before we're
        // done parsing it
        unsafe {
            open_utf8_file(&file_path, |s| {
                s.try_into().map_or_else(
                    |error| {
                        eprintln!(
                            "Failed to convert file \"{file_path}\" to type {}:\n{error:#?}",
                            type_name::<Self>()
                        );

                        None
                    },
                    Some,
                )
            })
        }
        .unwrap_or_else(|error| {
            eprintln!("Failed to open UTF-8 file \"{file_path}\":\n{error}");

            None
        })
    }

    fn q1(args: &Args) {
        if let Some(mut solution) = Self::try_to_intermediate(args) {
            solution.q1_internal(&args.question_args);
        }
    }

    fn q2(args: &Args) {
        if let Some(mut solution) = Self::try_to_intermediate(args) {
            solution.q2_internal(&args.question_args);
        }
    }

    fn both(args: &Args) {
        if let Some(mut solution) = Self::try_to_intermediate(args) {
            solution.q1_internal(&args.question_args);
            solution.q2_internal(&args.question_args);
        }
    }
}

pub struct Solver {
    pub name: &'static str,
    pub q1: fn(&Args),
    pub q2: fn(&Args),
    pub both: fn(&Args),
}

pub struct Solvers(Vec<Solver>);

impl Solvers {
    pub fn new(solvers: Vec<Solver>) -> Self {
        Self(solvers)
    }

    pub fn run(&self, args: &Args) {
        match self.0.iter().find(|solver| solver.name == args.solver) {
            None => eprintln!("no solver named {:?}", args.solver),
            Some(solver) => match args.question {
                1_u8 => (solver.q1)(args),
                2_u8 => (solver.q2)(args),
                _ => (solver.both)(args),
            },
        }
    }
}

/// Declares the solver modules and a lazily-initialized registry over their `Solution` types.
#[macro_export]
macro_rules! solvers {
    [ $( $solver:ident ),* $(,)? ] => {
        $( pub mod $solver; )*

        pub fn solvers() -> &'static $crate::Solvers {
            static ONCE_LOCK: ::std::sync::OnceLock<$crate::Solvers> =
                ::std::sync::OnceLock::new();

            ONCE_LOCK.get_or_init(|| {
                $crate::Solvers::new(vec![ $(
                    $crate::Solver {
                        name: stringify!($solver),
                        q1: <$solver::Solution as $crate::RunQuestions>::q1,
                        q2: <$solver::Solution as $crate::RunQuestions>::q2,
                        both: <$solver::Solution as $crate::RunQuestions>::both,
                    },
                )* ])
            })
        }
    };
}

/// Defines a `repr(u8)` cell enum whose variants are printable ASCII bytes, wiring up conversion
/// from bytes, chars, and `nom` inputs, plus the `IsValidAscii` certificate used to render grids
/// of it back into strings.
#[macro_export]
macro_rules! define_cell {
    {
        $( #[$meta:meta] )*
        $vis:vis enum $cell:ident {
            $(
                $( #[$variant_meta:meta] )*
                $variant:ident = $byte_const:ident = $byte:literal
            ),* $(,)?
        }
    } => {
        $( #[$meta] )*
        $vis enum $cell {
            $( $( #[$variant_meta] )* $variant = $byte, )*
        }

        impl $cell {
            $( pub const $byte_const: u8 = $byte; )*

            // SAFETY: All variant bytes are printable ASCII.
            pub const STR: &'static str =
                unsafe { ::std::str::from_utf8_unchecked(&[ $( Self::$byte_const, )* ]) };
        }

        // SAFETY: The enum is `repr(u8)` over printable ASCII discriminants.
        unsafe impl $crate::IsValidAscii for $cell {}

        impl $crate::Parse for $cell {
            fn parse<'i>(input: &'i str) -> ::nom::IResult<&'i str, Self> {
                ::nom::combinator::map_opt(
                    ::nom::character::complete::one_of(Self::STR),
                    |c| Self::try_from(c).ok(),
                )(input)
            }
        }

        impl ::std::convert::TryFrom<u8> for $cell {
            type Error = ();

            fn try_from(byte: u8) -> Result<Self, Self::Error> {
                match byte {
                    $( Self::$byte_const => Ok(Self::$variant), )*
                    _ => Err(()),
                }
            }
        }

        impl ::std::convert::TryFrom<char> for $cell {
            type Error = ();

            fn try_from(c: char) -> Result<Self, Self::Error> {
                u8::try_from(c).map_err(|_| ())?.try_into()
            }
        }
    };
}

/// `assert_eq!` with pretty-printed operands, for fixtures too large to eyeball on one line.
#[macro_export]
macro_rules! pretty_assert_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    panic!(
                        "pretty assertion failed: `(left == right)`\nleft: {left:#?}\nright: {right:#?}"
                    );
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer::<i32>("42,7"), Ok((",7", 42_i32)));
        assert_eq!(parse_integer::<i32>("-13\n"), Ok(("\n", -13_i32)));
        assert_eq!(parse_integer::<usize>("006"), Ok(("", 6_usize)));
        assert!(parse_integer::<u32>("-4").is_err());
        assert!(parse_integer::<i32>("x4").is_err());
    }

    #[test]
    fn test_args_input_file_path() {
        let args: Args =
            Args::try_parse_from(["gridpath", "--solver", "maze", "--question", "1"]).unwrap();

        assert_eq!(args.solver, "maze");
        assert_eq!(args.question, 1_u8);
        assert!(!args.question_args.verbose);
        assert_eq!(args.input_file_path(), "input/maze.txt");

        let args: Args =
            Args::try_parse_from(["gridpath", "-s", "maze", "-i", "input/other.txt", "-v"])
                .unwrap();

        assert_eq!(args.question, 0_u8);
        assert!(args.question_args.verbose);
        assert_eq!(args.input_file_path(), "input/other.txt");

        assert!(Args::try_parse_from(["gridpath", "-s", "maze", "-q", "3"]).is_err());
    }
}
