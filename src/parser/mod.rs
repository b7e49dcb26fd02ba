//! Text decoders for the song and envelope-definition sources.
//!
//! Both formats are line oriented. Numeric fields in the envelope source are
//! read the forgiving way the hardware player always did: a leading number is
//! taken and anything after it ignored, with 0 for text that has no number.

pub mod envelopes;
pub mod song;

use nom::character::complete::{digit1, multispace0, one_of, space0};
use nom::combinator::{opt, recognize};
use nom::number::complete::float;
use nom::sequence::{pair, preceded};
use nom::IResult;

pub use envelopes::parse_envelopes;
pub use song::parse_song;

fn signed_digits(input: &str) -> IResult<&str, &str> {
    preceded(space0, recognize(pair(opt(one_of("+-")), digit1)))(input)
}

fn float_prefix(input: &str) -> IResult<&str, f32> {
    preceded(space0, float)(input)
}

fn unsigned_digits(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, digit1)(input)
}

/// Leading integer of `input`, saturated to `i32`. `None` when the text does
/// not start with a number.
pub(crate) fn int_prefix(input: &str) -> Option<i32> {
    let (_, digits) = signed_digits(input).ok()?;
    let value = match digits.parse::<i64>() {
        Ok(v) => v,
        // too many digits for i64
        Err(_) if digits.starts_with('-') => i64::MIN,
        Err(_) => i64::MAX,
    };
    Some(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Leading integer of `input`, 0 when there is none.
pub(crate) fn leading_int(input: &str) -> i32 {
    int_prefix(input).unwrap_or(0)
}

/// Leading float of `input`, 0.0 when there is none.
pub(crate) fn leading_float(input: &str) -> f32 {
    float_prefix(input).map(|(_, v)| v).unwrap_or(0.0)
}

/// Unsigned index directly after a label. Leading whitespace is allowed; any
/// other character before the digits means there is no index.
pub(crate) fn label_index(input: &str) -> Option<usize> {
    let (_, digits) = unsigned_digits(input).ok()?;
    digits.parse().ok()
}
