use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, hex_digit1, oct_digit1},
    combinator::{map, map_res, opt},
    sequence::{pair, preceded},
    IResult,
};
use num::{BigUint, Num};
use std::convert::TryFrom;

/// A non-negative decimal, octal (leading `0`) or hex (leading `0x`) integer
/// that must fit in `N`.
pub fn unsigned_integer<N: TryFrom<BigUint>>(input: &str) -> IResult<&str, N> {
    map_res(big_integer, N::try_from)(input)
}

/// An integer with an optional leading `-`, returned as the 64-bit two's
/// complement bit pattern. Test values get truncated to the width of their
/// type later, so `-1` works for every width.
pub fn signed_integer(input: &str) -> IResult<&str, u64> {
    map(
        pair(opt(char('-')), unsigned_integer::<u64>),
        |(minus, n)| match minus {
            Some(..) => n.wrapping_neg(),
            None => n,
        },
    )(input)
}

/// Same as [`signed_integer`], as an `i64`.
pub fn offset_integer(input: &str) -> IResult<&str, i64> {
    map_res(
        pair(opt(char('-')), unsigned_integer::<i64>),
        |(minus, n)| match minus {
            Some(..) => n.checked_neg().ok_or("offset overflow"),
            None => Ok(n),
        },
    )(input)
}

fn big_integer(input: &str) -> IResult<&str, BigUint> {
    alt((
        map_res(preceded(alt((tag("0x"), tag("0X"))), hex_digit1), |value| {
            BigUint::from_str_radix(value, 16)
        }),
        map_res(preceded(tag("0"), oct_digit1), |value| {
            BigUint::from_str_radix(value, 8)
        }),
        map_res(digit1, |value| BigUint::from_str_radix(value, 10)),
    ))(input)
}
