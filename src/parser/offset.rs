use crate::{
    data_type::DataType,
    magic::{DirectOffset, IndirectOffset, Offset},
};
use anyhow::anyhow;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::one_of,
    combinator::{map, map_res, opt},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::number::{offset_integer, unsigned_integer};

pub fn offset(input: &str) -> IResult<&str, Offset> {
    alt((
        map(
            pair(opt(tag("&")), indirect_offset),
            |(opt_amp, off_ind)| match opt_amp {
                Some(..) => Offset::RelativeIndirect(off_ind),
                None => Offset::AbsoluteIndirect(off_ind),
            },
        ),
        map(direct_offset, Offset::Direct),
    ))(input)
}

pub fn direct_offset(input: &str) -> IResult<&str, DirectOffset> {
    alt((
        map(preceded(tag("&"), offset_integer), DirectOffset::relative),
        map(unsigned_integer, DirectOffset::absolute),
    ))(input)
}

pub fn indirect_offset(input: &str) -> IResult<&str, IndirectOffset> {
    map(
        delimited(
            tag("("),
            tuple((
                direct_offset,
                opt(indirect_offset_data_type),
                opt(indirect_offset_bias),
            )),
            tag(")"),
        ),
        |(base, opt_dt, opt_bias)| {
            use crate::data_type::DataType::*;
            use crate::endian::Endian::*;

            IndirectOffset {
                base,
                data_type: opt_dt.unwrap_or(Long {
                    signed: false,
                    endian: Native,
                }),
                bias: opt_bias.unwrap_or(0),
            }
        },
    )(input)
}

#[rustfmt::skip]
fn indirect_offset_data_type(input: &str) -> IResult<&str, DataType> {
    map_res(
        pair(one_of(",."), one_of("bBcChHsSlLmiI")),
        |(signed_char, type_char)| {
            use crate::data_type::DataType::*;
            use crate::endian::Endian::*;

            let signed = signed_char == ',';
            match type_char {
                'b' | 'B' | 'c' | 'C' => Ok(Byte { signed }),
                's' | 'h' => Ok(Short { signed, endian: Little }),
                'S' | 'H' => Ok(Short { signed, endian: Big }),
                'l' => Ok(Long { signed, endian: Little }),
                'L' => Ok(Long { signed, endian: Big }),
                'm' => Ok(Long { signed, endian: Pdp11 }),
                _ => Err(anyhow!("Unable to handle offset data type: {:?}", type_char)),
            }
        },
    )(input)
}

fn indirect_offset_bias(input: &str) -> IResult<&str, i64> {
    map_res(
        pair(one_of("+-"), unsigned_integer::<i64>),
        |(signed_char, int_val)| match signed_char {
            '+' => Ok(int_val),
            '-' => Ok(-int_val),
            _ => Err(anyhow!("Unknown bias sign: {:?}", signed_char)),
        },
    )(input)
}
