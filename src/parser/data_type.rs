// -*- rustic-indent-offset: 4; -*-

use anyhow::{anyhow, Result};
use nom::{
    bytes::complete::{take_till, take_while1},
    sequence::pair,
    IResult,
};

use crate::data_type::DataType;

/// A type name from a magic entry, resolved against the supported set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeName {
    Supported(DataType),
    /// A real libmagic type this engine can't evaluate.
    Unsupported(&'static str),
}

/// Splits the type field into its name and whatever modifier follows it
/// (`&0xff` masks, `/c` string flags, ...).
pub fn type_field(input: &str) -> IResult<&str, (&str, &str)> {
    pair(
        take_while1(|c: char| c.is_ascii_alphanumeric()),
        take_till(|c: char| c.is_whitespace()),
    )(input)
}

#[rustfmt::skip]
pub fn lookup(type_name: &str) -> Result<TypeName> {
    use self::TypeName::*;
    use crate::data_type::DataType::*;
    use crate::endian::Endian::*;

    match type_name {
        "byte"   | "dC" | "d1" => Ok(Supported(Byte  { signed: true })),
        "ubyte"  | "uC" | "u1" => Ok(Supported(Byte  { signed: false })),
        "short"  | "dS" | "d2" => Ok(Supported(Short { endian: Native, signed: true })),
        "ushort" | "uS" | "u2" => Ok(Supported(Short { endian: Native, signed: false })),
        "long"   | "dI" | "dL" | "d4" => Ok(Supported(Long { endian: Native, signed: true })),
        "ulong"  | "uI" | "uL" | "u4" => Ok(Supported(Long { endian: Native, signed: false })),
        "quad"   | "dQ" | "d8" => Ok(Supported(Quad { endian: Native, signed: true })),
        "uquad"  | "uQ" | "u8" => Ok(Supported(Quad { endian: Native, signed: false })),
        "float"  => Ok(Supported(Float(Native))),
        "double" => Ok(Supported(Double(Native))),

        "beshort"  => Ok(Supported(Short { endian: Big, signed: true })),
        "ubeshort" => Ok(Supported(Short { endian: Big, signed: false })),
        "belong"   => Ok(Supported(Long  { endian: Big, signed: true })),
        "ubelong"  => Ok(Supported(Long  { endian: Big, signed: false })),
        "bequad"   => Ok(Supported(Quad  { endian: Big, signed: true })),
        "ubequad"  => Ok(Supported(Quad  { endian: Big, signed: false })),
        "befloat"  => Ok(Supported(Float(Big))),
        "bedouble" => Ok(Supported(Double(Big))),

        "leshort"  => Ok(Supported(Short { endian: Little, signed: true })),
        "uleshort" => Ok(Supported(Short { endian: Little, signed: false })),
        "lelong"   => Ok(Supported(Long  { endian: Little, signed: true })),
        "ulelong"  => Ok(Supported(Long  { endian: Little, signed: false })),
        "lequad"   => Ok(Supported(Quad  { endian: Little, signed: true })),
        "ulequad"  => Ok(Supported(Quad  { endian: Little, signed: false })),
        "lefloat"  => Ok(Supported(Float(Little))),
        "ledouble" => Ok(Supported(Double(Little))),

        "melong"  => Ok(Supported(Long { endian: Pdp11, signed: true })),
        "umelong" => Ok(Supported(Long { endian: Pdp11, signed: false })),

        "string" | "s" => Ok(Supported(String)),

        "pstring" => Ok(Unsupported("Pascal strings")),
        "bestring16" | "lestring16" => Ok(Unsupported("UCS16 strings")),

        "date" | "qdate" | "ldate" | "qldate" | "qwdate" |
        "bedate" | "beqdate" | "beldate" | "beqldate" | "beqwdate" |
        "ledate" | "leqdate" | "leldate" | "leqldate" | "leqwdate" |
        "medate" | "meldate"
            => Ok(Unsupported("date values")),

        "beid3" | "leid3" => Ok(Unsupported("ID3 values")),
        "indirect" => Ok(Unsupported("indirect magic")),
        "name" | "use" => Ok(Unsupported("named magic")),
        "regex" => Ok(Unsupported("regex tests")),
        "search" => Ok(Unsupported("literal search strings")),
        "default" | "clear" => Ok(Unsupported("default no-type tests")),
        "der" => Ok(Unsupported("DER certificate parsing")),
        "guid" => Ok(Unsupported("GUID tests")),
        "offset" => Ok(Unsupported("offset tests")),

        _ => Err(anyhow!("Unknown data type: {:?}", type_name)),
    }
}
