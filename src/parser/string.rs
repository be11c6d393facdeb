use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{one_of, satisfy},
    combinator::{map, map_res},
    multi::fold_many0,
    sequence::preceded,
    IResult,
};

/// One backslash escape, as the byte it stands for.
pub fn escape_sequence(input: &str) -> IResult<&str, u8> {
    preceded(
        tag("\\"),
        alt((
            map_res(
                preceded(one_of("xX"), take_while_m_n(1, 2, |c: char| c.is_ascii_hexdigit())),
                |hex_str| u8::from_str_radix(hex_str, 16),
            ),
            map_res(
                take_while_m_n(1, 3, |c: char| ('0'..='7').contains(&c)),
                |oct_str| u32::from_str_radix(oct_str, 8).map(|n| n as u8),
            ),
            map(one_of("nrtbafv"), |c| match c {
                'n' => b'\n',
                'r' => b'\r',
                't' => b'\t',
                'b' => 0x08,
                'a' => 0x07,
                'f' => 0x0c,
                _ => 0x0b,
            }),
            // Anything else stands for itself: `\\`, `\ `, `\<`, ...
            map(satisfy(|c: char| c.is_ascii()), |c| c as u8),
        )),
    )(input)
}

enum Piece {
    Byte(u8),
    Char(char),
}

/// A test string: everything up to the next unescaped space or tab.
pub fn escaped_string(input: &str) -> IResult<&str, Vec<u8>> {
    fold_many0(
        alt((
            map(escape_sequence, Piece::Byte),
            map(satisfy(|c| c != ' ' && c != '\t' && c != '\\'), Piece::Char),
        )),
        // Use input.len() as a rough guess for how long the resulting string
        // should be, to hopefully avoid doing too many allocations.
        || Vec::with_capacity(input.len()),
        |mut bytes, piece| {
            match piece {
                Piece::Byte(b) => bytes.push(b),
                Piece::Char(c) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
            bytes
        },
    )(input)
}

#[cfg(test)]
mod tests {
    #[test]
    fn escaped_strings() {
        assert_eq!(Ok(("", b"fmt ".to_vec())), super::escaped_string("fmt\\x20"));
        assert_eq!(Ok((" ", b"entry\r".to_vec())), super::escaped_string("entry\\r "));
        assert_eq!(Ok(("", b"a b".to_vec())), super::escaped_string("a\\ b"));
        assert_eq!(Ok(("", b"\x89PNG".to_vec())), super::escaped_string("\\x89PNG"));
        assert_eq!(Ok(("", "é".as_bytes().to_vec())), super::escaped_string("é"));
    }

    #[test]
    fn escaped_chars() {
        assert_eq!(Ok(("", b'\n')), super::escape_sequence("\\n"));
        assert_eq!(Ok(("", b'\r')), super::escape_sequence("\\r"));
        assert_eq!(Ok(("", b'\t')), super::escape_sequence("\\t"));
        assert_eq!(Ok(("", b'\\')), super::escape_sequence("\\\\"));
        assert_eq!(Ok(("", 0)), super::escape_sequence("\\0"));
        assert_eq!(Ok(("", 0x0e)), super::escape_sequence("\\16"));
        assert_eq!(Ok(("", 0x0e)), super::escape_sequence("\\016"));
        assert_eq!(Ok(("", b' ')), super::escape_sequence("\\x20"));
        assert_eq!(Ok(("7", 0x3f)), super::escape_sequence("\\x3f7"));
    }
}
