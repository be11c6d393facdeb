use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use nom::{
    bytes::complete::tag,
    character::complete::{space0, space1},
    multi::many0_count,
    sequence::preceded,
};
use tracing::{debug, warn};

use crate::{
    data_type::DataType,
    error::{MagicError, MagicResult},
    magic::{MagicEntry, MagicSet},
};

use self::data_type::TypeName;

pub mod data_type;
pub mod number;
pub mod offset;
pub mod string;

/// What a single line of a magic source file turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum Line {
    Blank,
    Entry(MagicEntry),
    Mime(String),
    /// A well-formed rule this engine can't evaluate.
    Skipped { level: u32, reason: String },
}

pub fn parse_file(path: &Path, check: bool) -> MagicResult<MagicSet> {
    let file = File::open(path).map_err(|e| MagicError::Open(path.display().to_string(), e))?;
    parse_set(&path.display().to_string(), file, check)
}

/// Parses a whole magic source. Skipped rules take their continuation lines
/// with them; they are reported with `warn!` when `check` is set and
/// `debug!` otherwise.
pub fn parse_set<R: Read>(filename: &str, input: R, check: bool) -> MagicResult<MagicSet> {
    let mut entries: Vec<MagicEntry> = Vec::new();
    let mut skip_below: Option<u32> = None;
    // Whether a `!:mime` line has an entry to attach to.
    let mut last_kept = false;

    for (line_num_minus_one, line_rslt) in BufReader::new(input).split(b'\n').enumerate() {
        let line_num = line_num_minus_one + 1;
        let raw = line_rslt?;
        let text = String::from_utf8_lossy(&raw);
        let text = text.strip_suffix('\r').unwrap_or(&text);

        let line = parse_line(text, line_num)
            .map_err(|desc| MagicError::Parse(filename.to_string(), line_num, desc))?;

        match line {
            Line::Blank => {}
            Line::Mime(mime) => {
                if last_kept {
                    if let Some(entry) = entries.last_mut() {
                        entry.mime = Some(mime);
                    }
                }
            }
            Line::Entry(entry) => match skip_below {
                Some(level) if entry.level > level => {
                    report_skip(check, filename, line_num, "parent rule was skipped");
                    last_kept = false;
                }
                _ => {
                    skip_below = None;
                    entries.push(entry);
                    last_kept = true;
                }
            },
            Line::Skipped { level, reason } => {
                report_skip(check, filename, line_num, &reason);
                if skip_below.map_or(true, |below| level <= below) {
                    skip_below = Some(level);
                }
                last_kept = false;
            }
        }
    }

    MagicSet::from_entries(entries).map_err(|err| match err {
        MagicError::Structure(desc) => MagicError::Format(filename.to_string(), desc),
        err => err,
    })
}

fn report_skip(check: bool, filename: &str, line_num: usize, reason: &str) {
    if check {
        warn!(file = filename, line = line_num, "skipping unsupported magic: {}", reason);
    } else {
        debug!(file = filename, line = line_num, "skipping unsupported magic: {}", reason);
    }
}

pub fn parse_line(line: &str, line_num: usize) -> Result<Line, String> {
    let line = line.trim_start();

    if line.is_empty() || line.starts_with('#') {
        return Ok(Line::Blank);
    }

    if let Some(annotation) = line.strip_prefix("!:") {
        return Ok(match annotation.strip_prefix("mime") {
            Some(mime) if mime.starts_with(char::is_whitespace) => {
                Line::Mime(mime.trim().to_string())
            }
            _ => Line::Blank,
        });
    }

    let (rest, level) = many0_count(tag::<_, _, nom::error::Error<&str>>(">"))(line)
        .map_err(|e| e.to_string())?;
    let level = level as u32;
    let skipped = |reason: &str| {
        Ok(Line::Skipped {
            level,
            reason: reason.to_string(),
        })
    };

    if rest.starts_with('-') {
        return skipped("offsets from the end of the file");
    }

    let (rest, offset) = match offset::offset(rest) {
        Ok((rest, offset)) if rest.starts_with(char::is_whitespace) => (rest, offset),
        _ if rest.starts_with('(') || rest.starts_with("&(") => {
            return skipped("indirect offset expressions");
        }
        _ => return Err(format!("invalid offset {:?}", first_field(rest))),
    };

    let (rest, (type_name, modifier)) = preceded(space1, data_type::type_field)(rest)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| {
            format!("missing type after offset {:?}", first_field(line))
        })?;

    let data_type = match data_type::lookup(type_name).map_err(|e| e.to_string())? {
        TypeName::Supported(data_type) => data_type,
        TypeName::Unsupported(what) => return skipped(what),
    };

    let (mask, case_insensitive) = match type_modifier(&data_type, modifier) {
        Some(modifiers) => modifiers,
        None => return skipped(&format!("type modifier {:?}", modifier)),
    };

    let rest = rest.trim_start();
    let (rest, test) = test::test(&data_type, mask, case_insensitive, rest)
        .map_err(|_| format!("invalid test value {:?}", first_field(rest)))?;

    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(format!("unexpected text after test {:?}", first_field(rest)));
    }

    let (message, _) = space0::<_, nom::error::Error<&str>>(rest).map_err(|e| e.to_string())?;

    Ok(Line::Entry(MagicEntry {
        line_num,
        level,
        offset,
        data_type,
        test,
        message: message.to_string(),
        mime: None,
    }))
}

/// Interprets the text after a type name: `&mask` on integers, `/flags` on
/// strings. `None` when it uses something this engine doesn't evaluate.
fn type_modifier(data_type: &DataType, modifier: &str) -> Option<(Option<u64>, bool)> {
    if modifier.is_empty() {
        return Some((None, false));
    }

    if data_type.is_integer() {
        let mask_text = modifier.strip_prefix('&')?;
        match number::signed_integer(mask_text) {
            Ok(("", mask)) => Some((Some(mask), false)),
            _ => None,
        }
    } else if *data_type == DataType::String {
        let flags = modifier.strip_prefix('/')?;
        // `t` and `b` only force text/binary, which matching ignores.
        if flags.chars().all(|c| matches!(c, 'c' | 't' | 'b')) {
            Some((None, flags.contains('c')))
        } else {
            None
        }
    } else {
        None
    }
}

fn first_field(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian::*;
    use crate::magic::{DirectOffset, NumOp, NumericTest, Offset, StringOp, StringTest, Test};

    fn entry(line: &str) -> MagicEntry {
        match parse_line(line, 1) {
            Ok(Line::Entry(entry)) => entry,
            other => panic!("expected an entry, got {:?}", other),
        }
    }

    #[test]
    fn ignores_blank_lines_and_comments() {
        for text in ["", "   ", "\t", "# comment", "   # indented comment", "!:strength +10"] {
            assert_eq!(Ok(Line::Blank), parse_line(text, 1));
        }
    }

    #[test]
    fn mime_annotation() {
        assert_eq!(Ok(Line::Mime("image/png".to_string())), parse_line("!:mime\timage/png", 1));
    }

    #[test]
    fn numeric_entry() {
        let parsed = entry("0\tlelong&0xffff\t0x5a4d\tMS-DOS executable");
        assert_eq!(0, parsed.level);
        assert_eq!(Offset::Direct(DirectOffset::Absolute(0)), parsed.offset);
        assert_eq!(DataType::Long { endian: Little, signed: true }, parsed.data_type);
        assert_eq!(Test::Number(NumericTest::new(NumOp::Equal, 0x5a4d, Some(0xffff))), parsed.test);
        assert_eq!("MS-DOS executable", parsed.message);
    }

    #[test]
    fn continuation_entry() {
        let parsed = entry(">>&2 ubyte x \\b, version %d");
        assert_eq!(2, parsed.level);
        assert_eq!(Offset::Direct(DirectOffset::Relative(2)), parsed.offset);
        assert_eq!(Test::AlwaysTrue, parsed.test);
        assert_eq!("\\b, version %d", parsed.message);
    }

    #[test]
    fn string_entry_without_message() {
        let parsed = entry("0 string/c \\<html");
        assert_eq!(
            Test::String(StringTest::new(StringOp::Equal, b"<html".to_vec()).case_insensitive(true)),
            parsed.test
        );
        assert_eq!("", parsed.message);
    }

    #[test]
    fn skips_unsupported_rules() {
        let skip = |text: &str| matches!(parse_line(text, 1), Ok(Line::Skipped { .. }));
        assert!(skip("0 regex ^abc text"));
        assert!(skip(">-4 long 0 trailer"));
        assert!(skip("(4.l*2) byte 1 scaled"));
        assert!(skip("0 byte+1 2 arithmetic"));
        assert!(skip("0 search/256 PK zip"));
        assert!(skip("0 string/w a\\ b spaced"));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("0 bogus 1 nope", 1).is_err());
        assert!(parse_line("zero byte 1 nope", 1).is_err());
        assert!(parse_line("0 byte", 1).is_err());
        assert!(parse_line("0 byte 1x nope", 1).is_err());
    }

    #[test]
    fn parse_set_builds_tree_and_attaches_mime() {
        let source = "\
# PNG
0\tstring\t\\x89PNG\tPNG image data
!:mime\timage/png
>16\tbelong\tx\t\\b, %d x
>20\tbelong\tx\t%d
0\tregex\tfoo\tnever
>0\tbyte\t1\tchild of skipped
!:mime\ttext/never
0\tbyte\t0x7f\tDEL
";
        let set = parse_set("test.magic", source.as_bytes(), true).unwrap();
        let entries = set.entries();
        assert_eq!(2, set.len());
        assert_eq!(vec![2, 4, 5, 9], entries.iter().map(|e| e.line_num).collect::<Vec<_>>());
        assert_eq!(Some("image/png".to_string()), entries[0].mime);
        assert_eq!(None, entries[3].mime);
    }

    #[test]
    fn parse_set_reports_location() {
        let err = parse_set("bad.magic", "0 byte 1 ok\n0 wibble 1 bad\n".as_bytes(), false).unwrap_err();
        assert_eq!("bad.magic, 2: Unknown data type: \"wibble\"", err.to_string());

        let err = parse_set("orphan.magic", ">0 byte 1 orphan\n".as_bytes(), false).unwrap_err();
        assert!(matches!(err, MagicError::Format(..)));
    }

    #[test]
    fn handles_crlf_and_invalid_utf8() {
        let set = parse_set("dos.magic", &b"0 byte 1 one\r\n0 string \xff\xfe odd\r\n"[..], false).unwrap();
        let entries = set.entries();
        assert_eq!("one", entries[0].message);
        assert_eq!("odd", entries[1].message);
    }
}
