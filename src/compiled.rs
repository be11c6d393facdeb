//! Compiled magic databases: a MessagePack header (tag string, format
//! version) followed by the rule list as serialized by rmp-serde.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{MagicError, MagicResult};
use crate::magic::{MagicEntry, MagicSet};

pub const TAG: &str = "file-magic";
pub const VERSION: u32 = 1;

/// The file extension of compiled databases, without the dot.
pub const EXTENSION: &str = "mgc";

pub fn write<W: Write>(filename: &str, wr: &mut W, set: &MagicSet) -> MagicResult<()> {
    let header_err = |e: rmp::encode::ValueWriteError| MagicError::Format(filename.to_string(), e.to_string());
    rmp::encode::write_str(wr, TAG).map_err(header_err)?;
    rmp::encode::write_u32(wr, VERSION).map_err(header_err)?;
    rmp_serde::encode::write(wr, &set.entries())?;
    Ok(())
}

pub fn read<R: Read>(filename: &str, rd: &mut R) -> MagicResult<MagicSet> {
    let format_err = |desc: String| MagicError::Format(filename.to_string(), desc);

    let tag_len = rmp::decode::read_str_len(rd).map_err(|e| format_err(e.to_string()))?;
    if tag_len as usize != TAG.len() {
        return Err(format_err("not a compiled magic file".to_string()));
    }
    let mut tag = vec![0u8; TAG.len()];
    rd.read_exact(&mut tag)?;
    if tag != TAG.as_bytes() {
        return Err(format_err("not a compiled magic file".to_string()));
    }

    let version = rmp::decode::read_u32(rd).map_err(|e| format_err(e.to_string()))?;
    if version != VERSION {
        return Err(format_err(format!(
            "unsupported compiled magic version {} (expected {})",
            version, VERSION
        )));
    }

    let entries: Vec<MagicEntry> = rmp_serde::from_read(rd)?;
    MagicSet::from_entries(entries).map_err(|err| match err {
        MagicError::Structure(desc) => format_err(desc),
        err => err,
    })
}

pub fn save(path: &Path, set: &MagicSet) -> MagicResult<()> {
    let name = path.display().to_string();
    let file = File::create(path).map_err(|e| MagicError::Open(name.clone(), e))?;
    let mut wr = BufWriter::new(file);
    write(&name, &mut wr, set)?;
    wr.flush()?;
    Ok(())
}

pub fn load(path: &Path) -> MagicResult<MagicSet> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| MagicError::Open(name.clone(), e))?;
    read(&name, &mut BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn sample() -> MagicSet {
        let source = "0 belong 0xcafebabe Java class\n!:mime application/java\n>6 beshort x \\b, version %d\n";
        parser::parse_set("sample", source.as_bytes(), false).unwrap()
    }

    #[test]
    fn saved_database_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.mgc");
        let set = sample();

        save(&path, &set).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(set.entries(), loaded.entries());
        let found = loaded.matches(&[0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 52], false);
        assert_eq!("Java class, version 52", found[0].text);
        assert_eq!(Some("application/java".to_string()), found[0].mime);
    }

    #[test]
    fn rejects_wrong_tag() {
        let mut buf = Vec::new();
        rmp::encode::write_str(&mut buf, "other-magic").unwrap();
        rmp::encode::write_u32(&mut buf, VERSION).unwrap();
        let err = read("bad.mgc", &mut buf.as_slice()).unwrap_err();
        assert_eq!("bad.mgc: not a compiled magic file", err.to_string());
    }

    #[test]
    fn rejects_wrong_version() {
        let mut buf = Vec::new();
        rmp::encode::write_str(&mut buf, TAG).unwrap();
        rmp::encode::write_u32(&mut buf, VERSION + 1).unwrap();
        rmp_serde::encode::write(&mut buf, &Vec::<MagicEntry>::new()).unwrap();
        let err = read("new.mgc", &mut buf.as_slice()).unwrap_err();
        assert!(err.to_string().contains("unsupported compiled magic version 2"));
    }

    #[test]
    fn rejects_garbage() {
        let err = read("junk.mgc", &mut &b"\x7fELF"[..]).unwrap_err();
        assert!(matches!(err, MagicError::Format(..)));
    }
}
