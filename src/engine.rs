use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::compiled;
use crate::error::{MagicError, MagicResult};
use crate::flags::Flags;
use crate::magic::MagicSet;
use crate::parser;

/// How much of a file gets matched against the rules.
pub const READ_LIMIT: u64 = 1024 * 1024;

/// The classification engine as the `file` driver sees it.
///
/// Every operation that takes a magic path accepts a colon-separated list.
pub trait Engine {
    /// Loads the database used by later [`Engine::file`] calls.
    fn load(&mut self, path: &str) -> MagicResult<()>;

    /// Parses magic sources without keeping them.
    fn check(&mut self, path: &str) -> MagicResult<()>;

    /// Parses magic sources and writes a compiled database for each.
    fn compile(&mut self, path: &str) -> MagicResult<()>;

    /// Describes the file at `path`.
    fn file(&mut self, path: &Path) -> MagicResult<String>;

    /// Describes everything `input` yields. The driver passes its standard
    /// input here for the `-` target.
    fn stdin(&mut self, input: &mut dyn Read) -> MagicResult<String>;

    /// Whether any [`Engine::file`] or [`Engine::stdin`] call has failed so
    /// far.
    fn had_error(&self) -> bool;
}

/// A magic engine covering the rule syntax of [`crate::parser`].
///
/// Compressed files, tar archives, text encodings and application types are
/// not examined, so `Flags::COMPRESS` and the exclusions other than
/// `Flags::NO_CHECK_SOFT` don't change anything.
#[derive(Debug)]
pub struct Magic {
    flags: Flags,
    set: Option<MagicSet>,
    had_error: bool,
}

impl Magic {
    pub fn open(flags: Flags) -> MagicResult<Magic> {
        debug!(?flags, "opening magic engine");
        Ok(Magic {
            flags,
            set: None,
            had_error: false,
        })
    }

    fn sources(&self, comp: &str) -> MagicResult<MagicSet> {
        let path = Path::new(comp);
        let check = self.flags.contains(Flags::CHECK);

        if !path.is_dir() {
            return parser::parse_file(path, check);
        }

        let mut files = Vec::new();
        for dir_entry in fs::read_dir(path).map_err(|e| MagicError::Open(comp.to_string(), e))? {
            let file = dir_entry?.path();
            if file.is_file() {
                files.push(file);
            }
        }
        files.sort();

        let mut set = MagicSet::new();
        for file in files.iter() {
            set.extend(parser::parse_file(file, check)?);
        }
        Ok(set)
    }

    fn compile_into(&self, path: &str, out_dir: &Path) -> MagicResult<()> {
        for comp in components(path)? {
            let set = self.sources(comp)?;
            let file_name = Path::new(comp)
                .file_name()
                .ok_or_else(|| MagicError::Format(comp.to_string(), "no file name to compile to".to_string()))?;

            let mut out_name = file_name.to_os_string();
            out_name.push(".");
            out_name.push(compiled::EXTENSION);
            let out_path = out_dir.join(out_name);

            compiled::save(&out_path, &set)?;
            debug!(source = comp, output = %out_path.display(), rules = set.len(), "compiled magic");
        }
        Ok(())
    }

    fn classify(&self, path: &Path) -> MagicResult<String> {
        let name = path.display().to_string();
        let open_err = |e: io::Error| MagicError::Open(name.clone(), e);

        let meta_rslt = if self.flags.contains(Flags::SYMLINK) {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        };
        let meta = meta_rslt.map_err(open_err)?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(open_err)?;
            return Ok(self.render(&format!("symbolic link to {}", target.display()), "inode/symlink"));
        }
        if file_type.is_dir() {
            return Ok(self.render("directory", "inode/directory"));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;

            if !self.flags.contains(Flags::DEVICES) {
                if file_type.is_char_device() {
                    return Ok(self.render("character special", "inode/chardevice"));
                }
                if file_type.is_block_device() {
                    return Ok(self.render("block special", "inode/blockdevice"));
                }
            }
            if file_type.is_fifo() {
                return Ok(self.render("fifo (named pipe)", "inode/fifo"));
            }
            if file_type.is_socket() {
                return Ok(self.render("socket", "inode/socket"));
            }
        }

        let mut buf = Vec::new();
        File::open(path)
            .map_err(open_err)?
            .take(READ_LIMIT)
            .read_to_end(&mut buf)
            .map_err(open_err)?;

        self.describe_buffer(&buf)
    }

    fn describe_buffer(&self, buf: &[u8]) -> MagicResult<String> {
        if buf.is_empty() {
            return Ok(self.render("empty", "inode/x-empty"));
        }

        let set = self.set.as_ref().ok_or(MagicError::NotLoaded)?;
        let found = if self.flags.contains(Flags::NO_CHECK_SOFT) {
            Vec::new()
        } else {
            set.matches(buf, self.flags.contains(Flags::CONTINUE))
        };

        let text = if found.is_empty() {
            "data".to_string()
        } else {
            found.iter().map(|desc| desc.text.as_str()).collect::<Vec<_>>().join("\n- ")
        };
        let mime = found
            .iter()
            .find_map(|desc| desc.mime.as_deref())
            .unwrap_or("application/octet-stream");

        Ok(self.render(&text, mime))
    }

    fn render(&self, text: &str, mime: &str) -> String {
        let out = match (
            self.flags.contains(Flags::MIME_TYPE),
            self.flags.contains(Flags::MIME_ENCODING),
        ) {
            (true, true) => format!("{}; charset=binary", mime),
            (true, false) => mime.to_string(),
            (false, true) => "binary".to_string(),
            (false, false) => text.to_string(),
        };

        if self.flags.contains(Flags::RAW) {
            out
        } else {
            escape_unprintable(&out)
        }
    }
}

impl Engine for Magic {
    fn load(&mut self, path: &str) -> MagicResult<()> {
        let mut set = MagicSet::new();

        for comp in components(path)? {
            let compiled_path = if comp.ends_with(&format!(".{}", compiled::EXTENSION)) {
                Some(PathBuf::from(comp))
            } else {
                let candidate = PathBuf::from(format!("{}.{}", comp, compiled::EXTENSION));
                if candidate.is_file() {
                    Some(candidate)
                } else {
                    None
                }
            };

            let loaded = match compiled_path {
                Some(compiled_path) => compiled::load(&compiled_path)?,
                None => self.sources(comp)?,
            };
            debug!(path = comp, rules = loaded.len(), "loaded magic");
            set.extend(loaded);
        }

        self.set = Some(set);
        Ok(())
    }

    fn check(&mut self, path: &str) -> MagicResult<()> {
        for comp in components(path)? {
            let set = self.sources(comp)?;
            if self.flags.contains(Flags::DEBUG) {
                for entry in set.entries() {
                    debug!(path = comp, "{:?}", entry);
                }
            }
            if set.is_empty() {
                warn!(path = comp, "no usable rules");
            }
            debug!(path = comp, rules = set.len(), "checked magic");
        }
        Ok(())
    }

    fn compile(&mut self, path: &str) -> MagicResult<()> {
        let cwd = std::env::current_dir()?;
        self.compile_into(path, &cwd)
    }

    fn file(&mut self, path: &Path) -> MagicResult<String> {
        let result = self.classify(path);
        self.had_error |= result.is_err();
        result
    }

    fn stdin(&mut self, input: &mut dyn Read) -> MagicResult<String> {
        let mut buf = Vec::new();
        let result = match input.take(READ_LIMIT).read_to_end(&mut buf) {
            Ok(_) => self.describe_buffer(&buf),
            Err(err) => Err(err.into()),
        };
        self.had_error |= result.is_err();
        result
    }

    fn had_error(&self) -> bool {
        self.had_error
    }
}

fn components(path: &str) -> MagicResult<Vec<&str>> {
    let comps: Vec<&str> = path.split(':').filter(|comp| !comp.is_empty()).collect();
    if comps.is_empty() {
        Err(MagicError::NotLoaded)
    } else {
        Ok(comps)
    }
}

/// Replaces every byte outside printable ASCII with a `\ooo` escape.
pub fn escape_unprintable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &byte in text.as_bytes() {
        if (0x20..0x7f).contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\{:03o}", byte));
        }
    }
    out
}
