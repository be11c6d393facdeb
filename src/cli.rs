//! The `file` command: option handling, the classification loop and its
//! output format, on top of any [`Engine`].

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::error::{ContextKind, ErrorKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::engine::Engine;
use crate::error::{io_message, MagicResult};
use crate::flags::Flags;

pub use self::config::{Action, Config, Env, Parsed, DEFAULT_MAGIC};
pub use self::width::mbswidth;

pub mod config;
pub mod options;
pub mod width;

/// Where the driver reads names from and writes its output.
pub struct Streams<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Runs `file` with `args` (program name first) and returns the exit status.
///
/// `open` builds the engine from the resolved flags; it is called at most
/// once.
pub fn run<E, F>(args: Vec<OsString>, env: Env, streams: Streams, open: F) -> i32
where
    E: Engine,
    F: FnOnce(Flags) -> MagicResult<E>,
{
    let prog = args
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    let mut driver = Driver { prog, streams };
    match driver.run(args, env, open) {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(driver.streams.stderr, "{}: {}", driver.prog, io_message(&err));
            1
        }
    }
}

struct Driver<'a> {
    prog: String,
    streams: Streams<'a>,
}

impl<'a> Driver<'a> {
    fn run<E, F>(&mut self, args: Vec<OsString>, env: Env, open: F) -> io::Result<i32>
    where
        E: Engine,
        F: FnOnce(Flags) -> MagicResult<E>,
    {
        let matches = match options::command().try_get_matches_from(args.iter()) {
            Ok(matches) => matches,
            Err(err) => {
                if let Some(early) = config::scan_early(&args, env) {
                    return self.finish(early);
                }
                let problem = match err.kind() {
                    ErrorKind::UnknownArgument => match err.get(ContextKind::InvalidArg) {
                        Some(arg) => format!("unrecognized option '{}'", arg),
                        None => "unrecognized option".to_string(),
                    },
                    kind => kind.as_str().unwrap_or("invalid arguments").to_string(),
                };
                writeln!(self.streams.stderr, "{}: {}", self.prog, problem)?;
                return self.usage();
            }
        };

        match Config::resolve(&matches, env) {
            Parsed::Run(config) => {
                init_logging(config.flags.contains(Flags::DEBUG));
                debug!(?config, "resolved configuration");

                match config.action {
                    Action::Check | Action::Compile => self.maintain(&config, open),
                    Action::Classify => self.classify(&config, open),
                }
            }
            other => self.finish(other),
        }
    }

    /// Help, version and usage: output that ends the run before any engine
    /// exists.
    fn finish(&mut self, parsed: Parsed) -> io::Result<i32> {
        match parsed {
            Parsed::Help => {
                self.streams.stderr.write_all(options::help(&self.prog).as_bytes())?;
                Ok(0)
            }
            Parsed::Version(magic_path) => {
                writeln!(self.streams.stderr, "{}-{}", self.prog, env!("CARGO_PKG_VERSION"))?;
                writeln!(self.streams.stderr, "magic file from {}", magic_path)?;
                Ok(1)
            }
            Parsed::Usage | Parsed::Run(..) => self.usage(),
        }
    }

    fn usage(&mut self) -> io::Result<i32> {
        self.streams.stderr.write_all(options::usage(&self.prog).as_bytes())?;
        Ok(1)
    }

    /// `-c` and `-C`: one engine operation on the magic path, no files.
    fn maintain<E, F>(&mut self, config: &Config, open: F) -> io::Result<i32>
    where
        E: Engine,
        F: FnOnce(Flags) -> MagicResult<E>,
    {
        let mut engine = match open(config.flags | Flags::CHECK) {
            Ok(engine) => engine,
            Err(err) => {
                writeln!(self.streams.stderr, "{}: {}", self.prog, err)?;
                return Ok(1);
            }
        };

        let result = match config.action {
            Action::Compile => engine.compile(&config.magic_path),
            _ => engine.check(&config.magic_path),
        };

        match result {
            Ok(()) => Ok(0),
            Err(err) => {
                writeln!(self.streams.stderr, "{}: {}", self.prog, err)?;
                Ok(-1)
            }
        }
    }

    fn classify<E, F>(&mut self, config: &Config, open: F) -> io::Result<i32>
    where
        E: Engine,
        F: FnOnce(Flags) -> MagicResult<E>,
    {
        let loaded = open(config.flags).and_then(|mut engine| {
            engine.load(&config.magic_path)?;
            Ok(engine)
        });
        let mut engine = match loaded {
            Ok(engine) => engine,
            Err(err) => {
                writeln!(self.streams.stderr, "{}: {}", self.prog, err)?;
                return Ok(1);
            }
        };

        if config.files.is_empty() && config.name_files.is_empty() {
            return self.usage();
        }

        for name_file in config.name_files.iter() {
            if let Some(code) = self.name_file(config, &mut engine, name_file)? {
                return Ok(code);
            }
        }

        let names: Vec<Vec<u8>> = config.files.iter().map(|file| os_bytes(file)).collect();
        let width = names.iter().map(|name| mbswidth(name)).max().unwrap_or(0);
        let brief = match config.brief {
            0 => false,
            2 => names.len() == 1,
            _ => true,
        };
        for name in names.iter() {
            self.target(config, &mut engine, name, width, brief)?;
        }

        self.streams.stdout.flush()?;
        Ok(if engine.had_error() { 1 } else { 0 })
    }

    /// `-f`: classifies every line of `name_file`. Returns an exit status
    /// when the file can't be read.
    fn name_file<E: Engine>(
        &mut self,
        config: &Config,
        engine: &mut E,
        name_file: &OsStr,
    ) -> io::Result<Option<i32>> {
        let mut contents = Vec::new();
        let from_stdin = name_file == "-";
        let read = if from_stdin {
            self.streams.stdin.read_to_end(&mut contents)
        } else {
            File::open(name_file).and_then(|mut file| file.read_to_end(&mut contents))
        };
        if let Err(err) = read {
            writeln!(
                self.streams.stderr,
                "{}: Cannot open `{}' ({}).",
                self.prog,
                name_file.to_string_lossy(),
                io_message(&err)
            )?;
            return Ok(Some(1));
        }

        let mut lines: Vec<&[u8]> = contents.split(|&b| b == b'\n').collect();
        if contents.is_empty() || contents.ends_with(b"\n") {
            lines.pop();
        }

        let width = if from_stdin {
            1
        } else {
            lines.iter().map(|line| mbswidth(line)).max().unwrap_or(0)
        };
        let brief = config.brief != 0;
        for line in lines {
            self.target(config, engine, line, width, brief)?;
        }

        Ok(None)
    }

    /// Prints one output line: the padded label unless `brief`, then the
    /// description or the error.
    fn target<E: Engine>(
        &mut self,
        config: &Config,
        engine: &mut E,
        name: &[u8],
        width: usize,
        brief: bool,
    ) -> io::Result<()> {
        let from_stdin = name == b"-";
        let out = &mut *self.streams.stdout;

        if width > 0 && !brief {
            out.write_all(if from_stdin { &b"/dev/stdin"[..] } else { name })?;
            if config.print0 {
                out.write_all(b"\0")?;
            } else {
                out.write_all(&config.separator)?;
            }
            let pad = if config.no_pad {
                0
            } else {
                width.saturating_sub(mbswidth(name))
            };
            write!(out, "{:pad$} ", "", pad = pad)?;
        }

        let described = if from_stdin {
            engine.stdin(&mut *self.streams.stdin)
        } else {
            engine.file(Path::new(&*bytes_path(name)))
        };
        match described {
            Ok(description) => writeln!(out, "{}", description)?,
            Err(err) => writeln!(out, "ERROR: {}", err)?,
        }

        if config.no_buffer {
            out.flush()?;
        }
        Ok(())
    }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(unix)]
pub(crate) fn os_bytes(s: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().to_vec()
}

#[cfg(not(unix))]
pub(crate) fn os_bytes(s: &OsStr) -> Vec<u8> {
    s.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn bytes_path(name: &[u8]) -> Cow<'_, OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(OsStr::from_bytes(name))
}

#[cfg(not(unix))]
fn bytes_path(name: &[u8]) -> Cow<'_, OsStr> {
    Cow::Owned(OsString::from(String::from_utf8_lossy(name).into_owned()))
}
