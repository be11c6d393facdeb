use std::ffi::OsString;
use std::fs;
use std::path::Path;

use clap::parser::{Indices, ValueSource};
use clap::ArgMatches;

use super::options::{Arity, FILES, OPTIONS};
use super::os_bytes;
use crate::flags::Flags;

/// Magic database used when neither `-m`, `$MAGIC` nor `~/.magic` name one.
pub const DEFAULT_MAGIC: &str = match option_env!("FILE_MAGIC_PATH") {
    Some(path) => path,
    None => "/usr/share/misc/magic",
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Classify,
    Check,
    Compile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub action: Action,
    pub flags: Flags,
    pub magic_path: String,
    /// How many times `-b` was given.
    pub brief: u8,
    pub no_pad: bool,
    pub no_buffer: bool,
    pub print0: bool,
    pub separator: Vec<u8>,
    pub name_files: Vec<OsString>,
    pub files: Vec<OsString>,
}

/// What the command line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Parsed {
    Run(Config),
    Help,
    /// Print the version, reporting this magic path.
    Version(String),
    Usage,
}

pub type Env<'a> = &'a dyn Fn(&str) -> Option<OsString>;

impl Config {
    pub fn resolve(matches: &ArgMatches, env: Env) -> Parsed {
        let help_at = first_index(matches, "help");
        let version_at = first_index(matches, "version");
        match (help_at, version_at) {
            (Some(help), Some(version)) if help < version => return Parsed::Help,
            (Some(..), None) => return Parsed::Help,
            (_, Some(version)) => return Parsed::Version(magic_path(matches, version, env)),
            (None, None) => {}
        }

        let mut errors = 0;
        let on = |id: &str| matches.get_count(id) > 0;

        let mut flags = Flags::NONE;
        for (id, flag) in [
            ("debug", Flags::DEBUG | Flags::CHECK),
            ("uncompress", Flags::COMPRESS),
            ("mime", Flags::MIME),
            ("mime-type", Flags::MIME_TYPE),
            ("mime-encoding", Flags::MIME_ENCODING),
            ("keep-going", Flags::CONTINUE),
            ("raw", Flags::RAW),
            ("special-files", Flags::DEVICES),
        ] {
            if on(id) {
                flags |= flag;
            }
        }

        for test in values(matches, "exclude") {
            match Flags::exclusion(&test.to_string_lossy()) {
                Some(flag) => flags |= flag,
                None => errors += 1,
            }
        }

        let follow = match (last_index(matches, "dereference"), last_index(matches, "no-dereference")) {
            (Some(deref), Some(no_deref)) => deref > no_deref,
            (Some(..), None) => true,
            (None, Some(..)) => false,
            (None, None) => env("POSIXLY_CORRECT").is_some(),
        };
        if follow {
            flags |= Flags::SYMLINK;
        }

        let action = match (last_index(matches, "checking-printout"), last_index(matches, "compile")) {
            (Some(check), Some(compile)) if check > compile => Action::Check,
            (Some(..), None) => Action::Check,
            (_, Some(..)) => Action::Compile,
            (None, None) => Action::Classify,
        };

        let name_files: Vec<OsString> = values(matches, "files-from").cloned().collect();
        if action != Action::Classify && !name_files.is_empty() {
            errors += 1;
        }

        if errors > 0 {
            return Parsed::Usage;
        }

        Parsed::Run(Config {
            action,
            flags,
            magic_path: magic_path(matches, usize::MAX, env),
            brief: matches.get_count("brief"),
            no_pad: on("no-pad"),
            no_buffer: on("no-buffer"),
            print0: on("print0"),
            separator: values(matches, "separator")
                .last()
                .map_or_else(|| b":".to_vec(), |sep| os_bytes(sep)),
            name_files,
            files: values(matches, FILES).cloned().collect(),
        })
    }
}

fn values<'a>(matches: &'a ArgMatches, id: &str) -> impl Iterator<Item = &'a OsString> {
    matches.get_many::<OsString>(id).into_iter().flatten()
}

/// Argument positions of `id`, counting only what the command line gave.
/// Flags carry an implicit default with an index of its own.
fn given<'a>(matches: &'a ArgMatches, id: &str) -> Option<Indices<'a>> {
    match matches.value_source(id) {
        Some(ValueSource::CommandLine) => matches.indices_of(id),
        _ => None,
    }
}

fn first_index(matches: &ArgMatches, id: &str) -> Option<usize> {
    given(matches, id).and_then(|mut indices| indices.next())
}

fn last_index(matches: &ArgMatches, id: &str) -> Option<usize> {
    given(matches, id).and_then(|indices| indices.last())
}

/// The last `-m` given before argument index `before`, falling back to the
/// environment and then the compiled-in default.
fn magic_path(matches: &ArgMatches, before: usize, env: Env) -> String {
    let given = match given(matches, "magic-file") {
        Some(indices) => indices
            .zip(values(matches, "magic-file"))
            .filter(|(index, _)| *index < before)
            .map(|(_, path)| path)
            .last(),
        None => None,
    };

    match given {
        Some(path) => path.to_string_lossy().into_owned(),
        None => default_magic_path(env),
    }
}

/// Finds `--help` or `-v` in raw arguments that clap rejected. Either one
/// takes effect whatever else is on the command line; the first one wins.
pub fn scan_early(args: &[OsString], env: Env) -> Option<Parsed> {
    let mut magic: Option<String> = None;
    let version = |magic: Option<String>| Some(Parsed::Version(magic.unwrap_or_else(|| default_magic_path(env))));

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        let arg = arg.to_string_lossy();
        if arg == "--" {
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };
            match name {
                "help" => return Some(Parsed::Help),
                "version" => return version(magic),
                _ => {}
            }
            let takes_value = OPTIONS
                .iter()
                .any(|spec| spec.long == name && matches!(spec.arity, Arity::Value(_)));
            if takes_value {
                let value = inline.or_else(|| rest.next().map(|v| v.to_string_lossy().into_owned()));
                if name == "magic-file" && value.is_some() {
                    magic = value;
                }
            }
        } else if let Some(cluster) = arg.strip_prefix('-') {
            for (at, short) in cluster.char_indices() {
                if short == 'v' {
                    return version(magic);
                }
                let takes_value = OPTIONS
                    .iter()
                    .any(|spec| spec.short == Some(short) && matches!(spec.arity, Arity::Value(_)));
                if takes_value {
                    let attached = &cluster[at + short.len_utf8()..];
                    let value = if attached.is_empty() {
                        rest.next().map(|v| v.to_string_lossy().into_owned())
                    } else {
                        Some(attached.to_string())
                    };
                    if short == 'm' && value.is_some() {
                        magic = value;
                    }
                    break;
                }
            }
        }
    }
    None
}

pub fn default_magic_path(env: Env) -> String {
    if let Some(magic) = env("MAGIC") {
        return magic.to_string_lossy().into_owned();
    }

    if let Some(home) = env("HOME") {
        let home_magic = Path::new(&home).join(".magic");
        if fs::metadata(&home_magic).is_ok() {
            return home_magic.to_string_lossy().into_owned();
        }
    }

    DEFAULT_MAGIC.to_string()
}
