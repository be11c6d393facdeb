use std::ffi::OsString;
use std::fmt::Write;

use clap::{value_parser, Arg, ArgAction, Command};

use crate::flags::EXCLUDABLE_CHECKS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Flag,
    Value(&'static str),
}

/// One command-line option. The long name doubles as the clap id.
#[derive(Clone, Copy, Debug)]
pub struct OptionSpec {
    pub short: Option<char>,
    pub long: &'static str,
    pub arity: Arity,
    pub help: &'static str,
}

const fn opt(short: char, long: &'static str, arity: Arity, help: &'static str) -> OptionSpec {
    OptionSpec {
        short: Some(short),
        long,
        arity,
        help,
    }
}

const fn long_only(long: &'static str, arity: Arity, help: &'static str) -> OptionSpec {
    OptionSpec {
        short: None,
        long,
        arity,
        help,
    }
}

/// Positional file arguments.
pub const FILES: &str = "files";

#[rustfmt::skip]
pub const OPTIONS: &[OptionSpec] = &[
    long_only("help", Arity::Flag, "display this help and exit"),
    opt('v', "version", Arity::Flag, "output version information and exit"),
    opt('m', "magic-file", Arity::Value("LIST"),
        "use LIST as a colon-separated list of magic number files"),
    opt('z', "uncompress", Arity::Flag, "try to look inside compressed files"),
    opt('b', "brief", Arity::Flag, "do not prepend filenames to output lines"),
    opt('c', "checking-printout", Arity::Flag,
        "print the parsed form of the magic file, use in conjunction with -m to debug a new magic file before installing it"),
    opt('e', "exclude", Arity::Value("TEST"),
        "exclude TEST from the list of tests to be performed for file"),
    opt('f', "files-from", Arity::Value("FILE"), "read the filenames to be examined from FILE"),
    opt('F', "separator", Arity::Value("STRING"), "use string as separator instead of `:'"),
    opt('i', "mime", Arity::Flag, "output MIME type strings (--mime-type and --mime-encoding)"),
    long_only("mime-type", Arity::Flag, "output the MIME type"),
    long_only("mime-encoding", Arity::Flag, "output the MIME encoding"),
    opt('k', "keep-going", Arity::Flag, "don't stop at the first match"),
    opt('L', "dereference", Arity::Flag, "follow symlinks (default if POSIXLY_CORRECT is set)"),
    opt('h', "no-dereference", Arity::Flag, "don't follow symlinks (default if POSIXLY_CORRECT is not set)"),
    opt('n', "no-buffer", Arity::Flag, "do not buffer output"),
    opt('N', "no-pad", Arity::Flag, "do not pad output"),
    opt('0', "print0", Arity::Flag, "terminate filenames with ASCII NUL"),
    opt('r', "raw", Arity::Flag, "don't translate unprintable chars to \\ooo"),
    opt('s', "special-files", Arity::Flag, "treat special (block/char devices) files as ordinary ones"),
    opt('C', "compile", Arity::Flag, "compile file specified by -m"),
    opt('d', "debug", Arity::Flag, "print debugging messages"),
];

/// The clap command for [`OPTIONS`]. Help and version output are rendered
/// by the driver, so clap's own flags are off.
pub fn command() -> Command {
    let mut cmd = Command::new("file")
        .disable_help_flag(true)
        .disable_version_flag(true);

    for spec in OPTIONS {
        let mut arg = Arg::new(spec.long).long(spec.long);
        if let Some(short) = spec.short {
            arg = arg.short(short);
        }
        arg = match spec.arity {
            Arity::Flag => arg.action(ArgAction::Count),
            Arity::Value(value_name) => arg
                .action(ArgAction::Append)
                .num_args(1)
                .value_name(value_name)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(OsString)),
        };
        cmd = cmd.arg(arg);
    }

    cmd.arg(
        Arg::new(FILES)
            .action(ArgAction::Append)
            .num_args(1..)
            .value_parser(value_parser!(OsString)),
    )
}

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {0} [-bcikLhnNrsvz0] [-e test] [-f namefile] [-F separator] [-m magicfiles] file...\n\
         \x20      {0} -C -m magicfiles\n\
         Try `{0} --help' for more information.\n",
        prog
    )
}

const HELP_COLUMN: usize = 30;

pub fn help(prog: &str) -> String {
    let mut out = format!("Usage: {} [OPTION...] [FILE...]\nDetermine type of FILEs.\n\n", prog);

    for spec in OPTIONS {
        let mut left = match spec.short {
            Some(short) => format!("  -{}, --{}", short, spec.long),
            None => format!("      --{}", spec.long),
        };
        if let Arity::Value(value_name) = spec.arity {
            left.push(' ');
            left.push_str(value_name);
        }

        if left.len() + 1 < HELP_COLUMN {
            let _ = writeln!(out, "{:<width$}{}", left, spec.help, width = HELP_COLUMN);
        } else {
            let _ = writeln!(out, "{}\n{:width$}{}", left, "", spec.help, width = HELP_COLUMN);
        }
    }

    let tests: Vec<&str> = EXCLUDABLE_CHECKS.iter().map(|(name, _)| *name).collect();
    let _ = writeln!(out, "\nValid tests for --exclude are: {}", tests.join(", "));
    out
}
