use std::env;
use std::io;
use std::process;

use file_magic::cli::{self, Streams};
use file_magic::Magic;

fn main() {
    let lookup = |key: &str| env::var_os(key);
    let mut stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();

    let code = cli::run(
        env::args_os().collect(),
        &lookup,
        Streams {
            stdin: &mut stdin,
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
        Magic::open,
    );

    process::exit(code);
}
