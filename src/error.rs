use quick_error::quick_error;
use std::io;

pub type MagicResult<T> = Result<T, MagicError>;

quick_error! {
    #[derive(Debug)]
    pub enum MagicError {
        Io(err: io::Error) {
            source(err)
            display("{}", io_message(err))
            from()
        }

        Open(path: String, err: io::Error) {
            source(err)
            display("cannot open `{}' ({})", path, io_message(err))
        }

        Parse(filename: String, line_num: usize, desc: String) {
            display("{}, {}: {}", filename, line_num, desc)
        }

        Structure(desc: String) {
            display("{}", desc)
        }

        Format(filename: String, desc: String) {
            display("{}: {}", filename, desc)
        }

        Encode(err: rmp_serde::encode::Error) {
            source(err)
            display("cannot encode compiled magic: {}", err)
            from()
        }

        Decode(err: rmp_serde::decode::Error) {
            source(err)
            display("cannot decode compiled magic: {}", err)
            from()
        }

        NotLoaded {
            display("no magic files loaded")
        }
    }
}

/// The OS description of an I/O error, without the "(os error N)" suffix
/// that `io::Error`'s `Display` appends.
pub fn io_message(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}
