use std::str;

use unicode_width::UnicodeWidthChar;

/// Terminal columns taken by a file name. Names that aren't valid UTF-8
/// count one column per byte.
pub fn mbswidth(name: &[u8]) -> usize {
    match str::from_utf8(name) {
        Ok(text) => text
            .chars()
            .map(|c| match c {
                '\n' => 1,
                c => c.width().unwrap_or(0),
            })
            .sum(),
        Err(..) => name.len(),
    }
}
