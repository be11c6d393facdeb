use crate::data_type::{sign_extend, DataType};
use serde::{Deserialize, Serialize};

// 123     123 bytes from the start
// &123    123 bytes from here
// (123)   (the value at 123 bytes from the start) bytes from the start
// (&123)  (the value at 123 bytes from here) bytes from the start
// &(123)  (the value at 123 bytes from the start) bytes from here
// &(&123) (the value at 123 bytes from here) bytes from here
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Offset {
    Direct(DirectOffset),
    AbsoluteIndirect(IndirectOffset),
    RelativeIndirect(IndirectOffset),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum DirectOffset {
    Absolute(u64),
    Relative(i64),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndirectOffset {
    pub base: DirectOffset,
    pub data_type: DataType,
    pub bias: i64,
}

impl Offset {
    pub fn direct(base: DirectOffset) -> Offset {
        Offset::Direct(base)
    }

    /// Turns the offset into a position in `buf`. `here` is the end of the
    /// parent entry's match, which relative offsets count from. `None` when
    /// an indirect pointer can't be read or the arithmetic leaves the file.
    pub fn resolve(&self, buf: &[u8], here: usize) -> Option<usize> {
        match self {
            Offset::Direct(direct) => direct.resolve(here),
            Offset::AbsoluteIndirect(indirect) => indirect.resolve(buf, here),
            Offset::RelativeIndirect(indirect) => {
                let target = indirect.resolve(buf, here)?;
                here.checked_add(target)
            }
        }
    }
}

impl DirectOffset {
    pub fn absolute(val: u64) -> DirectOffset {
        DirectOffset::Absolute(val)
    }

    pub fn relative(val: i64) -> DirectOffset {
        DirectOffset::Relative(val)
    }

    pub fn resolve(self, here: usize) -> Option<usize> {
        match self {
            DirectOffset::Absolute(off) => usize::try_from(off).ok(),
            DirectOffset::Relative(off) => {
                let pos = (here as i64).checked_add(off)?;
                usize::try_from(pos).ok()
            }
        }
    }
}

impl IndirectOffset {
    fn resolve(&self, buf: &[u8], here: usize) -> Option<usize> {
        let pointer_at = self.base.resolve(here)?;
        let raw = self.data_type.read_raw(buf, pointer_at)?;
        let pointer = if self.data_type.is_signed() {
            sign_extend(raw, self.data_type.size().unwrap_or(8))
        } else {
            i64::try_from(raw).ok()?
        };
        usize::try_from(pointer.checked_add(self.bias)?).ok()
    }
}
