use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Endian {
    Little,
    Big,
    Native,
    Pdp11,
}

// PDP-11 only has a middle-endian layout for 32-bit values; the narrower and
// wider reads fall back to little-endian, which is what the machine did for
// 16-bit words anyway.
macro_rules! read_fn {
    ($ty:ty, $read_fn:ident) => {
        pub fn $read_fn(self, buf: &[u8]) -> $ty {
            use self::Endian::*;

            match self {
                Little | Pdp11 => LittleEndian::$read_fn(buf),
                Big => BigEndian::$read_fn(buf),
                Native => NativeEndian::$read_fn(buf),
            }
        }
    };
}

impl Endian {
    read_fn!(u16, read_u16);
    read_fn!(u64, read_u64);
    read_fn!(f64, read_f64);

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        use self::Endian::*;

        match self {
            Little => LittleEndian::read_u32(buf),
            Big => BigEndian::read_u32(buf),
            Native => NativeEndian::read_u32(buf),
            Pdp11 => pdp11_u32(buf),
        }
    }

    pub fn read_f32(self, buf: &[u8]) -> f32 {
        f32::from_bits(self.read_u32(buf))
    }

    /// Reads an unsigned value of `size` bytes (1, 2, 4 or 8), zero-extended.
    pub fn read_uint(self, buf: &[u8], size: usize) -> u64 {
        match size {
            1 => buf[0] as u64,
            2 => self.read_u16(buf) as u64,
            4 => self.read_u32(buf) as u64,
            _ => self.read_u64(buf),
        }
    }
}

/// Two little-endian 16-bit words, high word first.
fn pdp11_u32(buf: &[u8]) -> u32 {
    let high_word = LittleEndian::read_u16(&buf[0..2]) as u32;
    let low_word = LittleEndian::read_u16(&buf[2..4]) as u32;
    (high_word << 16) | low_word
}

#[cfg(test)]
mod tests {
    use super::Endian;

    #[test]
    fn pdp11_u32() {
        let buf: [u8; 4] = [2, 1, 4, 3];
        assert_eq!(0x0102_0304, Endian::Pdp11.read_u32(&buf));
    }

    #[test]
    fn pdp11_narrow_reads_are_little_endian() {
        assert_eq!(0x0102, Endian::Pdp11.read_u16(&[2, 1]));
    }

    #[test]
    fn sized_reads() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        assert_eq!(0x12, Endian::Big.read_uint(&buf, 1));
        assert_eq!(0x1234, Endian::Big.read_uint(&buf, 2));
        assert_eq!(0x3412, Endian::Little.read_uint(&buf, 2));
        assert_eq!(0x1234_5678, Endian::Big.read_uint(&buf, 4));
        assert_eq!(0xf0de_bc9a_7856_3412, Endian::Little.read_uint(&buf, 8));
    }

    #[test]
    fn float_reads() {
        let buf = 1.5f32.to_be_bytes();
        assert_eq!(1.5, Endian::Big.read_f32(&buf));
        let buf = (-2.25f64).to_le_bytes();
        assert_eq!(-2.25, Endian::Little.read_f64(&buf));
    }
}
