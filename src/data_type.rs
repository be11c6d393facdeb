use crate::endian::Endian;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum DataType {
    Byte  {                 signed: bool },
    Short { endian: Endian, signed: bool },
    Long  { endian: Endian, signed: bool },
    Quad  { endian: Endian, signed: bool },
    Float(Endian),
    Double(Endian),

    String,
}

/// A value pulled out of the file being classified.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl DataType {
    pub fn endian(&self) -> Endian {
        use self::DataType::*;

        match *self {
            Byte  { .. } | String => Endian::Native,
            Short { endian, .. } | Long { endian, .. } | Quad { endian, .. } => endian,
            Float(endian) | Double(endian) => endian,
        }
    }

    /// Width in bytes of the on-disk value, `None` for strings.
    pub fn size(&self) -> Option<usize> {
        use self::DataType::*;

        match *self {
            Byte  { .. } => Some(1),
            Short { .. } => Some(2),
            Long  { .. } | Float(..) => Some(4),
            Quad  { .. } | Double(..) => Some(8),
            String => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        use self::DataType::*;

        match *self {
            Byte { signed } | Short { signed, .. } | Long { signed, .. } | Quad { signed, .. } => signed,
            Float(..) | Double(..) => true,
            String => false,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(*self, DataType::Float(..) | DataType::Double(..))
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float() && *self != DataType::String
    }

    /// The raw bits of an integer value at `offset`, zero-extended. `None` when
    /// the value runs past the end of `buf` or the type isn't an integer.
    pub fn read_raw(&self, buf: &[u8], offset: usize) -> Option<u64> {
        if !self.is_integer() {
            return None;
        }
        let size = self.size()?;
        let bytes = buf.get(offset..offset.checked_add(size)?)?;
        Some(self.endian().read_uint(bytes, size))
    }

    pub fn read_float(&self, buf: &[u8], offset: usize) -> Option<f64> {
        let size = self.size()?;
        let bytes = buf.get(offset..offset.checked_add(size)?)?;

        match *self {
            DataType::Float(endian) => Some(endian.read_f32(bytes) as f64),
            DataType::Double(endian) => Some(endian.read_f64(bytes)),
            _ => None,
        }
    }

    /// All-ones mask covering the width of an integer type.
    pub fn width_mask(&self) -> u64 {
        match self.size() {
            Some(size) if size < 8 => (1u64 << (size * 8)) - 1,
            _ => u64::MAX,
        }
    }

    /// Interprets raw bits as a value of this type, sign-extending signed
    /// integers.
    pub fn to_value(&self, raw: u64) -> Value {
        let raw = raw & self.width_mask();
        if self.is_signed() {
            Value::Signed(sign_extend(raw, self.size().unwrap_or(8)))
        } else {
            Value::Unsigned(raw)
        }
    }
}

pub fn sign_extend(raw: u64, size: usize) -> i64 {
    match size {
        1 => raw as u8 as i8 as i64,
        2 => raw as u16 as i16 as i64,
        4 => raw as u32 as i32 as i64,
        _ => raw as i64,
    }
}

impl Value {
    pub fn as_u64(&self) -> u64 {
        match *self {
            Value::Unsigned(n) => n,
            Value::Signed(n) => n as u64,
            Value::Float(f) => f as u64,
            Value::Bytes(..) => 0,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match *self {
            Value::Unsigned(n) => n as i64,
            Value::Signed(n) => n,
            Value::Float(f) => f as i64,
            Value::Bytes(..) => 0,
        }
    }
}
