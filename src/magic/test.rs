use crate::data_type::{sign_extend, DataType, Value};
use serde::{Deserialize, Serialize};

/// Longest value a `string x` test will pull out of the file.
const MAX_STRING: usize = 96;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Test {
    AlwaysTrue,
    Number(NumericTest),
    Float(FloatTest),
    String(StringTest),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum NumOp {
    Equal,
    LessThan,
    GreaterThan,
    NotEqual,
    /// `&`: every bit of the test value is set.
    AllSet,
    /// `^`: at least one bit of the test value is clear.
    AnyClear,
    /// `~`: equal to the complement of the test value.
    Negated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum StringOp {
    Equal,
    LexBefore,
    LexAfter,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NumericTest {
    pub op: NumOp,
    pub value: u64,
    pub mask: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FloatTest {
    pub op: NumOp,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StringTest {
    pub op: StringOp,
    pub value: Vec<u8>,
    pub case_insensitive: bool,
}

/// What a successful test saw in the file.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub value: Value,
    /// Position just past the bytes the test consumed.
    pub end: usize,
}

impl NumericTest {
    pub fn new(op: NumOp, value: u64, mask: Option<u64>) -> NumericTest {
        NumericTest { op, value, mask }
    }

    pub fn matches(&self, data_type: &DataType, raw: u64) -> bool {
        let width = data_type.width_mask();
        let file_value = match self.mask {
            Some(mask) => raw & mask & width,
            None => raw & width,
        };
        let test_value = self.value & width;

        match self.op {
            NumOp::Equal => file_value == test_value,
            NumOp::NotEqual => file_value != test_value,
            NumOp::AllSet => file_value & test_value == test_value,
            NumOp::AnyClear => file_value & test_value != test_value,
            NumOp::Negated => file_value == !test_value & width,
            NumOp::LessThan | NumOp::GreaterThan => {
                let ordering = if data_type.is_signed() {
                    let size = data_type.size().unwrap_or(8);
                    sign_extend(file_value, size).cmp(&sign_extend(test_value, size))
                } else {
                    file_value.cmp(&test_value)
                };
                match self.op {
                    NumOp::LessThan => ordering.is_lt(),
                    _ => ordering.is_gt(),
                }
            }
        }
    }
}

impl FloatTest {
    pub fn new(op: NumOp, value: f64) -> FloatTest {
        FloatTest { op, value }
    }

    pub fn matches(&self, file_value: f64) -> bool {
        match self.op {
            NumOp::Equal => file_value == self.value,
            NumOp::NotEqual => file_value != self.value,
            NumOp::LessThan => file_value < self.value,
            NumOp::GreaterThan => file_value > self.value,
            NumOp::AllSet | NumOp::AnyClear | NumOp::Negated => false,
        }
    }
}

impl StringTest {
    pub fn new(op: StringOp, value: Vec<u8>) -> StringTest {
        StringTest {
            op,
            value,
            case_insensitive: false,
        }
    }

    pub fn case_insensitive(mut self, flag: bool) -> StringTest {
        self.case_insensitive = flag;
        self
    }

    /// Compares the test string against the file at `offset`. On a match,
    /// returns the number of file bytes compared.
    pub fn matches(&self, buf: &[u8], offset: usize) -> Option<usize> {
        let available = buf.get(offset..)?;

        match self.op {
            StringOp::Equal => {
                let candidate = available.get(..self.value.len())?;
                if self.bytes_equal(candidate) {
                    Some(self.value.len())
                } else {
                    None
                }
            }
            StringOp::LexBefore | StringOp::LexAfter => {
                let len = self.value.len().min(available.len());
                let candidate = self.fold(&available[..len]);
                let ordering = candidate.cmp(&self.fold(&self.value));
                let ok = match self.op {
                    StringOp::LexBefore => ordering.is_lt(),
                    _ => ordering.is_gt(),
                };
                if ok {
                    Some(len)
                } else {
                    None
                }
            }
        }
    }

    fn bytes_equal(&self, candidate: &[u8]) -> bool {
        if self.case_insensitive {
            candidate.eq_ignore_ascii_case(&self.value)
        } else {
            candidate == self.value.as_slice()
        }
    }

    fn fold(&self, bytes: &[u8]) -> Vec<u8> {
        if self.case_insensitive {
            bytes.to_ascii_lowercase()
        } else {
            bytes.to_vec()
        }
    }
}

impl Test {
    /// Runs the test against the value of `data_type` found at `offset`.
    pub fn perform(&self, data_type: &DataType, buf: &[u8], offset: usize) -> Option<Hit> {
        match (self, data_type) {
            (Test::String(test), DataType::String) => {
                let len = test.matches(buf, offset)?;
                Some(Hit {
                    value: Value::Bytes(buf[offset..offset + len].to_vec()),
                    end: offset + len,
                })
            }
            (Test::AlwaysTrue, DataType::String) => {
                let rest = buf.get(offset..)?;
                let limit = rest.len().min(MAX_STRING);
                let len = rest[..limit].iter().position(|&b| b == 0).unwrap_or(limit);
                Some(Hit {
                    value: Value::Bytes(rest[..len].to_vec()),
                    end: offset + len,
                })
            }
            (Test::Float(test), _) => {
                let value = data_type.read_float(buf, offset)?;
                let end = offset + data_type.size()?;
                if test.matches(value) {
                    Some(Hit { value: Value::Float(value), end })
                } else {
                    None
                }
            }
            (Test::AlwaysTrue, _) if data_type.is_float() => {
                let value = data_type.read_float(buf, offset)?;
                Some(Hit {
                    value: Value::Float(value),
                    end: offset + data_type.size()?,
                })
            }
            (Test::Number(test), _) => {
                let raw = data_type.read_raw(buf, offset)?;
                if !test.matches(data_type, raw) {
                    return None;
                }
                let raw = test.mask.map_or(raw, |mask| raw & mask);
                Some(Hit {
                    value: data_type.to_value(raw),
                    end: offset + data_type.size()?,
                })
            }
            (Test::AlwaysTrue, _) => {
                let raw = data_type.read_raw(buf, offset)?;
                Some(Hit {
                    value: data_type.to_value(raw),
                    end: offset + data_type.size()?,
                })
            }
            (Test::String(..), _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian::*;

    fn number(op: NumOp, value: u64) -> Test {
        Test::Number(NumericTest::new(op, value, None))
    }

    #[test]
    fn numeric_equality() {
        let dt = DataType::Long { endian: Big, signed: false };
        let buf = b"\x7fELF\x02";
        let hit = number(NumOp::Equal, 0x7f45_4c46).perform(&dt, buf, 0);
        assert_eq!(Some(Hit { value: Value::Unsigned(0x7f45_4c46), end: 4 }), hit);
        assert_eq!(None, number(NumOp::NotEqual, 0x7f45_4c46).perform(&dt, buf, 0));
    }

    #[test]
    fn signed_comparisons() {
        let dt = DataType::Byte { signed: true };
        assert!(NumericTest::new(NumOp::LessThan, 0, None).matches(&dt, 0xff));
        let dt = DataType::Byte { signed: false };
        assert!(NumericTest::new(NumOp::GreaterThan, 0, None).matches(&dt, 0xff));
    }

    #[test]
    fn negative_test_values_truncate_to_width() {
        let dt = DataType::Short { endian: Little, signed: true };
        assert!(NumericTest::new(NumOp::Equal, -1i64 as u64, None).matches(&dt, 0xffff));
    }

    #[test]
    fn bit_operators() {
        let dt = DataType::Byte { signed: false };
        assert!(NumericTest::new(NumOp::AllSet, 0x81, None).matches(&dt, 0xc1));
        assert!(!NumericTest::new(NumOp::AllSet, 0x81, None).matches(&dt, 0x80));
        assert!(NumericTest::new(NumOp::AnyClear, 0x81, None).matches(&dt, 0x80));
        assert!(NumericTest::new(NumOp::Negated, 0x0f, None).matches(&dt, 0xf0));
    }

    #[test]
    fn masked_values() {
        let dt = DataType::Short { endian: Big, signed: false };
        let test = Test::Number(NumericTest::new(NumOp::Equal, 0x0100, Some(0xff00)));
        let hit = test.perform(&dt, &[0x01, 0x7f], 0);
        assert_eq!(Some(Hit { value: Value::Unsigned(0x0100), end: 2 }), hit);
    }

    #[test]
    fn string_tests() {
        let test = Test::String(StringTest::new(StringOp::Equal, b"%PDF-".to_vec()));
        let hit = test.perform(&DataType::String, b"%PDF-1.4", 0);
        assert_eq!(Some(Hit { value: Value::Bytes(b"%PDF-".to_vec()), end: 5 }), hit);
        assert_eq!(None, test.perform(&DataType::String, b"%PD", 0));

        let test = StringTest::new(StringOp::Equal, b"<html".to_vec()).case_insensitive(true);
        assert_eq!(Some(5), test.matches(b"<HTML>", 0));
    }

    #[test]
    fn lexical_string_tests() {
        let before = StringTest::new(StringOp::LexBefore, b"m".to_vec());
        assert_eq!(Some(1), before.matches(b"abc", 0));
        assert_eq!(None, before.matches(b"zzz", 0));
        let after = StringTest::new(StringOp::LexAfter, b"\0".to_vec());
        assert_eq!(Some(1), after.matches(b"x", 0));
    }

    #[test]
    fn string_x_stops_at_nul() {
        let hit = Test::AlwaysTrue.perform(&DataType::String, b"hello\0world", 0);
        assert_eq!(Some(Hit { value: Value::Bytes(b"hello".to_vec()), end: 5 }), hit);
    }

    #[test]
    fn float_tests() {
        let dt = DataType::Float(Little);
        let buf = 2.5f32.to_le_bytes();
        let test = Test::Float(FloatTest::new(NumOp::GreaterThan, 2.0));
        assert_eq!(Some(Hit { value: Value::Float(2.5), end: 4 }), test.perform(&dt, &buf, 0));
    }
}
