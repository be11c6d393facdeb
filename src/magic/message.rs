use crate::data_type::Value;

/// Renders a magic entry's description, substituting the first printf-style
/// conversion with the value the entry's test saw.
pub fn render(template: &str, value: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut used = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '#' => spec.alternate = true,
                '+' | ' ' => {}
                _ => break,
            }
            chars.next();
        }
        spec.width = digits(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(digits(&mut chars).unwrap_or(0));
        }
        while let Some(&'h' | &'l' | &'q' | &'L' | &'j' | &'z' | &'t') = chars.peek() {
            chars.next();
        }

        let conversion = match chars.next() {
            Some(conv) => conv,
            None => {
                out.push('%');
                break;
            }
        };
        if conversion == '%' {
            out.push('%');
            continue;
        }
        if used {
            // Only one value per entry.
            continue;
        }
        used = true;

        let body = match conversion {
            'd' | 'i' => value.as_i64().to_string(),
            'u' => value.as_u64().to_string(),
            'x' => prefixed(spec.alternate, "0x", format!("{:x}", value.as_u64())),
            'X' => prefixed(spec.alternate, "0X", format!("{:X}", value.as_u64())),
            'o' => prefixed(spec.alternate, "0", format!("{:o}", value.as_u64())),
            'c' => char::from(value.as_u64() as u8).to_string(),
            's' => {
                let text = match value {
                    Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    Value::Float(f) => f.to_string(),
                    other => other.as_i64().to_string(),
                };
                match spec.precision {
                    Some(limit) => text.chars().take(limit).collect(),
                    None => text,
                }
            }
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
                let f = match value {
                    Value::Float(f) => *f,
                    other => other.as_i64() as f64,
                };
                format!("{:.*}", spec.precision.unwrap_or(6), f)
            }
            other => format!("%{}", other),
        };
        spec.pad(&body, &mut out);
    }

    out
}

#[derive(Default)]
struct Spec {
    left: bool,
    zero: bool,
    alternate: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Spec {
    fn pad(&self, body: &str, out: &mut String) {
        let len = body.chars().count();
        let fill = self.width.unwrap_or(0).saturating_sub(len);

        if self.left {
            out.push_str(body);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if self.zero {
            let (sign, digits) = match body.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", body),
            };
            out.push_str(sign);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(digits);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(body);
        }
    }
}

/// Widths and precisions beyond this are clamped.
const MAX_FIELD: usize = 1024;

fn digits<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    n.map(|n| n.min(MAX_FIELD))
}

fn prefixed(alternate: bool, prefix: &str, digits: String) -> String {
    if alternate && digits != "0" {
        format!("{}{}", prefix, digits)
    } else {
        digits
    }
}
