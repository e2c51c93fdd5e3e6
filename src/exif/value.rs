use crate::taxonomy::{FieldKey, IfdGroup, Tag};

/// Byte order of a TIFF structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `II`
    Little,
    /// `MM`
    Big,
}

impl ByteOrder {
    pub(crate) fn u16(self, b: &[u8]) -> u16 {
        let b = [b[0], b[1]];
        match self {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        }
    }

    pub(crate) fn u32(self, b: &[u8]) -> u32 {
        let b = [b[0], b[1], b[2], b[3]];
        match self {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        }
    }

    pub(crate) fn u64(self, b: &[u8]) -> u64 {
        let b = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        match self {
            ByteOrder::Little => u64::from_le_bytes(b),
            ByteOrder::Big => u64::from_be_bytes(b),
        }
    }

    pub(crate) fn put_u16(self, out: &mut Vec<u8>, v: u16) {
        match self {
            ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub(crate) fn put_u32(self, out: &mut Vec<u8>, v: u32) {
        match self {
            ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub(crate) fn put_u64(self, out: &mut Vec<u8>, v: u64) {
        match self {
            ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }
}

// TIFF field types
pub const BYTE: u16 = 1;
pub const ASCII: u16 = 2;
pub const SHORT: u16 = 3;
pub const LONG: u16 = 4;
pub const RATIONAL: u16 = 5;
pub const SBYTE: u16 = 6;
pub const UNDEFINED: u16 = 7;
pub const SSHORT: u16 = 8;
pub const SLONG: u16 = 9;
pub const SRATIONAL: u16 = 10;
pub const FLOAT: u16 = 11;
pub const DOUBLE: u16 = 12;
pub const IFD: u16 = 13;
/// EXIF 3.0 UTF-8 string.
pub const UTF8: u16 = 129;

/// Size in bytes of one component of a field type, `None` for types the
/// TIFF/EXIF standards do not define.
pub fn type_size(format: u16) -> Option<usize> {
    match format {
        BYTE | ASCII | SBYTE | UNDEFINED | UTF8 => Some(1),
        SHORT | SSHORT => Some(2),
        LONG | SLONG | FLOAT | IFD => Some(4),
        RATIONAL | SRATIONAL | DOUBLE => Some(8),
        _ => None,
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Utf8(String),
}

impl Value {
    pub fn format(&self) -> u16 {
        match self {
            Value::Byte(_) => BYTE,
            Value::Ascii(_) => ASCII,
            Value::Short(_) => SHORT,
            Value::Long(_) => LONG,
            Value::Rational(_) => RATIONAL,
            Value::SByte(_) => SBYTE,
            Value::Undefined(_) => UNDEFINED,
            Value::SShort(_) => SSHORT,
            Value::SLong(_) => SLONG,
            Value::SRational(_) => SRATIONAL,
            Value::Float(_) => FLOAT,
            Value::Double(_) => DOUBLE,
            Value::Utf8(_) => UTF8,
        }
    }

    /// Decode raw field bytes. `data` must hold exactly `count * type_size`
    /// bytes, which the container guarantees.
    pub fn decode(format: u16, data: &[u8], order: ByteOrder) -> Option<Value> {
        let size = type_size(format)?;
        let chunks = data.chunks_exact(size);
        let value = match format {
            BYTE => Value::Byte(data.to_vec()),
            ASCII => Value::Ascii(text_until_nul(data)),
            UTF8 => Value::Utf8(text_until_nul(data)),
            SHORT => Value::Short(chunks.map(|c| order.u16(c)).collect()),
            LONG | IFD => Value::Long(chunks.map(|c| order.u32(c)).collect()),
            RATIONAL => Value::Rational(
                chunks
                    .map(|c| (order.u32(&c[0..4]), order.u32(&c[4..8])))
                    .collect(),
            ),
            SBYTE => Value::SByte(data.iter().map(|&b| b as i8).collect()),
            UNDEFINED => Value::Undefined(data.to_vec()),
            SSHORT => Value::SShort(chunks.map(|c| order.u16(c) as i16).collect()),
            SLONG => Value::SLong(chunks.map(|c| order.u32(c) as i32).collect()),
            SRATIONAL => Value::SRational(
                chunks
                    .map(|c| (order.u32(&c[0..4]) as i32, order.u32(&c[4..8]) as i32))
                    .collect(),
            ),
            FLOAT => Value::Float(chunks.map(|c| f32::from_bits(order.u32(c))).collect()),
            DOUBLE => Value::Double(chunks.map(|c| f64::from_bits(order.u64(c))).collect()),
            _ => return None,
        };
        Some(value)
    }

    /// Encode to `(format, count, bytes)` in the given byte order.
    pub fn encode(&self, order: ByteOrder) -> (u16, u32, Vec<u8>) {
        let mut out = Vec::new();
        let count = match self {
            Value::Byte(v) | Value::Undefined(v) => {
                out.extend_from_slice(v);
                v.len()
            }
            Value::Ascii(s) | Value::Utf8(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
                out.len()
            }
            Value::Short(v) => {
                v.iter().for_each(|x| order.put_u16(&mut out, *x));
                v.len()
            }
            Value::Long(v) => {
                v.iter().for_each(|x| order.put_u32(&mut out, *x));
                v.len()
            }
            Value::Rational(v) => {
                for (n, d) in v {
                    order.put_u32(&mut out, *n);
                    order.put_u32(&mut out, *d);
                }
                v.len()
            }
            Value::SByte(v) => {
                out.extend(v.iter().map(|x| *x as u8));
                v.len()
            }
            Value::SShort(v) => {
                v.iter().for_each(|x| order.put_u16(&mut out, *x as u16));
                v.len()
            }
            Value::SLong(v) => {
                v.iter().for_each(|x| order.put_u32(&mut out, *x as u32));
                v.len()
            }
            Value::SRational(v) => {
                for (n, d) in v {
                    order.put_u32(&mut out, *n as u32);
                    order.put_u32(&mut out, *d as u32);
                }
                v.len()
            }
            Value::Float(v) => {
                v.iter().for_each(|x| order.put_u32(&mut out, x.to_bits()));
                v.len()
            }
            Value::Double(v) => {
                v.iter().for_each(|x| order.put_u64(&mut out, x.to_bits()));
                v.len()
            }
        };
        (self.format(), count as u32, out)
    }

    /// Text content of ASCII and UTF-8 fields, trimmed. `None` for other
    /// types.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Ascii(s) | Value::Utf8(s) => Some(s.trim()),
            _ => None,
        }
    }

    /// Numeric components as floats (integers, rationals, floats).
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        let v = match self {
            Value::Byte(v) => v.iter().map(|x| *x as f64).collect(),
            Value::Short(v) => v.iter().map(|x| *x as f64).collect(),
            Value::Long(v) => v.iter().map(|x| *x as f64).collect(),
            Value::SShort(v) => v.iter().map(|x| *x as f64).collect(),
            Value::SLong(v) => v.iter().map(|x| *x as f64).collect(),
            Value::Rational(v) => v
                .iter()
                .map(|(n, d)| ratio(*n as f64, *d as f64))
                .collect::<Option<_>>()?,
            Value::SRational(v) => v
                .iter()
                .map(|(n, d)| ratio(*n as f64, *d as f64))
                .collect::<Option<_>>()?,
            Value::Float(v) => v.iter().map(|x| *x as f64).collect(),
            Value::Double(v) => v.clone(),
            _ => return None,
        };
        Some(v)
    }

    pub fn first_u32(&self) -> Option<u32> {
        match self {
            Value::Short(v) => v.first().map(|x| *x as u32),
            Value::Long(v) => v.first().copied(),
            _ => None,
        }
    }
}

fn text_until_nul(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

fn ratio(n: f64, d: f64) -> Option<f64> {
    if d == 0.0 { None } else { Some(n / d) }
}

const XP_TAGS: [Tag; 5] = [
    Tag::XpTitle,
    Tag::XpComment,
    Tag::XpAuthor,
    Tag::XpKeywords,
    Tag::XpSubject,
];

/// Render a value for display in a metadata preview.
pub fn display_value(key: FieldKey, value: &Value) -> String {
    if XP_TAGS.iter().any(|t| t.key() == key) {
        if let Value::Byte(b) | Value::Undefined(b) = value {
            return decode_utf16le(b);
        }
    }
    if key == Tag::UserComment.key() {
        if let Value::Undefined(b) = value {
            return decode_user_comment(b);
        }
    }

    match value {
        Value::Ascii(s) | Value::Utf8(s) => s.trim().to_string(),
        Value::Byte(b) if key.group == IfdGroup::Gps => join(b.iter(), "."),
        Value::Byte(b) | Value::Undefined(b) => describe_bytes(b),
        Value::Short(v) => join(v.iter(), ", "),
        Value::Long(v) => join(v.iter(), ", "),
        Value::SByte(v) => join(v.iter(), ", "),
        Value::SShort(v) => join(v.iter(), ", "),
        Value::SLong(v) => join(v.iter(), ", "),
        Value::Rational(v) => v
            .iter()
            .map(|(n, d)| format_rational(*n as i64, *d as i64))
            .collect::<Vec<_>>()
            .join(", "),
        Value::SRational(v) => v
            .iter()
            .map(|(n, d)| format_rational(*n as i64, *d as i64))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Float(v) => join(v.iter(), ", "),
        Value::Double(v) => join(v.iter(), ", "),
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>, sep: &str) -> String {
    items.map(|x| x.to_string()).collect::<Vec<_>>().join(sep)
}

/// `1/125` stays a fraction, whole numbers lose the denominator, anything
/// else becomes a short decimal.
pub fn format_rational(n: i64, d: i64) -> String {
    if d == 0 {
        return "0".to_string();
    }
    if n % d == 0 {
        return (n / d).to_string();
    }
    if n == 1 {
        return format!("1/{d}");
    }
    let s = format!("{:.4}", n as f64 / d as f64);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn describe_bytes(b: &[u8]) -> String {
    let printable = !b.is_empty()
        && b.iter()
            .all(|c| c.is_ascii_graphic() || *c == b' ' || *c == 0);
    if printable {
        let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
        let text = String::from_utf8_lossy(&b[..end]).trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }
    format!("({} bytes)", b.len())
}

fn decode_utf16le(b: &[u8]) -> String {
    let units: Vec<u16> = b
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|u| *u != 0)
        .collect();
    String::from_utf16_lossy(&units).trim().to_string()
}

/// UserComment carries an 8-byte character code before the text.
fn decode_user_comment(b: &[u8]) -> String {
    if b.len() < 8 {
        return describe_bytes(b);
    }
    let (code, text) = b.split_at(8);
    let decoded = match code {
        b"UNICODE\0" => {
            let units: Vec<u16> = text
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .take_while(|u| *u != 0)
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => {
            let end = text.iter().position(|&c| c == 0).unwrap_or(text.len());
            String::from_utf8_lossy(&text[..end]).into_owned()
        }
    };
    decoded.trim().to_string()
}
