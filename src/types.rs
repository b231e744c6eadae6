//! Base types and decoded field values.
//!
//! Every field on the wire is declared with a base type tag encoding its
//! width, signedness, and 'invalid' marker value. Plain integers mark
//! invalidity with all bits set (signed types with their maximum), z-suffixed
//! types with zero, and floating point types with the all-ones bit pattern.

use alloc::vec::Vec;

/// A field base type from a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    /// `enum`
    Enum,
    /// `sint8`
    I8,
    /// `uint8`
    U8,
    /// `sint16`
    I16,
    /// `uint16`
    U16,
    /// `sint32`
    I32,
    /// `uint32`
    U32,
    /// `string`, a null-terminated byte array
    String,
    /// `float32`
    F32,
    /// `float64`
    F64,
    /// `uint8z`
    U8z,
    /// `uint16z`
    U16z,
    /// `uint32z`
    U32z,
    /// `byte`, an opaque byte array
    Byte,
    /// `sint64`
    I64,
    /// `uint64`
    U64,
    /// `uint64z`
    U64z,
}

impl BaseType {
    /// Resolve a base type tag from a field descriptor.
    ///
    /// Tags outside the profile degrade to [`BaseType::Byte`] so the field's
    /// bytes can still be skipped accurately.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x00 => Self::Enum,
            0x01 => Self::I8,
            0x02 => Self::U8,
            0x83 => Self::I16,
            0x84 => Self::U16,
            0x85 => Self::I32,
            0x86 => Self::U32,
            0x07 => Self::String,
            0x88 => Self::F32,
            0x89 => Self::F64,
            0x0A => Self::U8z,
            0x8B => Self::U16z,
            0x8C => Self::U32z,
            0x0D => Self::Byte,
            0x8E => Self::I64,
            0x8F => Self::U64,
            0x90 => Self::U64z,
            _ => Self::Byte,
        }
    }

    /// The base type tag as written in field descriptors.
    pub fn tag(self) -> u8 {
        match self {
            Self::Enum => 0x00,
            Self::I8 => 0x01,
            Self::U8 => 0x02,
            Self::I16 => 0x83,
            Self::U16 => 0x84,
            Self::I32 => 0x85,
            Self::U32 => 0x86,
            Self::String => 0x07,
            Self::F32 => 0x88,
            Self::F64 => 0x89,
            Self::U8z => 0x0A,
            Self::U16z => 0x8B,
            Self::U32z => 0x8C,
            Self::Byte => 0x0D,
            Self::I64 => 0x8E,
            Self::U64 => 0x8F,
            Self::U64z => 0x90,
        }
    }

    /// Width in bytes of a single element of this base type.
    pub fn size(self) -> usize {
        match self {
            Self::Enum | Self::I8 | Self::U8 | Self::String | Self::U8z | Self::Byte => 1,
            Self::I16 | Self::U16 | Self::U16z => 2,
            Self::I32 | Self::U32 | Self::U32z | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::U64z | Self::F64 => 8,
        }
    }

    /// The 'invalid' marker value for this base type.
    pub fn invalid(self) -> Value {
        match self {
            Self::Enum | Self::U8 | Self::Byte => Value::U8(u8::MAX),
            Self::String | Self::U8z => Value::U8(0),
            Self::I8 => Value::I8(i8::MAX),
            Self::U16 => Value::U16(u16::MAX),
            Self::U16z => Value::U16(0),
            Self::I16 => Value::I16(i16::MAX),
            Self::U32 => Value::U32(u32::MAX),
            Self::U32z => Value::U32(0),
            Self::I32 => Value::I32(i32::MAX),
            Self::U64 => Value::U64(u64::MAX),
            Self::U64z => Value::U64(0),
            Self::I64 => Value::I64(i64::MAX),
            Self::F32 => Value::F32(f32::from_bits(u32::MAX)),
            Self::F64 => Value::F64(f64::from_bits(u64::MAX)),
        }
    }

    /// Whether a value does not hold this base type's 'invalid' marker.
    ///
    /// Floating point markers are compared on bits, so NaN payloads other
    /// than the marker itself remain valid.
    pub fn is_valid(self, value: Value) -> bool {
        match (value, self.invalid()) {
            (Value::F32(a), Value::F32(b)) => a.to_bits() != b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() != b.to_bits(),
            (a, b) => a != b,
        }
    }

    /// Decode one element of this base type from exactly [`size`](Self::size)
    /// bytes.
    pub fn decode(self, r: &[u8], is_little_endian: bool) -> Value {
        fn array<const N: usize>(r: &[u8]) -> [u8; N] {
            let mut a = [0; N];
            a.copy_from_slice(r);
            a
        }

        macro_rules! primitive {
            ($t:ty) => {
                if is_little_endian {
                    <$t>::from_le_bytes(array(r))
                } else {
                    <$t>::from_be_bytes(array(r))
                }
            };
        }

        match self {
            Self::Enum | Self::U8 | Self::String | Self::U8z | Self::Byte => Value::U8(r[0]),
            Self::I8 => Value::I8(r[0] as i8),
            Self::U16 | Self::U16z => Value::U16(primitive!(u16)),
            Self::I16 => Value::I16(primitive!(i16)),
            Self::U32 | Self::U32z => Value::U32(primitive!(u32)),
            Self::I32 => Value::I32(primitive!(i32)),
            Self::U64 | Self::U64z => Value::U64(primitive!(u64)),
            Self::I64 => Value::I64(primitive!(i64)),
            Self::F32 => Value::F32(primitive!(f32)),
            Self::F64 => Value::F64(primitive!(f64)),
        }
    }

    /// Encode one element of this base type, converting the value's numeric
    /// content to this type's width where it does not match exactly.
    pub fn encode(self, value: Value, is_little_endian: bool, out: &mut Vec<u8>) {
        macro_rules! primitive {
            ($x:expr) => {{
                let x = $x;
                if is_little_endian {
                    out.extend_from_slice(&x.to_le_bytes());
                } else {
                    out.extend_from_slice(&x.to_be_bytes());
                }
            }};
        }

        match self {
            Self::Enum | Self::U8 | Self::String | Self::U8z | Self::Byte => {
                out.push(value.as_i128() as u8)
            }
            Self::I8 => out.push(value.as_i128() as i8 as u8),
            Self::U16 | Self::U16z => primitive!(value.as_i128() as u16),
            Self::I16 => primitive!(value.as_i128() as i16),
            Self::U32 | Self::U32z => primitive!(value.as_i128() as u32),
            Self::I32 => primitive!(value.as_i128() as i32),
            Self::U64 | Self::U64z => primitive!(value.as_i128() as u64),
            Self::I64 => primitive!(value.as_i128() as i64),
            Self::F32 => primitive!(match value {
                Value::F32(x) => x,
                other => other.as_f64() as f32,
            }),
            Self::F64 => primitive!(match value {
                Value::F64(x) => x,
                other => other.as_f64(),
            }),
        }
    }
}

/// A decoded field element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// The numeric content widened to `i128`, truncating floats.
    pub fn as_i128(self) -> i128 {
        match self {
            Self::U8(x) => x as i128,
            Self::I8(x) => x as i128,
            Self::U16(x) => x as i128,
            Self::I16(x) => x as i128,
            Self::U32(x) => x as i128,
            Self::I32(x) => x as i128,
            Self::U64(x) => x as i128,
            Self::I64(x) => x as i128,
            Self::F32(x) => x as i128,
            Self::F64(x) => x as i128,
        }
    }

    /// The numeric content as a double-width float.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::U8(x) => x as f64,
            Self::I8(x) => x as f64,
            Self::U16(x) => x as f64,
            Self::I16(x) => x as f64,
            Self::U32(x) => x as f64,
            Self::I32(x) => x as f64,
            Self::U64(x) => x as f64,
            Self::I64(x) => x as f64,
            Self::F32(x) => x as f64,
            Self::F64(x) => x,
        }
    }
}
