//! The type-tag enumeration that precedes every value on the wire.
//!
//! Tag values and ordering follow the original `ValueType` enumeration this
//! format was distilled from, so that a hex dump of a stream reads the same
//! regardless of which side produced it.

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum Tag {
    /// Used only as the array "element type hint" to mean "heterogeneous".
    Null = 0,
    Bool = 1,
    I8 = 2,
    U8 = 3,
    I16 = 4,
    U16 = 5,
    I32 = 6,
    U32 = 7,
    I64 = 8,
    U64 = 9,
    F32 = 10,
    F64 = 11,
    String = 12,
    Array = 13,
    Object = 14,
    Binary = 15,
    Uuid = 16,
    EntityRef = 17,
    ResourceRef = 18,
}

impl Tag {
    pub fn from_u16(value: u16) -> Option<Tag> {
        use Tag::*;
        Some(match value {
            0 => Null,
            1 => Bool,
            2 => I8,
            3 => U8,
            4 => I16,
            5 => U16,
            6 => I32,
            7 => U32,
            8 => I64,
            9 => U64,
            10 => F32,
            11 => F64,
            12 => String,
            13 => Array,
            14 => Object,
            15 => Binary,
            16 => Uuid,
            17 => EntityRef,
            18 => ResourceRef,
            _ => return None,
        })
    }

    /// `true` for every tag that carries a 4-byte size prefix after the tag
    /// itself. Only `Bool` and the fixed-width numeric tags are exempt.
    pub fn is_variable_width(self) -> bool {
        !matches!(self, Tag::Bool | Tag::I8 | Tag::U8 | Tag::I16 | Tag::U16 |
            Tag::I32 | Tag::U32 | Tag::I64 | Tag::U64 | Tag::F32 | Tag::F64)
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "null",
            Tag::Bool => "bool",
            Tag::I8 => "i8",
            Tag::U8 => "u8",
            Tag::I16 => "i16",
            Tag::U16 => "u16",
            Tag::I32 => "i32",
            Tag::U32 => "u32",
            Tag::I64 => "i64",
            Tag::U64 => "u64",
            Tag::F32 => "f32",
            Tag::F64 => "f64",
            Tag::String => "string",
            Tag::Array => "array",
            Tag::Object => "object",
            Tag::Binary => "binary",
            Tag::Uuid => "uuid",
            Tag::EntityRef => "entity-ref",
            Tag::ResourceRef => "resource-ref",
        }
    }
}
