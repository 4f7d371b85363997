//! A tagged, schema-versioned binary serialization format.
//!
//! Every value on the wire is a 2-byte [`tag::Tag`] followed by its payload.
//! Variable-width values (strings, arrays, objects, binary blobs) additionally
//! carry a 4-byte little-endian size counting only the payload, so a reader
//! that doesn't understand a value can always skip over it.
//!
//! A stream opens with a 4-byte magic (`BSER`, [`writer::MAGIC`]) and a
//! 3×u32 [`writer::Version`]. An object's payload begins with its schema
//! name (an interned string, possibly empty for anonymous objects), followed
//! by a field count and a field index — `(interned name, absolute stream
//! position)` pairs — so a reader can seek directly to any named field
//! without scanning the ones before it. An array's payload begins with its
//! element count and an element-type hint (`Tag::Null` when heterogeneous),
//! then the elements themselves in order.
//!
//! Strings are interned per-stream: [`writer::Writer::write_interned`] either
//! writes a string out in full and caches it under the next sequential id, or
//! — if an identical string was already written — writes only a flag byte
//! and that id. This applies to schema names and object field names as well
//! as to ordinary `String` values, since chunk and schema names repeat
//! constantly across a save file.
//!
//! ```text
//! stream      := magic version value*
//! value       := tag payload
//! payload     := fixed-width-payload | sized-payload
//! sized-payload := size(u32) body
//! object-body := schema-name(interned) field-count(u32) field-index value-body*
//! field-index := (interned-name position(u32))*
//! array-body  := length(u32) element-hint(tag) element*
//! ```
//!
//! [`schema`] layers named, versioned field shapes with required/optional
//! field tracking on top of the raw object framing, registered process-wide
//! via [`schema::register_schema`].

pub mod reader;
pub mod schema;
pub mod tag;
pub mod writer;

pub use reader::{ArrayReader, ObjectReader, Reader};
pub use schema::{register_schema, validate_schema, FieldSchema, Schema, SchemaRegistry};
pub use tag::Tag;
pub use writer::{ArrayWriter, ObjectWriter, Version, Writer, MAGIC};

/// Implemented by types that know how to write and read themselves as a
/// value's BODY, so container code can be generic over element type and
/// supply the `tag`/size framing itself via `write_field`/`push` (using
/// [`Encode::TAG`]) rather than each call site hand-rolling it.
pub trait Encode: Sized {
    const TAG: Tag;

    fn encode_body<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> crate::error::Result<()>;
    /// `size` is the payload's byte length for variable-width tags, `0` for
    /// fixed-width ones.
    fn decode_body<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>, size: u32) -> crate::error::Result<Self>;
}

macro_rules! impl_encode_primitive {
    ($ty:ty, $tag:expr, $write:ident, $read:ident) => {
        impl Encode for $ty {
            const TAG: Tag = $tag;

            fn encode_body<W: std::io::Write + std::io::Seek>(
                &self,
                w: &mut Writer<W>,
            ) -> crate::error::Result<()> {
                w.$write(*self)
            }

            fn decode_body<R: std::io::Read + std::io::Seek>(
                r: &mut Reader<R>,
                _size: u32,
            ) -> crate::error::Result<Self> {
                r.$read()
            }
        }
    };
}

impl_encode_primitive!(bool, Tag::Bool, write_bool, read_bool);
impl_encode_primitive!(i8, Tag::I8, write_i8, read_i8);
impl_encode_primitive!(u8, Tag::U8, write_u8, read_u8);
impl_encode_primitive!(i16, Tag::I16, write_i16, read_i16);
impl_encode_primitive!(u16, Tag::U16, write_u16, read_u16);
impl_encode_primitive!(i32, Tag::I32, write_i32, read_i32);
impl_encode_primitive!(u32, Tag::U32, write_u32, read_u32);
impl_encode_primitive!(i64, Tag::I64, write_i64, read_i64);
impl_encode_primitive!(u64, Tag::U64, write_u64, read_u64);
impl_encode_primitive!(f32, Tag::F32, write_f32, read_f32);
impl_encode_primitive!(f64, Tag::F64, write_f64, read_f64);

impl Encode for String {
    const TAG: Tag = Tag::String;

    fn encode_body<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> crate::error::Result<()> {
        w.write_interned(self)
    }

    fn decode_body<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>, _size: u32) -> crate::error::Result<Self> {
        r.read_interned()
    }
}

/// Writes `value` as an object field using its [`Encode`] impl for both tag
/// and body.
pub fn write_encoded_field<W: std::io::Write + std::io::Seek, T: Encode>(
    obj: &mut ObjectWriter<'_, W>,
    name: &str,
    value: &T,
) -> crate::error::Result<()> {
    obj.write_field(name, T::TAG, |w| value.encode_body(w))
}

/// Reads an object field using its [`Encode`] impl for both tag and body.
pub fn read_encoded_field<R: std::io::Read + std::io::Seek, T: Encode>(
    obj: &mut ObjectReader<'_, R>,
    name: &str,
) -> crate::error::Result<T> {
    obj.read_field(name, T::TAG, |r, size| T::decode_body(r, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip_object() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(Cursor::new(&mut buf), Version::CURRENT).unwrap();
            let mut obj = w.begin_object("codec::test::Point").unwrap();
            obj.write_field("x", Tag::F32, |w| w.write_f32(1.5)).unwrap();
            obj.write_field("y", Tag::F32, |w| w.write_f32(-2.0)).unwrap();
            obj.write_field("label", Tag::String, |w| w.write_interned("origin"))
                .unwrap();
            obj.end().unwrap();
        }
        buf
    }

    #[test]
    fn object_field_round_trip_any_order() {
        let buf = round_trip_object();
        let mut r = Reader::new(Cursor::new(&buf)).unwrap();
        let mut obj = r.begin_object("codec::test::Point").unwrap();
        // Read out of declared order to exercise the random-access field index.
        let label = obj
            .read_field("label", Tag::String, |r, _| r.read_interned())
            .unwrap();
        let y = obj.read_field("y", Tag::F32, |r, _| r.read_f32()).unwrap();
        let x = obj.read_field("x", Tag::F32, |r, _| r.read_f32()).unwrap();
        obj.end().unwrap();

        assert_eq!(x, 1.5);
        assert_eq!(y, -2.0);
        assert_eq!(label, "origin");
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let buf = round_trip_object();
        let mut r = Reader::new(Cursor::new(&buf)).unwrap();
        let err = r.begin_object("codec::test::NotAPoint").unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Format(_)));
    }

    #[test]
    fn missing_field_is_rejected() {
        let buf = round_trip_object();
        let mut r = Reader::new(Cursor::new(&buf)).unwrap();
        let mut obj = r.begin_object("codec::test::Point").unwrap();
        let err = obj
            .read_field::<f32>("z", Tag::F32, |r, _| r.read_f32())
            .unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Format(_)));
    }

    #[test]
    fn repeated_strings_are_interned() {
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(Cursor::new(&mut buf), Version::CURRENT).unwrap();
            let mut arr = w.begin_array(3, Tag::String).unwrap();
            arr.push(Tag::String, |w| w.write_interned("stone")).unwrap();
            arr.push(Tag::String, |w| w.write_interned("stone")).unwrap();
            arr.push(Tag::String, |w| w.write_interned("dirt")).unwrap();
            arr.end().unwrap();
        }
        let mut r = Reader::new(Cursor::new(&buf)).unwrap();
        let mut arr = r.begin_array().unwrap();
        assert_eq!(arr.len(), 3);
        let mut out = Vec::new();
        while let Some(s) = arr.next(|r, _tag, _size| r.read_interned()).unwrap() {
            out.push(s);
        }
        arr.end().unwrap();
        assert_eq!(out, vec!["stone", "stone", "dirt"]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let buf = vec![0u8; 16];
        let err = Reader::new(Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Format(_)));
    }
}
