//! The decoding half of the codec. See [`crate::codec`] for the wire format.
//!
//! Mirrors [`super::writer`]: `read_field`/`next` already consumed the
//! value's tag (and size, for variable-width values) before calling the
//! caller's closure, so those closures must read BODY ONLY — use
//! [`Reader::begin_object_body`]/[`Reader::begin_array_body`] for nested
//! objects/arrays, not the standalone `begin_object`/`begin_array`.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use super::tag::Tag;
use super::writer::{Version, MAGIC};
use crate::error::{CoreError, Result};

pub struct Reader<R> {
    stream: R,
    pub version: Version,
    name_cache: Vec<String>,
}

impl<R: Read + Seek> Reader<R> {
    /// Reads and validates the magic + version header.
    pub fn new(mut stream: R) -> Result<Self> {
        let magic = read_u32(&mut stream)?;
        if magic != MAGIC {
            return Err(CoreError::format(format!(
                "bad magic: expected {MAGIC:#x}, found {magic:#x}"
            )));
        }
        let version = Version {
            major: read_u32(&mut stream)?,
            minor: read_u32(&mut stream)?,
            patch: read_u32(&mut stream)?,
        };
        Ok(Self {
            stream,
            version,
            name_cache: Vec::new(),
        })
    }

    pub fn into_inner(self) -> R {
        self.stream
    }

    pub(crate) fn position(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?)
    }

    fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.stream.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub(crate) fn read_tag(&mut self) -> Result<Tag> {
        let raw = read_u16(&mut self.stream)?;
        Tag::from_u16(raw).ok_or_else(|| CoreError::format(format!("unknown type tag {raw}")))
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<()> {
        let found = self.read_tag()?;
        if found != expected {
            return Err(CoreError::format(format!(
                "expected tag `{}`, found `{}`",
                expected.name(),
                found.name()
            )));
        }
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let mut buf = [0u8; 1];
        self.stream.read_exact(&mut buf)?;
        Ok(buf[0] != 0)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let mut buf = [0u8; 1];
        self.stream.read_exact(&mut buf)?;
        Ok(i8::from_le_bytes(buf))
    }
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.stream.read_exact(&mut buf)?;
        Ok(u8::from_le_bytes(buf))
    }
    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.stream.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }
    pub fn read_u16(&mut self) -> Result<u16> {
        read_u16(&mut self.stream)
    }
    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }
    pub fn read_u32(&mut self) -> Result<u32> {
        read_u32(&mut self.stream)
    }
    pub fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.stream.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }
    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.stream.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }
    pub fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.stream.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    pub fn read_bytes_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Mirrors [`super::writer::Writer::write_interned`]: a new string is
    /// cached under the next sequential id, a repeat is resolved by id.
    /// Body-only — no tag, no size.
    pub fn read_interned(&mut self) -> Result<String> {
        let mut flag = [0u8; 1];
        self.stream.read_exact(&mut flag)?;
        if flag[0] == 1 {
            let id = read_u32(&mut self.stream)? as usize;
            self.name_cache
                .get(id)
                .cloned()
                .ok_or_else(|| CoreError::format(format!("unresolved string cache id {id}")))
        } else {
            let len = read_u32(&mut self.stream)? as usize;
            let bytes = self.read_bytes_raw(len)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| CoreError::format(format!("invalid UTF-8 in interned string: {e}")))?;
            self.name_cache.push(s.clone());
            Ok(s)
        }
    }

    /// Standalone tagged string value. For a `String` object field, pass
    /// [`Reader::read_interned`] as the field's body closure instead.
    pub fn read_string(&mut self) -> Result<String> {
        self.expect_tag(Tag::String)?;
        let _size = self.read_u32()?;
        self.read_interned()
    }

    /// Standalone tagged binary value. For a `Binary` object field, read
    /// with the `size` passed to the field's body closure instead.
    pub fn read_binary(&mut self) -> Result<Vec<u8>> {
        self.expect_tag(Tag::Binary)?;
        let size = self.read_u32()? as usize;
        self.read_bytes_raw(size)
    }

    pub fn read_entity_ref(&mut self) -> Result<u64> {
        self.expect_tag(Tag::EntityRef)?;
        self.read_u64()
    }

    pub fn read_resource_ref(&mut self) -> Result<u64> {
        self.expect_tag(Tag::ResourceRef)?;
        self.read_u64()
    }

    pub fn read_uuid(&mut self) -> Result<(u64, u64)> {
        self.expect_tag(Tag::Uuid)?;
        Ok((self.read_u64()?, self.read_u64()?))
    }

    /// Begins reading a standalone object value (consumes its own tag and
    /// size). For an object nested as a field or array element, use
    /// [`Reader::begin_object_body`] instead. `expected_schema` is checked
    /// against the name the writer stored; pass `""` to skip the check.
    pub fn begin_object<'r>(&'r mut self, expected_schema: &str) -> Result<ObjectReader<'r, R>> {
        self.expect_tag(Tag::Object)?;
        let size = self.read_u32()?;
        let body_start = self.position()?;
        self.begin_object_body_at(expected_schema, Some(body_start + size as u64))
    }

    /// Begins reading an object's body only — no tag, no size consumed.
    /// Use from inside a `read_field`/`next` closure, whose wrapper already
    /// consumed the tag and size.
    pub fn begin_object_body<'r>(&'r mut self, expected_schema: &str) -> Result<ObjectReader<'r, R>> {
        self.begin_object_body_at(expected_schema, None)
    }

    fn begin_object_body_at<'r>(
        &'r mut self,
        expected_schema: &str,
        body_end: Option<u64>,
    ) -> Result<ObjectReader<'r, R>> {
        let schema_name = self.read_interned()?;
        if !expected_schema.is_empty() && schema_name != expected_schema {
            return Err(CoreError::format(format!(
                "schema mismatch: expected `{expected_schema}`, found `{schema_name}`"
            )));
        }

        let field_count = self.read_u32()?;
        let mut fields = HashMap::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let name = self.read_interned()?;
            let pos = self.read_u32()? as u64;
            fields.insert(name, pos);
        }

        Ok(ObjectReader {
            reader: self,
            body_end,
            fields,
        })
    }

    /// Begins reading a standalone array value (consumes its own tag and
    /// size), returning its declared length and element-type hint
    /// (`Tag::Null` for heterogeneous arrays). For an array nested as a
    /// field or array element, use [`Reader::begin_array_body`] instead.
    pub fn begin_array<'r>(&'r mut self) -> Result<ArrayReader<'r, R>> {
        self.expect_tag(Tag::Array)?;
        let size = self.read_u32()?;
        let body_start = self.position()?;
        self.begin_array_body_at(Some(body_start + size as u64))
    }

    /// Begins reading an array's body only — no tag, no size consumed.
    pub fn begin_array_body<'r>(&'r mut self) -> Result<ArrayReader<'r, R>> {
        self.begin_array_body_at(None)
    }

    fn begin_array_body_at<'r>(&'r mut self, body_end: Option<u64>) -> Result<ArrayReader<'r, R>> {
        let len = self.read_u32()? as usize;
        let hint_raw = read_u16(&mut self.stream)?;
        let element_hint = Tag::from_u16(hint_raw)
            .ok_or_else(|| CoreError::format(format!("unknown element type hint {hint_raw}")))?;
        Ok(ArrayReader {
            reader: self,
            body_end,
            len,
            read: 0,
            element_hint,
        })
    }
}

fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub struct ObjectReader<'r, R> {
    reader: &'r mut Reader<R>,
    /// `Some(pos)` for a standalone object that must seek to its own end on
    /// `end()`; `None` when an enclosing `read_field`/`next` wrapper owns
    /// that seek.
    body_end: Option<u64>,
    fields: HashMap<String, u64>,
}

impl<'r, R: Read + Seek> ObjectReader<'r, R> {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Seeks to the named field, validates its tag, and runs `read_body` on
    /// the value's payload (with the payload's byte size, `0` for
    /// fixed-width fields). Returns [`CoreError::Format`] for a missing
    /// field or a tag mismatch.
    pub fn read_field<T>(
        &mut self,
        name: &str,
        tag: Tag,
        read_body: impl FnOnce(&mut Reader<R>, u32) -> Result<T>,
    ) -> Result<T> {
        let pos = *self
            .fields
            .get(name)
            .ok_or_else(|| CoreError::format(format!("missing field `{name}`")))?;
        self.reader.seek_to(pos)?;
        self.reader.expect_tag(tag)?;
        let size = if tag.is_variable_width() {
            self.reader.read_u32()?
        } else {
            0
        };
        read_body(self.reader, size)
    }

    /// Like [`Self::read_field`] but returns `default` if the field is
    /// absent, for additive schema fields an older writer never produced.
    pub fn read_field_or<T>(
        &mut self,
        name: &str,
        tag: Tag,
        default: T,
        read_body: impl FnOnce(&mut Reader<R>, u32) -> Result<T>,
    ) -> Result<T> {
        if self.has_field(name) {
            self.read_field(name, tag, read_body)
        } else {
            Ok(default)
        }
    }

    /// Seeks past the object body regardless of how much of it was read.
    pub fn end(self) -> Result<()> {
        if let Some(body_end) = self.body_end {
            self.reader.seek_to(body_end)?;
        }
        Ok(())
    }
}

pub struct ArrayReader<'r, R> {
    reader: &'r mut Reader<R>,
    body_end: Option<u64>,
    len: usize,
    read: usize,
    element_hint: Tag,
}

impl<'r, R: Read + Seek> ArrayReader<'r, R> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn element_hint(&self) -> Tag {
        self.element_hint
    }

    /// Reads the next element, validating its tag (the hint from
    /// [`Reader::begin_array`]/[`Reader::begin_array_body`] when
    /// homogeneous, otherwise whatever the element's own tag declares) and
    /// running `read_body` on the payload (with its byte size, `0` for
    /// fixed-width elements).
    pub fn next<T>(
        &mut self,
        read_body: impl FnOnce(&mut Reader<R>, Tag, u32) -> Result<T>,
    ) -> Result<Option<T>> {
        if self.read >= self.len {
            return Ok(None);
        }
        let tag = self.reader.read_tag()?;
        if tag.is_variable_width() {
            let size = self.reader.read_u32()?;
            let body_pos = self.reader.position()?;
            let value = read_body(self.reader, tag, size)?;
            self.reader.seek_to(body_pos + size as u64)?;
            self.read += 1;
            Ok(Some(value))
        } else {
            let value = read_body(self.reader, tag, 0)?;
            self.read += 1;
            Ok(Some(value))
        }
    }

    /// Skips any unread elements and seeks to the array's end.
    pub fn end(self) -> Result<()> {
        if let Some(body_end) = self.body_end {
            self.reader.seek_to(body_end)?;
        }
        Ok(())
    }
}
