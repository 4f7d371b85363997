//! The encoding half of the codec. See [`crate::codec`] for the wire format.
//!
//! Every value is `tag + payload`. The `write_field`/`push` wrappers on
//! [`ObjectWriter`]/[`ArrayWriter`] own writing that tag (and, for
//! variable-width values, the size prefix) around whatever the caller's
//! closure writes — so closures passed to them must write BODY ONLY. For a
//! nested `Object`/`Array` field use [`Writer::begin_object_body`]/
//! [`Writer::begin_object_body`]'s array counterpart, not the standalone
//! `begin_object`/`begin_array`, which add their own tag and size and would
//! double them up.

use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};

use super::tag::Tag;
use crate::error::{CoreError, Result};

pub const MAGIC: u32 = 0x4253_4552; // "BSER", little-endian on the wire.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const CURRENT: Version = Version {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// Majors differ -> incompatible. Reader's minor must be >= writer's
    /// minor (additive fields the reader doesn't know about are simply
    /// skipped). Patch is informational only.
    pub fn is_compatible_with(&self, writer_version: Version) -> bool {
        self.major == writer_version.major && self.minor >= writer_version.minor
    }
}

pub struct Writer<W> {
    stream: W,
    name_cache: HashMap<String, u32>,
}

impl<W: Write + Seek> Writer<W> {
    /// Writes the magic + version header. Must be called exactly once before
    /// any values are written.
    pub fn new(mut stream: W, version: Version) -> Result<Self> {
        stream.write_all(&MAGIC.to_le_bytes())?;
        stream.write_all(&version.major.to_le_bytes())?;
        stream.write_all(&version.minor.to_le_bytes())?;
        stream.write_all(&version.patch.to_le_bytes())?;
        Ok(Self {
            stream,
            name_cache: HashMap::new(),
        })
    }

    pub fn into_inner(self) -> W {
        self.stream
    }

    pub(crate) fn position(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?)
    }

    pub(crate) fn patch_u32(&mut self, pos: u64, value: u32) -> Result<()> {
        let cur = self.stream.stream_position()?;
        self.stream.seek(SeekFrom::Start(pos))?;
        self.stream.write_all(&value.to_le_bytes())?;
        self.stream.seek(SeekFrom::Start(cur))?;
        Ok(())
    }

    pub(crate) fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.stream.write_all(&(tag as u16).to_le_bytes())?;
        Ok(())
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.stream.write_all(&[v as u8])?;
        Ok(())
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_i16(&mut self, v: i16) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.stream.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_bytes_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    /// Writes a string through the per-stream interning cache: a new string
    /// costs a flag byte plus its length-prefixed UTF-8 bytes; a repeat costs
    /// a flag byte plus a 4-byte id. Body-only — no tag, no size.
    pub fn write_interned(&mut self, s: &str) -> Result<()> {
        if let Some(&id) = self.name_cache.get(s) {
            self.stream.write_all(&[1u8])?;
            self.stream.write_all(&id.to_le_bytes())?;
        } else {
            let id = self.name_cache.len() as u32;
            self.name_cache.insert(s.to_owned(), id);
            self.stream.write_all(&[0u8])?;
            self.stream.write_all(&(s.len() as u32).to_le_bytes())?;
            self.stream.write_all(s.as_bytes())?;
        }
        Ok(())
    }

    /// Writes a complete, self-contained `tag + size + body` value. Used for
    /// standalone values not nested inside an object field or array element
    /// (those own their own tag/size framing already).
    fn write_sized_value<F>(&mut self, tag: Tag, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.write_tag(tag)?;
        if tag.is_variable_width() {
            let size_pos = self.position()?;
            self.write_u32(0)?;
            let body_start = self.position()?;
            body(self)?;
            let end = self.position()?;
            self.patch_u32(size_pos, (end - body_start) as u32)?;
        } else {
            body(self)?;
        }
        Ok(())
    }

    /// Standalone tagged string value. For a `String` object field, pass
    /// [`Writer::write_interned`] as the field's body closure instead.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_sized_value(Tag::String, |w| w.write_interned(s))
    }

    /// Standalone tagged binary value. For a `Binary` object field, pass
    /// [`Writer::write_bytes_raw`] as the field's body closure instead.
    pub fn write_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_sized_value(Tag::Binary, |w| w.write_bytes_raw(bytes))
    }

    pub fn write_entity_ref(&mut self, id: u64) -> Result<()> {
        self.write_tag(Tag::EntityRef)?;
        self.write_u64(id)
    }

    pub fn write_resource_ref(&mut self, id: u64) -> Result<()> {
        self.write_tag(Tag::ResourceRef)?;
        self.write_u64(id)
    }

    pub fn write_uuid(&mut self, hi: u64, lo: u64) -> Result<()> {
        self.write_tag(Tag::Uuid)?;
        self.write_u64(hi)?;
        self.write_u64(lo)
    }

    /// Begins a standalone object value (own tag + size). For an object
    /// nested as a field or array element, use
    /// [`Writer::begin_object_body`] instead.
    pub fn begin_object<'w>(&'w mut self, schema_name: &str) -> Result<ObjectWriter<'w, W>> {
        self.write_tag(Tag::Object)?;
        let size_pos = self.position()?;
        self.write_u32(0)?;
        let body_start = self.position()?;
        let mut obj = self.begin_object_body(schema_name)?;
        obj.outer_patch = Some((size_pos, body_start));
        Ok(obj)
    }

    /// Begins an object value's body only — no tag, no size. Use this from
    /// inside a `write_field`/`push` closure, whose wrapper already wrote
    /// the tag and size placeholder.
    pub fn begin_object_body<'w>(&'w mut self, schema_name: &str) -> Result<ObjectWriter<'w, W>> {
        self.write_interned(schema_name)?;
        Ok(ObjectWriter {
            writer: self,
            outer_patch: None,
            entries: Vec::new(),
        })
    }

    /// Begins a standalone array value (own tag + size). For an array nested
    /// as a field or array element, use [`Writer::begin_array_body`] instead.
    pub fn begin_array<'w>(&'w mut self, len: usize, element_hint: Tag) -> Result<ArrayWriter<'w, W>> {
        self.write_tag(Tag::Array)?;
        let size_pos = self.position()?;
        self.write_u32(0)?;
        let body_start = self.position()?;
        let mut arr = self.begin_array_body(len, element_hint)?;
        arr.outer_patch = Some((size_pos, body_start));
        Ok(arr)
    }

    /// Begins an array value's body only — no tag, no size.
    pub fn begin_array_body<'w>(
        &'w mut self,
        len: usize,
        element_hint: Tag,
    ) -> Result<ArrayWriter<'w, W>> {
        self.write_u32(len as u32)?;
        self.stream
            .write_all(&(element_hint as u16).to_le_bytes())?;
        Ok(ArrayWriter {
            writer: self,
            outer_patch: None,
            remaining: len,
        })
    }
}

type FieldWrite<'w, W> = Box<dyn FnOnce(&mut Writer<W>) -> Result<()> + 'w>;

pub struct ObjectWriter<'w, W> {
    writer: &'w mut Writer<W>,
    /// `Some((size_pos, body_start))` when this is a standalone object that
    /// must patch its own size on `end()`; `None` when an outer
    /// `write_field`/`push` wrapper already owns that size.
    outer_patch: Option<(u64, u64)>,
    entries: Vec<(String, Tag, FieldWrite<'w, W>)>,
}

impl<'w, W: Write + Seek> ObjectWriter<'w, W> {
    /// Queues a field for writing. `tag` is used to decide whether a size
    /// prefix is needed; `write_body` writes only the value's payload — for
    /// `String`/`Binary` pass [`Writer::write_interned`]/
    /// [`Writer::write_bytes_raw`], for nested `Object`/`Array` call
    /// [`Writer::begin_object_body`]/[`Writer::begin_array_body`] and `.end()`
    /// it within the closure.
    pub fn write_field<F>(&mut self, name: &str, tag: Tag, write_body: F) -> Result<()>
    where
        F: FnOnce(&mut Writer<W>) -> Result<()> + 'w,
    {
        self.entries.push((name.to_owned(), tag, Box::new(write_body)));
        Ok(())
    }

    /// Flushes the field index and bodies, then patches the size (its own,
    /// if standalone; otherwise leaves that to the enclosing wrapper).
    pub fn end(self) -> Result<()> {
        let ObjectWriter {
            writer,
            outer_patch,
            entries,
        } = self;

        writer.write_u32(entries.len() as u32)?;

        let mut slots = Vec::with_capacity(entries.len());
        for (name, _tag, _) in &entries {
            writer.write_interned(name)?;
            let slot = writer.position()?;
            writer.write_u32(0)?;
            slots.push(slot);
        }

        for (i, (_name, tag, write_body)) in entries.into_iter().enumerate() {
            let value_pos = writer.position()?;
            writer.write_tag(tag)?;
            if tag.is_variable_width() {
                let size_pos = writer.position()?;
                writer.write_u32(0)?;
                let body_pos = writer.position()?;
                write_body(writer)?;
                let end = writer.position()?;
                writer.patch_u32(size_pos, (end - body_pos) as u32)?;
            } else {
                write_body(writer)?;
            }
            writer.patch_u32(slots[i], value_pos as u32)?;
        }

        if let Some((size_pos, body_start)) = outer_patch {
            let end = writer.position()?;
            writer.patch_u32(size_pos, (end - body_start) as u32)?;
        }
        Ok(())
    }
}

pub struct ArrayWriter<'w, W> {
    writer: &'w mut Writer<W>,
    outer_patch: Option<(u64, u64)>,
    remaining: usize,
}

impl<'w, W: Write + Seek> ArrayWriter<'w, W> {
    /// Writes the next element. `tag` must match the array's declared
    /// element type when the array is homogeneous. `write_body` writes only
    /// the value's payload, same contract as [`ObjectWriter::write_field`].
    pub fn push<F>(&mut self, tag: Tag, write_body: F) -> Result<()>
    where
        F: FnOnce(&mut Writer<W>) -> Result<()>,
    {
        if self.remaining == 0 {
            return Err(CoreError::format(
                "wrote more elements than the array's declared length",
            ));
        }
        self.remaining -= 1;

        self.writer.write_tag(tag)?;
        if tag.is_variable_width() {
            let size_pos = self.writer.position()?;
            self.writer.write_u32(0)?;
            let body_pos = self.writer.position()?;
            write_body(self.writer)?;
            let end = self.writer.position()?;
            self.writer.patch_u32(size_pos, (end - body_pos) as u32)?;
        } else {
            write_body(self.writer)?;
        }
        Ok(())
    }

    pub fn end(self) -> Result<()> {
        if self.remaining != 0 {
            return Err(CoreError::format(format!(
                "array ended with {} elements unwritten",
                self.remaining
            )));
        }
        if let Some((size_pos, body_start)) = self.outer_patch {
            let end = self.writer.position()?;
            self.writer.patch_u32(size_pos, (end - body_start) as u32)?;
        }
        Ok(())
    }
}
