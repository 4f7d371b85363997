//! The voxel cell itself. Two 16-bit fields, nothing more — all the
//! interesting behavior lives one layer up, in [`crate::chunk::Chunk`].

use crate::codec::{
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::error::Result;

/// A single cell of the world grid. `type_id == 0` means air/empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Voxel {
    pub type_id: u16,
    pub data: u16,
}

impl Voxel {
    pub const AIR: Voxel = Voxel {
        type_id: 0,
        data: 0,
    };

    pub fn new(type_id: u16, data: u16) -> Self {
        Self { type_id, data }
    }

    pub fn is_empty(&self) -> bool {
        self.type_id == 0
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        let mut out = [0u8; 4];
        out[0..2].copy_from_slice(&self.type_id.to_le_bytes());
        out[2..4].copy_from_slice(&self.data.to_le_bytes());
        out
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self {
            type_id: u16::from_le_bytes([bytes[0], bytes[1]]),
            data: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    pub(crate) fn write_object<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let mut obj = w.begin_object("Voxel")?;
        obj.write_field("type", Tag::U16, |w| w.write_u16(self.type_id))?;
        obj.write_field("data", Tag::U16, |w| w.write_u16(self.data))?;
        obj.end()
    }

    pub(crate) fn read_object<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>) -> Result<Self> {
        let mut obj = r.begin_object("Voxel")?;
        let type_id = obj.read_field("type", Tag::U16, |r, _| r.read_u16())?;
        let data = obj.read_field("data", Tag::U16, |r, _| r.read_u16())?;
        obj.end()?;
        Ok(Self { type_id, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_iff_both_fields_match() {
        assert_eq!(Voxel::new(1, 2), Voxel::new(1, 2));
        assert_ne!(Voxel::new(1, 2), Voxel::new(1, 3));
        assert_ne!(Voxel::new(1, 2), Voxel::new(2, 2));
    }

    #[test]
    fn air_is_empty() {
        assert!(Voxel::AIR.is_empty());
        assert!(!Voxel::new(1, 0).is_empty());
    }

    #[test]
    fn byte_round_trip() {
        let v = Voxel::new(0xdead, 0xbeef);
        assert_eq!(Voxel::from_le_bytes(v.to_le_bytes()), v);
    }
}
