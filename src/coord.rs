//! Integer lattice addressing for chunks. See [`crate::chunk::Chunk`] for
//! the volume a coordinate names.

use nalgebra::Point3;
use std::ops::{Add, Sub};

use crate::aabb::Aabb;
use crate::util::floor_div;

/// A chunk's address in the chunk lattice — `(x, y, z)` in units of chunk
/// edge lengths, not voxels or world units.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const ZERO: ChunkCoord = ChunkCoord { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// `⌊p.x/size⌋, ⌊p.y/size⌋, ⌊p.z/size⌋` — floor division, not truncation,
    /// so negative world positions resolve to the correct (negative) chunk.
    pub fn from_world_position(p: Point3<f32>, size: i32) -> Self {
        Self {
            x: floor_div(p.x.floor() as i32, size),
            y: floor_div(p.y.floor() as i32, size),
            z: floor_div(p.z.floor() as i32, size),
        }
    }

    /// World position of this chunk's minimum corner.
    pub fn to_world_position(self, size: i32) -> Point3<f32> {
        Point3::new(
            (self.x * size) as f32,
            (self.y * size) as f32,
            (self.z * size) as f32,
        )
    }

    pub fn bounds(self, size: i32) -> Aabb {
        let min = self.to_world_position(size);
        let max = min + nalgebra::Vector3::new(size as f32, size as f32, size as f32);
        Aabb::new(min, max)
    }

    pub fn manhattan_distance(self, other: ChunkCoord) -> i64 {
        (self.x as i64 - other.x as i64).abs()
            + (self.y as i64 - other.y as i64).abs()
            + (self.z as i64 - other.z as i64).abs()
    }

    /// Offset indexed 0..5 matching the six [`crate::chunk::Direction`]
    /// values: -X, +X, -Y, +Y, -Z, +Z.
    pub fn offset_by_direction(self, direction: usize) -> ChunkCoord {
        const OFFSETS: [(i32, i32, i32); 6] = [
            (-1, 0, 0),
            (1, 0, 0),
            (0, -1, 0),
            (0, 1, 0),
            (0, 0, -1),
            (0, 0, 1),
        ];
        let (dx, dy, dz) = OFFSETS[direction];
        self + ChunkCoord::new(dx, dy, dz)
    }
}

impl Add for ChunkCoord {
    type Output = ChunkCoord;

    fn add(self, rhs: ChunkCoord) -> ChunkCoord {
        ChunkCoord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for ChunkCoord {
    type Output = ChunkCoord;

    fn sub(self, rhs: ChunkCoord) -> ChunkCoord {
        ChunkCoord::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_position_floors() {
        assert_eq!(
            ChunkCoord::from_world_position(Point3::new(-1.0, 0.0, 15.0), 16),
            ChunkCoord::new(-1, 0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world_position(Point3::new(-17.0, 16.0, 16.0), 16),
            ChunkCoord::new(-2, 1, 1)
        );
    }

    #[test]
    fn round_trips_to_world_position() {
        let c = ChunkCoord::new(-2, 3, 1);
        let world = c.to_world_position(16);
        assert_eq!(ChunkCoord::from_world_position(world, 16), c);
    }

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(3, -2, 1);
        assert_eq!(a.manhattan_distance(b), 6);
        assert_eq!(b.manhattan_distance(a), 6);
    }

    #[test]
    fn offset_by_direction_matches_six_neighbors() {
        let c = ChunkCoord::new(5, 5, 5);
        assert_eq!(c.offset_by_direction(0), ChunkCoord::new(4, 5, 5));
        assert_eq!(c.offset_by_direction(1), ChunkCoord::new(6, 5, 5));
        assert_eq!(c.offset_by_direction(5), ChunkCoord::new(5, 5, 6));
    }
}
