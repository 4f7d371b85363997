//! Integration coverage for chunk coordinate math, grid-level voxel access,
//! and whole-grid serialization round-trips (spec §8's "Coord math" and
//! "Codec framing" universal invariants, exercised through public surface
//! only — the per-chunk wire format itself is unit-tested next to
//! `Chunk::write_object` in `src/chunk.rs`).

use std::collections::HashMap;
use std::sync::Mutex;

use nalgebra::Point3;
use voxel_core::chunk_manager::ChunkStorage;
use voxel_core::coord::ChunkCoord;
use voxel_core::error::Result;
use voxel_core::grid::Grid;
use voxel_core::voxel::Voxel;

#[derive(Default)]
struct MemoryStorage {
    files: Mutex<HashMap<ChunkCoord, Vec<u8>>>,
}

impl ChunkStorage for MemoryStorage {
    fn load_chunk(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>> {
        Ok(self.files.lock().unwrap().get(&coord).cloned())
    }

    fn save_chunk(&self, coord: ChunkCoord, bytes: &[u8]) -> Result<()> {
        self.files.lock().unwrap().insert(coord, bytes.to_vec());
        Ok(())
    }
}

fn bounded_grid(size: i32) -> Grid<MemoryStorage> {
    Grid::new(
        MemoryStorage::default(),
        size,
        Point3::new(-1000, -1000, -1000),
        Point3::new(1000, 1000, 1000),
        Voxel::AIR,
    )
}

#[test]
fn coord_math_round_trips_up_to_chunk_center_offset() {
    for size in [2, 4, 8, 16, 32] {
        let p = Point3::new(37.0, -5.0, 130.0);
        let coord = ChunkCoord::from_world_position(p, size);
        assert_eq!(coord.x, (p.x / size as f32).floor() as i32);
        assert_eq!(coord.y, (p.y / size as f32).floor() as i32);
        assert_eq!(coord.z, (p.z / size as f32).floor() as i32);

        let back = coord.to_world_position(size);
        assert!((back.x - p.x).abs() <= size as f32);
        assert!((back.y - p.y).abs() <= size as f32);
        assert!((back.z - p.z).abs() <= size as f32);
    }
}

#[test]
fn grid_set_voxel_auto_creates_chunk_and_marks_dirty() {
    let grid = bounded_grid(16);
    assert_eq!(grid.manager().loaded_count(), 0);

    grid.set_voxel(Point3::new(5, 5, 5), Voxel::new(3, 0)).unwrap();
    assert_eq!(grid.manager().loaded_count(), 1);
    assert_eq!(grid.get_voxel(Point3::new(5, 5, 5)), Voxel::new(3, 0));
    assert_eq!(grid.get_voxel(Point3::new(6, 5, 5)), Voxel::AIR);
}

#[test]
fn grid_write_then_read_preserves_every_loaded_voxel() {
    let grid = bounded_grid(16);
    grid.set_voxel(Point3::new(1, 1, 1), Voxel::new(7, 2)).unwrap();
    grid.set_voxel(Point3::new(-20, 3, 40), Voxel::new(9, 0)).unwrap();

    let mut buf = Vec::new();
    {
        let mut w = voxel_core::codec::Writer::new(std::io::Cursor::new(&mut buf), voxel_core::codec::Version::CURRENT).unwrap();
        grid.write_object(&mut w).unwrap();
    }

    let mut r = voxel_core::codec::Reader::new(std::io::Cursor::new(&buf)).unwrap();
    let restored = Grid::<MemoryStorage>::read_object(MemoryStorage::default(), &mut r).unwrap();

    assert_eq!(restored.get_voxel(Point3::new(1, 1, 1)), Voxel::new(7, 2));
    assert_eq!(restored.get_voxel(Point3::new(-20, 3, 40)), Voxel::new(9, 0));
    assert_eq!(restored.manager().loaded_count(), grid.manager().loaded_count());
}
