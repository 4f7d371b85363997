//! A cubic voxel volume: the unit of load, save, and mesh generation. See
//! [`crate::chunk_manager::ChunkManager`] for ownership and [`crate::mesh`]
//! for how a chunk's surface is extracted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use log::warn;
use parking_lot::RwLock;

use crate::aabb::Aabb;
use crate::codec::reader::Reader;
use crate::codec::writer::Writer;
use crate::codec::Tag;
use crate::coord::ChunkCoord;
use crate::error::{BuildOutcome, CoreError, Result};
use crate::mesh::{greedy, lod, simple, ChunkMesh, Direction, MeshState};
use crate::voxel::Voxel;

pub type ChunkHandle = Arc<RwLock<Chunk>>;
pub type WeakChunkHandle = Weak<RwLock<Chunk>>;

/// `index = z*size^2 + y*size + x` — Z-major, Y-middle, X-minor, per the
/// on-disk voxel blob layout (§6).
fn index_of(size: i32, x: i32, y: i32, z: i32) -> usize {
    (z * size * size + y * size + x) as usize
}

fn in_bounds(size: i32, x: i32, y: i32, z: i32) -> bool {
    (0..size).contains(&x) && (0..size).contains(&y) && (0..size).contains(&z)
}

fn touches_boundary(size: i32, x: i32, y: i32, z: i32) -> bool {
    x == 0 || x == size - 1 || y == 0 || y == size - 1 || z == 0 || z == size - 1
}

pub struct Chunk {
    coord: ChunkCoord,
    size: i32,
    bounds: Aabb,
    voxels: Vec<Voxel>,
    non_empty_count: usize,
    dirty: bool,
    mesh_state: MeshState,
    neighbors: [WeakChunkHandle; 6],
    cancel: Arc<AtomicBool>,
    initialized: bool,
}

impl Chunk {
    /// An uninitialized chunk (`size == 0`). Call [`Chunk::initialize`]
    /// before use; [`ChunkManager::create_chunk`] does this for you.
    pub fn new(coord: ChunkCoord) -> Self {
        Chunk {
            coord,
            size: 0,
            bounds: Aabb::new(Default::default(), Default::default()),
            voxels: Vec::new(),
            non_empty_count: 0,
            dirty: false,
            mesh_state: MeshState::Empty,
            neighbors: Default::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            initialized: false,
        }
    }

    /// Allocates `size^3` air voxels, computes `bounds`, and marks the
    /// chunk empty/clean/mesh-dirty. Re-initializing an already-initialized
    /// chunk is allowed but logs a warning (idempotent-with-warning); `size
    /// <= 0` fails validation.
    pub fn initialize(&mut self, size: i32) -> Result<()> {
        if size <= 0 {
            return Err(CoreError::validation(
                "Chunk::initialize",
                format!("size must be positive, got {size}"),
            ));
        }
        if self.initialized {
            warn!("re-initializing already-initialized chunk at {:?}", self.coord);
        }
        self.size = size;
        self.bounds = self.coord.bounds(size);
        self.voxels = vec![Voxel::AIR; (size as usize).pow(3)];
        self.non_empty_count = 0;
        self.dirty = false;
        self.mesh_state = MeshState::Empty;
        self.initialized = true;
        Ok(())
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.non_empty_count == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mesh_dirty(&self) -> bool {
        self.mesh_state.mesh_dirty()
    }

    pub fn mesh_generated(&self) -> bool {
        self.mesh_state.mesh_generated()
    }

    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh_state.mesh()
    }

    pub fn neighbor(&self, direction: Direction) -> Option<ChunkHandle> {
        self.neighbors[direction as usize].upgrade()
    }

    pub fn set_neighbor(&mut self, direction: Direction, handle: Option<ChunkHandle>) {
        self.neighbors[direction as usize] = handle.map(|h| Arc::downgrade(&h)).unwrap_or_default();
    }

    /// Out-of-range reads return [`Voxel::AIR`] rather than failing.
    pub fn get_voxel(&self, x: i32, y: i32, z: i32) -> Voxel {
        self.get_voxel_safe(x, y, z, Voxel::AIR)
    }

    pub fn get_voxel_safe(&self, x: i32, y: i32, z: i32, default: Voxel) -> Voxel {
        if in_bounds(self.size, x, y, z) {
            self.voxels[index_of(self.size, x, y, z)]
        } else {
            default
        }
    }

    /// Out-of-range writes fail silently (no-op, not an error). A write
    /// that actually changes a cell marks the chunk dirty and mesh-dirty;
    /// one touching any face plane also marks all six neighbors
    /// mesh-dirty, unconditionally (see `notify_neighbors`).
    pub fn set_voxel(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) -> Result<()> {
        if !in_bounds(self.size, x, y, z) {
            return Ok(());
        }
        let idx = index_of(self.size, x, y, z);
        let prev = self.voxels[idx];
        if prev == voxel {
            return Ok(());
        }
        match (prev.is_empty(), voxel.is_empty()) {
            (true, false) => self.non_empty_count += 1,
            (false, true) => self.non_empty_count -= 1,
            _ => {}
        }
        self.voxels[idx] = voxel;
        self.dirty = true;
        self.mesh_state.mark_dirty();
        if touches_boundary(self.size, x, y, z) {
            self.notify_neighbors();
        }
        Ok(())
    }

    /// Uniform fill. Updates the empty flag, marks dirty/mesh-dirty, and
    /// notifies every neighbor unconditionally (every cell in a filled
    /// chunk touches some boundary).
    pub fn fill(&mut self, voxel: Voxel) {
        for v in &mut self.voxels {
            *v = voxel;
        }
        self.non_empty_count = if voxel.is_empty() { 0 } else { self.voxels.len() };
        self.dirty = true;
        self.mesh_state.mark_dirty();
        self.notify_neighbors();
    }

    /// Sets `meshDirty` on every live neighbor handle.
    pub fn notify_neighbors(&self) {
        for slot in &self.neighbors {
            if let Some(neighbor) = slot.upgrade() {
                neighbor.write().mesh_state.mark_dirty();
            }
        }
    }

    /// Sets the cancellation flag a concurrent mesh builder polls.
    pub fn cancel_mesh_generation(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Drives greedy meshing if all six neighbors are currently live,
    /// otherwise falls back to simple (per-voxel) meshing. Skips rebuilding
    /// an up-to-date, already-built mesh unless `force`.
    pub fn generate_mesh(&mut self, force: bool) -> BuildOutcome<()> {
        if !force && matches!(self.mesh_state, MeshState::Built(_)) {
            return BuildOutcome::Completed(());
        }
        if self.is_empty() {
            let mut mesh = ChunkMesh::empty();
            mesh.levels.resize(crate::mesh::MAX_LOD_LEVELS, crate::mesh::LodMesh::default());
            self.mesh_state = MeshState::Built(mesh);
            return BuildOutcome::Completed(());
        }

        self.cancel.store(false, Ordering::Relaxed);
        let building_prev = self.mesh_state.mesh().cloned();
        self.mesh_state = MeshState::Building(building_prev);

        let neighbor_handles: Vec<Option<ChunkHandle>> =
            Direction::ALL.iter().map(|&d| self.neighbor(d)).collect();
        let have_all_neighbors = neighbor_handles.iter().all(Option::is_some);

        let cancel = Arc::clone(&self.cancel);
        let cancel_check = move || cancel.load(Ordering::Relaxed);

        let outcome = if have_all_neighbors {
            let guards: Vec<_> = neighbor_handles
                .iter()
                .map(|h| h.as_ref().unwrap().read())
                .collect();
            let neighbor_refs: Vec<&Chunk> = guards.iter().map(|g| &**g).collect();
            greedy::build(self, &neighbor_refs, &cancel_check)
        } else {
            simple::build(self, &cancel_check)
        };

        match outcome {
            BuildOutcome::Completed(mut mesh) => {
                lod::build_lods(&mut mesh);
                self.mesh_state = MeshState::Built(mesh);
                BuildOutcome::Completed(())
            }
            BuildOutcome::Canceled => {
                self.mesh_state = MeshState::Dirty(self.mesh_state.mesh().cloned());
                BuildOutcome::Canceled
            }
        }
    }

    pub(crate) fn write_object<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let mut obj = w.begin_object("Chunk")?;
        obj.write_field("coord", Tag::Object, |w| {
            let mut c = w.begin_object_body("ChunkCoord")?;
            c.write_field("x", Tag::I32, |w| w.write_i32(self.coord.x))?;
            c.write_field("y", Tag::I32, |w| w.write_i32(self.coord.y))?;
            c.write_field("z", Tag::I32, |w| w.write_i32(self.coord.z))?;
            c.end()
        })?;
        obj.write_field("size", Tag::I32, |w| w.write_i32(self.size))?;
        if !self.is_empty() {
            let mut blob = Vec::with_capacity(self.voxels.len() * 4);
            for v in &self.voxels {
                blob.extend_from_slice(&v.to_le_bytes());
            }
            obj.write_field("voxels", Tag::Binary, move |w| w.write_bytes_raw(&blob))?;
        }
        obj.write_field("empty", Tag::Bool, |w| w.write_bool(self.is_empty()))?;
        obj.end()
    }

    /// Reads a chunk keyed by the caller's expected `coord` (as the chunk
    /// manager does, since storage is keyed by coord): a stored coord that
    /// disagrees is logged and overridden, never trusted over the caller.
    pub(crate) fn read_object<R: std::io::Read + std::io::Seek>(
        coord: ChunkCoord,
        r: &mut Reader<R>,
    ) -> Result<Chunk> {
        let (stored_coord, chunk) = Self::read_object_body(coord, r)?;
        if stored_coord != coord {
            warn!(
                "chunk at {:?} deserialized with stored coord {:?}; keeping requested coord",
                coord, stored_coord
            );
        }
        Ok(chunk)
    }

    /// Reads a chunk trusting whatever coord is embedded in the stream, for
    /// formats (like [`crate::grid::Grid`]'s) that don't already know each
    /// chunk's coord before reading its body.
    pub(crate) fn read_object_self_coord<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>) -> Result<Chunk> {
        let (stored_coord, mut chunk) = Self::read_object_body(ChunkCoord::ZERO, r)?;
        chunk.coord = stored_coord;
        Ok(chunk)
    }

    fn read_object_body<R: std::io::Read + std::io::Seek>(
        coord: ChunkCoord,
        r: &mut Reader<R>,
    ) -> Result<(ChunkCoord, Chunk)> {
        let mut obj = r.begin_object("Chunk")?;
        let stored_coord = obj.read_field("coord", Tag::Object, |r, _| {
            let mut c = r.begin_object_body("ChunkCoord")?;
            let x = c.read_field("x", Tag::I32, |r, _| r.read_i32())?;
            let y = c.read_field("y", Tag::I32, |r, _| r.read_i32())?;
            let z = c.read_field("z", Tag::I32, |r, _| r.read_i32())?;
            c.end()?;
            Ok(ChunkCoord::new(x, y, z))
        })?;
        let size = obj.read_field("size", Tag::I32, |r, _| r.read_i32())?;
        let empty = obj.read_field("empty", Tag::Bool, |r, _| r.read_bool())?;

        let mut chunk = Chunk::new(coord);
        chunk.initialize(size)?;

        if !empty {
            let blob = obj.read_field_or("voxels", Tag::Binary, Vec::new(), |r, size| {
                r.read_bytes_raw(size as usize)
            })?;
            if blob.is_empty() {
                chunk.fill(Voxel::AIR);
            } else {
                let expected = (size as usize).pow(3) * 4;
                if blob.len() != expected {
                    return Err(CoreError::format(format!(
                        "voxel blob size mismatch: expected {expected} bytes, found {}",
                        blob.len()
                    )));
                }
                for i in 0..(size as usize).pow(3) {
                    let bytes = [blob[i * 4], blob[i * 4 + 1], blob[i * 4 + 2], blob[i * 4 + 3]];
                    let v = Voxel::from_le_bytes(bytes);
                    chunk.voxels[i] = v;
                    if !v.is_empty() {
                        chunk.non_empty_count += 1;
                    }
                }
            }
        }
        obj.end()?;
        if stored_coord != coord {
            warn!(
                "chunk at {:?} deserialized with stored coord {:?}; keeping requested coord",
                coord, stored_coord
            );
        }
        chunk.dirty = false;
        chunk.mesh_state.mark_dirty();
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk(size: i32) -> Chunk {
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0));
        c.initialize(size).unwrap();
        c
    }

    #[test]
    fn empty_consistency() {
        let mut c = chunk(4);
        assert!(c.is_empty());
        c.set_voxel(1, 1, 1, Voxel::new(1, 0)).unwrap();
        assert!(!c.is_empty());
        c.set_voxel(1, 1, 1, Voxel::AIR).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn single_voxel_chunk_scenario() {
        let mut c = chunk(16);
        c.set_voxel(5, 5, 5, Voxel::new(1, 0)).unwrap();
        assert!(!c.is_empty());
        assert!(c.is_dirty());
        assert!(c.mesh_dirty());

        let mut buf = Vec::new();
        {
            let mut w = Writer::new(Cursor::new(&mut buf), crate::codec::Version::CURRENT).unwrap();
            c.write_object(&mut w).unwrap();
        }
        let mut r = Reader::new(Cursor::new(&buf)).unwrap();
        let roundtrip = Chunk::read_object(c.coord(), &mut r).unwrap();
        assert_eq!(roundtrip.get_voxel(5, 5, 5), Voxel::new(1, 0));
        assert!(!roundtrip.is_empty());
    }

    #[test]
    fn out_of_range_read_returns_default() {
        let c = chunk(8);
        assert_eq!(c.get_voxel(100, 0, 0), Voxel::AIR);
        assert_eq!(c.get_voxel_safe(100, 0, 0, Voxel::new(9, 9)), Voxel::new(9, 9));
    }

    #[test]
    fn out_of_range_write_is_silent_noop() {
        let mut c = chunk(8);
        c.set_voxel(100, 0, 0, Voxel::new(1, 0)).unwrap();
        assert!(c.is_empty());
        assert!(!c.is_dirty());
    }

    #[test]
    fn boundary_write_marks_all_six_neighbors_mesh_dirty() {
        let a = Arc::new(RwLock::new(chunk(16)));
        let neighbor_coords = [
            ChunkCoord::new(-1, 0, 0),
            ChunkCoord::new(1, 0, 0),
            ChunkCoord::new(0, -1, 0),
            ChunkCoord::new(0, 1, 0),
            ChunkCoord::new(0, 0, -1),
            ChunkCoord::new(0, 0, 1),
        ];
        let neighbors: Vec<ChunkHandle> = neighbor_coords
            .iter()
            .map(|_| Arc::new(RwLock::new(chunk(16))) as ChunkHandle)
            .collect();
        for (i, n) in neighbors.iter().enumerate() {
            a.write().set_neighbor(Direction::ALL[i], Some(Arc::clone(n)));
        }
        for n in &neighbors {
            // build a mesh so mesh_dirty starts false, then verify the write flips it.
            n.write().mesh_state = MeshState::Built(ChunkMesh::empty());
        }

        a.write().set_voxel(0, 0, 0, Voxel::new(1, 0)).unwrap();

        for n in &neighbors {
            assert!(n.read().mesh_dirty());
        }
    }
}
