//! A thin world-space façade over [`ChunkManager`]: world↔chunk↔local
//! coordinate math, auto-creating voxel access, and the world-level raycast.

use nalgebra::{Point3, Vector3};

use crate::chunk_manager::{ChunkManager, ChunkStorage};
use crate::codec::{Reader, Tag, Writer};
use crate::coord::ChunkCoord;
use crate::error::Result;
use crate::mesh::raycast::{cast_ray, RaycastHit, VoxelSampler};
use crate::util::floor_div;
use crate::voxel::Voxel;

pub struct Grid<S: ChunkStorage> {
    manager: ChunkManager<S>,
    size: i32,
    bounds_min: Point3<i32>,
    bounds_max: Point3<i32>,
    default_voxel: Voxel,
}

fn world_to_chunk_local(world: Point3<i32>, size: i32) -> (ChunkCoord, (i32, i32, i32)) {
    let coord = ChunkCoord::new(
        floor_div(world.x, size),
        floor_div(world.y, size),
        floor_div(world.z, size),
    );
    let local = (
        world.x - coord.x * size,
        world.y - coord.y * size,
        world.z - coord.z * size,
    );
    (coord, local)
}

impl<S: ChunkStorage + 'static> Grid<S> {
    pub fn new(storage: S, size: i32, bounds_min: Point3<i32>, bounds_max: Point3<i32>, default_voxel: Voxel) -> Self {
        Grid {
            manager: ChunkManager::new(storage, size),
            size,
            bounds_min,
            bounds_max,
            default_voxel,
        }
    }

    pub fn manager(&self) -> &ChunkManager<S> {
        &self.manager
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    fn in_world_bounds(&self, world: Point3<i32>) -> bool {
        world.x >= self.bounds_min.x
            && world.x <= self.bounds_max.x
            && world.y >= self.bounds_min.y
            && world.y <= self.bounds_max.y
            && world.z >= self.bounds_min.z
            && world.z <= self.bounds_max.z
    }

    /// Missing chunks yield the configured default voxel rather than
    /// creating one.
    pub fn get_voxel(&self, world: Point3<i32>) -> Voxel {
        let (coord, (lx, ly, lz)) = world_to_chunk_local(world, self.size);
        match self.manager.get(coord) {
            Some(chunk) => chunk.read().get_voxel_safe(lx, ly, lz, self.default_voxel),
            None => self.default_voxel,
        }
    }

    /// Auto-creates the backing chunk if it's missing and `world` lies
    /// within the grid's bounds; out-of-bounds writes are silently ignored.
    pub fn set_voxel(&self, world: Point3<i32>, voxel: Voxel) -> Result<()> {
        if !self.in_world_bounds(world) {
            return Ok(());
        }
        let (coord, (lx, ly, lz)) = world_to_chunk_local(world, self.size);
        let chunk = match self.manager.get(coord) {
            Some(chunk) => chunk,
            None => self.manager.create_chunk(coord)?,
        };
        let changed = {
            let mut guard = chunk.write();
            let prev = guard.get_voxel(lx, ly, lz);
            guard.set_voxel(lx, ly, lz, voxel)?;
            prev != voxel
        };
        if changed {
            self.manager.mark_dirty(coord);
        }
        Ok(())
    }

    pub fn raycast(&self, origin: Point3<f32>, dir: Vector3<f32>, max_distance: f32) -> Option<RaycastHit> {
        let sampler = GridSampler { grid: self };
        cast_ray(origin, dir, max_distance, &sampler)
    }

    pub fn write_object<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let mut obj = w.begin_object("Grid")?;
        obj.write_field("size", Tag::I32, |w| w.write_i32(self.size))?;
        obj.write_field("bounds_min", Tag::Object, |w| {
            let mut c = w.begin_object_body("GridBoundsMin")?;
            c.write_field("x", Tag::I32, |w| w.write_i32(self.bounds_min.x))?;
            c.write_field("y", Tag::I32, |w| w.write_i32(self.bounds_min.y))?;
            c.write_field("z", Tag::I32, |w| w.write_i32(self.bounds_min.z))?;
            c.end()
        })?;
        obj.write_field("bounds_max", Tag::Object, |w| {
            let mut c = w.begin_object_body("GridBoundsMax")?;
            c.write_field("x", Tag::I32, |w| w.write_i32(self.bounds_max.x))?;
            c.write_field("y", Tag::I32, |w| w.write_i32(self.bounds_max.y))?;
            c.write_field("z", Tag::I32, |w| w.write_i32(self.bounds_max.z))?;
            c.end()
        })?;
        obj.write_field("default_voxel", Tag::Object, |w| self.default_voxel.write_object(w))?;

        let loaded = self.manager.chunks_around_point(Point3::new(0.0, 0.0, 0.0), f32::INFINITY);
        obj.write_field("chunks", Tag::Array, |w| {
            let mut arr = w.begin_array_body(loaded.len(), Tag::Object)?;
            for handle in &loaded {
                arr.push(Tag::Object, |w| handle.read().write_object(w))?;
            }
            arr.end()
        })?;
        obj.end()
    }

    pub fn read_object<R: std::io::Read + std::io::Seek>(storage: S, r: &mut Reader<R>) -> Result<Self> {
        let mut obj = r.begin_object("Grid")?;
        let size = obj.read_field("size", Tag::I32, |r, _| r.read_i32())?;
        let bounds_min = obj.read_field("bounds_min", Tag::Object, |r, _| {
            let mut c = r.begin_object_body("GridBoundsMin")?;
            let x = c.read_field("x", Tag::I32, |r, _| r.read_i32())?;
            let y = c.read_field("y", Tag::I32, |r, _| r.read_i32())?;
            let z = c.read_field("z", Tag::I32, |r, _| r.read_i32())?;
            c.end()?;
            Ok(Point3::new(x, y, z))
        })?;
        let bounds_max = obj.read_field("bounds_max", Tag::Object, |r, _| {
            let mut c = r.begin_object_body("GridBoundsMax")?;
            let x = c.read_field("x", Tag::I32, |r, _| r.read_i32())?;
            let y = c.read_field("y", Tag::I32, |r, _| r.read_i32())?;
            let z = c.read_field("z", Tag::I32, |r, _| r.read_i32())?;
            c.end()?;
            Ok(Point3::new(x, y, z))
        })?;
        let default_voxel = obj.read_field("default_voxel", Tag::Object, |r, _| Voxel::read_object(r))?;

        let grid = Grid::new(storage, size, bounds_min, bounds_max, default_voxel);

        obj.read_field("chunks", Tag::Array, |r, _size| {
            let mut arr = r.begin_array_body()?;
            while let Some(chunk) =
                arr.next(|r, _tag, _size| crate::chunk::Chunk::read_object_self_coord(r))?
            {
                grid.manager.insert_loaded(chunk.coord(), chunk)?;
            }
            arr.end()
        })?;
        obj.end()?;
        Ok(grid)
    }
}

struct GridSampler<'a, S: ChunkStorage> {
    grid: &'a Grid<S>,
}

impl<'a, S: ChunkStorage + 'static> VoxelSampler for GridSampler<'a, S> {
    fn sample(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        Some(self.grid.get_voxel(Point3::new(x, y, z)))
    }
}
