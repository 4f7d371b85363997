//! Per-vertex ambient occlusion: a small hemisphere of rays cast from each
//! emitted vertex, weighted by hit distance and blended with a directional
//! term. Only meaningful when all six neighbors are live (greedy mode);
//! [`super::simple`]'s fallback never calls this, so its vertices keep the
//! fully-lit placeholder occlusion of 255.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::chunk::Chunk;
use crate::mesh::raycast::{cast_ray, VoxelSampler};
use crate::mesh::Vertex;
use crate::voxel::Voxel;

const RAY_COUNT: usize = 16;
const GRID_SIDE: usize = 4; // sqrt(16)
const AO_RAY_LENGTH: f32 = 8.0;
const NORMAL_EPSILON: f32 = 0.05;

/// A fixed "sun" direction used for the directional blend term and to
/// replace the first stratified sample, per §4.D.
const PRIMARY_LIGHT: Vector3<f32> = Vector3::new(0.3, 0.8, 0.3);

struct NeighborSampler<'a> {
    chunk: &'a Chunk,
    neighbors: &'a [&'a Chunk],
}

impl<'a> VoxelSampler for NeighborSampler<'a> {
    fn sample(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        let size = self.chunk.size();
        if (0..size).contains(&x) && (0..size).contains(&y) && (0..size).contains(&z) {
            return Some(self.chunk.get_voxel(x, y, z));
        }
        let (dir, lx, ly, lz) = super::greedy::route_out_of_bounds(size, x, y, z);
        Some(self.neighbors[dir as usize].get_voxel(lx, ly, lz))
    }
}

/// Stratified cosine-weighted hemisphere directions over a `GRID_SIDE` x
/// `GRID_SIDE` grid of jittered-but-deterministic samples, aligned so the
/// hemisphere's pole is `normal`. The spec additionally replaces the first
/// ray with a fixed normal/light blend.
fn hemisphere_rays(normal: Vector3<f32>) -> [Vector3<f32>; RAY_COUNT] {
    let up = if normal.z.abs() < 0.999 {
        Vector3::new(0.0, 0.0, 1.0)
    } else {
        Vector3::new(1.0, 0.0, 0.0)
    };
    let tangent = up.cross(&normal).normalize();
    let bitangent = normal.cross(&tangent);

    let mut rays = [Vector3::new(0.0, 0.0, 0.0); RAY_COUNT];
    let mut i = 0;
    for gx in 0..GRID_SIDE {
        for gy in 0..GRID_SIDE {
            let u = (gx as f32 + 0.5) / GRID_SIDE as f32;
            let v = (gy as f32 + 0.5) / GRID_SIDE as f32;
            // Cosine-weighted hemisphere sample (Malley's method).
            let r = u.sqrt();
            let theta = 2.0 * std::f32::consts::PI * v;
            let local = Vector3::new(r * theta.cos(), r * theta.sin(), (1.0 - u).sqrt());
            let world = tangent * local.x + bitangent * local.y + normal * local.z;
            rays[i] = world.normalize();
            i += 1;
        }
    }
    rays[0] = (normal * 0.5 + PRIMARY_LIGHT).normalize();
    rays
}

fn occlusion_for_vertex(sampler: &NeighborSampler, position: Vector3<f32>, normal: Vector3<f32>) -> u16 {
    let origin = Point3::from(position + normal * NORMAL_EPSILON);
    let rays = hemisphere_rays(normal);

    let mut accum = 0.0f32;
    let mut hits = 0u32;
    for dir in rays {
        if let Some(hit) = cast_ray(origin, dir, AO_RAY_LENGTH, sampler) {
            let weight = (1.0 - hit.distance / AO_RAY_LENGTH).max(0.0);
            accum += weight * weight;
            hits += 1;
        }
    }

    let o = if hits > 0 { accum / RAY_COUNT as f32 } else { 0.0 };
    let directional = 1.0 - 0.5 * normal.dot(&PRIMARY_LIGHT).max(0.0);
    let blended = if hits > 0 {
        crate::util::lerp(o, directional, 0.3)
    } else {
        return 255;
    };

    let byte = 255.0 - (blended.clamp(0.0, 1.0) * 255.0).round();
    byte.clamp(0.0, 255.0) as u16
}

/// Each vertex's occlusion is independent of every other, so the hemisphere
/// raycasts are spread across rayon's global pool rather than run serially —
/// a chunk with a large greedy-merged quad count otherwise pays for 16 DDA
/// marches per vertex on a single core.
pub fn apply(vertices: &mut [Vertex], chunk: &Chunk, neighbors: &[&Chunk]) {
    let sampler = NeighborSampler { chunk, neighbors };
    vertices.par_iter_mut().for_each(|vertex| {
        vertex.occlusion = occlusion_for_vertex(&sampler, vertex.position, vertex.normal);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::ChunkCoord;

    #[test]
    fn occlusion_bytes_stay_in_range() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0));
        chunk.initialize(8).unwrap();
        chunk.set_voxel(4, 4, 4, Voxel::new(1, 0)).unwrap();
        let mut air = Chunk::new(ChunkCoord::new(0, 0, 0));
        air.initialize(8).unwrap();
        let neighbors: Vec<&Chunk> = std::iter::repeat(&air).take(6).collect();

        let mut vertices = vec![Vertex {
            position: Vector3::new(4.0, 5.0, 4.0),
            normal: Vector3::new(0.0, 1.0, 0.0),
            texcoord: nalgebra::Vector2::new(0.0, 0.0),
            color: 0xffffffff,
            material: 1,
            occlusion: 0,
        }];
        apply(&mut vertices, &chunk, &neighbors);
        assert!(vertices[0].occlusion <= 255);
    }
}
