//! Integration coverage for mesh extraction driven through the public
//! `Chunk::generate_mesh` entry point (as opposed to `mesh::greedy::build`
//! directly, which is unit-tested next to its own module): spec §8's
//! "Greedy face count" scenario, "LOD monotonicity", and "AO bounds"
//! invariants.

use std::sync::Arc;

use parking_lot::RwLock;
use voxel_core::chunk::{Chunk, ChunkHandle};
use voxel_core::coord::ChunkCoord;
use voxel_core::error::BuildOutcome;
use voxel_core::mesh::{Direction, MAX_LOD_LEVELS};
use voxel_core::voxel::Voxel;

fn chunk_at(coord: ChunkCoord, size: i32) -> Chunk {
    let mut c = Chunk::new(coord);
    c.initialize(size).unwrap();
    c
}

fn linked(a: &mut Chunk, neighbors: &[ChunkHandle; 6]) {
    for (i, n) in neighbors.iter().enumerate() {
        a.set_neighbor(Direction::ALL[i], Some(Arc::clone(n)));
    }
}

#[test]
fn solid_floor_slab_produces_exactly_two_quads_through_generate_mesh() {
    let size = 16;
    let mut slab = chunk_at(ChunkCoord::ZERO, size);
    for z in 0..size {
        for x in 0..size {
            slab.set_voxel(x, 0, z, Voxel::new(1, 0)).unwrap();
        }
    }

    let filled_side = || {
        let mut c = chunk_at(ChunkCoord::ZERO, size);
        for z in 0..size {
            for x in 0..size {
                c.set_voxel(x, 0, z, Voxel::new(1, 0)).unwrap();
            }
        }
        c
    };

    // Direction::ALL order: -X, +X, -Y, +Y, -Z, +Z.
    let neighbors: [ChunkHandle; 6] = [
        Arc::new(RwLock::new(filled_side())),
        Arc::new(RwLock::new(filled_side())),
        Arc::new(RwLock::new(chunk_at(ChunkCoord::ZERO, size))),
        Arc::new(RwLock::new(chunk_at(ChunkCoord::ZERO, size))),
        Arc::new(RwLock::new(filled_side())),
        Arc::new(RwLock::new(filled_side())),
    ];
    linked(&mut slab, &neighbors);

    match slab.generate_mesh(true) {
        BuildOutcome::Completed(()) => {}
        BuildOutcome::Canceled => panic!("mesh generation should not cancel with no cancel request"),
    }

    let mesh = slab.mesh().expect("mesh was just built");
    let lod0 = mesh.lod(0);
    assert_eq!(lod0.vertices.len(), 8, "top + bottom quad => 8 vertices");
    assert_eq!(lod0.indices.len(), 12, "top + bottom quad => 4 triangles");

    for vertex in &lod0.vertices {
        assert!(vertex.occlusion <= 255);
    }
}

#[test]
fn lod_levels_never_increase_in_vertex_count() {
    let size = 16;
    let mut c = chunk_at(ChunkCoord::ZERO, size);
    for x in 0..size {
        for y in 0..size {
            for z in 0..size {
                if (x + y + z) % 2 == 0 {
                    c.set_voxel(x, y, z, Voxel::new(1, 0)).unwrap();
                }
            }
        }
    }

    c.generate_mesh(true);
    let mesh = c.mesh().expect("mesh was just built");
    assert_eq!(mesh.levels.len(), MAX_LOD_LEVELS);

    for level in 1..MAX_LOD_LEVELS {
        assert!(
            mesh.vertex_count(level - 1) >= mesh.vertex_count(level),
            "lod {} has more vertices than lod {}",
            level,
            level - 1
        );
    }
}
