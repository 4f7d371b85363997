//! Fallback mesher used when a chunk does not currently have all six live
//! neighbors. Emits one quad per visible face with no cross-chunk test:
//! a face at the chunk boundary is always treated as visible, exactly as if
//! the (possibly nonexistent) neighbor cell were empty.

use crate::chunk::Chunk;
use crate::error::BuildOutcome;
use crate::mesh::{ChunkMesh, Direction, LodMesh, Vertex};

use super::greedy::{face_color, face_vertices};

const CANCEL_POLL_INTERVAL: usize = 1000;

pub fn build(chunk: &Chunk, cancel: &dyn Fn() -> bool) -> BuildOutcome<ChunkMesh> {
    let size = chunk.size();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut cells_visited = 0usize;

    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                cells_visited += 1;
                if cells_visited % CANCEL_POLL_INTERVAL == 0 && cancel() {
                    return BuildOutcome::Canceled;
                }

                let voxel = chunk.get_voxel(x, y, z);
                if voxel.is_empty() {
                    continue;
                }

                for &dir in &Direction::ALL {
                    let (dx, dy, dz) = dir.step();
                    let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                    let visible = if (0..size).contains(&nx) && (0..size).contains(&ny) && (0..size).contains(&nz) {
                        let neighbor = chunk.get_voxel(nx, ny, nz);
                        neighbor.is_empty() || neighbor.type_id != voxel.type_id
                    } else {
                        true
                    };
                    if !visible {
                        continue;
                    }

                    let base = vertices.len() as u32;
                    let color = face_color(voxel.type_id);
                    for (pos, uv) in face_vertices(dir, x, y, z, 1, 1) {
                        vertices.push(Vertex {
                            position: pos,
                            normal: dir.normal(),
                            texcoord: uv,
                            color,
                            material: voxel.type_id,
                            occlusion: 255,
                        });
                    }
                    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
                }
            }
        }
    }

    BuildOutcome::Completed(ChunkMesh {
        levels: vec![LodMesh { vertices, indices }],
    })
}
