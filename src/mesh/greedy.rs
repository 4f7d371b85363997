//! Greedy meshing: collapses coplanar, same-material, visible voxel faces
//! into merged quads. Requires all six neighbor chunks to be live so
//! cross-boundary visibility can be resolved exactly; see [`super::simple`]
//! for the fallback used otherwise.

use nalgebra::{Vector2, Vector3};

use crate::chunk::Chunk;
use crate::error::BuildOutcome;
use crate::mesh::{ao, ChunkMesh, Direction, LodMesh, Vertex};
use crate::voxel::Voxel;

/// The four corners of one unit-square face at grid origin `(x,y,z)`,
/// scaled to `du` along the face's "U" tangent and `dv` along its "V"
/// tangent, wound CCW as seen from outside (from the normal's side).
/// Paired with matching proportional UVs.
pub(crate) fn face_vertices(
    dir: Direction,
    x: i32,
    y: i32,
    z: i32,
    du: i32,
    dv: i32,
) -> [(Vector3<f32>, Vector2<f32>); 4] {
    let (x, y, z) = (x as f32, y as f32, z as f32);
    let (du, dv) = (du as f32, dv as f32);

    let corners = match dir {
        Direction::PosX => [
            Vector3::new(x + 1.0, y, z),
            Vector3::new(x + 1.0, y + du, z),
            Vector3::new(x + 1.0, y + du, z + dv),
            Vector3::new(x + 1.0, y, z + dv),
        ],
        Direction::NegX => [
            Vector3::new(x, y, z + dv),
            Vector3::new(x, y + du, z + dv),
            Vector3::new(x, y + du, z),
            Vector3::new(x, y, z),
        ],
        Direction::PosY => [
            Vector3::new(x, y + 1.0, z),
            Vector3::new(x, y + 1.0, z + du),
            Vector3::new(x + dv, y + 1.0, z + du),
            Vector3::new(x + dv, y + 1.0, z),
        ],
        Direction::NegY => [
            Vector3::new(x, y, z + du),
            Vector3::new(x, y, z),
            Vector3::new(x + dv, y, z),
            Vector3::new(x + dv, y, z + du),
        ],
        Direction::PosZ => [
            Vector3::new(x, y, z + 1.0),
            Vector3::new(x + du, y, z + 1.0),
            Vector3::new(x + du, y + dv, z + 1.0),
            Vector3::new(x, y + dv, z + 1.0),
        ],
        Direction::NegZ => [
            Vector3::new(x + du, y, z),
            Vector3::new(x, y, z),
            Vector3::new(x, y + dv, z),
            Vector3::new(x + du, y + dv, z),
        ],
    };
    let uvs = [
        Vector2::new(0.0, 0.0),
        Vector2::new(du, 0.0),
        Vector2::new(du, dv),
        Vector2::new(0.0, dv),
    ];
    [
        (corners[0], uvs[0]),
        (corners[1], uvs[1]),
        (corners[2], uvs[2]),
        (corners[3], uvs[3]),
    ]
}

/// Deterministic material-indexed placeholder color (packed RGBA, alpha
/// always opaque). Real material->color lookup lives in the content layer
/// this core hands mesh data off to; the core only needs something stable
/// for tests and for a renderer with no material table loaded yet.
pub(crate) fn face_color(material: u16) -> u32 {
    let h = (material as u32).wrapping_mul(2654435761);
    let r = (h >> 24) as u8;
    let g = (h >> 16) as u8;
    let b = (h >> 8) as u8;
    u32::from_le_bytes([r, g, b, 0xff])
}

fn sample(chunk: &Chunk, neighbors: &[&Chunk], x: i32, y: i32, z: i32) -> Voxel {
    let size = chunk.size();
    if (0..size).contains(&x) && (0..size).contains(&y) && (0..size).contains(&z) {
        return chunk.get_voxel(x, y, z);
    }
    let (dir, lx, ly, lz) = route_out_of_bounds(size, x, y, z);
    neighbors[dir as usize].get_voxel(lx, ly, lz)
}

/// Exactly one axis is out of range for a single-step DDA/greedy scan off
/// the chunk's edge; this picks the matching neighbor slot and wraps that
/// axis's coordinate into the neighbor's local space.
pub(crate) fn route_out_of_bounds(size: i32, x: i32, y: i32, z: i32) -> (Direction, i32, i32, i32) {
    if x < 0 {
        (Direction::NegX, size - 1, y, z)
    } else if x >= size {
        (Direction::PosX, 0, y, z)
    } else if y < 0 {
        (Direction::NegY, x, size - 1, z)
    } else if y >= size {
        (Direction::PosY, x, 0, z)
    } else if z < 0 {
        (Direction::NegZ, x, y, size - 1)
    } else {
        (Direction::PosZ, x, y, 0)
    }
}

fn face_visible(chunk: &Chunk, neighbors: &[&Chunk], dir: Direction, x: i32, y: i32, z: i32, voxel: Voxel) -> bool {
    let (dx, dy, dz) = dir.step();
    let other = sample(chunk, neighbors, x + dx, y + dy, z + dz);
    other.is_empty() || other.type_id != voxel.type_id
}

pub fn build(chunk: &Chunk, neighbors: &[&Chunk], cancel: &dyn Fn() -> bool) -> BuildOutcome<ChunkMesh> {
    let size = chunk.size();
    let size_u = size as usize;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for &dir in &Direction::ALL {
        if cancel() {
            return BuildOutcome::Canceled;
        }

        let axis_a = dir.axis();
        let axis_b = (axis_a + 1) % 3;
        let axis_c = (axis_a + 2) % 3;

        let mut processed = vec![false; size_u * size_u];

        for p in 0..size {
            for slot in processed.iter_mut() {
                *slot = false;
            }

            for b0 in 0..size {
                for c0 in 0..size {
                    if processed[(b0 * size + c0) as usize] {
                        continue;
                    }

                    let mut coord = [0i32; 3];
                    coord[axis_a] = p;
                    coord[axis_b] = b0;
                    coord[axis_c] = c0;
                    let voxel = chunk.get_voxel(coord[0], coord[1], coord[2]);
                    if voxel.is_empty() {
                        continue;
                    }
                    if !face_visible(chunk, neighbors, dir, coord[0], coord[1], coord[2], voxel) {
                        continue;
                    }

                    let matches = |b: i32, c: i32, processed: &[bool]| -> bool {
                        if !(0..size).contains(&b) || !(0..size).contains(&c) {
                            return false;
                        }
                        if processed[(b * size + c) as usize] {
                            return false;
                        }
                        let mut cc = [0i32; 3];
                        cc[axis_a] = p;
                        cc[axis_b] = b;
                        cc[axis_c] = c;
                        let v = chunk.get_voxel(cc[0], cc[1], cc[2]);
                        !v.is_empty()
                            && v.type_id == voxel.type_id
                            && face_visible(chunk, neighbors, dir, cc[0], cc[1], cc[2], v)
                    };

                    // Expand along C.
                    let mut c1 = c0;
                    while matches(b0, c1 + 1, &processed) {
                        c1 += 1;
                    }

                    // Expand along B, one row at a time, requiring the whole
                    // [c0..=c1] run to qualify.
                    let mut b1 = b0;
                    'expand_b: loop {
                        let candidate = b1 + 1;
                        for c in c0..=c1 {
                            if !matches(candidate, c, &processed) {
                                break 'expand_b;
                            }
                        }
                        b1 = candidate;
                    }

                    for b in b0..=b1 {
                        for c in c0..=c1 {
                            processed[(b * size + c) as usize] = true;
                        }
                    }

                    let mut base = [0i32; 3];
                    base[axis_a] = p;
                    base[axis_b] = b0;
                    base[axis_c] = c0;
                    let du = b1 - b0 + 1;
                    let dv = c1 - c0 + 1;

                    let index_base = vertices.len() as u32;
                    let color = face_color(voxel.type_id);
                    for (pos, uv) in face_vertices(dir, base[0], base[1], base[2], du, dv) {
                        vertices.push(Vertex {
                            position: pos,
                            normal: dir.normal(),
                            texcoord: uv,
                            color,
                            material: voxel.type_id,
                            occlusion: 255,
                        });
                    }
                    indices.extend_from_slice(&[
                        index_base,
                        index_base + 1,
                        index_base + 2,
                        index_base,
                        index_base + 2,
                        index_base + 3,
                    ]);
                }
            }
        }
    }

    ao::apply(&mut vertices, chunk, neighbors);

    BuildOutcome::Completed(ChunkMesh {
        levels: vec![LodMesh { vertices, indices }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::ChunkCoord;

    fn filled_plane_chunk(size: i32) -> Chunk {
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0));
        c.initialize(size).unwrap();
        for x in 0..size {
            for z in 0..size {
                c.set_voxel(x, 0, z, Voxel::new(1, 0)).unwrap();
            }
        }
        c
    }

    #[test]
    fn solid_slab_emits_two_quads() {
        // The slab tiles the whole chunk floor, so the only faces that can
        // be visible from outside the chunk are top and bottom: the +-X and
        // +-Z neighbors continue the same plane (hiding the side faces),
        // while the +-Y neighbors are air (exposing top and bottom).
        let chunk = filled_plane_chunk(16);
        let filled_neighbor = filled_plane_chunk(16);
        let air = {
            let mut c = Chunk::new(ChunkCoord::new(0, 0, 0));
            c.initialize(16).unwrap();
            c
        };
        // Order matches Direction::ALL: -X, +X, -Y, +Y, -Z, +Z.
        let neighbors: Vec<&Chunk> = vec![
            &filled_neighbor,
            &filled_neighbor,
            &air,
            &air,
            &filled_neighbor,
            &filled_neighbor,
        ];
        let never_cancel = || false;
        let mesh = match build(&chunk, &neighbors, &never_cancel) {
            BuildOutcome::Completed(m) => m,
            BuildOutcome::Canceled => panic!("should not cancel"),
        };
        let lod0 = &mesh.levels[0];
        assert_eq!(lod0.vertices.len(), 8, "two quads => 8 vertices");
        assert_eq!(lod0.indices.len(), 12, "two quads => 4 triangles");
    }
}
