//! Multi-level LOD via edge-collapse mesh simplification. LOD 0 is the full
//! greedy/simple mesh; levels 1..[`super::MAX_LOD_LEVELS`]-1 target
//! progressively coarser fractions (0.5x, 0.25x, 0.125x) of the base vertex
//! count.

use std::collections::{BinaryHeap, HashMap, HashSet};

use nalgebra::Vector3;

use crate::mesh::{ChunkMesh, LodMesh, Vertex, MAX_LOD_LEVELS};
use crate::total_float::TotalFloat;

const EDGE_LENGTH_WEIGHT: f32 = 5.0;
const NORMAL_WEIGHT: f32 = 10.0;
const MATERIAL_SEAM_PENALTY: f32 = 1000.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct EdgeKey(u32, u32);

impl EdgeKey {
    fn new(a: u32, b: u32) -> Self {
        if a < b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }
}

/// A heap entry, ordered so [`BinaryHeap`] (a max-heap) pops the *lowest*
/// cost edge first.
#[derive(Copy, Clone, PartialEq)]
struct HeapEntry {
    cost: TotalFloat<f32>,
    v1: u32,
    v2: u32,
}

impl Eq for HeapEntry {}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.cost.partial_cmp(&self.cost).unwrap_or(std::cmp::Ordering::Equal)
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn triangle_plane(v0: &Vertex, v1: &Vertex, v2: &Vertex) -> (Vector3<f32>, f32) {
    let normal = (v1.position - v0.position)
        .cross(&(v2.position - v0.position))
        .normalize();
    let d = -normal.dot(&v0.position);
    (normal, d)
}

fn point_plane_distance(point: Vector3<f32>, plane: (Vector3<f32>, f32)) -> f32 {
    plane.0.dot(&point) + plane.1
}

/// Builds LOD levels 1..MAX_LOD_LEVELS-1 from `base` (LOD 0) and appends
/// them to `mesh.levels`. `mesh.levels[0]` must already hold the base mesh.
pub fn build_lods(mesh: &mut ChunkMesh) {
    let base = mesh.levels[0].clone();
    if base.vertices.is_empty() {
        for _ in 1..MAX_LOD_LEVELS {
            mesh.levels.push(LodMesh::default());
        }
        return;
    }

    for level in 1..MAX_LOD_LEVELS {
        let target_fraction = 0.5f32.powi(level as i32);
        let target_vertex_count = ((base.vertices.len() as f32) * target_fraction).round() as usize;
        let removals = base.vertices.len().saturating_sub(target_vertex_count.max(3));
        mesh.levels.push(simplify(&base, removals));
    }
}

fn simplify(base: &LodMesh, target_removals: usize) -> LodMesh {
    if target_removals == 0 {
        return base.clone();
    }

    let vertex_count = base.vertices.len();
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    let mut triangle_planes = Vec::with_capacity(base.indices.len() / 3);

    for (tri_idx, tri) in base.indices.chunks(3).enumerate() {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        triangle_planes.push(triangle_plane(&base.vertices[a], &base.vertices[b], &base.vertices[c]));
        incident[a].push(tri_idx);
        incident[b].push(tri_idx);
        incident[c].push(tri_idx);
    }

    let mut edges: HashSet<EdgeKey> = HashSet::new();
    for tri in base.indices.chunks(3) {
        edges.insert(EdgeKey::new(tri[0], tri[1]));
        edges.insert(EdgeKey::new(tri[1], tri[2]));
        edges.insert(EdgeKey::new(tri[2], tri[0]));
    }

    let mut heap = BinaryHeap::new();
    for edge in &edges {
        let cost = edge_cost(base, &incident, &triangle_planes, edge.0, edge.1);
        heap.push(HeapEntry {
            cost: TotalFloat(cost),
            v1: edge.0,
            v2: edge.1,
        });
    }

    let mut collapsed = vec![false; vertex_count];
    let mut remap: Vec<u32> = (0..vertex_count as u32).collect();
    let mut positions: Vec<Vector3<f32>> = base.vertices.iter().map(|v| v.position).collect();
    let mut normals: Vec<Vector3<f32>> = base.vertices.iter().map(|v| v.normal).collect();

    let mut removed = 0;
    while removed < target_removals {
        let Some(entry) = heap.pop() else { break };
        let (v1, v2) = (entry.v1 as usize, entry.v2 as usize);
        if collapsed[v1] || collapsed[v2] {
            continue;
        }
        positions[v1] = (positions[v1] + positions[v2]) / 2.0;
        normals[v1] = (normals[v1] + normals[v2]).normalize();
        collapsed[v2] = true;
        remap[v2] = v1 as u32;
        removed += 1;
    }

    // Resolve remap chains to their fixed point.
    let resolve = |mut v: u32| -> u32 {
        let mut steps = 0;
        while remap[v as usize] != v && steps < vertex_count {
            v = remap[v as usize];
            steps += 1;
        }
        v
    };

    let mut new_indices = Vec::with_capacity(base.indices.len());
    for tri in base.indices.chunks(3) {
        let a = resolve(tri[0]);
        let b = resolve(tri[1]);
        let c = resolve(tri[2]);
        if a == b || b == c || a == c {
            continue;
        }
        new_indices.extend_from_slice(&[a, b, c]);
    }

    // Compact: drop orphaned vertices, remap indices to the compacted range.
    let mut compact_id: HashMap<u32, u32> = HashMap::new();
    let mut vertices = Vec::new();
    for &idx in &new_indices {
        if !compact_id.contains_key(&idx) {
            compact_id.insert(idx, vertices.len() as u32);
            let mut v = base.vertices[idx as usize];
            v.position = positions[idx as usize];
            v.normal = normals[idx as usize];
            vertices.push(v);
        }
    }
    let indices = new_indices.iter().map(|idx| compact_id[idx]).collect();

    LodMesh { vertices, indices }
}

fn edge_cost(
    base: &LodMesh,
    incident: &[Vec<usize>],
    planes: &[(Vector3<f32>, f32)],
    v1: u32,
    v2: u32,
) -> f32 {
    let (a, b) = (&base.vertices[v1 as usize], &base.vertices[v2 as usize]);
    let midpoint = (a.position + b.position) / 2.0;

    let mut plane_error = 0.0f32;
    for &tri in incident[v1 as usize].iter().chain(incident[v2 as usize].iter()) {
        let d = point_plane_distance(midpoint, planes[tri]);
        plane_error += d * d;
    }

    let edge_len = (a.position - b.position).norm();
    let normal_term = 1.0 - a.normal.dot(&b.normal);
    let uv_len = (a.texcoord - b.texcoord).norm();
    let material_penalty = if a.material != b.material { MATERIAL_SEAM_PENALTY } else { 0.0 };

    plane_error + EDGE_LENGTH_WEIGHT * (edge_len + uv_len) + NORMAL_WEIGHT * normal_term + material_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector2};

    fn quad_mesh(n: usize) -> LodMesh {
        // A grid of n x n quads (2 triangles each) in the XY plane, all
        // coplanar and same-material, so collapses are cheap and legal.
        let mut vertices = Vec::new();
        for y in 0..=n {
            for x in 0..=n {
                vertices.push(Vertex {
                    position: Point3::new(x as f32, y as f32, 0.0).coords,
                    normal: Vector3::new(0.0, 0.0, 1.0),
                    texcoord: Vector2::new(x as f32, y as f32),
                    color: 0xffffffff,
                    material: 1,
                    occlusion: 255,
                });
            }
        }
        let stride = n + 1;
        let mut indices = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let i0 = (y * stride + x) as u32;
                let i1 = i0 + 1;
                let i2 = i0 + stride as u32;
                let i3 = i2 + 1;
                indices.extend_from_slice(&[i0, i1, i2, i1, i3, i2]);
            }
        }
        LodMesh { vertices, indices }
    }

    #[test]
    fn lod_monotonically_decreases() {
        let mut mesh = ChunkMesh {
            levels: vec![quad_mesh(8)],
        };
        build_lods(&mut mesh);
        assert_eq!(mesh.levels.len(), MAX_LOD_LEVELS);
        for levels in mesh.levels.windows(2) {
            assert!(levels[0].vertices.len() >= levels[1].vertices.len());
        }
    }

    #[test]
    fn empty_base_produces_empty_lods() {
        let mut mesh = ChunkMesh {
            levels: vec![LodMesh::default()],
        };
        build_lods(&mut mesh);
        assert_eq!(mesh.levels.len(), MAX_LOD_LEVELS);
        assert!(mesh.levels[1].is_empty());
    }
}
