//! Surface mesh extraction: greedy + simple meshing, ambient occlusion, LOD
//! simplification and the voxel raycast they share. See [`crate::chunk`] for
//! the volume this reads and [`greedy`]/[`simple`] for the two face-emission
//! strategies.

pub mod ao;
pub mod greedy;
pub mod lod;
pub mod raycast;
pub mod simple;

use std::ops::Neg;

use nalgebra::{Scalar, Vector2, Vector3};
use num_traits::{One, Zero};

pub use raycast::{RaycastHit, VoxelSampler};

/// The six face directions, in the spec's fixed order: -X, +X, -Y, +Y, -Z,
/// +Z. Also used to index chunk neighbor slots.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(usize)]
pub enum Direction {
    NegX = 0,
    PosX = 1,
    NegY = 2,
    PosY = 3,
    NegZ = 4,
    PosZ = 5,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::NegX,
        Direction::PosX,
        Direction::NegY,
        Direction::PosY,
        Direction::NegZ,
        Direction::PosZ,
    ];

    /// Generic over the scalar type so callers needing an integer face
    /// normal (e.g. a raycast hit's entry axis) and callers needing an
    /// `f32` mesh normal share one implementation.
    pub fn normal<S: Scalar + One + Zero + Neg<Output = S>>(self) -> Vector3<S> {
        match self {
            Direction::NegX => Vector3::new(-S::one(), S::zero(), S::zero()),
            Direction::PosX => Vector3::new(S::one(), S::zero(), S::zero()),
            Direction::NegY => Vector3::new(S::zero(), -S::one(), S::zero()),
            Direction::PosY => Vector3::new(S::zero(), S::one(), S::zero()),
            Direction::NegZ => Vector3::new(S::zero(), S::zero(), -S::one()),
            Direction::PosZ => Vector3::new(S::zero(), S::zero(), S::one()),
        }
    }

    pub fn step(self) -> (i32, i32, i32) {
        match self {
            Direction::NegX => (-1, 0, 0),
            Direction::PosX => (1, 0, 0),
            Direction::NegY => (0, -1, 0),
            Direction::PosY => (0, 1, 0),
            Direction::NegZ => (0, 0, -1),
            Direction::PosZ => (0, 0, 1),
        }
    }

    /// The direction a ray entering the neighbor chunk from this face came
    /// from, i.e. the slot on the neighbor that points back at us.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::NegX => Direction::PosX,
            Direction::PosX => Direction::NegX,
            Direction::NegY => Direction::PosY,
            Direction::PosY => Direction::NegY,
            Direction::NegZ => Direction::PosZ,
            Direction::PosZ => Direction::NegZ,
        }
    }

    /// Axis index (0=X,1=Y,2=Z) this direction's normal runs along.
    pub fn axis(self) -> usize {
        match self {
            Direction::NegX | Direction::PosX => 0,
            Direction::NegY | Direction::PosY => 1,
            Direction::NegZ | Direction::PosZ => 2,
        }
    }
}

/// One corner of an emitted face. Packed tightly enough to hand straight to
/// a GPU upload call ([`crate::render::RenderMesh::create_from_data`]).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub texcoord: Vector2<f32>,
    /// Packed RGBA, one byte per channel, alpha in the high byte.
    pub color: u32,
    pub material: u16,
    /// Normalized ambient occlusion: 255 = fully lit, 0 = fully occluded.
    pub occlusion: u16,
}

/// A single level of detail's geometry: triangle list, CCW winding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LodMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl LodMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

pub const MAX_LOD_LEVELS: usize = 4;

/// A chunk's extracted surface: LOD 0 is full detail, up to
/// [`MAX_LOD_LEVELS`] - 1 further simplified levels follow.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub levels: Vec<LodMesh>,
}

impl ChunkMesh {
    pub fn empty() -> Self {
        ChunkMesh {
            levels: vec![LodMesh::default()],
        }
    }

    pub fn lod(&self, level: usize) -> &LodMesh {
        self.levels
            .get(level)
            .unwrap_or_else(|| &self.levels[self.levels.len() - 1])
    }

    pub fn vertex_count(&self, level: usize) -> usize {
        self.lod(level).vertices.len()
    }
}

/// Mesh-build state as a single tagged variant rather than independent
/// `meshDirty`/`meshGenerated` flags, so "building and dirty at once" is
/// unrepresentable. `Chunk::mesh_dirty()`/`mesh_generated()` project this
/// back onto the two spec-named booleans for callers that want them.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MeshState {
    /// No geometry has ever been built for this chunk.
    #[default]
    Empty,
    /// `mesh` reflects the chunk's current contents.
    Built(ChunkMesh),
    /// Stale; `generate_mesh` must run again before the mesh is trustworthy.
    /// Carries the last-known-good mesh, if any, so a renderer can keep
    /// drawing it while a rebuild is pending.
    Dirty(Option<ChunkMesh>),
    /// A build is in flight; `cancel_mesh_generation` will move this back to
    /// `Dirty` rather than losing the previous mesh.
    Building(Option<ChunkMesh>),
}

impl MeshState {
    pub fn mesh_dirty(&self) -> bool {
        !matches!(self, MeshState::Built(_))
    }

    pub fn mesh_generated(&self) -> bool {
        matches!(self, MeshState::Built(_))
            || matches!(self, MeshState::Dirty(Some(_)))
            || matches!(self, MeshState::Building(Some(_)))
    }

    pub fn mesh(&self) -> Option<&ChunkMesh> {
        match self {
            MeshState::Built(m) => Some(m),
            MeshState::Dirty(m) | MeshState::Building(m) => m.as_ref(),
            MeshState::Empty => None,
        }
    }

    pub fn mark_dirty(&mut self) {
        let prev = std::mem::replace(self, MeshState::Empty).mesh().cloned();
        *self = MeshState::Dirty(prev);
    }
}
