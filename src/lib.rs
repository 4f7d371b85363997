//! A standalone voxel-world core: chunked storage, surface meshing, layered
//! procedural noise, and the biome/feature/distribution machinery used to
//! turn a seed into terrain. No rendering, networking, or entity/ECS layer —
//! those are external collaborators a game built on this crate supplies.

pub mod aabb;
pub mod biome;
pub mod chunk;
pub mod chunk_manager;
pub mod codec;
pub mod coord;
pub mod distribution;
pub mod error;
pub mod feature;
pub mod generation;
pub mod grid;
pub mod mesh;
pub mod noise;
pub mod total_float;
pub mod util;
pub mod voxel;

/// Common imports for crates building directly on top of this one.
pub mod prelude {
    pub use crate::aabb::Aabb;
    pub use crate::biome::BiomeManager;
    pub use crate::chunk::{Chunk, ChunkHandle, WeakChunkHandle};
    pub use crate::chunk_manager::{ChunkManager, ChunkStorage};
    pub use crate::coord::ChunkCoord;
    pub use crate::distribution::DistributionControl;
    pub use crate::error::{BuildOutcome, CoreError, Result};
    pub use crate::feature::FeaturePlacement;
    pub use crate::generation::{GenerationContext, GenerationOrchestrator, GenerationParameters};
    pub use crate::grid::Grid;
    pub use crate::noise::NoiseGenerator;
    pub use crate::voxel::Voxel;
}
