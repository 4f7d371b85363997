//! The borrow bundle handed down through a single chunk's generation pass:
//! the parameter set in force, the noise generators it should sample, and
//! the optional biome/feature/distribution collaborators.

use nalgebra::Point3;

use crate::aabb::Aabb;
use crate::biome::BiomeManager;
use crate::coord::ChunkCoord;
use crate::distribution::DistributionControl;
use crate::feature::FeaturePlacement;
use crate::generation::parameters::GenerationParameters;
use crate::noise::NoiseGenerator;

/// Everything a terrain/biome/feature pass needs to act on one chunk.
///
/// Built fresh per chunk by the orchestrator (`full`), or assembled
/// directly by tests and standalone callers (`minimal`) that only need
/// a parameter set and a single noise source.
pub struct GenerationContext<'a> {
    pub coord: ChunkCoord,
    pub parameters: &'a GenerationParameters,
    pub noise: &'a NoiseGenerator,
    pub terrain_noise: &'a NoiseGenerator,
    pub cave_noise: &'a NoiseGenerator,
    pub feature_placement: Option<&'a FeaturePlacement>,
    pub distribution: Option<&'a DistributionControl>,
    pub biomes: Option<&'a BiomeManager>,
    pub seed: u32,
    pub world_bounds: Aabb,
    pub chunk_size: i32,
}

impl<'a> GenerationContext<'a> {
    /// A context with a single noise generator standing in for all three
    /// roles (`noise`, `terrain_noise`, `cave_noise`) and no biome, feature
    /// or distribution collaborators. Enough to exercise terrain/noise
    /// sampling and constraints that don't depend on those collaborators.
    pub fn minimal(parameters: &'a GenerationParameters, noise: &'a NoiseGenerator) -> GenerationContext<'a> {
        GenerationContext {
            coord: ChunkCoord::ZERO,
            parameters,
            noise,
            terrain_noise: noise,
            cave_noise: noise,
            feature_placement: None,
            distribution: None,
            biomes: None,
            seed: noise.seed(),
            world_bounds: Aabb::new(
                Point3::new(f32::MIN / 2.0, parameters.min_height(), f32::MIN / 2.0),
                Point3::new(f32::MAX / 2.0, parameters.max_height(), f32::MAX / 2.0),
            ),
            chunk_size: 16,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn full(
        coord: ChunkCoord,
        parameters: &'a GenerationParameters,
        noise: &'a NoiseGenerator,
        terrain_noise: &'a NoiseGenerator,
        cave_noise: &'a NoiseGenerator,
        feature_placement: Option<&'a FeaturePlacement>,
        distribution: Option<&'a DistributionControl>,
        biomes: Option<&'a BiomeManager>,
        seed: u32,
        world_bounds: Aabb,
        chunk_size: i32,
    ) -> GenerationContext<'a> {
        GenerationContext {
            coord,
            parameters,
            noise,
            terrain_noise,
            cave_noise,
            feature_placement,
            distribution,
            biomes,
            seed,
            world_bounds,
            chunk_size,
        }
    }
}
