//! Voxel-fill rules for each `TerrainMode`: height/density functions
//! sampled per-cell and written straight into a chunk's voxel grid.

use crate::chunk::Chunk;
use crate::coord::ChunkCoord;
use crate::error::Result;
use crate::generation::context::GenerationContext;
use crate::generation::parameters::TerrainMode;
use crate::util::lerp;
use crate::voxel::Voxel;

const STONE: u16 = 1;
const DIRT: u16 = 2;
const WATER: u16 = 3;
const SAND: u16 = 4;
const GRASS: u16 = 5;
const SNOW: u16 = 6;

/// Picks a surface material by altitude within `[min_height, max_height]`,
/// matching the stratified bands `biome.rs`'s `WATER_TYPE` constant and
/// `feature.rs`'s slope sampling both assume are in play above water.
fn stratified_voxel(y: f32, min_height: f32, max_height: f32) -> u16 {
    let t = ((y - min_height) / (max_height - min_height).max(1.0)).clamp(0.0, 1.0);
    if t > 0.85 {
        SNOW
    } else if t > 0.15 {
        GRASS
    } else {
        SAND
    }
}

/// Runs the terrain pass named by `ctx.parameters.terrain_mode()` over
/// every cell of `chunk`, writing solid/air/water voxels directly.
pub fn generate_terrain(coord: ChunkCoord, ctx: &GenerationContext, chunk: &mut Chunk) -> Result<()> {
    let params = ctx.parameters;
    let size = chunk.size();
    let origin = coord.to_world_position(size);
    let min_h = params.min_height();
    let max_h = params.max_height();

    match params.terrain_mode() {
        TerrainMode::Flat => fill_flat(chunk, origin.y, min_h, max_h, params.water_enabled(), params.water_level()),
        TerrainMode::HeightMap => fill_heightmap(chunk, origin, size, ctx, min_h, max_h, false),
        TerrainMode::Desert => fill_heightmap(chunk, origin, size, ctx, min_h, max_h, true),
        TerrainMode::Volumetric => fill_volumetric(chunk, origin, size, ctx, min_h, max_h),
        TerrainMode::Islands => fill_islands(chunk, origin, size, ctx, min_h, max_h),
        TerrainMode::Mountains => fill_mountains(chunk, origin, size, ctx, min_h, max_h),
        TerrainMode::Custom => fill_volumetric(chunk, origin, size, ctx, min_h, max_h),
    }

    chunk.mark_clean();
    Ok(())
}

fn carve_cave(ctx: &GenerationContext, wx: f32, wy: f32, wz: f32) -> bool {
    if !ctx.parameters.caves_enabled() {
        return false;
    }
    let sample = ctx.cave_noise.generate(wx, wy, wz);
    sample > 1.0 - ctx.parameters.cave_density() * ctx.parameters.cave_size()
}

fn fill_flat(chunk: &mut Chunk, origin_y: f32, min_h: f32, max_h: f32, water_enabled: bool, water_level: f32) {
    let size = chunk.size();
    let midpoint = min_h + (max_h - min_h) * 0.5;
    for ly in 0..size {
        let wy = origin_y + ly as f32;
        let voxel = if wy <= midpoint {
            Voxel::new(stratified_voxel(wy, min_h, max_h), 0)
        } else if water_enabled && wy <= water_level {
            Voxel::new(WATER, 0)
        } else {
            Voxel::AIR
        };
        for lz in 0..size {
            for lx in 0..size {
                let _ = chunk.set_voxel(lx, ly, lz, voxel);
            }
        }
    }
}

fn fill_heightmap(chunk: &mut Chunk, origin: nalgebra::Point3<f32>, size: i32, ctx: &GenerationContext, min_h: f32, max_h: f32, dunes: bool) {
    let dune_scale = ctx.parameters.float_param("dune_scale", 40.0);
    let use_dunes = dunes && ctx.parameters.bool_param("use_dunes", false);

    for lz in 0..size {
        for lx in 0..size {
            let wx = origin.x + lx as f32;
            let wz = origin.z + lz as f32;
            let mut sample = ctx.terrain_noise.generate_2d(wx, wz);
            if use_dunes {
                sample += 0.15 * (wx / dune_scale).sin() * (wz / dune_scale).cos();
            }
            let height = lerp(min_h, max_h, (sample * 0.5 + 0.5).clamp(0.0, 1.0));

            for ly in 0..size {
                let wy = origin.y + ly as f32;
                let solid = wy <= height && !carve_cave(ctx, wx, wy, wz);
                let voxel = if solid {
                    Voxel::new(stratified_voxel(wy, min_h, max_h), 0)
                } else if ctx.parameters.water_enabled() && wy <= ctx.parameters.water_level() {
                    Voxel::new(WATER, 0)
                } else {
                    Voxel::AIR
                };
                let _ = chunk.set_voxel(lx, ly, lz, voxel);
            }
        }
    }
}

fn fill_volumetric(chunk: &mut Chunk, origin: nalgebra::Point3<f32>, size: i32, ctx: &GenerationContext, min_h: f32, max_h: f32) {
    for lz in 0..size {
        for ly in 0..size {
            for lx in 0..size {
                let wx = origin.x + lx as f32;
                let wy = origin.y + ly as f32;
                let wz = origin.z + lz as f32;

                let bias = 1.0 - (wy - min_h) / (max_h - min_h).max(1.0);
                let mut density = ctx.terrain_noise.generate(wx, wy, wz) + bias;
                if ctx.parameters.caves_enabled() {
                    density -= ctx.cave_noise.generate(wx, wy, wz) * ctx.parameters.cave_density() * ctx.parameters.cave_size();
                }

                let voxel = if density > 0.0 {
                    Voxel::new(stratified_voxel(wy, min_h, max_h), 0)
                } else if ctx.parameters.water_enabled() && wy <= ctx.parameters.water_level() {
                    Voxel::new(WATER, 0)
                } else {
                    Voxel::AIR
                };
                let _ = chunk.set_voxel(lx, ly, lz, voxel);
            }
        }
    }
}

fn fill_islands(chunk: &mut Chunk, origin: nalgebra::Point3<f32>, size: i32, ctx: &GenerationContext, min_h: f32, max_h: f32) {
    let island_density = ctx.parameters.float_param("island_density", 0.3);
    let height_factor = (max_h - min_h).max(1.0);

    for lz in 0..size {
        for ly in 0..size {
            for lx in 0..size {
                let wx = origin.x + lx as f32;
                let wy = origin.y + ly as f32;
                let wz = origin.z + lz as f32;

                let sample = ctx.terrain_noise.generate(wx * 0.05, wy * 0.05, wz * 0.05);
                let density = sample - (1.5 - island_density) * (wy - min_h) / height_factor;

                let voxel = if density > 0.0 {
                    Voxel::new(stratified_voxel(wy, min_h, max_h), 0)
                } else if ctx.parameters.water_enabled() && wy <= ctx.parameters.water_level() {
                    Voxel::new(WATER, 0)
                } else {
                    Voxel::AIR
                };
                let _ = chunk.set_voxel(lx, ly, lz, voxel);
            }
        }
    }
}

fn fill_mountains(chunk: &mut Chunk, origin: nalgebra::Point3<f32>, size: i32, ctx: &GenerationContext, min_h: f32, max_h: f32) {
    for lz in 0..size {
        for lx in 0..size {
            let wx = origin.x + lx as f32;
            let wz = origin.z + lz as f32;

            let base = ctx.terrain_noise.generate_2d(wx * 0.01, wz * 0.01).powi(2);
            let detail = ctx.terrain_noise.generate_2d(wx * 0.05, wz * 0.05) * 0.3;
            let height = lerp(min_h, max_h, (base + detail).clamp(0.0, 1.0));

            for ly in 0..size {
                let wy = origin.y + ly as f32;
                let solid = wy <= height && !carve_cave(ctx, wx, wy, wz);
                let voxel = if solid {
                    Voxel::new(stratified_voxel(wy, min_h, max_h), 0)
                } else if ctx.parameters.water_enabled() && wy <= ctx.parameters.water_level() {
                    Voxel::new(WATER, 0)
                } else {
                    Voxel::AIR
                };
                let _ = chunk.set_voxel(lx, ly, lz, voxel);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::parameters::GenerationParameters;
    use crate::noise::NoiseGenerator;

    #[test]
    fn flat_mode_fills_below_midpoint_and_leaves_rest_air() {
        let mut params = GenerationParameters::new();
        params.set_terrain_mode(TerrainMode::Flat);
        params.set_height_range(0.0, 32.0);
        params.enable_water(false);

        let noise = NoiseGenerator::new(1);
        let ctx = GenerationContext::minimal(&params, &noise);

        let mut chunk = Chunk::new(ChunkCoord::ZERO);
        chunk.initialize(16).unwrap();
        generate_terrain(ChunkCoord::ZERO, &ctx, &mut chunk).unwrap();

        assert_ne!(chunk.get_voxel(0, 0, 0).type_id, 0);
        assert_eq!(chunk.get_voxel(0, 15, 0).type_id, 0);
    }

    #[test]
    fn heightmap_mode_produces_varied_column_heights() {
        let mut params = GenerationParameters::new();
        params.set_terrain_mode(TerrainMode::HeightMap);
        params.set_height_range(0.0, 64.0);
        params.enable_caves(false);

        let noise = NoiseGenerator::new(7);
        let ctx = GenerationContext::minimal(&params, &noise);

        let mut chunk = Chunk::new(ChunkCoord::ZERO);
        chunk.initialize(16).unwrap();
        generate_terrain(ChunkCoord::ZERO, &ctx, &mut chunk).unwrap();

        let solid_at = |x: i32, z: i32| (0..16).filter(|&y| chunk.get_voxel(x, y, z).type_id != 0).count();
        let counts: Vec<usize> = (0..16).map(|x| solid_at(x, 0)).collect();
        assert!(counts.iter().any(|&c| c != counts[0]), "expected height variation across a row, got {counts:?}");
    }
}
