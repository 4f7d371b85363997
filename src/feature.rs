//! Constraint-checked feature instancing: per-type generator closures,
//! tagged + custom placement constraints, and the point-of-interest
//! registry other constraints (and biome/feature density) query against.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::chunk::Chunk;
use crate::coord::ChunkCoord;
use crate::error::{CoreError, Result};
use crate::generation::context::GenerationContext;
use crate::mesh::raycast::VoxelSampler;
use crate::voxel::Voxel;

/// Surface water is always voxel type 3, matching the teacher's fixed
/// material table (see `generation/terrain.rs`'s stratified voxel bands).
const WATER_TYPE: u16 = 3;

pub type FeatureGenerator = Box<dyn for<'a> Fn(Point3<f32>, &GenerationContext<'a>, &mut Chunk) -> bool + Send + Sync>;
pub type CustomConstraint = Box<dyn for<'a> Fn(Point3<f32>, &GenerationContext<'a>, &dyn VoxelSampler) -> bool + Send + Sync>;

#[derive(Clone, Debug)]
pub enum Constraint {
    Elevation { min_y: f32, max_y: f32 },
    Distance { reference: Point3<f32>, min: f32, max: f32 },
    BiomeType { ids: Vec<u32> },
    SlopeAngle { max_degrees: f32 },
    NearWater { max_dist: f32 },
    FarFromWater { min_dist: f32 },
    NearFeature { max_dist: f32, type_ids: Vec<u32> },
    FarFromFeature { min_dist: f32, type_ids: Vec<u32> },
    NoiseThreshold { threshold: f32, above: bool },
    Density { radius: f32, max_count: usize },
}

#[derive(Copy, Clone, Debug)]
pub struct PointOfInterest {
    pub position: Point3<f32>,
    pub type_id: u32,
    pub radius: f32,
}

pub struct FeatureTypeInfo {
    pub id: u32,
    pub name: String,
    pub generator: Option<FeatureGenerator>,
    pub constraints: Vec<Constraint>,
    pub custom_constraints: Vec<CustomConstraint>,
    pub spacing: f32,
}

impl FeatureTypeInfo {
    fn new(id: u32, name: String) -> Self {
        FeatureTypeInfo {
            id,
            name,
            generator: None,
            constraints: Vec::new(),
            custom_constraints: Vec::new(),
            spacing: 0.0,
        }
    }
}

/// Converts `pos` (world space) into a `(x,y,z)` cell index local to the
/// chunk that owns `coord`, assuming `chunk`'s own edge length.
fn chunk_local(chunk: &Chunk, coord: ChunkCoord, pos: Point3<f32>) -> (i32, i32, i32) {
    let origin = coord.to_world_position(chunk.size());
    ((pos.x - origin.x).floor() as i32, (pos.y - origin.y).floor() as i32, (pos.z - origin.z).floor() as i32)
}

fn surface_height(chunk: &Chunk, x: i32, z: i32) -> i32 {
    for y in (0..chunk.size()).rev() {
        if chunk.get_voxel_safe(x, y, z, Voxel::AIR).type_id != 0 {
            return y;
        }
    }
    0
}

fn any_cell_within(chunk: &Chunk, coord: ChunkCoord, pos: Point3<f32>, radius: f32, type_id: u16) -> bool {
    let (cx, cy, cz) = chunk_local(chunk, coord, pos);
    let r = radius.ceil() as i32;
    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                if (((dx * dx + dy * dy + dz * dz) as f32).sqrt()) > radius {
                    continue;
                }
                if chunk.get_voxel_safe(cx + dx, cy + dy, cz + dz, Voxel::AIR).type_id == type_id {
                    return true;
                }
            }
        }
    }
    false
}

struct ChunkSampler<'a> {
    chunk: &'a Chunk,
}

impl<'a> VoxelSampler for ChunkSampler<'a> {
    fn sample(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        Some(self.chunk.get_voxel_safe(x, y, z, Voxel::AIR))
    }
}

/// Owns every registered feature type, its placed-instance history (used by
/// `Density`/`NearFeature`/spacing checks), and the point-of-interest list.
pub struct FeaturePlacement {
    types: Vec<FeatureTypeInfo>,
    name_to_id: HashMap<String, u32>,
    next_id: u32,
    placed: HashMap<(ChunkCoord, u32), Vec<Point3<f32>>>,
    pois: Vec<PointOfInterest>,
}

impl Default for FeaturePlacement {
    fn default() -> Self {
        FeaturePlacement {
            types: Vec::new(),
            name_to_id: HashMap::new(),
            next_id: 0,
            placed: HashMap::new(),
            pois: Vec::new(),
        }
    }
}

impl FeaturePlacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_feature_type(&mut self, name: impl Into<String>) -> Result<u32> {
        let name = name.into();
        if self.name_to_id.contains_key(&name) {
            log::warn!("duplicate feature type registration: `{name}`");
            return Err(CoreError::validation(
                "FeaturePlacement::register_feature_type",
                format!("feature type `{name}` is already registered"),
            ));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.name_to_id.insert(name.clone(), id);
        self.types.push(FeatureTypeInfo::new(id, name));
        Ok(id)
    }

    pub fn feature_type(&self, id: u32) -> Option<&FeatureTypeInfo> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn feature_type_mut(&mut self, id: u32) -> Option<&mut FeatureTypeInfo> {
        self.types.iter_mut().find(|t| t.id == id)
    }

    pub fn feature_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn type_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.types.iter().map(|t| t.id)
    }

    fn any_poi_within(&self, pos: Point3<f32>, radius: f32, type_ids: &[u32]) -> bool {
        self.pois.iter().any(|poi| type_ids.contains(&poi.type_id) && (poi.position - pos).norm() <= radius)
    }

    fn check_constraint(&self, constraint: &Constraint, type_id: u32, pos: Point3<f32>, ctx: &GenerationContext, chunk: &Chunk) -> bool {
        match constraint {
            Constraint::Elevation { min_y, max_y } => pos.y >= *min_y && pos.y <= *max_y,
            Constraint::Distance { reference, min, max } => {
                let d = (pos - reference).norm();
                d >= *min && d <= *max
            }
            Constraint::BiomeType { ids } => {
                if ids.is_empty() {
                    return true;
                }
                match ctx.biomes {
                    Some(biomes) => biomes.get_biome_at(pos, ctx).map(|id| ids.contains(&id)).unwrap_or(true),
                    None => {
                        log::warn!("BiomeType constraint with no biome manager in context; accepting");
                        true
                    }
                }
            }
            Constraint::SlopeAngle { max_degrees } => {
                let (lx, _ly, lz) = chunk_local(chunk, ctx.coord, pos);
                let hl = surface_height(chunk, lx - 1, lz) as f32;
                let hr = surface_height(chunk, lx + 1, lz) as f32;
                let hd = surface_height(chunk, lx, lz - 1) as f32;
                let hu = surface_height(chunk, lx, lz + 1) as f32;
                let normal = Vector3::new(hl - hr, 2.0, hd - hu).normalize();
                let angle = normal.dot(&Vector3::y()).clamp(-1.0, 1.0).acos().to_degrees();
                angle <= *max_degrees
            }
            Constraint::NearWater { max_dist } => any_cell_within(chunk, ctx.coord, pos, *max_dist, WATER_TYPE),
            Constraint::FarFromWater { min_dist } => !any_cell_within(chunk, ctx.coord, pos, *min_dist, WATER_TYPE),
            Constraint::NearFeature { max_dist, type_ids } => type_ids.is_empty() || self.any_poi_within(pos, *max_dist, type_ids),
            Constraint::FarFromFeature { min_dist, type_ids } => type_ids.is_empty() || !self.any_poi_within(pos, *min_dist, type_ids),
            Constraint::NoiseThreshold { threshold, above } => {
                let sample = ctx.noise.generate(pos.x, pos.y, pos.z);
                if *above {
                    sample >= *threshold
                } else {
                    sample <= *threshold
                }
            }
            Constraint::Density { radius, max_count } => {
                let count = self
                    .placed
                    .get(&(ctx.coord, type_id))
                    .map(|positions| positions.iter().filter(|p| (*p - pos).norm() <= *radius).count())
                    .unwrap_or(0);
                count < *max_count
            }
        }
    }

    pub fn can_place_feature(&self, type_id: u32, pos: Point3<f32>, ctx: &GenerationContext, chunk: &Chunk) -> bool {
        let Some(info) = self.feature_type(type_id) else {
            log::warn!("can_place_feature: unknown feature type {type_id}");
            return false;
        };

        for constraint in &info.constraints {
            if !self.check_constraint(constraint, type_id, pos, ctx, chunk) {
                return false;
            }
        }

        if !info.custom_constraints.is_empty() {
            let sampler = ChunkSampler { chunk };
            for custom in &info.custom_constraints {
                if !custom(pos, ctx, &sampler) {
                    return false;
                }
            }
        }

        if info.spacing > 0.0 {
            if let Some(positions) = self.placed.get(&(ctx.coord, type_id)) {
                if positions.iter().any(|p| (*p - pos).norm() < info.spacing) {
                    return false;
                }
            }
        }

        true
    }

    /// Samples `2*max_count` candidates from the context's distribution
    /// control, keeping at most `max_count` that pass `can_place_feature`.
    pub fn find_placements_in_chunk(&self, type_id: u32, max_count: usize, ctx: &GenerationContext, chunk: &Chunk) -> Vec<Point3<f32>> {
        let Some(distribution) = ctx.distribution else {
            log::warn!("find_placements_in_chunk: no distribution control in context");
            return Vec::new();
        };
        let candidates = distribution.generate_distribution_points(ctx.coord, 2 * max_count, type_id, ctx.seed);

        let mut accepted = Vec::new();
        for candidate in candidates {
            if accepted.len() >= max_count {
                break;
            }
            if self.can_place_feature(type_id, candidate, ctx, chunk) {
                accepted.push(candidate);
            }
        }
        accepted
    }

    /// Invokes the type's generator at `pos`; on success, records the
    /// placement for later `Density`/`NearFeature`/spacing checks.
    pub fn place_feature(&mut self, type_id: u32, pos: Point3<f32>, ctx: &GenerationContext, chunk: &mut Chunk) -> bool {
        let (name, spacing, has_generator) = match self.feature_type(type_id) {
            Some(info) => (info.name.clone(), info.spacing, info.generator.is_some()),
            None => {
                log::warn!("place_feature: unknown feature type {type_id}");
                return false;
            }
        };
        if !has_generator {
            log::warn!("feature type `{name}` has no generator installed");
            return false;
        }

        let placed = {
            let info = self.feature_type(type_id).expect("checked above");
            (info.generator.as_ref().expect("checked above"))(pos, ctx, chunk)
        };

        if placed {
            self.placed.entry((ctx.coord, type_id)).or_default().push(pos);
            self.pois.push(PointOfInterest {
                position: pos,
                type_id,
                radius: spacing.max(1.0),
            });
        }
        placed
    }

    pub fn placements_in(&self, coord: ChunkCoord, type_id: u32) -> &[Point3<f32>] {
        self.placed.get(&(coord, type_id)).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::parameters::GenerationParameters;
    use crate::noise::NoiseGenerator;

    fn chunk(coord: ChunkCoord) -> Chunk {
        let mut c = Chunk::new(coord);
        c.initialize(16).unwrap();
        c
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut fp = FeaturePlacement::new();
        fp.register_feature_type("tree").unwrap();
        assert!(fp.register_feature_type("tree").is_err());
    }

    #[test]
    fn elevation_constraint_accepts_in_range() {
        let mut fp = FeaturePlacement::new();
        let tree = fp.register_feature_type("tree").unwrap();
        fp.feature_type_mut(tree).unwrap().constraints.push(Constraint::Elevation { min_y: 0.0, max_y: 10.0 });

        let params = GenerationParameters::new();
        let noise = NoiseGenerator::new(1);
        let ctx = GenerationContext::minimal(&params, &noise);
        let c = chunk(ChunkCoord::ZERO);

        assert!(fp.can_place_feature(tree, Point3::new(1.0, 5.0, 1.0), &ctx, &c));
        assert!(!fp.can_place_feature(tree, Point3::new(1.0, 50.0, 1.0), &ctx, &c));
    }

    #[test]
    fn empty_biome_type_list_always_accepts() {
        let mut fp = FeaturePlacement::new();
        let tree = fp.register_feature_type("tree").unwrap();
        fp.feature_type_mut(tree).unwrap().constraints.push(Constraint::BiomeType { ids: Vec::new() });

        let params = GenerationParameters::new();
        let noise = NoiseGenerator::new(1);
        let ctx = GenerationContext::minimal(&params, &noise);
        let c = chunk(ChunkCoord::ZERO);
        assert!(fp.can_place_feature(tree, Point3::new(1.0, 1.0, 1.0), &ctx, &c));
    }

    #[test]
    fn density_constraint_blocks_after_max_count() {
        let mut fp = FeaturePlacement::new();
        let tree = fp.register_feature_type("tree").unwrap();
        fp.feature_type_mut(tree).unwrap().constraints.push(Constraint::Density { radius: 100.0, max_count: 1 });
        fp.feature_type_mut(tree).unwrap().generator = Some(Box::new(|_, _, _| true));

        let params = GenerationParameters::new();
        let noise = NoiseGenerator::new(1);
        let ctx = GenerationContext::minimal(&params, &noise);
        let mut c = chunk(ChunkCoord::ZERO);

        assert!(fp.place_feature(tree, Point3::new(1.0, 1.0, 1.0), &ctx, &mut c));
        assert!(!fp.can_place_feature(tree, Point3::new(2.0, 1.0, 1.0), &ctx, &c));
    }
}
