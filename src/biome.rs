//! Biome registry, temperature/humidity/elevation blending, and surface
//! voxel selection. See [`crate::generation::orchestrator`] for how a
//! [`BiomeManager`] is wired into a generation pass.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chunk::Chunk;
use crate::coord::ChunkCoord;
use crate::error::{CoreError, Result};
use crate::generation::context::GenerationContext;
use crate::noise::NoiseGenerator;
use crate::util::hash_chunk_seed;
use crate::voxel::Voxel;

/// Sampling offset applied to the humidity noise so it doesn't trivially
/// track temperature when both happen to share a seed/layer shape.
const HUMIDITY_OFFSET: f32 = 4096.0;

/// A registered biome: ranges it prefers, a weight, and the probability
/// tables used to pick surface voxels and features once it is dominant.
#[derive(Clone, Debug)]
pub struct BiomeInfo {
    pub id: u32,
    pub name: String,
    pub enabled: bool,
    pub weight: f32,
    pub temperature_range: [f32; 2],
    pub humidity_range: [f32; 2],
    pub elevation_range: [f32; 2],
    /// Name of a layer in the context's noise generator used for a secondary
    /// threshold-gated weight multiplier. `None` disables the check.
    pub noise_layer: Option<String>,
    pub threshold: f32,
    /// Keyed by voxel type id rendered as a string (parsed via
    /// [`parse_weighted_key`]); values are relative (not normalized) weights.
    pub voxel_probabilities: HashMap<String, f32>,
    pub feature_probabilities: HashMap<String, f32>,
}

impl BiomeInfo {
    fn new(id: u32, name: String) -> Self {
        BiomeInfo {
            id,
            name,
            enabled: true,
            weight: 1.0,
            temperature_range: [0.0, 1.0],
            humidity_range: [0.0, 1.0],
            elevation_range: [0.0, 1.0],
            noise_layer: None,
            threshold: 1.0,
            voxel_probabilities: HashMap::new(),
            feature_probabilities: HashMap::new(),
        }
    }
}

/// Parses a probability-map key as a voxel/feature type id. The original
/// fed these straight into an unchecked `std::stoi`; here a non-integer key
/// is skipped (and logged) rather than silently truncated, per the spec's
/// explicit guidance on that ambiguity.
pub(crate) fn parse_weighted_key(key: &str) -> Option<u16> {
    match key.parse::<u16>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("skipping non-integer weighted key `{key}`");
            None
        }
    }
}

fn weighted_pick(map: &HashMap<String, f32>, seed: u32) -> Option<u16> {
    let mut entries: Vec<(u16, f32)> = map
        .iter()
        .filter_map(|(k, v)| parse_weighted_key(k).map(|id| (id, v.max(0.0))))
        .collect();
    entries.sort_by_key(|(id, _)| *id);
    let total: f32 = entries.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(seed as u64);
    let mut roll = rng.gen_range(0.0..total);
    for &(id, w) in &entries {
        if roll < w {
            return Some(id);
        }
        roll -= w;
    }
    entries.last().map(|&(id, _)| id)
}

fn axis_weight(value: f32, range: [f32; 2]) -> f32 {
    let [min, max] = range;
    if value >= min && value <= max {
        1.0
    } else {
        let delta = if value < min { min - value } else { value - max };
        (1.0 - 4.0 * delta).max(0.0)
    }
}

/// Owns every registered biome plus the two noise generators used to derive
/// temperature and humidity at a world position.
pub struct BiomeManager {
    biomes: Vec<BiomeInfo>,
    name_to_id: HashMap<String, u32>,
    next_id: u32,
    temperature_noise: NoiseGenerator,
    humidity_noise: NoiseGenerator,
}

impl BiomeManager {
    pub fn new(seed: u32) -> Self {
        BiomeManager {
            biomes: Vec::new(),
            name_to_id: HashMap::new(),
            next_id: 0,
            temperature_noise: NoiseGenerator::new(seed),
            humidity_noise: NoiseGenerator::new(seed.wrapping_add(1)),
        }
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.temperature_noise.set_seed(seed);
        self.humidity_noise.set_seed(seed.wrapping_add(1));
    }

    pub fn temperature_noise_mut(&mut self) -> &mut NoiseGenerator {
        &mut self.temperature_noise
    }

    pub fn humidity_noise_mut(&mut self) -> &mut NoiseGenerator {
        &mut self.humidity_noise
    }

    /// Registers a new, initially-default biome and returns its monotonic
    /// id. Fails (without mutating state) if `name` is already registered.
    pub fn register_biome(&mut self, name: impl Into<String>) -> Result<u32> {
        let name = name.into();
        if self.name_to_id.contains_key(&name) {
            log::warn!("duplicate biome registration: `{name}`");
            return Err(CoreError::validation(
                "BiomeManager::register_biome",
                format!("biome `{name}` is already registered"),
            ));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.name_to_id.insert(name.clone(), id);
        self.biomes.push(BiomeInfo::new(id, name));
        Ok(id)
    }

    pub fn biome(&self, id: u32) -> Option<&BiomeInfo> {
        self.biomes.iter().find(|b| b.id == id)
    }

    pub fn biome_mut(&mut self, id: u32) -> Option<&mut BiomeInfo> {
        self.biomes.iter_mut().find(|b| b.id == id)
    }

    pub fn biome_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn biome_count(&self) -> usize {
        self.biomes.len()
    }

    pub fn clear(&mut self) {
        self.biomes.clear();
        self.name_to_id.clear();
        self.next_id = 0;
    }

    /// Normalized influence of every enabled biome at `pos`. Empty if no
    /// biome has nonzero weight there.
    pub fn get_biome_influence(&self, pos: Point3<f32>, ctx: &GenerationContext) -> HashMap<u32, f32> {
        let temperature = (self.temperature_noise.generate(pos.x, pos.y, pos.z) + 1.0) * 0.5;
        let humid_pos = pos + Vector3::new(HUMIDITY_OFFSET, HUMIDITY_OFFSET, HUMIDITY_OFFSET);
        let humidity = (self.humidity_noise.generate(humid_pos.x, humid_pos.y, humid_pos.z) + 1.0) * 0.5;

        let height_span = (ctx.parameters.max_height() - ctx.parameters.min_height()).max(f32::EPSILON);
        let elevation = ((pos.y - ctx.parameters.min_height()) / height_span).clamp(0.0, 1.0);

        let mut weights = HashMap::new();
        let mut total = 0.0f32;
        for biome in &self.biomes {
            if !biome.enabled {
                continue;
            }
            let mut weight = axis_weight(temperature, biome.temperature_range)
                * axis_weight(humidity, biome.humidity_range)
                * axis_weight(elevation, biome.elevation_range)
                * biome.weight;

            if let Some(name) = &biome.noise_layer {
                match ctx.noise.layer(name) {
                    Some(_) => {
                        let sample = (ctx.noise.generate(pos.x, pos.y, pos.z) + 1.0) * 0.5;
                        if biome.threshold > 0.0 && sample < biome.threshold {
                            weight *= sample / biome.threshold;
                        }
                    }
                    None => log::warn!(
                        "biome `{}` references unknown noise layer `{name}`; skipping threshold check",
                        biome.name
                    ),
                }
            }

            if weight > 0.0 {
                weights.insert(biome.id, weight);
                total += weight;
            }
        }

        if total > 0.0 {
            for w in weights.values_mut() {
                *w /= total;
            }
        }
        weights
    }

    pub fn get_biome_at(&self, pos: Point3<f32>, ctx: &GenerationContext) -> Option<u32> {
        self.get_biome_influence(pos, ctx)
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    /// Writes biome id + probability-selected surface voxel type for every
    /// `(x,z)` column in `chunk` that has a non-empty top cell.
    pub fn generate_biome_data(&self, coord: ChunkCoord, ctx: &GenerationContext, chunk: &mut Chunk) -> Result<()> {
        let size = chunk.size();
        let origin = coord.to_world_position(size);

        for z in 0..size {
            for x in 0..size {
                let mut surface_y = None;
                for y in (0..size).rev() {
                    if !chunk.get_voxel(x, y, z).is_empty() {
                        surface_y = Some(y);
                        break;
                    }
                }
                let Some(y) = surface_y else { continue };

                let world = Point3::new(origin.x + x as f32, origin.y + y as f32, origin.z + z as f32);
                let Some(biome_id) = self.get_biome_at(world, ctx) else { continue };
                let Some(biome) = self.biome(biome_id) else { continue };

                let existing = chunk.get_voxel(x, y, z);
                let mut type_id = existing.type_id;
                if !biome.voxel_probabilities.is_empty() {
                    let seed = hash_chunk_seed(ctx.seed, origin.x as i32 + x, y, origin.z as i32 + z);
                    if let Some(chosen) = weighted_pick(&biome.voxel_probabilities, seed) {
                        type_id = chosen;
                    }
                }
                let data = (biome_id & 0xffff) as u16;
                chunk.set_voxel(x, y, z, Voxel::new(type_id, data))?;
            }
        }
        Ok(())
    }

    /// A seven-biome temperature/humidity matrix loosely covering tundra
    /// through desert. Any failure (duplicate name) aborts without partial
    /// registration, matching `GenerationParameters::apply_preset`'s
    /// all-or-nothing semantics.
    pub fn apply_preset(&mut self, preset_name: &str) -> bool {
        self.clear();
        match preset_name {
            "realistic" => {
                for &(name, temp, humid, weight) in &[
                    ("tundra", [0.0, 0.3], [0.0, 1.0], 1.0),
                    ("taiga", [0.2, 0.45], [0.3, 1.0], 1.0),
                    ("plains", [0.35, 0.65], [0.3, 0.7], 1.2),
                    ("forest", [0.4, 0.7], [0.5, 1.0], 1.0),
                    ("desert", [0.7, 1.0], [0.0, 0.3], 1.0),
                    ("savanna", [0.6, 0.85], [0.2, 0.5], 0.8),
                    ("swamp", [0.45, 0.75], [0.7, 1.0], 0.8),
                ] {
                    let Ok(id) = self.register_biome(name) else { return false };
                    let biome = self.biome_mut(id).expect("just registered");
                    biome.temperature_range = temp;
                    biome.humidity_range = humid;
                    biome.weight = weight;
                }
                true
            }
            "fantasy" => {
                for &(name, temp, humid, weight) in &[
                    ("crystal_wastes", [0.0, 0.25], [0.0, 0.4], 1.0),
                    ("enchanted_forest", [0.3, 0.6], [0.5, 1.0], 1.1),
                    ("ember_desert", [0.75, 1.0], [0.0, 0.35], 1.0),
                    ("mystic_highlands", [0.4, 0.7], [0.2, 0.5], 1.0),
                    ("shadowfen", [0.2, 0.5], [0.7, 1.0], 0.9),
                ] {
                    let Ok(id) = self.register_biome(name) else { return false };
                    let biome = self.biome_mut(id).expect("just registered");
                    biome.temperature_range = temp;
                    biome.humidity_range = humid;
                    biome.weight = weight;
                }
                true
            }
            _ => {
                log::warn!("unknown biome preset `{preset_name}`");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::parameters::GenerationParameters;
    use crate::noise::NoiseGenerator as Noise;

    fn test_context(params: &GenerationParameters, noise: &Noise) -> GenerationContext<'_> {
        GenerationContext::minimal(params, noise)
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut mgr = BiomeManager::new(1);
        mgr.register_biome("plains").unwrap();
        assert!(mgr.register_biome("plains").is_err());
    }

    #[test]
    fn influence_sums_to_one_or_empty() {
        let mut mgr = BiomeManager::new(7);
        mgr.apply_preset("realistic");
        let params = GenerationParameters::new();
        let noise = NoiseGenerator::new(1);
        let ctx = test_context(&params, &noise);
        let influence = mgr.get_biome_influence(Point3::new(10.0, 40.0, 10.0), &ctx);
        let total: f32 = influence.values().sum();
        assert!(influence.is_empty() || (total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn dominant_biome_matches_configured_ranges() {
        let mut mgr = BiomeManager::new(3);
        let x = mgr.register_biome("x").unwrap();
        {
            let biome = mgr.biome_mut(x).unwrap();
            biome.temperature_range = [0.7, 1.0];
            biome.humidity_range = [0.0, 0.3];
        }
        mgr.temperature_noise_mut().set_modifier(|_| 0.7); // (0.7+1)/2 = 0.85
        mgr.humidity_noise_mut().set_modifier(|_| -0.7); // (-0.7+1)/2 = 0.15

        let params = GenerationParameters::new();
        let noise = NoiseGenerator::new(1);
        let ctx = test_context(&params, &noise);
        assert_eq!(mgr.get_biome_at(Point3::new(100.0, 0.0, 100.0), &ctx), Some(x));
    }

    #[test]
    fn parse_weighted_key_rejects_non_integers() {
        assert_eq!(parse_weighted_key("12"), Some(12));
        assert_eq!(parse_weighted_key("grass"), None);
    }
}
