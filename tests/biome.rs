//! Integration coverage for biome selection: spec §8's "Biome
//! normalization" universal invariant and the §8.6 "Biome selection"
//! concrete scenario.

use nalgebra::Point3;
use voxel_core::biome::BiomeManager;
use voxel_core::generation::{GenerationContext, GenerationParameters};
use voxel_core::noise::NoiseGenerator;

#[test]
fn dominant_biome_selected_by_pinned_temperature_and_humidity() {
    let mut biomes = BiomeManager::new(1);
    let x = biomes.register_biome("X").unwrap();
    {
        let info = biomes.biome_mut(x).unwrap();
        info.temperature_range = [0.7, 1.0];
        info.humidity_range = [0.0, 0.3];
    }

    // generate() -> (sample+1)*0.5, so pinning generate() to 0.7/-0.7 makes
    // the sampled temperature/humidity land exactly at 0.85/0.15.
    biomes.temperature_noise_mut().set_modifier(|_| 0.7);
    biomes.humidity_noise_mut().set_modifier(|_| -0.7);

    let params = GenerationParameters::new();
    let scratch_noise = NoiseGenerator::new(1);
    let ctx = GenerationContext::minimal(&params, &scratch_noise);

    let pos = Point3::new(100.0, 0.0, 100.0);
    assert_eq!(biomes.get_biome_at(pos, &ctx), Some(x));
}

#[test]
fn biome_influence_is_normalized_or_empty() {
    let mut biomes = BiomeManager::new(2);
    let hot = biomes.register_biome("hot").unwrap();
    let cold = biomes.register_biome("cold").unwrap();
    biomes.biome_mut(hot).unwrap().temperature_range = [0.5, 1.0];
    biomes.biome_mut(cold).unwrap().temperature_range = [0.0, 0.5];

    let params = GenerationParameters::new();
    let noise = NoiseGenerator::new(2);
    let ctx = GenerationContext::minimal(&params, &noise);

    for i in 0..20 {
        let pos = Point3::new(i as f32 * 17.0, 0.0, -i as f32 * 9.0);
        let influence = biomes.get_biome_influence(pos, &ctx);
        let total: f32 = influence.values().sum();
        assert!(
            influence.is_empty() || (total - 1.0).abs() < 1e-4,
            "influence weights must sum to 1 or be empty, got {total}"
        );
    }
}

#[test]
fn disabled_biome_never_receives_influence() {
    let mut biomes = BiomeManager::new(3);
    let only = biomes.register_biome("only").unwrap();
    biomes.biome_mut(only).unwrap().enabled = false;

    let params = GenerationParameters::new();
    let noise = NoiseGenerator::new(3);
    let ctx = GenerationContext::minimal(&params, &noise);

    let influence = biomes.get_biome_influence(Point3::new(0.0, 0.0, 0.0), &ctx);
    assert!(influence.is_empty());
}

#[test]
fn realistic_preset_installs_seven_biomes() {
    let mut biomes = BiomeManager::new(4);
    assert!(biomes.apply_preset("realistic"));
    assert_eq!(biomes.biome_count(), 7);
}

#[test]
fn fantasy_preset_installs_five_biomes() {
    let mut biomes = BiomeManager::new(5);
    assert!(biomes.apply_preset("fantasy"));
    assert_eq!(biomes.biome_count(), 5);
}

#[test]
fn unknown_preset_name_reports_failure() {
    let mut biomes = BiomeManager::new(6);
    assert!(!biomes.apply_preset("nonexistent"));
}
