//! Integration coverage for the noise presets and range invariants: spec
//! §8's "Noise range" universal invariant and the §8.5 "Noise preset"
//! concrete scenario.

use voxel_core::noise::{FractalType, NoiseGenerator, NoiseType};

#[test]
fn terrain_preset_non_mountainous_has_two_named_layers() {
    let mut noise = NoiseGenerator::new(42);
    noise.preset_terrain(false);

    assert_eq!(noise.layer_count(), 2);
    let names: Vec<&str> = noise.layer_names();
    assert!(names.contains(&"base"));
    assert!(names.contains(&"detail"));

    let base = noise.layer("base").expect("base layer");
    assert_eq!(base.noise_type, NoiseType::Perlin);
    assert_eq!(base.fractal_type, FractalType::Fbm);
    assert!((base.frequency - 0.01).abs() < 1e-6);

    let sample = noise.generate(0.0, 0.0, 0.0);
    assert!((-1.0..=1.0).contains(&sample));
}

#[test]
fn terrain_preset_mountainous_adds_ridges_layer_and_warp() {
    let mut noise = NoiseGenerator::new(7);
    noise.preset_terrain(true);

    assert_eq!(noise.layer_count(), 3);
    assert!(noise.layer_names().contains(&"ridges"));
    let ridges = noise.layer("ridges").unwrap();
    assert_eq!(ridges.noise_type, NoiseType::Ridged);
    assert_eq!(ridges.fractal_type, FractalType::Fbm);

    for _ in 0..64 {
        let sample = noise.generate(13.0, 27.0, -41.0);
        assert!((-1.0..=1.0).contains(&sample));
    }
}

#[test]
fn caves_preset_layers_and_range() {
    let mut noise = NoiseGenerator::new(99);
    noise.preset_caves();
    assert_eq!(noise.layer_count(), 2);
    assert!(noise.layer_names().contains(&"base"));
    assert!(noise.layer_names().contains(&"tunnels"));

    let tunnels = noise.layer("tunnels").unwrap();
    assert_eq!(tunnels.noise_type, NoiseType::Worley);

    for x in -3..3 {
        for z in -3..3 {
            let sample = noise.generate(x as f32 * 7.0, 0.0, z as f32 * 7.0);
            assert!((-1.0..=1.0).contains(&sample));
        }
    }
}

#[test]
fn noise_output_stays_in_range_across_algorithms_and_fractals() {
    let algorithms = [
        NoiseType::Perlin,
        NoiseType::Simplex,
        NoiseType::Worley,
        NoiseType::Value,
        NoiseType::Cubic,
        NoiseType::WhiteNoise,
        NoiseType::Ridged,
        NoiseType::Billow,
        NoiseType::Voronoi,
        NoiseType::Domain,
    ];
    let fractals = [
        FractalType::None,
        FractalType::Fbm,
        FractalType::Rigid,
        FractalType::Billow,
        FractalType::MultiFractal,
        FractalType::HybridMulti,
        FractalType::DeCarpentier,
    ];

    for &noise_type in &algorithms {
        for &fractal_type in &fractals {
            let mut noise = NoiseGenerator::new(1234);
            noise.create_layer("probe");
            {
                let layer = noise.layer_mut_by_name("probe").unwrap();
                layer.noise_type = noise_type;
                layer.fractal_type = fractal_type;
            }
            for i in 0..8 {
                let p = i as f32 * 11.3;
                let sample = noise.generate(p, -p * 0.5, p * 0.25);
                assert!(
                    (-1.0..=1.0).contains(&sample),
                    "{noise_type:?}/{fractal_type:?} produced out-of-range sample {sample}"
                );
            }
        }
    }
}

#[test]
fn repeated_sampling_is_deterministic_for_a_fixed_seed() {
    let mut a = NoiseGenerator::new(555);
    let mut b = NoiseGenerator::new(555);
    a.preset_terrain(true);
    b.preset_terrain(true);

    for i in 0..16 {
        let p = i as f32 * 3.7;
        assert_eq!(a.generate(p, p, p), b.generate(p, p, p));
    }
}
