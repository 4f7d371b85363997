//! Multi-octave composition (`generateFractal` in the original): the six
//! [`FractalType`] variants layered over a [`NoiseType`].

use super::algorithms::{generate_single, NoiseType};
use super::interpolate::InterpolationType;
use super::lattice::Lattice;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FractalType {
    None,
    Fbm,
    Rigid,
    Billow,
    MultiFractal,
    HybridMulti,
    DeCarpentier,
}

impl FractalType {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => FractalType::Fbm,
            2 => FractalType::Rigid,
            3 => FractalType::Billow,
            4 => FractalType::MultiFractal,
            5 => FractalType::HybridMulti,
            6 => FractalType::DeCarpentier,
            _ => FractalType::None,
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            FractalType::None => 0,
            FractalType::Fbm => 1,
            FractalType::Rigid => 2,
            FractalType::Billow => 3,
            FractalType::MultiFractal => 4,
            FractalType::HybridMulti => 5,
            FractalType::DeCarpentier => 6,
        }
    }
}

/// `octaves` is expected pre-clamped to `1..=10`, `persistence` to
/// `0.0..=1.0`, `lacunarity` to `1.0..=4.0` (see
/// [`super::NoiseGenerator::validate_parameters`]).
#[allow(clippy::too_many_arguments)]
pub fn generate_fractal(
    lattice: &Lattice,
    seed: u32,
    interp: InterpolationType,
    noise_type: NoiseType,
    fractal_type: FractalType,
    x: f32,
    y: f32,
    z: f32,
    octaves: i32,
    persistence: f32,
    lacunarity: f32,
) -> f32 {
    let sample = |freq_x: f32, freq_y: f32, freq_z: f32| generate_single(lattice, seed, interp, noise_type, freq_x, freq_y, freq_z);

    match fractal_type {
        FractalType::None => sample(x, y, z),

        FractalType::Fbm => {
            let mut result = 0.0;
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut max_value = 0.0;
            for _ in 0..octaves {
                result += sample(x * frequency, y * frequency, z * frequency) * amplitude;
                max_value += amplitude;
                amplitude *= persistence;
                frequency *= lacunarity;
            }
            result / max_value
        }

        FractalType::Rigid => {
            let mut result = 0.0;
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut max_value = 0.0;
            for _ in 0..octaves {
                let noise = 1.0 - sample(x * frequency, y * frequency, z * frequency).abs();
                let noise = noise * noise;
                result += noise * amplitude;
                max_value += amplitude;
                amplitude *= persistence;
                frequency *= lacunarity;
            }
            result / max_value
        }

        FractalType::Billow => {
            let mut result = 0.0;
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut max_value = 0.0;
            for _ in 0..octaves {
                let noise = sample(x * frequency, y * frequency, z * frequency).abs();
                result += (noise * 2.0 - 1.0) * amplitude;
                max_value += amplitude;
                amplitude *= persistence;
                frequency *= lacunarity;
            }
            result / max_value
        }

        // No persistence decay here: the original's loop only advances
        // frequency by lacunarity, leaving amplitude fixed at the caller's
        // value every octave.
        FractalType::MultiFractal => {
            let mut result = 1.0;
            let amplitude = 1.0;
            let mut frequency = 1.0;
            for _ in 0..octaves {
                result *= (sample(x * frequency, y * frequency, z * frequency) + 1.0) * amplitude * 0.5 + 0.5;
                frequency *= lacunarity;
            }
            result * 2.0 - 1.0
        }

        FractalType::HybridMulti => {
            let mut result = sample(x, y, z) + 0.5;
            let mut weight = result;
            let mut frequency = 1.0;
            let mut amplitude = 1.0;

            for _ in 1..octaves {
                if weight > 1.0 {
                    weight = 1.0;
                }
                let signal = (sample(x * frequency, y * frequency, z * frequency) + 0.5) * amplitude;
                result += weight * signal;
                weight *= signal * 2.0;

                frequency *= lacunarity;
                amplitude *= persistence;
            }

            result * 2.0 - 1.0
        }

        FractalType::DeCarpentier => {
            let offset = 1.0;
            let gain = 2.0;

            let mut result = sample(x, y, z);
            let mut signal = result;
            let mut frequency = 1.0;
            let mut amplitude = 1.0;

            for _ in 1..octaves {
                let weight = (offset - signal * gain).clamp(0.0, 1.0);

                signal = sample(x * frequency, y * frequency, z * frequency);
                result += weight * signal * amplitude;

                frequency *= lacunarity;
                amplitude *= persistence;
            }

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fbm_single_octave_matches_base_sample() {
        let lattice = Lattice::new(3);
        let fbm = generate_fractal(&lattice, 0, InterpolationType::Quintic, NoiseType::Perlin, FractalType::Fbm, 1.0, 2.0, 3.0, 1, 0.5, 2.0);
        let base = generate_single(&lattice, 0, InterpolationType::Quintic, NoiseType::Perlin, 1.0, 2.0, 3.0);
        assert!((fbm - base).abs() < 1e-5);
    }

    #[test]
    fn rigid_stays_nonnegative_ish() {
        let lattice = Lattice::new(4);
        let v = generate_fractal(&lattice, 0, InterpolationType::Quintic, NoiseType::Perlin, FractalType::Rigid, 0.3, 0.6, 0.9, 4, 0.6, 2.1);
        assert!(v.is_finite());
    }
}
