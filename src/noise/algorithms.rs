//! Single-octave noise algorithms (`generateSingle` in the original): the
//! ten [`NoiseType`] variants sampled at one frequency.

use super::interpolate::{interpolate, InterpolationType};
use super::lattice::Lattice;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoiseType {
    Perlin,
    Simplex,
    Worley,
    Value,
    Cubic,
    WhiteNoise,
    Ridged,
    Billow,
    Voronoi,
    Domain,
}

impl NoiseType {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => NoiseType::Simplex,
            2 => NoiseType::Worley,
            3 => NoiseType::Value,
            4 => NoiseType::Cubic,
            5 => NoiseType::WhiteNoise,
            6 => NoiseType::Ridged,
            7 => NoiseType::Billow,
            8 => NoiseType::Voronoi,
            9 => NoiseType::Domain,
            _ => NoiseType::Perlin,
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            NoiseType::Perlin => 0,
            NoiseType::Simplex => 1,
            NoiseType::Worley => 2,
            NoiseType::Value => 3,
            NoiseType::Cubic => 4,
            NoiseType::WhiteNoise => 5,
            NoiseType::Ridged => 6,
            NoiseType::Billow => 7,
            NoiseType::Voronoi => 8,
            NoiseType::Domain => 9,
        }
    }
}

const CELL_PRIMES: [i64; 3] = [15731, 789221, 1376312589];

fn feature_point(seed: u32, nx: i32, ny: i32, nz: i32) -> (f32, f32, f32) {
    let mut cell_seed = seed as i64;
    cell_seed = cell_seed.wrapping_mul(CELL_PRIMES[0]).wrapping_add((nx as i64).wrapping_mul(CELL_PRIMES[1]));
    cell_seed = cell_seed.wrapping_mul(CELL_PRIMES[0]).wrapping_add((ny as i64).wrapping_mul(CELL_PRIMES[1]));
    cell_seed = cell_seed.wrapping_mul(CELL_PRIMES[0]).wrapping_add((nz as i64).wrapping_mul(CELL_PRIMES[1]));

    let fx = nx as f32 + (cell_seed.rem_euclid(1000) as f32) / 1000.0;
    cell_seed = cell_seed.wrapping_mul(CELL_PRIMES[0]);
    let fy = ny as f32 + (cell_seed.rem_euclid(1000) as f32) / 1000.0;
    cell_seed = cell_seed.wrapping_mul(CELL_PRIMES[0]);
    let fz = nz as f32 + (cell_seed.rem_euclid(1000) as f32) / 1000.0;

    (fx, fy, fz)
}

/// Hash-based value noise at an integer lattice point, independent of the
/// gradient [`Lattice`] (ported as-is from the original's standalone hash).
pub fn value_noise(x: i32, y: i32, z: i32) -> f32 {
    let n = (x as i64) + (y as i64) * 57 + (z as i64) * 131;
    let n = ((n << 13) ^ n) as i64;
    let n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1_376_312_589);
    1.0 - ((n & 0x7fffffff) as f32 / 1_073_741_824.0)
}

fn trilinear(interp: InterpolationType, corners: [f32; 8], tx: f32, ty: f32, tz: f32) -> f32 {
    let [n000, n100, n010, n110, n001, n101, n011, n111] = corners;
    let x1 = interpolate(interp, n000, n100, tx);
    let x2 = interpolate(interp, n010, n110, tx);
    let y1 = interpolate(interp, x1, x2, ty);

    let x3 = interpolate(interp, n001, n101, tx);
    let x4 = interpolate(interp, n011, n111, tx);
    let y2 = interpolate(interp, x3, x4, ty);

    interpolate(interp, y1, y2, tz)
}

fn value_or_cubic(interp: InterpolationType, x: f32, y: f32, z: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let z0 = z.floor() as i32;
    let sx = x - x0 as f32;
    let sy = y - y0 as f32;
    let sz = z - z0 as f32;

    let corners = [
        value_noise(x0, y0, z0),
        value_noise(x0 + 1, y0, z0),
        value_noise(x0, y0 + 1, z0),
        value_noise(x0 + 1, y0 + 1, z0),
        value_noise(x0, y0, z0 + 1),
        value_noise(x0 + 1, y0, z0 + 1),
        value_noise(x0, y0 + 1, z0 + 1),
        value_noise(x0 + 1, y0 + 1, z0 + 1),
    ];

    let (tx, ty, tz) = match interp {
        InterpolationType::Linear => (sx, sy, sz),
        _ => (
            sx * sx * (3.0 - 2.0 * sx),
            sy * sy * (3.0 - 2.0 * sy),
            sz * sz * (3.0 - 2.0 * sz),
        ),
    };

    trilinear(interp, corners, tx, ty, tz)
}

fn worley_or_voronoi(seed: u32, x: f32, y: f32, z: f32, manhattan: bool) -> f32 {
    let cell_x = x.floor() as i32;
    let cell_y = y.floor() as i32;
    let cell_z = z.floor() as i32;

    let mut min_dist = 1000.0f32;
    let mut closest = (0.0f32, 0.0f32, 0.0f32);

    for i in -1..=1 {
        for j in -1..=1 {
            for k in -1..=1 {
                let (fx, fy, fz) = feature_point(seed, cell_x + i, cell_y + j, cell_z + k);
                let dist = if manhattan {
                    (x - fx).abs() + (y - fy).abs() + (z - fz).abs()
                } else {
                    let dx = x - fx;
                    let dy = y - fy;
                    let dz = z - fz;
                    (dx * dx + dy * dy + dz * dz).sqrt()
                };
                if dist < min_dist {
                    min_dist = dist;
                    closest = (fx, fy, fz);
                }
            }
        }
    }

    if manhattan {
        let mut point_seed = seed as i64;
        point_seed = point_seed.wrapping_mul(CELL_PRIMES[0]).wrapping_add(((closest.0 * 1000.0) as i32 as i64).wrapping_mul(CELL_PRIMES[1]));
        point_seed = point_seed.wrapping_mul(CELL_PRIMES[0]).wrapping_add(((closest.1 * 1000.0) as i32 as i64).wrapping_mul(CELL_PRIMES[1]));
        point_seed = point_seed.wrapping_mul(CELL_PRIMES[0]).wrapping_add(((closest.2 * 1000.0) as i32 as i64).wrapping_mul(CELL_PRIMES[1]));
        (point_seed.rem_euclid(2_000_000_000) as f32 / 1_000_000_000.0) - 1.0
    } else {
        min_dist * 2.0 - 1.0
    }
}

fn white_noise(seed: u32, x: f32, y: f32, z: f32) -> f32 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let iz = z.floor() as i32;

    let mut h = seed
        .wrapping_add((ix as u32).wrapping_mul(374_761_393))
        .wrapping_add((iy as u32).wrapping_mul(668_265_263))
        .wrapping_add((iz as u32).wrapping_mul(198_491_317));
    h ^= h >> 13;
    h = h.wrapping_mul(1_274_126_177);
    h ^= h >> 16;

    ((h % 2_000_000_000) as f32 / 1_000_000_000.0) - 1.0
}

/// Samples one [`NoiseType`] at `(x,y,z)`, all output in `[-1,1]`. `seed`
/// and `interp` govern the cellular/value branches; `lattice` the
/// gradient-based ones.
pub fn generate_single(lattice: &Lattice, seed: u32, interp: InterpolationType, kind: NoiseType, x: f32, y: f32, z: f32) -> f32 {
    match kind {
        NoiseType::Perlin => lattice.perlin3(x, y, z),
        NoiseType::Simplex => lattice.simplex3(x, y, z),
        NoiseType::Worley => worley_or_voronoi(seed, x, y, z, false),
        NoiseType::Value => value_or_cubic(interp, x, y, z),
        NoiseType::Cubic => {
            let x0 = x.floor() as i32;
            let y0 = y.floor() as i32;
            let z0 = z.floor() as i32;
            let sx = x - x0 as f32;
            let sy = y - y0 as f32;
            let sz = z - z0 as f32;
            let tx = sx * sx * (3.0 - 2.0 * sx);
            let ty = sy * sy * (3.0 - 2.0 * sy);
            let tz = sz * sz * (3.0 - 2.0 * sz);
            let corners = [
                value_noise(x0, y0, z0),
                value_noise(x0 + 1, y0, z0),
                value_noise(x0, y0 + 1, z0),
                value_noise(x0 + 1, y0 + 1, z0),
                value_noise(x0, y0, z0 + 1),
                value_noise(x0 + 1, y0, z0 + 1),
                value_noise(x0, y0 + 1, z0 + 1),
                value_noise(x0 + 1, y0 + 1, z0 + 1),
            ];
            trilinear(interp, corners, tx, ty, tz)
        }
        NoiseType::WhiteNoise => white_noise(seed, x, y, z),
        NoiseType::Ridged => {
            let noise = lattice.perlin3(x, y, z).abs();
            2.0 * (0.5 - noise)
        }
        NoiseType::Billow => {
            let noise = lattice.perlin3(x, y, z).abs();
            2.0 * noise - 1.0
        }
        NoiseType::Voronoi => worley_or_voronoi(seed, x, y, z, true),
        NoiseType::Domain => {
            let warp_x = lattice.perlin3(x + 123.4, y + 567.8, z + 901.2);
            let warp_y = lattice.perlin3(x + 345.6, y + 789.0, z + 123.4);
            let warp_z = lattice.perlin3(x + 678.9, y + 123.4, z + 567.8);
            lattice.perlin3(x + warp_x * 0.5, y + warp_y * 0.5, z + warp_z * 0.5)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_noise_is_deterministic() {
        assert_eq!(value_noise(1, 2, 3), value_noise(1, 2, 3));
    }

    #[test]
    fn worley_output_bounded() {
        let v = worley_or_voronoi(7, 1.3, 2.7, 0.4, false);
        assert!((-1.0..=2001.0).contains(&v));
    }

    #[test]
    fn white_noise_in_range() {
        let v = white_noise(3, 1.0, 2.0, 3.0);
        assert!((-1.0..=1.0).contains(&v));
    }

    #[test]
    fn ridged_and_billow_stay_bounded() {
        let lattice = Lattice::new(11);
        let r = generate_single(&lattice, 0, InterpolationType::Quintic, NoiseType::Ridged, 1.0, 2.0, 3.0);
        let b = generate_single(&lattice, 0, InterpolationType::Quintic, NoiseType::Billow, 1.0, 2.0, 3.0);
        assert!((-1.0..=1.0).contains(&r));
        assert!((-1.0..=1.0).contains(&b));
    }
}
