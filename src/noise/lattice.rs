//! Gradient-noise lattice: permutation table plus 2D/3D gradient vectors,
//! seeded deterministically so a [`super::NoiseGenerator`]'s `seed` governs
//! every pseudo-random table it touches (see module docs for why this
//! departs from the process-global table the algorithm was ported from).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PERM_SIZE: usize = 256;

pub struct Lattice {
    permutation: [u16; PERM_SIZE * 2],
    gradients2d: [[f32; 2]; PERM_SIZE * 2],
    gradients3d: [[f32; 3]; PERM_SIZE * 2],
}

impl Lattice {
    pub fn new(seed: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed as u64);

        let mut half = [0u16; PERM_SIZE];
        for (i, slot) in half.iter_mut().enumerate() {
            *slot = i as u16;
        }
        for i in (1..PERM_SIZE).rev() {
            let j = rng.gen_range(0..=i);
            half.swap(i, j);
        }
        let mut permutation = [0u16; PERM_SIZE * 2];
        permutation[..PERM_SIZE].copy_from_slice(&half);
        permutation[PERM_SIZE..].copy_from_slice(&half);

        let mut gradients2d = [[0.0f32; 2]; PERM_SIZE * 2];
        for slot in gradients2d.iter_mut() {
            let angle = rng.gen_range(0.0f32..std::f32::consts::TAU);
            *slot = [angle.cos(), angle.sin()];
        }

        let mut gradients3d = [[0.0f32; 3]; PERM_SIZE * 2];
        for slot in gradients3d.iter_mut() {
            let u: f32 = rng.gen_range(0.0..1.0);
            let v: f32 = rng.gen_range(0.0..1.0);
            let z = 1.0 - 2.0 * u;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let theta = std::f32::consts::TAU * v;
            *slot = [r * theta.cos(), r * theta.sin(), z];
        }

        Lattice {
            permutation,
            gradients2d,
            gradients3d,
        }
    }

    #[inline]
    pub fn perm(&self, i: i32) -> i32 {
        self.permutation[(i as usize) & (PERM_SIZE - 1)] as i32
    }

    #[inline]
    fn grad1(&self, hash: i32, x: f32) -> f32 {
        let h = hash & 15;
        let mut g = 1.0 + (h & 7) as f32;
        if h & 8 != 0 {
            g = -g;
        }
        g * x
    }

    #[inline]
    fn grad2(&self, hash: i32, x: f32, y: f32) -> f32 {
        let index = (hash as usize) & (PERM_SIZE * 2 - 1);
        let g = self.gradients2d[index];
        g[0] * x + g[1] * y
    }

    #[inline]
    fn grad3(&self, hash: i32, x: f32, y: f32, z: f32) -> f32 {
        let index = (hash as usize) & (PERM_SIZE * 2 - 1);
        let g = self.gradients3d[index];
        g[0] * x + g[1] * y + g[2] * z
    }

    /// Quintic fade curve, `6t^5 - 15t^4 + 10t^3`.
    #[inline]
    fn fade(t: f32) -> f32 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    pub fn perlin1(&self, x: f32) -> f32 {
        let xi = x.floor() as i32 & 255;
        let xf = x - x.floor();
        let u = Self::fade(xf);
        crate::util::lerp(self.grad1(self.perm(xi), xf), self.grad1(self.perm(xi + 1), xf - 1.0), u) * 2.0
    }

    pub fn perlin2(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor() as i32 & 255;
        let yi = y.floor() as i32 & 255;
        let xf = x - x.floor();
        let yf = y - y.floor();
        let u = Self::fade(xf);
        let v = Self::fade(yf);

        let aa = self.perm(self.perm(xi) + yi);
        let ab = self.perm(self.perm(xi) + yi + 1);
        let ba = self.perm(self.perm(xi + 1) + yi);
        let bb = self.perm(self.perm(xi + 1) + yi + 1);

        let g1 = self.grad2(aa, xf, yf);
        let g2 = self.grad2(ba, xf - 1.0, yf);
        let g3 = self.grad2(ab, xf, yf - 1.0);
        let g4 = self.grad2(bb, xf - 1.0, yf - 1.0);

        let lerp_x1 = crate::util::lerp(g1, g2, u);
        let lerp_x2 = crate::util::lerp(g3, g4, u);
        crate::util::lerp(lerp_x1, lerp_x2, v)
    }

    pub fn perlin3(&self, x: f32, y: f32, z: f32) -> f32 {
        let xi = x.floor() as i32 & 255;
        let yi = y.floor() as i32 & 255;
        let zi = z.floor() as i32 & 255;
        let xf = x - x.floor();
        let yf = y - y.floor();
        let zf = z - z.floor();
        let u = Self::fade(xf);
        let v = Self::fade(yf);
        let w = Self::fade(zf);

        let a = self.perm(xi) + yi;
        let aa = self.perm(a) + zi;
        let ab = self.perm(a + 1) + zi;
        let b = self.perm(xi + 1) + yi;
        let ba = self.perm(b) + zi;
        let bb = self.perm(b + 1) + zi;

        let g1 = self.grad3(self.perm(aa), xf, yf, zf);
        let g2 = self.grad3(self.perm(ba), xf - 1.0, yf, zf);
        let g3 = self.grad3(self.perm(ab), xf, yf - 1.0, zf);
        let g4 = self.grad3(self.perm(bb), xf - 1.0, yf - 1.0, zf);
        let g5 = self.grad3(self.perm(aa + 1), xf, yf, zf - 1.0);
        let g6 = self.grad3(self.perm(ba + 1), xf - 1.0, yf, zf - 1.0);
        let g7 = self.grad3(self.perm(ab + 1), xf, yf - 1.0, zf - 1.0);
        let g8 = self.grad3(self.perm(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0);

        let x1 = crate::util::lerp(g1, g2, u);
        let x2 = crate::util::lerp(g3, g4, u);
        let y1 = crate::util::lerp(x1, x2, v);

        let x3 = crate::util::lerp(g5, g6, u);
        let x4 = crate::util::lerp(g7, g8, u);
        let y2 = crate::util::lerp(x3, x4, v);

        crate::util::lerp(y1, y2, w)
    }

    pub fn simplex2(&self, x: f32, y: f32) -> f32 {
        const F2: f32 = 0.366_025_4;
        const G2: f32 = 0.211_324_87;

        let s = (x + y) * F2;
        let xs = x + s;
        let ys = y + s;
        let i = xs.floor() as i32;
        let j = ys.floor() as i32;

        let t = (i + j) as f32 * G2;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = i & 255;
        let jj = j & 255;
        let gi0 = self.perm(ii + self.perm(jj)) % 12;
        let gi1 = self.perm(ii + i1 + self.perm(jj + j1)) % 12;
        let gi2 = self.perm(ii + 1 + self.perm(jj + 1)) % 12;

        let mut n0 = 0.0;
        let t0 = 0.5 - x0 * x0 - y0 * y0;
        if t0 >= 0.0 {
            n0 = t0 * t0 * t0 * t0 * self.grad2(gi0, x0, y0);
        }

        let mut n1 = 0.0;
        let t1 = 0.5 - x1 * x1 - y1 * y1;
        if t1 >= 0.0 {
            n1 = t1 * t1 * t1 * t1 * self.grad2(gi1, x1, y1);
        }

        let mut n2 = 0.0;
        let t2 = 0.5 - x2 * x2 - y2 * y2;
        if t2 >= 0.0 {
            n2 = t2 * t2 * t2 * t2 * self.grad2(gi2, x2, y2);
        }

        70.0 * (n0 + n1 + n2)
    }

    pub fn simplex3(&self, x: f32, y: f32, z: f32) -> f32 {
        const F3: f32 = 1.0 / 3.0;
        const G3: f32 = 1.0 / 6.0;

        let s = (x + y + z) * F3;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;
        let k = (z + s).floor() as i32;

        let t = (i + j + k) as f32 * G3;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);
        let z0 = z - (k as f32 - t);

        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f32 + G3;
        let y1 = y0 - j1 as f32 + G3;
        let z1 = z0 - k1 as f32 + G3;
        let x2 = x0 - i2 as f32 + 2.0 * G3;
        let y2 = y0 - j2 as f32 + 2.0 * G3;
        let z2 = z0 - k2 as f32 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = i & 255;
        let jj = j & 255;
        let kk = k & 255;
        let gi0 = self.perm(ii + self.perm(jj + self.perm(kk))) % 12;
        let gi1 = self.perm(ii + i1 + self.perm(jj + j1 + self.perm(kk + k1))) % 12;
        let gi2 = self.perm(ii + i2 + self.perm(jj + j2 + self.perm(kk + k2))) % 12;
        let gi3 = self.perm(ii + 1 + self.perm(jj + 1 + self.perm(kk + 1))) % 12;

        let mut n0 = 0.0;
        let t0 = 0.6 - x0 * x0 - y0 * y0 - z0 * z0;
        if t0 >= 0.0 {
            n0 = t0 * t0 * t0 * t0 * self.grad3(gi0, x0, y0, z0);
        }

        let mut n1 = 0.0;
        let t1 = 0.6 - x1 * x1 - y1 * y1 - z1 * z1;
        if t1 >= 0.0 {
            n1 = t1 * t1 * t1 * t1 * self.grad3(gi1, x1, y1, z1);
        }

        let mut n2 = 0.0;
        let t2 = 0.6 - x2 * x2 - y2 * y2 - z2 * z2;
        if t2 >= 0.0 {
            n2 = t2 * t2 * t2 * t2 * self.grad3(gi2, x2, y2, z2);
        }

        let mut n3 = 0.0;
        let t3 = 0.6 - x3 * x3 - y3 * y3 - z3 * z3;
        if t3 >= 0.0 {
            n3 = t3 * t3 * t3 * t3 * self.grad3(gi3, x3, y3, z3);
        }

        32.0 * (n0 + n1 + n2 + n3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perlin_is_deterministic_per_seed() {
        let a = Lattice::new(7);
        let b = Lattice::new(7);
        assert_eq!(a.perlin3(1.5, 2.5, 3.5), b.perlin3(1.5, 2.5, 3.5));
    }

    #[test]
    fn different_seeds_usually_diverge() {
        let a = Lattice::new(1);
        let b = Lattice::new(2);
        assert_ne!(a.perlin2(0.3, 0.7), b.perlin2(0.3, 0.7));
    }

    #[test]
    fn simplex_stays_roughly_bounded() {
        let lattice = Lattice::new(99);
        for i in 0..200 {
            let x = i as f32 * 0.37;
            let y = i as f32 * 0.19;
            assert!(lattice.simplex2(x, y).abs() <= 1.2);
            assert!(lattice.simplex3(x, y, x - y).abs() <= 1.2);
        }
    }
}
