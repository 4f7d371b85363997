//! Point-pattern sampling and density shaping for procedural feature
//! placement. See [`crate::feature::FeaturePlacement::find_placements_in_chunk`]
//! for the consumer of [`DistributionControl::generate_distribution_points`].

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::coord::ChunkCoord;
use crate::util::{hash_chunk_seed, lerp};

/// Point-sampling arithmetic throughout this module assumes a 16-voxel
/// chunk edge regardless of the real chunk size in use, per the original's
/// fixed sampling constants.
const ASSUMED_CHUNK_EDGE: f32 = 16.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistributionPattern {
    Uniform,
    Clustered,
    Gradient,
    Stratified,
    /// Currently aliased to [`DistributionPattern::Uniform`]; see
    /// `DESIGN.md` for why this crate keeps rather than resolves the
    /// upstream TODO.
    Voronoi,
    BlueNoise,
    Fibonacci,
    Custom,
}

#[derive(Copy, Clone, Debug)]
pub struct SphericalRegion {
    pub id: u32,
    pub center: Point3<f32>,
    pub radius: f32,
    pub multiplier: f32,
    pub feature_filter: Option<u32>,
}

#[derive(Copy, Clone, Debug)]
pub struct AttractorCluster {
    pub id: u32,
    pub center: Point3<f32>,
    pub strength: f32,
    pub radius: f32,
    pub falloff: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct LinearGradient {
    pub id: u32,
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub start_density: f32,
    pub end_density: f32,
}

type CustomDistributionFn = Box<dyn Fn(Point3<f32>) -> f32 + Send + Sync>;

/// Owns the density-shaping modifiers (regions/clusters/gradients) and the
/// per-feature-type point pattern used to seed candidate placements.
pub struct DistributionControl {
    pattern: DistributionPattern,
    type_patterns: HashMap<u32, DistributionPattern>,
    base_density: f32,
    type_densities: HashMap<u32, f32>,
    density_thresholds: HashMap<u32, f32>,
    spherical_regions: Vec<SphericalRegion>,
    clusters: Vec<AttractorCluster>,
    gradients: Vec<LinearGradient>,
    custom_distribution: Option<CustomDistributionFn>,
    next_modifier_id: u32,
}

impl Default for DistributionControl {
    fn default() -> Self {
        DistributionControl {
            pattern: DistributionPattern::Uniform,
            type_patterns: HashMap::new(),
            base_density: 0.05,
            type_densities: HashMap::new(),
            density_thresholds: HashMap::new(),
            spherical_regions: Vec::new(),
            clusters: Vec::new(),
            gradients: Vec::new(),
            custom_distribution: None,
            next_modifier_id: 0,
        }
    }
}

impl DistributionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pattern(&mut self, pattern: DistributionPattern) {
        self.pattern = pattern;
    }

    pub fn set_pattern_for_type(&mut self, type_id: u32, pattern: DistributionPattern) {
        self.type_patterns.insert(type_id, pattern);
    }

    pub fn pattern_for(&self, type_id: u32) -> DistributionPattern {
        self.type_patterns.get(&type_id).copied().unwrap_or(self.pattern)
    }

    pub fn set_base_density(&mut self, density: f32) {
        self.base_density = density.clamp(0.0, 1.0);
    }

    pub fn set_type_density(&mut self, type_id: u32, density: f32) {
        self.type_densities.insert(type_id, density.clamp(0.0, 1.0));
    }

    pub fn set_density_threshold(&mut self, type_id: u32, threshold: f32) {
        self.density_thresholds.insert(type_id, threshold);
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_modifier_id;
        self.next_modifier_id += 1;
        id
    }

    pub fn add_spherical_region(&mut self, center: Point3<f32>, radius: f32, multiplier: f32, feature_filter: Option<u32>) -> u32 {
        let id = self.next_id();
        self.spherical_regions.push(SphericalRegion { id, center, radius, multiplier, feature_filter });
        id
    }

    pub fn remove_spherical_region(&mut self, id: u32) -> bool {
        let before = self.spherical_regions.len();
        self.spherical_regions.retain(|r| r.id != id);
        self.spherical_regions.len() != before
    }

    pub fn add_cluster(&mut self, center: Point3<f32>, strength: f32, radius: f32, falloff: f32) -> u32 {
        let id = self.next_id();
        self.clusters.push(AttractorCluster { id, center, strength, radius, falloff });
        id
    }

    pub fn remove_cluster(&mut self, id: u32) -> bool {
        let before = self.clusters.len();
        self.clusters.retain(|c| c.id != id);
        self.clusters.len() != before
    }

    pub fn add_gradient(&mut self, start: Point3<f32>, end: Point3<f32>, start_density: f32, end_density: f32) -> u32 {
        let id = self.next_id();
        self.gradients.push(LinearGradient { id, start, end, start_density, end_density });
        id
    }

    pub fn remove_gradient(&mut self, id: u32) -> bool {
        let before = self.gradients.len();
        self.gradients.retain(|g| g.id != id);
        self.gradients.len() != before
    }

    pub fn set_custom_distribution(&mut self, f: Option<CustomDistributionFn>) {
        self.custom_distribution = f;
    }

    /// Density in `[0,1]` at `pos` for `type_id` (or the global base density
    /// if that type has none set).
    pub fn get_density_at(&self, pos: Point3<f32>, type_id: Option<u32>) -> f32 {
        if let Some(custom) = &self.custom_distribution {
            return custom(pos).clamp(0.0, 1.0);
        }

        let mut result = type_id
            .and_then(|id| self.type_densities.get(&id).copied())
            .unwrap_or(self.base_density);

        for region in &self.spherical_regions {
            if let Some(filter) = region.feature_filter {
                if Some(filter) != type_id {
                    continue;
                }
            }
            let d = (pos - region.center).norm();
            if d <= region.radius {
                result *= 1.0 + (region.multiplier - 1.0) * (1.0 - d / region.radius);
            }
        }

        for cluster in &self.clusters {
            let d = (pos - cluster.center).norm();
            if d <= cluster.radius && cluster.radius > 0.0 {
                let raised = cluster.strength * (1.0 - (d / cluster.radius).powf(cluster.falloff));
                result = result.max(raised);
            }
        }

        for gradient in &self.gradients {
            let axis = gradient.end - gradient.start;
            let len2 = axis.norm_squared();
            if len2 > 0.0 {
                let t = ((pos - gradient.start).dot(&axis) / len2).clamp(0.0, 1.0);
                let raised = lerp(gradient.start_density, gradient.end_density, t);
                result = result.max(raised);
            }
        }

        result.clamp(0.0, 1.0)
    }

    /// Candidate world-space points for `type_id` in chunk `coord`, seeded
    /// deterministically from `global_seed` and the coordinate, filtered by
    /// that type's density threshold (if any).
    pub fn generate_distribution_points(&self, coord: ChunkCoord, count: usize, type_id: u32, global_seed: u32) -> Vec<Point3<f32>> {
        let seed = hash_chunk_seed(global_seed, coord.x, coord.y, coord.z);
        let mut rng = StdRng::seed_from_u64(seed as u64);
        let origin = coord.to_world_position(ASSUMED_CHUNK_EDGE as i32);

        let locals = match self.pattern_for(type_id) {
            DistributionPattern::Uniform | DistributionPattern::Voronoi | DistributionPattern::Gradient | DistributionPattern::Custom => {
                uniform_points(&mut rng, count)
            }
            DistributionPattern::Stratified => stratified_points(&mut rng, count),
            DistributionPattern::Clustered => clustered_points(&mut rng, count),
            DistributionPattern::BlueNoise => blue_noise_points(&mut rng, count),
            DistributionPattern::Fibonacci => fibonacci_points(&mut rng, count),
        };

        let threshold = self.density_thresholds.get(&type_id).copied();
        locals
            .into_iter()
            .map(|local| origin + local.coords)
            .filter(|world| threshold.map_or(true, |t| self.get_density_at(*world, Some(type_id)) >= t))
            .collect()
    }
}

fn uniform_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f32>> {
    (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
                rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
                rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
            )
        })
        .collect()
}

fn stratified_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f32>> {
    let grid = (n as f32).cbrt().ceil().max(1.0) as usize;
    let cell = ASSUMED_CHUNK_EDGE / grid as f32;
    let mut points = Vec::with_capacity(n);
    'outer: for gx in 0..grid {
        for gy in 0..grid {
            for gz in 0..grid {
                if points.len() >= n {
                    break 'outer;
                }
                points.push(Point3::new(
                    gx as f32 * cell + rng.gen_range(0.0..cell),
                    gy as f32 * cell + rng.gen_range(0.0..cell),
                    gz as f32 * cell + rng.gen_range(0.0..cell),
                ));
            }
        }
    }
    points
}

fn clustered_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f32>> {
    if n == 0 {
        return Vec::new();
    }
    let k = rng.gen_range(1..=3usize);
    let centers: Vec<Point3<f32>> = (0..k)
        .map(|_| {
            Point3::new(
                rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
                rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
                rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
            )
        })
        .collect();
    let per_cluster = (n / k).max(1);
    let cluster_radius = ASSUMED_CHUNK_EDGE / 4.0;
    let mut points = Vec::with_capacity(n);
    'outer: for center in &centers {
        for _ in 0..per_cluster {
            if points.len() >= n {
                break 'outer;
            }
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let r = rng.gen_range(0.0..cluster_radius);
            let dy = rng.gen_range(-cluster_radius..cluster_radius);
            points.push(Point3::new(center.x + angle.cos() * r, center.y + dy, center.z + angle.sin() * r));
        }
    }
    points
}

fn blue_noise_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f32>> {
    if n == 0 {
        return Vec::new();
    }
    let min_dist = ASSUMED_CHUNK_EDGE * (1.0 / n as f32).cbrt() * 0.9;
    let mut points: Vec<Point3<f32>> = Vec::with_capacity(n);
    for _ in 0..(30 * n) {
        if points.len() >= n {
            break;
        }
        let candidate = Point3::new(
            rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
            rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
            rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
        );
        if points.iter().all(|p| (p - candidate).norm() >= min_dist) {
            points.push(candidate);
        }
    }
    // Backfill anything rejection sampling couldn't place with plain uniform
    // points so callers always get `n` candidates.
    while points.len() < n {
        points.push(Point3::new(
            rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
            rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
            rng.gen_range(0.0..ASSUMED_CHUNK_EDGE),
        ));
    }
    points
}

fn fibonacci_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f32>> {
    if n == 0 {
        return Vec::new();
    }
    let center = ASSUMED_CHUNK_EDGE / 2.0;
    let max_radius = center;
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
            let inclination = (1.0 - 2.0 * t).clamp(-1.0, 1.0).acos();
            let azimuth = golden_angle * i as f32;
            let radius = rng.gen_range(0.0..max_radius);
            Point3::new(
                (center + radius * inclination.sin() * azimuth.cos()).clamp(0.0, ASSUMED_CHUNK_EDGE),
                (center + radius * inclination.cos()).clamp(0.0, ASSUMED_CHUNK_EDGE),
                (center + radius * inclination.sin() * azimuth.sin()).clamp(0.0, ASSUMED_CHUNK_EDGE),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_is_always_clamped() {
        let mut ctl = DistributionControl::new();
        ctl.set_base_density(0.5);
        ctl.add_spherical_region(Point3::new(0.0, 0.0, 0.0), 10.0, 5.0, None);
        let d = ctl.get_density_at(Point3::new(1.0, 0.0, 0.0), None);
        assert!((0.0..=1.0).contains(&d));
    }

    #[test]
    fn generate_distribution_points_is_deterministic() {
        let ctl = DistributionControl::new();
        let coord = ChunkCoord::new(1, 2, 3);
        let a = ctl.generate_distribution_points(coord, 8, 1, 42);
        let b = ctl.generate_distribution_points(coord, 8, 1, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn stratified_honors_requested_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = stratified_points(&mut rng, 10);
        assert_eq!(points.len(), 10);
    }

    #[test]
    fn cluster_raises_density_up_to_strength() {
        let mut ctl = DistributionControl::new();
        ctl.set_base_density(0.0);
        ctl.add_cluster(Point3::new(0.0, 0.0, 0.0), 0.9, 5.0, 1.0);
        let d = ctl.get_density_at(Point3::new(0.0, 0.0, 0.0), None);
        assert!((d - 0.9).abs() < 1e-5);
    }
}
