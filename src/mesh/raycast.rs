//! The 3D DDA voxel raycast shared by ambient occlusion (§4.D) and
//! world-level raycasting ([`crate::grid::Grid::raycast`]).

use nalgebra::{Point3, Vector3};

use crate::voxel::Voxel;

const EPS: f32 = 1e-6;

/// Abstracts "what voxel lives at this integer cell", letting a single DDA
/// implementation serve both chunk-local AO marching (routing across chunk
/// boundaries via neighbor handles) and grid-level world raycasting
/// (routing through the chunk manager). Returning `None` means "no data
/// here" — the caller treats that as open space to keep marching through,
/// never as a hit.
pub trait VoxelSampler {
    fn sample(&self, x: i32, y: i32, z: i32) -> Option<Voxel>;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    pub distance: f32,
    pub position: Point3<f32>,
    /// Integer face normal of the side the ray entered through.
    pub normal: Vector3<i32>,
    pub voxel: Voxel,
}

/// Standard amanatides-and-woo DDA: marches voxel-by-voxel along `dir` from
/// `origin`, stopping at the first non-empty cell or once `max_distance` is
/// exceeded.
pub fn cast_ray(
    origin: Point3<f32>,
    dir: Vector3<f32>,
    max_distance: f32,
    sampler: &impl VoxelSampler,
) -> Option<RaycastHit> {
    let dir = if dir.norm() > EPS { dir.normalize() } else { return None };

    let mut voxel = [
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    ];

    let step = [
        signum(dir.x),
        signum(dir.y),
        signum(dir.z),
    ];

    let delta_dist = [
        1.0 / dir.x.abs().max(EPS),
        1.0 / dir.y.abs().max(EPS),
        1.0 / dir.z.abs().max(EPS),
    ];

    let mut side_dist = [
        side_dist0(origin.x, voxel[0], step[0], delta_dist[0]),
        side_dist0(origin.y, voxel[1], step[1], delta_dist[1]),
        side_dist0(origin.z, voxel[2], step[2], delta_dist[2]),
    ];

    // Entry face normal is undefined until the first step; a hit at the
    // starting cell (degenerate, but possible for a ray cast from inside
    // solid geometry) reports the zero vector.
    let mut normal = Vector3::new(0, 0, 0);
    let mut distance = 0.0f32;

    loop {
        if let Some(v) = sampler.sample(voxel[0], voxel[1], voxel[2]) {
            if !v.is_empty() {
                return Some(RaycastHit {
                    distance,
                    position: origin + dir * distance,
                    normal,
                    voxel: v,
                });
            }
        } else {
            return None;
        }

        let axis = if side_dist[0] <= side_dist[1] && side_dist[0] <= side_dist[2] {
            0
        } else if side_dist[1] <= side_dist[2] {
            1
        } else {
            2
        };

        distance = side_dist[axis];
        if distance >= max_distance {
            return None;
        }

        voxel[axis] += step[axis];
        side_dist[axis] += delta_dist[axis];

        normal = Vector3::new(0, 0, 0);
        normal[axis] = -step[axis];
    }
}

fn signum(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn side_dist0(origin: f32, voxel: i32, step: i32, delta: f32) -> f32 {
    if step > 0 {
        ((voxel + 1) as f32 - origin) * delta
    } else if step < 0 {
        (origin - voxel as f32) * delta
    } else {
        f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlaneSampler {
        solid_y: i32,
    }

    impl VoxelSampler for PlaneSampler {
        fn sample(&self, _x: i32, y: i32, _z: i32) -> Option<Voxel> {
            Some(if y == self.solid_y {
                Voxel::new(1, 0)
            } else {
                Voxel::AIR
            })
        }
    }

    #[test]
    fn dda_hits_plane_below_origin() {
        let sampler = PlaneSampler { solid_y: 0 };
        let hit = cast_ray(
            Point3::new(8.5, 10.0, 8.5),
            Vector3::new(0.0, -1.0, 0.0),
            20.0,
            &sampler,
        )
        .expect("ray should hit the plane");
        assert!((hit.distance - 9.0).abs() < 1e-3, "{}", hit.distance);
        assert_eq!(hit.normal, Vector3::new(0, 1, 0));
        assert_eq!(hit.voxel.type_id, 1);
    }

    #[test]
    fn no_data_returns_no_hit() {
        struct Empty;
        impl VoxelSampler for Empty {
            fn sample(&self, _x: i32, _y: i32, _z: i32) -> Option<Voxel> {
                None
            }
        }
        let hit = cast_ray(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(1.0, 0.0, 0.0),
            20.0,
            &Empty,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn max_distance_bounds_the_march() {
        let sampler = PlaneSampler { solid_y: -100 };
        let hit = cast_ray(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, -1.0, 0.0),
            5.0,
            &sampler,
        );
        assert!(hit.is_none());
    }
}
