//! A minimal axis-aligned bounding box. Vector/quaternion math and AABBs are
//! external collaborators per the spec (any game engine supplies its own);
//! this crate only needs the handful of operations chunk bounds and world
//! bounds actually use, so we keep a small local type rather than pull in a
//! full collision crate the way the teacher's client does.

use nalgebra::{Point3, Vector3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Aabb {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn dimensions(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        self.min + self.dimensions() / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_of_both_corners() {
        let bb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(16.0, 16.0, 16.0));
        assert!(bb.contains(Point3::new(0.0, 0.0, 0.0)));
        assert!(bb.contains(Point3::new(16.0, 16.0, 16.0)));
        assert!(!bb.contains(Point3::new(16.01, 0.0, 0.0)));
    }

    #[test]
    fn construction_order_independent() {
        let a = Aabb::new(Point3::new(16.0, 16.0, 16.0), Point3::new(0.0, 0.0, 0.0));
        let b = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(16.0, 16.0, 16.0));
        assert_eq!(a, b);
    }

    #[test]
    fn center_is_midpoint_of_corners() {
        use approx::assert_relative_eq;
        let bb = Aabb::new(Point3::new(-16.0, 0.0, 4.0), Point3::new(16.0, 32.0, 20.0));
        assert_relative_eq!(bb.center(), Point3::new(0.0, 16.0, 12.0));
    }
}
