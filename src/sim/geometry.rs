//! Geometry primitives for collision tests
//!
//! Boxes are axis-aligned in world space; spheres are used for the avatar
//! and for battle balls. Vectors are `glam::Vec3`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which axes a minimum-translation search may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axes {
    /// X, Y and Z
    All,
    /// X and Z only (walls, tile sides)
    Horizontal,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box that tightly contains a sphere
    pub fn around_sphere(center: Vec3, radius: f32) -> Self {
        Self::from_center_half(center, Vec3::splat(radius))
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Strict overlap test (touching faces do not count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Whether a point lies inside the XZ footprint grown by `margin`
    pub fn contains_xz(&self, point: Vec3, margin: f32) -> bool {
        point.x > self.min.x - margin
            && point.x < self.max.x + margin
            && point.z > self.min.z - margin
            && point.z < self.max.z + margin
    }

    /// Penetration of `self` into `other` along the axis of least separation.
    ///
    /// The returned vector is the displacement that moves `self` out of
    /// `other`: its length is `sum_of_half_extents - center_distance` on the
    /// chosen axis and it points from `other`'s center toward `self`'s.
    pub fn overlap(&self, other: &Aabb, axes: Axes) -> Option<Vec3> {
        if !self.intersects(other) {
            return None;
        }

        let delta = self.center() - other.center();
        let reach = self.half_extents() + other.half_extents();
        let depth = reach - delta.abs();

        let mut best: Option<(usize, f32)> = None;
        for axis in 0..3 {
            if axes == Axes::Horizontal && axis == 1 {
                continue;
            }
            if best.is_none_or(|(_, d)| depth[axis] < d) {
                best = Some((axis, depth[axis]));
            }
        }

        let (axis, depth) = best?;
        // Centers coincide on this axis: push toward +axis for a stable choice
        let sign = if delta[axis] < 0.0 { -1.0 } else { 1.0 };
        let mut push = Vec3::ZERO;
        push[axis] = depth * sign;
        Some(push)
    }
}

/// Sphere used for the avatar and battle balls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::around_sphere(self.center, self.radius)
    }

    /// Contact normal (from `self` toward `other`) and overlap depth when
    /// the spheres interpenetrate.
    pub fn contact(&self, other: &Sphere) -> Option<(Vec3, f32)> {
        let delta = other.center - self.center;
        let dist = delta.length();
        let reach = self.radius + other.radius;
        if dist >= reach {
            return None;
        }
        // Concentric: no meaningful direction, separate along X
        let normal = if dist > f32::EPSILON {
            delta / dist
        } else {
            Vec3::X
        };
        Some((normal, reach - dist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::from_center_half(center, Vec3::splat(0.5))
    }

    #[test]
    fn test_new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 5.0));
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = unit_box_at(Vec3::ZERO);
        let b = unit_box_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
        assert!(a.overlap(&b, Axes::All).is_none());
    }

    #[test]
    fn test_overlap_picks_least_penetration_axis() {
        let a = unit_box_at(Vec3::new(0.8, 0.1, 0.0));
        let b = unit_box_at(Vec3::ZERO);
        let push = a.overlap(&b, Axes::All).unwrap();
        // X penetration 0.2 is smallest; push points toward +X
        assert!((push.x - 0.2).abs() < 1e-5);
        assert_eq!(push.y, 0.0);
        assert_eq!(push.z, 0.0);
    }

    #[test]
    fn test_horizontal_overlap_skips_y() {
        let a = unit_box_at(Vec3::new(-0.3, 0.95, 0.0));
        let b = unit_box_at(Vec3::ZERO);
        let all = a.overlap(&b, Axes::All).unwrap();
        assert!(all.y > 0.0);
        let flat = a.overlap(&b, Axes::Horizontal).unwrap();
        assert_eq!(flat.y, 0.0);
        assert!((flat.x + 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_contains_xz_with_margin() {
        let b = Aabb::from_center_half(Vec3::ZERO, Vec3::ONE);
        assert!(b.contains_xz(Vec3::new(1.4, 50.0, 0.0), 0.5));
        assert!(!b.contains_xz(Vec3::new(1.6, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_sphere_contact() {
        let a = Sphere::new(Vec3::ZERO, 1.0);
        let b = Sphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
        let (normal, depth) = a.contact(&b).unwrap();
        assert_eq!(normal, Vec3::X);
        assert!((depth - 0.5).abs() < 1e-6);

        let far = Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0);
        assert!(a.contact(&far).is_none());
    }

    #[test]
    fn test_concentric_spheres_use_fallback_normal() {
        let a = Sphere::new(Vec3::ONE, 1.0);
        let (normal, depth) = a.contact(&a).unwrap();
        assert_eq!(normal, Vec3::X);
        assert!((depth - 2.0).abs() < 1e-6);
    }
}
