//! Aggregate bounds over collections of shapes.

use glam::DVec3;
use kernel::{compute_bounds, Shape};

/// Default enlargement applied by the kernel bound computation.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Axis-aligned bounds of a shape collection.
///
/// All fields are zero for empty input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
    /// Extent per axis.
    pub len: DVec3,
    pub center: DVec3,
    pub diagonal_length: f64,
    /// Largest absolute coordinate of `min` and `max`.
    pub max_abs_extent: f64,
}

impl BoundingBox {
    /// Bounds of all shapes of all collections, taken as one compound of
    /// compounds.
    pub fn compute<C>(collections: &[C], tolerance: f64, optimal: bool) -> Self
    where
        C: AsRef<[Shape]>,
    {
        let compound = Shape::compound(
            collections
                .iter()
                .map(|c| Shape::compound(c.as_ref().to_vec()))
                .collect(),
        );
        Self::of_shape(&compound, tolerance, optimal)
    }

    pub fn of_shape(shape: &Shape, tolerance: f64, optimal: bool) -> Self {
        let Some(aabb) = compute_bounds(shape, tolerance, optimal) else {
            return Self::default();
        };
        let (min, max) = (aabb.min, aabb.max);
        let len = max - min;
        Self {
            min,
            max,
            len,
            center: (min + max) * 0.5,
            diagonal_length: len.length(),
            max_abs_extent: min.abs().max(max.abs()).max_element(),
        }
    }

    /// Recompute in place from new input.
    pub fn reset<C>(&mut self, collections: &[C], tolerance: f64, optimal: bool)
    where
        C: AsRef<[Shape]>,
    {
        *self = Self::compute(collections, tolerance, optimal);
    }

    /// The 8 corners, `min`/`max` per axis.
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }

    pub fn max_dist_from_center(&self) -> f64 {
        self.corners()
            .iter()
            .map(|c| c.distance(self.center))
            .fold(0.0, f64::max)
    }

    /// Measured from the coordinate origin, not from `center`.
    pub fn max_dist_from_origin(&self) -> f64 {
        self.corners().iter().map(|c| c.length()).fold(0.0, f64::max)
    }

    /// True when every axis extent is below `eps`.
    pub fn is_empty(&self, eps: f64) -> bool {
        self.len.x.abs() < eps && self.len.y.abs() < eps && self.len.z.abs() < eps
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[x({:.6} .. {:.6}), y({:.6} .. {:.6}), z({:.6} .. {:.6}), c({:.6}, {:.6}, {:.6})]",
            self.min.x,
            self.max.x,
            self.min.y,
            self.max.y,
            self.min.z,
            self.max.z,
            self.center.x,
            self.center.y,
            self.center.z
        )
    }
}
