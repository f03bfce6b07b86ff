use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Rigid placement: rotation followed by translation.
///
/// The quaternion is stored as given; callers that need exact round-trips
/// (archives) rely on it not being renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl Location {
    pub const IDENTITY: Location = Location {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self::new(translation, DQuat::IDENTITY)
    }

    /// Rotation of `angle` radians about `axis` (through the origin).
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        Self::new(DVec3::ZERO, DQuat::from_axis_angle(axis.normalize(), angle))
    }

    pub fn is_identity(&self) -> bool {
        self.translation == DVec3::ZERO && self.rotation == DQuat::IDENTITY
    }

    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.rotation * p + self.translation
    }

    pub fn transform_vector(&self, v: DVec3) -> DVec3 {
        self.rotation * v
    }

    /// `self ∘ inner`: apply `inner` first, then `self`.
    pub fn compose(&self, inner: &Location) -> Location {
        Location {
            translation: self.rotation * inner.translation + self.translation,
            rotation: self.rotation * inner.rotation,
        }
    }

    pub fn inverse(&self) -> Location {
        let rotation = self.rotation.inverse();
        Location {
            translation: -(rotation * self.translation),
            rotation,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-12
    }

    #[test]
    fn test_identity_default() {
        let loc = Location::default();
        assert!(loc.is_identity());
        assert_eq!(loc.transform_point(DVec3::new(1.0, 2.0, 3.0)), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_then_translation() {
        let loc = Location::new(
            DVec3::new(10.0, 0.0, 0.0),
            DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2),
        );
        let p = loc.transform_point(DVec3::X);
        assert!(approx(p, DVec3::new(10.0, 1.0, 0.0)));
        assert!(approx(loc.transform_vector(DVec3::X), DVec3::Y));
    }

    #[test]
    fn test_compose_applies_inner_first() {
        let outer = Location::from_translation(DVec3::new(0.0, 0.0, 5.0));
        let inner = Location::from_axis_angle(DVec3::Z, FRAC_PI_2);
        let both = outer.compose(&inner);
        let p = both.transform_point(DVec3::X);
        assert!(approx(p, DVec3::new(0.0, 1.0, 5.0)));
    }

    #[test]
    fn test_inverse() {
        let loc = Location::new(
            DVec3::new(1.0, -2.0, 3.0),
            DQuat::from_axis_angle(DVec3::Y, 0.3),
        );
        let p = DVec3::new(0.5, 0.25, -4.0);
        let back = loc.inverse().transform_point(loc.transform_point(p));
        assert!(approx(back, p));
    }
}
