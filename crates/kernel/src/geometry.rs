//! Analytic surfaces and curves.
//!
//! All frames are right-handed: for surfaces `du × dv` points to the
//! natural (forward) side, so a forward face's outward normal is the
//! parametric normal.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Parametric surfaces supported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Surface {
    /// `p(u, v) = origin + u·x + v·y`
    Plane {
        origin: DVec3,
        x_dir: DVec3,
        y_dir: DVec3,
    },
    /// Planar surface in polar parameters: `u` angle, `v` radius.
    /// Parametric normal is `-axis`.
    Disk {
        center: DVec3,
        axis: DVec3,
        x_dir: DVec3,
    },
    /// `u` angle around `axis`, `v` height along it.
    Cylinder {
        origin: DVec3,
        axis: DVec3,
        x_dir: DVec3,
        radius: f64,
    },
    /// `u` longitude, `v` latitude in `[-π/2, π/2]`.
    Sphere {
        center: DVec3,
        axis: DVec3,
        x_dir: DVec3,
        radius: f64,
    },
}

impl Surface {
    pub fn plane(origin: DVec3, x_dir: DVec3, y_dir: DVec3) -> Self {
        Surface::Plane {
            origin,
            x_dir: x_dir.normalize(),
            y_dir: y_dir.normalize(),
        }
    }

    /// Point and first derivatives at `(u, v)`.
    pub fn d1(&self, u: f64, v: f64) -> (DVec3, DVec3, DVec3) {
        match *self {
            Surface::Plane {
                origin,
                x_dir,
                y_dir,
            } => (origin + x_dir * u + y_dir * v, x_dir, y_dir),
            Surface::Disk {
                center,
                axis,
                x_dir,
            } => {
                let y_dir = axis.cross(x_dir);
                let (s, c) = u.sin_cos();
                let radial = x_dir * c + y_dir * s;
                let tangent = -x_dir * s + y_dir * c;
                (center + radial * v, tangent * v, radial)
            }
            Surface::Cylinder {
                origin,
                axis,
                x_dir,
                radius,
            } => {
                let y_dir = axis.cross(x_dir);
                let (s, c) = u.sin_cos();
                let radial = x_dir * c + y_dir * s;
                let tangent = -x_dir * s + y_dir * c;
                (origin + radial * radius + axis * v, tangent * radius, axis)
            }
            Surface::Sphere {
                center,
                axis,
                x_dir,
                radius,
            } => {
                let y_dir = axis.cross(x_dir);
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                let radial = x_dir * cu + y_dir * su;
                let tangent = -x_dir * su + y_dir * cu;
                let p = center + (radial * cv + axis * sv) * radius;
                let du = tangent * (radius * cv);
                let dv = (-radial * sv + axis * cv) * radius;
                (p, du, dv)
            }
        }
    }

    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        self.d1(u, v).0
    }

    /// Parametric normal `du × dv`, not normalized. Zero at singular points
    /// (sphere poles, disk center).
    pub fn normal(&self, u: f64, v: f64) -> DVec3 {
        let (_, du, dv) = self.d1(u, v);
        du.cross(dv)
    }

    /// Curvature radius along each parametric direction over the given
    /// patch; `None` means the iso-lines are straight.
    pub fn iso_radii(&self, v_range: [f64; 2]) -> (Option<f64>, Option<f64>) {
        match *self {
            Surface::Plane { .. } => (None, None),
            Surface::Disk { .. } => {
                let r = v_range[0].abs().max(v_range[1].abs());
                (Some(r), None)
            }
            Surface::Cylinder { radius, .. } => (Some(radius), None),
            Surface::Sphere { radius, .. } => (Some(radius), Some(radius)),
        }
    }

    /// The same surface placed by `loc`.
    pub fn transformed(&self, loc: &Location) -> Surface {
        match *self {
            Surface::Plane {
                origin,
                x_dir,
                y_dir,
            } => Surface::Plane {
                origin: loc.transform_point(origin),
                x_dir: loc.transform_vector(x_dir),
                y_dir: loc.transform_vector(y_dir),
            },
            Surface::Disk {
                center,
                axis,
                x_dir,
            } => Surface::Disk {
                center: loc.transform_point(center),
                axis: loc.transform_vector(axis),
                x_dir: loc.transform_vector(x_dir),
            },
            Surface::Cylinder {
                origin,
                axis,
                x_dir,
                radius,
            } => Surface::Cylinder {
                origin: loc.transform_point(origin),
                axis: loc.transform_vector(axis),
                x_dir: loc.transform_vector(x_dir),
                radius,
            },
            Surface::Sphere {
                center,
                axis,
                x_dir,
                radius,
            } => Surface::Sphere {
                center: loc.transform_point(center),
                axis: loc.transform_vector(axis),
                x_dir: loc.transform_vector(x_dir),
                radius,
            },
        }
    }
}

/// Parametric curves supported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    /// `p(t) = origin + t·direction`, `direction` is unit length.
    Line { origin: DVec3, direction: DVec3 },
    /// `p(t) = center + r·(cos t·x + sin t·y)` with `y = axis × x`.
    Circle {
        center: DVec3,
        axis: DVec3,
        x_dir: DVec3,
        radius: f64,
    },
}

impl Curve {
    pub fn line(origin: DVec3, direction: DVec3) -> Self {
        Curve::Line {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn circle(center: DVec3, axis: DVec3, x_dir: DVec3, radius: f64) -> Self {
        Curve::Circle {
            center,
            axis: axis.normalize(),
            x_dir: x_dir.normalize(),
            radius,
        }
    }

    pub fn point(&self, t: f64) -> DVec3 {
        match *self {
            Curve::Line { origin, direction } => origin + direction * t,
            Curve::Circle {
                center,
                axis,
                x_dir,
                radius,
            } => {
                let y_dir = axis.cross(x_dir);
                let (s, c) = t.sin_cos();
                center + (x_dir * c + y_dir * s) * radius
            }
        }
    }

    /// Arc length between parameters `a` and `b` (`a <= b`).
    pub fn length(&self, a: f64, b: f64) -> f64 {
        match *self {
            Curve::Line { direction, .. } => direction.length() * (b - a),
            Curve::Circle { radius, .. } => radius * (b - a),
        }
    }

    /// Parameter reached after walking `s` along the curve from `a`.
    pub fn parameter_at_length(&self, a: f64, s: f64) -> f64 {
        match *self {
            Curve::Line { direction, .. } => a + s / direction.length(),
            Curve::Circle { radius, .. } => a + s / radius,
        }
    }

    pub fn transformed(&self, loc: &Location) -> Curve {
        match *self {
            Curve::Line { origin, direction } => Curve::Line {
                origin: loc.transform_point(origin),
                direction: loc.transform_vector(direction),
            },
            Curve::Circle {
                center,
                axis,
                x_dir,
                radius,
            } => Curve::Circle {
                center: loc.transform_point(center),
                axis: loc.transform_vector(axis),
                x_dir: loc.transform_vector(x_dir),
                radius,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-12
    }

    #[test]
    fn test_plane_normal() {
        let s = Surface::plane(DVec3::ZERO, DVec3::X, DVec3::Y);
        assert!(approx(s.normal(0.3, 0.7), DVec3::Z));
        assert!(approx(s.point(2.0, 3.0), DVec3::new(2.0, 3.0, 0.0)));
    }

    #[test]
    fn test_cylinder_normal_points_outward() {
        let s = Surface::Cylinder {
            origin: DVec3::ZERO,
            axis: DVec3::Z,
            x_dir: DVec3::X,
            radius: 2.0,
        };
        let n = s.normal(0.0, 1.0).normalize();
        assert!(approx(n, DVec3::X));
        assert!(approx(s.point(FRAC_PI_2, 1.0), DVec3::new(0.0, 2.0, 1.0)));
    }

    #[test]
    fn test_sphere_normal_outward_and_zero_at_pole() {
        let s = Surface::Sphere {
            center: DVec3::ZERO,
            axis: DVec3::Z,
            x_dir: DVec3::X,
            radius: 1.0,
        };
        assert!(approx(s.normal(0.0, 0.0).normalize(), DVec3::X));
        assert!(s.normal(0.0, FRAC_PI_2).length() < 1e-12);
    }

    #[test]
    fn test_disk_normal_is_minus_axis() {
        let s = Surface::Disk {
            center: DVec3::ZERO,
            axis: DVec3::Z,
            x_dir: DVec3::X,
        };
        assert!(approx(s.normal(0.4, 1.0).normalize(), DVec3::NEG_Z));
        assert_eq!(s.normal(0.4, 0.0), DVec3::ZERO);
    }

    #[test]
    fn test_circle_length_and_points() {
        let c = Curve::circle(DVec3::ZERO, DVec3::Z, DVec3::X, 2.0);
        assert!((c.length(0.0, PI) - 2.0 * PI).abs() < 1e-12);
        assert!(approx(c.point(PI), DVec3::new(-2.0, 0.0, 0.0)));
        assert!((c.parameter_at_length(0.0, PI) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_transformed_surface_matches_transformed_point() {
        let loc = Location::new(
            DVec3::new(1.0, 2.0, 3.0),
            glam::DQuat::from_axis_angle(DVec3::X, 0.7),
        );
        let s = Surface::Cylinder {
            origin: DVec3::ZERO,
            axis: DVec3::Z,
            x_dir: DVec3::X,
            radius: 1.5,
        };
        let moved = s.transformed(&loc);
        assert!(approx(moved.point(0.3, 0.9), loc.transform_point(s.point(0.3, 0.9))));
    }
}
