//! Axis-aligned bounds of shapes.
//!
//! Extremes of periodic directions are found analytically: along a circle
//! `c + r(cos t·x + sin t·y)` each coordinate is extremal at
//! `t = atan2(y_k, x_k) + nπ`, so only those parameters and the trim
//! boundaries need to be evaluated.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::DVec3;

use crate::geometry::{Curve, Surface};
use crate::topology::{Edge, Face, Shape};

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn from_point(p: DVec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn add_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn merge(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn enlarged(&self, by: f64) -> Aabb {
        Aabb {
            min: self.min - DVec3::splat(by),
            max: self.max + DVec3::splat(by),
        }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

/// Bounds of every face, edge and free vertex of `shape`, enlarged by
/// `tolerance`. `None` for shapes without geometry.
///
/// With `optimal == false` the trimming of periodic directions is ignored
/// (full circles and spheres), which is looser but never misses geometry.
pub fn compute_bounds(shape: &Shape, tolerance: f64, optimal: bool) -> Option<Aabb> {
    let mut acc: Option<Aabb> = None;
    let mut add = |p: DVec3| {
        acc = Some(match acc {
            Some(mut b) => {
                b.add_point(p);
                b
            }
            None => Aabb::from_point(p),
        });
    };

    for face in shape.faces() {
        face_extremes(face, optimal).into_iter().for_each(&mut add);
    }
    for edge in shape.edges() {
        edge_extremes(edge, optimal).into_iter().for_each(&mut add);
    }
    for vertex in shape.vertices() {
        add(vertex.point);
    }
    acc.map(|b| b.enlarged(tolerance.max(0.0)))
}

/// Parameters in `[lo, hi]` congruent to `phi` modulo π.
fn critical_angles(phi: f64, lo: f64, hi: f64, out: &mut Vec<f64>) {
    let mut t = phi + ((lo - phi) / PI).ceil() * PI;
    while t <= hi {
        out.push(t);
        t += PI;
    }
}

fn circle_candidates(x_dir: DVec3, y_dir: DVec3, lo: f64, hi: f64) -> Vec<f64> {
    let mut out = vec![lo, hi];
    for k in 0..3 {
        let (xk, yk) = (x_dir[k], y_dir[k]);
        if xk.abs() > f64::EPSILON || yk.abs() > f64::EPSILON {
            critical_angles(yk.atan2(xk), lo, hi, &mut out);
        }
    }
    out
}

fn edge_extremes(edge: &Edge, optimal: bool) -> Vec<DVec3> {
    if edge.is_degenerate() {
        return vec![edge.point_at(edge.first)];
    }
    let curve = edge.located_curve();
    match curve {
        Curve::Line { .. } => vec![curve.point(edge.first), curve.point(edge.last)],
        Curve::Circle { axis, x_dir, .. } => {
            let (lo, hi) = if optimal {
                (edge.first.min(edge.last), edge.first.max(edge.last))
            } else {
                (0.0, TAU)
            };
            circle_candidates(x_dir, axis.cross(x_dir), lo, hi)
                .into_iter()
                .map(|t| curve.point(t))
                .collect()
        }
    }
}

fn face_extremes(face: &Face, optimal: bool) -> Vec<DVec3> {
    let surface = face.located_surface();
    let [u0, u1] = face.u_range;
    let [v0, v1] = face.v_range;
    let (u_lo, u_hi) = (u0.min(u1), u0.max(u1));
    let (v_lo, v_hi) = (v0.min(v1), v0.max(v1));

    match surface {
        Surface::Plane { .. } => [(u0, v0), (u1, v0), (u1, v1), (u0, v1)]
            .iter()
            .map(|&(u, v)| surface.point(u, v))
            .collect(),
        // Linear in v for a fixed angle: trim boundaries in v suffice.
        Surface::Disk { axis, x_dir, .. } | Surface::Cylinder { axis, x_dir, .. } => {
            let (lo, hi) = if optimal { (u_lo, u_hi) } else { (0.0, TAU) };
            let us = circle_candidates(x_dir, axis.cross(x_dir), lo, hi);
            us.iter()
                .flat_map(|&u| [v_lo, v_hi].map(|v| surface.point(u, v)))
                .collect()
        }
        Surface::Sphere { axis, x_dir, .. } => {
            let (lo, hi, vlo, vhi) = if optimal {
                (u_lo, u_hi, v_lo, v_hi)
            } else {
                (0.0, TAU, -FRAC_PI_2, FRAC_PI_2)
            };
            let y_dir = axis.cross(x_dir);
            let us = circle_candidates(x_dir, y_dir, lo, hi);
            let mut out = Vec::new();
            for &u in &us {
                // Meridian at u: c + r(cos v·m + sin v·axis).
                let (s, c) = u.sin_cos();
                let meridian = x_dir * c + y_dir * s;
                for v in circle_candidates(meridian, axis, vlo, vhi) {
                    out.push(surface.point(u, v));
                }
            }
            out
        }
    }
}
