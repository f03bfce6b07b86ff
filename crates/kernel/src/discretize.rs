//! Curve sampling.

use std::fmt;
use std::str::FromStr;

use glam::DVec3;

use crate::error::KernelError;
use crate::geometry::Curve;
use crate::topology::Edge;
use crate::{MAX_SEGMENTS, PARAM_CONFUSION};

/// Sampling strategy for [`discretize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discretizer {
    /// Recursive bisection until every chord is within the deflection.
    #[default]
    QuasiUniformDeflection,
    /// Points at a constant arc-length step equal to the given value.
    UniformAbscissa,
    /// Constant parameter step, refined globally until within deflection.
    UniformDeflection,
}

impl Discretizer {
    pub fn name(self) -> &'static str {
        match self {
            Discretizer::QuasiUniformDeflection => "QuasiUniformDeflection",
            Discretizer::UniformAbscissa => "UniformAbscissa",
            Discretizer::UniformDeflection => "UniformDeflection",
        }
    }
}

impl fmt::Display for Discretizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `QuasiUniformDeflection`, `quasi-uniform-deflection`,
/// `quasi_uniform_deflection` and the like, case-insensitively.
impl FromStr for Discretizer {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "quasiuniformdeflection" => Ok(Discretizer::QuasiUniformDeflection),
            "uniformabscissa" => Ok(Discretizer::UniformAbscissa),
            "uniformdeflection" => Ok(Discretizer::UniformDeflection),
            _ => Err(KernelError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Sample `edge` in the global frame, first point to last point.
pub fn discretize(
    edge: &Edge,
    deflection: f64,
    algorithm: Discretizer,
) -> Result<Vec<DVec3>, KernelError> {
    KernelError::check_positive("deflection", deflection)?;
    if edge.is_degenerate() {
        return Err(KernelError::NotDone("empty parameter range".into()));
    }
    let curve = edge.located_curve();
    let (a, b) = (edge.first, edge.last);

    let points = match algorithm {
        Discretizer::QuasiUniformDeflection => quasi_uniform(&curve, a, b, deflection)?,
        Discretizer::UniformAbscissa => uniform_abscissa(&curve, a, b, deflection)?,
        Discretizer::UniformDeflection => uniform_deflection(&curve, a, b, deflection)?,
    };
    if points.is_empty() {
        return Err(KernelError::NotDone("no points".into()));
    }
    Ok(points)
}

fn chord_error(curve: &Curve, t0: f64, t1: f64) -> f64 {
    let (p0, p1) = (curve.point(t0), curve.point(t1));
    let mid = curve.point(0.5 * (t0 + t1));
    distance_to_segment(mid, p0, p1)
}

fn distance_to_segment(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn quasi_uniform(curve: &Curve, a: f64, b: f64, deflection: f64) -> Result<Vec<DVec3>, KernelError> {
    let mut params = vec![a];
    // Stack of pending intervals, processed left to right.
    let mut stack = vec![(a, b)];
    while let Some((t0, t1)) = stack.pop() {
        // A straight chord can hide a full turn; always split wide arcs.
        let wide = matches!(curve, Curve::Circle { .. }) && t1 - t0 > std::f64::consts::FRAC_PI_2;
        if (wide || chord_error(curve, t0, t1) > deflection) && t1 - t0 > PARAM_CONFUSION {
            let tm = 0.5 * (t0 + t1);
            stack.push((tm, t1));
            stack.push((t0, tm));
        } else {
            params.push(t1);
        }
        if params.len() > MAX_SEGMENTS + 1 {
            return Err(KernelError::NotDone(format!(
                "more than {MAX_SEGMENTS} segments for deflection {deflection}"
            )));
        }
    }
    Ok(params.into_iter().map(|t| curve.point(t)).collect())
}

fn uniform_abscissa(curve: &Curve, a: f64, b: f64, abscissa: f64) -> Result<Vec<DVec3>, KernelError> {
    let length = curve.length(a, b);
    let n = (length / abscissa).round().max(1.0);
    if n > MAX_SEGMENTS as f64 {
        return Err(KernelError::NotDone(format!(
            "abscissa {abscissa} too small for length {length}"
        )));
    }
    let n = n as usize;
    let step = length / n as f64;
    Ok((0..=n)
        .map(|i| {
            let t = if i == n {
                b
            } else {
                curve.parameter_at_length(a, step * i as f64)
            };
            curve.point(t)
        })
        .collect())
}

fn uniform_deflection(curve: &Curve, a: f64, b: f64, deflection: f64) -> Result<Vec<DVec3>, KernelError> {
    let mut n = 1usize;
    loop {
        let dt = (b - a) / n as f64;
        let within = (0..n).all(|i| {
            let t0 = a + dt * i as f64;
            chord_error(curve, t0, t0 + dt) <= deflection
        });
        if within && (n > 1 || matches!(curve, Curve::Line { .. })) {
            return Ok((0..=n)
                .map(|i| curve.point(if i == n { b } else { a + dt * i as f64 }))
                .collect());
        }
        n *= 2;
        if n > MAX_SEGMENTS {
            return Err(KernelError::NotDone(format!(
                "no convergence for deflection {deflection}"
            )));
        }
    }
}
