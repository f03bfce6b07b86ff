//! Edge → ordered point sample.

use glam::DVec3;
use kernel::{Discretizer, Edge, Shape};
use shared::Diagnosed;

use crate::error::GeometryError;

/// Sample an edge shape.
///
/// A null shape is treated as a null edge: the result is empty and carries
/// a warning. Any other non-edge shape is rejected.
pub fn discretize_edge(
    shape: &Shape,
    deflection: f64,
    algorithm: Discretizer,
) -> Result<Diagnosed<Vec<DVec3>>, GeometryError> {
    match shape {
        Shape::Null => {
            tracing::warn!("discretize_edge: edge is null, returning no points");
            Ok(Diagnosed::degraded(
                Vec::new(),
                "edge is null; no points returned",
            ))
        }
        Shape::Edge(edge) => sample_edge(edge, deflection, algorithm).map(Diagnosed::clean),
        other => Err(GeometryError::InvalidInput(format!(
            "expected an edge, got a {}",
            other.shape_type()
        ))),
    }
}

/// Sample an edge known to be non-null.
pub fn sample_edge(
    edge: &Edge,
    deflection: f64,
    algorithm: Discretizer,
) -> Result<Vec<DVec3>, GeometryError> {
    let points = kernel::discretize(edge, deflection, algorithm)?;
    if points.is_empty() {
        return Err(GeometryError::Discretization("no points".into()));
    }
    Ok(points)
}
