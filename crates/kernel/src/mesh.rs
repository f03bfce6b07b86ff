//! Face meshing.
//!
//! Each face is sampled on a regular UV grid whose density follows the
//! linear (sagitta) and angular deflection bounds. The result is stored on
//! the face in its local frame; callers place it with the face location.

use std::f64::consts::FRAC_PI_2;
use std::time::Instant;

use glam::{DVec2, DVec3};

use crate::error::KernelError;
use crate::topology::{Face, Shape};
use crate::MAX_SEGMENTS;

/// Triangle mesh of one face in the face's local frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Triangulation {
    pub nodes: Vec<DVec3>,
    /// Counter-clockwise around the surface's parametric normal.
    pub triangles: Vec<[u32; 3]>,
    /// Parameter of each node; same length as `nodes`.
    pub uv_nodes: Vec<DVec2>,
}

impl Triangulation {
    pub fn has_uv_nodes(&self) -> bool {
        !self.uv_nodes.is_empty()
    }
}

/// Drop every cached triangulation on the shape.
pub fn clean(shape: &Shape) {
    for face in shape.faces() {
        face.clear_triangulation();
    }
}

/// Mesh every face that has no cached triangulation yet.
///
/// Returns the number of faces that were meshed by this call. Degenerate
/// faces are skipped and stay without triangulation.
pub fn incremental_mesh(
    shape: &Shape,
    linear_deflection: f64,
    angular_deflection: f64,
) -> Result<usize, KernelError> {
    KernelError::check_positive("linear_deflection", linear_deflection)?;
    KernelError::check_positive("angular_deflection", angular_deflection)?;

    let start = Instant::now();
    let mut meshed = 0;
    for face in shape.faces() {
        if face.triangulation().is_some() || face.is_degenerate() {
            continue;
        }
        face.set_triangulation(mesh_face(face, linear_deflection, angular_deflection));
        meshed += 1;
    }
    tracing::debug!(
        "incremental_mesh: {} faces in {:.2}ms",
        meshed,
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(meshed)
}

/// Number of segments needed to cover `span` of a direction whose iso-lines
/// have curvature radius `radius` (`None` = straight).
pub fn segment_count(radius: Option<f64>, span: f64, linear: f64, angular: f64) -> usize {
    let Some(r) = radius.filter(|r| *r > 0.0) else {
        return 1;
    };
    let sagitta = 2.0 * (1.0 - linear / r).clamp(-1.0, 1.0).acos();
    let step = sagitta.min(angular).min(FRAC_PI_2);
    ((span.abs() / step).ceil() as usize).clamp(1, MAX_SEGMENTS)
}

fn mesh_face(face: &Face, linear: f64, angular: f64) -> Triangulation {
    let [u0, u1] = face.u_range;
    let [v0, v1] = face.v_range;
    let (ru, rv) = face.surface.iso_radii(face.v_range);
    let nu = segment_count(ru, u1 - u0, linear, angular);
    let nv = segment_count(rv, v1 - v0, linear, angular);

    let mut tri = Triangulation {
        nodes: Vec::with_capacity((nu + 1) * (nv + 1)),
        triangles: Vec::with_capacity(2 * nu * nv),
        uv_nodes: Vec::with_capacity((nu + 1) * (nv + 1)),
    };

    for j in 0..=nv {
        let v = v0 + (v1 - v0) * j as f64 / nv as f64;
        for i in 0..=nu {
            let u = u0 + (u1 - u0) * i as f64 / nu as f64;
            tri.nodes.push(face.surface.point(u, v));
            tri.uv_nodes.push(DVec2::new(u, v));
        }
    }

    let row = (nu + 1) as u32;
    for j in 0..nv as u32 {
        for i in 0..nu as u32 {
            let a = j * row + i;
            let b = a + 1;
            let c = b + row;
            let d = a + row;
            for t in [[a, b, c], [a, c, d]] {
                if !is_sliver(&tri.nodes, t) {
                    tri.triangles.push(t);
                }
            }
        }
    }
    tri
}

// Triangles collapsed onto a pole or a disk center.
fn is_sliver(nodes: &[DVec3], [a, b, c]: [u32; 3]) -> bool {
    let (p0, p1, p2) = (nodes[a as usize], nodes[b as usize], nodes[c as usize]);
    (p1 - p0).cross(p2 - p0).length_squared() < 1e-24
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Surface;
    use std::f64::consts::{PI, TAU};

    fn square() -> Face {
        Face::new(
            Surface::plane(DVec3::ZERO, DVec3::X, DVec3::Y),
            [0.0, 2.0],
            [0.0, 1.0],
        )
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count(None, 10.0, 0.1, 0.1), 1);
        // Full circle, angular bound dominates.
        assert_eq!(segment_count(Some(1.0), TAU, 10.0, 0.5), 13);
        // Loose bounds still give at least a quarter-turn step.
        assert_eq!(segment_count(Some(1.0), TAU, 10.0, 10.0), 4);
        assert_eq!(segment_count(Some(1e9), TAU, 1e-12, 1e-12), MAX_SEGMENTS);
    }

    #[test]
    fn test_planar_face_is_two_triangles() {
        let shape: Shape = square().into();
        assert_eq!(incremental_mesh(&shape, 0.1, 0.1).unwrap(), 1);
        let (tri, _) = shape.faces()[0].triangulation().unwrap();
        assert_eq!(tri.nodes.len(), 4);
        assert_eq!(tri.triangles, vec![[0, 1, 3], [0, 3, 2]]);
        assert_eq!(tri.uv_nodes.len(), 4);
    }

    #[test]
    fn test_incremental_skips_meshed_faces() {
        let shape: Shape = square().into();
        incremental_mesh(&shape, 0.1, 0.1).unwrap();
        assert_eq!(incremental_mesh(&shape, 0.1, 0.1).unwrap(), 0);
        clean(&shape);
        assert!(shape.faces()[0].triangulation().is_none());
        assert_eq!(incremental_mesh(&shape, 0.1, 0.1).unwrap(), 1);
    }

    #[test]
    fn test_sphere_poles_have_no_slivers() {
        let face = Face::new(
            Surface::Sphere {
                center: DVec3::ZERO,
                axis: DVec3::Z,
                x_dir: DVec3::X,
                radius: 1.0,
            },
            [0.0, TAU],
            [-PI / 2.0, PI / 2.0],
        );
        let shape: Shape = face.into();
        incremental_mesh(&shape, 0.05, 0.3).unwrap();
        let (tri, _) = shape.faces()[0].triangulation().unwrap();
        for t in &tri.triangles {
            assert!(!is_sliver(&tri.nodes, *t));
        }
        assert!(!tri.triangles.is_empty());
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let shape: Shape = square().into();
        assert!(matches!(
            incremental_mesh(&shape, 0.0, 0.1),
            Err(KernelError::InvalidParameter { .. })
        ));
        assert!(incremental_mesh(&shape, 0.1, f64::NAN).is_err());
    }

    #[test]
    fn test_degenerate_face_is_skipped() {
        let face = Face::new(
            Surface::plane(DVec3::ZERO, DVec3::X, DVec3::Y),
            [0.0, 0.0],
            [0.0, 1.0],
        );
        let shape: Shape = face.into();
        assert_eq!(incremental_mesh(&shape, 0.1, 0.1).unwrap(), 0);
        assert!(shape.faces()[0].triangulation().is_none());
    }
}
