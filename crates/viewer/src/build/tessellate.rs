//! Shape → triangle mesh.

use std::time::Instant;

use glam::DVec3;
use kernel::{Orientation, Shape};

use crate::error::GeometryError;

/// Triangle mesh in the global frame.
///
/// Triangles wind counter-clockwise seen from the outward normal. `normals`
/// holds one entry per vertex, or nothing when the faces had no UV nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<DVec3>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Meshing tolerances, validated once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tessellator {
    linear_tolerance: f64,
    angular_tolerance: f64,
}

impl Tessellator {
    pub fn new(linear_tolerance: f64, angular_tolerance: f64) -> Result<Self, GeometryError> {
        for (name, value) in [
            ("linear tolerance", linear_tolerance),
            ("angular tolerance", angular_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::InvalidInput(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(Self {
            linear_tolerance,
            angular_tolerance,
        })
    }

    pub fn linear_tolerance(&self) -> f64 {
        self.linear_tolerance
    }

    pub fn angular_tolerance(&self) -> f64 {
        self.angular_tolerance
    }

    /// Mesh every face of `shape` afresh.
    ///
    /// Cached triangulations are discarded first, so repeated calls give
    /// the same result. A shape without triangulatable faces gives an empty
    /// mesh.
    pub fn tessellate(&self, shape: &Shape) -> Result<Mesh, GeometryError> {
        let start = Instant::now();
        kernel::clean(shape);
        kernel::incremental_mesh(shape, self.linear_tolerance, self.angular_tolerance)?;
        let triangulated = start.elapsed();

        let mut mesh = Mesh::default();
        for face in shape.faces() {
            let Some((tri, loc)) = face.triangulation() else {
                continue;
            };
            let offset = mesh.vertices.len() as u32;
            mesh.vertices
                .extend(tri.nodes.iter().map(|p| loc.transform_point(*p)));

            let reversed = face.is_reversed();
            mesh.triangles.extend(tri.triangles.iter().map(|&[a, b, c]| {
                if reversed {
                    [a + offset, c + offset, b + offset]
                } else {
                    [a + offset, b + offset, c + offset]
                }
            }));

            if tri.has_uv_nodes() {
                let internal = face.orientation == Orientation::Internal;
                mesh.normals.extend(tri.uv_nodes.iter().map(|uv| {
                    let n = face.normal_at(uv.x, uv.y);
                    let n = if n.length_squared() > 0.0 { n.normalize() } else { n };
                    if internal {
                        -n
                    } else {
                        n
                    }
                }));
            }
        }

        tracing::debug!(
            "tessellate: {} vertices, {} triangles (triangulation {:.2}ms, total {:.2}ms)",
            mesh.vertex_count(),
            mesh.triangle_count(),
            triangulated.as_secs_f64() * 1000.0,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(mesh)
    }
}

/// One-shot [`Tessellator::tessellate`].
pub fn tessellate(
    shape: &Shape,
    linear_tolerance: f64,
    angular_tolerance: f64,
) -> Result<Mesh, GeometryError> {
    Tessellator::new(linear_tolerance, angular_tolerance)?.tessellate(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::geometry::Surface;
    use kernel::primitives::{make_box, make_cylinder, make_sphere};
    use kernel::{Face, Location};

    fn square(orientation: Orientation) -> Shape {
        Face::new(
            Surface::plane(DVec3::ZERO, DVec3::X, DVec3::Y),
            [0.0, 1.0],
            [0.0, 1.0],
        )
        .with_orientation(orientation)
        .into()
    }

    #[test]
    fn test_indices_in_range() {
        for shape in [
            make_box(1.0, 2.0, 3.0).unwrap(),
            make_cylinder(1.0, 2.0).unwrap(),
            make_sphere(1.5).unwrap(),
        ] {
            let mesh = tessellate(&shape, 0.05, 0.3).unwrap();
            assert!(mesh.triangle_count() > 0);
            let n = mesh.vertex_count() as u32;
            assert!(mesh.triangles.iter().flatten().all(|&i| i < n));
            assert_eq!(mesh.normals.len(), mesh.vertices.len());
        }
    }

    #[test]
    fn test_reversed_face_swaps_winding() {
        let fwd = tessellate(&square(Orientation::Forward), 0.1, 0.1).unwrap();
        let rev = tessellate(&square(Orientation::Reversed), 0.1, 0.1).unwrap();
        assert_eq!(fwd.vertices, rev.vertices);
        for (f, r) in fwd.triangles.iter().zip(&rev.triangles) {
            assert_eq!([f[0], f[2], f[1]], *r);
        }
        assert_eq!(fwd.normals[0], DVec3::Z);
        assert_eq!(rev.normals[0], DVec3::NEG_Z);
    }

    #[test]
    fn test_internal_face_negates_normals() {
        let mesh = tessellate(&square(Orientation::Internal), 0.1, 0.1).unwrap();
        assert!(mesh.normals.iter().all(|n| *n == DVec3::NEG_Z));
    }

    #[test]
    fn test_offsets_accumulate_across_faces() {
        let mesh = tessellate(&make_box(1.0, 1.0, 1.0).unwrap(), 0.1, 0.1).unwrap();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.triangles[11].iter().max().copied(), Some(23));
    }

    #[test]
    fn test_box_winding_matches_outward_normals() {
        let mesh = tessellate(&make_box(1.0, 1.0, 1.0).unwrap(), 0.1, 0.1).unwrap();
        for t in &mesh.triangles {
            let [a, b, c] = t.map(|i| mesh.vertices[i as usize]);
            let geometric = (b - a).cross(c - a).normalize();
            assert!(geometric.dot(mesh.normals[t[0] as usize]) > 0.99);
        }
    }

    #[test]
    fn test_global_frame_and_idempotent() {
        let shape = square(Orientation::Forward)
            .moved(&Location::from_translation(DVec3::new(0.0, 0.0, 5.0)));
        let first = tessellate(&shape, 0.1, 0.1).unwrap();
        let second = tessellate(&shape, 0.1, 0.1).unwrap();
        assert_eq!(first, second);
        assert!(first.vertices.iter().all(|v| v.z == 5.0));
    }

    #[test]
    fn test_no_faces_gives_empty_mesh() {
        let shape = Shape::compound(vec![Shape::Null]);
        let mesh = tessellate(&shape, 0.1, 0.1).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty() && mesh.normals.is_empty());
    }

    #[test]
    fn test_invalid_tolerance() {
        let shape = square(Orientation::Forward);
        assert!(matches!(
            tessellate(&shape, -1.0, 0.1),
            Err(GeometryError::InvalidInput(_))
        ));
        assert!(Tessellator::new(0.1, f64::INFINITY).is_err());
    }
}
