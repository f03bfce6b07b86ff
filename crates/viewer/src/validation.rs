//! Mesh validation utilities.
//!
//! `MeshValidator` checks tessellation output: one normal per vertex,
//! in-range indices, unit normals, bounding dimensions.

use glam::DVec3;

use crate::build::Mesh;

/// Validator for `Mesh` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a Mesh,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Exactly one normal per vertex.
    pub fn are_normals_paired(&self) -> bool {
        self.mesh.normals.len() == self.mesh.vertices.len()
    }

    /// Check that all indices are within the valid vertex range.
    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.triangles.iter().flatten().all(|&i| i < max_idx)
    }

    /// Normals are unit length within `epsilon`. Zero normals are allowed;
    /// they mark vertices where the surface normal is undefined.
    pub fn are_normals_normalized(&self, epsilon: f64) -> bool {
        self.mesh.normals.iter().all(|n| {
            let len = n.length();
            len == 0.0 || (len - 1.0).abs() <= epsilon
        })
    }

    /// Triangles whose three corners are not distinct.
    pub fn degenerate_triangles(&self) -> usize {
        self.mesh
            .triangles
            .iter()
            .filter(|[a, b, c]| a == b || b == c || a == c)
            .count()
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh.
    pub fn aabb(&self) -> Option<(DVec3, DVec3)> {
        let first = *self.mesh.vertices.first()?;
        Some(
            self.mesh
                .vertices
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Width, height and depth of the bounds.
    pub fn dimensions(&self) -> DVec3 {
        self.aabb().map(|(lo, hi)| hi - lo).unwrap_or(DVec3::ZERO)
    }

    /// Check that the bounds dimensions are approximately `expected`.
    pub fn assert_dimensions_approx(&self, expected: DVec3, tolerance: f64) -> bool {
        (self.dimensions() - expected).abs().max_element() < tolerance
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the mesh is valid.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.are_normals_paired() {
            errors.push(format!(
                "{} normals for {} vertices",
                self.mesh.normals.len(),
                self.mesh.vertices.len()
            ));
        }

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self
                .mesh
                .triangles
                .iter()
                .flatten()
                .filter(|&&i| i >= max_idx)
                .take(5)
                .collect();
            errors.push(format!(
                "Indices out of range (vertex_count={max_idx}): {out_of_range:?}"
            ));
        }

        if !self.are_normals_normalized(1e-6) {
            errors.push("Some normals are neither unit-length nor zero".to_string());
        }

        let degenerate = self.degenerate_triangles();
        if degenerate > 0 {
            errors.push(format!("{degenerate} degenerate triangles"));
        }

        errors
    }
}
