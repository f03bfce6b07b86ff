//! Integration tests for the build pipeline.
//!
//! Tests end-to-end: shape -> tessellate / sample / bounds -> validate output.

use cadview_lib::build::{discretize_edge, BoundingBox, Discretizer, Tessellator, DEFAULT_TOLERANCE};
use cadview_lib::display::DisplayScene;
use cadview_lib::fixtures::*;
use cadview_lib::settings::MeshSettings;
use cadview_lib::validation::MeshValidator;
use glam::DVec3;
use kernel::Shape;

fn tessellator() -> Tessellator {
    MeshSettings::default().tessellator().unwrap()
}

#[test]
fn test_box_end_to_end() {
    let mesh = tessellator().tessellate(&box_shape(2.0, 3.0, 4.0)).unwrap();
    let v = MeshValidator::new(&mesh);
    let errors = v.validate_all();
    assert!(errors.is_empty(), "Validation errors: {:?}", errors);
    assert_eq!(v.triangle_count(), 12);
    assert!(v.assert_dimensions_approx(DVec3::new(2.0, 3.0, 4.0), 1e-12));
}

#[test]
fn test_curved_primitives_validate() {
    for (name, shape, dims) in [
        ("cylinder", cylinder_shape(0.5, 2.0), DVec3::new(1.0, 1.0, 2.0)),
        ("sphere", sphere_shape(1.0), DVec3::splat(2.0)),
    ] {
        let mesh = tessellator().tessellate(&shape).unwrap();
        let v = MeshValidator::new(&mesh);
        let errors = v.validate_all();
        assert!(errors.is_empty(), "{name}: {:?}", errors);
        assert!(v.triangle_count() > 0);
        assert!(v.assert_dimensions_approx(dims, 0.02), "{name}: {:?}", v.dimensions());
    }
}

#[test]
fn test_mesh_stays_within_exact_bounds() {
    let shape = sphere_shape(1.5);
    let bounds = BoundingBox::compute(&[vec![shape.clone()]], DEFAULT_TOLERANCE, true);
    let mesh = tessellator().tessellate(&shape).unwrap();
    for p in &mesh.vertices {
        assert!(p.cmpge(bounds.min - 1e-9).all() && p.cmple(bounds.max + 1e-9).all());
    }
}

#[test]
fn test_scene_meshes_validate() {
    let scene = DisplayScene::from_assembly(&deep_assembly(), &MeshSettings::default()).unwrap();
    assert_eq!(scene.shapes.len(), 3);
    for shape in &scene.shapes {
        let errors = MeshValidator::new(&shape.mesh).validate_all();
        assert!(errors.is_empty(), "{}: {:?}", shape.path, errors);
    }
    // The edge-only part has polylines but no triangles.
    let line = scene.shapes.iter().find(|s| s.path.ends_with("/axis/line")).unwrap();
    assert!(line.mesh.is_empty());
    assert_eq!(line.edges.len(), 1);
}

#[test]
fn test_edge_sampling_boundary() {
    let null = discretize_edge(&Shape::Null, 0.01, Discretizer::default()).unwrap();
    assert!(null.value.is_empty());
    assert!(!null.is_clean());
    assert!(discretize_edge(&unit_box(), 0.01, Discretizer::default()).is_err());

    let edge = line_edge(DVec3::ZERO, DVec3::new(0.0, 0.0, 3.0));
    let points = discretize_edge(&edge, 0.01, Discretizer::UniformAbscissa).unwrap().into_value();
    assert_eq!(points.first(), Some(&DVec3::ZERO));
    assert_eq!(points.last(), Some(&DVec3::new(0.0, 0.0, 3.0)));
}
