//! Factory functions for creating test data.
//!
//! Provides shapes and assemblies used by unit tests, integration tests and
//! the server's end-to-end tests.

use glam::{DQuat, DVec3};
use kernel::{make_box, make_cylinder, make_line_edge, make_rectangle, make_sphere, Location, Shape};
use shared::Rgb;

use crate::assembly::ShapeNode;

// ── Shape factories ─────────────────────────────────────────────
// Invalid dimensions give a null shape.

pub fn box_shape(dx: f64, dy: f64, dz: f64) -> Shape {
    make_box(dx, dy, dz).unwrap_or_default()
}

/// 1x1x1 box with a corner at the origin.
pub fn unit_box() -> Shape {
    box_shape(1.0, 1.0, 1.0)
}

pub fn cylinder_shape(radius: f64, height: f64) -> Shape {
    make_cylinder(radius, height).unwrap_or_default()
}

pub fn sphere_shape(radius: f64) -> Shape {
    make_sphere(radius).unwrap_or_default()
}

pub fn rectangle_shape(width: f64, height: f64) -> Shape {
    make_rectangle(width, height).unwrap_or_default()
}

/// Straight edge between two points.
pub fn line_edge(from: DVec3, to: DVec3) -> Shape {
    make_line_edge(from, to).map(Shape::from).unwrap_or_default()
}

// ── Placements and colors ───────────────────────────────────────

/// Translation with a rotation about a skewed axis.
pub fn transform_b() -> Location {
    Location::new(
        DVec3::new(2.0, -1.5, 0.25),
        DQuat::from_axis_angle(DVec3::new(1.0, 1.0, 0.0).normalize(), 0.7),
    )
}

/// Translation with a rotation about Z.
pub fn transform_c() -> Location {
    Location::new(DVec3::new(-3.0, 0.1, 4.0), DQuat::from_rotation_z(-1.2))
}

pub fn color_b() -> Rgb {
    Rgb::new(0.2, 0.4, 0.8)
}

pub fn color_c() -> Rgb {
    Rgb::new(0.9, 0.1, 0.3)
}

// ── Assembly factories ──────────────────────────────────────────

/// Group `A` with parts `A/B` (box) and `A/C` (cylinder), each with its own
/// placement and color. The root keeps the default placement and color.
pub fn nested_assembly() -> ShapeNode {
    ShapeNode::group("A")
        .with_child(
            ShapeNode::part("B", unit_box())
                .with_location(transform_b())
                .with_color(color_b()),
        )
        .with_child(
            ShapeNode::part("C", cylinder_shape(0.5, 2.0))
                .with_location(transform_c())
                .with_color(color_c()),
        )
}

/// Three levels: a colored subgroup holding a sphere and a plate, next to a
/// part with a sketch edge. Names include characters that need encoding.
pub fn deep_assembly() -> ShapeNode {
    ShapeNode::group("robot arm")
        .with_child(
            ShapeNode::group("joint #1")
                .with_location(Location::from_translation(DVec3::new(0.0, 0.0, 1.0)))
                .with_color(Rgb::GREY)
                .with_child(ShapeNode::part("ball", sphere_shape(0.4)))
                .with_child(
                    ShapeNode::part("plate", rectangle_shape(2.0, 1.0))
                        .with_location(Location::from_axis_angle(DVec3::X, std::f64::consts::FRAC_PI_2)),
                ),
        )
        .with_child(ShapeNode::part(
            "axis/line",
            line_edge(DVec3::ZERO, DVec3::new(0.0, 0.0, 3.0)),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_factories() {
        assert!(!unit_box().is_null());
        assert!(!cylinder_shape(0.5, 2.0).is_null());
        assert!(!sphere_shape(1.0).is_null());
        assert!(box_shape(-1.0, 1.0, 1.0).is_null());
        assert_eq!(line_edge(DVec3::ZERO, DVec3::X).edges().len(), 1);
    }

    #[test]
    fn test_nested_assembly() {
        let tree = nested_assembly();
        assert_eq!(tree.names(), vec!["A", "B", "C"]);
        assert!(tree.is_group());
        assert_eq!(tree.location, Location::IDENTITY);
        assert_eq!(tree.find("B").map(|n| n.location), Some(transform_b()));
    }

    #[test]
    fn test_deep_assembly() {
        let tree = deep_assembly();
        assert_eq!(tree.count(), 5);
        assert!(tree.find("ball").is_some());
    }
}
