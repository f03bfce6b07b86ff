//! Primitive shape builders.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec3;

use crate::error::KernelError;
use crate::geometry::{Curve, Surface};
use crate::topology::{Edge, Face, Orientation, Shape, Solid, Vertex};

/// Box with one corner at the origin and the opposite one at `(dx, dy, dz)`.
pub fn make_box(dx: f64, dy: f64, dz: f64) -> Result<Shape, KernelError> {
    KernelError::check_positive("dx", dx)?;
    KernelError::check_positive("dy", dy)?;
    KernelError::check_positive("dz", dz)?;

    let plane = |origin: DVec3, x: DVec3, y: DVec3, a: f64, b: f64, o: Orientation| {
        Face::new(Surface::plane(origin, x, y), [0.0, a], [0.0, b]).with_orientation(o)
    };
    use Orientation::{Forward, Reversed};
    let faces = vec![
        plane(DVec3::ZERO, DVec3::X, DVec3::Y, dx, dy, Reversed),
        plane(DVec3::new(0.0, 0.0, dz), DVec3::X, DVec3::Y, dx, dy, Forward),
        plane(DVec3::ZERO, DVec3::X, DVec3::Z, dx, dz, Forward),
        plane(DVec3::new(0.0, dy, 0.0), DVec3::X, DVec3::Z, dx, dz, Reversed),
        plane(DVec3::ZERO, DVec3::Y, DVec3::Z, dy, dz, Reversed),
        plane(DVec3::new(dx, 0.0, 0.0), DVec3::Y, DVec3::Z, dy, dz, Forward),
    ];

    let mut edges = Vec::with_capacity(12);
    for (dir, len, others) in [
        (DVec3::X, dx, [DVec3::Y * dy, DVec3::Z * dz]),
        (DVec3::Y, dy, [DVec3::X * dx, DVec3::Z * dz]),
        (DVec3::Z, dz, [DVec3::X * dx, DVec3::Y * dy]),
    ] {
        for origin in [DVec3::ZERO, others[0], others[1], others[0] + others[1]] {
            edges.push(Edge::new(Curve::line(origin, dir), 0.0, len));
        }
    }
    Ok(Shape::Solid(Solid { faces, edges }))
}

/// Cylinder standing on the XY plane, axis +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Shape, KernelError> {
    KernelError::check_positive("radius", radius)?;
    KernelError::check_positive("height", height)?;

    let top = DVec3::new(0.0, 0.0, height);
    let faces = vec![
        Face::new(
            Surface::Cylinder {
                origin: DVec3::ZERO,
                axis: DVec3::Z,
                x_dir: DVec3::X,
                radius,
            },
            [0.0, TAU],
            [0.0, height],
        ),
        // Disk normal is -axis: outward for the bottom cap.
        Face::new(
            Surface::Disk {
                center: DVec3::ZERO,
                axis: DVec3::Z,
                x_dir: DVec3::X,
            },
            [0.0, TAU],
            [0.0, radius],
        ),
        Face::new(
            Surface::Disk {
                center: top,
                axis: DVec3::Z,
                x_dir: DVec3::X,
            },
            [0.0, TAU],
            [0.0, radius],
        )
        .with_orientation(Orientation::Reversed),
    ];
    let edges = vec![
        Edge::new(Curve::circle(DVec3::ZERO, DVec3::Z, DVec3::X, radius), 0.0, TAU),
        Edge::new(Curve::circle(top, DVec3::Z, DVec3::X, radius), 0.0, TAU),
        Edge::new(Curve::line(DVec3::X * radius, DVec3::Z), 0.0, height),
    ];
    Ok(Shape::Solid(Solid { faces, edges }))
}

/// Sphere centered at the origin, with its seam meridian in the XZ plane.
pub fn make_sphere(radius: f64) -> Result<Shape, KernelError> {
    KernelError::check_positive("radius", radius)?;
    let face = Face::new(
        Surface::Sphere {
            center: DVec3::ZERO,
            axis: DVec3::Z,
            x_dir: DVec3::X,
            radius,
        },
        [0.0, TAU],
        [-FRAC_PI_2, FRAC_PI_2],
    );
    // (-Y) × X = Z, so the meridian runs from the south to the north pole.
    let seam = Edge::new(
        Curve::circle(DVec3::ZERO, DVec3::NEG_Y, DVec3::X, radius),
        -FRAC_PI_2,
        FRAC_PI_2,
    );
    Ok(Shape::Solid(Solid {
        faces: vec![face],
        edges: vec![seam],
    }))
}

/// Rectangle `[0, width] × [0, height]` in the XY plane with its outline.
pub fn make_rectangle(width: f64, height: f64) -> Result<Shape, KernelError> {
    KernelError::check_positive("width", width)?;
    KernelError::check_positive("height", height)?;
    let face = Face::new(
        Surface::plane(DVec3::ZERO, DVec3::X, DVec3::Y),
        [0.0, width],
        [0.0, height],
    );
    let corners = [
        DVec3::ZERO,
        DVec3::new(width, 0.0, 0.0),
        DVec3::new(width, height, 0.0),
        DVec3::new(0.0, height, 0.0),
    ];
    let outline = (0..4)
        .map(|i| make_line_edge(corners[i], corners[(i + 1) % 4]).map(Shape::Edge))
        .collect::<Result<Vec<_>, _>>()?;
    let mut children = vec![Shape::Face(face)];
    children.extend(outline);
    Ok(Shape::compound(children))
}

pub fn make_line_edge(from: DVec3, to: DVec3) -> Result<Edge, KernelError> {
    let length = KernelError::check_positive("length", from.distance(to))?;
    Ok(Edge::new(Curve::line(from, to - from), 0.0, length))
}

pub fn make_circle_edge(center: DVec3, axis: DVec3, radius: f64) -> Result<Edge, KernelError> {
    KernelError::check_positive("radius", radius)?;
    let axis = axis.normalize_or_zero();
    if axis == DVec3::ZERO {
        return Err(KernelError::InvalidParameter {
            name: "axis",
            value: 0.0,
        });
    }
    Ok(Edge::new(
        Curve::circle(center, axis, axis.any_orthonormal_vector(), radius),
        0.0,
        TAU,
    ))
}

pub fn make_vertex(point: DVec3) -> Shape {
    Shape::Vertex(Vertex { point })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::compute_bounds;
    use crate::mesh::incremental_mesh;

    fn face_center_and_normal(f: &Face) -> (DVec3, DVec3) {
        let u = 0.5 * (f.u_range[0] + f.u_range[1]);
        let v = 0.5 * (f.v_range[0] + f.v_range[1]);
        (f.point_at(u, v), f.normal_at(u, v).normalize())
    }

    #[test]
    fn test_box_normals_point_outward() {
        let shape = make_box(1.0, 2.0, 3.0).unwrap();
        let center = DVec3::new(0.5, 1.0, 1.5);
        let faces = shape.faces();
        assert_eq!(faces.len(), 6);
        for f in faces {
            let (p, n) = face_center_and_normal(f);
            assert!((p - center).dot(n) > 0.0, "face at {p} points inward");
        }
        assert_eq!(shape.edges().len(), 12);
    }

    #[test]
    fn test_cylinder_normals_point_outward() {
        let shape = make_cylinder(1.0, 2.0).unwrap();
        let center = DVec3::new(0.0, 0.0, 1.0);
        for f in shape.faces() {
            let u = 0.3;
            let v = 0.5 * (f.v_range[0] + f.v_range[1]);
            let p = f.point_at(u, v);
            let n = f.normal_at(u, v);
            assert!((p - center).dot(n) > 0.0);
        }
    }

    #[test]
    fn test_box_bounds() {
        let shape = make_box(1.0, 2.0, 3.0).unwrap();
        let b = compute_bounds(&shape, 0.0, true).unwrap();
        assert_eq!(b.min, DVec3::ZERO);
        assert_eq!(b.max, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_sphere_seam_spans_poles() {
        let shape = make_sphere(2.0).unwrap();
        let seam = shape.edges()[0];
        assert!((seam.point_at(seam.first) - DVec3::new(0.0, 0.0, -2.0)).length() < 1e-12);
        assert!((seam.point_at(seam.last) - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-12);
        assert!(incremental_mesh(&shape, 0.1, 0.5).unwrap() == 1);
    }

    #[test]
    fn test_rectangle_outline() {
        let shape = make_rectangle(2.0, 1.0).unwrap();
        assert_eq!(shape.faces().len(), 1);
        assert_eq!(shape.edges().len(), 4);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(make_box(0.0, 1.0, 1.0).is_err());
        assert!(make_cylinder(1.0, -1.0).is_err());
        assert!(make_line_edge(DVec3::ONE, DVec3::ONE).is_err());
        assert!(make_circle_edge(DVec3::ZERO, DVec3::ZERO, 1.0).is_err());
    }
}
