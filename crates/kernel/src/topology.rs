//! Topological shapes.
//!
//! A [`Shape`] is a tree of compounds over solids, faces, edges and
//! vertices. Faces cache their last triangulation behind a mutex so meshing
//! works through a shared reference, the same way a kernel attaches
//! triangulations to an otherwise immutable shape.

use std::fmt;
use std::sync::{Arc, Mutex};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{Curve, Surface};
use crate::location::Location;
use crate::mesh::Triangulation;
use crate::PARAM_CONFUSION;

/// Orientation of a face relative to its surface's parametric normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Forward,
    Reversed,
    Internal,
    External,
}

impl Orientation {
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Vertex,
    Edge,
    Face,
    Solid,
    Compound,
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeType::Null => "null",
            ShapeType::Vertex => "vertex",
            ShapeType::Edge => "edge",
            ShapeType::Face => "face",
            ShapeType::Solid => "solid",
            ShapeType::Compound => "compound",
        };
        f.write_str(name)
    }
}

// ── Triangulation cache ─────────────────────────────────────────

/// Per-face triangulation cache. Not serialized and ignored by equality.
#[derive(Default)]
pub struct TriangulationSlot(Mutex<Option<Arc<Triangulation>>>);

impl TriangulationSlot {
    fn get(&self) -> Option<Arc<Triangulation>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, value: Option<Arc<Triangulation>>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

impl Clone for TriangulationSlot {
    fn clone(&self) -> Self {
        Self(Mutex::new(self.get()))
    }
}

impl fmt::Debug for TriangulationSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(t) => write!(f, "Triangulation({} triangles)", t.triangles.len()),
            None => f.write_str("None"),
        }
    }
}

impl PartialEq for TriangulationSlot {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

// ── Sub-shapes ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub point: DVec3,
}

/// Bounded curve segment `[first, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub curve: Curve,
    pub first: f64,
    pub last: f64,
    #[serde(default, skip_serializing_if = "Location::is_identity")]
    pub location: Location,
}

impl Edge {
    pub fn new(curve: Curve, first: f64, last: f64) -> Self {
        Self {
            curve,
            first,
            last,
            location: Location::IDENTITY,
        }
    }

    /// Curve in the global frame.
    pub fn located_curve(&self) -> Curve {
        self.curve.transformed(&self.location)
    }

    pub fn point_at(&self, t: f64) -> DVec3 {
        self.location.transform_point(self.curve.point(t))
    }

    pub fn length(&self) -> f64 {
        self.curve.length(self.first, self.last)
    }

    pub fn is_degenerate(&self) -> bool {
        (self.last - self.first).abs() < PARAM_CONFUSION
    }
}

/// Trimmed surface patch over `u_range × v_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub surface: Surface,
    pub u_range: [f64; 2],
    pub v_range: [f64; 2],
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Location::is_identity")]
    pub location: Location,
    #[serde(skip)]
    triangulation: TriangulationSlot,
}

impl Face {
    pub fn new(surface: Surface, u_range: [f64; 2], v_range: [f64; 2]) -> Self {
        Self {
            surface,
            u_range,
            v_range,
            orientation: Orientation::Forward,
            location: Location::IDENTITY,
            triangulation: TriangulationSlot::default(),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn is_reversed(&self) -> bool {
        self.orientation == Orientation::Reversed
    }

    /// A face with an empty parameter span cannot be triangulated.
    pub fn is_degenerate(&self) -> bool {
        (self.u_range[1] - self.u_range[0]).abs() < PARAM_CONFUSION
            || (self.v_range[1] - self.v_range[0]).abs() < PARAM_CONFUSION
    }

    pub fn located_surface(&self) -> Surface {
        self.surface.transformed(&self.location)
    }

    pub fn point_at(&self, u: f64, v: f64) -> DVec3 {
        self.location.transform_point(self.surface.point(u, v))
    }

    /// Global surface normal at `(u, v)`, flipped for reversed faces. Not
    /// normalized; zero at singular points.
    pub fn normal_at(&self, u: f64, v: f64) -> DVec3 {
        let n = self
            .location
            .transform_vector(self.surface.normal(u, v));
        if self.is_reversed() {
            -n
        } else {
            n
        }
    }

    /// Cached triangulation (local frame) and the location to place it.
    pub fn triangulation(&self) -> Option<(Arc<Triangulation>, Location)> {
        self.triangulation.get().map(|t| (t, self.location))
    }

    pub fn set_triangulation(&self, triangulation: Triangulation) {
        self.triangulation.set(Some(Arc::new(triangulation)));
    }

    pub fn clear_triangulation(&self) {
        self.triangulation.set(None);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Solid {
    pub faces: Vec<Face>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Compound {
    pub children: Vec<Shape>,
}

// ── Shape ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    #[default]
    Null,
    Vertex(Vertex),
    Edge(Edge),
    Face(Face),
    Solid(Solid),
    Compound(Compound),
}

impl Shape {
    pub fn compound(children: Vec<Shape>) -> Shape {
        Shape::Compound(Compound { children })
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Null => ShapeType::Null,
            Shape::Vertex(_) => ShapeType::Vertex,
            Shape::Edge(_) => ShapeType::Edge,
            Shape::Face(_) => ShapeType::Face,
            Shape::Solid(_) => ShapeType::Solid,
            Shape::Compound(_) => ShapeType::Compound,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Shape::Null)
    }

    /// All faces, depth-first.
    pub fn faces(&self) -> Vec<&Face> {
        let mut out = Vec::new();
        self.collect_faces(&mut out);
        out
    }

    fn collect_faces<'a>(&'a self, out: &mut Vec<&'a Face>) {
        match self {
            Shape::Face(f) => out.push(f),
            Shape::Solid(s) => out.extend(s.faces.iter()),
            Shape::Compound(c) => c.children.iter().for_each(|s| s.collect_faces(out)),
            Shape::Null | Shape::Vertex(_) | Shape::Edge(_) => {}
        }
    }

    /// All edges, depth-first.
    pub fn edges(&self) -> Vec<&Edge> {
        let mut out = Vec::new();
        self.collect_edges(&mut out);
        out
    }

    fn collect_edges<'a>(&'a self, out: &mut Vec<&'a Edge>) {
        match self {
            Shape::Edge(e) => out.push(e),
            Shape::Solid(s) => out.extend(s.edges.iter()),
            Shape::Compound(c) => c.children.iter().for_each(|s| s.collect_edges(out)),
            Shape::Null | Shape::Vertex(_) | Shape::Face(_) => {}
        }
    }

    /// Free vertices (not edge end points), depth-first.
    pub fn vertices(&self) -> Vec<&Vertex> {
        match self {
            Shape::Vertex(v) => vec![v],
            Shape::Compound(c) => c.children.iter().flat_map(|s| s.vertices()).collect(),
            _ => Vec::new(),
        }
    }

    /// Copy of the shape placed by `loc` on top of its current placement.
    pub fn moved(&self, loc: &Location) -> Shape {
        match self {
            Shape::Null => Shape::Null,
            Shape::Vertex(v) => Shape::Vertex(Vertex {
                point: loc.transform_point(v.point),
            }),
            Shape::Edge(e) => Shape::Edge(move_edge(e, loc)),
            Shape::Face(f) => Shape::Face(move_face(f, loc)),
            Shape::Solid(s) => Shape::Solid(Solid {
                faces: s.faces.iter().map(|f| move_face(f, loc)).collect(),
                edges: s.edges.iter().map(|e| move_edge(e, loc)).collect(),
            }),
            Shape::Compound(c) => {
                Shape::compound(c.children.iter().map(|s| s.moved(loc)).collect())
            }
        }
    }
}

fn move_edge(e: &Edge, loc: &Location) -> Edge {
    Edge {
        location: loc.compose(&e.location),
        ..*e
    }
}

fn move_face(f: &Face, loc: &Location) -> Face {
    let mut moved = Face::new(f.surface, f.u_range, f.v_range).with_orientation(f.orientation);
    moved.location = loc.compose(&f.location);
    moved
}

impl From<Face> for Shape {
    fn from(f: Face) -> Self {
        Shape::Face(f)
    }
}

impl From<Edge> for Shape {
    fn from(e: Edge) -> Self {
        Shape::Edge(e)
    }
}

impl From<Solid> for Shape {
    fn from(s: Solid) -> Self {
        Shape::Solid(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Face {
        Face::new(
            Surface::plane(DVec3::ZERO, DVec3::X, DVec3::Y),
            [0.0, 1.0],
            [0.0, 1.0],
        )
    }

    #[test]
    fn test_normal_at_reversed_face() {
        let f = unit_square().with_orientation(Orientation::Reversed);
        assert_eq!(f.normal_at(0.5, 0.5), DVec3::NEG_Z);
        let g = unit_square().with_orientation(Orientation::Internal);
        assert_eq!(g.normal_at(0.5, 0.5), DVec3::Z);
    }

    #[test]
    fn test_explorers_walk_compounds() {
        let line = Edge::new(Curve::line(DVec3::ZERO, DVec3::X), 0.0, 1.0);
        let shape = Shape::compound(vec![
            unit_square().into(),
            Shape::compound(vec![line.into(), unit_square().into()]),
            Shape::Vertex(Vertex { point: DVec3::ONE }),
        ]);
        assert_eq!(shape.faces().len(), 2);
        assert_eq!(shape.edges().len(), 1);
        assert_eq!(shape.vertices().len(), 1);
        assert_eq!(shape.shape_type(), ShapeType::Compound);
    }

    #[test]
    fn test_moved_composes_locations() {
        let t = Location::from_translation(DVec3::new(0.0, 0.0, 2.0));
        let shape: Shape = unit_square().into();
        let moved = shape.moved(&t).moved(&t);
        let face = moved.faces()[0];
        assert_eq!(face.point_at(0.0, 0.0), DVec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_triangulation_cache_is_shared_through_ref() {
        let f = unit_square();
        assert!(f.triangulation().is_none());
        f.set_triangulation(Triangulation::default());
        assert!(f.triangulation().is_some());
        let copy = f.clone();
        assert!(copy.triangulation().is_some());
        f.clear_triangulation();
        assert!(f.triangulation().is_none());
        assert_eq!(f, copy);
    }

    #[test]
    fn test_serde_roundtrip_drops_cache() {
        let f = unit_square().with_orientation(Orientation::Reversed);
        f.set_triangulation(Triangulation::default());
        let json = serde_json::to_string(&Shape::Face(f.clone())).unwrap();
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Shape::Face(f));
        assert!(back.faces()[0].triangulation().is_none());
    }
}
