//! Assembly tree → display primitives.
//!
//! The conversion mirrors the tree: groups stay groups, geometry nodes
//! become parts with their accumulated placement and inherited color. Parts
//! are numbered pre-order; the same numbering is used by the state mapping,
//! the rendered shapes and the navigation tree.

use std::collections::BTreeMap;

use glam::DVec3;
use kernel::{Location, Shape};
use serde::Serialize;
use shared::{DisplayOptions, Rgb};

use crate::assembly::ShapeNode;
use crate::build::{sample_edge, BoundingBox, Discretizer, Mesh, Tessellator};
use crate::error::GeometryError;
use crate::settings::MeshSettings;

/// A renderable part in the display hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    /// Geometry in the node's own frame.
    pub shape: Shape,
    /// Accumulated placement from the root.
    pub location: Location,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Part(Part),
    Group(PartGroup),
}

/// Group of parts and nested groups.
#[derive(Debug, Clone, PartialEq)]
pub struct PartGroup {
    pub name: String,
    pub location: Location,
    pub items: Vec<DisplayItem>,
}

/// Build the display hierarchy. Colors fall back to amber at the root;
/// a node that has both geometry and children becomes a group whose first
/// item is the node's own part.
pub fn from_assembly(root: &ShapeNode) -> Result<PartGroup, GeometryError> {
    convert_group(root, &Location::IDENTITY, Rgb::DEFAULT)
}

fn convert_group(node: &ShapeNode, parent: &Location, parent_color: Rgb) -> Result<PartGroup, GeometryError> {
    let location = parent.compose(&node.location);
    let color = node.color.resolve(parent_color);
    let mut items = Vec::with_capacity(node.children.len() + 1);
    if let Some(shape) = &node.geometry {
        items.push(DisplayItem::Part(make_part(node, shape, location, color)?));
    }
    for child in &node.children {
        items.push(convert_node(child, &location, color)?);
    }
    Ok(PartGroup {
        name: node.name.clone(),
        location,
        items,
    })
}

fn convert_node(node: &ShapeNode, parent: &Location, parent_color: Rgb) -> Result<DisplayItem, GeometryError> {
    match &node.geometry {
        Some(shape) if node.children.is_empty() => {
            let location = parent.compose(&node.location);
            let color = node.color.resolve(parent_color);
            Ok(DisplayItem::Part(make_part(node, shape, location, color)?))
        }
        _ => Ok(DisplayItem::Group(convert_group(node, parent, parent_color)?)),
    }
}

fn make_part(node: &ShapeNode, shape: &Shape, location: Location, color: Rgb) -> Result<Part, GeometryError> {
    if shape.is_null() {
        return Err(GeometryError::InvalidInput(format!(
            "part '{}' has null geometry",
            node.name
        )));
    }
    Ok(Part {
        name: node.name.clone(),
        shape: shape.clone(),
        location,
        color,
    })
}

/// Display state of one part instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartState {
    pub id: usize,
    /// `/Root/Group/Part`
    pub path: String,
    pub color: Rgb,
}

/// Pre-order numbering of all parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DisplayState {
    pub parts: Vec<PartState>,
}

impl DisplayState {
    /// Instance id → tree path.
    pub fn mapping(&self) -> BTreeMap<usize, String> {
        self.parts.iter().map(|p| (p.id, p.path.clone())).collect()
    }
}

/// A part ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayShape {
    pub id: usize,
    pub path: String,
    pub color: Rgb,
    /// Geometry placed in the global frame.
    pub shape: Shape,
    pub mesh: Mesh,
    /// Sampled edges, one polyline each.
    pub edges: Vec<Vec<DVec3>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavKind {
    Group,
    Part,
}

/// Navigation tree node for the viewer's tree widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavNode {
    pub name: String,
    pub kind: NavKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl PartGroup {
    /// All parts pre-order with their tree paths.
    pub fn parts(&self) -> Vec<(String, &Part)> {
        let mut out = Vec::new();
        self.collect_parts("", &mut out);
        out
    }

    fn collect_parts<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Part)>) {
        let path = format!("{prefix}/{}", self.name);
        for item in &self.items {
            match item {
                DisplayItem::Part(part) => out.push((format!("{path}/{}", part.name), part)),
                DisplayItem::Group(group) => group.collect_parts(&path, out),
            }
        }
    }

    pub fn to_state(&self) -> DisplayState {
        DisplayState {
            parts: self
                .parts()
                .into_iter()
                .enumerate()
                .map(|(id, (path, part))| PartState {
                    id,
                    path,
                    color: part.color,
                })
                .collect(),
        }
    }

    /// Mesh and sample every part, placed in the global frame.
    pub fn collect_mapped_shapes(
        &self,
        state: &DisplayState,
        tessellator: &Tessellator,
        edge_deflection: f64,
    ) -> Result<Vec<DisplayShape>, GeometryError> {
        let parts = self.parts();
        if parts.len() != state.parts.len() {
            return Err(GeometryError::InvalidInput(format!(
                "display state has {} parts, group has {}",
                state.parts.len(),
                parts.len()
            )));
        }

        parts
            .into_iter()
            .zip(&state.parts)
            .map(|((_, part), entry)| -> Result<DisplayShape, GeometryError> {
                let shape = part.shape.moved(&part.location);
                let mesh = tessellator.tessellate(&shape)?;
                let deflection = part_edge_deflection(&shape, edge_deflection);
                let edges = shape
                    .edges()
                    .into_iter()
                    .filter(|e| !e.is_degenerate())
                    .map(|e| sample_edge(e, deflection, Discretizer::QuasiUniformDeflection))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DisplayShape {
                    id: entry.id,
                    path: entry.path.clone(),
                    color: entry.color,
                    shape,
                    mesh,
                    edges,
                })
            })
            .collect()
    }

    pub fn to_nav_tree(&self) -> NavNode {
        let mut next_id = 0;
        self.nav_node(&mut next_id)
    }

    fn nav_node(&self, next_id: &mut usize) -> NavNode {
        let mut children = Vec::with_capacity(self.items.len());
        for item in &self.items {
            children.push(match item {
                DisplayItem::Part(part) => {
                    let node = NavNode {
                        name: part.name.clone(),
                        kind: NavKind::Part,
                        id: Some(*next_id),
                        children: Vec::new(),
                    };
                    *next_id += 1;
                    node
                }
                DisplayItem::Group(group) => group.nav_node(next_id),
            });
        }
        NavNode {
            name: self.name.clone(),
            kind: NavKind::Group,
            id: None,
            children,
        }
    }
}

/// Everything the viewer surface needs for one update.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayScene {
    pub shapes: Vec<DisplayShape>,
    pub mapping: BTreeMap<usize, String>,
    pub tree: NavNode,
    pub bounds: BoundingBox,
}

impl DisplayScene {
    /// Run the whole conversion: hierarchy, state, meshes, navigation tree
    /// and bounds.
    pub fn from_assembly(root: &ShapeNode, mesh: &MeshSettings) -> Result<Self, GeometryError> {
        let tessellator = mesh.tessellator()?;
        let group = from_assembly(root)?;
        let state = group.to_state();
        let shapes = group.collect_mapped_shapes(&state, &tessellator, mesh.edge_deflection)?;
        let placed: Vec<Shape> = shapes.iter().map(|s| s.shape.clone()).collect();
        let bounds = BoundingBox::compute(&[placed], crate::build::DEFAULT_TOLERANCE, false);
        Ok(Self {
            shapes,
            mapping: state.mapping(),
            tree: group.to_nav_tree(),
            bounds,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.shapes.iter().map(|s| s.mesh.triangle_count()).sum()
    }
}

/// Edge deflection relative to the part's bounding diagonal.
///
/// With this floor a full circle never needs more than 256 segments, so
/// large parts stay within the sampler's segment limit.
pub const RELATIVE_EDGE_DEFLECTION: f64 = 1e-4;

/// Deflection for sampling the edges of `shape`: the configured value, or
/// coarser for parts large enough to exceed the segment limit.
pub fn part_edge_deflection(shape: &Shape, edge_deflection: f64) -> f64 {
    let bounds = BoundingBox::of_shape(shape, crate::build::DEFAULT_TOLERANCE, false);
    edge_deflection.max(bounds.diagonal_length * RELATIVE_EDGE_DEFLECTION)
}

/// A scene plus the caller's display options.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub scene: DisplayScene,
    pub options: DisplayOptions,
}

impl DisplayUpdate {
    /// `reset` option; resets the camera unless explicitly false.
    pub fn reset_camera(&self) -> bool {
        self.options
            .get("reset")
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::NodeColor;
    use crate::fixtures::*;
    use shared::OptionValue;

    #[test]
    fn test_colors_inherit_and_locations_accumulate() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        let tree = ShapeNode::group("root")
            .with_location(Location::from_translation(DVec3::X))
            .with_child(
                ShapeNode::group("sub")
                    .with_color(red)
                    .with_location(Location::from_translation(DVec3::Y))
                    .with_child(ShapeNode::part("p", unit_box())),
            )
            .with_child(ShapeNode::part("q", unit_box()));
        let group = from_assembly(&tree).unwrap();
        let parts = group.parts();
        assert_eq!(parts[0].0, "/root/sub/p");
        assert_eq!(parts[0].1.color, red);
        assert_eq!(parts[0].1.location.translation, DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(parts[1].0, "/root/q");
        assert_eq!(parts[1].1.color, Rgb::DEFAULT);
    }

    #[test]
    fn test_state_ids_are_preorder() {
        let group = from_assembly(&nested_assembly()).unwrap();
        let state = group.to_state();
        let ids: Vec<usize> = state.parts.iter().map(|p| p.id).collect();
        assert_eq!(ids, (0..state.parts.len()).collect::<Vec<_>>());
        assert_eq!(state.mapping()[&0], state.parts[0].path);
    }

    #[test]
    fn test_node_with_geometry_and_children() {
        let tree = ShapeNode::group("root").with_child(
            ShapeNode::part("base", unit_box())
                .with_color(NodeColor::Rgb(Rgb::GREY))
                .with_child(ShapeNode::part("pin", unit_box())),
        );
        let group = from_assembly(&tree).unwrap();
        let paths: Vec<String> = group.parts().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["/root/base/base", "/root/base/pin"]);
        let nav = group.to_nav_tree();
        assert_eq!(nav.children[0].kind, NavKind::Group);
        assert_eq!(nav.children[0].children[0].id, Some(0));
        assert_eq!(nav.children[0].children[1].id, Some(1));
    }

    #[test]
    fn test_nav_tree_ids_match_state() {
        let group = from_assembly(&nested_assembly()).unwrap();
        let state = group.to_state();
        let mut nav_ids = Vec::new();
        fn walk(n: &NavNode, out: &mut Vec<usize>) {
            out.extend(n.id);
            n.children.iter().for_each(|c| walk(c, out));
        }
        walk(&group.to_nav_tree(), &mut nav_ids);
        assert_eq!(nav_ids, state.parts.iter().map(|p| p.id).collect::<Vec<_>>());
    }

    #[test]
    fn test_scene_meshes_and_bounds() {
        let scene = DisplayScene::from_assembly(&nested_assembly(), &MeshSettings::default()).unwrap();
        assert_eq!(scene.shapes.len(), scene.mapping.len());
        assert!(scene.triangle_count() > 0);
        assert!(!scene.bounds.is_empty(0.01));
        assert!(scene.shapes.iter().all(|s| !s.edges.is_empty()));
    }

    #[test]
    fn test_large_part_edges_are_sampled() {
        let root = ShapeNode::group("site").with_child(ShapeNode::part("tank", cylinder_shape(20000.0, 10.0)));
        let scene = DisplayScene::from_assembly(&root, &MeshSettings::default()).unwrap();
        let tank = &scene.shapes[0];
        assert!(!tank.edges.is_empty());
        assert!(tank.edges.iter().all(|e| e.len() <= kernel::MAX_SEGMENTS + 1));
    }

    #[test]
    fn test_small_part_keeps_configured_deflection() {
        assert_eq!(part_edge_deflection(&unit_box(), 0.01), 0.01);
        assert!(part_edge_deflection(&cylinder_shape(20000.0, 10.0), 0.01) > 1.0);
    }

    #[test]
    fn test_mismatched_state_rejected() {
        let group = from_assembly(&nested_assembly()).unwrap();
        let tess = MeshSettings::default().tessellator().unwrap();
        assert!(matches!(
            group.collect_mapped_shapes(&DisplayState::default(), &tess, 0.01),
            Err(GeometryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_reset_option() {
        let scene = DisplayScene::from_assembly(&ShapeNode::group("empty"), &MeshSettings::default()).unwrap();
        let mut update = DisplayUpdate {
            scene,
            options: DisplayOptions::new(),
        };
        assert!(update.reset_camera());
        update
            .options
            .insert("reset".into(), OptionValue::Bool(false));
        assert!(!update.reset_camera());
    }
}
