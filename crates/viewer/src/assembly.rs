//! Assembly tree handed from the modeling session to the viewer.

use kernel::{Location, Shape};
use shared::Rgb;

/// Color of a node: explicit, or inherited from the nearest ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NodeColor {
    #[default]
    Inherit,
    Rgb(Rgb),
}

impl NodeColor {
    /// Explicit color, or `fallback` for `Inherit`.
    pub fn resolve(self, fallback: Rgb) -> Rgb {
        match self {
            NodeColor::Inherit => fallback,
            NodeColor::Rgb(c) => c,
        }
    }
}

impl From<Rgb> for NodeColor {
    fn from(c: Rgb) -> Self {
        NodeColor::Rgb(c)
    }
}

/// One node of the assembly tree.
///
/// Names must be unique among siblings; they become archive paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode {
    pub name: String,
    /// `None` for pure grouping nodes.
    pub geometry: Option<Shape>,
    pub location: Location,
    pub color: NodeColor,
    pub children: Vec<ShapeNode>,
}

impl ShapeNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            location: Location::IDENTITY,
            color: NodeColor::Inherit,
            children: Vec::new(),
        }
    }

    pub fn part(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            geometry: Some(shape),
            ..Self::group(name)
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_color(mut self, color: impl Into<NodeColor>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_child(mut self, child: ShapeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_group(&self) -> bool {
        self.geometry.is_none()
    }

    /// Inert leaf: no geometry and no children.
    pub fn is_empty(&self) -> bool {
        self.geometry.is_none() && self.children.is_empty()
    }

    /// Nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ShapeNode::count).sum::<usize>()
    }

    /// First node named `name`, pre-order.
    pub fn find(&self, name: &str) -> Option<&ShapeNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Names in pre-order.
    pub fn names(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str()];
        for child in &self.children {
            out.extend(child.names());
        }
        out
    }
}
