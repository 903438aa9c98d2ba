//! Structural rules deciding which nodes may contain which.
//!
//! Every predicate goes through [`NodeType::category`], an exhaustive match,
//! so a new node type cannot silently inherit permissive defaults.

use super::{ChildrenConstraint, Node, NodeCategory, NodeType};

/// Upper bound on the number of children a node may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Bounded(usize),
    Unbounded,
}

impl Degree {
    /// Whether a node with this bound can hold `count` children.
    pub fn admits(self, count: usize) -> bool {
        match self {
            Degree::Bounded(max) => count <= max,
            Degree::Unbounded => true,
        }
    }
}

/// Whether nodes of this type may hold children.
pub fn can_be_parent(node_type: NodeType) -> bool {
    match node_type.category() {
        NodeCategory::Scene | NodeCategory::Container => true,
        NodeCategory::Leaf | NodeCategory::Unrecognized => false,
    }
}

/// Whether nodes of this type may appear under a parent.
pub fn can_be_child(node_type: NodeType) -> bool {
    match node_type.category() {
        NodeCategory::Container | NodeCategory::Leaf => true,
        NodeCategory::Scene | NodeCategory::Unrecognized => false,
    }
}

/// Maximum number of children `node` may hold.
pub fn max_out_degree(node: &Node) -> Degree {
    match node.node_type.category() {
        NodeCategory::Scene => {
            let constraint = node.constraints.map(|c| c.children).unwrap_or_default();
            match constraint {
                ChildrenConstraint::Single => Degree::Bounded(1),
                ChildrenConstraint::Multiple => Degree::Unbounded,
            }
        }
        NodeCategory::Container => Degree::Unbounded,
        NodeCategory::Leaf | NodeCategory::Unrecognized => Degree::Bounded(0),
    }
}

/// Pairwise check applied after the type predicates. Rejects self-links.
pub fn can_link(parent: &Node, child: &Node) -> bool {
    parent.id != child.id
}

/// Whether pasted content may land inside a selected node of this type.
pub fn is_paste_target(node_type: NodeType) -> bool {
    match node_type {
        NodeType::Container => true,
        NodeType::Scene
        | NodeType::Group
        | NodeType::Boolean
        | NodeType::Component
        | NodeType::Instance
        | NodeType::Text
        | NodeType::Image
        | NodeType::Video
        | NodeType::Iframe
        | NodeType::Richtext
        | NodeType::Bitmap
        | NodeType::Svgpath
        | NodeType::Vector
        | NodeType::Line
        | NodeType::Rectangle
        | NodeType::Ellipse
        | NodeType::Polygon
        | NodeType::Star
        | NodeType::Unknown => false,
    }
}
