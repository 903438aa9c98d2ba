//! Node definitions for the scene graph.

pub mod policy;

use crate::geometry::Rectangle;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// Unique identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The kind of a node. Unrecognized tags deserialize to [`NodeType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Scene,
    Container,
    Group,
    Boolean,
    Component,
    Instance,
    Text,
    Image,
    Video,
    Iframe,
    Richtext,
    Bitmap,
    Svgpath,
    Vector,
    Line,
    Rectangle,
    Ellipse,
    Polygon,
    Star,
    #[serde(other)]
    Unknown,
}

/// Structural role of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    /// Root of a page. Never a child.
    Scene,
    /// May hold children.
    Container,
    /// Never holds children.
    Leaf,
    /// A tag this build does not know. Treated as inert.
    Unrecognized,
}

impl NodeType {
    /// Every variant, in declaration order.
    pub const ALL: [NodeType; 20] = [
        NodeType::Scene,
        NodeType::Container,
        NodeType::Group,
        NodeType::Boolean,
        NodeType::Component,
        NodeType::Instance,
        NodeType::Text,
        NodeType::Image,
        NodeType::Video,
        NodeType::Iframe,
        NodeType::Richtext,
        NodeType::Bitmap,
        NodeType::Svgpath,
        NodeType::Vector,
        NodeType::Line,
        NodeType::Rectangle,
        NodeType::Ellipse,
        NodeType::Polygon,
        NodeType::Star,
        NodeType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Scene => "scene",
            NodeType::Container => "container",
            NodeType::Group => "group",
            NodeType::Boolean => "boolean",
            NodeType::Component => "component",
            NodeType::Instance => "instance",
            NodeType::Text => "text",
            NodeType::Image => "image",
            NodeType::Video => "video",
            NodeType::Iframe => "iframe",
            NodeType::Richtext => "richtext",
            NodeType::Bitmap => "bitmap",
            NodeType::Svgpath => "svgpath",
            NodeType::Vector => "vector",
            NodeType::Line => "line",
            NodeType::Rectangle => "rectangle",
            NodeType::Ellipse => "ellipse",
            NodeType::Polygon => "polygon",
            NodeType::Star => "star",
            NodeType::Unknown => "unknown",
        }
    }

    /// Structural role. Adding a variant forces a decision here because the
    /// match has no catch-all arm.
    pub fn category(self) -> NodeCategory {
        match self {
            NodeType::Scene => NodeCategory::Scene,
            NodeType::Container
            | NodeType::Group
            | NodeType::Boolean
            | NodeType::Component
            | NodeType::Instance => NodeCategory::Container,
            NodeType::Text
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
            | NodeType::Star => NodeCategory::Leaf,
            NodeType::Unknown => NodeCategory::Unrecognized,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many children a scene accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenConstraint {
    Single,
    #[default]
    Multiple,
}

/// Constraints carried by scene nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneConstraints {
    #[serde(default)]
    pub children: ChildrenConstraint,
}

/// A node in the scene graph.
///
/// Edges (`parent_id`, `children`) are owned by [`crate::graph::NodeGraph`]
/// and can only be changed through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<NodeId>,
    /// Child ids, back to front.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<SceneConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rectangle>,
}

impl Node {
    /// A detached node with a generated id.
    pub fn new(node_type: NodeType) -> Self {
        Self::with_id(NodeId::generate(), node_type)
    }

    /// A detached node with the given id.
    pub fn with_id(id: impl Into<NodeId>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: None,
            parent_id: None,
            children: Vec::new(),
            constraints: None,
            rect: None,
        }
    }

    /// A scene node with explicit child constraints.
    pub fn scene(id: impl Into<NodeId>, children: ChildrenConstraint) -> Self {
        Self {
            constraints: Some(SceneConstraints { children }),
            ..Self::with_id(id, NodeType::Scene)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rect(mut self, rect: Rectangle) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
