//! SceneKit Core Library
//!
//! Scene graph, structural policy and geometry kernel for the SceneKit
//! canvas editor. Platform-agnostic: no rendering, no I/O beyond config files.

pub mod config;
pub mod distribution;
pub mod document;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod nodes;
pub mod presence;
pub mod query;
pub mod schema;
pub mod session;

pub use config::KernelConfig;
pub use distribution::{DistributionAnalysis, GapAnalysis, analyze_distribution};
pub use document::{Document, DocumentSnapshot};
pub use error::{ConfigError, DocumentError, GraphError, GraphResult, PolicyViolation, SessionError};
pub use geometry::{Axis, Measurement, Rational, Rectangle, Vector2, approximate_fraction, measure};
pub use graph::{NodeGraph, Order};
pub use nodes::{ChildrenConstraint, Node, NodeCategory, NodeId, NodeType, SceneConstraints};
pub use presence::{
    CursorLocation, CursorPalette, PresenceEvent, PresenceFeed, PresenceRecord, PresenceTracker,
    SerializableColor,
};
pub use query::{DocumentQuery, Selector};
pub use schema::{PropertyDefinition, PropertySchema, SchemaAction};
pub use session::{EditCommand, EditOutcome, EditorSession, SessionHandle};
