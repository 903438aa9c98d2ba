//! Document state, snapshot import/export and undo/redo history.

use crate::config::MAX_UNDO_HISTORY;
use crate::error::DocumentError;
use crate::graph::NodeGraph;
use crate::nodes::{Node, NodeId};
use crate::query::DocumentQuery;
use crate::schema::{self, PropertySchema, SchemaAction};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Serialized form of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub root_ids: Vec<NodeId>,
    pub nodes: HashMap<NodeId, Node>,
    #[serde(default)]
    pub properties: PropertySchema,
}

/// A point in the undo history.
#[derive(Debug, Clone)]
struct Revision {
    graph: NodeGraph,
    properties: PropertySchema,
}

/// A scene document: the node graph plus its property schema.
#[derive(Debug, Clone)]
pub struct Document {
    graph: NodeGraph,
    properties: PropertySchema,
    undo_stack: Vec<Revision>,
    redo_stack: Vec<Revision>,
    max_undo_history: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            graph: NodeGraph::new(),
            properties: PropertySchema::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo_history: MAX_UNDO_HISTORY,
        }
    }

    pub fn with_history_limit(mut self, max_undo_history: usize) -> Self {
        self.max_undo_history = max_undo_history;
        self.trim_history();
        self
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Direct access to the graph. Call [`Document::push_undo`] first for
    /// the change to be undoable.
    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn properties(&self) -> &PropertySchema {
        &self.properties
    }

    pub fn query(&self) -> DocumentQuery<'_> {
        self.graph.query()
    }

    /// Rebuild a document from a snapshot, re-checking every structural rule.
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Result<Self, DocumentError> {
        let graph = build_graph(&snapshot).inspect_err(|e| {
            log::warn!("Rejected document snapshot: {}", e);
        })?;
        Ok(Self {
            graph,
            properties: snapshot.properties,
            ..Self::new()
        })
    }

    pub fn to_snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            root_ids: self.graph.root_ids().to_vec(),
            nodes: self
                .graph
                .iter()
                .map(|node| (node.id.clone(), node.clone()))
                .collect(),
            properties: self.properties.clone(),
        }
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Deserialize and validate a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let snapshot: DocumentSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    fn revision(&self) -> Revision {
        Revision {
            graph: self.graph.clone(),
            properties: self.properties.clone(),
        }
    }

    fn restore(&mut self, revision: Revision) {
        self.graph = revision.graph;
        self.properties = revision.properties;
    }

    fn record(&mut self, revision: Revision) {
        self.undo_stack.push(revision);
        self.redo_stack.clear();
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if self.undo_stack.len() > self.max_undo_history {
            let excess = self.undo_stack.len() - self.max_undo_history;
            self.undo_stack.drain(..excess);
        }
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let revision = self.revision();
        self.record(revision);
    }

    /// Undo the last change. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(revision) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.revision();
        self.redo_stack.push(current);
        self.restore(revision);
        true
    }

    /// Redo the last undone change. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(revision) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.revision();
        self.undo_stack.push(current);
        self.restore(revision);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Run `edit` against the graph as one undoable step.
    ///
    /// On error the graph is restored. A history entry is recorded only when
    /// the edit succeeded and actually changed the graph.
    pub fn transact<T, E>(
        &mut self,
        edit: impl FnOnce(&mut NodeGraph) -> Result<T, E>,
    ) -> Result<T, E> {
        let before = self.revision();
        match edit(&mut self.graph) {
            Ok(value) => {
                if before.graph != self.graph {
                    self.record(before);
                }
                Ok(value)
            }
            Err(e) => {
                self.restore(before);
                Err(e)
            }
        }
    }

    /// Apply a schema action. Returns whether the schema changed; no-ops
    /// leave the history untouched.
    pub fn apply_schema_action(&mut self, action: &SchemaAction) -> bool {
        let next = schema::reduce(&self.properties, action);
        if next == self.properties {
            return false;
        }
        self.push_undo();
        self.properties = next;
        true
    }
}

/// Insert nodes breadth-first from the roots so every edge passes the
/// graph's own checks.
fn build_graph(snapshot: &DocumentSnapshot) -> Result<NodeGraph, DocumentError> {
    for (key, node) in &snapshot.nodes {
        if key != &node.id {
            return Err(DocumentError::InvalidSnapshot(format!(
                "node stored under '{}' has id '{}'",
                key, node.id
            )));
        }
    }

    let mut graph = NodeGraph::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&NodeId, Option<&NodeId>)> =
        snapshot.root_ids.iter().map(|id| (id, None)).collect();

    while let Some((id, parent)) = queue.pop_front() {
        let node = snapshot.nodes.get(id).ok_or_else(|| {
            DocumentError::InvalidSnapshot(match parent {
                Some(parent) => format!("'{}' lists missing child '{}'", parent, id),
                None => format!("missing root '{}'", id),
            })
        })?;
        if node.parent_id.as_ref() != parent {
            return Err(DocumentError::InvalidSnapshot(format!(
                "'{}' records parent {:?} but is listed under {:?}",
                id,
                node.parent_id.as_deref(),
                parent.map(NodeId::as_str)
            )));
        }
        if !visited.insert(id.as_str()) {
            return Err(DocumentError::InvalidSnapshot(format!(
                "'{}' is listed more than once",
                id
            )));
        }

        graph.insert(node.clone(), parent.map(NodeId::as_str))?;
        queue.extend(node.children.iter().map(|child| (child, Some(id))));
    }

    if visited.len() != snapshot.nodes.len() {
        let mut orphans: Vec<&str> = snapshot
            .nodes
            .keys()
            .map(NodeId::as_str)
            .filter(|id| !visited.contains(id))
            .collect();
        orphans.sort_unstable();
        return Err(DocumentError::InvalidSnapshot(format!(
            "unreachable nodes: {}",
            orphans.join(", ")
        )));
    }

    Ok(graph)
}
