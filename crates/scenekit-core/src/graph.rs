//! Node arena with validated parent/child edges.

use crate::error::{GraphError, GraphResult, PolicyViolation};
use crate::geometry::Rectangle;
use crate::nodes::policy::{self, Degree};
use crate::nodes::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Target position for [`NodeGraph::reorder`] within a sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Topmost (last in the list).
    Front,
    /// Bottommost (first in the list).
    Back,
    /// One step towards the front.
    Forward,
    /// One step towards the back.
    Backward,
    /// Explicit position, clamped to the list.
    Index(usize),
}

/// The scene graph: nodes keyed by id plus the ordered list of root scenes.
///
/// Every mutation validates against [`policy`] before touching the arena,
/// so a rejected operation leaves the graph exactly as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeGraph {
    nodes: HashMap<NodeId, Node>,
    root_ids: Vec<NodeId>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Root scenes, in document order.
    pub fn root_ids(&self) -> &[NodeId] {
        &self.root_ids
    }

    pub fn get_parent_id(&self, id: &str) -> Option<&NodeId> {
        self.nodes.get(id)?.parent_id.as_ref()
    }

    /// Children of `id`, back to front. Empty when `id` is unknown.
    pub fn get_children(&self, id: &str) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_count(&self, id: &str) -> usize {
        self.get_children(id).len()
    }

    /// Append `node` under `parent`, or as a root scene when `parent` is
    /// `None`. Any children listed on `node` are discarded.
    pub fn insert(&mut self, node: Node, parent: Option<&str>) -> GraphResult<()> {
        self.insert_at(node, parent, usize::MAX)
    }

    /// Insert `node` at `index` among its new siblings. The index is clamped.
    pub fn insert_at(&mut self, mut node: Node, parent: Option<&str>, index: usize) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        node.children.clear();

        match parent {
            None => {
                if node.node_type != NodeType::Scene {
                    return Err(rejected(PolicyViolation::NotAllowedAtRoot(node.id)));
                }
                node.parent_id = None;
                let index = index.min(self.root_ids.len());
                self.root_ids.insert(index, node.id.clone());
            }
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .get_mut(parent_id)
                    .ok_or_else(|| GraphError::NotFound(parent_id.into()))?;
                check_link(parent, &node).map_err(rejected)?;
                check_degree(parent, parent.children.len(), 1).map_err(rejected)?;

                let index = index.min(parent.children.len());
                parent.children.insert(index, node.id.clone());
                node.parent_id = Some(parent.id.clone());
            }
        }

        log::debug!("Inserted {} node {}", node.node_type, node.id);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove `id` and its whole subtree.
    ///
    /// Returns the removed ids in post-order: descendants first, `id` last.
    pub fn remove(&mut self, id: &str) -> GraphResult<Vec<NodeId>> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NotFound(id.into()));
        }

        let mut removed = Vec::new();
        self.collect_post_order(id, &mut removed);
        self.detach(id);
        for node_id in &removed {
            self.nodes.remove(node_id);
        }

        log::debug!("Removed {} node(s) under {}", removed.len(), id);
        Ok(removed)
    }

    fn collect_post_order(&self, id: &str, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        for child in &node.children {
            self.collect_post_order(child, out);
        }
        out.push(node.id.clone());
    }

    /// Unlink `id` from its parent's child list (or the root list).
    fn detach(&mut self, id: &str) {
        match self.get_parent_id(id).cloned() {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.children.retain(|child| child.as_str() != id);
                }
            }
            None => self.root_ids.retain(|root| root.as_str() != id),
        }
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.get_parent_id(id);
        while let Some(parent) = current {
            if parent.as_str() == ancestor {
                return true;
            }
            current = self.get_parent_id(parent);
        }
        false
    }

    /// Re-parent `ids` under `target`, starting at `index` in its child list.
    ///
    /// All nodes are validated before any edge changes: either every node
    /// moves or none does. The index counts positions after the moved nodes
    /// have been taken out of `target`, and is clamped. Duplicate ids are
    /// moved once.
    pub fn move_nodes(&mut self, ids: &[NodeId], target: &str, index: usize) -> GraphResult<()> {
        let target_node = self
            .nodes
            .get(target)
            .ok_or_else(|| GraphError::NotFound(target.into()))?;

        let mut seen = HashSet::new();
        let ids: Vec<&NodeId> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        for id in &ids {
            let node = self
                .nodes
                .get(id.as_str())
                .ok_or_else(|| GraphError::NotFound((*id).clone()))?;
            check_link(target_node, node).map_err(rejected)?;
            if self.is_ancestor(id, target) {
                return Err(rejected(PolicyViolation::Cycle {
                    node: (*id).clone(),
                    target: target_node.id.clone(),
                }));
            }
        }

        let staying = target_node
            .children
            .iter()
            .filter(|child| !seen.contains(child.as_str()))
            .count();
        check_degree(target_node, staying, ids.len()).map_err(rejected)?;

        let target_id = target_node.id.clone();
        for id in &ids {
            self.detach(id);
            if let Some(node) = self.nodes.get_mut(id.as_str()) {
                node.parent_id = Some(target_id.clone());
            }
        }
        if let Some(target_node) = self.nodes.get_mut(target) {
            let at = index.min(target_node.children.len());
            for (offset, id) in ids.iter().enumerate() {
                target_node.children.insert(at + offset, (*id).clone());
            }
        }

        log::debug!("Moved {} node(s) under {}", ids.len(), target_id);
        Ok(())
    }

    /// Change the position of `id` among its siblings.
    ///
    /// Returns `false` when the node is already where `order` would put it.
    pub fn reorder(&mut self, id: &str, order: Order) -> GraphResult<bool> {
        let parent_id = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.into()))?
            .parent_id
            .clone();
        let siblings = match &parent_id {
            Some(parent_id) => {
                &mut self
                    .nodes
                    .get_mut(parent_id)
                    .ok_or_else(|| GraphError::NotFound(parent_id.clone()))?
                    .children
            }
            None => &mut self.root_ids,
        };
        let Some(pos) = siblings.iter().position(|s| s.as_str() == id) else {
            return Err(GraphError::NotFound(id.into()));
        };

        let last = siblings.len() - 1;
        let to = match order {
            Order::Front => last,
            Order::Back => 0,
            Order::Forward => (pos + 1).min(last),
            Order::Backward => pos.saturating_sub(1),
            Order::Index(index) => index.min(last),
        };
        if to == pos {
            return Ok(false);
        }

        let moved = siblings.remove(pos);
        siblings.insert(to, moved);
        Ok(true)
    }

    pub fn set_name(&mut self, id: &str, name: Option<String>) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.into()))?;
        node.name = name;
        Ok(())
    }

    pub fn set_rect(&mut self, id: &str, rect: Option<Rectangle>) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.into()))?;
        node.rect = rect;
        Ok(())
    }
}

fn check_link(parent: &Node, child: &Node) -> Result<(), PolicyViolation> {
    if !policy::can_be_child(child.node_type) {
        return Err(PolicyViolation::CannotBeChild(child.id.clone()));
    }
    if !policy::can_be_parent(parent.node_type) {
        return Err(PolicyViolation::CannotBeParent(parent.id.clone()));
    }
    if !policy::can_link(parent, child) {
        return Err(PolicyViolation::LinkNotAllowed {
            parent: parent.id.clone(),
            child: child.id.clone(),
        });
    }
    Ok(())
}

/// Whether `parent` can take `incoming` more children on top of the
/// `staying` ones it keeps.
fn check_degree(parent: &Node, staying: usize, incoming: usize) -> Result<(), PolicyViolation> {
    let degree = policy::max_out_degree(parent);
    match degree {
        Degree::Bounded(max) if !degree.admits(staying + incoming) => {
            Err(PolicyViolation::DegreeExceeded {
                parent: parent.id.clone(),
                count: parent.children.len(),
                max,
            })
        }
        Degree::Bounded(_) | Degree::Unbounded => Ok(()),
    }
}

fn rejected(violation: PolicyViolation) -> GraphError {
    log::debug!("Rejected edge: {}", violation);
    violation.into()
}
