//! Read-only traversal over a [`NodeGraph`].

use crate::geometry::Rectangle;
use crate::graph::NodeGraph;
use crate::nodes::NodeId;
use crate::nodes::policy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which nodes a selector-based query returns, relative to a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Every node, in document pre-order.
    All,
    /// Siblings of the selection. Multiple selected nodes must share one
    /// parent, otherwise nothing matches. An empty selection matches all.
    Siblings,
    /// Direct children of every selected node.
    Children,
    /// Parent of every selected node that has one.
    Parent,
    /// The selection itself.
    Selection,
    /// An explicit list.
    Ids(Vec<NodeId>),
}

/// Borrowed query view over a graph.
#[derive(Debug, Clone, Copy)]
pub struct DocumentQuery<'a> {
    graph: &'a NodeGraph,
}

impl NodeGraph {
    /// Query view over this graph.
    pub fn query(&self) -> DocumentQuery<'_> {
        DocumentQuery { graph: self }
    }
}

impl<'a> DocumentQuery<'a> {
    pub fn new(graph: &'a NodeGraph) -> Self {
        Self { graph }
    }

    /// Ancestors of `id`, root first. Empty for roots and unknown ids.
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.graph.get_parent_id(id);
        while let Some(parent) = current {
            out.push(parent.clone());
            current = self.graph.get_parent_id(parent);
        }
        out.reverse();
        out
    }

    /// Number of ancestors, or `None` for an unknown id.
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.graph.contains(id).then(|| self.ancestors(id).len())
    }

    /// Whether `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.graph.get_parent_id(id);
        while let Some(parent) = current {
            if parent.as_str() == ancestor {
                return true;
            }
            current = self.graph.get_parent_id(parent);
        }
        false
    }

    /// Nodes sharing the parent of `id`, excluding `id`. Root scenes are
    /// siblings of each other.
    pub fn siblings(&self, id: &str) -> Vec<NodeId> {
        if !self.graph.contains(id) {
            return Vec::new();
        }
        let list = match self.graph.get_parent_id(id) {
            Some(parent) => self.graph.get_children(parent),
            None => self.graph.root_ids(),
        };
        list.iter().filter(|s| s.as_str() != id).cloned().collect()
    }

    /// Children of `id`. With `recursive`, every descendant in pre-order.
    pub fn children(&self, id: &str, recursive: bool) -> Vec<NodeId> {
        if !recursive {
            return self.graph.get_children(id).to_vec();
        }
        let mut out = Vec::new();
        for child in self.graph.get_children(id) {
            out.extend(self.hierarchy(child).into_iter().map(|(id, _)| id));
        }
        out
    }

    /// The root scene containing `id` (itself when it is a root).
    pub fn top_id(&self, id: &str) -> Option<NodeId> {
        let node = self.graph.get(id)?;
        Some(
            self.ancestors(id)
                .into_iter()
                .next()
                .unwrap_or_else(|| node.id.clone()),
        )
    }

    /// Pre-order walk of the subtree at `id` with depths relative to `id`.
    pub fn hierarchy(&self, id: &str) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let Some(node) = self.graph.get(id) else {
            return out;
        };
        let mut stack = vec![(&node.id, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id.clone(), depth));
            for child in self.graph.get_children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Every node in the document, roots in order, each subtree pre-order.
    pub fn all(&self) -> Vec<NodeId> {
        self.graph
            .root_ids()
            .iter()
            .flat_map(|root| self.hierarchy(root))
            .map(|(id, _)| id)
            .collect()
    }

    /// Drop selected nodes that have a selected ancestor, so transforms are
    /// applied once per subtree. Order is kept and duplicates removed.
    pub fn prune_nested(&self, selection: &[NodeId]) -> Vec<NodeId> {
        let selected: HashSet<&str> = selection.iter().map(|id| id.as_str()).collect();
        let mut seen = HashSet::new();
        selection
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter(|id| {
                !self
                    .ancestors(id)
                    .iter()
                    .any(|a| selected.contains(a.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Resolve `selector` against `selection`.
    pub fn select(&self, selection: &[NodeId], selector: &Selector) -> Vec<NodeId> {
        match selector {
            Selector::All => self.all(),
            Selector::Siblings => match selection {
                [] => self.all(),
                [one] => self.siblings(one),
                [first, rest @ ..] => {
                    let parent = self.graph.get_parent_id(first);
                    if rest.iter().all(|id| self.graph.get_parent_id(id) == parent) {
                        self.siblings(first)
                    } else {
                        Vec::new()
                    }
                }
            },
            Selector::Children => selection
                .iter()
                .flat_map(|id| self.graph.get_children(id).iter().cloned())
                .collect(),
            Selector::Parent => selection
                .iter()
                .filter_map(|id| self.graph.get_parent_id(id).cloned())
                .collect(),
            Selector::Selection => selection.to_vec(),
            Selector::Ids(ids) => ids.clone(),
        }
    }

    /// Rectangles of the given nodes, skipping unknown ids and nodes
    /// without geometry.
    pub fn rects(&self, ids: &[NodeId]) -> Vec<Rectangle> {
        ids.iter()
            .filter_map(|id| self.graph.get(id)?.rect)
            .collect()
    }

    /// Where pasted content should land for the current selection.
    ///
    /// A selected container receives the paste itself. Any other node defers
    /// to its parent when that parent is a container; otherwise the paste
    /// goes to scene level, reported as `None`. Targets are deduplicated in
    /// first-seen order, and targets that were themselves copied are dropped
    /// so content is never pasted into its own source. When nothing remains
    /// the result is a single scene-level target.
    pub fn resolve_paste_targets(
        &self,
        selection: &[NodeId],
        copied: &[NodeId],
    ) -> Vec<Option<NodeId>> {
        let copied: HashSet<&str> = copied.iter().map(|id| id.as_str()).collect();
        let mut targets: Vec<Option<NodeId>> = Vec::new();

        for id in selection {
            let target = self.paste_target(id);
            if target.as_ref().is_some_and(|t| copied.contains(t.as_str())) {
                continue;
            }
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        if targets.is_empty() {
            targets.push(None);
        }
        targets
    }

    fn paste_target(&self, id: &str) -> Option<NodeId> {
        let node = self.graph.get(id)?;
        if policy::is_paste_target(node.node_type) {
            return Some(node.id.clone());
        }
        let parent = self.graph.get(node.parent_id()?)?;
        policy::is_paste_target(parent.node_type).then(|| parent.id.clone())
    }

    /// Deepest node that is `a` or an ancestor of `a`, and likewise for `b`.
    pub fn lowest_common_ancestor(&self, a: &str, b: &str) -> Option<NodeId> {
        let mut path_a = self.ancestors(a);
        path_a.push(self.graph.get(a)?.id.clone());
        let mut path_b = self.ancestors(b);
        path_b.push(self.graph.get(b)?.id.clone());

        path_a
            .iter()
            .zip(&path_b)
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| x.clone())
    }

    /// Number of edges on the tree path between `a` and `b`.
    pub fn graph_distance(&self, a: &str, b: &str) -> Option<usize> {
        let lca = self.lowest_common_ancestor(a, b)?;
        let base = self.depth(&lca)?;
        Some(self.depth(a)? - base + self.depth(b)? - base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{ChildrenConstraint, Node, NodeType};

    // scene
    //   frame (container)
    //     title
    //     inner (container)
    //       icon
    //   group
    //     shape
    // other (scene)
    fn sample() -> NodeGraph {
        let mut graph = NodeGraph::new();
        let mut add = |id: &str, ty: NodeType, parent: Option<&str>| {
            let node = match ty {
                NodeType::Scene => Node::scene(id, ChildrenConstraint::Multiple),
                _ => Node::with_id(id, ty),
            };
            graph.insert(node, parent).unwrap();
        };
        add("scene", NodeType::Scene, None);
        add("frame", NodeType::Container, Some("scene"));
        add("title", NodeType::Text, Some("frame"));
        add("inner", NodeType::Container, Some("frame"));
        add("icon", NodeType::Vector, Some("inner"));
        add("group", NodeType::Group, Some("scene"));
        add("shape", NodeType::Rectangle, Some("group"));
        add("other", NodeType::Scene, None);
        graph
    }

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|id| NodeId::from(*id)).collect()
    }

    #[test]
    fn test_ancestors_and_depth() {
        let graph = sample();
        let q = graph.query();
        assert_eq!(q.ancestors("icon"), ids(&["scene", "frame", "inner"]));
        assert_eq!(q.depth("icon"), Some(3));
        assert_eq!(q.depth("scene"), Some(0));
        assert_eq!(q.depth("nope"), None);
        assert!(q.is_ancestor("frame", "icon"));
        assert!(!q.is_ancestor("icon", "frame"));
        assert_eq!(q.top_id("icon"), Some("scene".into()));
        assert_eq!(q.top_id("other"), Some("other".into()));
        assert_eq!(q.top_id("nope"), None);
    }

    #[test]
    fn test_siblings_and_children() {
        let graph = sample();
        let q = graph.query();
        assert_eq!(q.siblings("frame"), ids(&["group"]));
        assert_eq!(q.siblings("scene"), ids(&["other"]));
        assert_eq!(q.children("frame", false), ids(&["title", "inner"]));
        assert_eq!(q.children("frame", true), ids(&["title", "inner", "icon"]));
    }

    #[test]
    fn test_hierarchy() {
        let graph = sample();
        let h = graph.query().hierarchy("frame");
        let h: Vec<(&str, usize)> = h.iter().map(|(id, d)| (id.as_str(), *d)).collect();
        assert_eq!(h, [("frame", 0), ("title", 1), ("inner", 1), ("icon", 2)]);
    }

    #[test]
    fn test_prune_nested() {
        let graph = sample();
        let pruned = graph
            .query()
            .prune_nested(&ids(&["icon", "frame", "title", "shape", "frame"]));
        assert_eq!(pruned, ids(&["frame", "shape"]));
    }

    #[test]
    fn test_select() {
        let graph = sample();
        let q = graph.query();
        assert_eq!(q.select(&[], &Selector::All).len(), 8);
        assert_eq!(q.select(&ids(&["title"]), &Selector::Siblings), ids(&["inner"]));
        assert_eq!(
            q.select(&ids(&["title", "inner"]), &Selector::Siblings),
            ids(&["inner"])
        );
        assert!(q.select(&ids(&["title", "shape"]), &Selector::Siblings).is_empty());
        assert_eq!(
            q.select(&ids(&["frame", "group"]), &Selector::Children),
            ids(&["title", "inner", "shape"])
        );
        assert_eq!(
            q.select(&ids(&["icon", "scene"]), &Selector::Parent),
            ids(&["inner"])
        );
        assert_eq!(
            q.select(&ids(&["icon"]), &Selector::Ids(ids(&["a"]))),
            ids(&["a"])
        );
    }

    #[test]
    fn test_paste_targets() {
        let graph = sample();
        let q = graph.query();

        // Container selected: paste into it.
        assert_eq!(q.resolve_paste_targets(&ids(&["frame"]), &[]), vec![Some("frame".into())]);
        // Leaf inside a container: its parent.
        assert_eq!(q.resolve_paste_targets(&ids(&["title"]), &[]), vec![Some("frame".into())]);
        // Leaf inside a group: groups are not paste targets.
        assert_eq!(q.resolve_paste_targets(&ids(&["shape"]), &[]), vec![None]);
        // Container directly under a scene resolves to itself, group to scene level.
        assert_eq!(
            q.resolve_paste_targets(&ids(&["inner", "icon", "group", "title"]), &[]),
            vec![Some("inner".into()), None, Some("frame".into())]
        );
        // Missing nodes go to scene level.
        assert_eq!(q.resolve_paste_targets(&ids(&["ghost"]), &[]), vec![None]);
        // Empty selection.
        assert_eq!(q.resolve_paste_targets(&[], &[]), vec![None]);
    }

    #[test]
    fn test_paste_never_into_copied() {
        let graph = sample();
        let q = graph.query();
        assert_eq!(q.resolve_paste_targets(&ids(&["frame"]), &ids(&["frame"])), vec![None]);
        assert_eq!(
            q.resolve_paste_targets(&ids(&["inner", "title"]), &ids(&["inner"])),
            vec![Some("frame".into())]
        );
    }

    #[test]
    fn test_rects() {
        let mut graph = sample();
        graph
            .set_rect("title", Some(Rectangle::new(0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        let rects = graph.query().rects(&ids(&["title", "icon", "ghost"]));
        assert_eq!(rects, vec![Rectangle::new(0.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_tree_distance() {
        let graph = sample();
        let q = graph.query();
        assert_eq!(q.lowest_common_ancestor("icon", "title"), Some("frame".into()));
        assert_eq!(q.lowest_common_ancestor("frame", "icon"), Some("frame".into()));
        assert_eq!(q.lowest_common_ancestor("icon", "other"), None);
        assert_eq!(q.graph_distance("icon", "icon"), Some(0));
        assert_eq!(q.graph_distance("inner", "icon"), Some(1));
        assert_eq!(q.graph_distance("title", "inner"), Some(2));
        assert_eq!(q.graph_distance("icon", "shape"), Some(5));
    }
}
