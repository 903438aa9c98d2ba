//! Editor session: one document, one presence tracker, one writer.
//!
//! Other threads talk to a session through a [`SessionHandle`]. Commands are
//! queued on a channel and applied in arrival order when the owning thread
//! calls [`EditorSession::process_pending`].

use crate::config::KernelConfig;
use crate::distribution::{DistributionAnalysis, analyze_distribution};
use crate::document::Document;
use crate::error::{GraphError, SessionError};
use crate::geometry::{Rational, approximate_fraction, rect};
use crate::graph::{NodeGraph, Order};
use crate::nodes::{Node, NodeId, NodeType};
use crate::presence::{PresenceEvent, PresenceRecord, PresenceTracker};
use crate::schema::SchemaAction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};

/// An edit request, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditCommand {
    Insert {
        node: Node,
        #[serde(default)]
        parent: Option<NodeId>,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Remove nodes with their subtrees.
    Remove { ids: Vec<NodeId> },
    Move {
        ids: Vec<NodeId>,
        target: NodeId,
        #[serde(default)]
        index: Option<usize>,
    },
    Reorder { id: NodeId, order: Order },
    Rename { id: NodeId, name: Option<String> },
    Schema { action: SchemaAction },
    /// Make `id` the scene that receives scene-level pastes.
    EnterScene { id: NodeId },
    Select { ids: Vec<NodeId> },
    /// Copy the selection, minus nodes nested in other selected nodes.
    Copy,
    /// Copy the selection, then remove it.
    Cut,
    Paste,
    /// Copy each selected subtree in place, right after the original.
    Duplicate,
    Undo,
    Redo,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The document or session state changed. Carries the ids that were
    /// created, removed or touched.
    Changed(Vec<NodeId>),
    Unchanged,
}

/// Subtrees captured by a copy, kept independent of later edits.
#[derive(Debug, Clone, Default)]
struct Clipboard {
    roots: Vec<NodeId>,
    nodes: HashMap<NodeId, Node>,
}

/// Sends commands to a session owned by another thread.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<EditCommand>,
}

impl SessionHandle {
    /// Queue a command. Returns `false` once the session is gone.
    pub fn send(&self, command: EditCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Owns a document and applies edits to it serially.
#[derive(Debug)]
pub struct EditorSession {
    config: KernelConfig,
    document: Document,
    presence: PresenceTracker,
    selection: Vec<NodeId>,
    scene_id: Option<NodeId>,
    clipboard: Clipboard,
    mailbox: Receiver<EditCommand>,
    tx: Sender<EditCommand>,
}

impl EditorSession {
    pub fn new(config: KernelConfig, local: PresenceRecord) -> Self {
        Self::with_document(config, Document::new(), local)
    }

    pub fn with_document(config: KernelConfig, document: Document, local: PresenceRecord) -> Self {
        let (tx, mailbox) = mpsc::channel();
        let document = document.with_history_limit(config.max_undo_history);
        let presence = PresenceTracker::new(local, config.max_visible_cursors);
        Self {
            config,
            document,
            presence,
            selection: Vec::new(),
            scene_id: None,
            clipboard: Clipboard::default(),
            mailbox,
            tx,
        }
    }

    /// A handle other threads can use to queue commands.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn presence_mut(&mut self) -> &mut PresenceTracker {
        &mut self.presence
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// The explicitly entered scene, or the first root.
    pub fn scene_id(&self) -> Option<&NodeId> {
        self.scene_id
            .as_ref()
            .or_else(|| self.document.graph().root_ids().first())
    }

    /// Apply every queued command in arrival order.
    pub fn process_pending(&mut self) -> Vec<Result<EditOutcome, SessionError>> {
        let mut results = Vec::new();
        while let Ok(command) = self.mailbox.try_recv() {
            results.push(self.apply(command));
        }
        results
    }

    /// Drain remote presence updates.
    pub fn poll_presence(&mut self) -> Vec<PresenceEvent> {
        self.presence.poll()
    }

    /// Apply one command. On error the document is left unchanged.
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome, SessionError> {
        let label = command_label(&command);
        let result = self.dispatch(command);
        match &result {
            Ok(outcome) => log::debug!("{}: {:?}", label, outcome),
            Err(e) => log::debug!("{} failed: {}", label, e),
        }
        result
    }

    fn dispatch(&mut self, command: EditCommand) -> Result<EditOutcome, SessionError> {
        match command {
            EditCommand::Insert {
                node,
                parent,
                index,
            } => {
                let id = node.id.clone();
                self.document.transact(|graph| {
                    graph.insert_at(node, parent.as_deref(), index.unwrap_or(usize::MAX))
                })?;
                Ok(EditOutcome::Changed(vec![id]))
            }
            EditCommand::Remove { ids } => {
                let ids = self.document.query().prune_nested(&ids);
                let removed = self.document.transact(|graph| {
                    let mut removed = Vec::new();
                    for id in &ids {
                        removed.extend(graph.remove(id)?);
                    }
                    Ok::<_, GraphError>(removed)
                })?;
                self.retain_existing();
                Ok(changed_if_any(removed))
            }
            EditCommand::Move { ids, target, index } => {
                self.document
                    .transact(|graph| graph.move_nodes(&ids, &target, index.unwrap_or(usize::MAX)))?;
                Ok(EditOutcome::Changed(ids))
            }
            EditCommand::Reorder { id, order } => {
                let moved = self.document.transact(|graph| graph.reorder(&id, order))?;
                Ok(if moved {
                    EditOutcome::Changed(vec![id])
                } else {
                    EditOutcome::Unchanged
                })
            }
            EditCommand::Rename { id, name } => {
                let unchanged = self
                    .document
                    .graph()
                    .get(&id)
                    .ok_or_else(|| GraphError::NotFound(id.clone()))?
                    .name
                    == name;
                if unchanged {
                    return Ok(EditOutcome::Unchanged);
                }
                self.document.transact(|graph| graph.set_name(&id, name))?;
                Ok(EditOutcome::Changed(vec![id]))
            }
            EditCommand::Schema { action } => Ok(if self.document.apply_schema_action(&action) {
                EditOutcome::Changed(Vec::new())
            } else {
                EditOutcome::Unchanged
            }),
            EditCommand::EnterScene { id } => {
                let node = self
                    .document
                    .graph()
                    .get(&id)
                    .ok_or_else(|| GraphError::NotFound(id.clone()))?;
                if node.node_type != NodeType::Scene {
                    return Err(SessionError::NotAScene(id));
                }
                self.scene_id = Some(id.clone());
                Ok(EditOutcome::Changed(vec![id]))
            }
            EditCommand::Select { ids } => {
                let graph = self.document.graph();
                let mut seen = HashSet::new();
                let selection: Vec<NodeId> = ids
                    .into_iter()
                    .filter(|id| graph.contains(id) && seen.insert(id.clone()))
                    .collect();
                if selection == self.selection {
                    return Ok(EditOutcome::Unchanged);
                }
                self.selection = selection.clone();
                Ok(EditOutcome::Changed(selection))
            }
            EditCommand::Copy => self.copy(),
            EditCommand::Cut => self.cut(),
            EditCommand::Paste => self.paste(),
            EditCommand::Duplicate => self.duplicate(),
            EditCommand::Undo => Ok(self.step_history(Document::undo)),
            EditCommand::Redo => Ok(self.step_history(Document::redo)),
        }
    }

    fn step_history(&mut self, step: fn(&mut Document) -> bool) -> EditOutcome {
        if !step(&mut self.document) {
            return EditOutcome::Unchanged;
        }
        self.retain_existing();
        EditOutcome::Changed(Vec::new())
    }

    /// Forget selected or entered nodes that no longer exist.
    fn retain_existing(&mut self) {
        let graph = self.document.graph();
        self.selection.retain(|id| graph.contains(id));
        if self.scene_id.as_ref().is_some_and(|id| !graph.contains(id)) {
            self.scene_id = None;
        }
    }

    /// Snapshot the pruned selection and the subtrees under it.
    fn capture_selection(&self) -> Clipboard {
        let query = self.document.query();
        let roots = query.prune_nested(&self.selection);
        let mut nodes = HashMap::new();
        for root in &roots {
            for id in std::iter::once(root.clone()).chain(query.children(root, true)) {
                if let Some(node) = self.document.graph().get(&id) {
                    nodes.insert(id, node.clone());
                }
            }
        }
        Clipboard { roots, nodes }
    }

    fn copy(&mut self) -> Result<EditOutcome, SessionError> {
        let captured = self.capture_selection();
        if captured.roots.is_empty() {
            return Ok(EditOutcome::Unchanged);
        }
        let roots = captured.roots.clone();
        self.clipboard = captured;
        Ok(EditOutcome::Changed(roots))
    }

    /// Copy then remove the selection as one undo step. The clipboard is only
    /// replaced once the removal succeeds.
    fn cut(&mut self) -> Result<EditOutcome, SessionError> {
        let captured = self.capture_selection();
        if captured.roots.is_empty() {
            return Ok(EditOutcome::Unchanged);
        }
        let removed = self.document.transact(|graph| {
            let mut removed = Vec::new();
            for id in &captured.roots {
                removed.extend(graph.remove(id)?);
            }
            Ok::<_, GraphError>(removed)
        })?;
        self.clipboard = captured;
        self.retain_existing();
        Ok(EditOutcome::Changed(removed))
    }

    /// Insert a fresh copy of every selected subtree directly in front of its
    /// original, under the same parent. The copies become the new selection.
    /// The clipboard is left alone.
    fn duplicate(&mut self) -> Result<EditOutcome, SessionError> {
        let captured = self.capture_selection();
        if captured.roots.is_empty() {
            return Ok(EditOutcome::Unchanged);
        }
        let duplicated = self.document.transact(|graph| {
            let mut duplicated = Vec::new();
            for root in &captured.roots {
                let parent = graph.get_parent_id(root).cloned();
                let siblings = match &parent {
                    Some(parent) => graph.get_children(parent),
                    None => graph.root_ids(),
                };
                let index = siblings
                    .iter()
                    .position(|sibling| sibling == root)
                    .map_or(usize::MAX, |pos| pos + 1);
                duplicated.push(insert_copy(graph, &captured, root, parent.as_ref(), index)?);
            }
            Ok::<_, GraphError>(duplicated)
        })?;

        self.selection = duplicated.clone();
        Ok(EditOutcome::Changed(duplicated))
    }

    /// Insert fresh copies of the clipboard at every paste target. The
    /// pasted roots become the new selection.
    fn paste(&mut self) -> Result<EditOutcome, SessionError> {
        if self.clipboard.roots.is_empty() {
            return Err(SessionError::EmptyClipboard);
        }

        let targets = self
            .document
            .query()
            .resolve_paste_targets(&self.selection, &self.clipboard.roots);
        let scene_id = self.scene_id().cloned();
        let targets = targets
            .into_iter()
            .map(|target| target.or_else(|| scene_id.clone()).ok_or(SessionError::NoScene))
            .collect::<Result<Vec<NodeId>, _>>()?;

        let clipboard = &self.clipboard;
        let pasted = self.document.transact(|graph| {
            let mut pasted = Vec::new();
            for target in &targets {
                for root in &clipboard.roots {
                    pasted.push(insert_copy(graph, clipboard, root, Some(target), usize::MAX)?);
                }
            }
            Ok::<_, GraphError>(pasted)
        })?;

        self.selection = pasted.clone();
        Ok(EditOutcome::Changed(pasted))
    }

    /// Spacing analysis of the selected nodes' rectangles.
    pub fn analyze_selection(&self) -> DistributionAnalysis {
        let rects = self.document.query().rects(&self.selection);
        analyze_distribution(&rects, self.config.gap_tolerance)
    }

    /// Width to height ratio of the selection bounds, simplified.
    pub fn selection_aspect_ratio(&self) -> Option<Rational> {
        let rects = self.document.query().rects(&self.selection);
        let bounds = rect::union(&rects)?;
        approximate_fraction(bounds.width / bounds.height, self.config.max_denominator)
    }
}

/// Insert a copy of the clipboard subtree at `id` under `parent` (or as a
/// root scene) at `index`, giving every node a fresh id. Returns the new
/// root id.
fn insert_copy(
    graph: &mut NodeGraph,
    clipboard: &Clipboard,
    id: &NodeId,
    parent: Option<&NodeId>,
    index: usize,
) -> Result<NodeId, GraphError> {
    let source = clipboard
        .nodes
        .get(id)
        .ok_or_else(|| GraphError::NotFound(id.clone()))?;
    let new_id = NodeId::generate();
    let copy = Node {
        id: new_id.clone(),
        ..source.clone()
    };
    graph.insert_at(copy, parent.map(NodeId::as_str), index)?;
    for child in source.children() {
        insert_copy(graph, clipboard, child, Some(&new_id), usize::MAX)?;
    }
    Ok(new_id)
}

fn changed_if_any(ids: Vec<NodeId>) -> EditOutcome {
    if ids.is_empty() {
        EditOutcome::Unchanged
    } else {
        EditOutcome::Changed(ids)
    }
}

fn command_label(command: &EditCommand) -> &'static str {
    match command {
        EditCommand::Insert { .. } => "insert",
        EditCommand::Remove { .. } => "remove",
        EditCommand::Move { .. } => "move",
        EditCommand::Reorder { .. } => "reorder",
        EditCommand::Rename { .. } => "rename",
        EditCommand::Schema { .. } => "schema",
        EditCommand::EnterScene { .. } => "enter_scene",
        EditCommand::Select { .. } => "select",
        EditCommand::Copy => "copy",
        EditCommand::Cut => "cut",
        EditCommand::Paste => "paste",
        EditCommand::Duplicate => "duplicate",
        EditCommand::Undo => "undo",
        EditCommand::Redo => "redo",
    }
}
