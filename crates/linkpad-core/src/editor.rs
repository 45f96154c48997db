#![forbid(unsafe_code)]

//! Command interface over the editable graph.
//!
//! [`Editor`] is the only way to mutate a [`GraphState`]. It also owns the
//! transient editor state that is never persisted: node selection, the link
//! currently being dragged, the palette drop preview, and the active
//! "add on click" kind.
//!
//! Every command that changes something visible raises the redraw flag; the
//! host drains it with [`Editor::take_redraw`] on its next frame.

use std::collections::BTreeSet;

use crate::geometry::Point;
use crate::graph::{GraphState, Link, Node, NodeKind, NodeRef};

/// Where a palette item would land if released now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropPreview {
    pub kind: NodeKind,
    pub position: Point,
}

/// Mutable editor session around one [`GraphState`].
#[derive(Debug, Clone, Default)]
pub struct Editor {
    state: GraphState,
    selection: BTreeSet<usize>,
    pending_link: Option<Link>,
    drop_preview: Option<DropPreview>,
    add_on_click: Option<NodeKind>,
    redraw: bool,
}

impl Editor {
    /// Wrap an existing state with empty transient state.
    #[must_use]
    pub fn new(state: GraphState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Persisted state, read-only.
    #[must_use]
    pub const fn state(&self) -> &GraphState {
        &self.state
    }

    #[must_use]
    pub fn is_selected(&self, node: NodeRef) -> bool {
        self.selection.contains(&node.index())
    }

    /// Selected nodes in sequence order.
    pub fn selection(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.selection.iter().copied().map(NodeRef)
    }

    #[must_use]
    pub const fn pending_link(&self) -> Option<&Link> {
        self.pending_link.as_ref()
    }

    #[must_use]
    pub const fn drop_preview(&self) -> Option<DropPreview> {
        self.drop_preview
    }

    #[must_use]
    pub const fn add_on_click(&self) -> Option<NodeKind> {
        self.add_on_click
    }

    /// Consume the redraw request raised by earlier commands.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Append a node; returns its reference.
    pub fn add_node(&mut self, node: Node) -> NodeRef {
        let node_ref = NodeRef(self.state.nodes.len());
        tracing::debug!(kind = %node.kind(), index = node_ref.index(), "add node");
        self.state.nodes.push(node);
        self.redraw = true;
        node_ref
    }

    /// Select `node`. Without `additive`, the previous selection is replaced.
    ///
    /// Returns `false` if `node` dangles.
    pub fn select(&mut self, node: NodeRef, additive: bool) -> bool {
        if self.state.node(node).is_none() {
            return false;
        }
        if !additive {
            self.selection.clear();
        }
        self.selection.insert(node.index());
        self.redraw = true;
        true
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.redraw = true;
        }
    }

    /// Remove every selected node, preserving the order of the rest.
    ///
    /// Pending link ends that pointed at removed nodes become `None`; the
    /// others are renumbered. Returns the number of nodes removed.
    pub fn remove_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let removed = std::mem::take(&mut self.selection);
        let mut index = 0;
        self.state.nodes.retain(|_| {
            let keep = !removed.contains(&index);
            index += 1;
            keep
        });

        if let Some(link) = self.pending_link.as_mut() {
            link.parent = link.parent.and_then(|r| remap_after_removal(r, &removed));
            link.child = link.child.and_then(|r| remap_after_removal(r, &removed));
        }

        tracing::debug!(
            removed = removed.len(),
            remaining = self.state.nodes.len(),
            "remove selected"
        );
        self.redraw = true;
        removed.len()
    }

    /// Show, move, or (with `None`) clear the palette drop preview.
    pub fn set_drop_preview(&mut self, preview: Option<DropPreview>) {
        if self.drop_preview != preview {
            self.drop_preview = preview;
            self.redraw = true;
        }
    }

    /// Materialize the current drop preview as a node with default parameters.
    ///
    /// Without a preview (the last hover was not over the canvas) this is a
    /// no-op returning `None`.
    pub fn commit_drop(&mut self) -> Option<NodeRef> {
        let preview = self.drop_preview.take()?;
        Some(self.add_node(Node::with_defaults(preview.kind, preview.position)))
    }

    /// Arm (or with `None`, disarm) click-to-add for a palette kind.
    pub fn set_add_on_click(&mut self, kind: Option<NodeKind>) {
        if self.add_on_click != kind {
            self.add_on_click = kind;
            self.redraw = true;
        }
    }

    /// A click on empty canvas; adds a node if click-to-add is armed.
    ///
    /// The armed kind stays active so repeated clicks keep adding.
    pub fn click_canvas(&mut self, at: Point) -> Option<NodeRef> {
        let kind = self.add_on_click?;
        Some(self.add_node(Node::with_defaults(kind, at)))
    }

    /// Start dragging a link from `from`, optionally anchored on `parent`.
    pub fn begin_link(&mut self, parent: Option<NodeRef>, from: Point) {
        self.pending_link = Some(Link::starting_at(parent, from));
        self.redraw = true;
    }

    /// Move the free end of the pending link.
    pub fn drag_link_to(&mut self, to: Point) {
        if let Some(link) = self.pending_link.as_mut() {
            link.x2 = to.x;
            link.y2 = to.y;
            self.redraw = true;
        }
    }

    /// Attach (or detach, with `None`) the child end of the pending link.
    pub fn attach_link_child(&mut self, child: Option<NodeRef>) {
        if let Some(link) = self.pending_link.as_mut() {
            link.child = child;
            self.redraw = true;
        }
    }

    /// Finish the link gesture, handing the link to the caller.
    pub fn take_link(&mut self) -> Option<Link> {
        let link = self.pending_link.take();
        if link.is_some() {
            self.redraw = true;
        }
        link
    }

    /// Replace the persisted state wholesale (e.g. after decoding a share token).
    ///
    /// All transient state refers to the old node sequence and is cleared.
    pub fn replace_state(&mut self, state: GraphState) {
        self.state = state;
        self.selection.clear();
        self.pending_link = None;
        self.drop_preview = None;
        self.redraw = true;
    }
}

fn remap_after_removal(node: NodeRef, removed: &BTreeSet<usize>) -> Option<NodeRef> {
    if removed.contains(&node.index()) {
        return None;
    }
    let shift = removed.range(..node.index()).count();
    Some(NodeRef(node.index() - shift))
}
