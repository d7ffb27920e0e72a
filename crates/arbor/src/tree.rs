//! The widget tree.
//!
//! Widgets are stored in an arena keyed by [`WidgetId`], with parent-child
//! relationships, the per-node flags the focus traversal consults
//! (focusable, cyclic-focus, stop-focus), visibility/enabled state, and an
//! optional intrinsic [`Behaviour`]. Removing a widget removes its whole
//! subtree and detaches any behaviour decorators attached within it.
//!
//! The tree carries no geometry or paint state; rendering layers keep their
//! own data keyed by `WidgetId`.

use std::fmt;

use slotmap::{SlotMap, new_key_type};
use static_assertions::assert_impl_all;

use crate::behaviour::Behaviour;
use crate::decorator::DecoratorStore;

new_key_type! {
    /// A unique, stable identifier for a widget in the tree.
    ///
    /// IDs stay valid across structural changes and become invalid when the
    /// widget is removed.
    pub struct WidgetId;
}

/// Errors that can occur during tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The widget ID is invalid or has been removed.
    InvalidWidgetId,
    /// Attempted to set a widget as its own parent/ancestor.
    CircularParentage,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWidgetId => write!(f, "Invalid or removed widget ID"),
            Self::CircularParentage => {
                write!(f, "Cannot set a widget as its own parent or ancestor")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Per-widget data.
struct Node {
    /// Human-readable name for debugging and lookup.
    name: String,
    /// Parent widget (if any).
    parent: Option<WidgetId>,
    /// Child widgets, in traversal order.
    children: Vec<WidgetId>,
    /// Whether the widget can take keyboard focus.
    focusable: bool,
    /// The widget's own visibility (not considering ancestors).
    visible: bool,
    /// The widget's own enabled state (not considering ancestors).
    enabled: bool,
    /// Whether focus traversal wraps around among this widget's children.
    cyclic_focus: bool,
    /// Whether focus traversal may not ascend past this widget.
    stop_focus: bool,
    /// The widget's own event-handling slots.
    behaviour: Option<Box<dyn Behaviour>>,
}

impl Node {
    fn new(parent: Option<WidgetId>) -> Self {
        Self {
            name: String::new(),
            parent,
            children: Vec::new(),
            focusable: false,
            visible: true,
            enabled: true,
            cyclic_focus: false,
            stop_focus: false,
            behaviour: None,
        }
    }
}

/// Arena-based widget tree.
///
/// New widgets are focusable-off, visible, and enabled. Traversal order of
/// children is their insertion order; [`set_parent`](Tree::set_parent)
/// appends to the new parent's child list.
pub struct Tree {
    nodes: SlotMap<WidgetId, Node>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Insert a widget under `parent`, or as a root when `parent` is `None`.
    pub fn insert(&mut self, parent: Option<WidgetId>) -> TreeResult<WidgetId> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(parent_id) {
                return Err(TreeError::InvalidWidgetId);
            }
        }
        let id = self.nodes.insert(Node::new(parent));
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.push(id);
            }
        }
        tracing::trace!(target: "arbor::tree", ?id, ?parent, "inserted widget");
        Ok(id)
    }

    /// Remove a widget and its whole subtree.
    ///
    /// Behaviour decorators attached to removed widgets are detached in
    /// `store` (left alive, detached); intrinsic behaviours are dropped with
    /// their nodes.
    #[tracing::instrument(skip(self, store), target = "arbor::tree", level = "trace")]
    pub fn remove(&mut self, store: &mut DecoratorStore, id: WidgetId) -> TreeResult<()> {
        let descendants = self.collect_descendants(id)?;

        if let Some(parent_id) = self.nodes.get(id).and_then(|n| n.parent) {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.retain(|&child| child != id);
            }
        }

        for child_id in descendants {
            store.remove_object(child_id);
            self.nodes.remove(child_id);
        }
        store.remove_object(id);
        self.nodes.remove(id);
        Ok(())
    }

    /// Collect all descendant IDs, children before parents.
    fn collect_descendants(&self, id: WidgetId) -> TreeResult<Vec<WidgetId>> {
        let mut result = Vec::new();
        self.collect_descendants_recursive(id, &mut result)?;
        Ok(result)
    }

    fn collect_descendants_recursive(
        &self,
        id: WidgetId,
        result: &mut Vec<WidgetId>,
    ) -> TreeResult<()> {
        let node = self.nodes.get(id).ok_or(TreeError::InvalidWidgetId)?;
        for &child_id in &node.children {
            self.collect_descendants_recursive(child_id, result)?;
            result.push(child_id);
        }
        Ok(())
    }

    /// Check if a widget exists.
    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// The number of widgets in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no widgets.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reparent a widget.
    ///
    /// Passing `None` makes the widget a root. The widget is appended to the
    /// new parent's child list. Fails with [`TreeError::CircularParentage`]
    /// when the new parent lies in the widget's own subtree.
    pub fn set_parent(&mut self, id: WidgetId, new_parent: Option<WidgetId>) -> TreeResult<()> {
        if !self.nodes.contains_key(id) {
            return Err(TreeError::InvalidWidgetId);
        }

        if let Some(parent_id) = new_parent {
            if !self.nodes.contains_key(parent_id) {
                return Err(TreeError::InvalidWidgetId);
            }
            if self.is_ancestor_of(id, parent_id) {
                return Err(TreeError::CircularParentage);
            }
        }

        let old_parent = self.nodes.get(id).and_then(|n| n.parent);
        if let Some(old_parent_id) = old_parent {
            if let Some(parent_node) = self.nodes.get_mut(old_parent_id) {
                parent_node.children.retain(|&child| child != id);
            }
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = new_parent;
        }

        if let Some(parent_id) = new_parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.push(id);
            }
        }

        Ok(())
    }

    /// Check if `potential_ancestor` is `id` itself or one of its ancestors.
    fn is_ancestor_of(&self, potential_ancestor: WidgetId, id: WidgetId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|n| n.parent);
        }
        false
    }

    /// Get the parent of a widget.
    pub fn parent(&self, id: WidgetId) -> TreeResult<Option<WidgetId>> {
        self.nodes
            .get(id)
            .map(|n| n.parent)
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Get the children of a widget, in traversal order.
    pub fn children(&self, id: WidgetId) -> TreeResult<&[WidgetId]> {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// The sibling after `id` in its parent's child list.
    pub fn next_sibling(&self, id: WidgetId) -> TreeResult<Option<WidgetId>> {
        self.sibling_at_offset(id, 1)
    }

    /// The sibling before `id` in its parent's child list.
    pub fn previous_sibling(&self, id: WidgetId) -> TreeResult<Option<WidgetId>> {
        self.sibling_at_offset(id, -1)
    }

    fn sibling_at_offset(&self, id: WidgetId, offset: isize) -> TreeResult<Option<WidgetId>> {
        let node = self.nodes.get(id).ok_or(TreeError::InvalidWidgetId)?;
        let Some(parent_id) = node.parent else {
            return Ok(None);
        };
        let siblings = self.children(parent_id)?;
        let Some(pos) = siblings.iter().position(|&s| s == id) else {
            return Ok(None);
        };
        let target = pos as isize + offset;
        if target < 0 {
            return Ok(None);
        }
        Ok(siblings.get(target as usize).copied())
    }

    /// Get the widget's name.
    pub fn name(&self, id: WidgetId) -> TreeResult<&str> {
        self.nodes
            .get(id)
            .map(|n| n.name.as_str())
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Set the widget's name.
    pub fn set_name(&mut self, id: WidgetId, name: impl Into<String>) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.name = name.into())
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Find the first widget with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<WidgetId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// Whether the widget can take keyboard focus. `false` for invalid IDs.
    pub fn is_focusable(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.focusable)
    }

    /// Set whether the widget can take keyboard focus.
    pub fn set_focusable(&mut self, id: WidgetId, focusable: bool) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.focusable = focusable)
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// The widget's own visibility flag.
    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    /// Set the widget's own visibility flag.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.visible = visible)
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// The widget's own enabled flag.
    pub fn is_enabled(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.enabled)
    }

    /// Set the widget's own enabled flag.
    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.enabled = enabled)
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Whether the widget and all its ancestors are visible.
    pub fn is_effectively_visible(&self, id: WidgetId) -> bool {
        self.all_ancestors_and_self(id, |node| node.visible)
    }

    /// Whether the widget and all its ancestors are enabled.
    pub fn is_effectively_enabled(&self, id: WidgetId) -> bool {
        self.all_ancestors_and_self(id, |node| node.enabled)
    }

    fn all_ancestors_and_self(&self, id: WidgetId, pred: impl Fn(&Node) -> bool) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            let Some(node) = self.nodes.get(current_id) else {
                return false;
            };
            if !pred(node) {
                return false;
            }
            current = node.parent;
        }
        self.nodes.contains_key(id)
    }

    /// Whether focus traversal wraps among this widget's children.
    pub fn has_cyclic_focus(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.cyclic_focus)
    }

    /// Set whether focus traversal wraps among this widget's children.
    ///
    /// A cyclic widget also confines the search: focus never leaves its
    /// subtree through traversal.
    pub fn set_cyclic_focus(&mut self, id: WidgetId, cyclic: bool) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.cyclic_focus = cyclic)
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Whether focus traversal may not ascend past this widget.
    pub fn stops_focus(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.stop_focus)
    }

    /// Set whether focus traversal may not ascend past this widget.
    pub fn set_stop_focus(&mut self, id: WidgetId, stop: bool) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.stop_focus = stop)
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Install the widget's intrinsic behaviour, replacing any previous one.
    pub fn set_behaviour(
        &mut self,
        id: WidgetId,
        behaviour: Box<dyn Behaviour>,
    ) -> TreeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|n| n.behaviour = Some(behaviour))
            .ok_or(TreeError::InvalidWidgetId)
    }

    /// Remove and return the widget's intrinsic behaviour.
    pub fn take_behaviour(&mut self, id: WidgetId) -> Option<Box<dyn Behaviour>> {
        self.nodes.get_mut(id).and_then(|n| n.behaviour.take())
    }

    /// Whether the widget has an intrinsic behaviour installed.
    pub fn has_behaviour(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.behaviour.is_some())
    }

    pub(crate) fn behaviour_mut(&mut self, id: WidgetId) -> Option<&mut (dyn Behaviour + 'static)> {
        self.nodes
            .get_mut(id)
            .and_then(|n| n.behaviour.as_deref_mut())
    }

    /// Render an indented listing of the subtree rooted at `id`.
    pub fn dump(&self, id: WidgetId) -> String {
        let mut out = String::new();
        self.dump_recursive(id, 0, &mut out);
        tracing::debug!(target: "arbor::tree", "{out}");
        out
    }

    fn dump_recursive(&self, id: WidgetId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let name = if node.name.is_empty() {
            "<unnamed>"
        } else {
            &node.name
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!(
            "{name} [focusable={} visible={} enabled={} cyclic={} stop={}]\n",
            node.focusable, node.visible, node.enabled, node.cyclic_focus, node.stop_focus,
        ));
        for &child in &node.children {
            self.dump_recursive(child, depth + 1, out);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(Tree: Send);
