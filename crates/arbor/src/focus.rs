//! Keyboard focus management and traversal.
//!
//! One widget at a time holds focus. Traversal walks the tree in pre-order
//! among focusable, visible, enabled widgets: descend into children first,
//! then later siblings, then ascend. Two per-widget flags shape the walk:
//! a *cyclic* container wraps the search around among its children and never
//! lets it escape, and a *stop* container refuses to let the search ascend
//! past it.
//!
//! The search itself only reads the tree. Widgets learn about focus changes
//! through their behaviour slots and through the
//! [`focus_changed`](FocusManager::focus_changed) signal after the move is
//! committed.

use arbor_core::Signal;
use static_assertions::assert_impl_all;

use crate::decorator::DecoratorStore;
use crate::tree::{Tree, WidgetId};

/// Payload of the [`FocusManager::focus_changed`] signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    /// The widget that lost focus, if any.
    pub old: Option<WidgetId>,
    /// The widget that gained focus, if any.
    pub new: Option<WidgetId>,
}

/// Tracks the focused widget and moves focus through the tree.
pub struct FocusManager {
    focused: Option<WidgetId>,
    focus_changed: Signal<FocusChange>,
}

impl FocusManager {
    /// Create a manager with nothing focused.
    pub fn new() -> Self {
        Self {
            focused: None,
            focus_changed: Signal::new(),
        }
    }

    /// The currently focused widget.
    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    /// Whether `id` currently holds focus.
    pub fn has_focus(&self, id: WidgetId) -> bool {
        self.focused == Some(id)
    }

    /// Emitted after every committed focus change.
    pub fn focus_changed(&self) -> &Signal<FocusChange> {
        &self.focus_changed
    }

    /// Give focus to `id`.
    ///
    /// Fails (returns `false`) when the widget is missing, not focusable, or
    /// not effectively visible and enabled. Focusing the already-focused
    /// widget is a no-op that succeeds. The old widget is notified of the
    /// loss before the new one is notified of the gain.
    pub fn set_focus(&mut self, tree: &mut Tree, store: &mut DecoratorStore, id: WidgetId) -> bool {
        if !tree.contains(id)
            || !tree.is_focusable(id)
            || !tree.is_effectively_visible(id)
            || !tree.is_effectively_enabled(id)
        {
            return false;
        }
        if self.focused == Some(id) {
            return true;
        }
        let old = self.focused;
        if let Some(old_id) = old {
            Self::notify(tree, store, old_id, false);
        }
        self.focused = Some(id);
        Self::notify(tree, store, id, true);
        tracing::trace!(target: "arbor::focus", ?old, new = ?id, "focus moved");
        self.focus_changed.emit(&FocusChange {
            old,
            new: Some(id),
        });
        true
    }

    /// Drop focus entirely, notifying the previously focused widget.
    pub fn clear_focus(&mut self, tree: &mut Tree, store: &mut DecoratorStore) {
        let Some(old_id) = self.focused.take() else {
            return;
        };
        Self::notify(tree, store, old_id, false);
        self.focus_changed.emit(&FocusChange {
            old: Some(old_id),
            new: None,
        });
    }

    /// Move focus to the next widget in traversal order under `root`.
    ///
    /// Falls back to the first eligible widget in the subtree when nothing
    /// is focused or the focused widget left the subtree. Returns `false`
    /// when the search terminates without a new widget, including when it
    /// comes back around to the focused widget itself.
    pub fn focus_next(
        &mut self,
        tree: &mut Tree,
        store: &mut DecoratorStore,
        root: WidgetId,
    ) -> bool {
        self.advance(tree, store, root, Direction::Forward)
    }

    /// Move focus to the previous widget in traversal order under `root`.
    ///
    /// The mirror of [`focus_next`](Self::focus_next).
    pub fn focus_previous(
        &mut self,
        tree: &mut Tree,
        store: &mut DecoratorStore,
        root: WidgetId,
    ) -> bool {
        self.advance(tree, store, root, Direction::Backward)
    }

    /// Focus the first eligible widget in the subtree under `root`.
    pub fn focus_any(
        &mut self,
        tree: &mut Tree,
        store: &mut DecoratorStore,
        root: WidgetId,
    ) -> bool {
        match first_in_subtree(tree, root) {
            Some(id) => self.set_focus(tree, store, id),
            None => false,
        }
    }

    fn advance(
        &mut self,
        tree: &mut Tree,
        store: &mut DecoratorStore,
        root: WidgetId,
        direction: Direction,
    ) -> bool {
        if !tree.contains(root) {
            return false;
        }
        let start = self
            .focused
            .filter(|&focused| tree.contains(focused) && is_in_subtree(tree, focused, root));
        let candidate = match start {
            Some(start) => match direction {
                Direction::Forward => next_candidate(tree, start, root),
                Direction::Backward => previous_candidate(tree, start, root),
            },
            None => match direction {
                Direction::Forward => first_in_subtree(tree, root),
                Direction::Backward => last_in_subtree(tree, root),
            },
        };
        match candidate {
            Some(id) if Some(id) == self.focused => false,
            Some(id) => self.set_focus(tree, store, id),
            None => false,
        }
    }

    /// Deliver a focus gain/loss to a widget's decorator chain and intrinsic
    /// behaviour.
    fn notify(tree: &mut Tree, store: &mut DecoratorStore, id: WidgetId, gained: bool) {
        if let Some(decorator) = store.decorator_of(id) {
            store.notify_focus(decorator, gained);
        }
        if let Some(behaviour) = tree.behaviour_mut(id) {
            if gained {
                behaviour.on_get_focus();
            } else {
                behaviour.on_lose_focus();
            }
        }
    }
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(FocusManager: Send);

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn is_in_subtree(tree: &Tree, id: WidgetId, root: WidgetId) -> bool {
    let mut current = Some(id);
    while let Some(current_id) = current {
        if current_id == root {
            return true;
        }
        current = tree.parent(current_id).ok().flatten();
    }
    false
}

/// Whether the widget itself can take focus, by its own flags. Ancestor
/// state is covered by pruning during the walk.
fn takes_focus(tree: &Tree, id: WidgetId) -> bool {
    tree.is_focusable(id) && tree.is_visible(id) && tree.is_enabled(id)
}

/// First eligible widget in pre-order under `id`, pruning invisible or
/// disabled subtrees.
fn first_in_subtree(tree: &Tree, id: WidgetId) -> Option<WidgetId> {
    if !tree.is_visible(id) || !tree.is_enabled(id) {
        return None;
    }
    if tree.is_focusable(id) {
        return Some(id);
    }
    for &child in tree.children(id).ok()? {
        if let Some(hit) = first_in_subtree(tree, child) {
            return Some(hit);
        }
    }
    None
}

/// Last eligible widget in pre-order under `id` (the first one met walking
/// the subtree backward).
fn last_in_subtree(tree: &Tree, id: WidgetId) -> Option<WidgetId> {
    if !tree.is_visible(id) || !tree.is_enabled(id) {
        return None;
    }
    for &child in tree.children(id).ok()?.iter().rev() {
        if let Some(hit) = last_in_subtree(tree, child) {
            return Some(hit);
        }
    }
    if tree.is_focusable(id) {
        return Some(id);
    }
    None
}

/// The widget after `start` in traversal order, confined to `root`'s
/// subtree. Descends first, then later siblings, then ascends; cyclic
/// containers wrap once instead of releasing the search, stop containers
/// end it.
fn next_candidate(tree: &Tree, start: WidgetId, root: WidgetId) -> Option<WidgetId> {
    for &child in tree.children(start).ok()? {
        if let Some(hit) = first_in_subtree(tree, child) {
            return Some(hit);
        }
    }
    let mut current = start;
    loop {
        if current == root {
            return if tree.has_cyclic_focus(root) {
                first_in_subtree(tree, root)
            } else {
                None
            };
        }
        let parent = tree.parent(current).ok().flatten()?;
        let siblings = tree.children(parent).ok()?;
        let pos = siblings.iter().position(|&s| s == current)?;
        for &sibling in &siblings[pos + 1..] {
            if let Some(hit) = first_in_subtree(tree, sibling) {
                return Some(hit);
            }
        }
        if tree.has_cyclic_focus(parent) {
            for &sibling in &siblings[..=pos] {
                if let Some(hit) = first_in_subtree(tree, sibling) {
                    return Some(hit);
                }
            }
            return None;
        }
        if tree.stops_focus(parent) {
            return None;
        }
        current = parent;
    }
}

/// The widget before `start` in traversal order, confined to `root`'s
/// subtree. Earlier siblings are searched back-to-front; the parent itself
/// precedes its children, so it is a candidate before the search ascends.
fn previous_candidate(tree: &Tree, start: WidgetId, root: WidgetId) -> Option<WidgetId> {
    let mut current = start;
    loop {
        if current == root {
            return if tree.has_cyclic_focus(root) {
                last_in_subtree(tree, root)
            } else {
                None
            };
        }
        let parent = tree.parent(current).ok().flatten()?;
        let siblings = tree.children(parent).ok()?;
        let pos = siblings.iter().position(|&s| s == current)?;
        for &sibling in siblings[..pos].iter().rev() {
            if let Some(hit) = last_in_subtree(tree, sibling) {
                return Some(hit);
            }
        }
        if tree.has_cyclic_focus(parent) {
            for &sibling in siblings[pos..].iter().rev() {
                if let Some(hit) = last_in_subtree(tree, sibling) {
                    return Some(hit);
                }
            }
            return None;
        }
        if takes_focus(tree, parent) {
            return Some(parent);
        }
        if tree.stops_focus(parent) {
            return None;
        }
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::behaviour::Behaviour;

    /// Records gain/lose notifications into a shared log.
    #[derive(Clone)]
    struct FocusSpy {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Behaviour for FocusSpy {
        fn on_get_focus(&mut self) {
            self.log.lock().push(format!("{}:get", self.name));
        }

        fn on_lose_focus(&mut self) {
            self.log.lock().push(format!("{}:lose", self.name));
        }

        fn clone_behaviour(&self) -> Box<dyn Behaviour> {
            Box::new(self.clone())
        }
    }

    /// root -> a, b(b1, b2), c, all leaves focusable.
    fn sample_tree() -> (Tree, WidgetId, [WidgetId; 5]) {
        let mut tree = Tree::new();
        let root = tree.insert(None).unwrap();
        let a = tree.insert(Some(root)).unwrap();
        let b = tree.insert(Some(root)).unwrap();
        let b1 = tree.insert(Some(b)).unwrap();
        let b2 = tree.insert(Some(b)).unwrap();
        let c = tree.insert(Some(root)).unwrap();
        for id in [a, b1, b2, c] {
            tree.set_focusable(id, true).unwrap();
        }
        (tree, root, [a, b, b1, b2, c])
    }

    #[test]
    fn test_set_focus_requires_eligibility() {
        let (mut tree, root, [a, ..]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        assert!(!focus.set_focus(&mut tree, &mut store, root), "not focusable");
        assert!(focus.set_focus(&mut tree, &mut store, a));
        assert_eq!(focus.focused(), Some(a));
        assert!(focus.has_focus(a));

        tree.set_visible(a, false).unwrap();
        let other = tree.insert(Some(root)).unwrap();
        tree.set_focusable(other, true).unwrap();
        tree.set_enabled(other, false).unwrap();
        assert!(!focus.set_focus(&mut tree, &mut store, other));
        // Failure leaves the current focus alone.
        assert_eq!(focus.focused(), Some(a));
    }

    #[test]
    fn test_lose_before_get_notification_order() {
        let (mut tree, _root, [a, _b, b1, ..]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        tree.set_behaviour(
            a,
            Box::new(FocusSpy {
                name: "a",
                log: Arc::clone(&log),
            }),
        )
        .unwrap();
        tree.set_behaviour(
            b1,
            Box::new(FocusSpy {
                name: "b1",
                log: Arc::clone(&log),
            }),
        )
        .unwrap();

        focus.set_focus(&mut tree, &mut store, a);
        focus.set_focus(&mut tree, &mut store, b1);

        assert_eq!(*log.lock(), vec!["a:get", "a:lose", "b1:get"]);
    }

    #[test]
    fn test_decorator_notified_of_focus_changes() {
        let (mut tree, _root, [a, ..]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let spy = store.insert(Box::new(FocusSpy {
            name: "dec",
            log: Arc::clone(&log),
        }));
        store.attach_to_object(spy, a).unwrap();

        focus.set_focus(&mut tree, &mut store, a);
        focus.clear_focus(&mut tree, &mut store);
        assert_eq!(*log.lock(), vec!["dec:get", "dec:lose"]);
        assert_eq!(focus.focused(), None);
    }

    #[test]
    fn test_forward_traversal_order() {
        let (mut tree, root, [a, _b, b1, b2, c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(a));
        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b1));
        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b2));
        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(c));

        // Non-cyclic root: the search ends instead of wrapping.
        assert!(!focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(c));
    }

    #[test]
    fn test_cyclic_root_wraps() {
        let (mut tree, root, [a, .., c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        tree.set_cyclic_focus(root, true).unwrap();

        focus.set_focus(&mut tree, &mut store, c);
        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(a));
    }

    #[test]
    fn test_cyclic_container_confines_traversal() {
        let (mut tree, root, [_a, b, b1, b2, _c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        tree.set_cyclic_focus(b, true).unwrap();

        focus.set_focus(&mut tree, &mut store, b2);
        // Instead of escaping to c, the search wraps inside b.
        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b1));
    }

    #[test]
    fn test_stop_focus_blocks_ascent() {
        let (mut tree, root, [_a, b, _b1, b2, _c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        tree.set_stop_focus(b, true).unwrap();

        focus.set_focus(&mut tree, &mut store, b2);
        assert!(!focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b2));
    }

    #[test]
    fn test_backward_traversal_mirrors_forward() {
        let (mut tree, root, [a, _b, b1, b2, c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        focus.set_focus(&mut tree, &mut store, c);
        assert!(focus.focus_previous(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b2));
        assert!(focus.focus_previous(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b1));
        assert!(focus.focus_previous(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(a));
        assert!(!focus.focus_previous(&mut tree, &mut store, root));
    }

    #[test]
    fn test_backward_visits_focusable_parent() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        let root = tree.insert(None).unwrap();
        let panel = tree.insert(Some(root)).unwrap();
        let child = tree.insert(Some(panel)).unwrap();
        tree.set_focusable(panel, true).unwrap();
        tree.set_focusable(child, true).unwrap();

        focus.set_focus(&mut tree, &mut store, child);
        assert!(focus.focus_previous(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(panel));
    }

    #[test]
    fn test_lone_widget_in_cyclic_root_terminates() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();
        let root = tree.insert(None).unwrap();
        let only = tree.insert(Some(root)).unwrap();
        tree.set_focusable(only, true).unwrap();
        tree.set_cyclic_focus(root, true).unwrap();

        focus.set_focus(&mut tree, &mut store, only);
        // Wrapping comes back to the focused widget: no move, no handling.
        assert!(!focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(only));
    }

    #[test]
    fn test_traversal_skips_invisible_and_disabled() {
        let (mut tree, root, [a, b, _b1, _b2, c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        // Hiding b prunes b1 and b2; disabling c removes it too.
        tree.set_visible(b, false).unwrap();
        tree.set_enabled(c, false).unwrap();

        focus.set_focus(&mut tree, &mut store, a);
        assert!(!focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(a));
    }

    #[test]
    fn test_focus_any_finds_first_eligible() {
        let (mut tree, root, [a, _b, b1, ..]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        tree.set_visible(a, false).unwrap();
        assert!(focus.focus_any(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(b1));
    }

    #[test]
    fn test_focus_changed_signal_emitted() {
        let (mut tree, _root, [a, _b, b1, ..]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = Arc::clone(&changes);
        let _id = focus.focus_changed().connect(move |change: &FocusChange| {
            changes_clone.lock().push(*change);
        });

        focus.set_focus(&mut tree, &mut store, a);
        focus.set_focus(&mut tree, &mut store, a);
        focus.set_focus(&mut tree, &mut store, b1);
        focus.clear_focus(&mut tree, &mut store);

        let changes = changes.lock();
        assert_eq!(changes.len(), 3, "re-focusing the same widget emits nothing");
        assert_eq!(changes[0], FocusChange { old: None, new: Some(a) });
        assert_eq!(changes[1], FocusChange { old: Some(a), new: Some(b1) });
        assert_eq!(changes[2], FocusChange { old: Some(b1), new: None });
    }

    #[test]
    fn test_traversal_starts_fresh_when_nothing_focused() {
        let (mut tree, root, [a, .., c]) = sample_tree();
        let mut store = DecoratorStore::new();
        let mut focus = FocusManager::new();

        assert!(focus.focus_next(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(a));

        focus.clear_focus(&mut tree, &mut store);
        assert!(focus.focus_previous(&mut tree, &mut store, root));
        assert_eq!(focus.focused(), Some(c));
    }
}
