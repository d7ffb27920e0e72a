//! Event delivery into the widget tree.
//!
//! Events enter at a target widget and bubble toward the root until some
//! behaviour claims them. At each stop the widget's attached decorator chain
//! is consulted first, then its intrinsic behaviour. Disabled widgets are
//! skipped but do not stop the climb; an invisible target swallows the event
//! outright.

use crate::decorator::DecoratorStore;
use crate::events::InputEvent;
use crate::tree::{Tree, WidgetId};

/// The outcome of delivering an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// Some behaviour along the propagation path handled the event.
    Accepted,
    /// The event reached the root without being handled, or the target was
    /// not effectively visible.
    Ignored,
    /// The target widget does not exist.
    WidgetNotFound,
}

impl DispatchResult {
    /// Whether the event was handled.
    pub fn was_handled(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Routes input events to widgets.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Deliver an event to `target`, bubbling toward the root until a
    /// behaviour handles it.
    #[tracing::instrument(skip(tree, store), target = "arbor::dispatcher", level = "trace")]
    pub fn send_event(
        tree: &mut Tree,
        store: &mut DecoratorStore,
        target: WidgetId,
        event: &InputEvent,
    ) -> DispatchResult {
        if !tree.contains(target) {
            tracing::debug!(target: "arbor::dispatcher", ?target, "event target not found");
            return DispatchResult::WidgetNotFound;
        }
        if !tree.is_effectively_visible(target) {
            return DispatchResult::Ignored;
        }

        let mut current = Some(target);
        while let Some(widget) = current {
            if tree.is_effectively_enabled(widget) && Self::deliver(tree, store, widget, event) {
                tracing::trace!(target: "arbor::dispatcher", ?widget, "event accepted");
                return DispatchResult::Accepted;
            }
            current = tree.parent(widget).ok().flatten();
        }
        DispatchResult::Ignored
    }

    /// Deliver an event to exactly one widget, without propagation.
    ///
    /// Unlike [`send_event`](Self::send_event) this ignores the enabled and
    /// visibility state; callers use it for synthetic notifications that must
    /// reach a specific widget.
    pub fn send_event_direct(
        tree: &mut Tree,
        store: &mut DecoratorStore,
        target: WidgetId,
        event: &InputEvent,
    ) -> DispatchResult {
        if !tree.contains(target) {
            return DispatchResult::WidgetNotFound;
        }
        if Self::deliver(tree, store, target, event) {
            DispatchResult::Accepted
        } else {
            DispatchResult::Ignored
        }
    }

    /// One delivery stop: decorator chain first, then the intrinsic
    /// behaviour.
    fn deliver(
        tree: &mut Tree,
        store: &mut DecoratorStore,
        widget: WidgetId,
        event: &InputEvent,
    ) -> bool {
        if let Some(decorator) = store.decorator_of(widget) {
            if store.dispatch(decorator, event) {
                return true;
            }
        }
        if let Some(behaviour) = tree.behaviour_mut(widget) {
            if behaviour.handle(event) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::behaviour::Behaviour;
    use crate::events::Point;

    #[derive(Clone)]
    struct Clicker {
        hits: Arc<AtomicUsize>,
        claims: bool,
    }

    impl Clicker {
        fn new(claims: bool) -> (Self, Arc<AtomicUsize>) {
            let hits = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    hits: Arc::clone(&hits),
                    claims,
                },
                hits,
            )
        }
    }

    impl Behaviour for Clicker {
        fn on_click(&mut self, _pos: Point) -> bool {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.claims
        }

        fn clone_behaviour(&self) -> Box<dyn Behaviour> {
            Box::new(self.clone())
        }
    }

    fn click() -> InputEvent {
        InputEvent::Click { pos: Point::ZERO }
    }

    #[test]
    fn test_intrinsic_behaviour_accepts() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let button = tree.insert(None).unwrap();
        let (clicker, hits) = Clicker::new(true);
        tree.set_behaviour(button, Box::new(clicker)).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Accepted);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decorator_consulted_before_intrinsic() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let button = tree.insert(None).unwrap();

        let (intrinsic, intrinsic_hits) = Clicker::new(true);
        tree.set_behaviour(button, Box::new(intrinsic)).unwrap();

        let (decorator, decorator_hits) = Clicker::new(true);
        let dec = store.insert(Box::new(decorator));
        store.attach_to_object(dec, button).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Accepted);
        assert_eq!(decorator_hits.load(Ordering::SeqCst), 1);
        assert_eq!(intrinsic_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_declining_decorator_falls_through_to_intrinsic() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let button = tree.insert(None).unwrap();

        let (intrinsic, intrinsic_hits) = Clicker::new(true);
        tree.set_behaviour(button, Box::new(intrinsic)).unwrap();

        let (decorator, decorator_hits) = Clicker::new(false);
        let dec = store.insert(Box::new(decorator));
        store.attach_to_object(dec, button).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Accepted);
        assert_eq!(decorator_hits.load(Ordering::SeqCst), 1);
        assert_eq!(intrinsic_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unhandled_event_bubbles_to_parent() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let panel = tree.insert(None).unwrap();
        let button = tree.insert(Some(panel)).unwrap();

        let (parent_clicker, parent_hits) = Clicker::new(true);
        tree.set_behaviour(panel, Box::new(parent_clicker)).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Accepted);
        assert_eq!(parent_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_widget_skipped_but_climb_continues() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let panel = tree.insert(None).unwrap();
        let button = tree.insert(Some(panel)).unwrap();

        let (button_clicker, button_hits) = Clicker::new(true);
        tree.set_behaviour(button, Box::new(button_clicker)).unwrap();
        let (panel_clicker, panel_hits) = Clicker::new(true);
        tree.set_behaviour(panel, Box::new(panel_clicker)).unwrap();

        tree.set_enabled(button, false).unwrap();

        // panel is still enabled, so the event lands there.
        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Accepted);
        assert_eq!(button_hits.load(Ordering::SeqCst), 0);
        assert_eq!(panel_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invisible_target_is_ignored() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let panel = tree.insert(None).unwrap();
        let button = tree.insert(Some(panel)).unwrap();

        let (panel_clicker, panel_hits) = Clicker::new(true);
        tree.set_behaviour(panel, Box::new(panel_clicker)).unwrap();
        tree.set_visible(button, false).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Ignored);
        assert_eq!(panel_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unhandled_at_root_is_ignored() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let button = tree.insert(None).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Ignored);
    }

    #[test]
    fn test_missing_target_reported() {
        let mut tree = Tree::new();
        let mut other = Tree::new();
        let mut store = DecoratorStore::new();
        let stale = other.insert(None).unwrap();

        let result = EventDispatcher::send_event(&mut tree, &mut store, stale, &click());
        assert_eq!(result, DispatchResult::WidgetNotFound);
        assert!(!result.was_handled());
    }

    #[test]
    fn test_direct_delivery_does_not_propagate() {
        let mut tree = Tree::new();
        let mut store = DecoratorStore::new();
        let panel = tree.insert(None).unwrap();
        let button = tree.insert(Some(panel)).unwrap();

        let (panel_clicker, panel_hits) = Clicker::new(true);
        tree.set_behaviour(panel, Box::new(panel_clicker)).unwrap();

        let result = EventDispatcher::send_event_direct(&mut tree, &mut store, button, &click());
        assert_eq!(result, DispatchResult::Ignored);
        assert_eq!(panel_hits.load(Ordering::SeqCst), 0);
    }
}
