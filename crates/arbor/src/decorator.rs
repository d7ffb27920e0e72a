//! Attachable behaviour decorators.
//!
//! A decorator wraps a [`Behaviour`] so it can be attached to a widget at
//! runtime, layered on top of whatever intrinsic behaviour the widget has.
//! Composites group several decorators behind one attachment point and
//! forward events to them in order, stopping at the first one that handles
//! the event.
//!
//! Attachment is exclusive: a decorator hangs off at most one widget or one
//! composite at a time, and a widget carries at most one decorator. Attaching
//! something that is already placed elsewhere silently moves it.
//!
//! ```
//! use arbor::{Behaviour, DecoratorStore, InputEvent, Point, Tree};
//!
//! #[derive(Clone)]
//! struct Beep;
//!
//! impl Behaviour for Beep {
//!     fn on_click(&mut self, _pos: Point) -> bool {
//!         true
//!     }
//!
//!     fn clone_behaviour(&self) -> Box<dyn Behaviour> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let mut tree = Tree::new();
//! let mut store = DecoratorStore::new();
//! let button = tree.insert(None)?;
//!
//! let beep = store.insert(Box::new(Beep));
//! store.attach_to_object(beep, button)?;
//!
//! assert!(store.dispatch(beep, &InputEvent::Click { pos: Point::ZERO }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;
use std::fmt;

use slotmap::{SlotMap, new_key_type};
use static_assertions::assert_impl_all;

use crate::behaviour::Behaviour;
use crate::events::InputEvent;
use crate::tree::WidgetId;

new_key_type! {
    /// A unique, stable identifier for a decorator in a [`DecoratorStore`].
    pub struct DecoratorId;
}

/// Errors that can occur during decorator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorError {
    /// The decorator ID is invalid or has been removed.
    InvalidDecoratorId,
    /// The target of a composite operation is not a composite.
    NotComposite,
    /// Attempted to nest a composite inside itself or one of its own
    /// descendants.
    CycleDetected,
}

impl fmt::Display for DecoratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDecoratorId => write!(f, "Invalid or removed decorator ID"),
            Self::NotComposite => write!(f, "Decorator is not a composite"),
            Self::CycleDetected => {
                write!(f, "Cannot nest a composite inside its own subtree")
            }
        }
    }
}

impl std::error::Error for DecoratorError {}

/// Where a decorator currently hangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Not attached anywhere.
    Detached,
    /// Attached directly to a widget.
    Object(WidgetId),
    /// A child of a composite decorator.
    Composite(DecoratorId),
}

enum DecoratorKind {
    Leaf(Box<dyn Behaviour>),
    Composite(Vec<DecoratorId>),
}

struct Decorator {
    kind: DecoratorKind,
    attachment: Attachment,
}

/// Arena of behaviour decorators plus the widget-to-decorator attachment map.
///
/// All attachment bookkeeping lives here so the exclusivity rules hold no
/// matter which side initiates a move.
pub struct DecoratorStore {
    decorators: SlotMap<DecoratorId, Decorator>,
    by_object: HashMap<WidgetId, DecoratorId>,
}

impl DecoratorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            decorators: SlotMap::with_key(),
            by_object: HashMap::new(),
        }
    }

    /// Insert a leaf decorator wrapping `behaviour`. Starts detached.
    pub fn insert(&mut self, behaviour: Box<dyn Behaviour>) -> DecoratorId {
        self.decorators.insert(Decorator {
            kind: DecoratorKind::Leaf(behaviour),
            attachment: Attachment::Detached,
        })
    }

    /// Insert an empty composite decorator. Starts detached.
    pub fn insert_composite(&mut self) -> DecoratorId {
        self.decorators.insert(Decorator {
            kind: DecoratorKind::Composite(Vec::new()),
            attachment: Attachment::Detached,
        })
    }

    /// Check if a decorator exists.
    pub fn contains(&self, id: DecoratorId) -> bool {
        self.decorators.contains_key(id)
    }

    /// The number of decorators in the store.
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// Whether the store has no decorators.
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Where the decorator currently hangs.
    pub fn attachment(&self, id: DecoratorId) -> Result<Attachment, DecoratorError> {
        self.decorators
            .get(id)
            .map(|d| d.attachment)
            .ok_or(DecoratorError::InvalidDecoratorId)
    }

    /// The decorator attached to `widget`, if any.
    pub fn decorator_of(&self, widget: WidgetId) -> Option<DecoratorId> {
        self.by_object.get(&widget).copied()
    }

    /// The children of a composite, in dispatch order.
    pub fn composite_children(&self, id: DecoratorId) -> Result<&[DecoratorId], DecoratorError> {
        match &self
            .decorators
            .get(id)
            .ok_or(DecoratorError::InvalidDecoratorId)?
            .kind
        {
            DecoratorKind::Composite(children) => Ok(children),
            DecoratorKind::Leaf(_) => Err(DecoratorError::NotComposite),
        }
    }

    /// Whether the decorator is a composite.
    pub fn is_composite(&self, id: DecoratorId) -> bool {
        matches!(
            self.decorators.get(id).map(|d| &d.kind),
            Some(DecoratorKind::Composite(_))
        )
    }

    /// Attach a decorator directly to a widget.
    ///
    /// Detaches the decorator from wherever it previously hung, and detaches
    /// any decorator the widget previously carried.
    pub fn attach_to_object(
        &mut self,
        id: DecoratorId,
        widget: WidgetId,
    ) -> Result<(), DecoratorError> {
        if !self.decorators.contains_key(id) {
            return Err(DecoratorError::InvalidDecoratorId);
        }
        self.unhook(id);
        if let Some(previous) = self.by_object.remove(&widget) {
            if let Some(prev) = self.decorators.get_mut(previous) {
                prev.attachment = Attachment::Detached;
            }
        }
        self.by_object.insert(widget, id);
        if let Some(dec) = self.decorators.get_mut(id) {
            dec.attachment = Attachment::Object(widget);
        }
        tracing::trace!(target: "arbor::decorator", ?id, ?widget, "attached to widget");
        Ok(())
    }

    /// Add a decorator to a composite's dispatch list.
    ///
    /// `at_front` puts it before the existing children, otherwise it goes
    /// last. Already being a child of this composite is a no-op (its position
    /// is kept). Detaches the decorator from wherever else it hung.
    pub fn add_to_composite(
        &mut self,
        composite: DecoratorId,
        id: DecoratorId,
        at_front: bool,
    ) -> Result<(), DecoratorError> {
        if !self.decorators.contains_key(id) {
            return Err(DecoratorError::InvalidDecoratorId);
        }
        if !self.is_composite(composite) {
            if !self.decorators.contains_key(composite) {
                return Err(DecoratorError::InvalidDecoratorId);
            }
            return Err(DecoratorError::NotComposite);
        }
        if self.would_cycle(composite, id) {
            return Err(DecoratorError::CycleDetected);
        }
        if self.attachment(id)? == Attachment::Composite(composite) {
            return Ok(());
        }
        self.unhook(id);
        if let Some(Decorator {
            kind: DecoratorKind::Composite(children),
            ..
        }) = self.decorators.get_mut(composite)
        {
            if at_front {
                children.insert(0, id);
            } else {
                children.push(id);
            }
        }
        if let Some(dec) = self.decorators.get_mut(id) {
            dec.attachment = Attachment::Composite(composite);
        }
        Ok(())
    }

    /// Whether attaching `id` under `composite` would make `id` its own
    /// ancestor. Walks the attachment chain upward from the composite.
    fn would_cycle(&self, composite: DecoratorId, id: DecoratorId) -> bool {
        let mut current = composite;
        loop {
            if current == id {
                return true;
            }
            match self.decorators.get(current).map(|d| d.attachment) {
                Some(Attachment::Composite(parent)) => current = parent,
                _ => return false,
            }
        }
    }

    /// Remove a decorator from a composite's dispatch list. The decorator
    /// stays alive, detached. Returns `false` when it was not a child.
    pub fn remove_from_composite(
        &mut self,
        composite: DecoratorId,
        id: DecoratorId,
    ) -> Result<bool, DecoratorError> {
        let children = match &mut self
            .decorators
            .get_mut(composite)
            .ok_or(DecoratorError::InvalidDecoratorId)?
            .kind
        {
            DecoratorKind::Composite(children) => children,
            DecoratorKind::Leaf(_) => return Err(DecoratorError::NotComposite),
        };
        let before = children.len();
        children.retain(|&child| child != id);
        let removed = children.len() != before;
        if removed {
            if let Some(dec) = self.decorators.get_mut(id) {
                dec.attachment = Attachment::Detached;
            }
        }
        Ok(removed)
    }

    /// Empty a composite's dispatch list, detaching every child.
    pub fn remove_all_from_composite(
        &mut self,
        composite: DecoratorId,
    ) -> Result<(), DecoratorError> {
        let children = match &mut self
            .decorators
            .get_mut(composite)
            .ok_or(DecoratorError::InvalidDecoratorId)?
            .kind
        {
            DecoratorKind::Composite(children) => std::mem::take(children),
            DecoratorKind::Leaf(_) => return Err(DecoratorError::NotComposite),
        };
        for child in children {
            if let Some(dec) = self.decorators.get_mut(child) {
                dec.attachment = Attachment::Detached;
            }
        }
        Ok(())
    }

    /// Detach a decorator from wherever it hangs. It stays alive.
    pub fn detach(&mut self, id: DecoratorId) -> Result<(), DecoratorError> {
        if !self.decorators.contains_key(id) {
            return Err(DecoratorError::InvalidDecoratorId);
        }
        self.unhook(id);
        Ok(())
    }

    /// Clear the attachment of `id` on both sides, without touching `id`'s
    /// own child list.
    fn unhook(&mut self, id: DecoratorId) {
        let attachment = match self.decorators.get(id) {
            Some(dec) => dec.attachment,
            None => return,
        };
        match attachment {
            Attachment::Detached => {}
            Attachment::Object(widget) => {
                self.by_object.remove(&widget);
            }
            Attachment::Composite(parent) => {
                if let Some(Decorator {
                    kind: DecoratorKind::Composite(children),
                    ..
                }) = self.decorators.get_mut(parent)
                {
                    children.retain(|&child| child != id);
                }
            }
        }
        if let Some(dec) = self.decorators.get_mut(id) {
            dec.attachment = Attachment::Detached;
        }
    }

    /// Destroy a decorator. A composite takes its whole child subtree with
    /// it; the children are owned by the composite once added.
    pub fn remove(&mut self, id: DecoratorId) -> Result<(), DecoratorError> {
        if !self.decorators.contains_key(id) {
            return Err(DecoratorError::InvalidDecoratorId);
        }
        self.unhook(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(dec) = self.decorators.remove(current) {
                if let DecoratorKind::Composite(children) = dec.kind {
                    pending.extend(children);
                }
            }
        }
        Ok(())
    }

    /// Detach the decorator attached to `widget`, if any. Called when the
    /// widget leaves the tree; the decorator stays alive.
    pub fn remove_object(&mut self, widget: WidgetId) {
        if let Some(id) = self.by_object.remove(&widget) {
            if let Some(dec) = self.decorators.get_mut(id) {
                dec.attachment = Attachment::Detached;
            }
        }
    }

    /// Deep-copy a decorator. Leaf behaviours are cloned via
    /// [`Behaviour::clone_behaviour`]; composites clone their whole subtree.
    /// The copy starts detached.
    pub fn clone_decorator(&mut self, id: DecoratorId) -> Result<DecoratorId, DecoratorError> {
        let kind = match &self
            .decorators
            .get(id)
            .ok_or(DecoratorError::InvalidDecoratorId)?
            .kind
        {
            DecoratorKind::Leaf(behaviour) => DecoratorKind::Leaf(behaviour.clone_behaviour()),
            DecoratorKind::Composite(children) => DecoratorKind::Composite(children.clone()),
        };
        match kind {
            DecoratorKind::Leaf(behaviour) => Ok(self.insert(behaviour)),
            DecoratorKind::Composite(children) => {
                let copy = self.insert_composite();
                for child in children {
                    let child_copy = self.clone_decorator(child)?;
                    self.add_to_composite(copy, child_copy, false)?;
                }
                Ok(copy)
            }
        }
    }

    /// Deliver an event to a decorator. Returns whether it was handled.
    ///
    /// A leaf routes the event into its behaviour's slot. A composite asks
    /// its children in order and stops at the first one that handles it.
    pub fn dispatch(&mut self, id: DecoratorId, event: &InputEvent) -> bool {
        let children = match self.decorators.get_mut(id) {
            Some(Decorator {
                kind: DecoratorKind::Leaf(behaviour),
                ..
            }) => return behaviour.handle(event),
            Some(Decorator {
                kind: DecoratorKind::Composite(children),
                ..
            }) => children.clone(),
            None => return false,
        };
        for child in children {
            if self.dispatch(child, event) {
                return true;
            }
        }
        false
    }

    /// Notify a decorator of a focus change. A composite notifies all of its
    /// children; there is no short-circuit for focus notifications.
    pub fn notify_focus(&mut self, id: DecoratorId, gained: bool) {
        let children = match self.decorators.get_mut(id) {
            Some(Decorator {
                kind: DecoratorKind::Leaf(behaviour),
                ..
            }) => {
                if gained {
                    behaviour.on_get_focus();
                } else {
                    behaviour.on_lose_focus();
                }
                return;
            }
            Some(Decorator {
                kind: DecoratorKind::Composite(children),
                ..
            }) => children.clone(),
            None => return,
        };
        for child in children {
            self.notify_focus(child, gained);
        }
    }
}

impl Default for DecoratorStore {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(DecoratorStore: Send);
