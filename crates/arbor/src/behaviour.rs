//! The behaviour slot interface.
//!
//! A [`Behaviour`] is a set of event-handling slots a widget or a behaviour
//! decorator may implement. Every slot has a default implementation that
//! reports "not handled" (`false`), so implementors only override the slots
//! they customize. The provided [`handle`](Behaviour::handle) method routes
//! an [`InputEvent`] to the matching slot; the dispatcher and decorator
//! chains call only `handle`.
//!
//! # Example
//!
//! ```
//! use arbor::{Behaviour, Point};
//!
//! #[derive(Clone)]
//! struct Clicker {
//!     clicks: u32,
//! }
//!
//! impl Behaviour for Clicker {
//!     fn on_click(&mut self, _pos: Point) -> bool {
//!         self.clicks += 1;
//!         true
//!     }
//!
//!     fn clone_behaviour(&self) -> Box<dyn Behaviour> {
//!         Box::new(self.clone())
//!     }
//! }
//! ```

use crate::events::{InputEvent, Key, KeyboardModifiers, Point, ScrollDirection};

/// Event-handling slots for widgets and behaviour decorators.
///
/// Slots returning `bool` report whether the event was handled; an
/// unhandled event continues along the decorator chain and then up the
/// widget tree. The focus notification slots return nothing because focus
/// changes are not negotiable by the receiving widget.
pub trait Behaviour: Send {
    /// A completed click/tap.
    fn on_click(&mut self, _pos: Point) -> bool {
        false
    }

    /// A press held past the long-press threshold.
    fn on_long_click(&mut self, _pos: Point) -> bool {
        false
    }

    /// Two clicks within the double-click interval.
    fn on_double_click(&mut self, _pos: Point) -> bool {
        false
    }

    /// Pointer or finger pressed down.
    fn on_button_down(&mut self, _pos: Point) -> bool {
        false
    }

    /// Pointer or finger released.
    fn on_button_up(&mut self, _pos: Point) -> bool {
        false
    }

    /// Pointer moved while pressed.
    fn on_drag(&mut self, _delta: Point, _pos: Point) -> bool {
        false
    }

    /// Drag sequence ended.
    fn on_drag_end(&mut self, _pos: Point) -> bool {
        false
    }

    /// Pointer entered the widget.
    fn on_mouse_enter(&mut self, _pos: Point) -> bool {
        false
    }

    /// Pointer left the widget.
    fn on_mouse_leave(&mut self, _pos: Point) -> bool {
        false
    }

    /// Pointer moved while not pressed.
    fn on_mouse_move(&mut self, _pos: Point) -> bool {
        false
    }

    /// A key was pressed.
    fn on_key_down(&mut self, _key: Key, _modifiers: KeyboardModifiers) -> bool {
        false
    }

    /// A key was released.
    fn on_key_up(&mut self, _key: Key, _modifiers: KeyboardModifiers) -> bool {
        false
    }

    /// A character was produced.
    fn on_char(&mut self, _ch: char, _key: Key, _modifiers: KeyboardModifiers) -> bool {
        false
    }

    /// Scroll toward the top.
    fn on_scroll_up(&mut self) -> bool {
        false
    }

    /// Scroll toward the bottom.
    fn on_scroll_down(&mut self) -> bool {
        false
    }

    /// Scroll toward the left.
    fn on_scroll_left(&mut self) -> bool {
        false
    }

    /// Scroll toward the right.
    fn on_scroll_right(&mut self) -> bool {
        false
    }

    /// Request to increase the widget's value.
    fn on_increase(&mut self) -> bool {
        false
    }

    /// Request to decrease the widget's value.
    fn on_decrease(&mut self) -> bool {
        false
    }

    /// Focus should move forward from this widget.
    ///
    /// Returning `true` claims the navigation, preventing the default
    /// tree traversal.
    fn on_focus_next(&mut self) -> bool {
        false
    }

    /// Focus should move backward from this widget.
    fn on_focus_previous(&mut self) -> bool {
        false
    }

    /// An application-defined event.
    fn on_user_event(&mut self, _code: u32) -> bool {
        false
    }

    /// The widget gained focus.
    fn on_get_focus(&mut self) {}

    /// The widget lost focus.
    fn on_lose_focus(&mut self) {}

    /// Produce a boxed copy of this behaviour.
    ///
    /// Used when cloning decorator chains, for example to duplicate a
    /// widget subtree.
    fn clone_behaviour(&self) -> Box<dyn Behaviour>;

    /// Route an event to the matching slot.
    ///
    /// Returns the slot's handled flag.
    fn handle(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Click { pos } => self.on_click(pos),
            InputEvent::LongClick { pos } => self.on_long_click(pos),
            InputEvent::DoubleClick { pos } => self.on_double_click(pos),
            InputEvent::ButtonDown { pos } => self.on_button_down(pos),
            InputEvent::ButtonUp { pos } => self.on_button_up(pos),
            InputEvent::Drag { delta, pos } => self.on_drag(delta, pos),
            InputEvent::DragEnd { pos } => self.on_drag_end(pos),
            InputEvent::MouseEnter { pos } => self.on_mouse_enter(pos),
            InputEvent::MouseLeave { pos } => self.on_mouse_leave(pos),
            InputEvent::MouseMove { pos } => self.on_mouse_move(pos),
            InputEvent::KeyDown { key, modifiers } => self.on_key_down(key, modifiers),
            InputEvent::KeyUp { key, modifiers } => self.on_key_up(key, modifiers),
            InputEvent::Char { ch, key, modifiers } => self.on_char(ch, key, modifiers),
            InputEvent::Scroll { direction } => match direction {
                ScrollDirection::Up => self.on_scroll_up(),
                ScrollDirection::Down => self.on_scroll_down(),
                ScrollDirection::Left => self.on_scroll_left(),
                ScrollDirection::Right => self.on_scroll_right(),
            },
            InputEvent::Increase => self.on_increase(),
            InputEvent::Decrease => self.on_decrease(),
            InputEvent::FocusNext => self.on_focus_next(),
            InputEvent::FocusPrevious => self.on_focus_previous(),
            InputEvent::User { code } => self.on_user_event(code),
        }
    }
}
