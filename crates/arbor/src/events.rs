//! Input event value types.
//!
//! These are the payloads handed to [`Behaviour`](crate::Behaviour) slots by
//! the event dispatcher. The platform integration layer translates raw
//! touch/key input into [`InputEvent`] values; everything above that layer
//! works in terms of these types.

/// A point in widget-tree coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Key identifiers used by the behaviour core.
///
/// Navigation and action keys are named; everything else is carried as a
/// platform keycode in [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// The confirm/activate key (Enter, OK).
    Action,
    /// The cancel/back key.
    Escape,
    /// Any other key, by platform keycode.
    Other(u32),
}

/// Direction of a scroll gesture or wheel notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Scroll toward the top.
    Up,
    /// Scroll toward the bottom.
    Down,
    /// Scroll toward the left.
    Left,
    /// Scroll toward the right.
    Right,
}

/// An input event routed through the widget tree.
///
/// Each variant maps onto one [`Behaviour`](crate::Behaviour) slot; see
/// [`Behaviour::handle`](crate::Behaviour::handle) for the mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A completed click/tap.
    Click {
        /// Position of the click.
        pos: Point,
    },
    /// A press held past the long-press threshold.
    LongClick {
        /// Position of the press.
        pos: Point,
    },
    /// Two clicks within the double-click interval.
    DoubleClick {
        /// Position of the second click.
        pos: Point,
    },
    /// Pointer or finger pressed down.
    ButtonDown {
        /// Position of the press.
        pos: Point,
    },
    /// Pointer or finger released.
    ButtonUp {
        /// Position of the release.
        pos: Point,
    },
    /// Pointer moved while pressed.
    Drag {
        /// Movement since the previous drag event.
        delta: Point,
        /// Current position.
        pos: Point,
    },
    /// Drag sequence ended.
    DragEnd {
        /// Final position.
        pos: Point,
    },
    /// Pointer entered the widget.
    MouseEnter {
        /// Entry position.
        pos: Point,
    },
    /// Pointer left the widget.
    MouseLeave {
        /// Exit position.
        pos: Point,
    },
    /// Pointer moved while not pressed.
    MouseMove {
        /// Current position.
        pos: Point,
    },
    /// A key was pressed.
    KeyDown {
        /// The key identifier.
        key: Key,
        /// Modifiers held during the press.
        modifiers: KeyboardModifiers,
    },
    /// A key was released.
    KeyUp {
        /// The key identifier.
        key: Key,
        /// Modifiers held during the release.
        modifiers: KeyboardModifiers,
    },
    /// A character was produced.
    Char {
        /// The character.
        ch: char,
        /// The key that produced it.
        key: Key,
        /// Modifiers held.
        modifiers: KeyboardModifiers,
    },
    /// A scroll gesture.
    Scroll {
        /// Direction of the scroll.
        direction: ScrollDirection,
    },
    /// Request to increase the widget's value (e.g. a slider step up).
    Increase,
    /// Request to decrease the widget's value.
    Decrease,
    /// Focus should move forward from this widget.
    FocusNext,
    /// Focus should move backward from this widget.
    FocusPrevious,
    /// An application-defined event.
    User {
        /// Application-defined event code.
        code: u32,
    },
}
