//! Widget tree, behaviours, and input routing for Arbor.
//!
//! This crate holds the user-interaction layer: a widget [`Tree`] arena,
//! the [`Behaviour`] trait whose slots react to input, runtime-attachable
//! behaviour decorators in a [`DecoratorStore`], the [`EventDispatcher`]
//! that bubbles events toward the root, and a [`FocusManager`] that walks
//! keyboard focus through the tree. Deferred work scheduling lives in the
//! `arbor-core` crate.
//!
//! # Example
//!
//! ```
//! use arbor::{Behaviour, DispatchResult, EventDispatcher, InputEvent, Point, Tree};
//! use arbor::DecoratorStore;
//!
//! #[derive(Clone)]
//! struct Press;
//!
//! impl Behaviour for Press {
//!     fn on_click(&mut self, pos: Point) -> bool {
//!         println!("pressed at {}, {}", pos.x, pos.y);
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
//!
//! let screen = tree.insert(None)?;
//! let button = tree.insert(Some(screen))?;
//! tree.set_behaviour(button, Box::new(Press))?;
//!
//! let result = EventDispatcher::send_event(
//!     &mut tree,
//!     &mut store,
//!     button,
//!     &InputEvent::Click { pos: Point::new(12.0, 4.0) },
//! );
//! assert_eq!(result, DispatchResult::Accepted);
//! # Ok::<(), arbor::TreeError>(())
//! ```

mod behaviour;
mod decorator;
mod dispatcher;
mod events;
mod focus;
mod tree;

pub use behaviour::Behaviour;
pub use decorator::{Attachment, DecoratorError, DecoratorId, DecoratorStore};
pub use dispatcher::{DispatchResult, EventDispatcher};
pub use events::{InputEvent, Key, KeyboardModifiers, Point, ScrollDirection};
pub use focus::{FocusChange, FocusManager};
pub use tree::{Tree, TreeError, TreeResult, WidgetId};
