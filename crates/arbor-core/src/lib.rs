//! Core systems for Arbor.
//!
//! This crate provides the scheduling and notification foundation of the
//! Arbor HMI toolkit:
//!
//! - **Commands**: Units of deferred work with priorities and delays
//! - **Command Handler**: Waiting/working queue scheduling driven from the
//!   application's main loop
//! - **Signal/Slot System**: Type-safe observer/subject notification
//!
//! # Command Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use arbor_core::{Command, CommandHandler, WorkContext};
//!
//! let handler = CommandHandler::new();
//!
//! // A one-shot command with a 50 ms delay.
//! let cmd = Command::with_delay(
//!     |_: &mut WorkContext| {
//!         println!("deferred work");
//!     },
//!     Duration::from_millis(50),
//! );
//! handler.execute(cmd)?;
//!
//! // The main loop calls process() once per tick; here we drive the clock
//! // explicitly instead.
//! let t0 = Instant::now();
//! handler.process_at(t0);
//! handler.process_at(t0 + Duration::from_millis(50));
//! # Ok::<(), arbor_core::SchedulerError>(())
//! ```
//!
//! # Signal Example
//!
//! ```
//! use arbor_core::Signal;
//!
//! let volume_changed = Signal::<u8>::new();
//!
//! let conn_id = volume_changed.connect(|volume| {
//!     println!("Volume is now {}", volume);
//! });
//!
//! volume_changed.emit(&70);
//! volume_changed.disconnect(conn_id);
//! ```

mod command;
mod error;
mod handler;
pub mod signal;

pub use command::{Command, CommandAction, CommandRef, WorkContext};
pub use error::{Result, SchedulerError};
pub use handler::CommandHandler;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
