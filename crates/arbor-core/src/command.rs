//! Commands: units of deferred, schedulable work.
//!
//! A [`Command`] bundles an action with the scheduling attributes the
//! [`CommandHandler`](crate::CommandHandler) needs: a priority, a delay until
//! the next execution, a finished flag, and an optional list of additional
//! commands that run when the command completes.
//!
//! Commands are shared via [`CommandRef`] (an `Arc`). Their identity for
//! queue-membership checks is pointer identity, so the same command can be
//! handed to UI elements, worker threads, and the handler without copies.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use arbor_core::{Command, WorkContext};
//!
//! // A command that re-arms itself twice, 100 ms apart.
//! let mut runs = 0;
//! let cmd = Command::new(move |ctx: &mut WorkContext| {
//!     runs += 1;
//!     if runs < 3 {
//!         ctx.set_finished(false);
//!         ctx.set_time_until_next_execution(Duration::from_millis(100));
//!     } else {
//!         ctx.set_finished(true);
//!     }
//! });
//! assert!(cmd.is_finished());
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use static_assertions::assert_impl_all;

/// The work carried by a [`Command`].
///
/// `run` is called by the handler's processing loop once the command is due.
/// It must not block: long-running work belongs on a worker thread that
/// re-executes a command when its result is ready.
///
/// Closures of type `FnMut(&mut WorkContext)` implement this trait, so most
/// commands never need a named action type.
pub trait CommandAction: Send {
    /// Perform the command's work.
    ///
    /// Rescheduling requests (staying resident, changing the delay) go
    /// through the [`WorkContext`]; they take effect after `run` returns.
    fn run(&mut self, ctx: &mut WorkContext);
}

impl<F> CommandAction for F
where
    F: FnMut(&mut WorkContext) + Send,
{
    fn run(&mut self, ctx: &mut WorkContext) {
        self(ctx)
    }
}

/// Scheduling requests collected while an action runs.
///
/// The handler passes a `WorkContext` to [`CommandAction::run`] and applies
/// the buffered changes once the action returns. This keeps queue ordering
/// under the handler's control: an action can never reorder the queues
/// mid-run, only request what happens to its command next.
#[derive(Debug, Default)]
pub struct WorkContext {
    finished: Option<bool>,
    delay: Option<Duration>,
}

impl WorkContext {
    pub(crate) fn new() -> Self {
        Self {
            finished: None,
            delay: None,
        }
    }

    /// Request the command's finished state after this run.
    ///
    /// `set_finished(false)` keeps the command resident in the working queue
    /// for repeated execution. Commands default to finished, so an action
    /// that never calls this runs exactly once per [`execute`] call.
    ///
    /// [`execute`]: crate::CommandHandler::execute
    pub fn set_finished(&mut self, finished: bool) {
        self.finished = Some(finished);
    }

    /// Request a new delay until the command's next execution.
    ///
    /// Only meaningful together with `set_finished(false)`; a finished
    /// command leaves the queue regardless of its delay.
    pub fn set_time_until_next_execution(&mut self, delay: Duration) {
        self.delay = Some(delay);
    }
}

/// A shared handle to a [`Command`].
///
/// Queue membership and removal use pointer identity (`Arc::ptr_eq`), so two
/// clones of the same `CommandRef` always refer to the same queued command.
pub type CommandRef = Arc<Command>;

/// An additional command plus its retention policy.
struct AdditionalEntry {
    command: CommandRef,
    one_time: bool,
}

/// Mutable scheduling state, guarded separately from the action so state
/// queries never contend with a running action.
struct CommandState {
    /// Execution priority. 0 is the highest priority.
    priority: u32,
    /// Remaining delay until the command is due.
    time_until_next_execution: Duration,
    /// Whether the command leaves the queue after its next run.
    finished: bool,
    /// Commands executed when this command finishes.
    additional: Vec<AdditionalEntry>,
}

/// A unit of deferred work with scheduling attributes.
///
/// Commands are created finished (one-shot) with priority 0 and no delay.
/// The constructors cover the common cases; scheduling attributes of a
/// queued command are changed through the handler
/// ([`set_priority`](crate::CommandHandler::set_priority),
/// [`set_time_until_next_execution`](crate::CommandHandler::set_time_until_next_execution))
/// so the queues can be re-sorted accordingly.
pub struct Command {
    state: Mutex<CommandState>,
    action: Mutex<Box<dyn CommandAction>>,
}

impl Command {
    /// Create a command with priority 0 and no delay.
    pub fn new(action: impl CommandAction + 'static) -> CommandRef {
        Self::with_schedule(action, 0, Duration::ZERO)
    }

    /// Create a command with the given priority (0 is highest) and no delay.
    pub fn with_priority(action: impl CommandAction + 'static, priority: u32) -> CommandRef {
        Self::with_schedule(action, priority, Duration::ZERO)
    }

    /// Create a command with priority 0 that becomes due after `delay`.
    pub fn with_delay(action: impl CommandAction + 'static, delay: Duration) -> CommandRef {
        Self::with_schedule(action, 0, delay)
    }

    /// Create a command with an explicit priority and initial delay.
    pub fn with_schedule(
        action: impl CommandAction + 'static,
        priority: u32,
        delay: Duration,
    ) -> CommandRef {
        Arc::new(Self {
            state: Mutex::new(CommandState {
                priority,
                time_until_next_execution: delay,
                finished: true,
                additional: Vec::new(),
            }),
            action: Mutex::new(Box::new(action)),
        })
    }

    /// The command's priority. 0 is the highest priority.
    pub fn priority(&self) -> u32 {
        self.state.lock().priority
    }

    /// The remaining delay until the command is due.
    ///
    /// The value decreases as the handler processes; it is exact as of the
    /// handler's last `process` call.
    pub fn time_until_next_execution(&self) -> Duration {
        self.state.lock().time_until_next_execution
    }

    /// Whether the command will leave the queue after its next run.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Append a command to run when this command finishes.
    ///
    /// Additional commands are not queued. They execute inline, in list
    /// order, immediately after this command's finishing run. An additional
    /// command that reports itself unfinished from that inline run is then
    /// enqueued through the normal `execute` path.
    ///
    /// With `one_time`, the entry is dropped from the list after it has run
    /// once; otherwise it runs again on every future finish.
    pub fn add_additional(&self, command: CommandRef, one_time: bool) {
        self.state.lock().additional.push(AdditionalEntry {
            command,
            one_time,
        });
    }

    /// Remove an additional command by identity.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove_additional(&self, command: &CommandRef) -> bool {
        let mut state = self.state.lock();
        let before = state.additional.len();
        state
            .additional
            .retain(|entry| !Arc::ptr_eq(&entry.command, command));
        state.additional.len() != before
    }

    /// Remove all additional commands.
    pub fn clear_additional(&self) {
        self.state.lock().additional.clear();
    }

    /// The number of additional commands currently attached.
    pub fn additional_count(&self) -> usize {
        self.state.lock().additional.len()
    }

    /// Get the additional command at `index`, if any.
    pub fn additional(&self, index: usize) -> Option<CommandRef> {
        self.state
            .lock()
            .additional
            .get(index)
            .map(|entry| entry.command.clone())
    }

    pub(crate) fn set_priority_internal(&self, priority: u32) {
        self.state.lock().priority = priority;
    }

    pub(crate) fn set_time_until_next_execution_internal(&self, delay: Duration) {
        self.state.lock().time_until_next_execution = delay;
    }

    /// Reduce the remaining delay by `elapsed`, clamping at zero.
    pub(crate) fn elapse(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        state.time_until_next_execution =
            state.time_until_next_execution.saturating_sub(elapsed);
    }

    /// Run the action and apply the buffered scheduling requests.
    ///
    /// Called by the handler with the queue lock released.
    pub(crate) fn invoke(&self) {
        let mut ctx = WorkContext::new();
        self.action.lock().run(&mut ctx);

        let mut state = self.state.lock();
        if let Some(finished) = ctx.finished {
            state.finished = finished;
        }
        if let Some(delay) = ctx.delay {
            state.time_until_next_execution = delay;
        }
    }

    /// Snapshot the additional commands and drop the one-time entries.
    pub(crate) fn take_due_additional(&self) -> Vec<CommandRef> {
        let mut state = self.state.lock();
        let snapshot: Vec<CommandRef> = state
            .additional
            .iter()
            .map(|entry| entry.command.clone())
            .collect();
        state.additional.retain(|entry| !entry.one_time);
        snapshot
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Command")
            .field("priority", &state.priority)
            .field(
                "time_until_next_execution",
                &state.time_until_next_execution,
            )
            .field("finished", &state.finished)
            .field("additional", &state.additional.len())
            .finish()
    }
}

assert_impl_all!(Command: Send, Sync);
