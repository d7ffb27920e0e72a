//! Command scheduling: the waiting/working queue pair and its processing tick.
//!
//! The [`CommandHandler`] owns two queues. Commands enter the *waiting*
//! queue via [`execute`](CommandHandler::execute), sorted by
//! (time-until-execution, priority, insertion order). Each
//! [`process`](CommandHandler::process) tick decrements the queued delays by
//! the elapsed wall-clock time, moves due commands into the bounded *working*
//! queue, and runs every working command whose delay has reached zero.
//! Commands that finish leave the working queue after their additional
//! commands have run inline; unfinished commands stay resident.
//!
//! The handler is an owned value: construct one, share it (it is `Sync`),
//! and call `process` from the one thread that drives your main loop.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use arbor_core::{Command, CommandHandler, WorkContext};
//!
//! let handler = CommandHandler::new();
//! let cmd = Command::with_delay(|_: &mut WorkContext| println!("due"), Duration::from_millis(20));
//! handler.execute(cmd)?;
//!
//! // Drive with an explicit clock (the wall-clock variant is `process()`).
//! let t0 = Instant::now();
//! assert_eq!(handler.process_at(t0), 0);
//! assert_eq!(handler.process_at(t0 + Duration::from_millis(20)), 1);
//! # Ok::<(), arbor_core::SchedulerError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use static_assertions::assert_impl_all;

use crate::command::CommandRef;
use crate::error::{Result, SchedulerError};

/// Default bound of the working queue.
const DEFAULT_MAX_WORKING: usize = 100;

/// Idle time reported when both queues are empty.
const EMPTY_IDLE_TIME: Duration = Duration::from_millis(1000);

/// A queued command plus its insertion sequence number.
///
/// The sequence number breaks ties between commands with equal
/// (time-until-execution, priority), giving stable FIFO ordering.
struct QueueEntry {
    command: CommandRef,
    seq: u64,
}

impl QueueEntry {
    fn sort_key(&self) -> (Duration, u32, u64) {
        (
            self.command.time_until_next_execution(),
            self.command.priority(),
            self.seq,
        )
    }
}

/// Queue state, all behind one mutex.
struct CommandQueues {
    /// Commands not yet due or not yet admitted. Kept sorted by
    /// (time-until-execution, priority, seq) ascending.
    waiting: Vec<QueueEntry>,
    /// Commands eligible for execution. Bounded by `max_working`.
    working: Vec<QueueEntry>,
    /// Bound for the working queue.
    max_working: usize,
    /// Whether the waiting queue needs a resort before the next admission.
    dirty: bool,
    /// Monotonically increasing insertion counter.
    next_seq: u64,
    /// Timestamp of the previous `process` call.
    last_process: Option<Instant>,
}

impl CommandQueues {
    fn contains(&self, command: &CommandRef) -> bool {
        self.waiting
            .iter()
            .chain(self.working.iter())
            .any(|entry| Arc::ptr_eq(&entry.command, command))
    }

    fn sort_waiting(&mut self) {
        self.waiting.sort_by_key(QueueEntry::sort_key);
        self.dirty = false;
    }

    fn insert_waiting(&mut self, command: CommandRef) {
        let entry = QueueEntry {
            command,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let key = entry.sort_key();
        let pos = self
            .waiting
            .partition_point(|other| other.sort_key() <= key);
        self.waiting.insert(pos, entry);
    }
}

/// Schedules and executes [`Command`](crate::Command)s.
///
/// One handler instance per process is the normal arrangement; whatever
/// constructs widgets and commands receives a reference to it. `execute`,
/// `remove_command`, and the attribute setters may be called from any
/// thread, while `process` belongs to the single thread driving the main
/// loop.
pub struct CommandHandler {
    queues: Mutex<CommandQueues>,
}

impl CommandHandler {
    /// Create a handler with an empty queue pair and the default working
    /// queue bound of 100.
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(CommandQueues {
                waiting: Vec::new(),
                working: Vec::new(),
                max_working: DEFAULT_MAX_WORKING,
                dirty: false,
                next_seq: 0,
                last_process: None,
            }),
        }
    }

    /// Enqueue a command into the waiting queue.
    ///
    /// The insertion position is determined by time-until-execution
    /// ascending, then priority ascending (0 sorts first), then insertion
    /// order (FIFO for full ties).
    ///
    /// Returns [`SchedulerError::AlreadyQueued`] if the command is already
    /// resident in either queue; a command occupies at most one queue slot
    /// at a time.
    pub fn execute(&self, command: CommandRef) -> Result<()> {
        let mut queues = self.queues.lock();
        if queues.contains(&command) {
            return Err(SchedulerError::AlreadyQueued);
        }
        tracing::trace!(
            target: "arbor_core::handler",
            priority = command.priority(),
            delay_ms = command.time_until_next_execution().as_millis() as u64,
            "enqueueing command"
        );
        queues.insert_waiting(command);
        Ok(())
    }

    /// Run one scheduling tick against the current wall clock.
    ///
    /// Returns the number of command actions that ran (including additional
    /// commands executed inline).
    pub fn process(&self) -> usize {
        self.process_at(Instant::now())
    }

    /// Run one scheduling tick with an explicit clock.
    ///
    /// The elapsed time since the previous tick is deducted from every
    /// queued command's delay (clamped at zero); if any ordering attribute
    /// changed since the last tick the waiting queue is re-sorted; due
    /// commands are admitted into the working queue while it is below its
    /// bound; and every working command whose delay has reached zero is run.
    ///
    /// Due commands that cannot be admitted because the working queue is
    /// full stay in the waiting queue, correctly ordered, for a later tick.
    #[tracing::instrument(skip(self), target = "arbor_core::handler", level = "trace")]
    pub fn process_at(&self, now: Instant) -> usize {
        let to_run = {
            let mut queues = self.queues.lock();

            let elapsed = queues
                .last_process
                .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
            queues.last_process = Some(now);

            if !elapsed.is_zero() {
                let mut newly_due = false;
                for entry in queues.waiting.iter().chain(queues.working.iter()) {
                    let before = entry.command.time_until_next_execution();
                    entry.command.elapse(elapsed);
                    if !before.is_zero() && entry.command.time_until_next_execution().is_zero() {
                        newly_due = true;
                    }
                }
                // Clamping collapses distinct due times into ties that the
                // (time, priority) ordering must now resolve by priority.
                if newly_due {
                    queues.dirty = true;
                }
            }

            if queues.dirty {
                queues.sort_waiting();
            }

            while queues.working.len() < queues.max_working {
                let due = queues
                    .waiting
                    .first()
                    .is_some_and(|entry| entry.command.time_until_next_execution().is_zero());
                if !due {
                    break;
                }
                let entry = queues.waiting.remove(0);
                queues.working.push(entry);
            }

            // Run order among due commands: all have zero delay left, so
            // priority then insertion order decides.
            let mut due: Vec<(u32, u64, CommandRef)> = queues
                .working
                .iter()
                .filter(|entry| entry.command.time_until_next_execution().is_zero())
                .map(|entry| (entry.command.priority(), entry.seq, entry.command.clone()))
                .collect();
            due.sort_by_key(|(priority, seq, _)| (*priority, *seq));
            due.into_iter().map(|(_, _, command)| command).collect::<Vec<_>>()
        };

        let mut executed = 0;
        for command in to_run {
            // An earlier action in this tick may have removed or deferred
            // this command; only commands still resident and due may run.
            {
                let queues = self.queues.lock();
                let resident = queues
                    .working
                    .iter()
                    .any(|entry| Arc::ptr_eq(&entry.command, &command));
                if !resident || !command.time_until_next_execution().is_zero() {
                    continue;
                }
            }

            // The queue lock is released while the action runs so the action
            // may itself call execute/remove on this handler.
            command.invoke();
            executed += 1;

            if command.is_finished() {
                self.queues
                    .lock()
                    .working
                    .retain(|entry| !Arc::ptr_eq(&entry.command, &command));
                executed += self.run_additional(&command);
            }
        }

        if executed > 0 {
            tracing::trace!(target: "arbor_core::handler", executed, "processed tick");
        }
        executed
    }

    /// Execute a finished command's additional commands inline.
    ///
    /// Each entry in the finishing command's list runs exactly once, in list
    /// order. The additionals' own lists are not visited, so a command
    /// reachable from its own list (including itself) runs once and the loop
    /// terminates. An additional that stays unfinished is enqueued through
    /// the normal `execute` path instead.
    fn run_additional(&self, command: &CommandRef) -> usize {
        let mut executed = 0;
        for additional in command.take_due_additional() {
            additional.invoke();
            executed += 1;

            if !additional.is_finished() {
                if let Err(err) = self.execute(additional) {
                    tracing::debug!(
                        target: "arbor_core::handler",
                        %err,
                        "unfinished additional command not re-enqueued"
                    );
                }
            }
        }
        executed
    }

    /// Change the bound of the working queue.
    ///
    /// A smaller bound does not evict already-admitted commands; it only
    /// limits future admissions.
    pub fn set_max_working(&self, max: usize) {
        self.queues.lock().max_working = max;
    }

    /// The current working queue bound.
    pub fn max_working(&self) -> usize {
        self.queues.lock().max_working
    }

    /// Change a command's priority (0 is highest).
    ///
    /// If the command is queued, the waiting queue is marked dirty and
    /// re-sorted on the next `process` tick rather than eagerly.
    pub fn set_priority(&self, command: &CommandRef, priority: u32) {
        let mut queues = self.queues.lock();
        command.set_priority_internal(priority);
        if queues.contains(command) {
            queues.dirty = true;
        }
    }

    /// Change a command's delay until its next execution.
    ///
    /// Same lazy-resort behavior as [`set_priority`](Self::set_priority).
    pub fn set_time_until_next_execution(&self, command: &CommandRef, delay: Duration) {
        let mut queues = self.queues.lock();
        command.set_time_until_next_execution_internal(delay);
        if queues.contains(command) {
            queues.dirty = true;
        }
    }

    /// Remove a command from whichever queue holds it.
    ///
    /// Returns `true` if the command was queued. Removing an absent command
    /// is a no-op, so calling this twice is safe. Removal is best-effort
    /// cancellation: a run already in progress is not preempted.
    pub fn remove_command(&self, command: &CommandRef) -> bool {
        let mut queues = self.queues.lock();
        let before = queues.waiting.len() + queues.working.len();
        queues
            .waiting
            .retain(|entry| !Arc::ptr_eq(&entry.command, command));
        queues
            .working
            .retain(|entry| !Arc::ptr_eq(&entry.command, command));
        let removed = queues.waiting.len() + queues.working.len() != before;
        if removed {
            tracing::trace!(target: "arbor_core::handler", "removed command");
        }
        removed
    }

    /// Check whether a command is resident in either queue.
    pub fn is_command_in_queue(&self, command: &CommandRef) -> bool {
        self.queues.lock().contains(command)
    }

    /// Time until the next queued command is due, for sizing main-loop
    /// sleeps.
    ///
    /// Returns the minimum remaining delay across both queues, exact as of
    /// the last `process` call, or 1000 ms when both queues are empty.
    pub fn idle_time(&self) -> Duration {
        let queues = self.queues.lock();
        queues
            .waiting
            .iter()
            .chain(queues.working.iter())
            .map(|entry| entry.command.time_until_next_execution())
            .min()
            .unwrap_or(EMPTY_IDLE_TIME)
    }

    /// Number of commands in the waiting queue.
    pub fn waiting_len(&self) -> usize {
        self.queues.lock().waiting.len()
    }

    /// Number of commands in the working queue.
    pub fn working_len(&self) -> usize {
        self.queues.lock().working.len()
    }

    /// Render a one-line summary of both queues.
    pub fn dump_queues(&self) -> String {
        let queues = self.queues.lock();
        let summary = format!(
            "waiting: {} command(s), working: {} command(s) (max {}), dirty: {}",
            queues.waiting.len(),
            queues.working.len(),
            queues.max_working,
            queues.dirty,
        );
        tracing::debug!(target: "arbor_core::handler", "{summary}");
        summary
    }

    /// Render a per-command listing of both queues.
    pub fn dump_commands(&self) -> String {
        let queues = self.queues.lock();
        let mut out = String::new();
        for (label, queue) in [("waiting", &queues.waiting), ("working", &queues.working)] {
            out.push_str(label);
            out.push_str(":\n");
            for entry in queue.iter() {
                out.push_str(&format!("  #{} {:?}\n", entry.seq, entry.command));
            }
        }
        tracing::debug!(target: "arbor_core::handler", "{out}");
        out
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(CommandHandler: Send, Sync);
