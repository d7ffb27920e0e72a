//! Signal/slot notification fabric.
//!
//! A [`Signal<Args>`] is a minimal observer/subject mechanism: subjects own
//! a signal per notification channel and emit it when their value or state
//! changes; observers connect closures. Dispatch is direct and synchronous
//! in the emitting thread.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Example
//!
//! ```
//! use arbor_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(&42);
//!
//! value_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`]. The ID remains valid until the connection is
    /// explicitly disconnected or the signal is dropped.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal with any number of connected slots.
///
/// Emitting a signal invokes every connected slot, in connection order,
/// with a reference to the emitted arguments. Slots connected while an emit
/// is in progress are not invoked by that emit.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for
///   signals with no payload, or a tuple for multiple arguments.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
        })
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing. Useful during
    /// initialization or batch updates to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// If the signal is blocked, this does nothing. The connection set is
    /// snapshotted before invocation, so slots may connect or disconnect
    /// from within a slot without deadlocking; connections made during the
    /// emit are not invoked by it.
    #[tracing::instrument(skip_all, target = "arbor_core::signal", level = "trace")]
    pub fn emit(&self, args: &Args) {
        if self.is_blocked() {
            tracing::trace!(target: "arbor_core::signal", "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = {
            let connections = self.connections.lock();
            connections.values().map(|conn| conn.slot.clone()).collect()
        };
        tracing::trace!(target: "arbor_core::signal", connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(args);
        }
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// # Safety
    ///
    /// The returned guard holds a raw pointer to this signal. The signal must
    /// outlive the guard. Using `Arc<Signal<Args>>` is recommended for shared
    /// ownership.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            signal: self as *const Signal<Args>,
            id,
        }
    }
}

/// RAII connection handle that disconnects its slot on drop.
pub struct ConnectionGuard<Args> {
    signal: *const Signal<Args>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// The ID of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        // SAFETY: The signal pointer is valid if the guard is used correctly.
        // The caller must ensure the signal outlives the guard.
        unsafe {
            if !self.signal.is_null() {
                let _ = (*self.signal).disconnect(self.id);
            }
        }
    }
}

// SAFETY: The raw pointer is only dereferenced in `drop()`, Signal itself is
// Send + Sync, and the guard's contract requires the signal to outlive it.
unsafe impl<Args: Send> Send for ConnectionGuard<Args> {}
unsafe impl<Args: Send> Sync for ConnectionGuard<Args> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(&42);
        signal.emit(&100);

        assert_eq!(*received.lock(), vec![42, 100]);
    }

    #[test]
    fn test_slots_invoked_in_connection_order() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = order.clone();
            signal.connect(move |_| order.lock().push(tag));
        }

        signal.emit(&());
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let id = signal.connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(&());
        assert!(signal.disconnect(id));
        signal.emit(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!signal.disconnect(id));
    }

    #[test]
    fn test_blocked_signal_does_not_emit() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        signal.connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_blocked(true);
        assert!(signal.is_blocked());
        signal.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        signal.set_blocked(false);
        signal.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connect_during_emit_is_deferred() {
        let signal = Arc::new(Signal::<()>::new());
        let count = Arc::new(AtomicUsize::new(0));

        let signal_clone = signal.clone();
        let count_clone = count.clone();
        signal.connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            let inner_count = count_clone.clone();
            signal_clone.connect(move |_| {
                inner_count.fetch_add(10, Ordering::SeqCst);
            });
        });

        // The slot added during the first emit only fires on the second.
        signal.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        signal.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_connection_guard_disconnects_on_drop() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        {
            let count_clone = count.clone();
            let _guard = signal.connect_scoped(move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(signal.connection_count(), 1);
            signal.emit(&());
        }

        assert_eq!(signal.connection_count(), 0);
        signal.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
