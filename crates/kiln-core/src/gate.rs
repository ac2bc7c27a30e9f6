//! Named run/pending gate with a single coalescing continuation slot.
//!
//! A [`RunGate`] serializes "start a run" requests. It is not a mutex: callers
//! never block on it. Instead, a request that arrives while a run is active is
//! remembered in a slot of capacity one (overwrite-on-full) and launched by
//! [`RunGate::mark_end_run`] when the active run finishes.
//!
//! The develop coordinator owns two independent gates: the compile gate, which
//! guards resuming the compiler, and the flush gate, which guards writing
//! page data to disk.
//!
//! # Claiming
//!
//! [`RunGate::run_or_enqueue`] claims the gate (`Idle -> Running`) under the
//! internal lock before invoking the action, and [`RunGate::mark_end_run`]
//! does the same on behalf of a queued action. Actions therefore must not call
//! [`RunGate::mark_start_run`] themselves; they only have to make sure that
//! `mark_end_run` is eventually called when their run is over.

use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, trace};

/// Deferred continuation stored in a gate's slot.
pub type GateAction = Box<dyn FnOnce() + Send + 'static>;

/// Observable state of a [`RunGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Nothing is running
    Idle,
    /// Exactly one run is active
    Running,
    /// A run is active and another one was requested meanwhile
    Pending,
}

struct GateInner {
    state: GateState,
    queued: Option<GateAction>,
}

/// A named run/pending gate.
pub struct RunGate {
    name: &'static str,
    inner: Mutex<GateInner>,
}

impl RunGate {
    /// Create an idle gate.
    ///
    /// The name only shows up in log output.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(GateInner {
                state: GateState::Idle,
                queued: None,
            }),
        }
    }

    /// Name this gate was created with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        self.inner.lock().state
    }

    /// Check whether no run is active.
    pub fn is_idle(&self) -> bool {
        self.state() == GateState::Idle
    }

    /// Check whether a continuation is waiting for the active run to end.
    pub fn has_queued_action(&self) -> bool {
        self.inner.lock().queued.is_some()
    }

    /// Record that a run has started.
    ///
    /// `Idle` becomes `Running`. If a run is already active the gate moves to
    /// `Pending`; nothing is retried from here.
    pub fn mark_start_run(&self) {
        let mut inner = self.inner.lock();
        let next = match inner.state {
            GateState::Idle => GateState::Running,
            GateState::Running | GateState::Pending => GateState::Pending,
        };
        trace!(gate = self.name, from = ?inner.state, to = ?next, "mark start run");
        inner.state = next;
    }

    /// Record that the active run has ended.
    ///
    /// If a continuation is queued, the gate is claimed for it and it is
    /// invoked after the internal lock is released. Otherwise the gate goes
    /// back to `Idle`. Calling this on an idle gate is a no-op, which keeps
    /// duplicate completion signals harmless.
    pub fn mark_end_run(&self) {
        let action = {
            let mut inner = self.inner.lock();
            match inner.state {
                GateState::Idle => {
                    trace!(gate = self.name, "ignoring end of run on idle gate");
                    None
                }
                GateState::Running => {
                    inner.state = GateState::Idle;
                    None
                }
                GateState::Pending => match inner.queued.take() {
                    Some(action) => {
                        inner.state = GateState::Running;
                        Some(action)
                    }
                    None => {
                        inner.state = GateState::Idle;
                        None
                    }
                },
            }
        };

        match action {
            Some(action) => {
                debug!(gate = self.name, "launching queued run");
                action();
            }
            None => trace!(gate = self.name, "gate idle"),
        }
    }

    /// Run `action` now if the gate is idle, otherwise park it in the slot.
    ///
    /// A parked action replaces whatever was parked before: only the latest
    /// request survives, and at most one extra run follows the active one.
    pub fn run_or_enqueue<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut inner = self.inner.lock();
            if inner.state != GateState::Idle {
                if inner.queued.replace(Box::new(action)).is_some() {
                    trace!(gate = self.name, "replaced queued action");
                }
                inner.state = GateState::Pending;
                debug!(gate = self.name, "run in progress, action queued");
                return;
            }
            inner.state = GateState::Running;
        }

        trace!(gate = self.name, "running action immediately");
        action();
    }
}

impl fmt::Debug for RunGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RunGate")
            .field("name", &self.name)
            .field("state", &inner.state)
            .field("queued", &inner.queued.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_start_and_end_round_trip_to_idle() {
        let gate = RunGate::new("compile");
        assert!(gate.is_idle());

        gate.mark_start_run();
        assert_eq!(gate.state(), GateState::Running);

        gate.mark_end_run();
        assert!(gate.is_idle());
    }

    #[test]
    fn test_repeated_start_is_pending_and_idempotent() {
        let gate = RunGate::new("compile");
        gate.mark_start_run();
        gate.mark_start_run();
        gate.mark_start_run();
        assert_eq!(gate.state(), GateState::Pending);
        assert!(!gate.has_queued_action());

        // Pending without a continuation just drops back to idle
        gate.mark_end_run();
        assert!(gate.is_idle());
    }

    #[test]
    fn test_end_on_idle_gate_is_noop() {
        let gate = RunGate::new("compile");
        gate.mark_end_run();
        gate.mark_end_run();
        assert!(gate.is_idle());
    }

    #[test]
    fn test_run_or_enqueue_runs_immediately_when_idle() {
        let gate = Arc::new(RunGate::new("flush"));
        let runs = counter();

        let seen = Arc::clone(&runs);
        let observed = Arc::new(Mutex::new(None));
        let observed_state = Arc::clone(&observed);
        let gate_in_action = Arc::clone(&gate);
        gate.run_or_enqueue(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            *observed_state.lock() = Some(gate_in_action.state());
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        // The gate is claimed before the action runs
        assert_eq!(*observed.lock(), Some(GateState::Running));
        assert_eq!(gate.state(), GateState::Running);
    }

    #[test]
    fn test_only_last_queued_action_runs() {
        let gate = RunGate::new("compile");
        let order = Arc::new(Mutex::new(Vec::new()));

        gate.mark_start_run();
        for n in 0..5 {
            let order = Arc::clone(&order);
            gate.run_or_enqueue(move || order.lock().push(n));
        }
        assert_eq!(gate.state(), GateState::Pending);
        assert!(order.lock().is_empty());

        gate.mark_end_run();
        assert_eq!(*order.lock(), vec![4]);
        assert_eq!(gate.state(), GateState::Running);

        gate.mark_end_run();
        assert!(gate.is_idle());
        assert_eq!(*order.lock(), vec![4]);
    }

    #[test]
    fn test_concurrent_starts_then_single_continuation() {
        let gate = Arc::new(RunGate::new("compile"));
        let runs = counter();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || gate.mark_start_run())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(gate.state(), GateState::Pending);

        let seen = Arc::clone(&runs);
        gate.run_or_enqueue(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        gate.mark_end_run();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        gate.mark_end_run();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(gate.is_idle());
    }

    #[test]
    fn test_queued_action_can_reenter_gate() {
        let gate = Arc::new(RunGate::new("flush"));
        let runs = counter();

        gate.mark_start_run();
        let inner_gate = Arc::clone(&gate);
        let seen = Arc::clone(&runs);
        gate.run_or_enqueue(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            // Finishing synchronously from inside the continuation must not deadlock
            inner_gate.mark_end_run();
        });

        gate.mark_end_run();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(gate.is_idle());
    }

    #[test]
    fn test_debug_output_names_gate() {
        let gate = RunGate::new("flush");
        let rendered = format!("{gate:?}");
        assert!(rendered.contains("flush"));
        assert!(rendered.contains("Idle"));
    }
}
