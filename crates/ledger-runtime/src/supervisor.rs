//! # Supervisor
//!
//! Library code never panics on an integrity violation. It returns a fatal
//! error, and whoever receives it hands it to the supervisor:
//!
//! ```text
//! subsystem ──Err(e)──→ Supervisor::check(component, &e)
//!                            │
//!              e.is_fatal()? ├── no  → Decision::Continue (logged)
//!                            └── yes → Decision::Abort { exit_code: 70 }
//!                                        │
//!                                        └─→ watch channel → main exits
//! ```
//!
//! The first fatal error wins; later ones are logged but do not replace it.

use parking_lot::Mutex;
use shared_types::NodeState;
use tokio::sync::watch;
use tracing::{error, warn};

use crate::errors::LedgerError;
use ledger_telemetry::LedgerMetrics;

/// Exit code for a consensus-safety abort (`EX_SOFTWARE`).
pub const EXIT_INTEGRITY_VIOLATION: i32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Abort { exit_code: i32 },
}

/// Why the process is stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortReason {
    pub component: String,
    pub message: String,
    pub exit_code: i32,
}

pub struct Supervisor {
    abort_tx: watch::Sender<Option<AbortReason>>,
    state: Mutex<NodeState>,
    metrics: LedgerMetrics,
}

impl Supervisor {
    pub fn new(metrics: LedgerMetrics) -> Self {
        let (abort_tx, _) = watch::channel(None);
        Self {
            abort_tx,
            state: Mutex::new(NodeState::Restoring),
            metrics,
        }
    }

    /// Classify an error raised by `component`.
    pub fn check(&self, component: &str, err: &LedgerError) -> Decision {
        if !err.is_fatal() {
            warn!("[supervisor] {} error: {}", component, err);
            return Decision::Continue;
        }

        error!("[supervisor] FATAL in {}: {}", component, err);
        self.metrics.integrity_violations.inc();
        *self.state.lock() = NodeState::Halted;

        let reason = AbortReason {
            component: component.to_string(),
            message: err.to_string(),
            exit_code: EXIT_INTEGRITY_VIOLATION,
        };
        self.abort_tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        Decision::Abort {
            exit_code: EXIT_INTEGRITY_VIOLATION,
        }
    }

    /// Pass `result` through, routing any error via [`Supervisor::check`].
    pub fn observe<T>(&self, component: &str, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
        if let Err(e) = &result {
            self.check(component, e);
        }
        result
    }

    /// Receiver that changes once, when the first fatal error arrives.
    pub fn subscribe(&self) -> watch::Receiver<Option<AbortReason>> {
        self.abort_tx.subscribe()
    }

    pub fn abort_reason(&self) -> Option<AbortReason> {
        self.abort_tx.borrow().clone()
    }

    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    pub fn mark_running(&self) {
        let mut state = self.state.lock();
        if *state == NodeState::Restoring {
            *state = NodeState::Running;
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state() == NodeState::Halted
    }
}
