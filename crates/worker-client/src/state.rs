use serde::Serialize;
use std::fmt;

/// Lifecycle of the supervised worker process.
///
/// ```text
/// Stopped -> Starting -> Ready <-> Busy
///               ^          |        |
///               |          v        v
///               +------- Crashed <--+
/// ```
///
/// `Starting` waits for the readiness marker on the worker's stderr.
/// `Crashed` lasts for the restart backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Stopped,
    Starting,
    Ready,
    Busy,
    Crashed,
}

impl WorkerState {
    /// The process is gone or on its way out
    pub fn is_down(self) -> bool {
        matches!(self, WorkerState::Crashed | WorkerState::Stopped)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Starting => "starting",
            WorkerState::Ready => "ready",
            WorkerState::Busy => "busy",
            WorkerState::Crashed => "crashed",
        };
        f.write_str(name)
    }
}
