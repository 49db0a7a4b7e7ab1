//! Contains common, primitive types shared across the Metronome crate.
//!
//! This module defines the lifecycle vocabulary used by the controller and
//! reported to callers. Keeping it as a distinct type (rather than loose
//! boolean flags) means every cross-thread observation of the lifecycle goes
//! through one synchronized value.

/// The lifecycle of a single [`Metronome`](crate::engine::Metronome) instance.
///
/// An instance is constructed `Idle`, moves to `Running` on a successful
/// `start`, oscillates between `Running` and `Paused` via `pause`/`resume`,
/// and lands in `Stopped` once `stop` has fully drained the worker. A
/// `Stopped` instance may be started again; each cycle gets a fresh worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed but never started.
    Idle,
    /// The worker is armed and ticks are being delivered.
    Running,
    /// The worker is alive but parked; no ticks are delivered.
    Paused,
    /// The worker has exited and been joined.
    Stopped,
}

impl LifecycleState {
    /// True while a worker exists for this instance (`Running` or `Paused`).
    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleState::Running | LifecycleState::Paused)
    }
}
