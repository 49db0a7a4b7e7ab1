//! Defines the public event types broadcast by a [`Metronome`](crate::engine::Metronome).
//!
//! Observers subscribe with
//! [`Metronome::subscribe_events`](crate::engine::Metronome::subscribe_events)
//! and receive strongly-typed lifecycle notifications. Event delivery is
//! best-effort: sends never block the scheduler, and lagging receivers miss
//! events rather than slowing the tick loop down.

use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle and tick notifications for one metronome instance.
#[derive(Debug, Clone)]
pub enum MetronomeEvent {
    /// Fired once per successful `start`, carrying the armed interval.
    Started { interval: Duration },
    /// Fired after each callback invocation. `seq` counts invocations within
    /// the current `start`–`stop` cycle; `scheduled_for` is the anchor the
    /// invocation was scheduled at (not the instant it actually ran).
    TickFired { seq: u64, scheduled_for: Instant },
    /// Fired when the pending wait has been cancelled by `pause`.
    Paused,
    /// Fired when `resume` has re-armed the schedule with a fresh anchor.
    Resumed,
    /// Fired once the worker has fully exited after `stop`.
    Stopped,
}
