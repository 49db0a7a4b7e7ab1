//! # Metronome
//!
//! An anti-drift periodic task scheduler for Tokio.
//!
//! Metronome invokes a user-supplied callback at a fixed nominal interval,
//! indefinitely, and exposes an explicit lifecycle: `start`, `pause`,
//! `resume`, `stop`. It is designed as a small primitive a host application
//! composes, not a task-queue framework.
//!
//! ## Core Concepts
//!
//! - **Expiry anchor**: the next scheduled wake time on the monotonic clock.
//!   After each tick the anchor advances by exactly one interval from its
//!   previous value, never from "now", so phase error from callback latency
//!   or scheduler jitter is absorbed once instead of accumulating.
//! - **Lifecycle**: one worker task per instance, created by `start` and
//!   joined by `stop`. `pause` cancels the pending wait but keeps the worker
//!   parked for a low-latency `resume` (which re-arms at `now + interval`;
//!   phase is not preserved across a pause).
//! - **Catch-up policy**: when a callback overruns its interval, the schedule
//!   either fires back-to-back until it catches up (`Burst`, the default) or
//!   drops the missed grid points (`Skip`). See
//!   [`CatchUpPolicy`](config::CatchUpPolicy).
//! - **Event-driven**: lifecycle transitions and ticks are broadcast as
//!   [`MetronomeEvent`](events::MetronomeEvent)s for observers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use metronome::prelude::*;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create an idle metronome.
//!     let beat = Metronome::new();
//!
//!     // 2. Start a 250ms schedule with a counting callback.
//!     let count = Arc::new(AtomicU32::new(0));
//!     let counter = count.clone();
//!     beat.start(Duration::from_millis(250), move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     })?;
//!
//!     // 3. Let it run, then shut it down gracefully.
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!     beat.stop().await;
//!
//!     println!("ticked {} times", count.load(Ordering::Relaxed));
//!     Ok(())
//! }
//! ```

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod time;

/// A prelude module for easy importing of the most common Metronome types.
pub mod prelude {
    pub use crate::common::LifecycleState;
    pub use crate::config::{CatchUpPolicy, MetronomeConfig};
    pub use crate::engine::Metronome;
    pub use crate::error::StartError;
    pub use crate::events::MetronomeEvent;
}
