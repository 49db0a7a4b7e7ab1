//! Defines all configuration structures for the Metronome.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`, so a harness or host application can
//! choose the catch-up policy and event capacity externally from the code
//! that registers the callback.

use serde::Deserialize;

/// Options applied to a [`Metronome`](crate::engine::Metronome) at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct MetronomeConfig {
    /// How the schedule behaves when a callback overruns its interval.
    #[serde(default)]
    pub catch_up: CatchUpPolicy,

    /// Capacity of the lifecycle event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Policy for ticks whose scheduled time has already passed when the worker
/// gets to re-arm the wait (i.e., the callback ran longer than one interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatchUpPolicy {
    /// Fire back-to-back until the anchor catches up with the present.
    /// Every grid point gets an invocation, even if late.
    #[default]
    Burst,
    /// Drop missed grid points and re-arm at the first grid point strictly
    /// after the present. Alignment to the original grid is preserved.
    Skip,
}

// --- Default value functions for serde ---

fn default_event_capacity() -> usize {
    64
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            catch_up: CatchUpPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_burst() {
        let config = MetronomeConfig::default();
        assert_eq!(config.catch_up, CatchUpPolicy::Burst);
        assert_eq!(config.event_capacity, 64);
    }
}
