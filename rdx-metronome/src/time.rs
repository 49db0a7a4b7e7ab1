//! The anti-drift tick loop that drives a [`Metronome`](crate::engine::Metronome).
//!
//! One [`TickLoop`] runs per active instance, on its own Tokio task. It
//! suspends only at the wait point: a `sleep_until` on the current expiry
//! anchor, raced against the controller's directive channel. Rescheduling is
//! always relative to the previous anchor, never to the current time, so
//! callback latency is absorbed once instead of compounding into phase drift.

use crate::config::CatchUpPolicy;
use crate::events::MetronomeEvent;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant};
use std::time::Duration;
use tracing::{debug, trace};

/// A function closure invoked once per tick.
pub type TickCallback = Box<dyn FnMut() + Send + Sync + 'static>;

/// Controller-to-worker command, carried on a `watch` channel.
///
/// `Run` carries the anchor to arm and an epoch that increases on every
/// `start`/`resume`. The worker re-arms only when the epoch changes, so a
/// pause/resume pair that lands between two worker wake-ups still produces a
/// fresh anchor instead of being collapsed away by the channel's
/// latest-value-only semantics.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Directive {
    Run { epoch: u64, anchor: Instant },
    Pause,
    Halt,
}

/// Worker-side state for one `start`–`stop` cycle.
pub(crate) struct TickLoop {
    interval: Duration,
    catch_up: CatchUpPolicy,
    callback: TickCallback,
    directive_rx: watch::Receiver<Directive>,
    events: broadcast::Sender<MetronomeEvent>,
    anchor: Instant,
    engaged: Option<u64>,
    seq: u64,
}

impl TickLoop {
    pub(crate) fn new(
        interval: Duration,
        catch_up: CatchUpPolicy,
        callback: TickCallback,
        directive_rx: watch::Receiver<Directive>,
        events: broadcast::Sender<MetronomeEvent>,
    ) -> Self {
        Self {
            interval,
            catch_up,
            callback,
            directive_rx,
            events,
            // Placeholder until the first Run directive is observed.
            anchor: Instant::now(),
            engaged: None,
            seq: 0,
        }
    }

    /// Drives the wait/invoke/re-arm cycle until halted.
    ///
    /// The `biased` select gives the directive channel priority over an
    /// expired timer, so a cancellation that races a due tick wins and the
    /// tick is not delivered.
    pub(crate) async fn run(mut self) {
        debug!("tick loop online");
        loop {
            let directive = *self.directive_rx.borrow_and_update();
            match directive {
                Directive::Halt => break,
                Directive::Pause => {
                    trace!("tick loop parked");
                    if self.directive_rx.changed().await.is_err() {
                        break;
                    }
                }
                Directive::Run { epoch, anchor } => {
                    if self.engaged != Some(epoch) {
                        self.anchor = anchor;
                        self.engaged = Some(epoch);
                    }
                    tokio::select! {
                        biased;
                        changed = self.directive_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = time::sleep_until(self.anchor) => self.fire(),
                    }
                }
            }
        }
        debug!(ticks = self.seq, "tick loop terminated");
    }

    /// Invokes the callback once and advances the anchor by one interval.
    fn fire(&mut self) {
        (self.callback)();
        self.seq += 1;
        self.events
            .send(MetronomeEvent::TickFired {
                seq: self.seq,
                scheduled_for: self.anchor,
            })
            .ok();
        self.anchor = next_anchor(self.anchor, self.interval, Instant::now(), self.catch_up);
    }
}

/// Computes the anchor for the next tick after one fired at `current`.
///
/// The nominal successor is `current + interval`, regardless of how long the
/// callback took. When that successor already lies in the past (the callback
/// overran), the policy decides: `Burst` keeps the late anchor so the wait
/// completes immediately and the loop catches up tick by tick; `Skip` jumps
/// to the first grid point strictly after `now`, dropping the missed ones.
pub(crate) fn next_anchor(
    current: Instant,
    interval: Duration,
    now: Instant,
    policy: CatchUpPolicy,
) -> Instant {
    let next = current + interval;
    if next > now {
        return next;
    }
    match policy {
        CatchUpPolicy::Burst => next,
        CatchUpPolicy::Skip => {
            let behind = now.duration_since(current).as_nanos();
            let step = interval.as_nanos().max(1);
            let periods = (behind / step) as u32 + 1;
            current + interval * periods
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn on_time_advance_stays_on_grid() {
        let current = Instant::now();
        let now = current + Duration::from_millis(10);
        for policy in [CatchUpPolicy::Burst, CatchUpPolicy::Skip] {
            assert_eq!(next_anchor(current, INTERVAL, now, policy), current + INTERVAL);
        }
    }

    #[test]
    fn burst_keeps_late_anchor_during_overrun() {
        let current = Instant::now();
        let now = current + Duration::from_millis(350);
        let next = next_anchor(current, INTERVAL, now, CatchUpPolicy::Burst);
        // The late anchor is preserved so the next wait completes immediately.
        assert_eq!(next, current + INTERVAL);
        assert!(next < now);
    }

    #[test]
    fn skip_jumps_to_first_grid_point_after_now() {
        let current = Instant::now();
        let now = current + Duration::from_millis(350);
        let next = next_anchor(current, INTERVAL, now, CatchUpPolicy::Skip);
        assert_eq!(next, current + Duration::from_millis(400));
    }

    #[test]
    fn skip_treats_exact_grid_point_as_missed() {
        let current = Instant::now();
        let now = current + Duration::from_millis(200);
        let next = next_anchor(current, INTERVAL, now, CatchUpPolicy::Skip);
        // A grid point landing exactly on `now` is already due, not upcoming.
        assert_eq!(next, current + Duration::from_millis(300));
    }
}
