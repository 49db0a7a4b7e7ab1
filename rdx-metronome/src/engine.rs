//! The lifecycle controller for a periodic schedule.
//!
//! A [`Metronome`] owns at most one background worker at a time and exposes
//! the four lifecycle operations: `start`, `pause`, `resume`, `stop`. The
//! controller side runs on arbitrary caller threads; only `stop` waits (for
//! the worker to drain). All state crossing the controller/worker boundary
//! travels through a mutex-guarded control block and a `watch` channel.

use crate::common::LifecycleState;
use crate::config::{CatchUpPolicy, MetronomeConfig};
use crate::error::StartError;
use crate::events::MetronomeEvent;
use crate::time::{Directive, TickLoop};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A periodic task scheduler with an explicit lifecycle.
///
/// One instance drives one callback on one anti-drift schedule. The handle is
/// cheap to clone and can be shared across tasks and threads; all clones
/// control the same underlying schedule.
///
/// Invocations are strictly serialized per instance: the callback is owned by
/// a single worker task, so invocation *k+1* never begins before invocation
/// *k* returns, no matter how many runtime threads exist.
///
/// Dropping the last handle signals the worker to halt and aborts it at its
/// next wait point. For a fully drained shutdown (guaranteed no invocation
/// after return), call [`stop`](Metronome::stop) instead.
#[derive(Clone)]
pub struct Metronome {
    inner: Arc<Inner>,
}

struct Inner {
    control: Mutex<Control>,
    events: broadcast::Sender<MetronomeEvent>,
    catch_up: CatchUpPolicy,
}

/// Controller-side state, guarded by one mutex.
struct Control {
    state: LifecycleState,
    /// Interval of the current cycle; meaningless outside an active cycle.
    interval: Duration,
    /// Bumped on every `start`/`resume` so the worker can tell re-arms apart.
    epoch: u64,
    directive_tx: Option<watch::Sender<Directive>>,
    worker: Option<JoinHandle<()>>,
}

impl Metronome {
    /// Creates an idle metronome with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MetronomeConfig::default())
    }

    /// Creates an idle metronome with the given configuration.
    pub fn with_config(config: MetronomeConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                control: Mutex::new(Control {
                    state: LifecycleState::Idle,
                    interval: Duration::ZERO,
                    epoch: 0,
                    directive_tx: None,
                    worker: None,
                }),
                events,
                catch_up: config.catch_up,
            }),
        }
    }

    /// Starts periodic execution of `callback` every `interval`.
    ///
    /// Arms the first anchor at `now + interval`, spawns the worker task, and
    /// transitions to `Running`. Returns `Ok(false)` without touching the
    /// existing schedule if the instance is already `Running` or `Paused`.
    /// A previously stopped instance may be started again; each cycle gets a
    /// fresh worker and channel.
    ///
    /// # Errors
    ///
    /// [`StartError::ZeroInterval`] if `interval` is zero, and
    /// [`StartError::NoRuntime`] if no Tokio runtime is reachable from the
    /// calling thread. In both cases the instance is left in its pre-start
    /// state.
    pub fn start(
        &self,
        interval: Duration,
        callback: impl FnMut() + Send + Sync + 'static,
    ) -> Result<bool, StartError> {
        let mut control = self.inner.control.lock().unwrap();
        if control.state.is_active() {
            debug!(state = ?control.state, "start ignored: already active");
            return Ok(false);
        }
        if interval.is_zero() {
            return Err(StartError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| StartError::NoRuntime)?;

        control.epoch += 1;
        let anchor = Instant::now() + interval;
        let (directive_tx, directive_rx) = watch::channel(Directive::Run {
            epoch: control.epoch,
            anchor,
        });
        let worker = TickLoop::new(
            interval,
            self.inner.catch_up,
            Box::new(callback),
            directive_rx,
            self.inner.events.clone(),
        );
        control.worker = Some(runtime.spawn(worker.run()));
        control.directive_tx = Some(directive_tx);
        control.interval = interval;
        control.state = LifecycleState::Running;

        info!(?interval, "metronome started");
        self.inner.events.send(MetronomeEvent::Started { interval }).ok();
        Ok(true)
    }

    /// Suspends tick delivery without tearing the worker down.
    ///
    /// Cancels the pending wait; the worker stays alive and parked, so
    /// [`resume`](Metronome::resume) is low-latency. No-op unless `Running`.
    pub fn pause(&self) {
        let mut control = self.inner.control.lock().unwrap();
        if control.state != LifecycleState::Running {
            return;
        }
        if let Some(tx) = &control.directive_tx {
            tx.send(Directive::Pause).ok();
        }
        control.state = LifecycleState::Paused;
        info!("metronome paused");
        self.inner.events.send(MetronomeEvent::Paused).ok();
    }

    /// Re-arms the schedule after a pause.
    ///
    /// The new anchor is `now + interval`: phase is not preserved across a
    /// pause. No-op unless `Paused`.
    pub fn resume(&self) {
        let mut control = self.inner.control.lock().unwrap();
        if control.state != LifecycleState::Paused {
            return;
        }
        control.epoch += 1;
        let anchor = Instant::now() + control.interval;
        if let Some(tx) = &control.directive_tx {
            tx.send(Directive::Run {
                epoch: control.epoch,
                anchor,
            })
            .ok();
        }
        control.state = LifecycleState::Running;
        info!("metronome resumed");
        self.inner.events.send(MetronomeEvent::Resumed).ok();
    }

    /// Halts the schedule and waits for the worker to exit.
    ///
    /// Idempotent: a no-op when the instance is `Idle` or already `Stopped`.
    /// Once this returns, no further invocation will occur, however far time
    /// advances.
    ///
    /// Must not be awaited from inside the periodic callback itself: the
    /// callback runs on the very task this method joins, so doing so is a
    /// self-join programming error. (The callback is synchronous, so getting
    /// there requires `block_on`, which Tokio rejects with a panic rather
    /// than letting the deadlock happen silently.)
    pub async fn stop(&self) {
        let worker = {
            let mut control = self.inner.control.lock().unwrap();
            if !control.state.is_active() {
                return;
            }
            if let Some(tx) = &control.directive_tx {
                tx.send(Directive::Halt).ok();
            }
            control.directive_tx = None;
            control.state = LifecycleState::Stopped;
            control.worker.take()
        };
        if let Some(handle) = worker {
            if handle.await.is_err() {
                warn!("worker aborted or panicked during shutdown");
            }
        }
        info!("metronome stopped");
        self.inner.events.send(MetronomeEvent::Stopped).ok();
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.control.lock().unwrap().state
    }

    /// Subscribes to the [`MetronomeEvent`] stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // No clone of the handle remains, so nobody can await a drained
        // shutdown: signal halt and abort the worker at its wait point. A
        // callback already executing finishes; nothing new begins.
        let control = match self.control.get_mut() {
            Ok(control) => control,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(tx) = control.directive_tx.take() {
            tx.send(Directive::Halt).ok();
        }
        if let Some(worker) = control.worker.take() {
            worker.abort();
        }
    }
}
