//! Real-clock timing tests with tolerance bands.
//!
//! These run on the multi-threaded runtime against the actual OS clock, so
//! every assertion carries a generous margin for scheduler jitter. The
//! paused-clock suite in `lifecycle.rs` covers the exact-count properties;
//! this file covers the behaviors that only exist with a real clock: slow
//! callbacks, overruns, and the two catch-up policies.

use metronome::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Margin for OS scheduling and thread context switching.
const TIME_TOLERANCE: Duration = Duration::from_millis(50);

#[tokio::test(flavor = "multi_thread")]
async fn slow_callbacks_do_not_accumulate_phase_error() {
    let interval = Duration::from_millis(100);
    let beat = Metronome::new();

    let origin = Instant::now();
    let fire_times: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = fire_times.clone();

    assert!(beat
        .start(interval, move || {
            sink.lock().unwrap().push(origin.elapsed());
            // Simulate real work taking a visible fraction of the interval.
            thread::sleep(Duration::from_millis(10));
        })
        .unwrap());

    sleep(Duration::from_millis(1000) + interval).await;
    beat.stop().await;

    let fire_times = fire_times.lock().unwrap();
    let count = fire_times.len();
    assert!((8..=12).contains(&count), "count was {count}");

    // Signed phase error of tick k against its nominal grid point
    // (k+1)*interval. Anti-drift rescheduling means the 10ms of callback
    // latency is absorbed each cycle instead of compounding, so the error of
    // the last tick stays within jitter bounds.
    let errors: Vec<i128> = fire_times
        .iter()
        .enumerate()
        .map(|(k, at)| at.as_nanos() as i128 - ((k as i128 + 1) * interval.as_nanos() as i128))
        .collect();
    let last = *errors.last().unwrap();
    assert!(
        last.unsigned_abs() < (2 * TIME_TOLERANCE).as_nanos(),
        "final phase error was {last}ns"
    );
    // The error series must not grow monotonically over the run.
    assert!(
        errors.windows(2).any(|w| w[1] <= w[0] + TIME_TOLERANCE.as_nanos() as i128 / 10),
        "phase error grew monotonically: {errors:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn burst_policy_fires_back_to_back_after_an_overrun() {
    let interval = Duration::from_millis(50);
    let beat = Metronome::new(); // Burst is the default

    let fire_times: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = fire_times.clone();
    let seq = AtomicU32::new(0);

    assert!(beat
        .start(interval, move || {
            sink.lock().unwrap().push(Instant::now());
            // The first invocation overruns by several whole intervals.
            if seq.fetch_add(1, Ordering::Relaxed) == 0 {
                thread::sleep(Duration::from_millis(175));
            }
        })
        .unwrap());

    sleep(Duration::from_millis(500)).await;
    beat.stop().await;

    let fire_times = fire_times.lock().unwrap();
    // Every missed grid point is made up, so the count approaches 500/50.
    assert!(fire_times.len() >= 7, "count was {}", fire_times.len());

    // The catch-up ticks arrive with essentially no inter-call delay.
    let tight_gaps = fire_times
        .windows(2)
        .filter(|w| w[1].duration_since(w[0]) < Duration::from_millis(25))
        .count();
    assert!(tight_gaps >= 2, "only {tight_gaps} back-to-back invocations");
}

#[tokio::test(flavor = "multi_thread")]
async fn skip_policy_drops_missed_ticks_and_keeps_spacing() {
    let interval = Duration::from_millis(50);
    let beat = Metronome::with_config(MetronomeConfig {
        catch_up: CatchUpPolicy::Skip,
        ..Default::default()
    });

    let fire_times: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = fire_times.clone();
    let seq = AtomicU32::new(0);

    assert!(beat
        .start(interval, move || {
            sink.lock().unwrap().push(Instant::now());
            if seq.fetch_add(1, Ordering::Relaxed) == 0 {
                thread::sleep(Duration::from_millis(175));
            }
        })
        .unwrap());

    sleep(Duration::from_millis(500)).await;
    beat.stop().await;

    let fire_times = fire_times.lock().unwrap();
    assert!(fire_times.len() >= 2, "count was {}", fire_times.len());
    // Missed grid points are dropped rather than made up.
    assert!(fire_times.len() <= 9, "count was {}", fire_times.len());

    // No burst: consecutive invocations keep at least most of an interval
    // between them.
    let min_gap = fire_times
        .windows(2)
        .map(|w| w[1].duration_since(w[0]))
        .min()
        .unwrap();
    assert!(min_gap >= Duration::from_millis(35), "min gap was {min_gap:?}");
}
