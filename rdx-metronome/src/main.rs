use anyhow::Result;
use metronome::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // 2. Create three independent metronomes, one schedule each. The slow
    //    one drops missed ticks instead of bursting.
    let fast = Metronome::new();
    let medium = Metronome::new();
    let slow = Metronome::with_config(MetronomeConfig {
        catch_up: CatchUpPolicy::Skip,
        ..Default::default()
    });

    // 3. Watch the medium metronome's lifecycle events.
    spawn_event_listener(&medium);

    // 4. Start all three with counting callbacks.
    let fast_count = Arc::new(AtomicU32::new(0));
    let medium_count = Arc::new(AtomicU32::new(0));
    let slow_count = Arc::new(AtomicU32::new(0));

    let counter = fast_count.clone();
    fast.start(Duration::from_millis(50), move || {
        let current = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if current % 10 == 0 {
            info!("[FAST 50ms] => count is now {}", current);
        }
    })?;

    let counter = medium_count.clone();
    medium.start(Duration::from_millis(200), move || {
        let current = counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[MEDIUM 200ms] => count is now {}", current);
    })?;

    let counter = slow_count.clone();
    slow.start(Duration::from_secs(1), move || {
        let current = counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[SLOW 1s] => count is now {}", current);
    })?;

    info!("All three metronomes running on the shared runtime.");

    // 5. Demonstrate pause/resume on the medium schedule.
    tokio::time::sleep(Duration::from_secs(5)).await;
    info!("--- PAUSING the 200ms metronome for 2 seconds ---");
    medium.pause();

    tokio::time::sleep(Duration::from_secs(2)).await;
    info!("--- RESUMING the 200ms metronome ---");
    medium.resume();

    tokio::time::sleep(Duration::from_secs(3)).await;

    // 6. Gracefully stop all three and report final counts.
    info!("Stopping the metronomes...");
    fast.stop().await;
    medium.stop().await;
    slow.stop().await;

    info!("Final count, fast   (50ms): {}", fast_count.load(Ordering::Relaxed));
    info!("Final count, medium (200ms): {}", medium_count.load(Ordering::Relaxed));
    info!("Final count, slow   (1s): {}", slow_count.load(Ordering::Relaxed));

    Ok(())
}

/// Spawns a task that logs every lifecycle event from the given metronome.
fn spawn_event_listener(beat: &Metronome) {
    let mut events = beat.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                MetronomeEvent::TickFired { .. } => {}
                other => info!("[EVENT] => {:?}", other),
            }
        }
    });
}
