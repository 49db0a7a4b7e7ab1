//! Benchmark harness for the metronome scheduler.
//!
//! Drives one instance at a configurable interval, samples the signed phase
//! error of every invocation against the nominal tick grid, then writes the
//! samples to a CSV file and prints a summary. Settings come from
//! `metrobench.toml` and/or `METROBENCH_*` environment variables.

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use config::{Config, Environment, File as ConfigFile};
use metronome::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Benchmark settings, loadable from `metrobench.toml` or the environment.
#[derive(Debug, Clone, Deserialize)]
struct BenchSettings {
    /// Nominal interval between invocations, in microseconds.
    #[serde(default = "default_interval_us")]
    interval_us: u64,
    /// Total run duration, in seconds.
    #[serde(default = "default_duration_secs")]
    duration_secs: u64,
    /// Catch-up policy applied to the instance under test.
    #[serde(default)]
    catch_up: CatchUpPolicy,
    /// Path of the CSV sample file to write.
    #[serde(default = "default_output")]
    output: String,
}

fn default_interval_us() -> u64 {
    1_000
}

fn default_duration_secs() -> u64 {
    10
}

fn default_output() -> String {
    "metrobench.csv".to_string()
}

/// One invocation observed by the sampling callback.
#[derive(Debug, Clone, Copy)]
struct Sample {
    seq: u64,
    elapsed_ns: u64,
    expected_ns: u64,
    phase_error_ns: i64,
}

/// Aggregate statistics over a full run.
#[derive(Debug, Clone, Copy)]
struct Summary {
    count: usize,
    mean_abs_error_ns: i64,
    max_abs_error_ns: i64,
    final_error_ns: i64,
}

fn summarize(samples: &[Sample]) -> Option<Summary> {
    let last = samples.last()?;
    let total_abs: i128 = samples
        .iter()
        .map(|s| i128::from(s.phase_error_ns.unsigned_abs()))
        .sum();
    let max_abs = samples
        .iter()
        .map(|s| s.phase_error_ns.unsigned_abs())
        .max()
        .unwrap_or(0);
    Some(Summary {
        count: samples.len(),
        mean_abs_error_ns: (total_abs / samples.len() as i128) as i64,
        max_abs_error_ns: max_abs as i64,
        final_error_ns: last.phase_error_ns,
    })
}

fn load_settings() -> Result<BenchSettings> {
    let cfg = Config::builder()
        .add_source(ConfigFile::with_name("metrobench").required(false))
        .add_source(Environment::with_prefix("METROBENCH"))
        .build()
        .context("assembling benchmark configuration")?;
    cfg.try_deserialize()
        .context("deserializing benchmark configuration")
}

fn write_csv(path: &str, settings: &BenchSettings, samples: &[Sample]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut out = BufWriter::new(file);
    writeln!(
        out,
        "# metrobench run {} interval_us={} duration_secs={} catch_up={:?}",
        Utc::now().to_rfc3339(),
        settings.interval_us,
        settings.duration_secs,
        settings.catch_up,
    )?;
    writeln!(out, "seq,elapsed_ns,expected_ns,phase_error_ns")?;
    for s in samples {
        writeln!(
            out,
            "{},{},{},{}",
            s.seq, s.elapsed_ns, s.expected_ns, s.phase_error_ns
        )?;
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let settings = load_settings()?;
    let interval = Duration::from_micros(settings.interval_us);
    let duration = Duration::from_secs(settings.duration_secs);
    info!(?interval, ?duration, policy = ?settings.catch_up, "metrobench starting");

    let expected_samples = (duration.as_nanos() / interval.as_nanos().max(1)) as usize + 64;
    let samples: Arc<Mutex<Vec<Sample>>> =
        Arc::new(Mutex::new(Vec::with_capacity(expected_samples)));

    let beat = Metronome::with_config(MetronomeConfig {
        catch_up: settings.catch_up,
        ..Default::default()
    });

    // The sampling callback measures its own invocation against the nominal
    // grid: tick k is scheduled at origin + (k+1) * interval.
    let sink = samples.clone();
    let interval_ns = interval.as_nanos() as u64;
    let origin = Instant::now();
    let mut seq: u64 = 0;
    beat.start(interval, move || {
        let elapsed_ns = origin.elapsed().as_nanos() as u64;
        let expected_ns = (seq + 1) * interval_ns;
        let phase_error_ns = elapsed_ns as i64 - expected_ns as i64;
        sink.lock().unwrap().push(Sample {
            seq,
            elapsed_ns,
            expected_ns,
            phase_error_ns,
        });
        seq += 1;
    })?;

    tokio::time::sleep(duration).await;
    beat.stop().await;

    let samples = samples.lock().unwrap();
    write_csv(&settings.output, &settings, &samples)?;
    info!(count = samples.len(), path = %settings.output, "samples written");

    println!("\n{}", "metrobench summary".cyan().bold());
    println!("{}", "------------------".dimmed());
    match summarize(&samples) {
        Some(summary) => {
            println!("invocations      : {}", summary.count.to_string().green());
            println!(
                "nominal          : {}",
                format!("{}", duration.as_nanos() / interval.as_nanos().max(1)).dimmed()
            );
            println!("mean |error|     : {} ns", summary.mean_abs_error_ns.to_string().yellow());
            println!("max  |error|     : {} ns", summary.max_abs_error_ns.to_string().yellow());
            println!("final error      : {} ns", summary.final_error_ns.to_string().yellow());
        }
        None => println!("{}", "no samples recorded".red()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seq: u64, error: i64) -> Sample {
        Sample {
            seq,
            elapsed_ns: (seq + 1) * 1_000_000,
            expected_ns: (seq + 1) * 1_000_000,
            phase_error_ns: error,
        }
    }

    #[test]
    fn summarize_empty_run_yields_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn summarize_reports_mean_max_and_final() {
        let samples = [sample(0, 100), sample(1, -300), sample(2, 200)];
        let summary = summarize(&samples).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean_abs_error_ns, 200);
        assert_eq!(summary.max_abs_error_ns, 300);
        assert_eq!(summary.final_error_ns, 200);
    }
}
