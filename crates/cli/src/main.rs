mod cli;
mod config;
mod report;

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tilescan_compute::algorithms::scan::tabulate;
use tilescan_compute::{
    sync_wait, AsyncValue, Outcome, ScanBuffers, Scheduler, SchedulerConfig, Sum, TiledScanPipeline,
};

use crate::cli::CliArgs;
use crate::report::{closed_form_total, IterationReport, RunReport};

/// Drive a deferred value to completion, on `scheduler` when given.
fn wait<T: Send>(value: AsyncValue<'_, T>, scheduler: Option<&Scheduler>) -> Result<T> {
    let value = match scheduler {
        Some(scheduler) => value.on(scheduler),
        None => value,
    };
    match sync_wait(value) {
        Outcome::Value(v) => Ok(v),
        Outcome::Error(e) => Err(e).context("deferred computation failed"),
        Outcome::Stopped => bail!("deferred computation was stopped"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = config::resolve(&args)?;
    config.log_summary();

    let scheduler = if args.inline {
        info!("Driving inline on the calling thread");
        None
    } else {
        let scheduler = Scheduler::new(SchedulerConfig::from(&config))
            .context("failed to start worker pool")?;
        Some(scheduler)
    };

    let first: u64 = if args.from_zero { 0 } else { 1 };
    let expected = closed_form_total(args.seed, config.len, first)?;
    let pipeline = TiledScanPipeline::from_config(&config, Sum)?;
    let mut data = vec![0u64; config.len];
    let mut runs = Vec::with_capacity(config.iterations);

    for iteration in 0..config.iterations {
        let fill = tabulate(&mut data, config.tile_count, move |i| i as u64 + first);
        wait(fill, scheduler.as_ref()).context("fill failed")?;

        let scan = pipeline.run(AsyncValue::immediate(args.seed), ScanBuffers::in_place(&mut data));
        info!(iteration, "scan has started");
        let start = Instant::now();
        let total = wait(scan, scheduler.as_ref()).context("scan failed")?;
        let seconds = start.elapsed().as_secs_f64();
        info!(iteration, "scan took {:.6}s", seconds);

        let ok = total == expected && data.last().map_or(true, |&last| last == total);
        if !ok {
            warn!(iteration, total, expected, "scan total mismatch");
        }
        runs.push(IterationReport { iteration, total, seconds, ok });
    }

    let report = RunReport {
        config,
        inline: args.inline,
        seed: args.seed,
        expected,
        runs,
        metrics: scheduler.as_ref().map(Scheduler::metrics),
    };
    if let Some(mean) = report.mean_seconds() {
        info!("mean scan time {:.6}s over {} runs", mean, report.runs.len());
    }

    let summary = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", summary);

    let mismatches = report.mismatches();
    if mismatches > 0 {
        bail!("{} of {} scans produced a wrong total", mismatches, report.runs.len());
    }
    Ok(())
}
