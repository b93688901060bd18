use std::path::PathBuf;

use anyhow::{Context, Result};

use tick_engine::config::Config;
use tick_engine::pipeline::{JsonLinesSink, Pipeline};
use tick_engine::source;

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&PathBuf::from(path)),
        None => Config::load(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    // Init tracing on stderr; stdout carries the signal stream.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    let run_id = uuid::Uuid::new_v4();
    tracing::info!(
        %run_id,
        strategy = config.strategy.kind.as_label(),
        window = config.indicators.window_size,
        "Starting tick-engine"
    );

    let ticks = source::from_config(&config.source).context("failed to open tick source")?;
    let pipeline = Pipeline::new(&config).context("failed to build pipeline")?;

    let stop = pipeline.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, stopping");
            stop.stop();
        }
    });

    let stdout = std::io::stdout();
    let mut sink = JsonLinesSink::new(stdout.lock());
    let report = pipeline
        .run(ticks, &mut sink)
        .await
        .with_context(|| format!("pipeline run {} failed", run_id))?;

    tracing::info!(
        %run_id,
        ticks = report.ticks_ingested,
        rejected = report.ticks_rejected,
        snapshots = report.snapshots,
        signals = report.signals,
        dropped_ticks = report.dropped_ticks,
        dropped_snapshots = report.dropped_snapshots,
        reason = ?report.stop_reason,
        "Run complete"
    );
    Ok(())
}
