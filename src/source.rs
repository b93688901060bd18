use std::path::Path;
use std::time::Duration;

use chrono::DateTime;
use futures_util::stream::{self, BoxStream, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::config::SourceConfig;
use crate::error::EngineError;
use crate::model::tick::Tick;

pub type TickStream = BoxStream<'static, Result<Tick, EngineError>>;

/// Build the tick stream described by `[source]`.
pub fn from_config(config: &SourceConfig) -> Result<TickStream, EngineError> {
    match config {
        SourceConfig::Csv { path } => csv_replay(path),
        SourceConfig::RandomWalk {
            symbol,
            start_price,
            ticks,
            seed,
            interval_ms,
        } => Ok(random_walk(
            symbol,
            *start_price,
            *ticks,
            *seed,
            Duration::from_millis(*interval_ms),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    symbol: String,
    timestamp: String,
    price: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Milliseconds since epoch from an integer or an RFC 3339 string.
pub fn parse_timestamp_ms(raw: &str) -> Result<u64, EngineError> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<u64>() {
        return Ok(ms);
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| EngineError::invalid("timestamp", format!("{raw:?}: {e}")))?;
    u64::try_from(parsed.timestamp_millis())
        .map_err(|_| EngineError::invalid("timestamp", format!("{raw:?} is before the epoch")))
}

/// Rows read ahead of the consumer by the CSV reader thread.
const CSV_READ_AHEAD: usize = 256;

fn csv_tick(idx: usize, row: Result<CsvRow, csv::Error>) -> Result<Tick, EngineError> {
    let row = row?;
    Ok(Tick {
        symbol: row.symbol.trim().to_ascii_uppercase(),
        price: row.price,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
        timestamp_ms: parse_timestamp_ms(&row.timestamp)?,
        sequence: idx as u64 + 1,
    })
}

/// Replay `symbol,timestamp,price,high,low,close,volume` rows in file order.
///
/// The file is opened up front so a missing file fails here. Rows are then
/// parsed on a blocking thread and handed over through a bounded channel;
/// dropping the stream stops the reader. Must be called inside a tokio runtime.
pub fn csv_replay(path: &Path) -> Result<TickStream, EngineError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    tracing::info!(path = %path.display(), "replaying ticks from CSV");

    let (tick_tx, tick_rx) = mpsc::channel::<Result<Tick, EngineError>>(CSV_READ_AHEAD);
    tokio::task::spawn_blocking(move || {
        for (idx, row) in reader.into_deserialize::<CsvRow>().enumerate() {
            if tick_tx.blocking_send(csv_tick(idx, row)).is_err() {
                tracing::debug!(rows = idx, "CSV consumer gone, reader stopping");
                return;
            }
        }
    });
    let rows = stream::unfold(tick_rx, |mut rx| async move {
        let tick = rx.recv().await?;
        Some((tick, rx))
    });
    Ok(rows.boxed())
}

/// Seeded synthetic ticks: multiplicative random walk with a small intrabar range.
pub fn random_walk(
    symbol: &str,
    start_price: f64,
    ticks: u64,
    seed: u64,
    interval: Duration,
) -> TickStream {
    struct Walk {
        rng: StdRng,
        price: f64,
        sequence: u64,
    }

    let symbol = symbol.trim().to_ascii_uppercase();
    let walk = Walk {
        rng: StdRng::seed_from_u64(seed),
        price: start_price,
        sequence: 0,
    };
    stream::unfold(walk, move |mut walk| {
        let symbol = symbol.clone();
        async move {
            if walk.sequence >= ticks {
                return None;
            }
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            walk.sequence += 1;
            let step: f64 = walk.rng.gen_range(-1.0..1.0);
            walk.price = (walk.price * (1.0 + 0.002 * step)).max(0.01);
            let spread: f64 = walk.rng.gen_range(0.0..0.001);
            let volume: f64 = walk.rng.gen_range(50.0..150.0);
            let tick = Tick {
                symbol,
                price: walk.price,
                high: walk.price * (1.0 + spread),
                low: walk.price * (1.0 - spread),
                close: walk.price,
                volume,
                timestamp_ms: chrono::Utc::now().timestamp_millis().max(0) as u64,
                sequence: walk.sequence,
            };
            Some((Ok(tick), walk))
        }
    })
    .boxed()
}
