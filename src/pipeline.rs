//! Ingestion → indicators → strategy/risk → sink.
//!
//! Ingestion and indicator processing each run as their own tokio task and hand
//! items over through [`ConcurrentQueue`]s. Every push is followed by a
//! `Notify` wakeup so an idle consumer parks instead of polling. The calling
//! task runs the strategy and risk stages and feeds the sink.
//!
//! A run ends when the source is exhausted (the end-of-stream sentinel is
//! forwarded through both queues and everything queued is drained), when the
//! record limit is reached, or when the stop flag is raised. Both tasks are
//! joined before the queues are dropped.

use std::io::Write;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::config::{Config, PipelineConfig};
use crate::error::EngineError;
use crate::indicator::IndicatorEngine;
use crate::model::signal::TradeSignal;
use crate::model::snapshot::IndicatorSnapshot;
use crate::model::tick::Tick;
use crate::queue::{ConcurrentQueue, QueueItem, QueueStats};
use crate::risk::RiskAdjuster;
use crate::strategy::StrategyEngine;

/// Consumer of published trade signals.
pub trait SignalSink {
    fn deliver(&mut self, signal: TradeSignal) -> Result<(), EngineError>;
}

/// Keeps every signal in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub signals: Vec<TradeSignal>,
}

impl SignalSink for CollectSink {
    fn deliver(&mut self, signal: TradeSignal) -> Result<(), EngineError> {
        self.signals.push(signal);
        Ok(())
    }
}

/// Writes each signal as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SignalSink for JsonLinesSink<W> {
    fn deliver(&mut self, signal: TradeSignal) -> Result<(), EngineError> {
        serde_json::to_writer(&mut self.out, &signal).map_err(std::io::Error::from)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

/// A queue paired with the wakeup its consumer parks on.
pub struct Channel<T> {
    name: &'static str,
    queue: ConcurrentQueue<QueueItem<T>>,
    notify: Notify,
}

impl<T> Channel<T> {
    pub fn new(name: &'static str, settings: &PipelineConfig) -> Self {
        let queue = match settings.queue_capacity {
            Some(capacity) => ConcurrentQueue::bounded(capacity, settings.overflow),
            None => ConcurrentQueue::new(),
        };
        Self {
            name,
            queue,
            notify: Notify::new(),
        }
    }

    pub fn unbounded(name: &'static str) -> Self {
        Self {
            name,
            queue: ConcurrentQueue::new(),
            notify: Notify::new(),
        }
    }

    /// Enqueue a data item and wake the consumer. Returns `false` if an item
    /// was dropped by the overflow policy.
    pub fn send(&self, value: T) -> bool {
        let dropped = self.queue.push(QueueItem::Data(value));
        self.notify.notify_one();
        if dropped.is_some() {
            tracing::warn!(queue = self.name, "queue full, item dropped");
            return false;
        }
        true
    }

    /// Enqueue the end-of-stream sentinel. Never subject to the capacity bound.
    pub fn close(&self) {
        self.queue.force_push(QueueItem::EndOfStream);
        self.notify.notify_one();
    }

    /// Next item, parking while the queue is empty.
    /// `None` once the stop flag is raised.
    pub async fn recv(&self, stop: &mut watch::Receiver<bool>) -> Option<QueueItem<T>> {
        loop {
            if *stop.borrow() {
                return None;
            }
            if let Some(item) = self.queue.try_pop() {
                return Some(item);
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = wait_for_stop(stop) => return None,
            }
        }
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

/// Resolves once the flag reads `true`; pends forever if the sender is gone.
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Raises the pipeline's stop flag from outside the run.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfStream,
    RecordLimit,
    StopFlag,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub snapshots: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub ticks_ingested: u64,
    pub ticks_rejected: u64,
    pub snapshots: u64,
    pub signals: u64,
    pub dropped_ticks: u64,
    pub dropped_snapshots: u64,
    pub stop_reason: StopReason,
}

/// Pull ticks from `source` into `ticks` until it ends or the stop flag is raised.
/// The sentinel is always published on exit.
pub async fn run_ingestion<S>(
    source: S,
    ticks: Arc<Channel<Tick>>,
    mut stop: watch::Receiver<bool>,
) -> Result<u64, EngineError>
where
    S: Stream<Item = Result<Tick, EngineError>>,
{
    tracing::info!("ingestion unit started");
    let mut source = std::pin::pin!(source);
    let mut ingested = 0u64;
    let result = loop {
        if *stop.borrow() {
            break Ok(());
        }
        let next = tokio::select! {
            next = source.next() => next,
            _ = wait_for_stop(&mut stop) => break Ok(()),
        };
        match next {
            Some(Ok(tick)) => {
                ingested += 1;
                tracing::trace!(symbol = %tick.symbol, sequence = tick.sequence, "tick ingested");
                ticks.send(tick);
            }
            Some(Err(e)) => break Err(e),
            None => break Ok(()),
        }
    };
    ticks.close();
    match &result {
        Ok(()) => tracing::info!(ingested, "ingestion unit finished"),
        Err(e) => tracing::error!(ingested, error = %e, "ingestion unit failed"),
    }
    result.map(|()| ingested)
}

/// Fold ticks into indicators and publish one snapshot per accepted tick.
///
/// Invalid ticks are logged and skipped. Fatal engine errors end the unit.
/// The sentinel is always forwarded on exit.
pub async fn run_indicators(
    mut engine: IndicatorEngine,
    ticks: Arc<Channel<Tick>>,
    snapshots: Arc<Channel<Arc<IndicatorSnapshot>>>,
    mut stop: watch::Receiver<bool>,
) -> Result<ProcessingStats, EngineError> {
    tracing::info!("indicator unit started");
    let mut stats = ProcessingStats::default();
    let result = loop {
        let Some(item) = ticks.recv(&mut stop).await else {
            break Ok(());
        };
        let QueueItem::Data(tick) = item else {
            tracing::debug!("end of stream reached indicator unit");
            break Ok(());
        };
        match engine.on_tick(tick) {
            Ok(snapshot) => {
                stats.snapshots += 1;
                snapshots.send(Arc::new(snapshot));
            }
            Err(e) if e.is_fatal() => break Err(e),
            Err(e) => {
                stats.rejected += 1;
                tracing::warn!(error = %e, "tick rejected");
            }
        }
    };
    snapshots.close();
    tracing::info!(
        snapshots = stats.snapshots,
        rejected = stats.rejected,
        "indicator unit finished"
    );
    result.map(|()| stats)
}

pub struct Pipeline {
    indicators: IndicatorEngine,
    strategy: StrategyEngine,
    risk: RiskAdjuster,
    settings: PipelineConfig,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl Pipeline {
    /// Build every stage from configuration. Invalid parameters fail here.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        let indicators = IndicatorEngine::new(config.indicators.clone())?;
        let strategy = StrategyEngine::new(&config.strategy, &config.risk)?;
        let risk = RiskAdjuster::new(config.risk.clone());
        Ok(Self::from_parts(
            indicators,
            strategy,
            risk,
            config.pipeline.clone(),
        ))
    }

    pub fn from_parts(
        indicators: IndicatorEngine,
        strategy: StrategyEngine,
        risk: RiskAdjuster,
        settings: PipelineConfig,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            indicators,
            strategy,
            risk,
            settings,
            stop_tx: Arc::new(stop_tx),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_tx.clone())
    }

    /// Run to completion, delivering one trade signal per snapshot to `sink`.
    pub async fn run<S, K>(self, source: S, sink: &mut K) -> Result<PipelineReport, EngineError>
    where
        S: Stream<Item = Result<Tick, EngineError>> + Send + 'static,
        K: SignalSink + ?Sized,
    {
        let Pipeline {
            indicators,
            mut strategy,
            mut risk,
            settings,
            stop_tx,
        } = self;

        let ticks = Arc::new(Channel::<Tick>::new("ticks", &settings));
        let snapshots = Arc::new(Channel::<Arc<IndicatorSnapshot>>::new("snapshots", &settings));

        let ingestion: JoinHandle<Result<u64, EngineError>> = tokio::spawn(run_ingestion(
            source,
            ticks.clone(),
            stop_tx.subscribe(),
        ));
        let processing: JoinHandle<Result<ProcessingStats, EngineError>> =
            tokio::spawn(run_indicators(
                indicators,
                ticks.clone(),
                snapshots.clone(),
                stop_tx.subscribe(),
            ));

        let mut stop = stop_tx.subscribe();
        let mut signals = 0u64;
        let consumed = consume_snapshots(
            &snapshots,
            &mut strategy,
            &mut risk,
            sink,
            settings.max_records,
            &mut signals,
            &mut stop,
        )
        .await;

        if !matches!(consumed, Ok(StopReason::EndOfStream)) {
            stop_tx.send_replace(true);
        }
        let ingested = join_unit("ingestion", ingestion).await;
        let processed = join_unit("indicator", processing).await;

        let stop_reason = consumed?;
        let ticks_ingested = ingested?;
        let processed = processed?;
        let report = PipelineReport {
            ticks_ingested,
            ticks_rejected: processed.rejected,
            snapshots: processed.snapshots,
            signals,
            dropped_ticks: ticks.stats().dropped,
            dropped_snapshots: snapshots.stats().dropped,
            stop_reason,
        };
        tracing::info!(
            ticks = report.ticks_ingested,
            snapshots = report.snapshots,
            signals = report.signals,
            stops = risk.stops_triggered(),
            reason = ?report.stop_reason,
            "pipeline finished"
        );
        Ok(report)
    }
}

/// Strategy and risk stages on the calling task.
async fn consume_snapshots<K>(
    snapshots: &Channel<Arc<IndicatorSnapshot>>,
    strategy: &mut StrategyEngine,
    risk: &mut RiskAdjuster,
    sink: &mut K,
    max_records: Option<u64>,
    signals: &mut u64,
    stop: &mut watch::Receiver<bool>,
) -> Result<StopReason, EngineError>
where
    K: SignalSink + ?Sized,
{
    loop {
        let Some(item) = snapshots.recv(stop).await else {
            return Ok(StopReason::StopFlag);
        };
        let QueueItem::Data(snapshot) = item else {
            return Ok(StopReason::EndOfStream);
        };
        let raw = strategy.on_snapshot(&snapshot);
        let signal = risk.adjust(&snapshot, raw);
        sink.deliver(signal)?;
        *signals += 1;
        if max_records.is_some_and(|limit| *signals >= limit) {
            tracing::info!(signals = *signals, "record limit reached");
            return Ok(StopReason::RecordLimit);
        }
    }
}

async fn join_unit<T>(
    unit: &'static str,
    handle: JoinHandle<Result<T, EngineError>>,
) -> Result<T, EngineError> {
    match handle.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) if e.is_fatal() => Err(e),
        Ok(Err(e)) => Err(EngineError::UnitFailed {
            unit,
            reason: e.to_string(),
        }),
        Err(join_err) => Err(EngineError::UnitFailed {
            unit,
            reason: join_err.to_string(),
        }),
    }
}
