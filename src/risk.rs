use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::RiskParameters;
use crate::model::signal::{TradeAction, TradeSignal};
use crate::model::snapshot::IndicatorSnapshot;

/// Pluggable risk hooks applied to every sized signal.
pub trait RiskPolicy: Send + Sync {
    /// Maximum tolerated adverse move since entry, in percent.
    fn dynamic_stop_loss(&self, snapshot: &IndicatorSnapshot, signal: &TradeSignal) -> f64;

    /// Largest position allowed for `requested`.
    fn position_limit(&self, snapshot: &IndicatorSnapshot, requested: f64) -> f64;

    /// Observe the outgoing signal. Must not influence it.
    fn monitor(&self, snapshot: &IndicatorSnapshot, signal: &TradeSignal);
}

/// Counters for alerts raised by [`MarketBehaviorMonitor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCounts {
    pub flash_crash: u64,
    pub high_volatility: u64,
    pub liquidity_drop: u64,
}

impl AlertCounts {
    pub fn total(&self) -> u64 {
        self.flash_crash + self.high_volatility + self.liquidity_drop
    }
}

/// Detects flash crashes, volatility spikes and sudden liquidity drops.
#[derive(Debug, Default)]
pub struct MarketBehaviorMonitor {
    flash_crash_threshold: f64,
    volatility_alert: Option<f64>,
    liquidity_drop_threshold: f64,
    flash_crash: AtomicU64,
    high_volatility: AtomicU64,
    liquidity_drop: AtomicU64,
}

impl MarketBehaviorMonitor {
    pub fn new(params: &RiskParameters) -> Self {
        Self {
            flash_crash_threshold: params.flash_crash_threshold,
            volatility_alert: params.volatility_alert,
            liquidity_drop_threshold: params.liquidity_drop_threshold,
            ..Self::default()
        }
    }

    pub fn observe(&self, snapshot: &IndicatorSnapshot) {
        if let Some(ret) = snapshot.tick_return() {
            if ret < -self.flash_crash_threshold {
                self.flash_crash.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    symbol = %snapshot.symbol,
                    sequence = snapshot.sequence,
                    tick_return = ret,
                    "flash crash detected"
                );
            }
        }
        if let (Some(limit), Some(vol)) = (self.volatility_alert, snapshot.rolling_volatility) {
            if vol > limit {
                self.high_volatility.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    symbol = %snapshot.symbol,
                    sequence = snapshot.sequence,
                    volatility = vol,
                    limit,
                    "high volatility"
                );
            }
        }
        let floor = (1.0 - self.liquidity_drop_threshold) * snapshot.liquidity;
        if snapshot.liquidity > 0.0 && snapshot.volume < floor {
            self.liquidity_drop.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                symbol = %snapshot.symbol,
                sequence = snapshot.sequence,
                volume = snapshot.volume,
                liquidity = snapshot.liquidity,
                "liquidity drop"
            );
        }
    }

    pub fn counts(&self) -> AlertCounts {
        AlertCounts {
            flash_crash: self.flash_crash.load(Ordering::Relaxed),
            high_volatility: self.high_volatility.load(Ordering::Relaxed),
            liquidity_drop: self.liquidity_drop.load(Ordering::Relaxed),
        }
    }
}

/// ATR-scaled stop, liquidity-scaled limit, market-behavior monitor.
#[derive(Debug)]
pub struct DefaultRiskPolicy {
    params: RiskParameters,
    monitor: MarketBehaviorMonitor,
}

impl DefaultRiskPolicy {
    pub fn new(params: RiskParameters) -> Self {
        let monitor = MarketBehaviorMonitor::new(&params);
        Self { params, monitor }
    }

    pub fn alerts(&self) -> AlertCounts {
        self.monitor.counts()
    }
}

impl RiskPolicy for DefaultRiskPolicy {
    fn dynamic_stop_loss(&self, snapshot: &IndicatorSnapshot, _signal: &TradeSignal) -> f64 {
        match snapshot.atr {
            Some(atr) if snapshot.price > 0.0 => {
                self.params.atr_stop_multiplier * atr / snapshot.price * 100.0
            }
            _ => self.params.stop_loss_pct,
        }
    }

    fn position_limit(&self, snapshot: &IndicatorSnapshot, _requested: f64) -> f64 {
        let max = self.params.max_position_size;
        let min_liquidity = self.params.minimum_liquidity;
        if min_liquidity > 0.0 && snapshot.liquidity < min_liquidity {
            max * (snapshot.liquidity / min_liquidity).max(0.0)
        } else {
            max
        }
    }

    fn monitor(&self, snapshot: &IndicatorSnapshot, _signal: &TradeSignal) {
        self.monitor.observe(snapshot);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub action: TradeAction,
    pub entry_price: f64,
}

impl OpenPosition {
    /// Move against the position since entry, in percent (positive = loss).
    pub fn adverse_move_pct(&self, price: f64) -> f64 {
        if self.entry_price.abs() <= f64::EPSILON {
            return 0.0;
        }
        let pct = 100.0 * (price - self.entry_price) / self.entry_price;
        match self.action {
            TradeAction::Buy => -pct,
            TradeAction::Sell => pct,
            TradeAction::Hold => 0.0,
        }
    }
}

/// Applies stop-loss, position limit and monitoring to sized signals, in that order.
///
/// Open positions are tracked per signal symbol.
pub struct RiskAdjuster {
    params: RiskParameters,
    policy: Box<dyn RiskPolicy>,
    open: HashMap<String, OpenPosition>,
    stops: u64,
    clamped: u64,
}

impl std::fmt::Debug for RiskAdjuster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskAdjuster")
            .field("open", &self.open)
            .field("stops", &self.stops)
            .field("clamped", &self.clamped)
            .finish_non_exhaustive()
    }
}

impl RiskAdjuster {
    pub fn new(params: RiskParameters) -> Self {
        let policy = Box::new(DefaultRiskPolicy::new(params.clone()));
        Self::with_policy(params, policy)
    }

    pub fn with_policy(params: RiskParameters, policy: Box<dyn RiskPolicy>) -> Self {
        Self {
            params,
            policy,
            open: HashMap::new(),
            stops: 0,
            clamped: 0,
        }
    }

    pub fn open_position(&self, symbol: &str) -> Option<OpenPosition> {
        self.open.get(symbol).copied()
    }

    pub fn open_positions(&self) -> usize {
        self.open.len()
    }

    pub fn stops_triggered(&self) -> u64 {
        self.stops
    }

    pub fn sizes_clamped(&self) -> u64 {
        self.clamped
    }

    pub fn adjust(&mut self, snapshot: &IndicatorSnapshot, mut signal: TradeSignal) -> TradeSignal {
        // 1. Stop loss against the entry tracked for the signal's symbol.
        // A pairs signal can carry another symbol than the snapshot; its own
        // latest price then travels as the entry price.
        let mark = if signal.symbol == snapshot.symbol {
            snapshot.price
        } else {
            signal.entry_price
        };
        if let Some(open) = self.open.get(&signal.symbol).copied() {
            let stop = self.policy.dynamic_stop_loss(snapshot, &signal);
            let adverse = open.adverse_move_pct(mark);
            if adverse > stop {
                self.stops += 1;
                self.open.remove(&signal.symbol);
                tracing::warn!(
                    symbol = %signal.symbol,
                    sequence = signal.sequence,
                    entry = open.entry_price,
                    price = mark,
                    adverse_pct = adverse,
                    stop_pct = stop,
                    "stop loss triggered"
                );
                signal.action = TradeAction::Hold;
                signal.position_size = 0.0;
            }
        }
        if signal.action != TradeAction::Hold
            && self.open.get(&signal.symbol).map(|p| p.action) != Some(signal.action)
        {
            self.open.insert(
                signal.symbol.clone(),
                OpenPosition {
                    action: signal.action,
                    entry_price: signal.entry_price,
                },
            );
        }

        // 2. Position limit, then the configured hard maximum.
        let limit = self.policy.position_limit(snapshot, signal.position_size);
        let limit = if limit.is_finite() {
            limit.clamp(0.0, self.params.max_position_size)
        } else {
            self.params.max_position_size
        };
        if signal.position_size > limit || !signal.position_size.is_finite() {
            self.clamped += 1;
            tracing::debug!(
                symbol = %signal.symbol,
                requested = signal.position_size,
                limit,
                "position size clamped"
            );
            signal.position_size = limit;
        }
        signal.position_size = signal.position_size.max(0.0);

        // 3. Monitoring only.
        self.policy.monitor(snapshot, &signal);
        signal
    }
}
