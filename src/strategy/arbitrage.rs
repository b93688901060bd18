use crate::config::RiskParameters;
use crate::indicator::window::RollingWindow;
use crate::model::signal::RawSignal;
use crate::model::snapshot::IndicatorSnapshot;

/// Price differences used for the dynamic threshold.
pub const THRESHOLD_WINDOW: usize = 30;

/// Inputs of a single arbitrage decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitrageInputs {
    pub price_diff: f64,
    pub threshold: f64,
    pub liquidity: f64,
    pub trend_strength: f64,
}

/// Net edge after costs must be positive and liquidity must cover the minimum.
pub fn is_profitable(price_diff: f64, liquidity: f64, risk: &RiskParameters) -> bool {
    let edge = price_diff.abs() - risk.transaction_cost - risk.latency * risk.slippage_factor;
    edge > 0.0 && liquidity >= risk.minimum_liquidity
}

/// Direction from a profitable, trend-confirmed price difference.
/// The strength is the price difference itself.
pub fn arbitrage_decision(inputs: &ArbitrageInputs, risk: &RiskParameters) -> RawSignal {
    if !is_profitable(inputs.price_diff, inputs.liquidity, risk) {
        return RawSignal::hold();
    }
    if inputs.price_diff > inputs.threshold && inputs.trend_strength > 0.0 {
        RawSignal::buy(inputs.price_diff)
    } else if inputs.price_diff < -inputs.threshold && inputs.trend_strength < 0.0 {
        RawSignal::sell(inputs.price_diff.abs())
    } else {
        RawSignal::hold()
    }
}

#[derive(Debug)]
pub struct ArbitrageStrategy {
    base_threshold: f64,
    risk: RiskParameters,
    diffs: RollingWindow,
}

impl ArbitrageStrategy {
    pub fn new(base_threshold: f64, risk: RiskParameters) -> Self {
        Self {
            base_threshold,
            risk,
            diffs: RollingWindow::new(THRESHOLD_WINDOW),
        }
    }

    /// `base_threshold × stddev` of the last 30 price differences, 0 until filled.
    pub fn dynamic_threshold(&self) -> f64 {
        if !self.diffs.is_full() {
            return 0.0;
        }
        self.base_threshold * self.diffs.std_dev()
    }

    pub fn on_snapshot(&mut self, snapshot: &IndicatorSnapshot) -> RawSignal {
        self.diffs.push(snapshot.price_change);
        let Some(trend_strength) = snapshot.trend_strength else {
            return RawSignal::hold();
        };
        let inputs = ArbitrageInputs {
            price_diff: snapshot.price_change,
            threshold: self.dynamic_threshold(),
            liquidity: snapshot.liquidity,
            trend_strength,
        };
        arbitrage_decision(&inputs, &self.risk)
    }
}
