use crate::model::signal::RawSignal;
use crate::model::snapshot::IndicatorSnapshot;

/// Rate-of-change threshold crossing filtered by RSI and the moving average.
#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    roc_threshold: f64,
    rsi_oversold: f64,
    rsi_overbought: f64,
    prev_roc: Option<f64>,
}

impl MomentumStrategy {
    pub fn new(roc_threshold: f64, rsi_oversold: f64, rsi_overbought: f64) -> Self {
        Self {
            roc_threshold,
            rsi_oversold,
            rsi_overbought,
            prev_roc: None,
        }
    }

    pub fn on_snapshot(&mut self, snapshot: &IndicatorSnapshot) -> RawSignal {
        let Some(roc) = snapshot.rate_of_change else {
            return RawSignal::hold();
        };
        let prev = self.prev_roc.replace(roc);
        let (Some(prev), Some(rsi)) = (prev, snapshot.rsi) else {
            return RawSignal::hold();
        };

        let thr = self.roc_threshold;
        if roc > thr && prev <= thr && rsi < self.rsi_overbought && snapshot.price > snapshot.moving_average
        {
            RawSignal::buy(1.0)
        } else if roc < -thr
            && prev >= -thr
            && rsi > self.rsi_oversold
            && snapshot.price < snapshot.moving_average
        {
            RawSignal::sell(1.0)
        } else {
            RawSignal::hold()
        }
    }
}
