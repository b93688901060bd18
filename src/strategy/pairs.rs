use crate::indicator::window::RollingWindow;
use crate::model::signal::RawSignal;
use crate::model::snapshot::IndicatorSnapshot;

/// Spread `price(A) - price(B)` against its rolling mean.
///
/// Signals refer to leg A: a rich spread sells A, a cheap spread buys it.
/// Strength is the deviation measured in standard deviations.
#[derive(Debug, Clone)]
pub struct PairsStrategy {
    factor: f64,
    spreads: RollingWindow,
}

impl PairsStrategy {
    pub fn new(spread_window: usize, factor: f64) -> Self {
        Self {
            factor,
            spreads: RollingWindow::new(spread_window),
        }
    }

    pub fn spread_mean(&self) -> Option<f64> {
        self.spreads.is_full().then(|| self.spreads.mean())
    }

    pub fn on_pair(&mut self, leg_a: &IndicatorSnapshot, leg_b: &IndicatorSnapshot) -> RawSignal {
        let spread = leg_a.price - leg_b.price;
        self.spreads.push(spread);
        if !self.spreads.is_full() {
            return RawSignal::hold();
        }

        let mean = self.spreads.mean();
        let std_dev = self.spreads.std_dev();
        let threshold = self.factor * std_dev;
        let deviation = spread - mean;
        let strength = if std_dev > 0.0 {
            deviation.abs() / std_dev
        } else {
            0.0
        };

        if deviation > threshold {
            RawSignal::sell(strength)
        } else if deviation < -threshold {
            RawSignal::buy(strength)
        } else {
            RawSignal::hold()
        }
    }
}
