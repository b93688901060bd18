use crate::indicator::window::RollingWindow;
use crate::model::signal::RawSignal;
use crate::model::snapshot::IndicatorSnapshot;

#[derive(Debug, Clone)]
pub struct MaCrossover {
    fast: RollingWindow,
    slow: RollingWindow,
    prev_fast: Option<f64>,
    prev_slow: Option<f64>,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(
            fast_period < slow_period,
            "fast_period must be less than slow_period"
        );
        Self {
            fast: RollingWindow::new(fast_period),
            slow: RollingWindow::new(slow_period),
            prev_fast: None,
            prev_slow: None,
        }
    }

    pub fn on_snapshot(&mut self, snapshot: &IndicatorSnapshot) -> RawSignal {
        self.fast.push(snapshot.price);
        self.slow.push(snapshot.price);
        let fast = self.fast_sma_value();
        let slow = self.slow_sma_value();

        let signal = match (fast, slow, self.prev_fast, self.prev_slow) {
            (Some(f), Some(s), Some(pf), Some(ps)) => {
                if pf <= ps && f > s {
                    RawSignal::buy(1.0)
                } else if pf >= ps && f < s {
                    RawSignal::sell(1.0)
                } else {
                    RawSignal::hold()
                }
            }
            _ => RawSignal::hold(),
        };

        self.prev_fast = fast;
        self.prev_slow = slow;
        signal
    }

    pub fn fast_sma_value(&self) -> Option<f64> {
        self.fast.is_full().then(|| self.fast.mean())
    }

    pub fn slow_sma_value(&self) -> Option<f64> {
        self.slow.is_full().then(|| self.slow.mean())
    }
}
