/// Relative Strength Index with Wilder smoothing.
///
/// The first `period` price changes seed simple averages of gains and losses;
/// after that each change is folded in as `avg = (avg·(period-1) + x) / period`.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_price: Option<f64>,
    seeded: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "RSI period must be > 0");
        Self {
            period,
            prev_price: None,
            seeded: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    pub fn push(&mut self, price: f64) -> Option<f64> {
        let Some(prev) = self.prev_price.replace(price) else {
            return None;
        };
        let change = price - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let p = self.period as f64;

        if self.seeded < self.period {
            self.avg_gain += gain / p;
            self.avg_loss += loss / p;
            self.seeded += 1;
            if self.seeded < self.period {
                return None;
            }
        } else {
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        }
        Some(self.value_unchecked())
    }

    pub fn value(&self) -> Option<f64> {
        (self.seeded >= self.period).then(|| self.value_unchecked())
    }

    fn value_unchecked(&self) -> f64 {
        if self.avg_loss <= 0.0 {
            return 100.0;
        }
        let rs = self.avg_gain / self.avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}
