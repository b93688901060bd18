/// Average True Range with Wilder smoothing.
///
/// True range needs a previous close; the first bar falls back to `high - low`
/// so nothing is divided before history exists.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seeded: usize,
    seed_sum: f64,
    atr: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "ATR period must be > 0");
        Self {
            period,
            prev_close: None,
            seeded: 0,
            seed_sum: 0.0,
            atr: None,
        }
    }

    pub fn push(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let tr = true_range(high, low, self.prev_close);
        self.prev_close = Some(close);

        match self.atr {
            Some(prev) => {
                let p = self.period as f64;
                self.atr = Some((prev * (p - 1.0) + tr) / p);
            }
            None => {
                self.seed_sum += tr;
                self.seeded += 1;
                if self.seeded >= self.period {
                    self.atr = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.atr
    }

    pub fn value(&self) -> Option<f64> {
        self.atr
    }
}

pub fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    let hl = high - low;
    match prev_close {
        Some(pc) => hl.max((high - pc).abs()).max((low - pc).abs()),
        None => hl,
    }
}
