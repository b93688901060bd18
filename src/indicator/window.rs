use crate::error::EngineError;

/// Fixed-capacity ring buffer with running sum and sum of squares.
///
/// `sum` and `sum_sq` always cover exactly the samples currently held: the
/// evicted sample's contribution is subtracted on every push once full.
/// Both are kept relative to the first sample ever pushed (`shift`), so the
/// variance of a small spread at a large price level does not cancel out.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    buffer: Vec<f64>,
    head: usize,
    count: usize,
    shift: Option<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be > 0");
        Self {
            capacity,
            buffer: vec![0.0; capacity],
            head: 0,
            count: 0,
            shift: None,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Fallible constructor: reports zero capacity and allocation failure
    /// instead of panicking.
    pub fn try_new(capacity: usize) -> Result<Self, EngineError> {
        if capacity == 0 {
            return Err(EngineError::invalid("window capacity", "must be > 0"));
        }
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| EngineError::Allocation {
                what: "rolling window",
                capacity,
            })?;
        buffer.resize(capacity, 0.0);
        Ok(Self {
            capacity,
            buffer,
            head: 0,
            count: 0,
            shift: None,
            sum: 0.0,
            sum_sq: 0.0,
        })
    }

    /// Push a sample; returns the evicted sample once the window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let shift = *self.shift.get_or_insert(value);
        let evicted = if self.count >= self.capacity {
            let old = self.buffer[self.head];
            let d = old - shift;
            self.sum -= d;
            self.sum_sq -= d * d;
            Some(old)
        } else {
            self.count += 1;
            None
        };
        self.buffer[self.head] = value;
        let d = value - shift;
        self.sum += d;
        self.sum_sq += d * d;
        self.head = (self.head + 1) % self.capacity;
        evicted
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.shift.unwrap_or(0.0) + self.sum / self.count as f64
    }

    /// Population variance `sum_sq/n - mean²` from the running sums.
    ///
    /// Negative results and results below the cancellation error of the
    /// subtraction (`n·ε·mean_sq`) are clamped to exactly zero.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        let mean_sq = self.sum_sq / n;
        // Shifted samples: the variance is unchanged.
        let variance = mean_sq - mean * mean;
        let noise = n * f64::EPSILON * mean_sq.abs();
        if variance <= noise {
            0.0
        } else {
            variance
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sum(&self) -> f64 {
        self.shift.unwrap_or(0.0) * self.count as f64 + self.sum
    }

    /// Oldest sample still held.
    pub fn oldest(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let idx = (self.head + self.capacity - self.count) % self.capacity;
        Some(self.buffer[idx])
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.buffer[(self.head + self.capacity - 1) % self.capacity])
    }

    /// Samples in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = (self.head + self.capacity - self.count) % self.capacity;
        (0..self.count).map(move |i| self.buffer[(start + i) % self.capacity])
    }
}
