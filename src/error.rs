use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("missing config field: {0}")]
    MissingField(&'static str),

    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("allocation failed for {what} (capacity {capacity})")]
    Allocation { what: &'static str, capacity: usize },

    #[error("{unit} unit failed: {reason}")]
    UnitFailed { unit: &'static str, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// `true` for failures that end a pipeline run rather than a single tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Allocation { .. } | Self::UnitFailed { .. })
    }
}
