pub mod atr;
pub mod ema;
pub mod engine;
pub mod extremes;
pub mod rsi;
pub mod trend;
pub mod window;

pub use engine::{IndicatorEngine, WarmupState};
pub use window::RollingWindow;
