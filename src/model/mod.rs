pub mod signal;
pub mod snapshot;
pub mod tick;
