pub mod config;
pub mod error;
pub mod indicator;
pub mod model;
pub mod pipeline;
pub mod queue;
pub mod risk;
pub mod source;
pub mod strategy;
