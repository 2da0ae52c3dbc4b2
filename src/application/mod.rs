pub mod collector;

pub use collector::{MetricCollector, Report};
