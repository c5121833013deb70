//! Metrics module - derived rates and the latest-date map snapshot

mod calculator;

pub use calculator::{DerivedMetrics, EntityDeathRate, MapPoint, MetricsCalculator};
