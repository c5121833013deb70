//! COVID Tracker - OWID dataset preparation toolkit
//!
//! Loads the Our World in Data COVID-19 CSV snapshot, filters it to a set of
//! countries, repairs missing values, and derives secondary metrics. The
//! cleaned table is handed to external visualization/report collaborators;
//! this crate owns no rendering or network retrieval.

pub mod data;
pub mod metrics;
pub mod style;

pub use data::{DatasetLoader, DatasetPreparer, LoaderError, Observation, PrepareError, PreparedData};
pub use metrics::{DerivedMetrics, EntityDeathRate, MapPoint, MetricsCalculator};
pub use style::PlotStyle;
