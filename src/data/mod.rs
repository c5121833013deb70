//! Data module - CSV loading, typed extraction, and cleaning

mod loader;
mod model;
mod preparer;

pub use loader::{DatasetLoader, LoaderError};
pub use model::{Observation, REQUIRED_COLUMNS};
pub use preparer::{DatasetPreparer, PrepareError, PreparedData};
