//! Dataset Loader Module
//! Loads the OWID CSV snapshot with Polars and extracts typed observations.

use chrono::NaiveDate;
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use super::model::{
    Observation, COL_DATE, COL_ISO_CODE, COL_LOCATION, COL_NEW_CASES, COL_NEW_DEATHS,
    COL_POPULATION, COL_TOTAL_CASES, COL_TOTAL_DEATHS, COL_TOTAL_VACCINATIONS, REQUIRED_COLUMNS,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("no data loaded")]
    NoData,
    #[error("required column `{0}` is missing from the input schema")]
    MissingColumn(String),
    #[error("unparseable date `{value}` for entity `{entity}`")]
    InvalidDate { entity: String, value: String },
}

/// Loads the raw dataset once and hands out a typed, read-once snapshot.
pub struct DatasetLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&mut self, file_path: &str) -> Result<&DataFrame, LoaderError> {
        self.file_path = Some(PathBuf::from(file_path));

        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        info!(rows = df.height(), cols = df.width(), path = file_path, "loaded dataset");

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from the loaded DataFrame.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Get file path.
    pub fn file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Set DataFrame directly (for callers that fetched the CSV themselves).
    pub fn set_dataframe(&mut self, df: DataFrame) {
        self.df = Some(df);
    }

    /// Validate the schema and extract one typed [`Observation`] per row.
    ///
    /// Missing *values* come out as `None`; a missing required *column* or an
    /// unparseable date fails the whole call.
    pub fn observations(&self) -> Result<Vec<Observation>, LoaderError> {
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;
        Self::ensure_schema(df)?;

        let entities = required_str(df, COL_LOCATION)?;
        let iso_codes = optional_str(df, COL_ISO_CODE);
        let dates = parse_dates(df, &entities)?;
        let populations = numeric(df, COL_POPULATION)?;
        let total_cases = numeric(df, COL_TOTAL_CASES)?;
        let total_deaths = numeric(df, COL_TOTAL_DEATHS)?;
        let new_cases = numeric(df, COL_NEW_CASES)?;
        let new_deaths = numeric(df, COL_NEW_DEATHS)?;
        let total_vaccinations = numeric(df, COL_TOTAL_VACCINATIONS)?;

        let rows: Vec<Observation> = (0..df.height())
            .map(|i| Observation {
                entity: entities[i].clone(),
                iso_code: iso_codes.as_ref().and_then(|codes| codes[i].clone()),
                date: dates[i],
                population: populations[i],
                total_cases: total_cases[i],
                total_deaths: total_deaths[i],
                new_cases: new_cases[i],
                new_deaths: new_deaths[i],
                total_vaccinations: total_vaccinations[i],
            })
            .collect();

        debug!(rows = rows.len(), "extracted typed observations");
        Ok(rows)
    }

    fn ensure_schema(df: &DataFrame) -> Result<(), LoaderError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for required in REQUIRED_COLUMNS {
            if !names.iter().any(|n| n == required) {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }
        Ok(())
    }
}

/// Numeric column as `Option<f64>` per row; null and NaN both map to absent.
fn numeric(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, LoaderError> {
    let casted = df.column(name)?.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// String column where a null value is acceptable.
fn optional_str(df: &DataFrame, name: &str) -> Option<Vec<Option<String>>> {
    let casted = df.column(name).ok()?.cast(&DataType::String).ok()?;
    let ca = casted.str().ok()?;
    Some(
        ca.into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
    )
}

/// String column used as a key; a null collapses to the empty string so the
/// row still counts toward the totals (the feed never omits `location`).
fn required_str(df: &DataFrame, name: &str) -> Result<Vec<String>, LoaderError> {
    let casted = df.column(name)?.cast(&DataType::String)?;
    let ca = casted.str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Explicit, fallible date parsing. The raw feed carries ISO dates as text;
/// anything that does not parse fails the load rather than dropping rows,
/// which would corrupt the per-entity ordering.
fn parse_dates(df: &DataFrame, entities: &[String]) -> Result<Vec<NaiveDate>, LoaderError> {
    let casted = df.column(COL_DATE)?.cast(&DataType::String)?;
    let ca = casted.str()?;
    ca.into_iter()
        .enumerate()
        .map(|(i, v)| {
            let entity = entities.get(i).cloned().unwrap_or_default();
            let raw = v.ok_or_else(|| LoaderError::InvalidDate {
                entity: entity.clone(),
                value: "<null>".to_string(),
            })?;
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| LoaderError::InvalidDate {
                entity,
                value: raw.to_string(),
            })
        })
        .collect()
}
