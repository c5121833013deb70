//! Row Model Module
//! Typed view of one raw dataset row and the column names it comes from.

use chrono::NaiveDate;

pub const COL_LOCATION: &str = "location";
pub const COL_ISO_CODE: &str = "iso_code";
pub const COL_DATE: &str = "date";
pub const COL_POPULATION: &str = "population";
pub const COL_TOTAL_CASES: &str = "total_cases";
pub const COL_TOTAL_DEATHS: &str = "total_deaths";
pub const COL_NEW_CASES: &str = "new_cases";
pub const COL_NEW_DEATHS: &str = "new_deaths";
pub const COL_TOTAL_VACCINATIONS: &str = "total_vaccinations";

/// Columns the loader refuses to proceed without. `iso_code` is not listed:
/// only the mapping consumer reads it, and rows without one are fine.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_LOCATION,
    COL_DATE,
    COL_POPULATION,
    COL_TOTAL_CASES,
    COL_TOTAL_DEATHS,
    COL_NEW_CASES,
    COL_NEW_DEATHS,
    COL_TOTAL_VACCINATIONS,
];

/// One (entity, date) observation.
///
/// Every numeric field is `Option<f64>`: `None` means "no data reported",
/// which is distinct from a reported zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity: String,
    pub iso_code: Option<String>,
    pub date: NaiveDate,
    pub population: Option<f64>,
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub new_cases: Option<f64>,
    pub new_deaths: Option<f64>,
    pub total_vaccinations: Option<f64>,
}
