//! Dataset Preparer Module
//! Entity filtering, missing-value repair, and the cleaned-table type.

use polars::prelude::*;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use super::model::{
    Observation, COL_DATE, COL_ISO_CODE, COL_LOCATION, COL_NEW_CASES, COL_NEW_DEATHS,
    COL_POPULATION, COL_TOTAL_CASES, COL_TOTAL_DEATHS, COL_TOTAL_VACCINATIONS,
};

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("invalid entity set: {0}")]
    InvalidEntitySet(String),
}

/// The cleaned table: rows restricted to the requested entities, counters
/// materialized, vaccination gaps repaired. Read-only from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    rows: Vec<Observation>,
    entities: Vec<String>,
}

impl PreparedData {
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// The entity filter the table was prepared with, in request order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows for one entity, in table order (ascending by date when the raw
    /// feed is ordered, which the cleaning step assumes and preserves).
    pub fn entity_rows<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.rows.iter().filter(move |r| r.entity == entity)
    }

    /// Rebuild a Polars frame for frame-oriented consumers. Dates render as
    /// ISO strings; still-absent vaccination values come out as nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        let n = self.rows.len();
        let mut locations: Vec<String> = Vec::with_capacity(n);
        let mut iso_codes: Vec<Option<String>> = Vec::with_capacity(n);
        let mut dates: Vec<String> = Vec::with_capacity(n);
        let mut populations: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut total_cases: Vec<f64> = Vec::with_capacity(n);
        let mut total_deaths: Vec<f64> = Vec::with_capacity(n);
        let mut new_cases: Vec<f64> = Vec::with_capacity(n);
        let mut new_deaths: Vec<f64> = Vec::with_capacity(n);
        let mut total_vaccinations: Vec<Option<f64>> = Vec::with_capacity(n);

        for row in &self.rows {
            locations.push(row.entity.clone());
            iso_codes.push(row.iso_code.clone());
            dates.push(row.date.format("%Y-%m-%d").to_string());
            populations.push(row.population);
            total_cases.push(row.total_cases.unwrap_or_default());
            total_deaths.push(row.total_deaths.unwrap_or_default());
            new_cases.push(row.new_cases.unwrap_or_default());
            new_deaths.push(row.new_deaths.unwrap_or_default());
            total_vaccinations.push(row.total_vaccinations);
        }

        DataFrame::new(vec![
            Column::new(COL_LOCATION.into(), locations),
            Column::new(COL_ISO_CODE.into(), iso_codes),
            Column::new(COL_DATE.into(), dates),
            Column::new(COL_POPULATION.into(), populations),
            Column::new(COL_TOTAL_CASES.into(), total_cases),
            Column::new(COL_TOTAL_DEATHS.into(), total_deaths),
            Column::new(COL_NEW_CASES.into(), new_cases),
            Column::new(COL_NEW_DEATHS.into(), new_deaths),
            Column::new(COL_TOTAL_VACCINATIONS.into(), total_vaccinations),
        ])
    }
}

/// Handles entity filtering and missing-value repair.
pub struct DatasetPreparer;

impl DatasetPreparer {
    /// Clean the raw table per the fixed per-column policy.
    ///
    /// Counters (`total_cases`, `total_deaths`, `new_cases`, `new_deaths`)
    /// are zero-filled where absent. `total_vaccinations` gaps strictly
    /// between two reported values are filled by linear interpolation over
    /// elapsed days, per entity; gaps before the first or after the last
    /// reported value stay absent. Row count and order are those of the
    /// input restricted to `entities`; no other field is touched.
    ///
    /// Zero-filling conflates "not yet reported" with "confirmed zero"; the
    /// two are indistinguishable in the cleaned table. That matches the
    /// upstream feed's reporting conventions and is a documented limitation.
    pub fn prepare(
        rows: Vec<Observation>,
        entities: &[String],
    ) -> Result<PreparedData, PrepareError> {
        if entities.is_empty() {
            return Err(PrepareError::InvalidEntitySet(
                "no entities requested".to_string(),
            ));
        }

        let requested: HashSet<&str> = entities.iter().map(String::as_str).collect();
        let mut rows: Vec<Observation> = rows
            .into_iter()
            .filter(|r| requested.contains(r.entity.as_str()))
            .collect();

        let present: HashSet<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        let mut unknown: Vec<&str> = entities
            .iter()
            .map(String::as_str)
            .filter(|e| !present.contains(e))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            unknown.dedup();
            return Err(PrepareError::InvalidEntitySet(format!(
                "no rows for: {}",
                unknown.join(", ")
            )));
        }

        for row in &mut rows {
            row.total_cases.get_or_insert(0.0);
            row.total_deaths.get_or_insert(0.0);
            row.new_cases.get_or_insert(0.0);
            row.new_deaths.get_or_insert(0.0);
        }

        let filled = Self::fill_vaccination_gaps(&mut rows);
        info!(
            entities = entities.len(),
            rows = rows.len(),
            filled,
            "prepared dataset"
        );

        Ok(PreparedData {
            rows,
            entities: entities.to_vec(),
        })
    }

    /// Interpolate interior `total_vaccinations` gaps, one entity at a time.
    /// Returns the number of values filled in.
    fn fill_vaccination_gaps(rows: &mut [Observation]) -> usize {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            groups.entry(row.entity.as_str()).or_default().push(i);
        }
        let groups: Vec<Vec<usize>> = groups.into_values().collect();

        // Entities are independent; the fills are computed in parallel and
        // applied by row index, so the result is deterministic.
        let fills: Vec<(usize, f64)> = {
            let view: &[Observation] = rows;
            groups
                .par_iter()
                .flat_map_iter(|idxs| interpolate_entity(view, idxs))
                .collect()
        };

        let count = fills.len();
        for (i, value) in fills {
            rows[i].total_vaccinations = Some(value);
        }
        debug!(filled = count, "vaccination gaps interpolated");
        count
    }
}

/// Linear interpolation over elapsed days between bounding reported values.
/// Only runs strictly between two knowns are filled; leading and trailing
/// gaps are left alone (forward policy, no extrapolation).
fn interpolate_entity(rows: &[Observation], idxs: &[usize]) -> Vec<(usize, f64)> {
    let mut ordered: Vec<usize> = idxs.to_vec();
    ordered.sort_by_key(|&i| rows[i].date);

    let known: Vec<usize> = ordered
        .iter()
        .enumerate()
        .filter(|(_, &i)| rows[i].total_vaccinations.is_some())
        .map(|(pos, _)| pos)
        .collect();

    let mut fills = Vec::new();
    for pair in known.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a <= 1 {
            continue;
        }
        let (ia, ib) = (ordered[a], ordered[b]);
        let (Some(va), Some(vb)) = (rows[ia].total_vaccinations, rows[ib].total_vaccinations)
        else {
            continue;
        };
        let span = (rows[ib].date - rows[ia].date).num_days() as f64;

        for &pos in &ordered[a + 1..b] {
            let value = if span > 0.0 {
                let elapsed = (rows[pos].date - rows[ia].date).num_days() as f64;
                va + (vb - va) * (elapsed / span)
            } else {
                // Duplicate dates; fall back to the earlier reported value
                va
            };
            fills.push((pos, value.max(0.0)));
        }
    }
    fills
}
