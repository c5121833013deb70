//! Metrics Calculator Module
//! Computes per-row derived rates and the choropleth snapshot.

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

use crate::data::{Observation, PreparedData};

pub const DEATH_RATE: &str = "death_rate";
pub const VACCINATION_RATE: &str = "vaccination_rate";
pub const CASES_PER_MILLION: &str = "cases_per_million";

/// Secondary metrics for one row. `None` means the metric is undefined for
/// that row (zero or absent denominator) — never zero, never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMetrics {
    pub death_rate: Option<f64>,
    pub vaccination_rate: Option<f64>,
    pub cases_per_million: Option<f64>,
}

/// Death rate for one entity at the latest prepared date.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDeathRate {
    pub entity: String,
    pub date: NaiveDate,
    pub death_rate: f64,
}

/// One entity's latest-date row, shaped for the choropleth consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub entity: String,
    pub iso_code: Option<String>,
    pub date: NaiveDate,
    pub total_cases: Option<f64>,
    pub population: Option<f64>,
    pub cases_per_million: Option<f64>,
}

/// Handles derived-metric computation over cleaned rows.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute the three derived metrics for one row.
    pub fn derive(row: &Observation) -> DerivedMetrics {
        DerivedMetrics {
            death_rate: ratio(row.total_deaths, row.total_cases),
            vaccination_rate: ratio(row.total_vaccinations, row.population).map(|r| r * 100.0),
            cases_per_million: ratio(row.total_cases, row.population).map(|r| r * 1_000_000.0),
        }
    }

    /// Cleaned frame plus the three derived columns, null where undefined.
    pub fn enriched_frame(prepared: &PreparedData) -> Result<DataFrame, PolarsError> {
        let metrics: Vec<DerivedMetrics> = prepared.rows().iter().map(Self::derive).collect();

        let mut df = prepared.to_dataframe()?;
        df.with_column(Column::new(
            DEATH_RATE.into(),
            metrics.iter().map(|m| m.death_rate).collect::<Vec<_>>(),
        ))?;
        df.with_column(Column::new(
            VACCINATION_RATE.into(),
            metrics
                .iter()
                .map(|m| m.vaccination_rate)
                .collect::<Vec<_>>(),
        ))?;
        df.with_column(Column::new(
            CASES_PER_MILLION.into(),
            metrics
                .iter()
                .map(|m| m.cases_per_million)
                .collect::<Vec<_>>(),
        ))?;
        Ok(df)
    }

    /// Per-entity death rates at the latest date in the prepared table.
    /// Entities whose rate is undefined on that date are skipped.
    pub fn latest_death_rates(prepared: &PreparedData) -> Vec<EntityDeathRate> {
        let Some(latest) = prepared.rows().iter().map(|r| r.date).max() else {
            return Vec::new();
        };
        prepared
            .rows()
            .iter()
            .filter(|r| r.date == latest)
            .filter_map(|r| {
                Self::derive(r).death_rate.map(|rate| EntityDeathRate {
                    entity: r.entity.clone(),
                    date: latest,
                    death_rate: rate,
                })
            })
            .collect()
    }

    /// Latest-date snapshot over the **full** dataset, one point per entity,
    /// for the map consumer. Runs on raw observations on purpose: the map
    /// covers every reporting entity, not just the filtered subset.
    pub fn latest_snapshot(rows: &[Observation]) -> Vec<MapPoint> {
        let Some(latest) = rows.iter().map(|r| r.date).max() else {
            return Vec::new();
        };
        let points: Vec<MapPoint> = rows
            .iter()
            .filter(|r| r.date == latest)
            .map(|r| MapPoint {
                entity: r.entity.clone(),
                iso_code: r.iso_code.clone(),
                date: latest,
                total_cases: r.total_cases,
                population: r.population,
                cases_per_million: Self::derive(r).cases_per_million,
            })
            .collect();
        debug!(date = %latest, points = points.len(), "built map snapshot");
        points
    }
}

/// `num / denom`, undefined on a zero or absent denominator or absent
/// numerator.
fn ratio(num: Option<f64>, denom: Option<f64>) -> Option<f64> {
    match (num, denom) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DatasetPreparer;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    fn obs(entity: &str, d: u32) -> Observation {
        Observation {
            entity: entity.to_string(),
            iso_code: None,
            date: day(d),
            population: None,
            total_cases: None,
            total_deaths: None,
            new_cases: None,
            new_deaths: None,
            total_vaccinations: None,
        }
    }

    #[test]
    fn death_rate_is_absent_for_zero_or_absent_cases() {
        let mut zeroed = obs("Y", 1);
        zeroed.total_cases = Some(0.0);
        zeroed.total_deaths = Some(0.0);
        assert_eq!(MetricsCalculator::derive(&zeroed).death_rate, None);

        let absent = obs("Y", 1);
        assert_eq!(MetricsCalculator::derive(&absent).death_rate, None);
    }

    #[test]
    fn death_rate_is_the_plain_ratio_otherwise() {
        let mut row = obs("Y", 1);
        row.total_cases = Some(200.0);
        row.total_deaths = Some(5.0);
        assert_eq!(MetricsCalculator::derive(&row).death_rate, Some(0.025));
    }

    #[test]
    fn population_rates_guard_the_denominator() {
        let mut row = obs("Kenya", 1);
        row.total_cases = Some(1000.0);
        row.total_vaccinations = Some(250.0);
        assert_eq!(MetricsCalculator::derive(&row).vaccination_rate, None);
        assert_eq!(MetricsCalculator::derive(&row).cases_per_million, None);

        row.population = Some(1_000_000.0);
        let m = MetricsCalculator::derive(&row);
        assert_eq!(m.vaccination_rate, Some(0.025));
        assert_eq!(m.cases_per_million, Some(1000.0));
    }

    #[test]
    fn enriched_frame_leaves_undefined_metrics_null() {
        let mut defined = obs("Kenya", 1);
        defined.total_cases = Some(100.0);
        defined.total_deaths = Some(2.0);
        let undefined = obs("Kenya", 2);

        let prepared =
            DatasetPreparer::prepare(vec![defined, undefined], &["Kenya".to_string()]).unwrap();
        let df = MetricsCalculator::enriched_frame(&prepared).unwrap();

        let rates = df.column(DEATH_RATE).unwrap();
        let ca = rates.f64().unwrap();
        assert_eq!(ca.get(0), Some(0.02));
        // Zero-filled cases on day 2 leave the rate undefined, not 0
        assert_eq!(ca.get(1), None);
    }

    #[test]
    fn latest_death_rates_skip_undefined_entities() {
        let mut kenya = obs("Kenya", 2);
        kenya.total_cases = Some(100.0);
        kenya.total_deaths = Some(3.0);
        let france = obs("France", 2);
        let stale = obs("Kenya", 1);

        let entities = vec!["Kenya".to_string(), "France".to_string()];
        let prepared = DatasetPreparer::prepare(vec![stale, kenya, france], &entities).unwrap();
        let rates = MetricsCalculator::latest_death_rates(&prepared);

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].entity, "Kenya");
        assert_eq!(rates[0].date, day(2));
        assert_eq!(rates[0].death_rate, 0.03);
    }

    #[test]
    fn snapshot_keeps_only_the_global_latest_date() {
        let mut brazil = obs("Brazil", 3);
        brazil.iso_code = Some("BRA".to_string());
        brazil.total_cases = Some(2000.0);
        brazil.population = Some(1_000_000.0);
        let mut kenya_old = obs("Kenya", 2);
        kenya_old.total_cases = Some(100.0);
        let mut kenya_new = obs("Kenya", 3);
        kenya_new.iso_code = Some("KEN".to_string());

        let points = MetricsCalculator::latest_snapshot(&[kenya_old, brazil, kenya_new]);
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.date == day(3)));

        let brazil = points.iter().find(|p| p.entity == "Brazil").unwrap();
        assert_eq!(brazil.iso_code.as_deref(), Some("BRA"));
        assert_eq!(brazil.cases_per_million, Some(2000.0));

        // No population on the latest Kenya row: point present, metric absent
        let kenya = points.iter().find(|p| p.entity == "Kenya").unwrap();
        assert_eq!(kenya.cases_per_million, None);
    }

    #[test]
    fn snapshot_of_empty_table_is_empty() {
        assert!(MetricsCalculator::latest_snapshot(&[]).is_empty());
    }
}
