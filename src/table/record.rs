use crate::table::error::NormalizeError;
use crate::table::schema::{COL_COMMON_NAME, COL_DATE, COL_DRY_GM2, COL_SITE, COL_YEAR};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// One urchin observation after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub year: i64,
    pub date: NaiveDate,
    /// Lowercase site code, e.g. `napl`.
    pub site: String,
    /// Dry biomass in g/m2. `None` where the survey left the cell empty.
    pub dry_mass_per_area: Option<f64>,
    /// Lowercase common name, e.g. `red urchin`.
    pub common_name: String,
}

/// Observation count and date span for one species.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesSummary {
    pub common_name: String,
    pub observations: usize,
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// The normalized five-column table: `year, date, site, dry_gm2, common_name`.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    /// The underlying Polars frame.
    pub frame: DataFrame,
}

impl NormalizedTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Collects the frame into typed rows, in table order.
    pub fn records(&self) -> Result<Vec<NormalizedRecord>, NormalizeError> {
        let years = self.frame.column(COL_YEAR)?.i64()?;
        let dates = self.frame.column(COL_DATE)?.date()?;
        let sites = self.frame.column(COL_SITE)?.str()?;
        let biomass = self.frame.column(COL_DRY_GM2)?.f64()?;
        let names = self.frame.column(COL_COMMON_NAME)?.str()?;

        years
            .into_iter()
            .zip(dates.as_date_iter())
            .zip(sites.into_iter())
            .zip(biomass.into_iter())
            .zip(names.into_iter())
            .enumerate()
            .map(|(row, ((((year, date), site), dry), name))| {
                let missing = |column: &str| {
                    NormalizeError::UnexpectedData(format!("null {} at row {}", column, row))
                };
                Ok(NormalizedRecord {
                    year: year.ok_or_else(|| missing(COL_YEAR))?,
                    date: date.ok_or_else(|| missing(COL_DATE))?,
                    site: site.ok_or_else(|| missing(COL_SITE))?.to_string(),
                    dry_mass_per_area: dry,
                    common_name: name.ok_or_else(|| missing(COL_COMMON_NAME))?.to_string(),
                })
            })
            .collect()
    }

    /// Per-species counts and date spans, ordered by name.
    pub fn summary(&self) -> Result<Vec<SpeciesSummary>, NormalizeError> {
        let mut by_name: BTreeMap<String, SpeciesSummary> = BTreeMap::new();
        for record in self.records()? {
            by_name
                .entry(record.common_name.clone())
                .and_modify(|s| {
                    s.observations += 1;
                    s.first = s.first.min(record.date);
                    s.last = s.last.max(record.date);
                })
                .or_insert(SpeciesSummary {
                    common_name: record.common_name,
                    observations: 1,
                    first: record.date,
                    last: record.date,
                });
        }
        Ok(by_name.into_values().collect())
    }
}
