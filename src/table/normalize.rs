//! Turns the raw 24-column table into the five-column urchin subset.

use crate::table::error::NormalizeError;
use crate::table::record::NormalizedTable;
use crate::table::schema::{
    canonical_column_names, COL_COMMON_NAME, COL_DATE, COL_DRY_GM2, COL_SITE, COL_YEAR,
    PROJECTED_COLUMNS,
};
use log::debug;
use polars::prelude::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Row filters applied after projection.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    pub year_min: i64,
    pub year_max: i64,
    /// Accepted common names. Compared after lower-casing.
    pub species: Vec<String>,
    pub site: String,
}

impl NormalizeOptions {
    pub fn new(year_min: i64, year_max: i64, species: &[String], site: &str) -> Self {
        Self {
            year_min,
            year_max,
            species: species.iter().map(|s| s.to_ascii_lowercase()).collect(),
            site: site.to_ascii_lowercase(),
        }
    }
}

pub trait UrchinFrameFilterExt {
    /// Keeps rows whose `year` lies in `[year_min, year_max]` (inclusive).
    fn filter_year_range(self, year_min: i64, year_max: i64) -> LazyFrame;

    /// Keeps rows whose `common_name` equals one of `species`.
    fn filter_species(self, species: &[String]) -> LazyFrame;

    /// Keeps rows whose `site` equals `site`.
    fn filter_site(self, site: &str) -> LazyFrame;
}

impl UrchinFrameFilterExt for LazyFrame {
    fn filter_year_range(self, year_min: i64, year_max: i64) -> LazyFrame {
        self.filter(
            col(COL_YEAR)
                .gt_eq(lit(year_min))
                .and(col(COL_YEAR).lt_eq(lit(year_max))),
        )
    }

    fn filter_species(self, species: &[String]) -> LazyFrame {
        let predicate = species.iter().fold(lit(false), |acc, name| {
            acc.or(col(COL_COMMON_NAME).eq(lit(name.as_str())))
        });
        self.filter(predicate)
    }

    fn filter_site(self, site: &str) -> LazyFrame {
        self.filter(col(COL_SITE).eq(lit(site)))
    }
}

/// Renames, projects, coerces and filters `raw`.
///
/// Row order is preserved. Running this again on its own output returns the
/// same table.
///
/// # Errors
///
/// * [`NormalizeError::SchemaMismatch`] if one of the projected columns is
///   missing after renaming.
/// * [`NormalizeError::ValueError`] for the first `date` value that is not a
///   `YYYY-MM-DD` date. The whole call fails; no rows are skipped.
pub fn normalize(
    raw: &DataFrame,
    options: &NormalizeOptions,
) -> Result<NormalizedTable, NormalizeError> {
    let projected = project(raw)?;
    let coerced = coerce(&projected)?;
    debug!("Normalizing {} rows", coerced.height());

    let by_year = coerced
        .lazy()
        .filter_year_range(options.year_min, options.year_max)
        .collect()?;
    debug!(
        "{} rows in years {}-{}",
        by_year.height(),
        options.year_min,
        options.year_max
    );

    let by_species = by_year.lazy().filter_species(&options.species).collect()?;
    debug!(
        "{} rows for species {:?}",
        by_species.height(),
        options.species
    );

    let by_site = by_species.lazy().filter_site(&options.site).collect()?;
    debug!("{} rows at site {}", by_site.height(), options.site);

    Ok(NormalizedTable::new(by_site))
}

/// Canonical names, then exactly the five projected columns.
fn project(raw: &DataFrame) -> Result<DataFrame, NormalizeError> {
    let mut renamed = raw.clone();
    let canonical =
        canonical_column_names(raw.get_column_names().iter().map(|name| name.as_str()));
    renamed.set_column_names(canonical.iter().map(String::as_str))?;

    if let Some(missing) = PROJECTED_COLUMNS
        .iter()
        .find(|column| renamed.get_column_index(column).is_none())
    {
        return Err(NormalizeError::SchemaMismatch {
            column: missing.to_string(),
        });
    }

    Ok(renamed.select(PROJECTED_COLUMNS)?)
}

fn coerce(projected: &DataFrame) -> Result<DataFrame, NormalizeError> {
    let date = if projected.column(COL_DATE)?.dtype() == &DataType::Date {
        col(COL_DATE)
    } else {
        col(COL_DATE)
            .cast(DataType::String)
            .str()
            .to_date(StrptimeOptions {
                format: Some(DATE_FORMAT.into()),
                strict: false,
                exact: true,
                cache: true,
            })
    };

    let coerced = projected
        .clone()
        .lazy()
        .with_columns([
            col(COL_YEAR).strict_cast(DataType::Int64),
            date,
            col(COL_SITE).cast(DataType::String).str().to_lowercase(),
            col(COL_DRY_GM2).strict_cast(DataType::Float64),
            col(COL_COMMON_NAME)
                .cast(DataType::String)
                .str()
                .to_lowercase(),
        ])
        .collect()?;

    ensure_dates_parsed(projected, &coerced)?;
    Ok(coerced)
}

/// Fails on the first row whose date did not survive coercion.
fn ensure_dates_parsed(before: &DataFrame, after: &DataFrame) -> Result<(), NormalizeError> {
    let parsed = after.column(COL_DATE)?;
    if parsed.null_count() == 0 {
        return Ok(());
    }

    let failed = parsed.as_materialized_series().is_null();
    let row = failed
        .into_iter()
        .position(|is_null| is_null == Some(true))
        .ok_or_else(|| NormalizeError::UnexpectedData("null date without position".into()))?;

    let value = match before.column(COL_DATE)?.as_materialized_series().get(row)? {
        AnyValue::Null => "<missing>".to_string(),
        other => other.to_string().trim_matches('"').to_string(),
    };

    Err(NormalizeError::ValueError {
        column: COL_DATE.to_string(),
        row,
        value,
    })
}
