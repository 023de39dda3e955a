//! Declarative chart description and its resolution into drawable series.
//!
//! A [`ChartSpec`] only records *what* to draw: the data, which columns feed
//! the x, y and category channels, the marks, scales, theme and labels.
//! Nothing is read from the data until [`ChartSpec::resolve`] is called, and
//! nothing touches a drawing backend until [`ChartSpec::save`].

use crate::chart::draw;
use crate::chart::error::RenderError;
use crate::chart::scale::{ColorScale, MarkerShape, Rgb};
use crate::chart::theme::Theme;
use bon::Builder;
use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Geometry drawn for each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// One marker per row.
    Point,
    /// Rows of a category joined in x order, broken where y is missing.
    Line,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    pub title: String,
    pub x: String,
    pub y: String,
    /// Shared title of the colour and shape legends.
    pub legend: String,
}

/// A chart built incrementally and resolved once at render time.
///
/// # Examples
///
/// ```
/// use urchin_biomass::{ChartSpec, Mark};
/// use polars::prelude::*;
/// use chrono::NaiveDate;
///
/// let data = df!(
///     "date" => [NaiveDate::from_ymd_opt(2015, 8, 1).unwrap()],
///     "dry_gm2" => [12.4],
///     "common_name" => ["red urchin"],
/// ).unwrap();
///
/// let chart = ChartSpec::builder()
///     .data(data)
///     .x("date")
///     .y("dry_gm2")
///     .category("common_name")
///     .marks(vec![Mark::Point])
///     .build()
///     .resolve()
///     .unwrap();
///
/// assert_eq!(chart.mark_count(), 1);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ChartSpec {
    data: DataFrame,
    /// Date column for the horizontal axis.
    #[builder(into)]
    x: String,
    /// Numeric column for the vertical axis.
    #[builder(into)]
    y: String,
    /// String column bound to both colour and marker shape.
    #[builder(into)]
    category: String,
    #[builder(default = vec![Mark::Point, Mark::Line])]
    marks: Vec<Mark>,
    #[builder(default)]
    color_scale: ColorScale,
    #[builder(default)]
    theme: Theme,
    #[builder(default)]
    labels: Labels,
    /// Minimum x extent; widened if the data falls outside it.
    x_domain: Option<(NaiveDate, NaiveDate)>,
    #[builder(default = (1000, 600))]
    size: (u32, u32),
}

/// All points of one category, sorted by x.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub category: String,
    pub color: Rgb,
    pub shape: MarkerShape,
    pub points: Run,
    /// Line runs in x order. A missing y value ends one run and starts the next.
    pub runs: Vec<Run>,
}

pub type Run = Vec<(NaiveDate, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
    pub shape: MarkerShape,
}

/// Backend-independent result of [`ChartSpec::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChart {
    pub series: Vec<Series>,
    pub legend_title: String,
    pub legend: Vec<LegendEntry>,
    pub x_range: (NaiveDate, NaiveDate),
    pub y_range: (f64, f64),
    pub draw_points: bool,
    pub draw_lines: bool,
    pub labels: Labels,
    pub theme: Theme,
    pub size: (u32, u32),
}

impl ResolvedChart {
    /// Number of markers plus line segments that will be drawn.
    pub fn mark_count(&self) -> usize {
        self.series
            .iter()
            .map(|s| {
                let points = if self.draw_points { s.points.len() } else { 0 };
                let segments = if self.draw_lines {
                    s.runs.iter().map(|r| r.len().saturating_sub(1)).sum()
                } else {
                    0
                };
                points + segments
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl ChartSpec {
    /// Reads the channel columns and groups rows into per-category series.
    ///
    /// Rows without a date or category are skipped. A row with a missing or
    /// non-finite y value draws no marker and breaks its category's line, so
    /// the points on either side of it are not joined. An empty frame
    /// resolves to a chart without series.
    ///
    /// # Errors
    ///
    /// * [`RenderError::MissingChannel`] / [`RenderError::ChannelType`] when a
    ///   channel column is absent or has the wrong type.
    /// * [`RenderError::UnmappedCategory`] when the colour scale rejects a
    ///   category.
    pub fn resolve(&self) -> Result<ResolvedChart, RenderError> {
        let x = self.channel("x", &self.x)?;
        if x.dtype() != &DataType::Date {
            return Err(self.type_error("x", &self.x, "date", x.dtype()));
        }
        let y = self.channel("y", &self.y)?;
        if !y.dtype().is_primitive_numeric() {
            return Err(self.type_error("y", &self.y, "numeric", y.dtype()));
        }
        let category = self.channel("category", &self.category)?;
        if category.dtype() != &DataType::String {
            return Err(self.type_error(
                "category",
                &self.category,
                "string",
                category.dtype(),
            ));
        }

        let y = y.cast(&DataType::Float64)?;
        let mut groups: BTreeMap<String, Vec<(NaiveDate, Option<f64>)>> = BTreeMap::new();
        let mut skipped = 0usize;

        for ((date, value), name) in x
            .date()?
            .as_date_iter()
            .zip(y.f64()?.into_iter())
            .zip(category.str()?.into_iter())
        {
            match (date, name) {
                (Some(date), Some(name)) => {
                    let value = value.filter(|v| v.is_finite());
                    if value.is_none() {
                        skipped += 1;
                    }
                    groups.entry(name.to_string()).or_default().push((date, value));
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("Skipped {} rows with missing chart values", skipped);
        }

        groups.retain(|_, rows| rows.iter().any(|(_, v)| v.is_some()));

        let mut series = Vec::with_capacity(groups.len());
        for (index, (name, mut rows)) in groups.into_iter().enumerate() {
            rows.sort_by_key(|(date, _)| *date);
            let (points, runs) = split_runs(&rows);
            series.push(Series {
                color: self.color_scale.color_for(&name)?,
                shape: MarkerShape::for_index(index),
                category: name,
                points,
                runs,
            });
        }

        let legend = series
            .iter()
            .map(|s| LegendEntry {
                label: s.category.clone(),
                color: s.color,
                shape: s.shape,
            })
            .collect();

        Ok(ResolvedChart {
            x_range: self.x_range(&series),
            y_range: y_range(&series),
            legend,
            series,
            legend_title: self.labels.legend.clone(),
            draw_points: self.marks.contains(&Mark::Point),
            draw_lines: self.marks.contains(&Mark::Line),
            labels: self.labels.clone(),
            theme: self.theme.clone(),
            size: self.size,
        })
    }

    /// Resolves the chart and writes it to `path` (`.svg` or `.png`).
    pub fn save(&self, path: &Path) -> Result<ResolvedChart, RenderError> {
        let resolved = self.resolve()?;
        draw::save(&resolved, path)?;
        Ok(resolved)
    }

    fn channel(&self, channel: &'static str, column: &str) -> Result<&Column, RenderError> {
        self.data
            .column(column)
            .map_err(|_| RenderError::MissingChannel {
                channel,
                column: column.to_string(),
            })
    }

    fn type_error(
        &self,
        channel: &'static str,
        column: &str,
        expected: &'static str,
        found: &DataType,
    ) -> RenderError {
        RenderError::ChannelType {
            channel,
            column: column.to_string(),
            expected,
            found: found.clone(),
        }
    }

    fn x_range(&self, series: &[Series]) -> (NaiveDate, NaiveDate) {
        let dates = series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
        let extent = dates.fold(self.x_domain, |acc, date| match acc {
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
            None => Some((date, date)),
        });
        match extent {
            Some((lo, hi)) if lo < hi => (lo, hi),
            Some((lo, _)) => (lo, lo + chrono::Duration::days(1)),
            None => {
                let epoch = NaiveDate::default();
                (epoch, epoch + chrono::Duration::days(1))
            }
        }
    }
}

/// Present points, plus the runs between missing values.
fn split_runs(rows: &[(NaiveDate, Option<f64>)]) -> (Run, Vec<Run>) {
    let mut points = Vec::with_capacity(rows.len());
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (date, value) in rows {
        match value {
            Some(v) => {
                points.push((*date, *v));
                current.push((*date, *v));
            }
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    (points, runs)
}

/// Starts at zero (biomass is never negative) and pads the top by 5%.
fn y_range(series: &[Series]) -> (f64, f64) {
    let values = series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v));
    let (lo, hi) = values.fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !hi.is_finite() || hi <= lo {
        return (lo, lo + 1.0);
    }
    (lo, hi + (hi - lo) * 0.05)
}
