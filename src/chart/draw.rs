use crate::chart::error::RenderError;
use crate::chart::scale::{MarkerShape, Rgb};
use crate::chart::spec::{ResolvedChart, Series};
use chrono::{Datelike, NaiveDate};
use log::info;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    /// Picks the backend from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("svg") => Ok(OutputFormat::Svg),
            Some("png") => Ok(OutputFormat::Png),
            _ => Err(RenderError::UnsupportedOutput(path.to_path_buf())),
        }
    }
}

pub(crate) fn save(chart: &ResolvedChart, path: &Path) -> Result<(), RenderError> {
    let result = match OutputFormat::from_path(path)? {
        OutputFormat::Svg => {
            draw_chart(SVGBackend::new(path, chart.size).into_drawing_area(), chart)
        }
        OutputFormat::Png => {
            draw_chart(BitMapBackend::new(path, chart.size).into_drawing_area(), chart)
        }
    };
    result.map_err(|e| RenderError::Draw {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    info!(
        "Wrote chart with {} series ({} marks) to {}",
        chart.series.len(),
        chart.mark_count(),
        path.display()
    );
    Ok(())
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn format_day(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    chart: &ResolvedChart,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let theme = &chart.theme;
    let font = theme.font_family.as_str();
    let text = color(theme.text);

    root.fill(&color(theme.background))?;

    let x_range = day_number(chart.x_range.0)..day_number(chart.x_range.1);
    let y_range = chart.y_range.0..chart.y_range.1;

    let mut ctx = ChartBuilder::on(&root)
        .caption(
            chart.labels.title.as_str(),
            (font, theme.title_size).into_font().color(&text),
        )
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_range, y_range)?;

    let x_formatter = |v: &f64| format_day(*v);
    ctx.configure_mesh()
        .x_desc(chart.labels.x.as_str())
        .y_desc(chart.labels.y.as_str())
        .x_label_formatter(&x_formatter)
        .label_style((font, theme.label_size).into_font().color(&text))
        .bold_line_style(color(theme.major_grid))
        .light_line_style(color(theme.minor_grid))
        .axis_style(color(theme.axis_line.unwrap_or(theme.background)))
        .draw()?;

    if chart.is_empty() {
        root.present()?;
        return Ok(());
    }

    if !chart.legend_title.is_empty() {
        ctx.draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?
            .label(chart.legend_title.as_str())
            .legend(|(x, y)| EmptyElement::at((x, y)));
    }

    for series in &chart.series {
        let style = color(series.color);

        if chart.draw_lines {
            for run in &series.runs {
                ctx.draw_series(LineSeries::new(
                    run.iter().map(|(d, v)| (day_number(*d), *v)),
                    style.stroke_width(theme.line_width),
                ))?;
            }
        }
        if chart.draw_points {
            draw_markers(&mut ctx, series, theme.point_size)?;
        }
        add_legend_entry(&mut ctx, series, theme.point_size)?;
    }

    ctx.configure_series_labels()
        .background_style(color(theme.background).mix(0.8))
        .border_style(color(theme.major_grid))
        .label_font((font, theme.label_size).into_font().color(&text))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

type Ctx<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_markers<DB>(
    ctx: &mut Ctx<'_, DB>,
    series: &Series,
    size: u32,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let style = color(series.color).filled();
    let points = series.points.iter().map(|(d, v)| (day_number(*d), *v));
    let half = size as i32;

    match series.shape {
        MarkerShape::Circle => {
            ctx.draw_series(points.map(|p| Circle::new(p, size, style)))?;
        }
        MarkerShape::Triangle => {
            ctx.draw_series(points.map(|p| TriangleMarker::new(p, size, style)))?;
        }
        MarkerShape::Square => {
            ctx.draw_series(points.map(|p| {
                EmptyElement::at(p) + Rectangle::new([(-half, -half), (half, half)], style)
            }))?;
        }
        MarkerShape::Cross => {
            ctx.draw_series(points.map(|p| Cross::new(p, size, style)))?;
        }
    }
    Ok(())
}

fn add_legend_entry<DB>(
    ctx: &mut Ctx<'_, DB>,
    series: &Series,
    size: u32,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let style = color(series.color).filled();
    let half = size as i32;
    let anno = ctx.draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?;
    anno.label(series.category.as_str());

    match series.shape {
        MarkerShape::Circle => {
            anno.legend(move |(x, y)| Circle::new((x, y), size, style));
        }
        MarkerShape::Triangle => {
            anno.legend(move |(x, y)| TriangleMarker::new((x, y), size, style));
        }
        MarkerShape::Square => {
            anno.legend(move |(x, y)| {
                Rectangle::new([(x - half, y - half), (x + half, y + half)], style)
            });
        }
        MarkerShape::Cross => {
            anno.legend(move |(x, y)| Cross::new((x, y), size, style));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/urchins.svg")).ok(),
            Some(OutputFormat::Svg)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("URCHINS.PNG")).ok(),
            Some(OutputFormat::Png)
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("urchins")),
            Err(RenderError::UnsupportedOutput(_))
        ));
    }

    #[test]
    fn test_day_axis_labels() {
        let date = NaiveDate::from_ymd_opt(2019, 6, 15).unwrap();
        assert_eq!(format_day(day_number(date)), "2019-06");
    }
}
