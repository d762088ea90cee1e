use std::path::Path;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle, TextStyle};

use vitals_core::models::MeasurementRecord;
use vitals_core::service::TrackerService;

const SIZE: (u32, u32) = (1200, 900);

/// Draw the whole log into an SVG at `path`: weight with its projection,
/// sleep, resting heart rate, and sleep against resting heart rate.
///
/// Returns `false` (and writes nothing) when the log is empty.
pub(crate) fn render_chart(svc: &TrackerService, path: &Path, horizon_days: u32) -> Result<bool> {
    let records = svc.list_entries(None, None)?;
    let Some(origin) = records.iter().map(|r| r.date).min() else {
        return Ok(false);
    };

    let weights = series(&records, origin, |r| r.weight);
    let sleep = series(&records, origin, |r| r.sleep_duration);
    let heart = series(&records, origin, |r| r.resting_heart_rate.map(f64::from));
    let forecast: Vec<(f64, f64)> = svc
        .projection(horizon_days)?
        .map(|p| {
            p.forecast_dates
                .iter()
                .map(|d| day_offset(origin, *d))
                .zip(p.forecast_weights)
                .collect()
        })
        .unwrap_or_default();
    let sleep_vs_heart: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.sleep_duration?, f64::from(r.resting_heart_rate?))))
        .collect();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    line_panel(
        &panels[0],
        "Weight (lbs)",
        origin,
        &[
            ("Weight", weights.as_slice(), BLUE),
            ("Projection", forecast.as_slice(), RED),
        ],
    )?;
    line_panel(
        &panels[1],
        "Sleep duration (hours)",
        origin,
        &[("Sleep", sleep.as_slice(), GREEN)],
    )?;
    line_panel(
        &panels[2],
        "Resting heart rate (bpm)",
        origin,
        &[("Resting HR", heart.as_slice(), MAGENTA)],
    )?;
    scatter_panel(&panels[3], "Sleep vs resting heart rate", &sleep_vs_heart)?;

    root.present()?;
    tracing::info!(path = %path.display(), records = records.len(), "Chart written");
    Ok(true)
}

fn title_style() -> TextStyle<'static> {
    FontDesc::new(FontFamily::SansSerif, 20.0, FontStyle::Normal).into()
}

fn series(
    records: &[MeasurementRecord],
    origin: NaiveDate,
    value: impl Fn(&MeasurementRecord) -> Option<f64>,
) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| value(r).map(|v| (day_offset(origin, r.date), v)))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

#[allow(clippy::cast_precision_loss)]
fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn date_label(origin: NaiveDate, offset: f64) -> String {
    (origin + Duration::days(offset.round() as i64))
        .format("%Y-%m-%d")
        .to_string()
}

/// Axis bounds with some headroom; a single value still gets a visible range.
fn padded_range<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold(None, |acc: Option<(f64, f64)>, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;
    let pad = ((hi - lo) * 0.05).max(1.0);
    Some((lo - pad, hi + pad))
}

fn line_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    origin: NaiveDate,
    lines: &[(&str, &[(f64, f64)], RGBColor)],
) -> Result<()> {
    let all = || lines.iter().flat_map(|(_, points, _)| points.iter());
    let (Some(x_range), Some(y_range)) = (
        padded_range(all().map(|(x, _)| x)),
        padded_range(all().map(|(_, y)| y)),
    ) else {
        area.titled(&format!("{title}: no data"), title_style())?;
        return Ok(());
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, title_style())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

    chart
        .configure_mesh()
        .x_labels(5)
        .x_label_formatter(&|x| date_label(origin, *x))
        .draw()?;

    for &(label, points, color) in lines {
        if points.is_empty() {
            continue;
        }
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn scatter_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let (Some(x_range), Some(y_range)) = (
        padded_range(points.iter().map(|(x, _)| x)),
        padded_range(points.iter().map(|(_, y)| y)),
    ) else {
        area.titled(&format!("{title}: no data"), title_style())?;
        return Ok(());
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, title_style())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

    chart
        .configure_mesh()
        .x_desc("Sleep duration (hours)")
        .y_desc("Resting heart rate (bpm)")
        .draw()?;
    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 4, CYAN.filled())),
    )?;
    Ok(())
}
