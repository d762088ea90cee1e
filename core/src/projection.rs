use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::MeasurementRecord;
use crate::stats::weighed_series;

pub const DEFAULT_HORIZON_DAYS: u32 = 30;
/// Longest horizon the CLI accepts, about ten years.
pub const MAX_HORIZON_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Closed-form simple linear regression. `None` with fewer than two
    /// points or when every `x` is the same.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub fit: LinearFit,
    pub historical_dates: Vec<NaiveDate>,
    pub historical_weights: Vec<f64>,
    pub forecast_dates: Vec<NaiveDate>,
    pub forecast_weights: Vec<f64>,
}

/// Project weight for `horizon_days` days after the last weigh-in.
///
/// Returns `None` ("insufficient data") with fewer than two weighed records,
/// or when a forecast date would fall outside the supported calendar.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn project_weight(records: &[MeasurementRecord], horizon_days: u32) -> Option<Projection> {
    let series = weighed_series(records);
    let (origin, _) = *series.first()?;

    let offsets: Vec<i64> = series
        .iter()
        .map(|(date, _)| (*date - origin).num_days())
        .collect();
    let points: Vec<(f64, f64)> = offsets
        .iter()
        .zip(&series)
        .map(|(&offset, &(_, weight))| (offset as f64, weight))
        .collect();
    let fit = LinearFit::fit(&points)?;

    let last_offset = *offsets.last()?;
    // Dates past chrono's calendar range end the projection with `None`.
    let forecast: Vec<(NaiveDate, f64)> = (1..=i64::from(horizon_days))
        .map(|step| {
            let offset = last_offset + step;
            let date = origin.checked_add_signed(Duration::days(offset))?;
            Some((date, fit.predict(offset as f64)))
        })
        .collect::<Option<_>>()?;
    let (forecast_dates, forecast_weights) = forecast.into_iter().unzip();

    let (historical_dates, historical_weights) = series.into_iter().unzip();

    Some(Projection {
        fit,
        historical_dates,
        historical_weights,
        forecast_dates,
        forecast_weights,
    })
}
