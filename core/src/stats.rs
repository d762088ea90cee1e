use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::MeasurementRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightStatistics {
    pub average_weight: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    pub total_entries: usize,
    pub total_weight_change: f64,
    /// Days between the first and last weigh-in, never less than 1.
    pub total_days: i64,
    pub average_daily_change: f64,
    /// `None` when no weighed record carries a heart rate.
    pub resting_heart_rate: Option<HeartRateSummary>,
    pub monthly_changes: Vec<MonthlyChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateSummary {
    pub average: f64,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyChange {
    pub year: i32,
    pub month: u32,
    /// e.g. "January 2024"
    pub label: String,
    pub change: f64,
}

/// Weighed records only, ascending by date.
#[must_use]
pub fn weighed_series(records: &[MeasurementRecord]) -> Vec<(NaiveDate, f64)> {
    let mut series: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.weight.map(|w| (r.date, w)))
        .collect();
    series.sort_by_key(|(date, _)| *date);
    series
}

/// Compute statistics for every record that has a weight.
///
/// Records without a weight are ignored entirely, including for the heart
/// rate summary and the month buckets. Returns `None` when nothing is weighed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_statistics(records: &[MeasurementRecord]) -> Option<WeightStatistics> {
    let mut weighed: Vec<&MeasurementRecord> =
        records.iter().filter(|r| r.weight.is_some()).collect();
    weighed.sort_by_key(|r| r.date);

    let first = *weighed.first()?;
    let last = *weighed.last()?;
    let weights: Vec<f64> = weighed.iter().filter_map(|r| r.weight).collect();
    let first_weight = first.weight?;
    let last_weight = last.weight?;

    let total_entries = weights.len();
    let average_weight = weights.iter().sum::<f64>() / total_entries as f64;
    let min_weight = weights.iter().copied().fold(f64::INFINITY, f64::min);
    let max_weight = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let total_weight_change = last_weight - first_weight;
    let total_days = (last.date - first.date).num_days().max(1);
    let average_daily_change = total_weight_change / total_days as f64;

    let heart_rates: Vec<u32> = weighed
        .iter()
        .filter_map(|r| r.resting_heart_rate)
        .collect();

    Some(WeightStatistics {
        average_weight,
        min_weight,
        max_weight,
        total_entries,
        total_weight_change,
        total_days,
        average_daily_change,
        resting_heart_rate: summarize_heart_rate(&heart_rates),
        monthly_changes: monthly_changes(&weighed),
    })
}

#[allow(clippy::cast_precision_loss)]
fn summarize_heart_rate(rates: &[u32]) -> Option<HeartRateSummary> {
    let min = *rates.iter().min()?;
    let max = *rates.iter().max()?;
    let sum: u64 = rates.iter().map(|&r| u64::from(r)).sum();
    Some(HeartRateSummary {
        average: sum as f64 / rates.len() as f64,
        min,
        max,
    })
}

/// Last minus first weight inside each calendar month, oldest month first.
/// `weighed` must already be sorted by date.
fn monthly_changes(weighed: &[&MeasurementRecord]) -> Vec<MonthlyChange> {
    let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for record in weighed {
        let Some(weight) = record.weight else {
            continue;
        };
        months
            .entry((record.date.year(), record.date.month()))
            .and_modify(|(_, end)| *end = weight)
            .or_insert((weight, weight));
    }

    months
        .into_iter()
        .map(|((year, month), (start, end))| MonthlyChange {
            year,
            month,
            label: month_label(year, month),
            change: end - start,
        })
        .collect()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map_or_else(|| format!("{year}-{month:02}"), |d| d.format("%B %Y").to_string())
}
