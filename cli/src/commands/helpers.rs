use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitals_core::models::MeasurementRecord;
use vitals_core::projection::{MAX_HORIZON_DAYS, Projection};
use vitals_core::stats::WeightStatistics;
use vitals_core::validation::{parse_date, parse_non_negative_float, parse_non_negative_int};

/// Accepts `YYYY-MM-DD` or today/yesterday/tomorrow. `None` means today.
pub(crate) fn parse_date_arg(date_str: Option<&str>) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match date_str.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("yesterday") => Ok(today - chrono::Duration::days(1)),
        Some("tomorrow") => Ok(today + chrono::Duration::days(1)),
        Some(s) => Ok(parse_date(s)?),
    }
}

/// Blank or missing input is "omitted".
pub(crate) fn parse_optional_float(value: Option<&str>, field: &str) -> Result<Option<f64>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(parse_non_negative_float(s, field)?)),
    }
}

pub(crate) fn parse_optional_int(value: Option<&str>, field: &str) -> Result<Option<u32>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(parse_non_negative_int(s, field)?)),
    }
}

pub(crate) fn parse_horizon(days: u32) -> Result<u32> {
    if days == 0 {
        bail!("Projection horizon must be at least 1 day");
    }
    if days > MAX_HORIZON_DAYS {
        bail!("Projection horizon must be at most {MAX_HORIZON_DAYS} days");
    }
    Ok(days)
}

pub(crate) fn weight_display(weight: Option<f64>) -> String {
    weight.map_or_else(|| "No weight".to_string(), |w| format!("{w} lbs"))
}

fn opt<T: std::fmt::Display>(value: Option<T>, suffix: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}{suffix}"))
}

pub(crate) fn describe_record(r: &MeasurementRecord) -> String {
    format!(
        "Date: {}, Weight: {}, Notes: {}, Trend: {}, Sleep Duration: {}, Resting HR: {}",
        r.date.format("%Y-%m-%d"),
        weight_display(r.weight),
        r.notes.as_deref().unwrap_or("-"),
        opt(r.trend, ""),
        opt(r.sleep_duration, " hours"),
        opt(r.resting_heart_rate, " bpm"),
    )
}

pub(crate) fn render_records_table(records: &[MeasurementRecord]) -> String {
    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (lbs)")]
        weight: String,
        #[tabled(rename = "Sleep (h)")]
        sleep: String,
        #[tabled(rename = "Resting HR")]
        rhr: String,
        #[tabled(rename = "Trend")]
        trend: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            weight: r.weight.map_or("-".into(), |w| format!("{w:.1}")),
            sleep: r.sleep_duration.map_or("-".into(), |s| format!("{s:.2}")),
            rhr: opt(r.resting_heart_rate, ""),
            trend: opt(r.trend, ""),
            notes: r
                .notes
                .as_deref()
                .map(|n| truncate(n, 40))
                .unwrap_or_default(),
        })
        .collect();

    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
        .to_string()
}

pub(crate) fn render_statistics(stats: &WeightStatistics) -> String {
    #[derive(Tabled)]
    struct MonthRow {
        #[tabled(rename = "Month")]
        month: String,
        #[tabled(rename = "Change (lbs)")]
        change: String,
    }

    let mut out = String::new();
    out.push_str(&format!("Average Weight: {:.2} lbs\n", stats.average_weight));
    out.push_str(&format!("Minimum Weight: {:.2} lbs\n", stats.min_weight));
    out.push_str(&format!("Maximum Weight: {:.2} lbs\n", stats.max_weight));
    out.push_str(&format!(
        "Total Entries with Weight: {}\n",
        stats.total_entries
    ));
    out.push_str(&format!(
        "Total Weight Change: {:.2} lbs\n",
        no_neg_zero(stats.total_weight_change)
    ));
    out.push_str(&format!(
        "Average Daily Weight Change: {:.4} lbs/day\n",
        no_neg_zero(stats.average_daily_change)
    ));

    match &stats.resting_heart_rate {
        Some(hr) => {
            out.push_str(&format!(
                "Average Resting Heart Rate: {:.2} bpm\n",
                hr.average
            ));
            out.push_str(&format!("Minimum Resting Heart Rate: {} bpm\n", hr.min));
            out.push_str(&format!("Maximum Resting Heart Rate: {} bpm\n", hr.max));
        }
        None => out.push_str("No resting heart rate data available.\n"),
    }

    let rows: Vec<MonthRow> = stats
        .monthly_changes
        .iter()
        .map(|m| MonthRow {
            month: m.label.clone(),
            change: format!("{:+.2}", no_neg_zero(m.change)),
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    out.push_str("\nWeight Change by Month:\n");
    out.push_str(&table);
    out
}

pub(crate) fn render_projection(projection: &Projection) -> String {
    #[derive(Tabled)]
    struct ForecastRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Predicted (lbs)")]
        weight: String,
    }

    let rows: Vec<ForecastRow> = projection
        .forecast_dates
        .iter()
        .zip(&projection.forecast_weights)
        .map(|(d, w)| ForecastRow {
            date: d.format("%Y-%m-%d").to_string(),
            weight: format!("{w:.1}"),
        })
        .collect();

    let slope = no_neg_zero(projection.fit.slope);
    let mut out = format!(
        "Trend line: {slope:+.3} lbs/day over {} weigh-ins\n",
        projection.historical_dates.len()
    );
    out.push_str(
        &Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
            .to_string(),
    );
    out
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::models::Trend;

    fn record() -> MeasurementRecord {
        MeasurementRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            weight: Some(181.4),
            notes: Some("after travel".to_string()),
            trend: Some(Trend::Decreasing),
            sleep_duration: Some(6.5),
            resting_heart_rate: Some(61),
        }
    }

    #[test]
    fn test_parse_date_arg_none_is_today() {
        assert_eq!(parse_date_arg(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_date_arg_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(
            parse_date_arg(Some("yesterday")).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date_arg(Some("tomorrow")).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_arg_iso_and_invalid() {
        assert_eq!(
            parse_date_arg(Some("2024-01-15")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date_arg(Some("15/01/2024")).is_err());
    }

    #[test]
    fn test_parse_optional_values() {
        assert_eq!(parse_optional_float(None, "Weight").unwrap(), None);
        assert_eq!(parse_optional_float(Some("  "), "Weight").unwrap(), None);
        assert_eq!(parse_optional_float(Some("180"), "Weight").unwrap(), Some(180.0));
        assert!(parse_optional_float(Some("-1"), "Weight").is_err());
        assert_eq!(parse_optional_int(Some("60"), "Resting heart rate").unwrap(), Some(60));
        assert!(parse_optional_int(Some("6.5"), "Resting heart rate").is_err());
    }

    #[test]
    fn test_parse_horizon() {
        assert_eq!(parse_horizon(30).unwrap(), 30);
        assert_eq!(parse_horizon(MAX_HORIZON_DAYS).unwrap(), MAX_HORIZON_DAYS);
        assert!(parse_horizon(0).is_err());
        assert!(parse_horizon(MAX_HORIZON_DAYS + 1).is_err());
        assert!(parse_horizon(100_000_000).is_err());
    }

    #[test]
    fn test_describe_record() {
        let line = describe_record(&record());
        assert_eq!(
            line,
            "Date: 2024-01-15, Weight: 181.4 lbs, Notes: after travel, Trend: decreasing, \
             Sleep Duration: 6.5 hours, Resting HR: 61 bpm"
        );
    }

    #[test]
    fn test_describe_record_without_values() {
        let mut r = record();
        r.weight = None;
        r.notes = None;
        r.sleep_duration = None;
        r.resting_heart_rate = None;
        let line = describe_record(&r);
        assert!(line.contains("Weight: No weight"));
        assert!(line.contains("Resting HR: -"));
    }

    #[test]
    fn test_render_records_table_contains_values() {
        let table = render_records_table(&[record()]);
        assert!(table.contains("2024-01-15"));
        assert!(table.contains("181.4"));
        assert!(table.contains("decreasing"));
        assert!(table.contains("Weight (lbs)"));
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), "{\"error\":\"boom\"}");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }
}
