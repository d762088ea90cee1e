use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Result, TrackerError, ValidationError};
use crate::models::{MeasurementRecord, Trend, normalize_notes};
use crate::validation::{DATE_FORMAT, parse_date, parse_non_negative_float, parse_non_negative_int};

pub const EXPORT_FILE: &str = "weight_data_export.csv";
pub const IMPORT_FILE: &str = "weight_data_import.csv";
pub const BACKUP_FILE: &str = "weight_data_backup.csv";

#[derive(Debug, Serialize)]
struct CsvOutRow<'a> {
    date: String,
    weight: Option<f64>,
    notes: Option<&'a str>,
    trend: Option<&'static str>,
    #[serde(rename = "sleepDuration")]
    sleep_duration: Option<f64>,
    #[serde(rename = "restingHeartRate")]
    resting_heart_rate: Option<u32>,
}

impl<'a> From<&'a MeasurementRecord> for CsvOutRow<'a> {
    fn from(record: &'a MeasurementRecord) -> Self {
        Self {
            date: record.date.format(DATE_FORMAT).to_string(),
            weight: record.weight,
            notes: record.notes.as_deref(),
            trend: record.trend.map(Trend::as_str),
            sleep_duration: record.sleep_duration,
            resting_heart_rate: record.resting_heart_rate,
        }
    }
}

/// A row as read from disk, before validation. Headers are lowercased before
/// matching, so the names here are lowercase; the aliases are the legacy
/// `WeightTrend`, `SleepDrtn` and `RestingHr` columns.
#[derive(Debug, Deserialize)]
struct CsvInRow {
    date: String,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default, alias = "weighttrend")]
    trend: Option<String>,
    #[serde(default, rename = "sleepduration", alias = "sleepdrtn")]
    sleep_duration: Option<String>,
    #[serde(default, rename = "restingheartrate", alias = "restinghr")]
    resting_heart_rate: Option<String>,
}

impl CsvInRow {
    fn into_record(self) -> Result<MeasurementRecord, ValidationError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Ok(MeasurementRecord {
            date: parse_date(&self.date)?,
            weight: present(self.weight)
                .map(|w| parse_non_negative_float(&w, "Weight"))
                .transpose()?,
            notes: normalize_notes(self.notes),
            trend: present(self.trend).map(|t| t.parse::<Trend>()).transpose()?,
            sleep_duration: present(self.sleep_duration)
                .map(|s| parse_non_negative_float(&s, "Sleep duration"))
                .transpose()?,
            resting_heart_rate: present(self.resting_heart_rate)
                .map(|hr| parse_heart_rate(&hr))
                .transpose()?,
        })
    }
}

/// Integer heart rate, also accepting whole-valued floats such as `58.0`
/// written by tools that store nullable integer columns as floats.
#[allow(clippy::cast_sign_loss)]
fn parse_heart_rate(text: &str) -> Result<u32, ValidationError> {
    const FIELD: &str = "Resting heart rate";
    parse_non_negative_int(text, FIELD).or_else(|err| {
        let value = parse_non_negative_float(text, FIELD)?;
        if value.fract() == 0.0 && value <= f64::from(u32::MAX) {
            Ok(value as u32)
        } else {
            Err(err)
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line number in the file, header included.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub records: Vec<MeasurementRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Write every record, ascending by date. Returns the number of rows written.
pub fn export_csv<W: Write>(db: &Database, writer: W) -> Result<usize> {
    let records = db.fetch_all_ordered()?;
    let mut wtr = csv::Writer::from_writer(writer);
    for record in &records {
        wtr.serialize(CsvOutRow::from(record))?;
    }
    if records.is_empty() {
        wtr.write_record([
            "date",
            "weight",
            "notes",
            "trend",
            "sleepDuration",
            "restingHeartRate",
        ])?;
    }
    wtr.flush()?;
    Ok(records.len())
}

pub fn export_to_path(db: &Database, path: &Path) -> Result<usize> {
    let file = File::create(path)?;
    let written = export_csv(db, file)?;
    info!(rows = written, path = %path.display(), "exported measurements");
    Ok(written)
}

/// Parse a CSV into records, collecting rows that fail validation instead of
/// stopping at the first one.
///
/// Columns are matched by name, ignoring case. Besides the export header,
/// the legacy `Date,Weight,Notes,WeightTrend,SleepDrtn,RestingHr` is
/// accepted. Field values are not trimmed so notes keep their spacing.
pub fn parse_csv<R: Read>(reader: R) -> Result<ParsedCsv> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();
    rdr.set_headers(headers.clone());
    if !headers.iter().any(|h| h == "date") {
        return Err(ValidationError::MissingColumn {
            column: "date".to_string(),
        }
        .into());
    }

    let mut parsed = ParsedCsv::default();
    for (idx, result) in rdr.deserialize::<CsvInRow>().enumerate() {
        let line = idx as u64 + 2;
        let outcome = result
            .map_err(|e| e.to_string())
            .and_then(|row| row.into_record().map_err(|e| e.to_string()));
        match outcome {
            Ok(record) => parsed.records.push(record),
            Err(reason) => parsed.rejected.push(RejectedRow { line, reason }),
        }
    }
    Ok(parsed)
}

/// Append records, skipping any row the store refuses. Never aborts part way.
pub fn import_records(db: &Database, parsed: &ParsedCsv) -> ImportSummary {
    for rejected in &parsed.rejected {
        warn!(line = rejected.line, reason = %rejected.reason, "skipping import row");
    }

    let mut inserted = 0;
    let mut refused = 0;
    for record in &parsed.records {
        match db.insert_measurement(record) {
            Ok(()) => inserted += 1,
            Err(e) => {
                warn!(date = %record.date, error = %e, "skipping import row");
                refused += 1;
            }
        }
    }

    let summary = ImportSummary {
        rows_read: parsed.records.len() + parsed.rejected.len(),
        inserted,
        skipped: refused + parsed.rejected.len(),
    };
    info!(
        rows = summary.rows_read,
        inserted = summary.inserted,
        skipped = summary.skipped,
        "imported measurements"
    );
    summary
}

pub fn import_from_path(db: &Database, path: &Path) -> Result<ImportSummary> {
    let parsed = parse_csv(File::open(path)?)?;
    Ok(import_records(db, &parsed))
}

/// Replace the whole table with the contents of a backup.
///
/// The file is validated in full first; a bad row leaves the table untouched.
pub fn restore_records<R: Read>(db: &Database, reader: R) -> Result<usize> {
    let parsed = parse_csv(reader)?;
    if let Some(rejected) = parsed.rejected.into_iter().next() {
        return Err(TrackerError::InvalidRow {
            line: rejected.line,
            reason: rejected.reason,
        });
    }
    let restored = db.replace_all(&parsed.records)?;
    info!(rows = restored, "restored measurements");
    Ok(restored)
}

pub fn restore_from_path(db: &Database, path: &Path) -> Result<usize> {
    restore_records(db, File::open(path)?)
}
