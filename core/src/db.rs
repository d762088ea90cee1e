use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::models::{MeasurementRecord, UpdateMeasurement, normalize_notes};
use crate::validation::DATE_FORMAT;

const SELECT_COLUMNS: &str =
    "SELECT date, weight, notes, trend, sleep_duration, resting_heart_rate FROM measurements";

/// The single measurements table and the one connection that owns it.
///
/// The connection is closed when the `Database` is dropped.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened database");
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS measurements (
                    date TEXT NOT NULL PRIMARY KEY,
                    weight REAL,
                    notes TEXT,
                    trend TEXT,
                    sleep_duration REAL,
                    resting_heart_rate INTEGER
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // Expects columns:
    // 0: date, 1: weight, 2: notes, 3: trend, 4: sleep_duration, 5: resting_heart_rate
    fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<MeasurementRecord> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        Ok(MeasurementRecord {
            date,
            weight: row.get(1)?,
            notes: row.get(2)?,
            trend: row.get(3)?,
            sleep_duration: row.get(4)?,
            resting_heart_rate: row.get(5)?,
        })
    }

    // --- Writes ---

    /// Insert a new row. Fails with `DuplicateKey` if the date is taken.
    pub fn insert_measurement(&self, record: &MeasurementRecord) -> Result<()> {
        let date_str = record.date.format(DATE_FORMAT).to_string();
        let inserted = self.conn.execute(
            "INSERT INTO measurements (date, weight, notes, trend, sleep_duration, resting_heart_rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                date_str,
                record.weight,
                normalize_notes(record.notes.clone()),
                record.trend,
                record.sleep_duration,
                record.resting_heart_rate,
            ],
        );

        match inserted {
            Ok(_) => {
                debug!(date = %record.date, trend = ?record.trend, "inserted measurement");
                Ok(())
            }
            // The primary key is the table's only constraint.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(TrackerError::DuplicateKey { date: record.date })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a partial update; fields left as `None` keep their stored value.
    pub fn update_measurement(
        &self,
        date: NaiveDate,
        update: &UpdateMeasurement,
    ) -> Result<MeasurementRecord> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let rows = self.conn.execute(
            "UPDATE measurements SET
                weight = COALESCE(?2, weight),
                notes = COALESCE(?3, notes),
                trend = COALESCE(?4, trend),
                sleep_duration = COALESCE(?5, sleep_duration),
                resting_heart_rate = COALESCE(?6, resting_heart_rate)
             WHERE date = ?1",
            params![
                date_str,
                update.weight,
                normalize_notes(update.notes.clone()),
                update.trend,
                update.sleep_duration,
                update.resting_heart_rate,
            ],
        )?;
        if rows == 0 {
            return Err(TrackerError::NotFound { date });
        }
        debug!(%date, "updated measurement");

        self.get_measurement(date)?
            .ok_or(TrackerError::NotFound { date })
    }

    /// Delete every row. Returns the number removed.
    pub fn clear_all(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM measurements", [])?;
        debug!(removed, "cleared measurements");
        Ok(removed)
    }

    /// Replace the whole table with `records` atomically.
    ///
    /// Either every record is stored or the table is left as it was.
    pub fn replace_all(&self, records: &[MeasurementRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        self.clear_all()?;
        for record in records {
            self.insert_measurement(record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    // --- Reads ---

    pub fn get_measurement(&self, date: NaiveDate) -> Result<Option<MeasurementRecord>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let record = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE date = ?1"),
                params![date_str],
                Self::record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Weight of the latest dated row that has one, in committed state.
    pub fn latest_recorded_weight(&self) -> Result<Option<f64>> {
        let weight = self
            .conn
            .query_row(
                "SELECT weight FROM measurements WHERE weight IS NOT NULL
                 ORDER BY date DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(weight)
    }

    /// Every row, ascending by date.
    pub fn fetch_all_ordered(&self) -> Result<Vec<MeasurementRecord>> {
        self.fetch_range(None, None)
    }

    /// Rows with `from <= date <= to`, ascending by date. Open bounds are `None`.
    pub fn fetch_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<MeasurementRecord>> {
        let from = from.map(|d| d.format(DATE_FORMAT).to_string());
        let to = to.map(|d| d.format(DATE_FORMAT).to_string());
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
             ORDER BY date ASC"
        ))?;
        let records = stmt
            .query_map(params![from, to], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}
