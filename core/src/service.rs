use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{MeasurementRecord, NewMeasurement, UpdateMeasurement};
use crate::projection::{Projection, project_weight};
use crate::stats::{WeightStatistics, compute_statistics};
use crate::transfer::{self, ImportSummary};
use crate::trend::compute_trend;

/// Owns the database connection for the life of the process and exposes
/// each user-facing operation as one call.
pub struct TrackerService {
    db: Database,
}

impl TrackerService {
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Entries ---

    /// Record a new day. The trend compares against the newest weight already
    /// on file, whatever its date.
    pub fn add_entry(&self, entry: NewMeasurement) -> Result<MeasurementRecord> {
        if self.db.get_measurement(entry.date)?.is_some() {
            return Err(TrackerError::DuplicateKey { date: entry.date });
        }
        let prior = self.db.latest_recorded_weight()?;
        let trend = compute_trend(entry.weight, prior);
        let record = MeasurementRecord::from_new(entry, trend);
        self.db.insert_measurement(&record)?;
        info!(date = %record.date, %trend, "added entry");
        Ok(record)
    }

    /// Refresh the given fields of an existing day and recompute its trend.
    ///
    /// The trend uses the weight the row will hold after the update, compared
    /// with the newest weight on file before the update (which may be this
    /// row's own previous weight).
    pub fn update_entry(
        &self,
        date: NaiveDate,
        update: UpdateMeasurement,
    ) -> Result<MeasurementRecord> {
        let existing = self
            .db
            .get_measurement(date)?
            .ok_or(TrackerError::NotFound { date })?;

        let weight = update.weight.or(existing.weight);
        let prior = self.db.latest_recorded_weight()?;
        let trend = compute_trend(weight, prior);

        let record = self.db.update_measurement(
            date,
            &UpdateMeasurement {
                trend: Some(trend),
                ..update
            },
        )?;
        info!(%date, %trend, "updated entry");
        Ok(record)
    }

    pub fn get_entry(&self, date: NaiveDate) -> Result<Option<MeasurementRecord>> {
        self.db.get_measurement(date)
    }

    pub fn list_entries(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<MeasurementRecord>> {
        self.db.fetch_range(from, to)
    }

    // --- Reports ---

    /// `Ok(None)` when no weight has been recorded.
    pub fn statistics(&self) -> Result<Option<WeightStatistics>> {
        let records = self.db.fetch_all_ordered()?;
        Ok(compute_statistics(&records))
    }

    /// `Ok(None)` when fewer than two weights have been recorded.
    pub fn projection(&self, horizon_days: u32) -> Result<Option<Projection>> {
        let records = self.db.fetch_all_ordered()?;
        Ok(project_weight(&records, horizon_days))
    }

    // --- Transfer ---

    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        transfer::export_to_path(&self.db, path)
    }

    pub fn import_csv(&self, path: &Path) -> Result<ImportSummary> {
        transfer::import_from_path(&self.db, path)
    }

    pub fn restore_backup(&self, path: &Path) -> Result<usize> {
        transfer::restore_from_path(&self.db, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trend;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(date: NaiveDate, weight: Option<f64>) -> NewMeasurement {
        NewMeasurement {
            date,
            weight,
            notes: None,
            sleep_duration: None,
            resting_heart_rate: None,
        }
    }

    #[test]
    fn test_first_entry_has_no_trend() {
        let svc = TrackerService::new_in_memory().unwrap();
        let record = svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        assert_eq!(record.trend, Some(Trend::NoTrend));
    }

    #[test]
    fn test_trend_follows_direction_in_date_order() {
        for (second, expected) in [
            (151.0, Trend::Increasing),
            (149.0, Trend::Decreasing),
            (150.0, Trend::Stable),
        ] {
            let svc = TrackerService::new_in_memory().unwrap();
            svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
            let record = svc.add_entry(entry(day(2024, 1, 2), Some(second))).unwrap();
            assert_eq!(record.trend, Some(expected));
        }
    }

    #[test]
    fn test_null_weight_always_no_weight_provided() {
        let svc = TrackerService::new_in_memory().unwrap();
        let first = svc.add_entry(entry(day(2024, 1, 1), None)).unwrap();
        assert_eq!(first.trend, Some(Trend::NoWeightProvided));

        svc.add_entry(entry(day(2024, 1, 2), Some(150.0))).unwrap();
        let third = svc.add_entry(entry(day(2024, 1, 3), None)).unwrap();
        assert_eq!(third.trend, Some(Trend::NoWeightProvided));
    }

    #[test]
    fn test_trend_skips_unweighed_days() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 2), None)).unwrap();
        let record = svc.add_entry(entry(day(2024, 1, 3), Some(149.0))).unwrap();
        assert_eq!(record.trend, Some(Trend::Decreasing));
    }

    #[test]
    fn test_backdated_entry_compares_with_latest_weight() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 10), Some(160.0))).unwrap();

        // 155 is above the Jan 1 weight but below the newest one on file.
        let backdated = svc.add_entry(entry(day(2024, 1, 5), Some(155.0))).unwrap();
        assert_eq!(backdated.trend, Some(Trend::Decreasing));
    }

    #[test]
    fn test_trend_is_not_recomputed_retroactively() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 2), Some(151.0))).unwrap();
        svc.update_entry(
            day(2024, 1, 1),
            UpdateMeasurement {
                weight: Some(200.0),
                ..UpdateMeasurement::default()
            },
        )
        .unwrap();

        let second = svc.get_entry(day(2024, 1, 2)).unwrap().unwrap();
        assert_eq!(second.trend, Some(Trend::Increasing));
    }

    #[test]
    fn test_add_duplicate_date() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        let err = svc.add_entry(entry(day(2024, 1, 1), Some(149.0))).unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateKey { .. }));
    }

    #[test]
    fn test_update_missing_date() {
        let svc = TrackerService::new_in_memory().unwrap();
        let err = svc
            .update_entry(day(2024, 1, 1), UpdateMeasurement::default())
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }

    #[test]
    fn test_update_compares_against_state_before_write() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 2), Some(152.0))).unwrap();

        // The row being updated is the latest weight on file, so the new
        // value is compared with its own old value.
        let updated = svc
            .update_entry(
                day(2024, 1, 2),
                UpdateMeasurement {
                    weight: Some(151.0),
                    ..UpdateMeasurement::default()
                },
            )
            .unwrap();
        assert_eq!(updated.trend, Some(Trend::Decreasing));
        assert!((updated.weight.unwrap() - 151.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_without_weight_keeps_weight_and_refreshes_trend() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();

        let updated = svc
            .update_entry(
                day(2024, 1, 1),
                UpdateMeasurement {
                    resting_heart_rate: Some(57),
                    ..UpdateMeasurement::default()
                },
            )
            .unwrap();
        assert!((updated.weight.unwrap() - 150.0).abs() < f64::EPSILON);
        assert_eq!(updated.resting_heart_rate, Some(57));
        assert_eq!(updated.trend, Some(Trend::Stable));
    }

    #[test]
    fn test_update_unweighed_row_keeps_no_weight_provided() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 2), None)).unwrap();
        let updated = svc
            .update_entry(
                day(2024, 1, 2),
                UpdateMeasurement {
                    notes: Some("forgot the scale".to_string()),
                    ..UpdateMeasurement::default()
                },
            )
            .unwrap();
        assert_eq!(updated.trend, Some(Trend::NoWeightProvided));
        assert_eq!(updated.notes.as_deref(), Some("forgot the scale"));
    }

    #[test]
    fn test_reports_on_empty_log() {
        let svc = TrackerService::new_in_memory().unwrap();
        assert!(svc.statistics().unwrap().is_none());
        assert!(svc.projection(30).unwrap().is_none());
    }

    #[test]
    fn test_reports_from_stored_entries() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 2), Some(151.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 3), Some(152.0))).unwrap();

        let stats = svc.statistics().unwrap().unwrap();
        assert_eq!(stats.total_entries, 3);

        let projection = svc.projection(30).unwrap().unwrap();
        assert!((projection.forecast_weights[29] - 182.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_restore_roundtrip_through_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.csv");

        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        svc.add_entry(entry(day(2024, 1, 2), None)).unwrap();
        svc.add_entry(entry(day(2024, 1, 3), Some(149.5))).unwrap();
        let before = svc.list_entries(None, None).unwrap();
        assert_eq!(svc.export_csv(&path).unwrap(), 3);

        svc.add_entry(entry(day(2024, 1, 4), Some(149.0))).unwrap();
        assert_eq!(svc.restore_backup(&path).unwrap(), 3);
        assert_eq!(svc.list_entries(None, None).unwrap(), before);
    }

    #[test]
    fn test_import_appends_and_skips_existing_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.csv");
        std::fs::write(
            &path,
            "date,weight,notes,trend,sleepDuration,restingHeartRate\n\
             2024-01-01,140,,stable,,\n\
             2024-01-09,148,,decreasing,,\n",
        )
        .unwrap();

        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(entry(day(2024, 1, 1), Some(150.0))).unwrap();
        let summary = svc.import_csv(&path).unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(svc.list_entries(None, None).unwrap().len(), 2);
    }
}
