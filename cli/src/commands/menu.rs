use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;

use vitals_core::ValidationError;
use vitals_core::models::{NewMeasurement, UpdateMeasurement};
use vitals_core::projection::DEFAULT_HORIZON_DAYS;
use vitals_core::service::TrackerService;
use vitals_core::transfer::{BACKUP_FILE, EXPORT_FILE, IMPORT_FILE};
use vitals_core::validation::{parse_date, parse_non_negative_float, parse_non_negative_int};

use super::helpers::{
    describe_record, render_projection, render_records_table, render_statistics, weight_display,
};

const MENU: &str = "
--- Vitals Menu ---
1. Add entry
2. Visualize data
3. View log
4. Calculate statistics
5. Update entry
6. Predict future weight
7. Restore data
8. Export data
9. Import data
10. Exit";

/// Files the transfer and chart actions read and write.
#[derive(Debug, Clone)]
pub(crate) struct MenuPaths {
    pub export: PathBuf,
    pub import: PathBuf,
    pub backup: PathBuf,
    #[cfg_attr(not(feature = "charts"), allow(dead_code))]
    pub chart: PathBuf,
}

impl Default for MenuPaths {
    fn default() -> Self {
        Self {
            export: PathBuf::from(EXPORT_FILE),
            import: PathBuf::from(IMPORT_FILE),
            backup: PathBuf::from(BACKUP_FILE),
            chart: PathBuf::from(super::DEFAULT_CHART_FILE),
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

/// The numbered interactive loop. Validation errors re-prompt; operation
/// errors are reported and control returns to the menu.
pub(crate) struct Menu<'a, R, W> {
    svc: &'a TrackerService,
    input: R,
    out: W,
    paths: MenuPaths,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub(crate) fn new(svc: &'a TrackerService, input: R, out: W, paths: MenuPaths) -> Self {
        Self {
            svc,
            input,
            out,
            paths,
        }
    }

    pub(crate) fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.out, "{MENU}")?;
            let Some(choice) = self.prompt("Choose an option (1-10): ")? else {
                break;
            };
            let flow = match choice.as_str() {
                "1" => self.add_entry()?,
                "2" => self.visualize()?,
                "3" => self.view_log()?,
                "4" => self.statistics()?,
                "5" => self.update_entry()?,
                "6" => self.predict()?,
                "7" => self.restore()?,
                "8" => self.export()?,
                "9" => self.import()?,
                "10" => Flow::Exit,
                _ => {
                    writeln!(
                        self.out,
                        "Invalid option. Please choose a number between 1 and 10."
                    )?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                break;
            }
        }
        writeln!(self.out, "Exiting the app.")?;
        Ok(())
    }

    // --- Prompting ---

    /// `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Re-prompt until `parse` accepts the input. Blank input is `Some(None)`
    /// when `optional`, and end of input is `None`.
    fn prompt_parsed<T>(
        &mut self,
        label: &str,
        optional: bool,
        parse: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Result<Option<Option<T>>> {
        loop {
            let Some(text) = self.prompt(label)? else {
                return Ok(None);
            };
            if text.is_empty() && optional {
                return Ok(Some(None));
            }
            match parse(&text) {
                Ok(value) => return Ok(Some(Some(value))),
                Err(e) => writeln!(self.out, "{e} Please re-enter.")?,
            }
        }
    }

    fn prompt_date(&mut self, label: &str) -> Result<Option<NaiveDate>> {
        Ok(self.prompt_parsed(label, false, parse_date)?.flatten())
    }

    fn prompt_float(&mut self, label: &str, field: &str) -> Result<Option<Option<f64>>> {
        self.prompt_parsed(label, true, |s| parse_non_negative_float(s, field))
    }

    fn prompt_int(&mut self, label: &str, field: &str) -> Result<Option<Option<u32>>> {
        self.prompt_parsed(label, true, |s| parse_non_negative_int(s, field))
    }

    // --- Actions ---

    fn add_entry(&mut self) -> Result<Flow> {
        let Some(date) = self.prompt_date("Enter the date (YYYY-MM-DD): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(weight) = self.prompt_float(
            "Enter your weight in pounds (or leave blank if unknown): ",
            "Weight",
        )?
        else {
            return Ok(Flow::Exit);
        };
        let Some(notes) = self.prompt("Notes (optional): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(sleep_duration) =
            self.prompt_float("Sleep duration (hours, optional): ", "Sleep duration")?
        else {
            return Ok(Flow::Exit);
        };
        let Some(resting_heart_rate) =
            self.prompt_int("Resting heart rate (optional): ", "Resting heart rate")?
        else {
            return Ok(Flow::Exit);
        };

        let entry = NewMeasurement {
            date,
            weight,
            notes: Some(notes),
            sleep_duration,
            resting_heart_rate,
        };
        match self.svc.add_entry(entry) {
            Ok(record) => writeln!(
                self.out,
                "Entry added successfully! Trend: {}",
                record.trend.map_or("-", |t| t.as_str())
            )?,
            Err(e) => writeln!(self.out, "Error adding entry: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn update_entry(&mut self) -> Result<Flow> {
        let Some(date) = self.prompt_date("Enter the date of the entry to update (YYYY-MM-DD): ")?
        else {
            return Ok(Flow::Exit);
        };

        let existing = match self.svc.get_entry(date) {
            Ok(Some(record)) => record,
            Ok(None) => {
                writeln!(self.out, "No entry found for the date {date}.")?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                writeln!(self.out, "Error reading entry: {e}")?;
                return Ok(Flow::Continue);
            }
        };
        writeln!(self.out, "Current entry for {date}:")?;
        writeln!(self.out, "{}", describe_record(&existing))?;

        let weight_label = format!(
            "Enter new weight in pounds (current: {}) or leave blank to keep: ",
            weight_display(existing.weight)
        );
        let Some(weight) = self.prompt_float(&weight_label, "Weight")? else {
            return Ok(Flow::Exit);
        };
        let notes_label = format!(
            "Enter new notes (current: {}) or leave blank to keep: ",
            existing.notes.as_deref().unwrap_or("-")
        );
        let Some(notes) = self.prompt(&notes_label)? else {
            return Ok(Flow::Exit);
        };
        let sleep_label = format!(
            "Enter new sleep duration (current: {}) or leave blank to keep: ",
            existing
                .sleep_duration
                .map_or("-".to_string(), |s| format!("{s} hours"))
        );
        let Some(sleep_duration) = self.prompt_float(&sleep_label, "Sleep duration")? else {
            return Ok(Flow::Exit);
        };
        let hr_label = format!(
            "Enter new resting heart rate (current: {}) or leave blank to keep: ",
            existing
                .resting_heart_rate
                .map_or("-".to_string(), |hr| format!("{hr} bpm"))
        );
        let Some(resting_heart_rate) = self.prompt_int(&hr_label, "Resting heart rate")? else {
            return Ok(Flow::Exit);
        };

        let update = UpdateMeasurement {
            weight,
            notes: Some(notes),
            trend: None,
            sleep_duration,
            resting_heart_rate,
        };
        match self.svc.update_entry(date, update) {
            Ok(_) => writeln!(self.out, "Entry for {date} updated successfully!")?,
            Err(e) => writeln!(self.out, "Error updating entry: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn view_log(&mut self) -> Result<Flow> {
        match self.svc.list_entries(None, None) {
            Ok(records) if records.is_empty() => writeln!(self.out, "No entries found.")?,
            Ok(records) => writeln!(self.out, "{}", render_records_table(&records))?,
            Err(e) => writeln!(self.out, "Error reading entries: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn statistics(&mut self) -> Result<Flow> {
        match self.svc.statistics() {
            Ok(Some(stats)) => writeln!(self.out, "{}", render_statistics(&stats))?,
            Ok(None) => writeln!(self.out, "No weight data available for statistics.")?,
            Err(e) => writeln!(self.out, "Error computing statistics: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn predict(&mut self) -> Result<Flow> {
        match self.svc.projection(DEFAULT_HORIZON_DAYS) {
            Ok(Some(projection)) => writeln!(self.out, "{}", render_projection(&projection))?,
            Ok(None) => writeln!(self.out, "Not enough data for predictions.")?,
            Err(e) => writeln!(self.out, "Error computing projection: {e}")?,
        }
        Ok(Flow::Continue)
    }

    #[cfg(feature = "charts")]
    fn visualize(&mut self) -> Result<Flow> {
        match super::chart::render_chart(self.svc, &self.paths.chart, DEFAULT_HORIZON_DAYS) {
            Ok(true) => writeln!(self.out, "Chart written to {}", self.paths.chart.display())?,
            Ok(false) => writeln!(self.out, "No data to visualize.")?,
            Err(e) => writeln!(self.out, "Error drawing chart: {e:#}")?,
        }
        Ok(Flow::Continue)
    }

    #[cfg(not(feature = "charts"))]
    fn visualize(&mut self) -> Result<Flow> {
        writeln!(
            self.out,
            "Charts are not available in this build. Rebuild with `--features charts`."
        )?;
        Ok(Flow::Continue)
    }

    fn restore(&mut self) -> Result<Flow> {
        let path = self.paths.backup.clone();
        if !path.exists() {
            writeln!(self.out, "No backup file found: {}", path.display())?;
            return Ok(Flow::Continue);
        }
        match self.svc.restore_backup(&path) {
            Ok(n) => writeln!(self.out, "Data restored successfully! ({n} rows)")?,
            Err(e) => writeln!(self.out, "Error restoring data: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn export(&mut self) -> Result<Flow> {
        let path = self.paths.export.clone();
        match self.svc.export_csv(&path) {
            Ok(_) => writeln!(self.out, "Data exported to {}", path.display())?,
            Err(e) => writeln!(self.out, "Error exporting data: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn import(&mut self) -> Result<Flow> {
        let path = self.paths.import.clone();
        if !path.exists() {
            writeln!(self.out, "No import file found: {}", path.display())?;
            return Ok(Flow::Continue);
        }
        match self.svc.import_csv(&path) {
            Ok(summary) => writeln!(
                self.out,
                "Data imported successfully! ({} inserted, {} skipped)",
                summary.inserted, summary.skipped
            )?,
            Err(e) => writeln!(self.out, "Error importing data: {e}")?,
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use vitals_core::models::Trend;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_with(svc: &TrackerService, input: &str, paths: MenuPaths) -> String {
        let mut out = Vec::new();
        Menu::new(svc, Cursor::new(input.as_bytes()), &mut out, paths)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn temp_paths(dir: &tempfile::TempDir) -> MenuPaths {
        MenuPaths {
            export: dir.path().join(EXPORT_FILE),
            import: dir.path().join(IMPORT_FILE),
            backup: dir.path().join(BACKUP_FILE),
            chart: dir.path().join("chart.svg"),
        }
    }

    #[test]
    fn test_add_then_view() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(
            &svc,
            "1\n2024-01-01\n150\nfirst day\n7.5\n58\n3\n10\n",
            MenuPaths::default(),
        );

        assert!(out.contains("Entry added successfully! Trend: no trend"));
        assert!(out.contains("2024-01-01"));
        assert!(out.contains("Exiting the app."));

        let stored = svc.get_entry(day(2024, 1, 1)).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("first day"));
        assert_eq!(stored.resting_heart_rate, Some(58));
    }

    #[test]
    fn test_invalid_input_is_reprompted() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(
            &svc,
            "1\n01/01/2024\n2024-01-01\n-5\nabc\n150\n\n\n\n10\n",
            MenuPaths::default(),
        );

        assert!(out.contains("Please enter in YYYY-MM-DD"));
        assert!(out.contains("Weight cannot be negative."));
        assert!(out.contains("Invalid Weight 'abc'"));
        let stored = svc.get_entry(day(2024, 1, 1)).unwrap().unwrap();
        assert!((stored.weight.unwrap() - 150.0).abs() < f64::EPSILON);
        assert!(stored.notes.is_none());
        assert!(stored.sleep_duration.is_none());
    }

    #[test]
    fn test_duplicate_add_reports_and_continues() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(
            &svc,
            "1\n2024-01-01\n150\n\n\n\n1\n2024-01-01\n149\n\n\n\n4\n10\n",
            MenuPaths::default(),
        );
        assert!(out.contains("Error adding entry: An entry for 2024-01-01 already exists"));
        assert!(out.contains("Average Weight: 150.00 lbs"));
    }

    #[test]
    fn test_update_blank_keeps_values() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(NewMeasurement {
            date: day(2024, 1, 1),
            weight: Some(150.0),
            notes: Some("keep me".to_string()),
            sleep_duration: Some(8.0),
            resting_heart_rate: Some(60),
        })
        .unwrap();

        let out = run_with(&svc, "5\n2024-01-01\n\n\n6.5\n\n10\n", MenuPaths::default());
        assert!(out.contains("Current entry for 2024-01-01:"));
        assert!(out.contains("updated successfully"));

        let stored = svc.get_entry(day(2024, 1, 1)).unwrap().unwrap();
        assert!((stored.weight.unwrap() - 150.0).abs() < f64::EPSILON);
        assert_eq!(stored.notes.as_deref(), Some("keep me"));
        assert!((stored.sleep_duration.unwrap() - 6.5).abs() < f64::EPSILON);
        assert_eq!(stored.resting_heart_rate, Some(60));
        assert_eq!(stored.trend, Some(Trend::Stable));
    }

    #[test]
    fn test_update_missing_entry() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(&svc, "5\n2024-03-03\n10\n", MenuPaths::default());
        assert!(out.contains("No entry found for the date 2024-03-03."));
    }

    #[test]
    fn test_reports_without_data() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(&svc, "3\n4\n6\n10\n", MenuPaths::default());
        assert!(out.contains("No entries found."));
        assert!(out.contains("No weight data available for statistics."));
        assert!(out.contains("Not enough data for predictions."));
    }

    #[test]
    fn test_invalid_option() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(&svc, "42\n10\n", MenuPaths::default());
        assert!(out.contains("Invalid option. Please choose a number between 1 and 10."));
    }

    #[test]
    fn test_end_of_input_exits_cleanly() {
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(&svc, "1\n2024-01-01\n", MenuPaths::default());
        assert!(out.contains("Exiting the app."));
        assert!(svc.get_entry(day(2024, 1, 1)).unwrap().is_none());
    }

    #[test]
    fn test_export_then_restore_via_menu() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(&dir);
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_entry(NewMeasurement {
            date: day(2024, 1, 1),
            weight: Some(150.0),
            notes: None,
            sleep_duration: None,
            resting_heart_rate: None,
        })
        .unwrap();

        let out = run_with(&svc, "8\n10\n", paths.clone());
        assert!(out.contains("Data exported to"));

        std::fs::copy(&paths.export, &paths.backup).unwrap();
        svc.add_entry(NewMeasurement {
            date: day(2024, 1, 2),
            weight: Some(149.0),
            notes: None,
            sleep_duration: None,
            resting_heart_rate: None,
        })
        .unwrap();

        let out = run_with(&svc, "7\n10\n", paths);
        assert!(out.contains("Data restored successfully! (1 rows)"));
        assert_eq!(svc.list_entries(None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_transfer_files() {
        let dir = tempfile::tempdir().unwrap();
        let svc = TrackerService::new_in_memory().unwrap();
        let out = run_with(&svc, "7\n9\n10\n", temp_paths(&dir));
        assert!(out.contains("No backup file found"));
        assert!(out.contains("No import file found"));
    }
}
