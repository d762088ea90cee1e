use anyhow::{Result, bail};

use vitals_core::models::{NewMeasurement, UpdateMeasurement};
use vitals_core::service::TrackerService;

use super::helpers::{
    describe_record, json_error, parse_date_arg, parse_optional_float, parse_optional_int,
    render_records_table,
};

/// Raw field values as typed on the command line; blank means omitted.
#[derive(Debug, Default)]
pub(crate) struct EntryFields {
    pub weight: Option<String>,
    pub notes: Option<String>,
    pub sleep: Option<String>,
    pub resting_hr: Option<String>,
}

pub(crate) fn cmd_add(
    svc: &TrackerService,
    date: Option<&str>,
    fields: EntryFields,
    json: bool,
) -> Result<()> {
    let entry = NewMeasurement {
        date: parse_date_arg(date)?,
        weight: parse_optional_float(fields.weight.as_deref(), "Weight")?,
        notes: fields.notes,
        sleep_duration: parse_optional_float(fields.sleep.as_deref(), "Sleep duration")?,
        resting_heart_rate: parse_optional_int(fields.resting_hr.as_deref(), "Resting heart rate")?,
    };

    let record = svc.add_entry(entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Entry for {} added successfully!", record.date.format("%Y-%m-%d"));
        println!("  {}", describe_record(&record));
    }
    Ok(())
}

pub(crate) fn cmd_update(
    svc: &TrackerService,
    date: &str,
    fields: EntryFields,
    json: bool,
) -> Result<()> {
    let date = parse_date_arg(Some(date))?;
    let update = UpdateMeasurement {
        weight: parse_optional_float(fields.weight.as_deref(), "Weight")?,
        notes: fields.notes,
        trend: None,
        sleep_duration: parse_optional_float(fields.sleep.as_deref(), "Sleep duration")?,
        resting_heart_rate: parse_optional_int(fields.resting_hr.as_deref(), "Resting heart rate")?,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass at least one of --weight, --notes, --sleep, --rhr");
    }

    let record = svc.update_entry(date, update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Entry for {} updated successfully!", record.date.format("%Y-%m-%d"));
        println!("  {}", describe_record(&record));
    }
    Ok(())
}

pub(crate) fn cmd_show(svc: &TrackerService, date: Option<&str>, json: bool) -> Result<()> {
    let date = parse_date_arg(date)?;
    let date_str = date.format("%Y-%m-%d");

    match svc.get_entry(date)? {
        Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
        Some(record) => println!("{}", describe_record(&record)),
        None if json => println!("{}", json_error(&format!("No entry for {date_str}"))),
        None => eprintln!("No entry found for the date {date_str}."),
    }
    Ok(())
}

pub(crate) fn cmd_view(
    svc: &TrackerService,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let from = from.map(|d| parse_date_arg(Some(d))).transpose()?;
    let to = to.map(|d| parse_date_arg(Some(d))).transpose()?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            bail!("--from ({f}) is after --to ({t})");
        }
    }

    let records = svc.list_entries(from, to)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        eprintln!("No entries found. Use `vitals add` to record a day.");
    } else {
        println!("{}", render_records_table(&records));
    }
    Ok(())
}
