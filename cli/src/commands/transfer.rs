use std::path::Path;

use anyhow::{Context, Result};

use vitals_core::service::TrackerService;

pub(crate) fn cmd_export(svc: &TrackerService, path: &Path, json: bool) -> Result<()> {
    let written = svc
        .export_csv(path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "exported": written, "path": path.display().to_string() })
        );
    } else {
        println!("Data exported to {} ({written} rows)", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_import(svc: &TrackerService, path: &Path, json: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("No import file found: {}", path.display());
    }
    let summary = svc
        .import_csv(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete.\n");
        println!("  Rows read:     {}", summary.rows_read);
        println!("  Rows inserted: {}", summary.inserted);
        println!("  Rows skipped:  {}", summary.skipped);
    }
    Ok(())
}

pub(crate) fn cmd_restore(svc: &TrackerService, path: &Path, json: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("No backup file found: {}", path.display());
    }
    let restored = svc
        .restore_backup(path)
        .with_context(|| format!("Failed to restore from {}", path.display()))?;

    if json {
        println!("{}", serde_json::json!({ "restored": restored }));
    } else {
        println!("Data restored successfully! ({restored} rows)");
    }
    Ok(())
}
