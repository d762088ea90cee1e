#[cfg(feature = "charts")]
mod chart;
mod entry;
mod helpers;
mod menu;
mod report;
mod transfer;

use std::io;

use anyhow::Result;

use vitals_core::service::TrackerService;

pub(crate) use entry::{EntryFields, cmd_add, cmd_show, cmd_update, cmd_view};
pub(crate) use report::{cmd_project, cmd_stats};
pub(crate) use transfer::{cmd_export, cmd_import, cmd_restore};

/// Where `chart` and the menu's visualize option write by default.
pub(crate) const DEFAULT_CHART_FILE: &str = "weight_chart.svg";

/// Run the numbered menu on the terminal until the user exits.
pub(crate) fn run_menu(svc: &TrackerService) -> Result<()> {
    let stdin = io::stdin();
    menu::Menu::new(svc, stdin.lock(), io::stdout(), menu::MenuPaths::default()).run()
}

#[cfg(feature = "charts")]
pub(crate) fn cmd_chart(
    svc: &TrackerService,
    output: &std::path::Path,
    days: u32,
    json: bool,
) -> Result<()> {
    let days = helpers::parse_horizon(days)?;
    let written = chart::render_chart(svc, output, days)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "written": written, "path": output.display().to_string() })
        );
    } else if written {
        println!("Chart written to {}", output.display());
    } else {
        eprintln!("No data to visualize.");
    }
    Ok(())
}
