use anyhow::Result;

use vitals_core::service::TrackerService;

use super::helpers::{json_error, parse_horizon, render_projection, render_statistics};

pub(crate) fn cmd_stats(svc: &TrackerService, json: bool) -> Result<()> {
    let Some(stats) = svc.statistics()? else {
        if json {
            println!("{}", json_error("No weight data available for statistics"));
        } else {
            eprintln!("No weight data available for statistics.");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", render_statistics(&stats));
    }
    Ok(())
}

pub(crate) fn cmd_project(svc: &TrackerService, days: u32, json: bool) -> Result<()> {
    let days = parse_horizon(days)?;
    let Some(projection) = svc.projection(days)? else {
        if json {
            println!("{}", json_error("Not enough data for predictions"));
        } else {
            eprintln!("Not enough data for predictions. Record at least two weights.");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
    } else {
        println!("{}", render_projection(&projection));
    }
    Ok(())
}
