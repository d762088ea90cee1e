mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    EntryFields, cmd_add, cmd_export, cmd_import, cmd_project, cmd_restore, cmd_show, cmd_stats,
    cmd_update, cmd_view, run_menu,
};
use crate::config::Config;
use crate::logging::{LogFormat, init_logging};
use vitals_core::projection::DEFAULT_HORIZON_DAYS;
use vitals_core::service::TrackerService;
use vitals_core::transfer::{BACKUP_FILE, EXPORT_FILE, IMPORT_FILE};

#[derive(Parser)]
#[command(
    name = "vitals",
    version,
    about = "A simple weight, sleep and resting heart-rate tracker",
    long_about = "Log one entry per day (weight, sleep, resting heart rate, notes), \
                  review statistics, project your weight forward, and move data \
                  in and out as CSV. Run without a subcommand for the interactive menu."
)]
struct Cli {
    /// Database file (default: $VITALS_DB, then the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Per-day values shared by `add` and `update`.
#[derive(Args)]
struct FieldArgs {
    /// Weight in pounds
    #[arg(short, long)]
    weight: Option<String>,
    /// Free-text notes
    #[arg(short, long)]
    notes: Option<String>,
    /// Sleep duration in hours
    #[arg(short, long)]
    sleep: Option<String>,
    /// Resting heart rate in bpm
    #[arg(long)]
    rhr: Option<String>,
}

impl From<FieldArgs> for EntryFields {
    fn from(args: FieldArgs) -> Self {
        EntryFields {
            weight: args.weight,
            notes: args.notes,
            sleep: args.sleep,
            resting_hr: args.rhr,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add an entry for a day
    Add {
        /// Date (YYYY-MM-DD, today, yesterday; default: today)
        #[arg(long)]
        date: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an existing entry; omitted fields keep their values
    Update {
        /// Date of the entry (YYYY-MM-DD)
        date: String,
        #[command(flatten)]
        fields: FieldArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the entry for one day
    Show {
        /// Date (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries, oldest first
    View {
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weight and heart-rate statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Project weight forward with a straight-line fit
    Project {
        /// Days to project past the last weigh-in
        #[arg(short, long, default_value_t = DEFAULT_HORIZON_DAYS)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write every entry to a CSV file
    Export {
        #[arg(default_value = EXPORT_FILE)]
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add entries from a CSV file, skipping bad rows and existing dates
    Import {
        #[arg(default_value = IMPORT_FILE)]
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace every entry with the contents of a backup CSV
    Restore {
        #[arg(default_value = BACKUP_FILE)]
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Draw weight, sleep and heart rate to an SVG chart
    #[cfg(feature = "charts")]
    Chart {
        /// SVG file to write
        #[arg(short, long, default_value = commands::DEFAULT_CHART_FILE)]
        output: PathBuf,
        /// Days of projection to draw
        #[arg(short, long, default_value_t = DEFAULT_HORIZON_DAYS)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive numbered menu (the default)
    Menu,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_format) {
        eprintln!("Warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db.as_deref())?;
    let svc = TrackerService::open(&config.db_path)?;

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Add { date, fields, json } => {
            cmd_add(&svc, date.as_deref(), fields.into(), json)
        }
        Commands::Update { date, fields, json } => cmd_update(&svc, &date, fields.into(), json),
        Commands::Show { date, json } => cmd_show(&svc, date.as_deref(), json),
        Commands::View { from, to, json } => {
            cmd_view(&svc, from.as_deref(), to.as_deref(), json)
        }
        Commands::Stats { json } => cmd_stats(&svc, json),
        Commands::Project { days, json } => cmd_project(&svc, days, json),
        Commands::Export { file, json } => cmd_export(&svc, &file, json),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
        Commands::Restore { file, json } => cmd_restore(&svc, &file, json),
        #[cfg(feature = "charts")]
        Commands::Chart { output, days, json } => commands::cmd_chart(&svc, &output, days, json),
        Commands::Menu => run_menu(&svc),
    }
}
