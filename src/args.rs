use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "health_sync")]
#[command(about = "Copy daily WHOOP and MyFitnessPal metrics into weekly tabs of a Google Sheet")]
#[command(version)]
pub struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Path to config file
    #[arg(long, default_value = "config/health.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fill week tabs from the start date until today (the default)
    Run(RunArgs),

    /// Write config and spreadsheet map templates if they are missing
    Init,

    /// List the date of every tracked day, working back from the current week
    Plan {
        /// Date of day 7 of the current week (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Current week number in the tracking sheet
        #[arg(long)]
        week: u32,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Override general.start_date (day 1 of week 1)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start_date: Option<NaiveDate>,

    /// Override general.start_week
    #[arg(long, value_name = "WEEK")]
    pub start_week: Option<u32>,

    /// Read the sheet but write cells to the output CSV instead
    #[arg(long)]
    pub dry_run: bool,

    /// Override output_csv.path
    #[arg(long, value_name = "PATH")]
    pub csv_path: Option<String>,
}
