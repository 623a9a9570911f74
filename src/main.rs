use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use health_sync::args::{Args, Command, RunArgs};
use health_sync::cfg::{self, Cfg};
use health_sync::{job, plan, SyncError};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    match args.command.clone().unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(run) => {
            info!("Starting health_sync");

            if !Path::new(&args.config).exists() {
                println!("Config file not found, creating a template");
                for path in cfg::write_templates(&args.config)? {
                    println!("Created {}", path.display());
                }
                println!("Please fill out the config file and spreadsheet map and run again");
                return Err(SyncError::ConfigMissing(args.config).into());
            }

            let cfg = Cfg::load(&args.config, &run)?;
            job::run_job(&cfg).await?;

            info!("health_sync completed successfully");
        }
        Command::Init => {
            let created = cfg::write_templates(&args.config)?;
            if created.is_empty() {
                println!("Config and spreadsheet map already exist, nothing to do");
            }
            for path in created {
                println!("Created {}", path.display());
            }
        }
        Command::Plan { date, week } => {
            for day in plan::plan_backwards(date, week) {
                println!("{day}");
                if day.day == 1 {
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match level {
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt().with_max_level(filter).init();

    Ok(())
}
