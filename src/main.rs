use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wytham_logparser::config::Config;
use wytham_logparser::contacts::{deduplicate_contacts, detect_contacts, ContactWindow};
use wytham_logparser::identity::IdentityResolver;
use wytham_logparser::placement::PositionResolver;
use wytham_logparser::triggers::TriggerBuilder;
use wytham_logparser::{report, tables};

#[derive(Parser)]
#[command(name = "wytham-logparser", version)]
#[command(about = "Turns RFID logger detections into rodent trigger and contact tables", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "wytham.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve raw logger files into the trigger table
    Triggers {
        /// Logger numbers to process; defaults to the logger-number list
        #[arg(long = "logger", value_delimiter = ',')]
        loggers: Vec<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the deduplicated contact table from the trigger table
    Contacts {
        #[arg(long)]
        triggers: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        window_minutes: Option<f64>,
    },
    /// Summarise a contact table
    Report {
        #[arg(long)]
        contacts: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top_pairs: usize,
        /// Emit JSON instead of Markdown
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from_path(&cli.config)?;

    match cli.command {
        Commands::Triggers { loggers, out } => {
            let paths = &config.paths;
            let out = out.unwrap_or_else(|| paths.triggers.clone());

            let animals = tables::read_animals(&paths.animals)?;
            let placements = tables::read_placements(&paths.placements)?;
            let foreign = tables::read_value_list(&paths.foreign_tags)?;
            let loggers = if loggers.is_empty() {
                tables::read_value_list(&paths.logger_numbers)?
            } else {
                loggers
            };

            info!(
                animals = animals.len(),
                placements = placements.len(),
                foreign_tags = foreign.len(),
                loggers = loggers.len(),
                rule = ?config.placement.rule,
                "reference_tables_loaded"
            );

            let identities = IdentityResolver::new(&animals, &foreign);
            let positions = PositionResolver::new(placements, config.placement.rule);
            let builder = TriggerBuilder::new(&identities, &positions);

            let mut total = 0usize;
            for logger in &loggers {
                let files = tables::discover_logger_files(&paths.logger_dir, logger);
                if files.is_empty() {
                    println!("Logger {logger}: no data files found.");
                }
                for file in files {
                    let readings = tables::read_logger_file(&file)?;
                    let outcome = builder.build(&readings);
                    tables::append_triggers(&out, &outcome.triggers)?;
                    total += outcome.triggers.len();
                    println!(
                        "{}: {} triggers, {} foreign, {} rejected",
                        file.display(),
                        outcome.triggers.len(),
                        outcome.foreign,
                        outcome.rejected.len()
                    );
                }
            }
            println!("Appended {total} triggers to {}.", out.display());
        }
        Commands::Contacts {
            triggers,
            out,
            window_minutes,
        } => {
            let window = match window_minutes {
                Some(minutes) => ContactWindow::from_minutes(minutes)?,
                None => config.window()?,
            };
            let triggers = triggers.unwrap_or_else(|| config.paths.triggers.clone());
            let out = out.unwrap_or_else(|| config.paths.contacts.clone());

            let events = tables::read_triggers(&triggers)?;
            let candidates = detect_contacts(&events, window);
            let contacts = deduplicate_contacts(&candidates, window);
            tables::write_contacts(&out, &contacts)?;
            println!(
                "Wrote {} contacts ({} candidates) to {}.",
                contacts.len(),
                candidates.len(),
                out.display()
            );
        }
        Commands::Report {
            contacts,
            top_pairs,
            json,
            out,
        } => {
            let contacts = contacts.unwrap_or_else(|| config.paths.contacts.clone());
            let events = tables::read_contacts(&contacts)?;
            let summary = report::summarize(&events, top_pairs);
            let rendered = if json {
                serde_json::to_string_pretty(&summary).context("failed to encode summary")?
            } else {
                report::build_report(&summary)
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}
