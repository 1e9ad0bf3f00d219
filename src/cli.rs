use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use salesflow::config::{ColumnNames, PipelineConfig};
use salesflow::pipeline::run_pipeline;
use salesflow::watcher::{StreamConfig, StreamEvent, WatcherService};
use std::path::PathBuf;
use std::sync::mpsc::channel;

#[derive(Parser)]
#[command(name = "salesflow", about = "Sales CSV cleaning pipeline and folder ingestion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean, validate, enrich and export a sales CSV
    Run {
        /// Path to a JSON pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input CSV. Overrides the configuration.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV. Overrides the configuration.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Row error log. Overrides the configuration.
        #[arg(long)]
        error_log: Option<PathBuf>,

        /// Fail the run when sale dates cannot be parsed
        #[arg(long)]
        strict_dates: bool,
    },
    /// Watch a folder and write every new CSV as a micro-batch
    Stream {
        /// Path to a JSON stream configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Folder to watch. Overrides the configuration.
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Root of the batch output folders. Overrides the configuration.
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// Stop after this many written batches
        #[arg(long)]
        max_batches: Option<u64>,
    },
    /// Write a default pipeline configuration file
    Config {
        /// Destination of the JSON file
        #[arg(short, long, default_value = "salesflow.json")]
        output: PathBuf,

        /// Use the French column headers (`ID_produit`, `Nom_produit`, ...)
        #[arg(long)]
        french: bool,
    },
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            input,
            output,
            error_log,
            strict_dates,
        } => {
            let mut cfg = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(p) = input {
                cfg.input_path = p;
            }
            if let Some(p) = output {
                cfg.output_path = p;
            }
            if let Some(p) = error_log {
                cfg.error_log_path = p;
            }
            cfg.strict_dates |= strict_dates;
            handle_run(&cfg)
        }
        Commands::Stream {
            config,
            input_dir,
            output_root,
            max_batches,
        } => {
            let mut cfg = match config {
                Some(path) => StreamConfig::load(&path)?,
                None => StreamConfig::default(),
            };
            if let Some(d) = input_dir {
                cfg.input_dir = d;
            }
            if let Some(d) = output_root {
                cfg.output_root = d;
            }
            handle_stream(cfg, max_batches)
        }
        Commands::Config { output, french } => {
            let cfg = PipelineConfig {
                columns: if french {
                    ColumnNames::french()
                } else {
                    ColumnNames::default()
                },
                ..Default::default()
            };
            cfg.save(&output)?;
            println!("Configuration written to {}", output.display());
            Ok(())
        }
    }
}

fn handle_run(config: &PipelineConfig) -> Result<()> {
    println!("Processing {}...", config.input_path.display());
    let report = run_pipeline(config)
        .with_context(|| format!("Pipeline failed on {}", config.input_path.display()))?;

    println!("{}", report.summary());
    if report.row_failures > 0 {
        println!(
            "{} row error(s) appended to {}",
            report.row_failures,
            config.error_log_path.display()
        );
    }
    if let Some(path) = &report.output_path {
        println!("Output written to {}", path.display());
    }
    Ok(())
}

fn handle_stream(config: StreamConfig, max_batches: Option<u64>) -> Result<()> {
    let (tx, rx) = channel();
    let service = WatcherService::start(config, tx)?;
    let mut written = 0_u64;

    for event in rx.iter() {
        match event {
            StreamEvent::Started { folder, output_dir } => {
                println!(
                    "Watching {} -> {}",
                    folder.display(),
                    output_dir.display()
                );
            }
            StreamEvent::BatchWritten(batch) => {
                println!("{}", batch.render());
                written += 1;
                if max_batches.is_some_and(|max| written >= max) {
                    break;
                }
            }
            StreamEvent::BatchFailed { path, error } => {
                println!("Skipped {}: {error}", path.display());
            }
            StreamEvent::FileDetected { .. } => {}
            StreamEvent::Stopped => break,
        }
    }

    service.stop()?;
    println!("{written} batch(es) written");
    Ok(())
}
