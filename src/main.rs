mod app;
mod data;
mod report;
mod scheduler;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use app::{AssignOptions, Runner};
use data::loader::DEFAULT_COLUMN;
use data::writer::clear_job_files;
use scheduler::config::SchedulerConfig;

/// Split a recipient list into batches with a per-domain cap
#[derive(Parser)]
#[command(name = "domain-scheduler", version)]
#[command(
    about = "Splits recipients into size-bounded batches, capping same-domain addresses per batch"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify recipients by domain and write jobs_batch_<id>.csv files
    Assign {
        /// Recipient files (.csv, .json, .parquet)
        #[arg(long, required = true, num_args = 1..)]
        data: Vec<PathBuf>,

        /// Done log of previous runs; missing file means nothing is done yet
        #[arg(long)]
        done: Option<PathBuf>,

        /// Directory receiving the job files
        #[arg(long, default_value = "data/jobs")]
        jobs_dir: PathBuf,

        /// Column holding the addresses
        #[arg(long, default_value = DEFAULT_COLUMN)]
        column: String,

        /// JSON scheduler config (batch_size, tolerance, category_denylist, ...)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum recipients per job, overriding the config file (0 = unlimited)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Seed for the intra-job shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Keep jobs_batch_*.csv files from earlier runs
        #[arg(long)]
        keep_existing: bool,

        /// Write the summary counts as JSON to this file
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Remove jobs_batch_*.csv files from a directory
    Clear {
        #[arg(long, default_value = "data/jobs")]
        jobs_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::parse().command {
        Command::Assign {
            data,
            done,
            jobs_dir,
            column,
            config,
            batch_size,
            seed,
            keep_existing,
            summary,
        } => {
            let mut cfg = match &config {
                Some(path) => SchedulerConfig::from_json_file(path)?,
                None => SchedulerConfig::default(),
            };
            if let Some(n) = batch_size {
                cfg = cfg.with_batch_size(n);
            }
            let runner = Runner::new(cfg)?;
            log::debug!("Scheduler config: {:?}", runner.config());

            let opts = AssignOptions {
                data,
                done,
                jobs_dir,
                column,
                seed,
                keep_existing,
                summary,
            };
            let assignment = runner.assign(&opts)?;
            log::info!(
                "{} jobs written to {}; rerun with --seed {} to reproduce the ordering",
                assignment.jobs.len(),
                opts.jobs_dir.display(),
                assignment.seed
            );
        }
        Command::Clear { jobs_dir } => {
            let removed = clear_job_files(&jobs_dir)?;
            log::info!("Removed {removed} job files from {}", jobs_dir.display());
        }
    }
    Ok(())
}
