use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::loader::{load_column_if_exists, load_columns};
use crate::data::model::{FinalJob, Item};
use crate::data::writer::{clear_job_files, save_jobs};
use crate::report::AssignmentSummary;
use crate::scheduler::allocator::allocate;
use crate::scheduler::classifier::classify;
use crate::scheduler::config::SchedulerConfig;

// ---------------------------------------------------------------------------
// Runner – wires loading, scheduling and persistence together
// ---------------------------------------------------------------------------

/// Everything one `assign` run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct AssignOptions {
    pub data: Vec<PathBuf>,
    /// Done log from previous runs; may not exist yet.
    pub done: Option<PathBuf>,
    pub jobs_dir: PathBuf,
    pub column: String,
    /// Seed for the intra-job shuffle; random when absent.
    pub seed: Option<u64>,
    /// Leave `jobs_batch_*.csv` files from earlier runs in place.
    pub keep_existing: bool,
    /// Optional JSON file receiving the summary counts.
    pub summary: Option<PathBuf>,
}

/// Result of a run, kept for callers that want more than the files.
#[derive(Debug)]
pub struct Assignment {
    pub jobs: Vec<FinalJob>,
    pub summary: AssignmentSummary,
    pub seed: u64,
}

pub struct Runner {
    config: SchedulerConfig,
}

impl Runner {
    /// Validate `config` eagerly; nothing is read before this succeeds.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate().context("invalid scheduler configuration")?;
        Ok(Self {
            config: config.normalized(),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Load recipients, schedule them, and write one CSV per job.
    pub fn assign(&self, opts: &AssignOptions) -> Result<Assignment> {
        let items = load_columns(&opts.data, &opts.column)?;
        let done: HashSet<Item> = match &opts.done {
            Some(path) => load_column_if_exists(path, &opts.column)?.into_iter().collect(),
            None => HashSet::new(),
        };
        log::info!("Loaded {} recipients, {} already done", items.len(), done.len());

        let seed = opts.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let (jobs, summary) = self.schedule(items, &done, &mut rng)?;

        if !opts.keep_existing {
            clear_job_files(&opts.jobs_dir)?;
        }
        save_jobs(&opts.jobs_dir, &jobs)?;

        if let Some(path) = &opts.summary {
            let json = serde_json::to_string_pretty(&summary)?;
            std::fs::write(path, json)
                .with_context(|| format!("writing summary {}", path.display()))?;
        }

        log::info!("{summary}");
        Ok(Assignment { jobs, summary, seed })
    }

    /// The pure part of [`Runner::assign`]: classify and allocate.
    pub fn schedule<R>(
        &self,
        items: Vec<Item>,
        done: &HashSet<Item>,
        rng: &mut R,
    ) -> Result<(Vec<FinalJob>, AssignmentSummary)>
    where
        R: rand::Rng + ?Sized,
    {
        let classified = classify(items, &self.config, done);
        let jobs = allocate(
            classified.mapping,
            &self.config.tolerance,
            self.config.batch_size,
            rng,
        )?;
        let summary = AssignmentSummary::new(&jobs, &classified.excluded, &classified.malformed);
        Ok((jobs, summary))
    }
}
