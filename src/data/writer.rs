use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::loader::DEFAULT_COLUMN;
use super::model::FinalJob;

const JOB_FILE_PREFIX: &str = "jobs_batch_";
const JOB_FILE_SUFFIX: &str = ".csv";

/// File name of a persisted job, e.g. `jobs_batch_0_1.csv`.
pub fn job_file_name(job: &FinalJob) -> String {
    format!("{JOB_FILE_PREFIX}{}{JOB_FILE_SUFFIX}", job.id)
}

fn is_job_file(name: &str) -> bool {
    name.starts_with(JOB_FILE_PREFIX) && name.ends_with(JOB_FILE_SUFFIX)
}

/// Write one job as a single-column CSV (one record per item).
pub fn save_job(dir: &Path, job: &FinalJob) -> Result<PathBuf> {
    let path = dir.join(job_file_name(job));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([DEFAULT_COLUMN])?;
    for item in &job.items {
        writer.write_record([item.as_str()])?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    log::info!("Batch [{}] saved to [{}]", job.id, path.display());
    Ok(path)
}

/// Persist every job into `dir`, creating it when absent.
pub fn save_jobs(dir: &Path, jobs: &[FinalJob]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    jobs.iter().map(|job| save_job(dir, job)).collect()
}

/// Delete `jobs_batch_*.csv` files left in `dir` by a previous run.
/// Returns the number of removed files. A missing directory removes nothing.
pub fn clear_job_files(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_job_file(name) && entry.path().is_file() {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("removing {}", entry.path().display()))?;
            log::info!("File [{name}] removed");
            removed += 1;
        }
    }
    Ok(removed)
}
