use std::fmt;

use serde::Serialize;

use crate::data::model::{ExclusionRecord, FinalJob, MalformedItem};

// ---------------------------------------------------------------------------
// Assignment summary
// ---------------------------------------------------------------------------

/// Counts describing one scheduling run, independent of how they are shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentSummary {
    /// Items placed into jobs.
    pub assigned_items: usize,
    /// Number of final jobs.
    pub assigned_jobs: usize,
    /// Items removed by the domain denylist.
    pub denylisted: usize,
    /// Items removed because they were already done.
    pub done: usize,
    /// Rows without a parseable domain.
    pub malformed: usize,
}

impl AssignmentSummary {
    pub fn new(jobs: &[FinalJob], excluded: &ExclusionRecord, malformed: &[MalformedItem]) -> Self {
        Self {
            assigned_items: jobs.iter().map(FinalJob::len).sum(),
            assigned_jobs: jobs.len(),
            denylisted: excluded.denylisted.len(),
            done: excluded.done.len(),
            malformed: malformed.len(),
        }
    }

    /// Denylisted plus done.
    pub fn ignored(&self) -> usize {
        self.denylisted + self.done
    }

    /// Rows that had a parseable domain; equals `assigned_items + ignored()`.
    pub fn valid_input(&self) -> usize {
        self.assigned_items + self.ignored()
    }
}

impl fmt::Display for AssignmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Jobs assigned.")?;
        writeln!(f, ">> jobs = {}, batches = {}", self.assigned_items, self.assigned_jobs)?;
        writeln!(f, ">> ignored = {}", self.ignored())?;
        writeln!(f, ">> - denylisted domains ignored = {}", self.denylisted)?;
        writeln!(f, ">> - jobs done ignored = {}", self.done)?;
        write!(f, ">> malformed rows skipped = {}", self.malformed)
    }
}
