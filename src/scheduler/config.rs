use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::{ScheduleError, ScheduleResult};
use super::tolerance::ToleranceTable;
use crate::data::filter::DenylistMatch;

/// Provider, enterprise and academic domains skipped by default.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "163.com",
    "126.com",
    "qq.com",
    "sina.com",
    "sohu.com",
    ".com.cn",
    "tycc.cn",
    "huawei.com",
    ".edu.cn",
    "org.cn",
    ".ac.cn",
];

/// Immutable settings for one scheduling run.
///
/// Built once (defaults, then an optional JSON file, then CLI overrides),
/// validated once, then passed by reference to the classifier and the
/// allocator. Unknown keys in the JSON file are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Maximum items per final job; 0 keeps every batch whole.
    pub batch_size: usize,
    pub tolerance: ToleranceTable,
    /// Entries disqualifying a category (see [`DenylistMatch`]).
    pub category_denylist: BTreeSet<String>,
    /// When false the denylist is ignored.
    pub exclude_denylisted: bool,
    pub denylist_match: DenylistMatch,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 0,
            tolerance: ToleranceTable::default(),
            category_denylist: DEFAULT_DENYLIST.iter().map(|d| d.to_string()).collect(),
            exclude_denylisted: true,
            denylist_match: DenylistMatch::default(),
        }
    }
}

impl SchedulerConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SchedulerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Denylist entries are compared against lowercase categories.
    pub fn normalized(mut self) -> Self {
        self.category_denylist = self
            .category_denylist
            .into_iter()
            .map(|d| d.trim().to_lowercase())
            .collect();
        self
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        self.tolerance.validate()?;
        if self.category_denylist.iter().any(|d| d.trim().is_empty()) {
            return Err(ScheduleError::InvalidConfig(
                "category_denylist contains an empty entry".into(),
            ));
        }
        Ok(())
    }
}
