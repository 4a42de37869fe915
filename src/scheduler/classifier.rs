use std::collections::{BTreeSet, HashSet};

use super::config::SchedulerConfig;
use crate::data::filter::{DenylistMatch, is_denylisted};
use crate::data::model::{CategoryMapping, ExclusionRecord, Item, MalformedItem, category_of};

/// Output of [`group`]: the mapping plus every row that had no category.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub mapping: CategoryMapping,
    pub malformed: Vec<MalformedItem>,
}

/// Everything the allocator and the report need from classification.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub mapping: CategoryMapping,
    pub excluded: ExclusionRecord,
    pub malformed: Vec<MalformedItem>,
}

/// Group items by category, in input order. Items without a category are
/// reported and skipped.
pub fn group<I>(items: I) -> Classification
where
    I: IntoIterator<Item = Item>,
{
    let mut out = Classification::default();
    for (position, item) in items.into_iter().enumerate() {
        match category_of(&item) {
            Some(category) => out.mapping.push(category, item),
            None => {
                log::warn!("Skipping row {position}: '{item}' has no domain");
                out.malformed.push(MalformedItem {
                    position,
                    item,
                    reason: "no domain after '@'",
                });
            }
        }
    }
    out
}

/// Remove every item whose category matches a denylist entry.
pub fn exclude_by_category_denylist(
    mapping: CategoryMapping,
    denylist: &BTreeSet<String>,
    mode: DenylistMatch,
) -> (CategoryMapping, Vec<Item>) {
    mapping.partition(|category, _| is_denylisted(category, denylist, mode))
}

/// Remove every item already present in the prior-completed set.
pub fn exclude_by_prior_set(
    mapping: CategoryMapping,
    done: &HashSet<Item>,
) -> (CategoryMapping, Vec<Item>) {
    if done.is_empty() {
        return (mapping, Vec::new());
    }
    mapping.partition(|_, item| done.contains(item))
}

/// Group, then apply the denylist, then the prior-completed set.
pub fn classify<I>(items: I, config: &SchedulerConfig, done: &HashSet<Item>) -> Classified
where
    I: IntoIterator<Item = Item>,
{
    let Classification { mapping, malformed } = group(items);

    let (mapping, denylisted) = if config.exclude_denylisted {
        exclude_by_category_denylist(mapping, &config.category_denylist, config.denylist_match)
    } else {
        (mapping, Vec::new())
    };
    let (mapping, done) = exclude_by_prior_set(mapping, done);

    let excluded = ExclusionRecord { denylisted, done };
    log::debug!(
        "Classified {} items into {} domains ({} excluded: {} denylisted, {} done; {} malformed)",
        mapping.item_count(),
        mapping.len(),
        excluded.total(),
        excluded.denylisted.len(),
        excluded.done.len(),
        malformed.len()
    );

    Classified {
        mapping,
        excluded,
        malformed,
    }
}
