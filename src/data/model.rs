use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Item / Category
// ---------------------------------------------------------------------------

/// An opaque recipient identifier, e.g. `user@example.com`.
pub type Item = String;

/// Grouping key derived from an item (the domain part of an address).
pub type Category = String;

/// Separator between the local part and the category of an item.
pub const CATEGORY_SEPARATOR: char = '@';

/// Extract the category of an item: the text after the first separator,
/// trimmed and lowercased. Returns `None` when there is no separator or
/// nothing follows it.
pub fn category_of(item: &str) -> Option<Category> {
    let (_, tail) = item.split_once(CATEGORY_SEPARATOR)?;
    let category = tail.trim().to_lowercase();
    if category.is_empty() {
        None
    } else {
        Some(category)
    }
}

// ---------------------------------------------------------------------------
// CategoryMapping – category → remaining items, in first-seen order
// ---------------------------------------------------------------------------

/// Items grouped by category. Categories keep the order in which they were
/// first seen; items keep input order inside their category.
///
/// Every item also carries its arrival index, so items removed from several
/// categories can be reported back in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMapping {
    buckets: Vec<Bucket>,
    index: HashMap<Category, usize>,
    arrivals: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bucket {
    category: Category,
    items: Vec<Item>,
    arrival: Vec<usize>,
}

impl CategoryMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` to the sequence of `category`, creating it if needed.
    pub fn push(&mut self, category: Category, item: Item) {
        let arrival = self.arrivals;
        self.insert(category, item, arrival);
    }

    fn insert(&mut self, category: Category, item: Item, arrival: usize) {
        self.arrivals = self.arrivals.max(arrival + 1);
        let slot = match self.index.get(&category) {
            Some(&slot) => slot,
            None => {
                self.index.insert(category.clone(), self.buckets.len());
                self.buckets.push(Bucket {
                    category,
                    items: Vec::new(),
                    arrival: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };
        self.buckets[slot].items.push(item);
        self.buckets[slot].arrival.push(arrival);
    }

    /// Items of one category, if present.
    pub fn get(&self, category: &str) -> Option<&[Item]> {
        self.index
            .get(category)
            .map(|&slot| self.buckets[slot].items.as_slice())
    }

    /// Categories in iteration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.category.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Item])> {
        self.buckets
            .iter()
            .map(|b| (b.category.as_str(), b.items.as_slice()))
    }

    /// Total number of items over all categories.
    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Split every item into kept / removed according to `remove`.
    /// Categories left without items are dropped. Kept items stay grouped;
    /// removed items come back in input order.
    pub fn partition<F>(self, mut remove: F) -> (CategoryMapping, Vec<Item>)
    where
        F: FnMut(&str, &str) -> bool,
    {
        let mut kept = CategoryMapping::new();
        let mut removed = Vec::new();
        let arrivals = self.arrivals;
        for bucket in self.buckets {
            for (item, arrival) in bucket.items.into_iter().zip(bucket.arrival) {
                if remove(&bucket.category, &item) {
                    removed.push((arrival, item));
                } else {
                    kept.insert(bucket.category.clone(), item, arrival);
                }
            }
        }
        kept.arrivals = arrivals;
        removed.sort_by_key(|(arrival, _)| *arrival);
        (kept, removed.into_iter().map(|(_, item)| item).collect())
    }

    /// Consume the mapping into its ordered buckets.
    pub fn into_buckets(self) -> Vec<(Category, Vec<Item>)> {
        self.buckets
            .into_iter()
            .map(|b| (b.category, b.items))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ExclusionRecord – what was removed before allocation, and why
// ---------------------------------------------------------------------------

/// Items removed before allocation. Only used for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRecord {
    /// Removed because their category matched a denylist entry.
    pub denylisted: Vec<Item>,
    /// Removed because they were already in the prior-completed set.
    pub done: Vec<Item>,
}

impl ExclusionRecord {
    pub fn total(&self) -> usize {
        self.denylisted.len() + self.done.len()
    }
}

/// An input row that could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedItem {
    /// Zero-based position in the input sequence.
    pub position: usize,
    pub item: Item,
    pub reason: &'static str,
}

// ---------------------------------------------------------------------------
// Batch / FinalJob
// ---------------------------------------------------------------------------

/// A tolerance-respecting group of items built by one allocation round.
pub type Batch = Vec<Item>;

/// All batches of one allocation pass, in round order.
pub type BatchGroup = Vec<Batch>;

/// Composite identifier of a final job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobId {
    /// The batch fit into a single chunk.
    Whole(usize),
    /// One chunk of a batch that was split by size.
    Chunk { batch: usize, chunk: usize },
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Whole(i) => write!(f, "{i}"),
            JobId::Chunk { batch, chunk } => write!(f, "{batch}_{chunk}"),
        }
    }
}

/// A size-bounded, shuffled slice of a batch, handed to downstream senders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalJob {
    pub id: JobId,
    pub items: Vec<Item>,
}

impl FinalJob {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_is_text_after_first_separator() {
        assert_eq!(category_of("a@X.com ").as_deref(), Some("x.com"));
        assert_eq!(category_of("a@b@c.org").as_deref(), Some("b@c.org"));
        assert_eq!(category_of("no-separator"), None);
        assert_eq!(category_of("trailing@  "), None);
    }

    #[test]
    fn mapping_keeps_first_seen_order() {
        let mut m = CategoryMapping::new();
        m.push("z.com".into(), "1@z.com".into());
        m.push("a.com".into(), "2@a.com".into());
        m.push("z.com".into(), "3@z.com".into());

        assert_eq!(m.categories().collect::<Vec<_>>(), ["z.com", "a.com"]);
        assert_eq!(m.get("z.com").unwrap(), ["1@z.com", "3@z.com"]);
        assert_eq!(m.item_count(), 3);
    }

    #[test]
    fn partition_drops_emptied_categories() {
        let mut m = CategoryMapping::new();
        m.push("x.com".into(), "a@x.com".into());
        m.push("y.com".into(), "b@y.com".into());

        let (kept, removed) = m.partition(|cat, _| cat == "x.com");
        assert_eq!(removed, ["a@x.com"]);
        assert_eq!(kept.len(), 1);
        assert!(kept.get("x.com").is_none());
    }

    #[test]
    fn partition_returns_removed_items_in_input_order() {
        let mut m = CategoryMapping::new();
        for item in ["a@x.com", "b@y.com", "c@x.com", "d@z.com", "e@y.com"] {
            m.push(category_of(item).unwrap(), item.to_string());
        }

        let (kept, removed) = m.partition(|cat, _| cat != "z.com");
        assert_eq!(removed, ["a@x.com", "b@y.com", "c@x.com", "e@y.com"]);
        assert_eq!(kept.item_count(), 1);

        // a second pass still sees the original arrival order
        let mut m = CategoryMapping::new();
        for item in ["a@x.com", "b@y.com", "c@x.com", "d@y.com"] {
            m.push(category_of(item).unwrap(), item.to_string());
        }
        let (kept, _) = m.partition(|_, item| item == "a@x.com");
        let (_, removed) = kept.partition(|_, _| true);
        assert_eq!(removed, ["b@y.com", "c@x.com", "d@y.com"]);
    }

    #[test]
    fn job_id_formats() {
        assert_eq!(JobId::Whole(3).to_string(), "3");
        assert_eq!(JobId::Chunk { batch: 0, chunk: 2 }.to_string(), "0_2");
    }
}
