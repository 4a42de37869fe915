/// Scheduling core: classification, then tolerance-bounded allocation.
///
/// ```text
///  Vec<Item> ──► classifier ──► CategoryMapping ──► allocator ──► Vec<FinalJob>
///                  │  group                           │  build_batches (tolerance)
///                  │  denylist                        │  split_jobs    (batch_size, shuffle)
///                  │  prior set                       │
///                  ▼                                  ▼
///           ExclusionRecord                     ToleranceTable
/// ```
///
/// Nothing in here performs I/O; configuration is passed in explicitly.

pub mod allocator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod tolerance;
