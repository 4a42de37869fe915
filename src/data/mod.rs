/// Data layer: core types and boundary I/O.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read one column → Vec<Item>
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ CategoryMapping │  items grouped by domain (model)
///   └─────────────────┘
///        │     ▲
///        │     └── filter: denylist matching strategy
///        ▼
///   ┌──────────┐
///   │  writer   │  FinalJob → jobs_batch_<id>.csv
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
