/// Data layer: core types, loading, querying and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐   ┌───────────┐
///   │  loader   │──▶│ normalize │  raw cells → VehicleRecord | SkipReason
///   └──────────┘   └───────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ VehicleDataset │  Vec<VehicleRecord>, id index (read-only)
///   └────────────────┘
///        │
///        ├──▶ filter     predicates → sort → page
///        ├──▶ analytics  totals, decades, per-make, top-N, random
///        └──▶ compare    side-by-side specs
/// ```

pub mod analytics;
pub mod compare;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
