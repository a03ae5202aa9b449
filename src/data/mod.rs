/// Data layer: sheet model, loading, classification, filtering and metrics.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store    │  Snapshot = Table + classify(header), swapped atomically
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selection → filtered Table
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌──────────┐
///   │ aggregate  │  │  series   │  metric cards / trend charts
///   └───────────┘  └──────────┘
/// ```

pub mod aggregate;
pub mod classify;
pub mod filter;
pub mod loader;
pub mod model;
pub mod series;
pub mod store;
