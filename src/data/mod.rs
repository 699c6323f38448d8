/// Data layer: core types, loading, filtering and metrics.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    Dataset    │  column check + normalisation, Vec<Record>, options
///   └──────────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  filter   │ ───────▶ │ metrics  │  unfiltered + filtered → snapshot
///   └──────────┘          └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
