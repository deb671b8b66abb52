/// Data layer: core types, loading, normalization and derived tables.
///
/// Architecture:
/// ```text
///     .csv upload
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse CSV → typed columns
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  column names, date-like coercion
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Column>, name index
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ stats / pivot   │  bins, densities, group sums → chart data
///   └────────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod normalize;
pub mod pivot;
pub mod stats;
