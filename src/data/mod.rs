/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///    transactions.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  validate schema, coerce cells → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<TransactionRecord>, unique-value indexes
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterSpec predicates → Snapshot
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
