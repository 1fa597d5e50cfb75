//! Transaction KPI aggregation engine.
//!
//! Load a transaction table once into an immutable [`Dataset`], then answer
//! queries as a pure function: a [`FilterSpec`] selects a [`Snapshot`] and
//! [`run_query`] computes the full [`ViewBundle`] of named aggregates from
//! it. Rendering and event wiring live outside this crate.

pub mod agg;
pub mod data;

pub use agg::bundle::ViewBundle;
pub use agg::views::{aggregate, run_query};
pub use data::filter::{FilterSpec, Snapshot};
pub use data::loader::{load_file, LoadError};
pub use data::model::{Dataset, TransactionRecord};
