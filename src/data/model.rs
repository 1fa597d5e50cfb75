use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransactionRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single validated transaction (one row of the source table).
///
/// Every field is well-formed after loading: unparsable cells were repaired
/// to their documented defaults, never dropped. The one exception is the
/// timestamp, which keeps `None` as an explicit sentinel for an unparsable
/// date-time; such rows stay in the dataset but are excluded from
/// date-keyed views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub client_id: String,
    /// `None` marks an unparsable timestamp.
    pub timestamp: Option<NaiveDateTime>,
    /// Non-negative; repaired to 0.0 on parse failure or negative input.
    pub amount: f64,
    pub store: String,
    pub category: String,
    /// Repaired to 0 on parse failure.
    pub quantity: u64,
    pub payment_mode: String,
    /// Satisfaction score, clamped to 0–5; repaired to 0 on parse failure.
    pub satisfaction: u8,
    /// Date-only truncation of `timestamp`; `None` iff the timestamp is.
    pub calendar_date: Option<NaiveDate>,
    /// Only populated when the dataset carries the optional product column.
    pub product: Option<String>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full validated dataset, built once at startup and immutable after.
///
/// Alongside the rows it carries the sorted unique-value indexes the
/// external filter UI needs to populate its widgets, so no caller has to
/// rescan the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<TransactionRecord>,
    /// Whether the optional `product` column exists, resolved once at load.
    has_product: bool,
    stores: BTreeSet<String>,
    categories: BTreeSet<String>,
    payment_modes: BTreeSet<String>,
    /// (min, max) calendar date over rows with a valid timestamp.
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build the unique-value indexes from the loaded rows.
    pub fn from_records(records: Vec<TransactionRecord>, has_product: bool) -> Self {
        let mut stores = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut payment_modes = BTreeSet::new();
        let mut date_range: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            stores.insert(rec.store.clone());
            categories.insert(rec.category.clone());
            payment_modes.insert(rec.payment_mode.clone());
            if let Some(d) = rec.calendar_date {
                date_range = Some(match date_range {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        Dataset {
            records,
            has_product,
            stores,
            categories,
            payment_modes,
            date_range,
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn has_product(&self) -> bool {
        self.has_product
    }

    pub fn stores(&self) -> &BTreeSet<String> {
        &self.stores
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn payment_modes(&self) -> &BTreeSet<String> {
        &self.payment_modes
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
