use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::model::{Dataset, TransactionRecord};

// ---------------------------------------------------------------------------
// FilterSpec – one query's predicate set
// ---------------------------------------------------------------------------

/// The conjunction of optional predicates for one query. An absent date
/// bound or an empty set imposes no constraint. Built per query, never
/// persisted, never mutates the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub start_date: Option<NaiveDate>,
    /// Inclusive of the whole end day.
    pub end_date: Option<NaiveDate>,
    pub stores: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub payment_modes: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.stores.insert(store.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_payment_mode(mut self, mode: impl Into<String>) -> Self {
        self.payment_modes.insert(mode.into());
        self
    }

    /// True when no predicate is active (every record passes).
    pub fn is_unconstrained(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.stores.is_empty()
            && self.categories.is_empty()
            && self.payment_modes.is_empty()
    }

    /// Apply the spec to a dataset, producing the matching snapshot.
    pub fn apply<'d>(&self, dataset: &'d Dataset) -> Snapshot<'d> {
        if self.is_unconstrained() {
            return Snapshot {
                dataset,
                indices: (0..dataset.len()).collect(),
            };
        }
        let indices = dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, rec)| self.matches(rec))
            .map(|(i, _)| i)
            .collect();
        Snapshot { dataset, indices }
    }

    /// Whether a single record passes every active predicate.
    ///
    /// The end date is inclusive of its entire calendar day, implemented as
    /// an exclusive bound at the following midnight. A sentinel (unparsable)
    /// timestamp fails any active date predicate.
    fn matches(&self, rec: &TransactionRecord) -> bool {
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(ts) = rec.timestamp else {
                return false;
            };
            if let Some(start) = self.start_date {
                if ts < day_floor(start) {
                    return false;
                }
            }
            if let Some(end) = self.end_date {
                match end.checked_add_days(Days::new(1)) {
                    Some(next) => {
                        if ts >= day_floor(next) {
                            return false;
                        }
                    }
                    // End of the calendar: no instant lies beyond it.
                    None => {}
                }
            }
        }
        set_allows(&self.stores, &rec.store)
            && set_allows(&self.categories, &rec.category)
            && set_allows(&self.payment_modes, &rec.payment_mode)
    }
}

fn day_floor(date: NaiveDate) -> NaiveDateTime {
    // Midnight exists for every calendar date.
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

fn set_allows(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

// ---------------------------------------------------------------------------
// Snapshot – a read-only filtered view of the dataset
// ---------------------------------------------------------------------------

/// The subset of a dataset matching one [`FilterSpec`]: a borrowed,
/// read-only index view. Fully determined by (dataset, spec); never shares
/// mutable state with the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<'d> {
    dataset: &'d Dataset,
    indices: Vec<usize>,
}

impl<'d> Snapshot<'d> {
    /// Iterate the matching records in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'d TransactionRecord> + '_ {
        self.indices.iter().map(|&i| &self.dataset.records()[i])
    }

    /// Whether the underlying dataset carries the product column.
    pub fn has_product(&self) -> bool {
        self.dataset.has_product()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Filter an already-filtered snapshot with another spec. Applying the
    /// same spec again is a no-op; applying a second spec is equivalent to
    /// one combined conjunction.
    pub fn refine(&self, spec: &FilterSpec) -> Snapshot<'d> {
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| spec.matches(&self.dataset.records()[i]))
            .collect();
        Snapshot {
            dataset: self.dataset,
            indices,
        }
    }
}
