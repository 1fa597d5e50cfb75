use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scalar KPIs
// ---------------------------------------------------------------------------

/// The four headline figures. All zero for an empty snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_amount: f64,
    pub transaction_count: usize,
    pub avg_amount: f64,
    pub avg_satisfaction: f64,
}

// ---------------------------------------------------------------------------
// Grouped-view row types
// ---------------------------------------------------------------------------

/// Revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedSum {
    pub date: NaiveDate,
    pub total: f64,
}

/// One group key and its summed or averaged amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedValue {
    pub key: String,
    pub value: f64,
}

/// Units sold for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySum {
    pub category: String,
    pub quantity: u64,
}

/// One row of the per-store summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRow {
    pub store: String,
    pub total: f64,
    pub count: usize,
}

/// Revenue for one (category, store) pair; only present pairs get a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosstabRow {
    pub category: String,
    pub store: String,
    pub total: f64,
}

// ---------------------------------------------------------------------------
// Top products per category
// ---------------------------------------------------------------------------

/// One ranked product inside a category (rank 1 = best seller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRank {
    pub rank: usize,
    pub product: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTopProducts {
    pub category: String,
    pub products: Vec<ProductRank>,
}

/// The product-level view depends on the optional product column. When the
/// dataset lacks it the view is a structured marker, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "categories")]
pub enum TopProducts {
    Available(Vec<CategoryTopProducts>),
    Unavailable,
}

// ---------------------------------------------------------------------------
// Payment modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeCount {
    pub mode: String,
    pub count: usize,
}

/// The most used payment mode and its share of all transactions. A count
/// tie resolves to the lexicographically smallest mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMode {
    pub mode: String,
    pub share_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDistribution {
    /// Descending by count, ties ascending by mode.
    pub modes: Vec<ModeCount>,
    /// `None` for an empty snapshot.
    pub top_mode: Option<TopMode>,
}

// ---------------------------------------------------------------------------
// Satisfaction distribution
// ---------------------------------------------------------------------------

/// Count and share of one satisfaction score. Shares over a snapshot sum
/// to 100 when it is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionBucket {
    pub score: u8,
    pub count: usize,
    pub pct: f64,
}

// ---------------------------------------------------------------------------
// ViewBundle – everything one filter state produces
// ---------------------------------------------------------------------------

/// The complete set of named aggregate views computed from one snapshot.
/// Produced fresh per query; serializable as the query-interface payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewBundle {
    pub kpis: Kpis,
    /// Ascending by date; rows with an unparsable timestamp are absent.
    pub daily_revenue: Vec<DatedSum>,
    /// Descending by revenue, ties ascending by category.
    pub category_revenue_share: Vec<KeyedValue>,
    /// Descending by revenue, ties ascending by store.
    pub store_revenue_share: Vec<KeyedValue>,
    /// Descending by mean amount, ties ascending by store.
    pub store_avg_amount: Vec<KeyedValue>,
    /// Ascending by store, one row per store present.
    pub store_table: Vec<StoreRow>,
    /// Descending by quantity, ties ascending by category.
    pub quantity_by_category: Vec<QuantitySum>,
    /// Ascending by (category, store), one row per present pair.
    pub category_store_crosstab: Vec<CrosstabRow>,
    pub top_products: TopProducts,
    pub payment_modes: PaymentDistribution,
    /// Descending by mean score, ties ascending by store.
    pub satisfaction_by_store: Vec<KeyedValue>,
    /// Descending by mean score, ties ascending by category.
    pub satisfaction_by_category: Vec<KeyedValue>,
    /// Ascending by score.
    pub satisfaction_distribution: Vec<SatisfactionBucket>,
}
