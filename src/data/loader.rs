use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{Dataset, TransactionRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Startup-time load failures. Once a `Dataset` exists, nothing downstream
/// can fail: every row-level anomaly was repaired here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source table not found: {path}")]
    SourceNotFound { path: String },

    #[error("missing required columns {missing:?}; expected exactly {expected:?}")]
    Schema {
        missing: Vec<String>,
        expected: Vec<String>,
    },

    #[error("opening {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reading source table")]
    Csv(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Required columns, matched case- and name-exact against the CSV header.
/// Non-matching header names are ignored, never aliased.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "client_id",
    "timestamp",
    "amount",
    "store",
    "category",
    "quantity",
    "payment_mode",
    "satisfaction",
];

/// Optional column enabling the per-category top-products view.
pub const PRODUCT_FIELD: &str = "product";

/// Resolved header positions for the required columns, in
/// [`REQUIRED_FIELDS`] order, plus the optional product column.
struct Columns {
    required: [usize; 8],
    product: Option<usize>,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns, LoadError> {
    let mut required = [0usize; 8];
    let mut missing = Vec::new();

    for (slot, name) in required.iter_mut().zip(REQUIRED_FIELDS) {
        match headers.iter().position(|h| h == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(LoadError::Schema {
            missing,
            expected: REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(Columns {
        required,
        product: headers.iter().position(|h| h == PRODUCT_FIELD),
    })
}

// ---------------------------------------------------------------------------
// Per-field coercion rules
// ---------------------------------------------------------------------------

/// Outcome of one cell coercion. Rules never fail; a malformed or missing
/// cell is repaired to its documented default and tagged so the loader can
/// account for it.
enum Coerced<T> {
    Parsed(T),
    Repaired(T),
}

impl<T> Coerced<T> {
    fn tally(self, repairs: &mut usize) -> T {
        match self {
            Coerced::Parsed(v) => v,
            Coerced::Repaired(v) => {
                *repairs += 1;
                v
            }
        }
    }
}

/// Free text; missing cells repair to the empty string.
fn coerce_text(raw: Option<&str>) -> Coerced<String> {
    match raw {
        Some(s) => Coerced::Parsed(s.trim().to_string()),
        None => Coerced::Repaired(String::new()),
    }
}

/// Non-negative amount; anything unparsable, non-finite, or negative
/// repairs to 0.0.
fn coerce_money(raw: Option<&str>) -> Coerced<f64> {
    match raw.and_then(|s| s.trim().parse::<f64>().ok()) {
        Some(v) if v.is_finite() && v >= 0.0 => Coerced::Parsed(v),
        _ => Coerced::Repaired(0.0),
    }
}

/// Non-negative integer count; fractional input truncates (a repair),
/// everything else repairs to 0.
fn coerce_count(raw: Option<&str>) -> Coerced<u64> {
    let raw = raw.map(str::trim);
    if let Some(v) = raw.and_then(|s| s.parse::<u64>().ok()) {
        return Coerced::Parsed(v);
    }
    match raw.and_then(|s| s.parse::<f64>().ok()) {
        Some(v) if v.is_finite() && v >= 0.0 => Coerced::Repaired(v as u64),
        _ => Coerced::Repaired(0),
    }
}

/// Satisfaction score in 0–5; fractional input truncates and out-of-range
/// input clamps (both repairs), unparsable input repairs to 0.
fn coerce_score(raw: Option<&str>) -> Coerced<u8> {
    let raw = raw.map(str::trim);
    if let Some(v) = raw.and_then(|s| s.parse::<i64>().ok()) {
        return if (0..=5).contains(&v) {
            Coerced::Parsed(v as u8)
        } else {
            Coerced::Repaired(v.clamp(0, 5) as u8)
        };
    }
    match raw.and_then(|s| s.parse::<f64>().ok()) {
        Some(v) if v.is_finite() => Coerced::Repaired((v as i64).clamp(0, 5) as u8),
        _ => Coerced::Repaired(0),
    }
}

/// Date-time in `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, or date-only
/// `YYYY-MM-DD` form. Unparsable cells repair to the `None` sentinel;
/// aggregation excludes those rows from date-keyed views only.
fn coerce_timestamp(raw: Option<&str>) -> Coerced<Option<NaiveDateTime>> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Coerced::Repaired(None);
    };
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Coerced::Parsed(Some(ts));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        // Midnight is well-defined for every calendar date.
        return Coerced::Parsed(d.and_hms_opt(0, 0, 0));
    }
    Coerced::Repaired(None)
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and validate the source table from a CSV file.
///
/// Fatal failures: the file being absent ([`LoadError::SourceNotFound`])
/// and required columns missing from the header ([`LoadError::Schema`]).
/// Cell-level problems are never fatal; they repair to defaults.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::SourceNotFound {
            path: path.display().to_string(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let dataset = from_reader(file)?;
    log::info!(
        "loaded {} transactions from {} (product column: {})",
        dataset.len(),
        path.display(),
        dataset.has_product()
    );
    Ok(dataset)
}

/// Load a dataset from any CSV byte stream. Used by [`load_file`] and by
/// tests feeding in-memory tables.
pub fn from_reader<R: Read>(rdr: R) -> Result<Dataset, LoadError> {
    // Ragged rows are not fatal: a short row's missing cells reach the
    // coercion rules as absent values and repair to defaults.
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    // One rule per field, applied uniformly to every row. A new column is
    // a new (header name, rule) pair here, not a new branch.
    let [ix_client, ix_ts, ix_amount, ix_store, ix_cat, ix_qty, ix_pay, ix_sat] =
        columns.required;

    let mut records = Vec::new();
    let mut repairs = 0usize;

    for row in reader.records() {
        let row = row?;
        let cell = |idx: usize| row.get(idx);

        let timestamp = coerce_timestamp(cell(ix_ts)).tally(&mut repairs);
        records.push(TransactionRecord {
            client_id: coerce_text(cell(ix_client)).tally(&mut repairs),
            timestamp,
            amount: coerce_money(cell(ix_amount)).tally(&mut repairs),
            store: coerce_text(cell(ix_store)).tally(&mut repairs),
            category: coerce_text(cell(ix_cat)).tally(&mut repairs),
            quantity: coerce_count(cell(ix_qty)).tally(&mut repairs),
            payment_mode: coerce_text(cell(ix_pay)).tally(&mut repairs),
            satisfaction: coerce_score(cell(ix_sat)).tally(&mut repairs),
            calendar_date: timestamp.map(|ts| ts.date()),
            product: columns
                .product
                .map(|idx| coerce_text(cell(idx)).tally(&mut repairs)),
        });
    }

    if repairs > 0 {
        log::warn!("repaired {repairs} malformed cells to defaults");
    }

    Ok(Dataset::from_records(records, columns.product.is_some()))
}
