use std::collections::BTreeMap;

use crate::data::filter::{FilterSpec, Snapshot};
use crate::data::model::{Dataset, TransactionRecord};

use super::bundle::{
    CategoryTopProducts, CrosstabRow, DatedSum, KeyedValue, Kpis, ModeCount,
    PaymentDistribution, ProductRank, QuantitySum, SatisfactionBucket, StoreRow, TopMode,
    TopProducts, ViewBundle,
};

/// How many products each category's ranking keeps.
const TOP_PRODUCTS_PER_CATEGORY: usize = 5;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// The pure query function: one dataset, one filter spec, one bundle.
pub fn run_query(dataset: &Dataset, spec: &FilterSpec) -> ViewBundle {
    aggregate(&spec.apply(dataset))
}

/// Compute every named view from a single snapshot, so the bundle reflects
/// exactly one filter state. Never fails; empty input yields each view's
/// zero/empty form.
pub fn aggregate(snapshot: &Snapshot<'_>) -> ViewBundle {
    ViewBundle {
        kpis: kpis(snapshot),
        daily_revenue: daily_revenue(snapshot),
        category_revenue_share: ranked_desc(sum_by(snapshot, |r| r.category.as_str(), |r| {
            r.amount
        })),
        store_revenue_share: ranked_desc(sum_by(snapshot, |r| r.store.as_str(), |r| r.amount)),
        store_avg_amount: ranked_desc(mean_by(snapshot, |r| r.store.as_str(), |r| r.amount)),
        store_table: store_table(snapshot),
        quantity_by_category: quantity_by_category(snapshot),
        category_store_crosstab: crosstab(snapshot),
        top_products: top_products(snapshot),
        payment_modes: payment_modes(snapshot),
        satisfaction_by_store: ranked_desc(mean_by(snapshot, |r| r.store.as_str(), |r| {
            f64::from(r.satisfaction)
        })),
        satisfaction_by_category: ranked_desc(mean_by(snapshot, |r| r.category.as_str(), |r| {
            f64::from(r.satisfaction)
        })),
        satisfaction_distribution: satisfaction_distribution(snapshot),
    }
}

// ---------------------------------------------------------------------------
// Grouping helpers
// ---------------------------------------------------------------------------

fn sum_by(
    snapshot: &Snapshot<'_>,
    key: fn(&TransactionRecord) -> &str,
    value: fn(&TransactionRecord) -> f64,
) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for rec in snapshot.records() {
        *totals.entry(key(rec).to_string()).or_insert(0.0) += value(rec);
    }
    totals
}

fn mean_by(
    snapshot: &Snapshot<'_>,
    key: fn(&TransactionRecord) -> &str,
    value: fn(&TransactionRecord) -> f64,
) -> BTreeMap<String, f64> {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for rec in snapshot.records() {
        let slot = acc.entry(key(rec).to_string()).or_insert((0.0, 0));
        slot.0 += value(rec);
        slot.1 += 1;
    }
    acc.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Descending by value; the stable sort over the map's ascending key order
/// gives the ascending-key tie-break.
fn ranked_desc(groups: BTreeMap<String, f64>) -> Vec<KeyedValue> {
    let mut rows: Vec<KeyedValue> = groups
        .into_iter()
        .map(|(key, value)| KeyedValue { key, value })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows
}

// ---------------------------------------------------------------------------
// Individual views
// ---------------------------------------------------------------------------

fn kpis(snapshot: &Snapshot<'_>) -> Kpis {
    let count = snapshot.len();
    let total_amount: f64 = snapshot.records().map(|r| r.amount).sum();
    let satisfaction_sum: f64 = snapshot.records().map(|r| f64::from(r.satisfaction)).sum();

    let (avg_amount, avg_satisfaction) = if count > 0 {
        (total_amount / count as f64, satisfaction_sum / count as f64)
    } else {
        (0.0, 0.0)
    };

    Kpis {
        total_amount,
        transaction_count: count,
        avg_amount,
        avg_satisfaction,
    }
}

/// Rows with a sentinel timestamp carry no calendar date and are excluded
/// here, and only here.
fn daily_revenue(snapshot: &Snapshot<'_>) -> Vec<DatedSum> {
    let mut days = BTreeMap::new();
    for rec in snapshot.records() {
        if let Some(date) = rec.calendar_date {
            *days.entry(date).or_insert(0.0) += rec.amount;
        }
    }
    days.into_iter()
        .map(|(date, total)| DatedSum { date, total })
        .collect()
}

fn store_table(snapshot: &Snapshot<'_>) -> Vec<StoreRow> {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for rec in snapshot.records() {
        let slot = acc.entry(rec.store.clone()).or_insert((0.0, 0));
        slot.0 += rec.amount;
        slot.1 += 1;
    }
    acc.into_iter()
        .map(|(store, (total, count))| StoreRow {
            store,
            total,
            count,
        })
        .collect()
}

fn quantity_by_category(snapshot: &Snapshot<'_>) -> Vec<QuantitySum> {
    let mut acc: BTreeMap<String, u64> = BTreeMap::new();
    for rec in snapshot.records() {
        *acc.entry(rec.category.clone()).or_insert(0) += rec.quantity;
    }
    let mut rows: Vec<QuantitySum> = acc
        .into_iter()
        .map(|(category, quantity)| QuantitySum { category, quantity })
        .collect();
    rows.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    rows
}

fn crosstab(snapshot: &Snapshot<'_>) -> Vec<CrosstabRow> {
    let mut acc: BTreeMap<(String, String), f64> = BTreeMap::new();
    for rec in snapshot.records() {
        *acc.entry((rec.category.clone(), rec.store.clone()))
            .or_insert(0.0) += rec.amount;
    }
    acc.into_iter()
        .map(|((category, store), total)| CrosstabRow {
            category,
            store,
            total,
        })
        .collect()
}

fn top_products(snapshot: &Snapshot<'_>) -> TopProducts {
    if !snapshot.has_product() {
        return TopProducts::Unavailable;
    }

    // category → product → summed quantity
    let mut acc: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for rec in snapshot.records() {
        let product = rec.product.clone().unwrap_or_default();
        *acc.entry(rec.category.clone())
            .or_default()
            .entry(product)
            .or_insert(0) += rec.quantity;
    }

    let categories = acc
        .into_iter()
        .map(|(category, products)| {
            let mut rows: Vec<(String, u64)> = products.into_iter().collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1));
            rows.truncate(TOP_PRODUCTS_PER_CATEGORY);
            CategoryTopProducts {
                category,
                products: rows
                    .into_iter()
                    .enumerate()
                    .map(|(i, (product, quantity))| ProductRank {
                        rank: i + 1,
                        product,
                        quantity,
                    })
                    .collect(),
            }
        })
        .collect();

    TopProducts::Available(categories)
}

fn payment_modes(snapshot: &Snapshot<'_>) -> PaymentDistribution {
    let mut acc: BTreeMap<String, usize> = BTreeMap::new();
    for rec in snapshot.records() {
        *acc.entry(rec.payment_mode.clone()).or_insert(0) += 1;
    }
    let total: usize = acc.values().sum();

    let mut modes: Vec<ModeCount> = acc
        .into_iter()
        .map(|(mode, count)| ModeCount { mode, count })
        .collect();
    modes.sort_by(|a, b| b.count.cmp(&a.count));

    // Sorted (count desc, mode asc), so the head is the deterministic
    // winner of any count tie.
    let top_mode = modes.first().map(|m| TopMode {
        mode: m.mode.clone(),
        share_pct: m.count as f64 / total as f64 * 100.0,
    });

    PaymentDistribution { modes, top_mode }
}

fn satisfaction_distribution(snapshot: &Snapshot<'_>) -> Vec<SatisfactionBucket> {
    let mut acc: BTreeMap<u8, usize> = BTreeMap::new();
    for rec in snapshot.records() {
        *acc.entry(rec.satisfaction).or_insert(0) += 1;
    }
    // Floor the denominator so an empty snapshot yields 0% rows instead of
    // a division fault.
    let denom = snapshot.len().max(1) as f64;
    acc.into_iter()
        .map(|(score, count)| SatisfactionBucket {
            score,
            count,
            pct: count as f64 / denom * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(
        store: &str,
        category: &str,
        amount: f64,
        quantity: u64,
        satisfaction: u8,
        day: u32,
        payment: &str,
        product: Option<&str>,
    ) -> TransactionRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, day);
        TransactionRecord {
            client_id: "c".into(),
            timestamp: date.and_then(|d| d.and_hms_opt(10, 0, 0)),
            amount,
            store: store.into(),
            category: category.into(),
            quantity,
            payment_mode: payment.into(),
            satisfaction,
            calendar_date: date,
            product: product.map(str::to_string),
        }
    }

    /// The three-record fixture: two stores, two categories, two days.
    fn scenario() -> Dataset {
        Dataset::from_records(
            vec![
                rec("storeA", "catX", 10.0, 2, 4, 1, "card", None),
                rec("storeA", "catY", 20.0, 1, 5, 2, "cash", None),
                rec("storeB", "catX", 30.0, 3, 3, 2, "card", None),
            ],
            false,
        )
    }

    #[test]
    fn store_filter_scenario() {
        let ds = scenario();
        let bundle = run_query(&ds, &FilterSpec::new().with_store("storeA"));

        assert_eq!(bundle.kpis.total_amount, 30.0);
        assert_eq!(bundle.kpis.transaction_count, 2);
        assert_eq!(bundle.kpis.avg_amount, 15.0);

        let shares: Vec<(&str, f64)> = bundle
            .category_revenue_share
            .iter()
            .map(|r| (r.key.as_str(), r.value))
            .collect();
        assert_eq!(shares, [("catY", 20.0), ("catX", 10.0)]);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let ds = scenario();
        let spec = FilterSpec::new().with_category("catX");
        assert_eq!(run_query(&ds, &spec), run_query(&ds, &spec));
    }

    #[test]
    fn store_table_partitions_the_kpis() {
        let ds = scenario();
        let bundle = run_query(&ds, &FilterSpec::new());

        let total: f64 = bundle.store_table.iter().map(|r| r.total).sum();
        let count: usize = bundle.store_table.iter().map(|r| r.count).sum();
        assert!((total - bundle.kpis.total_amount).abs() < 1e-9);
        assert_eq!(count, bundle.kpis.transaction_count);
    }

    #[test]
    fn empty_snapshot_yields_zero_forms() {
        let ds = scenario();
        let bundle = run_query(&ds, &FilterSpec::new().with_store("storeC"));

        assert_eq!(bundle.kpis, Kpis::default());
        assert!(bundle.daily_revenue.is_empty());
        assert!(bundle.category_revenue_share.is_empty());
        assert!(bundle.store_table.is_empty());
        assert!(bundle.category_store_crosstab.is_empty());
        assert!(bundle.payment_modes.modes.is_empty());
        assert_eq!(bundle.payment_modes.top_mode, None);
        assert!(bundle.satisfaction_distribution.is_empty());
        assert_eq!(bundle.top_products, TopProducts::Unavailable);
    }

    #[test]
    fn daily_revenue_is_ascending_and_skips_sentinel_rows() {
        let mut records = vec![
            rec("storeA", "catX", 10.0, 1, 4, 2, "card", None),
            rec("storeA", "catX", 5.0, 1, 4, 1, "card", None),
        ];
        let mut orphan = rec("storeA", "catX", 99.0, 1, 4, 1, "card", None);
        orphan.timestamp = None;
        orphan.calendar_date = None;
        records.push(orphan);

        let ds = Dataset::from_records(records, false);
        let bundle = run_query(&ds, &FilterSpec::new());

        let days: Vec<(NaiveDate, f64)> = bundle
            .daily_revenue
            .iter()
            .map(|r| (r.date, r.total))
            .collect();
        assert_eq!(
            days,
            [
                (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5.0),
                (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 10.0),
            ]
        );
        // The sentinel row still counts everywhere else.
        assert_eq!(bundle.kpis.total_amount, 114.0);
        assert_eq!(bundle.kpis.transaction_count, 3);
    }

    #[test]
    fn revenue_ties_break_by_ascending_key() {
        let ds = Dataset::from_records(
            vec![
                rec("storeB", "catB", 10.0, 1, 3, 1, "card", None),
                rec("storeA", "catA", 10.0, 1, 3, 1, "card", None),
            ],
            false,
        );
        let bundle = run_query(&ds, &FilterSpec::new());
        let keys: Vec<&str> = bundle
            .store_revenue_share
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(keys, ["storeA", "storeB"]);
    }

    #[test]
    fn crosstab_has_one_row_per_present_pair() {
        let ds = scenario();
        let bundle = run_query(&ds, &FilterSpec::new());
        let pairs: Vec<(&str, &str, f64)> = bundle
            .category_store_crosstab
            .iter()
            .map(|r| (r.category.as_str(), r.store.as_str(), r.total))
            .collect();
        assert_eq!(
            pairs,
            [
                ("catX", "storeA", 10.0),
                ("catX", "storeB", 30.0),
                ("catY", "storeA", 20.0),
            ]
        );
    }

    #[test]
    fn top_products_ranks_five_per_category() {
        let records = (0..7u64)
            .map(|i| {
                let mut r = rec("storeA", "catX", 1.0, 10 - i, 3, 1, "card", None);
                r.product = Some(format!("p{i}"));
                r
            })
            .collect();
        let ds = Dataset::from_records(records, true);
        let bundle = run_query(&ds, &FilterSpec::new());

        let TopProducts::Available(cats) = &bundle.top_products else {
            panic!("product column present");
        };
        assert_eq!(cats.len(), 1);
        let ranks = &cats[0].products;
        assert_eq!(ranks.len(), 5);
        assert_eq!(ranks[0].rank, 1);
        assert_eq!(ranks[0].product, "p0");
        assert_eq!(ranks[0].quantity, 10);
        assert_eq!(ranks[4].rank, 5);
        assert_eq!(ranks[4].product, "p4");
    }

    #[test]
    fn missing_product_column_yields_the_marker() {
        let ds = scenario();
        let bundle = run_query(&ds, &FilterSpec::new());
        assert_eq!(bundle.top_products, TopProducts::Unavailable);
    }

    #[test]
    fn top_mode_tie_resolves_lexicographically() {
        let ds = Dataset::from_records(
            vec![
                rec("storeA", "catX", 1.0, 1, 3, 1, "voucher", None),
                rec("storeA", "catX", 1.0, 1, 3, 1, "card", None),
            ],
            false,
        );
        let bundle = run_query(&ds, &FilterSpec::new());
        let top = bundle.payment_modes.top_mode.unwrap();
        assert_eq!(top.mode, "card");
        assert!((top.share_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn satisfaction_distribution_normalizes_to_100() {
        let ds = scenario();
        let bundle = run_query(&ds, &FilterSpec::new());

        let scores: Vec<u8> = bundle
            .satisfaction_distribution
            .iter()
            .map(|b| b.score)
            .collect();
        assert_eq!(scores, [3, 4, 5]);

        let pct_sum: f64 = bundle.satisfaction_distribution.iter().map(|b| b.pct).sum();
        assert!((pct_sum - 100.0).abs() < 0.01);
    }

    #[test]
    fn mean_views_average_per_group() {
        let ds = Dataset::from_records(
            vec![
                rec("storeA", "catX", 10.0, 1, 2, 1, "card", None),
                rec("storeA", "catX", 20.0, 1, 4, 1, "card", None),
                rec("storeB", "catX", 5.0, 1, 5, 1, "card", None),
            ],
            false,
        );
        let bundle = run_query(&ds, &FilterSpec::new());

        let avg: Vec<(&str, f64)> = bundle
            .store_avg_amount
            .iter()
            .map(|r| (r.key.as_str(), r.value))
            .collect();
        assert_eq!(avg, [("storeA", 15.0), ("storeB", 5.0)]);

        let sat: Vec<(&str, f64)> = bundle
            .satisfaction_by_store
            .iter()
            .map(|r| (r.key.as_str(), r.value))
            .collect();
        assert_eq!(sat, [("storeB", 5.0), ("storeA", 3.0)]);
    }
}
