//! End-to-end: write a CSV to disk, load it, run filtered queries, and
//! check the bundle against hand-computed figures.

use std::path::PathBuf;

use chrono::NaiveDate;
use rusty_tally::{load_file, run_query, FilterSpec, LoadError};

fn temp_csv(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rusty-tally-{}-{name}.csv", std::process::id()));
    std::fs::write(&path, contents).expect("writing fixture");
    path
}

const TABLE: &str = "\
client_id,timestamp,amount,store,category,quantity,payment_mode,satisfaction
C001,2024-01-01 09:15:00,10,storeA,catX,2,card,4
C002,2024-01-02 11:30:00,20,storeA,catY,1,cash,5
C003,2024-01-02 23:59:59,30,storeB,catX,3,card,3
";

#[test]
fn filtered_query_end_to_end() {
    let path = temp_csv("scenario", TABLE);
    let dataset = load_file(&path).expect("load");
    std::fs::remove_file(&path).ok();

    assert_eq!(dataset.len(), 3);
    assert_eq!(
        dataset.date_range(),
        Some((
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        ))
    );

    let bundle = run_query(&dataset, &FilterSpec::new().with_store("storeA"));
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
fn end_date_keeps_the_last_instant_of_the_day() {
    let path = temp_csv("end-date", TABLE);
    let dataset = load_file(&path).expect("load");
    std::fs::remove_file(&path).ok();

    let spec = FilterSpec::new().with_dates(None, NaiveDate::from_ymd_opt(2024, 1, 2));
    let bundle = run_query(&dataset, &spec);
    // The 23:59:59 record on Jan 2 is inside the range.
    assert_eq!(bundle.kpis.transaction_count, 3);
}

#[test]
fn bundle_serializes_to_json() {
    let path = temp_csv("serialize", TABLE);
    let dataset = load_file(&path).expect("load");
    std::fs::remove_file(&path).ok();

    let bundle = run_query(&dataset, &FilterSpec::new());
    let json = serde_json::to_string(&bundle).expect("serialize");
    assert!(json.contains("\"transaction_count\":3"));
    assert!(json.contains("\"status\":\"Unavailable\""));
}

#[test]
fn missing_quantity_column_is_a_schema_error() {
    let path = temp_csv(
        "schema",
        "client_id,timestamp,amount,store,category,payment_mode,satisfaction\n",
    );
    let result = load_file(&path);
    std::fs::remove_file(&path).ok();

    match result {
        Err(LoadError::Schema { missing, .. }) => assert_eq!(missing, ["quantity"]),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn absent_source_is_fatal() {
    let path = std::env::temp_dir().join("rusty-tally-does-not-exist.csv");
    assert!(matches!(
        load_file(&path),
        Err(LoadError::SourceNotFound { .. })
    ));
}
