//! End-to-end profiling and chart selection

mod common;

use insightrs::stats::{classify, ColumnClass, EMPTY_KEY};
use insightrs::{ChartKind, InsightConfig, InsightSession};
use serde_json::Value;

fn session_with(text: &str) -> InsightSession {
    let mut session = InsightSession::default();
    session.load_str("data.csv", text).unwrap();
    session
}

#[test]
fn test_reference_example() {
    let session = session_with("a,b\n1,cat\n2,dog\n3,cat\n");
    let report = serde_json::to_value(session.report()).unwrap();

    assert_eq!(report["rowCount"], 3);
    assert_eq!(report["columns"], serde_json::json!(["a", "b"]));
    assert_eq!(report["dataset"][1], serde_json::json!({"a": "2", "b": "dog"}));

    let a = &report["profiles"]["numeric"]["a"];
    assert_eq!(a["count"], 3);
    assert_eq!(a["mean"], 2.0);
    assert_eq!(a["median"], 2.0);
    assert_eq!(a["min"], 1.0);
    assert_eq!(a["max"], 3.0);
    assert_eq!(a["stdev"], 0.816497);

    let b = &report["profiles"]["categorical"]["b"];
    assert_eq!(b["uniqueCount"], 2);
    assert_eq!(
        b["top"],
        serde_json::json!([{"value": "cat", "count": 2}, {"value": "dog", "count": 1}])
    );
}

#[test]
fn test_selector_order_through_session() {
    let text = "a,d,b,e,c\n1,x,4,p,7\n2,y,5,q,8\n3,x,6,p,9\n";
    let session = session_with(text);
    let kinds: Vec<(String, ChartKind)> = session
        .charts()
        .specs()
        .iter()
        .map(|s| (s.id.clone(), s.kind))
        .collect();

    assert_eq!(kinds.len(), 10);
    let expected = [
        ("hist_a", ChartKind::Histogram),
        ("hist_b", ChartKind::Histogram),
        ("hist_c", ChartKind::Histogram),
        ("bar_d", ChartKind::Bar),
        ("pie_d", ChartKind::Pie),
        ("bar_e", ChartKind::Bar),
        ("pie_e", ChartKind::Pie),
    ];
    for (i, (id, kind)) in expected.iter().enumerate() {
        assert_eq!(kinds[i].0, *id);
        assert_eq!(kinds[i].1, *kind);
    }
    // three scatter pairs fill the deck; no room for the matrix
    assert_eq!(kinds[9].0, "scatter_b_c");
}

#[test]
fn test_chart_cap_and_idempotence() {
    let headers: Vec<String> = (0..8).map(|i| format!("n{}", i)).collect();
    let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = (0..20)
        .map(|r| (0..8).map(|c| (r * (c + 1)).to_string()).collect())
        .collect();
    let mut session = session_with(&common::csv_text(&refs, &rows));

    let first = serde_json::to_string(session.charts()).unwrap();
    assert!(session.charts().len() <= 10);
    session.regenerate_charts();
    assert_eq!(first, serde_json::to_string(session.charts()).unwrap());
}

#[test]
fn test_classification_threshold() {
    let mut values = vec!["1"; 8];
    values.extend(["x", "y"]);
    assert_eq!(classify(&values, 0.8), ColumnClass::Numeric);
    assert_eq!(classify(&["1", "2", "3", "x"], 0.8), ColumnClass::Categorical);

    // empties are excluded from the ratio
    let session = session_with("v,w\n1,a\n,b\n2,c\n,d\n3,e\n4,f\nz,g\n");
    assert!(session.profiles().get("v").unwrap().is_numeric());
}

#[test]
fn test_numeric_column_with_words() {
    let session = session_with("v\n1\n2\n3\n4\nfive\n");
    let p = session.profiles().numeric_profile("v").unwrap();
    assert_eq!(p.count, 4);
    assert_eq!(p.median, 2.5);
    assert_eq!(p.histogram.iter().map(|b| b.count).sum::<usize>(), 4);
}

#[test]
fn test_empty_values_skipped_in_categorical_counts() {
    let session = session_with("k,n\nred,1\n,2\nred,3\nblue,4\n  ,5\n");
    let p = session.profiles().categorical_profile("k").unwrap();
    assert_eq!(p.unique_count, 2);
    assert_eq!(p.top[0].value, "red");
    assert_eq!(p.top[0].count, 2);
    assert!(p.top.iter().all(|t| t.value != EMPTY_KEY));
}

#[test]
fn test_correlation_queries() {
    let mut session = session_with(&common::sales_csv(40));
    let matrix = session.numeric_correlation().unwrap();
    assert_eq!(matrix.columns(), &["id", "value"]);
    assert!((matrix.get("id", "value").unwrap() - 1.0).abs() < 1e-9);

    let with_group = session.correlation_matrix(&["id", "group"]);
    assert_eq!(with_group.get("id", "group"), Some(0.0));

    let json: Value = serde_json::to_value(&matrix).unwrap();
    assert!(json["id"]["value"].is_number());

    session.reset();
    assert!(session.numeric_correlation().is_none());
}

#[test]
fn test_sequential_config_matches_parallel() {
    let text = common::sales_csv(300);
    let mut sequential = InsightSession::new(
        insightrs::InsightConfigBuilder::new()
            .parallel(false)
            .build()
            .unwrap(),
    );
    sequential.load_str("s.csv", &text).unwrap();
    let parallel = session_with(&text);

    assert_eq!(sequential.profiles(), parallel.profiles());
    assert_eq!(sequential.charts(), parallel.charts());
    assert_eq!(
        sequential.numeric_correlation(),
        parallel.numeric_correlation()
    );
    assert!(InsightConfig::default().parallel);
}
