//! Integration tests for chained table transformations.
//!
//! Each test walks through one chaining idiom against the stock-price
//! fixture, first with direct `TableExt` chaining and, where it adds
//! something, as a `Pipeline`.

use frame_chain::{
    ChainError, ColumnSelector, Derivations, DtypeCategory, FanOut, Pipeline, PipelineConfig,
    RowPredicate, StepKind, StepObserver, StepReport, TableExt, if_else, read_table, row_sum,
    select_choice,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_table(filename: &str) -> DataFrame {
    read_table(fixtures_path().join(filename), &PipelineConfig::default())
        .expect("Failed to read fixture")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.expect("unexpected null"))
        .collect()
}

fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_fixture_types() {
    let df = load_table("table_1.csv");

    assert_eq!(df.shape(), (30, 7));
    assert_eq!(df.column("Open").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("Volume").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("MixedTypes").unwrap().dtype(), &DataType::String);
    // empty fields and the NA marker
    assert_eq!(df.column("MixedTypes").unwrap().null_count(), 12);
}

#[test]
fn test_chapter_six_fixture() {
    let df = load_table("tab_6_4.csv");
    let first = df.get_columns()[0].as_materialized_series().f64().unwrap().get(0);
    assert_eq!(first, Some(0.80));
}

// ============================================================================
// Deriving Columns
// ============================================================================

#[test]
fn test_derive_single_column() {
    let df = load_table("table_1.csv")
        .derive_columns(Derivations::new().expr("OpenCloseRange", col("Open") - col("Close")))
        .unwrap();

    assert!(names(&df).contains(&"OpenCloseRange".to_string()));
    assert_close(f64_values(&df, "OpenCloseRange")[0], 156.63 - 154.88);
}

#[test]
fn test_derive_batch_uses_earlier_entries() {
    let original = load_table("table_1.csv");
    let df = original
        .derive_columns(
            Derivations::new()
                .expr("OpenCloseRange", col("Open") - col("Close"))
                .expr("OpenCloseRangeAbs", col("OpenCloseRange").abs()),
        )
        .unwrap();

    assert_eq!(df.height(), original.height());
    assert_eq!(df.width(), original.width() + 2);
    for (range, abs) in f64_values(&df, "OpenCloseRange")
        .into_iter()
        .zip(f64_values(&df, "OpenCloseRangeAbs"))
    {
        assert_close(abs, range.abs());
    }
}

// ============================================================================
// Inspecting Within a Chain
// ============================================================================

#[derive(Default)]
struct PreviewCollector {
    previews: Mutex<Vec<(String, Vec<String>, usize)>>,
    reports: Mutex<Vec<StepReport>>,
}

impl StepObserver for PreviewCollector {
    fn on_step(&self, report: &StepReport) {
        self.reports.lock().unwrap().push(report.clone());
    }

    fn on_inspect(&self, label: &str, preview: &DataFrame) {
        self.previews
            .lock()
            .unwrap()
            .push((label.to_string(), names(preview), preview.height()));
    }
}

#[test]
fn test_inspect_before_and_after() {
    init_tracing();
    let collector = Arc::new(PreviewCollector::default());

    let df = Pipeline::builder()
        .inspect_rows("DataFrame before", 3)
        .derive(Derivations::new().expr("OpenCloseRange", col("Open") - col("Close")))
        .inspect_rows("DataFrame after", 3)
        .observer(collector.clone())
        .build()
        .unwrap()
        .run_file(fixtures_path().join("table_1.csv"))
        .unwrap();

    assert!(names(&df).contains(&"OpenCloseRange".to_string()));
    assert_eq!(df.height(), 30);

    let previews = collector.previews.lock().unwrap();
    assert_eq!(previews.len(), 2);
    assert_eq!(previews[0].0, "DataFrame before");
    assert!(!previews[0].1.contains(&"OpenCloseRange".to_string()));
    assert!(previews[1].1.contains(&"OpenCloseRange".to_string()));
    assert_eq!(previews[1].2, 3);

    let kinds: Vec<StepKind> = collector
        .reports
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![StepKind::Inspect, StepKind::Derive, StepKind::Inspect]
    );
}

// ============================================================================
// Querying Rows
// ============================================================================

#[test]
fn test_chained_row_queries() {
    const MIN_VOLUME: i64 = 50_000_000;

    let df = load_table("table_1.csv")
        .filter_expr(col("Open").gt(lit(160)))
        .unwrap()
        .filter_expr(col("Close").gt(lit(160)))
        .unwrap()
        .filter_expr(col("Volume").gt(lit(MIN_VOLUME)))
        .unwrap()
        .filter_expr(col("Open").gt(lit(165)).or(col("Close").gt(lit(165))))
        .unwrap()
        .filter_expr(col("Low").gt(lit(160)).and(col("Close").gt(lit(160))))
        .unwrap()
        .filter_rows(RowPredicate::mask(|t| {
            Ok(t.column("Volume")?.as_materialized_series().gt(0)?)
        }))
        .unwrap()
        .filter_expr(col("MixedTypes").is_null())
        .unwrap();

    assert!(df.height() < 20);
    assert_eq!(
        str_values(&df, "Date"),
        vec![
            Some("2023-03-25".to_string()),
            Some("2023-03-30".to_string())
        ]
    );
}

#[test]
fn test_filter_keeps_only_matching_rows() {
    let original = load_table("table_1.csv");
    let df = original
        .filter_expr(col("Volume").gt(lit(50_000_000i64)))
        .unwrap();

    assert!(df.height() <= original.height());
    assert_eq!(df.height(), 23);
    assert!(f64_values(&df, "Volume").iter().all(|v| *v > 50_000_000.0));
}

// ============================================================================
// Element-wise Choice
// ============================================================================

#[test]
fn test_where_and_select_choice() {
    let range = select_choice(
        vec![
            col("Open").gt(lit(165)),
            col("Open").gt_eq(lit(164)),
            col("Open").gt_eq(lit(162)),
        ],
        vec![lit("above 165"), lit("range 164-165"), lit("range 162-164")],
        lit("below 162"),
    )
    .unwrap();

    let df = load_table("table_1.csv")
        .derive_columns(
            Derivations::new()
                .expr(
                    "OpenAbove165",
                    if_else(col("Open").gt(lit(165)), lit(true), lit(false)),
                )
                .expr("OpenRange", range),
        )
        .unwrap();

    let count = |label: &str| {
        str_values(&df, "OpenRange")
            .iter()
            .filter(|v| v.as_deref() == Some(label))
            .count()
    };
    assert_eq!(count("above 165"), 1);
    assert_eq!(count("range 164-165"), 4);
    assert_eq!(count("range 162-164"), 5);
    assert_eq!(count("below 162"), 20);

    let above = df.column("OpenAbove165").unwrap().as_materialized_series();
    assert_eq!(above.bool().unwrap().sum(), Some(1));
}

// ============================================================================
// Splitting Columns
// ============================================================================

#[test]
fn test_split_two_words() {
    let df = load_table("table_1.csv")
        .filter_rows(RowPredicate::mask(|t| {
            let mixed = t.column("MixedTypes")?.as_materialized_series().str()?;
            Ok(mixed
                .into_iter()
                .map(|v| Some(v.is_some_and(|s| s.contains(' '))))
                .collect())
        }))
        .unwrap()
        .split_column("MixedTypes", " ", &["FirstWord", "SecondWord"])
        .unwrap();

    assert_eq!(df.height(), 10);
    let first = str_values(&df, "FirstWord");
    let second = str_values(&df, "SecondWord");
    assert_eq!(first[0].as_deref(), Some("hello"));
    assert_eq!(second[0].as_deref(), Some("world"));

    for ((mixed, a), b) in str_values(&df, "MixedTypes").into_iter().zip(first).zip(second) {
        assert_eq!(mixed.unwrap(), format!("{} {}", a.unwrap(), b.unwrap()));
    }
}

#[test]
fn test_split_without_prefilter_is_strict() {
    let error = Pipeline::builder()
        .split("MixedTypes", " ", ["FirstWord", "SecondWord"])
        .build()
        .unwrap()
        .run(&load_table("table_1.csv"))
        .unwrap_err();

    // "42" on the second row splits into a single part
    assert!(matches!(
        error.root(),
        ChainError::SplitArity {
            row: 1,
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

// ============================================================================
// Multi-output Functions
// ============================================================================

fn volume_scale() -> FanOut {
    FanOut::numeric("Volume", ["VolumeK", "VolumeM"], |x| vec![x / 1e3, x / 1e6])
}

#[test]
fn test_multi_output_after_filter() {
    let df = load_table("table_1.csv")
        .filter_expr(col("Volume").gt(lit(50_000_000i64)))
        .unwrap()
        .multi_output(&volume_scale())
        .unwrap();

    assert!(names(&df).contains(&"VolumeK".to_string()));
    assert!(names(&df).contains(&"VolumeM".to_string()));

    let volume = f64_values(&df, "Volume");
    for (i, (k, m)) in f64_values(&df, "VolumeK")
        .into_iter()
        .zip(f64_values(&df, "VolumeM"))
        .enumerate()
    {
        assert_close(k, volume[i] / 1e3);
        assert_close(m, volume[i] / 1e6);
    }
}

#[test]
fn test_multi_output_keeps_row_index_aligned() {
    let config = PipelineConfig::builder()
        .row_index_column("idx")
        .build()
        .unwrap();
    let original = read_table(fixtures_path().join("table_1.csv"), &config).unwrap();
    let original_volume = f64_values(&original, "Volume");

    let df = Pipeline::builder()
        .config(config)
        .filter(col("Volume").gt(lit(50_000_000i64)))
        .fan_out(volume_scale())
        .build()
        .unwrap()
        .run(&original)
        .unwrap();

    let idx = f64_values(&df, "idx");
    assert_eq!(idx[0], 0.0);
    assert_eq!(idx[1], 2.0); // row 1 has less volume
    for (position, k) in idx.into_iter().zip(f64_values(&df, "VolumeK")) {
        assert_close(k, original_volume[position as usize] / 1e3);
    }
}

// ============================================================================
// Operating on Column Subsets
// ============================================================================

#[test]
fn test_prefix_versus_substring_sum() {
    let df = load_table("table_1.csv")
        .derive_columns(
            Derivations::new()
                .expr("Close1", col("Close") + lit(1))
                .expr("Close2", col("Close") + lit(2))
                .expr("Close3", col("Close") + lit(3))
                .expr("OpenNotClose", col("Open")),
        )
        .unwrap()
        .derive_columns(
            Derivations::new()
                .func("WrongSum0123", |t| {
                    Ok(row_sum(t, &ColumnSelector::contains("Close"))?)
                })
                .func("CloseSum0123", |t| {
                    Ok(row_sum(t, &ColumnSelector::regex("^Close"))?)
                }),
        )
        .unwrap();

    let close = f64_values(&df, "Close")[0];
    let open = f64_values(&df, "Open")[0];
    let first = |name: &str| f64_values(&df, name)[0];

    assert_close(
        first("CloseSum0123"),
        close + first("Close1") + first("Close2") + first("Close3"),
    );
    assert_close(first("WrongSum0123"), first("CloseSum0123") + open);
}

#[test]
fn test_prefix_and_contains_selections_differ() {
    let df = load_table("table_1.csv")
        .derive_columns(
            Derivations::new()
                .expr("Close1", col("Close") + lit(1))
                .expr("Close2", col("Close") + lit(2))
                .expr("Close3", col("Close") + lit(3))
                .expr("OpenNotClose", col("Open")),
        )
        .unwrap();

    let prefixed = df.keep_columns(&ColumnSelector::prefix("Close")).unwrap();
    let contained = df.keep_columns(&ColumnSelector::contains("Close")).unwrap();

    assert_eq!(names(&prefixed), vec!["Close", "Close1", "Close2", "Close3"]);
    assert_eq!(
        names(&contained),
        vec!["Close", "Close1", "Close2", "Close3", "OpenNotClose"]
    );

    let again = prefixed
        .keep_columns(&ColumnSelector::regex("^Close"))
        .unwrap();
    assert!(again.equals(&prefixed));
}

// ============================================================================
// Keeping Columns by Value
// ============================================================================

#[test]
fn test_keep_columns_by_mean() {
    let df = load_table("table_1.csv").keep_columns_by_mean(200.0).unwrap();

    for dropped in ["Open", "High", "Low", "Close"] {
        assert!(!names(&df).contains(&dropped.to_string()));
    }
    assert_eq!(names(&df), vec!["Date", "Volume", "MixedTypes"]);
    assert_eq!(df.height(), 30);
}

#[test]
fn test_keep_columns_by_mean_as_step() {
    let run = Pipeline::builder()
        .keep_columns_by_mean(200.0)
        .select(ColumnSelector::exclude([DtypeCategory::Text]))
        .build()
        .unwrap()
        .run_traced(&load_table("table_1.csv"))
        .unwrap();

    assert_eq!(names(&run.table), vec!["Volume"]);
    assert_eq!(run.reports[0].columns_before, 7);
    assert_eq!(run.reports[0].columns_after, 3);
}

// ============================================================================
// Error Propagation
// ============================================================================

#[test]
fn test_unknown_column_aborts_pipeline() {
    let error = Pipeline::builder()
        .derive(Derivations::new().expr("Range", col("Open") - col("Close")))
        .select(ColumnSelector::names(["Range", "Adjusted"]))
        .fan_out(volume_scale())
        .build()
        .unwrap()
        .run(&load_table("table_1.csv"))
        .unwrap_err();

    assert!(matches!(error.root(), ChainError::UnknownColumn(name) if name == "Adjusted"));
    assert!(error.to_string().contains("step 2"));

    let json = serde_json::to_string(&error).unwrap();
    assert!(json.contains("UNKNOWN_COLUMN"));
}
