use casegen_core::{
    audit_cases, generate, read_cases, write_cases, CaseId, ChangeDirection, ContextField,
    GenerateError, Generator, MetricKey, MetricSchema,
};
use casegen_test_utils::{fixed_config, standard_corpus, standard_validated_catalog};
use pretty_assertions::assert_eq;

#[test]
fn same_seed_is_byte_identical() {
    let first = serde_json::to_string_pretty(&standard_corpus(42, 5)).unwrap();
    let second = serde_json::to_string_pretty(&standard_corpus(42, 5)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    assert_ne!(standard_corpus(1, 5), standard_corpus(2, 5));
}

#[test]
fn fifty_records_with_contiguous_ids() {
    let cases = standard_corpus(42, 5);
    assert_eq!(cases.len(), 50);
    let ids: Vec<String> = cases.iter().map(|c| c.case_id.to_string()).collect();
    let expected: Vec<String> = (1..=50).map(|n| format!("C-{n:03}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn families_appear_in_catalog_order() {
    let catalog = standard_validated_catalog();
    let cases = standard_corpus(42, 5);
    let titles: Vec<&str> = cases.iter().step_by(5).map(|c| c.family.as_str()).collect();
    let expected: Vec<&str> = catalog
        .families()
        .iter()
        .map(|f| f.family.title.as_str())
        .collect();
    assert_eq!(titles, expected);
}

#[test]
fn records_carry_family_narrative() {
    let catalog = standard_validated_catalog();
    let cases = standard_corpus(42, 2);
    for case in &cases {
        let family = &catalog.find(&case.family).unwrap().family;
        assert_eq!(case.title, family.title);
        assert_eq!(case.signals, family.signals);
        assert_eq!(case.matched_signals_template, family.matched_template);
        assert_eq!(case.resolution_summary, family.resolution);
        assert_eq!(case.next_checks_hint, family.hints);
        assert!(MetricSchema::check(&case.metrics).is_ok());
    }
}

#[test]
fn timestamps_are_fixed_by_reference_time() {
    let catalog = standard_validated_catalog();
    let a = generate(&catalog, fixed_config(5, 3)).unwrap();
    let later = fixed_config(5, 3).with_reference_time(
        casegen_test_utils::fixed_reference_time() + chrono::TimeDelta::hours(1),
    );
    let b = generate(&catalog, later).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(y.created_at - x.created_at, chrono::TimeDelta::hours(1));
        assert_eq!(x.metrics, y.metrics);
    }
}

#[test]
fn metric_rendering_matches_schema() {
    let cases = standard_corpus(42, 1);
    let json = serde_json::to_value(&cases[0]).unwrap();
    let metrics = json["metrics"].as_object().unwrap();
    let mut keys: Vec<&str> = metrics.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "affected_lot_count",
            "change_magnitude",
            "measurement_confidence",
            "metric_variance",
            "rework_rate",
            "time_window_hours",
            "yield_pct",
        ]
    );
    assert!(metrics["affected_lot_count"].is_u64());
    assert!(metrics["time_window_hours"].is_u64());
    assert!(metrics["yield_pct"].is_f64());
    assert!(json["created_at"].as_str().unwrap().ends_with('Z'));
    assert_eq!(json["case_id"], "C-001");
}

#[test]
fn zero_direction_has_zero_change() {
    let cases = standard_corpus(8, 5);
    for case in cases.iter().filter(|c| c.signals.change_dir == ChangeDirection::Zero) {
        assert_eq!(case.metrics[&MetricKey::ChangeMagnitude].as_f64(), 0.0);
    }
}

#[test]
fn constrained_families_stay_in_allow_lists() {
    let cases = standard_corpus(17, 20);
    for case in cases.iter().filter(|c| c.family.starts_with("Etch cluster")) {
        assert!(case.context.get(ContextField::ToolGroup).starts_with("ETCH-CLUSTER"));
        assert_eq!(case.context.process_step, "etch");
    }
}

#[test]
fn corpus_survives_sink_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("realistic_cases.json");
    let cases = standard_corpus(42, 5);
    write_cases(&path, &cases).unwrap();

    let loaded = read_cases(&path).unwrap();
    assert_eq!(loaded, cases);
    assert!(audit_cases(&loaded, &standard_validated_catalog()).is_clean());
}

#[test]
fn rewrite_replaces_previous_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cases.json");
    write_cases(&path, &standard_corpus(1, 5)).unwrap();
    write_cases(&path, &standard_corpus(2, 1)).unwrap();
    assert_eq!(read_cases(&path).unwrap().len(), 10);
}

#[test]
fn zero_repetitions_is_config_error() {
    let catalog = standard_validated_catalog();
    let err = generate(&catalog, fixed_config(42, 0)).unwrap_err();
    assert!(matches!(err, GenerateError::Config(_)));
}

#[test]
fn report_describes_run() {
    let catalog = standard_validated_catalog();
    let run = Generator::new(&catalog, fixed_config(42, 5)).unwrap().run().unwrap();
    assert_eq!(run.report.records, 50);
    assert_eq!(run.report.seed, 42);
    assert_eq!(run.report.first_case.as_deref(), Some("C-001"));
    assert_eq!(run.report.last_case.as_deref(), Some("C-050"));
    assert_eq!(run.cases.last().unwrap().case_id, CaseId(50));

    let json = serde_json::to_value(&run.report).unwrap();
    assert_eq!(json["families"].as_array().unwrap().len(), 10);
    assert_eq!(json["reference_time"], "2025-06-01T12:00:00Z");
}
