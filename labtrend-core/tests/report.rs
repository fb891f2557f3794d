use chrono::NaiveDate;
use labtrend_core::{
    Category, Evaluator, FreshnessLevel, GuidanceAction, HistoryPoint, LabConfig, Metric, Status,
    Trend,
};

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("ngày không hợp lệ")
}

fn metric(
    id: &str,
    category: Category,
    recorded: Status,
    last_updated: &str,
    history: &[(&str, f64)],
) -> Metric {
    let history: Vec<HistoryPoint> = history
        .iter()
        .map(|(date, value)| HistoryPoint {
            date: day(date),
            value: *value,
        })
        .collect();
    Metric {
        id: id.to_string(),
        name: id.to_uppercase(),
        value: history.last().map(|point| point.value).unwrap_or_default(),
        unit: "mg/dL".to_string(),
        status: recorded,
        category,
        last_updated: day(last_updated),
        history,
        description: None,
    }
}

fn panel() -> Vec<Metric> {
    vec![
        metric(
            "glucose",
            Category::Blood,
            Status::Balanced,
            "2023-04-15",
            &[("2023-03-15", 97.0), ("2023-04-15", 95.0)],
        ),
        metric(
            "ldl",
            Category::Blood,
            Status::Manage,
            "2023-04-15",
            &[("2023-03-15", 145.0), ("2023-04-15", 142.0)],
        ),
        metric(
            "bp",
            Category::Heart,
            Status::Manage,
            "2023-04-10",
            &[("2023-04-10", 128.0)],
        ),
    ]
}

#[test]
fn report_derives_status_from_classifier() {
    let evaluator = Evaluator::default();
    let report = evaluator
        .report("Alex", &panel(), &["Cholesterol".to_string()])
        .expect("Không tạo được báo cáo");

    assert_eq!(report.as_of, day("2023-04-15"));
    assert_eq!(report.patient, "Alex");

    let ldl = report.evaluation("ldl").expect("có ldl");
    assert_eq!(ldl.status, Status::Consult);
    assert_eq!(ldl.recorded_status, Status::Manage);
    assert!(ldl.status_mismatch);
    assert_eq!(ldl.classification.label, "Borderline high");
    assert_eq!(ldl.action, GuidanceAction::BookConsultation);

    let glucose = report.evaluation("glucose").expect("có glucose");
    assert!(!glucose.status_mismatch);

    let bp = report.evaluation("bp").expect("có bp");
    assert_eq!(bp.trend, Trend::Insufficient { samples: 1 });
    assert_eq!(bp.days_since_update, 5);

    assert_eq!(report.status_counts.balanced, 1);
    assert_eq!(report.status_counts.manage, 1);
    assert_eq!(report.status_counts.consult, 1);
    assert_eq!(report.status_counts.book, 0);

    // glucose giảm khi balanced là đáng lo, ldl giảm khi consult là cải thiện.
    assert_eq!(report.trend_tally.worsening, 1);
    assert_eq!(report.trend_tally.improving, 1);
    assert_eq!(report.trend_tally.insufficient, 1);

    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].category, Category::Blood);
    assert_eq!(report.groups[0].metric_ids, ["glucose", "ldl"]);
    assert_eq!(report.groups[1].title, "Heart & cholesterol");

    assert_eq!(report.attention().count(), 2);
    assert_eq!(report.preferences, ["Cholesterol"]);
}

#[test]
fn stale_metrics_need_booking() {
    let evaluator = Evaluator::with_config(LabConfig {
        as_of: Some(day("2023-12-01")),
        ..LabConfig::default()
    });
    let report = evaluator.report("Alex", &panel(), &[]).expect("báo cáo");

    assert!(report
        .evaluations
        .iter()
        .all(|evaluation| evaluation.status == Status::Book));
    assert_eq!(report.status_counts.book, 3);
    assert_eq!(
        report.evaluation("glucose").map(|e| e.action),
        Some(GuidanceAction::ScheduleTest)
    );

    assert_eq!(report.freshness.level, FreshnessLevel::Overdue);
    assert_eq!(report.freshness.days_since, Some(230));
    assert_eq!(report.freshness.progress_pct, 100.0);
    assert_eq!(report.freshness.last_test_name.as_deref(), Some("GLUCOSE"));
}

#[test]
fn freshness_levels_follow_thresholds() {
    let metrics = panel();
    let at = |date: &str| {
        Evaluator::with_config(LabConfig {
            as_of: Some(day(date)),
            ..LabConfig::default()
        })
        .freshness(&metrics, day(date))
    };

    let fresh = at("2023-05-15");
    assert_eq!(fresh.level, FreshnessLevel::Fresh);
    assert_eq!(fresh.days_since, Some(30));
    assert!((fresh.progress_pct - 100.0 / 3.0).abs() < 1e-9);

    assert_eq!(at("2023-08-14").level, FreshnessLevel::Due);
    assert_eq!(at("2023-10-12").level, FreshnessLevel::Due);
    assert_eq!(at("2023-10-13").level, FreshnessLevel::Overdue);
}

#[test]
fn empty_panel_reports_without_tests() {
    let evaluator = Evaluator::with_config(LabConfig {
        as_of: Some(day("2024-01-01")),
        ..LabConfig::default()
    });
    let report = evaluator.report("Nobody", &[], &[]).expect("báo cáo rỗng");
    assert!(report.evaluations.is_empty());
    assert!(report.groups.is_empty());
    assert_eq!(report.freshness.last_test, None);
    assert_eq!(report.freshness.level, FreshnessLevel::Overdue);
}

#[test]
fn invalid_metric_value_fails_the_report() {
    let mut metrics = panel();
    metrics[0].value = f64::NAN;
    let result = Evaluator::default().report("Alex", &metrics, &[]);
    assert!(result.is_err());
}

#[test]
fn derive_status_matches_evaluation() {
    let evaluator = Evaluator::default();
    let metrics = panel();
    for metric in &metrics {
        let status = evaluator
            .derive_status(metric, day("2023-04-15"))
            .expect("trạng thái");
        let evaluation = evaluator.evaluate(metric, day("2023-04-15")).unwrap();
        assert_eq!(status, evaluation.status);
    }
}
