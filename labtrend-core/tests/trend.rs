use chrono::NaiveDate;
use labtrend_core::{
    derive_trend, sentiment_for, HistoryPoint, LabConfig, LabError, MetricCatalog, Sentiment,
    Status, Trend, TrendDescriptor, TrendDirection,
};

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("ngày không hợp lệ")
}

fn point(date: &str, value: f64) -> HistoryPoint {
    HistoryPoint {
        date: day(date),
        value,
    }
}

fn derived(trend: Trend) -> TrendDescriptor {
    match trend {
        Trend::Derived(descriptor) => descriptor,
        other => panic!("Mong đợi xu hướng, nhận {other:?}"),
    }
}

fn trend_of(history: &[HistoryPoint], status: Status, metric_id: &str) -> Trend {
    let catalog = MetricCatalog::builtin();
    derive_trend(
        history,
        status,
        &catalog.profile(metric_id).ranges,
        &LabConfig::default(),
    )
    .expect("Không suy được xu hướng")
}

#[test]
fn equal_readings_are_stable() {
    let descriptor = derived(trend_of(
        &[point("2023-01-15", 80.0), point("2023-02-15", 80.0)],
        Status::Balanced,
        "glucose",
    ));
    assert_eq!(descriptor.direction, TrendDirection::Stable);
    assert_eq!(descriptor.percent_change, 0.0);
    assert_eq!(descriptor.sentiment, Sentiment::Neutral);
    assert_eq!(descriptor.label, "Stable (±0.0%), normal range");
}

#[test]
fn three_percent_rise_is_up() {
    let descriptor = derived(trend_of(
        &[point("2023-01-15", 80.0), point("2023-02-15", 80.0 * 1.03)],
        Status::Balanced,
        "glucose",
    ));
    assert_eq!(descriptor.direction, TrendDirection::Up);
    assert!((descriptor.percent_change - 3.0).abs() < 1e-9);
    assert_eq!(descriptor.sentiment, Sentiment::Positive);
    assert_eq!(descriptor.label, "↗ 3.0% improvement, still normal");
}

#[test]
fn one_percent_drop_stays_stable() {
    let descriptor = derived(trend_of(
        &[point("2023-01-15", 80.0), point("2023-02-15", 80.0 * 0.99)],
        Status::Balanced,
        "glucose",
    ));
    assert_eq!(descriptor.direction, TrendDirection::Stable);
    assert_eq!(descriptor.label, "Stable (±1.0%), normal range");
}

#[test]
fn seed_glucose_history_uses_last_two_points() {
    let history = [
        point("2023-01-15", 98.0),
        point("2023-02-15", 102.0),
        point("2023-03-15", 97.0),
        point("2023-04-15", 95.0),
    ];
    let descriptor = derived(trend_of(&history, Status::Balanced, "glucose"));

    assert_eq!(descriptor.direction, TrendDirection::Down);
    assert!((descriptor.percent_change - (-2.0 / 97.0 * 100.0)).abs() < 1e-9);
    assert_eq!(descriptor.previous.value, 97.0);
    assert_eq!(descriptor.latest.value, 95.0);
    assert_eq!(descriptor.sentiment, Sentiment::Concerning);
    assert_eq!(descriptor.label, "↘ 2.1% decline, still normal");
    assert!(!descriptor.significant);
}

#[test]
fn unordered_history_is_sorted_before_comparison() {
    let history = [
        point("2023-04-15", 95.0),
        point("2023-01-15", 98.0),
        point("2023-03-15", 97.0),
    ];
    let descriptor = derived(trend_of(&history, Status::Balanced, "glucose"));
    assert_eq!(descriptor.previous.date, day("2023-03-15"));
    assert_eq!(descriptor.latest.date, day("2023-04-15"));
}

#[test]
fn single_reading_is_insufficient_not_error() {
    let trend = trend_of(&[point("2023-04-15", 95.0)], Status::Balanced, "glucose");
    assert_eq!(trend, Trend::Insufficient { samples: 1 });
    assert!(trend.descriptor().is_none());

    let empty = trend_of(&[], Status::Manage, "vitd");
    assert_eq!(empty, Trend::Insufficient { samples: 0 });
}

#[test]
fn zero_baseline_is_flagged() {
    let descriptor = derived(trend_of(
        &[point("2023-03-15", 0.0), point("2023-04-15", 12.0)],
        Status::Manage,
        "protein",
    ));
    assert!(descriptor.undefined_baseline);
    assert_eq!(descriptor.direction, TrendDirection::Stable);
    assert_eq!(descriptor.percent_change, 0.0);
    assert!(descriptor.percent_change.is_finite());
    assert!(descriptor.significant, "leaving the normal band is significant");
}

#[test]
fn zero_to_zero_is_plain_stable() {
    let descriptor = derived(trend_of(
        &[point("2023-03-15", 0.0), point("2023-04-15", 0.0)],
        Status::Balanced,
        "protein",
    ));
    assert!(!descriptor.undefined_baseline);
    assert_eq!(descriptor.direction, TrendDirection::Stable);
    assert_eq!(descriptor.label, "Stable (±0.0%), normal range");
}

#[test]
fn overflowing_change_is_treated_as_undefined_baseline() {
    let descriptor = derived(trend_of(
        &[point("2023-03-15", 1e-300), point("2023-04-15", 1e10)],
        Status::Balanced,
        "glucose",
    ));
    assert!(descriptor.undefined_baseline);
    assert_eq!(descriptor.percent_change, 0.0);
    assert_eq!(descriptor.direction, TrendDirection::Stable);
    assert_eq!(descriptor.label, "New baseline, no previous value to compare");

    let json = serde_json::to_value(&descriptor).expect("serialize");
    assert_eq!(json["percent_change"], serde_json::json!(0.0));
    let back: TrendDescriptor = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, descriptor);
}

#[test]
fn negative_baseline_keeps_direction_of_change() {
    let rising = derived(trend_of(
        &[point("2023-03-15", -10.0), point("2023-04-15", -5.0)],
        Status::Balanced,
        "ferritin",
    ));
    assert_eq!(rising.direction, TrendDirection::Up);
    assert!((rising.percent_change - 50.0).abs() < 1e-9);
    assert_eq!(rising.label, "↗ 50.0% improvement, positive");

    let falling = derived(trend_of(
        &[point("2023-03-15", -5.0), point("2023-04-15", -10.0)],
        Status::Balanced,
        "ferritin",
    ));
    assert_eq!(falling.direction, TrendDirection::Down);
    assert!((falling.percent_change + 100.0).abs() < 1e-9);
}

#[test]
fn falling_ldl_under_consult_is_an_improvement() {
    let descriptor = derived(trend_of(
        &[point("2023-03-15", 150.0), point("2023-04-15", 140.0)],
        Status::Consult,
        "ldl",
    ));
    assert_eq!(descriptor.direction, TrendDirection::Down);
    assert_eq!(descriptor.sentiment, Sentiment::Positive);
    assert_eq!(descriptor.label, "↘ 6.7% decrease, improvement");
}

#[test]
fn rising_vitamin_d_under_manage_reads_as_concerning() {
    let descriptor = derived(trend_of(
        &[point("2023-03-15", 24.0), point("2023-04-15", 27.0)],
        Status::Manage,
        "vitd",
    ));
    assert_eq!(descriptor.direction, TrendDirection::Up);
    assert_eq!(descriptor.sentiment, Sentiment::Concerning);
    assert_eq!(descriptor.label, "↗ 12.5% increase, concerning");
}

#[test]
fn crossing_into_normal_band_is_significant() {
    let descriptor = derived(trend_of(
        &[point("2023-03-15", 28.0), point("2023-04-15", 31.0)],
        Status::Balanced,
        "vitd",
    ));
    assert!(descriptor.significant);
    assert_eq!(descriptor.label, "↗ 10.7% improvement, still normal");
}

#[test]
fn significance_without_normal_band_uses_wider_threshold() {
    let ranges = vec![labtrend_core::ReferenceRange::bounded(
        0.0,
        100.0,
        "Watch",
        Status::Manage,
        "amber",
    )];
    let config = LabConfig::default();

    let small = derive_trend(
        &[point("2023-03-15", 50.0), point("2023-04-15", 54.0)],
        Status::Manage,
        &ranges,
        &config,
    )
    .unwrap();
    assert!(!derived(small).significant);

    let large = derive_trend(
        &[point("2023-03-15", 50.0), point("2023-04-15", 56.0)],
        Status::Manage,
        &ranges,
        &config,
    )
    .unwrap();
    let large = derived(large);
    assert!(large.significant);
    assert_eq!(large.label, "↗ 12.0% increase, concerning");
}

#[test]
fn stable_threshold_is_configurable() {
    let config = LabConfig {
        stable_threshold_pct: 5.0,
        ..LabConfig::default()
    };
    let catalog = MetricCatalog::builtin();
    let trend = derive_trend(
        &[point("2023-03-15", 100.0), point("2023-04-15", 104.0)],
        Status::Manage,
        &catalog.profile("glucose").ranges,
        &config,
    )
    .unwrap();
    assert_eq!(derived(trend).direction, TrendDirection::Stable);
}

#[test]
fn non_finite_history_is_rejected() {
    let catalog = MetricCatalog::builtin();
    let result = derive_trend(
        &[point("2023-03-15", 100.0), point("2023-04-15", f64::NAN)],
        Status::Manage,
        &catalog.profile("glucose").ranges,
        &LabConfig::default(),
    );
    assert!(matches!(result, Err(LabError::InvalidValue(_))));
}

#[test]
fn sentiment_table_covers_all_cases() {
    use Sentiment::*;
    use TrendDirection::*;

    let expected = [
        (Up, Status::Balanced, Positive),
        (Up, Status::Manage, Concerning),
        (Up, Status::Consult, Concerning),
        (Up, Status::Book, Neutral),
        (Down, Status::Balanced, Concerning),
        (Down, Status::Manage, Positive),
        (Down, Status::Consult, Positive),
        (Down, Status::Book, Neutral),
    ];
    for (direction, status, sentiment) in expected {
        assert_eq!(sentiment_for(direction, status), sentiment, "{direction:?}/{status}");
    }
    for status in Status::ALL {
        assert_eq!(sentiment_for(Stable, status), Neutral);
    }
}

#[test]
fn trend_serializes_with_kind_tag() {
    let trend = trend_of(&[point("2023-04-15", 95.0)], Status::Balanced, "glucose");
    let value = serde_json::to_value(&trend).expect("Không serialize xu hướng");
    assert_eq!(value["kind"], "insufficient");
    assert_eq!(value["samples"], 1);
}
