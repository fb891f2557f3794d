use std::fs;

use chrono::NaiveDate;
use labtrend_records::{
    parse_reference, DateRange, GroupMode, LabReport, ReferenceBounds, ReportKind, ReportQuery,
    ReportTab, ResultFlag, SortOrder, StatusFilter,
};
use serde_json::json;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("invalid date")
}

fn archive() -> Vec<LabReport> {
    let data = fs::read_to_string(fixture_path("lab_reports.json"))
        .expect("Could not read lab report archive");
    serde_json::from_str(&data).expect("Invalid lab report archive")
}

fn anchor() -> NaiveDate {
    day("2023-04-20")
}

fn ids(reports: &[&LabReport]) -> Vec<String> {
    reports.iter().map(|report| report.id.clone()).collect()
}

#[test]
fn default_query_sorts_newest_first_keeping_upload_order() {
    let reports = archive();
    let selected = ReportQuery::default().filter(&reports, anchor());
    assert_eq!(
        ids(&selected),
        ["file1", "file6", "file2", "file7", "file3", "file8", "file4", "file5"]
    );

    let oldest = ReportQuery {
        sort: SortOrder::Oldest,
        ..ReportQuery::default()
    };
    assert_eq!(ids(&oldest.filter(&reports, anchor()))[0], "file5");
}

#[test]
fn tabs_select_abnormal_and_recent_reports() {
    let reports = archive();

    let abnormal = ReportQuery {
        tab: ReportTab::Abnormal,
        ..ReportQuery::default()
    };
    assert_eq!(
        ids(&abnormal.filter(&reports, anchor())),
        ["file1", "file2", "file7", "file8", "file4"]
    );

    let recent = ReportQuery {
        tab: ReportTab::Recent,
        ..ReportQuery::default()
    };
    assert_eq!(ids(&recent.filter(&reports, anchor())), ["file1", "file6"]);
}

#[test]
fn search_is_case_insensitive_across_fields_and_results() {
    let reports = archive();
    let search = |text: &str| {
        let query = ReportQuery {
            search: text.to_string(),
            ..ReportQuery::default()
        };
        ids(&query.filter(&reports, anchor()))
    };

    assert_eq!(search("GLUCOSE"), ["file1", "file5"]);
    assert_eq!(search("johnson"), ["file1", "file6", "file4"]);
    assert_eq!(search("memorial"), ["file3", "file8"]);
    assert_eq!(search("  lipid "), ["file2"]);
    assert!(search("no such test").is_empty());
}

#[test]
fn status_filter_and_categories_narrow_the_list() {
    let reports = archive();

    let normal = ReportQuery {
        status: StatusFilter::AllNormal,
        ..ReportQuery::default()
    };
    assert_eq!(
        ids(&normal.filter(&reports, anchor())),
        ["file6", "file3", "file5"]
    );

    let heart_abnormal = ReportQuery {
        status: StatusFilter::RecentAbnormal,
        categories: vec![ReportKind::Heart, ReportKind::Urine],
        ..ReportQuery::default()
    };
    assert_eq!(
        ids(&heart_abnormal.filter(&reports, anchor())),
        ["file2", "file7"]
    );
}

#[test]
fn date_range_cut_offs_are_inclusive() {
    let reports = archive();
    let within = |range: DateRange| {
        let query = ReportQuery {
            date_range: range,
            ..ReportQuery::default()
        };
        query.filter(&reports, anchor()).len()
    };

    // file4 is exactly 90 days old, file5 is 126.
    assert_eq!(within(DateRange::ThreeMonths), 7);
    assert_eq!(within(DateRange::SixMonths), 8);
    assert_eq!(within(DateRange::OneYear), 8);
    assert_eq!(within(DateRange::All), 8);

    let later = ReportQuery {
        date_range: DateRange::ThreeMonths,
        ..ReportQuery::default()
    };
    assert_eq!(later.filter(&reports, day("2023-04-21")).len(), 6);
}

#[test]
fn groups_by_day_newest_first() {
    let groups = ReportQuery::default().run(&archive(), anchor());

    let keys: Vec<&str> = groups.iter().map(|group| group.key.as_str()).collect();
    assert_eq!(
        keys,
        ["2023-04-15", "2023-03-10", "2023-02-05", "2023-01-20", "2022-12-15"]
    );
    assert_eq!(groups[0].title, "April 15, 2023");
    assert_eq!(groups[0].reports.len(), 2);

    let oldest = ReportQuery {
        sort: SortOrder::Oldest,
        ..ReportQuery::default()
    };
    let groups = oldest.run(&archive(), anchor());
    assert_eq!(groups[0].key, "2023-04-15", "day groups are always newest first");
}

#[test]
fn groups_by_category_ordered_by_latest_report() {
    let query = ReportQuery {
        group_by: GroupMode::Category,
        sort: SortOrder::Oldest,
        ..ReportQuery::default()
    };
    let groups = query.run(&archive(), anchor());

    let titles: Vec<&str> = groups.iter().map(|group| group.title.as_str()).collect();
    assert_eq!(titles, ["Blood Tests", "Cardiac", "Vitamins", "Organ Function"]);
    assert_eq!(groups[0].key, "blood");

    let blood: Vec<&str> = groups[0]
        .reports
        .iter()
        .map(|report| report.id.as_str())
        .collect();
    assert_eq!(blood, ["file5", "file1", "file6"]);
}

#[test]
fn query_reads_from_partial_json() {
    let query: ReportQuery = serde_json::from_value(json!({
        "tab": "abnormal",
        "status": "recent-abnormal",
        "date_range": "6m",
        "group_by": "category"
    }))
    .expect("valid query");

    assert_eq!(query.tab, ReportTab::Abnormal);
    assert_eq!(query.status, StatusFilter::RecentAbnormal);
    assert_eq!(query.date_range, DateRange::SixMonths);
    assert_eq!(query.group_by, GroupMode::Category);
    assert_eq!(query.sort, SortOrder::Newest);
    assert!(query.search.is_empty());
}

#[test]
fn unknown_report_type_is_general() {
    let report: LabReport = serde_json::from_value(json!({
        "id": "scan",
        "title": "Imaging summary",
        "date": "2023-04-01",
        "status": "review",
        "type": "imaging"
    }))
    .expect("valid report");

    assert_eq!(report.kind, ReportKind::General);
    assert_eq!(report.kind.display_name(), "General");
    assert!(report.results.is_empty());
}

#[test]
fn reference_strings_parse_to_bounds() {
    assert_eq!(
        parse_reference("<200"),
        Some(ReferenceBounds { min: 0.0, max: 200.0 })
    );
    assert_eq!(
        parse_reference("> 40"),
        Some(ReferenceBounds { min: 40.0, max: 80.0 })
    );
    assert_eq!(
        parse_reference("4.5-11.0"),
        Some(ReferenceBounds { min: 4.5, max: 11.0 })
    );
    assert_eq!(parse_reference("negative"), None);
    assert_eq!(parse_reference("<high"), None);
    assert_eq!(parse_reference(""), None);
}

#[test]
fn derived_flags_agree_with_printed_flags() {
    let reports = archive();
    for result in reports.iter().flat_map(|report| &report.results) {
        assert_eq!(
            result.derived_flag(),
            Some(result.status),
            "{} {} against {}",
            result.name,
            result.value,
            result.reference
        );
    }

    let ferritin = reports
        .iter()
        .flat_map(|report| &report.results)
        .find(|result| result.name == "Ferritin")
        .expect("ferritin result");
    assert_eq!(ferritin.derived_flag(), Some(ResultFlag::Low));
}
