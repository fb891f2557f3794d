//! Uploaded lab reports and the archive query: filter, sort and group.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reports at most this many days old show under the "recent" tab.
pub const RECENT_TAB_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Blood,
    Heart,
    Vitamin,
    Organ,
    Urine,
    #[serde(other)]
    General,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Blood => "blood",
            ReportKind::Heart => "heart",
            ReportKind::Vitamin => "vitamin",
            ReportKind::Organ => "organ",
            ReportKind::Urine => "urine",
            ReportKind::General => "general",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ReportKind::Blood => "Blood Tests",
            ReportKind::Heart => "Cardiac",
            ReportKind::Vitamin => "Vitamins",
            ReportKind::Organ => "Organ Function",
            ReportKind::Urine => "Urine Tests",
            ReportKind::General => "General",
        }
    }
}

/// Overall verdict of a report. Anything but `normal` counts as abnormal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Normal,
    Mixed,
    Review,
}

impl ReportStatus {
    pub fn is_abnormal(self) -> bool {
        self != ReportStatus::Normal
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultFlag {
    Normal,
    High,
    Low,
}

/// Numeric bounds read from a printed reference string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceBounds {
    pub min: f64,
    pub max: f64,
}

impl ReferenceBounds {
    pub fn flag(&self, value: f64) -> ResultFlag {
        if value < self.min {
            ResultFlag::Low
        } else if value > self.max {
            ResultFlag::High
        } else {
            ResultFlag::Normal
        }
    }
}

/// Reads `<x` as `0..x`, `>x` as `x..2x` and `a-b` as `a..b`.
pub fn parse_reference(reference: &str) -> Option<ReferenceBounds> {
    let reference = reference.trim();
    let (min, max) = if let Some(rest) = reference.strip_prefix('<') {
        (0.0, number(rest)?)
    } else if let Some(rest) = reference.strip_prefix('>') {
        let min = number(rest)?;
        (min, min * 2.0)
    } else {
        let (low, high) = reference.split_once('-')?;
        (number(low)?, number(high)?)
    };
    Some(ReferenceBounds { min, max })
}

fn number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// One line of a lab report, as printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub name: String,
    pub value: String,
    pub unit: String,
    pub status: ResultFlag,
    #[serde(default)]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_date: Option<NaiveDate>,
}

impl LabResult {
    pub fn numeric_value(&self) -> Option<f64> {
        number(&self.value)
    }

    pub fn reference_bounds(&self) -> Option<ReferenceBounds> {
        parse_reference(&self.reference)
    }

    /// Flag recomputed from the value and the reference string.
    pub fn derived_flag(&self) -> Option<ResultFlag> {
        Some(self.reference_bounds()?.flag(self.numeric_value()?))
    }
}

/// An uploaded lab report document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabReport {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub metrics: u32,
    pub status: ReportStatus,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    #[serde(default)]
    pub results: Vec<LabResult>,
}

impl LabReport {
    fn age_days(&self, anchor: NaiveDate) -> i64 {
        anchor.signed_duration_since(self.date).num_days()
    }

    /// Case-insensitive match on title, doctor, location or any result name.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.doctor, &self.location]
            .into_iter()
            .chain(self.results.iter().map(|result| &result.name))
            .any(|text| text.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportTab {
    #[default]
    All,
    Abnormal,
    Recent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    RecentAbnormal,
    AllNormal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl DateRange {
    pub fn max_age_days(self) -> Option<i64> {
        match self {
            DateRange::All => None,
            DateRange::ThreeMonths => Some(90),
            DateRange::SixMonths => Some(180),
            DateRange::OneYear => Some(365),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    #[default]
    Date,
    Category,
}

/// What the archive view asks for. Every field is optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ReportQuery {
    pub tab: ReportTab,
    pub search: String,
    pub status: StatusFilter,
    pub date_range: DateRange,
    /// Empty means every category.
    pub categories: Vec<ReportKind>,
    pub sort: SortOrder,
    pub group_by: GroupMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportGroup {
    pub key: String,
    pub title: String,
    pub reports: Vec<LabReport>,
}

impl ReportQuery {
    /// Filtered and sorted reports. Ages are counted in days back from
    /// `anchor`.
    pub fn filter<'a>(&self, reports: &'a [LabReport], anchor: NaiveDate) -> Vec<&'a LabReport> {
        let needle = self.search.trim().to_lowercase();

        let mut selected: Vec<&LabReport> = reports
            .iter()
            .filter(|report| match self.tab {
                ReportTab::All => true,
                ReportTab::Abnormal => report.status.is_abnormal(),
                ReportTab::Recent => report.age_days(anchor) <= RECENT_TAB_DAYS,
            })
            .filter(|report| needle.is_empty() || report.matches(&needle))
            .filter(|report| match self.status {
                StatusFilter::All => true,
                StatusFilter::RecentAbnormal => report.status.is_abnormal(),
                StatusFilter::AllNormal => !report.status.is_abnormal(),
            })
            .filter(|report| {
                self.date_range
                    .max_age_days()
                    .map_or(true, |days| report.age_days(anchor) <= days)
            })
            .filter(|report| self.categories.is_empty() || self.categories.contains(&report.kind))
            .collect();

        match self.sort {
            SortOrder::Newest => selected.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::Oldest => selected.sort_by_key(|report| report.date),
        }
        selected
    }

    /// Filter, sort, then group per `group_by`.
    pub fn run(&self, reports: &[LabReport], anchor: NaiveDate) -> Vec<ReportGroup> {
        let selected = self.filter(reports, anchor);
        let groups = match self.group_by {
            GroupMode::Date => group_by_date(&selected),
            GroupMode::Category => group_by_category(&selected),
        };
        debug!(
            total = reports.len(),
            selected = selected.len(),
            groups = groups.len(),
            "ran report query"
        );
        groups
    }
}

/// One group per day, newest day first.
fn group_by_date(reports: &[&LabReport]) -> Vec<ReportGroup> {
    let mut by_day: BTreeMap<NaiveDate, Vec<LabReport>> = BTreeMap::new();
    for report in reports {
        by_day.entry(report.date).or_default().push((*report).clone());
    }

    by_day
        .into_iter()
        .rev()
        .map(|(day, reports)| ReportGroup {
            key: day.format("%Y-%m-%d").to_string(),
            title: day.format("%B %-d, %Y").to_string(),
            reports,
        })
        .collect()
}

/// One group per category, the category with the latest report first.
/// Ties keep first-seen order.
fn group_by_category(reports: &[&LabReport]) -> Vec<ReportGroup> {
    let mut groups: Vec<(ReportKind, Vec<LabReport>)> = Vec::new();
    for report in reports {
        match groups.iter_mut().find(|(kind, _)| *kind == report.kind) {
            Some((_, members)) => members.push((*report).clone()),
            None => groups.push((report.kind, vec![(*report).clone()])),
        }
    }

    groups.sort_by(|(_, a), (_, b)| latest_date(b).cmp(&latest_date(a)));

    groups
        .into_iter()
        .map(|(kind, reports)| ReportGroup {
            key: kind.as_str().to_string(),
            title: kind.display_name().to_string(),
            reports,
        })
        .collect()
}

fn latest_date(reports: &[LabReport]) -> Option<NaiveDate> {
    reports.iter().map(|report| report.date).max()
}
