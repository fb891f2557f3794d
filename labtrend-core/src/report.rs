//! Đánh giá từng chỉ số và tổng hợp báo cáo cho bệnh nhân.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{GuidanceAction, MetricCatalog};
use crate::chart::{prepare_chart, ChartData, ChartLayout};
use crate::classify::{classify, Classification};
use crate::model::{Category, Metric, Status};
use crate::trend::{derive_trend, Sentiment, Trend};
use crate::{LabConfig, LabError};

/// Kết quả đánh giá một chỉ số.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEvaluation {
    pub metric_id: String,
    pub name: String,
    pub category: Category,
    pub value: f64,
    pub unit: String,
    pub last_updated: NaiveDate,
    pub days_since_update: i64,
    pub classification: Classification,
    /// Trạng thái suy ra từ bộ phân loại (hoặc `book` khi quá hạn).
    pub status: Status,
    /// Trạng thái ghi trong dữ liệu nguồn.
    pub recorded_status: Status,
    pub status_mismatch: bool,
    pub trend: Trend,
    pub action: GuidanceAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryGroup {
    pub category: Category,
    pub title: String,
    pub metric_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub balanced: usize,
    pub manage: usize,
    pub consult: usize,
    pub book: usize,
}

impl StatusCounts {
    fn record(&mut self, status: Status) {
        match status {
            Status::Balanced => self.balanced += 1,
            Status::Manage => self.manage += 1,
            Status::Consult => self.consult += 1,
            Status::Book => self.book += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TrendTally {
    pub improving: usize,
    pub stable: usize,
    pub worsening: usize,
    pub insufficient: usize,
}

impl TrendTally {
    fn record(&mut self, trend: &Trend) {
        match trend {
            Trend::Insufficient { .. } => self.insufficient += 1,
            Trend::Derived(descriptor) => match descriptor.sentiment {
                Sentiment::Positive => self.improving += 1,
                Sentiment::Neutral => self.stable += 1,
                Sentiment::Concerning => self.worsening += 1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessLevel {
    Fresh,
    Due,
    Overdue,
}

/// Độ "mới" của lần xét nghiệm gần nhất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Freshness {
    pub last_test: Option<NaiveDate>,
    pub last_test_name: Option<String>,
    pub days_since: Option<i64>,
    pub level: FreshnessLevel,
    /// Tiến độ vòng hiển thị, 0–100.
    pub progress_pct: f64,
}

/// Báo cáo tổng hợp cuối cùng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientReport {
    pub generated_at: DateTime<Utc>,
    pub as_of: NaiveDate,
    pub patient: String,
    pub evaluations: Vec<MetricEvaluation>,
    pub groups: Vec<CategoryGroup>,
    pub status_counts: StatusCounts,
    pub trend_tally: TrendTally,
    pub freshness: Freshness,
    pub preferences: Vec<String>,
}

impl PatientReport {
    pub fn evaluation(&self, metric_id: &str) -> Option<&MetricEvaluation> {
        self.evaluations
            .iter()
            .find(|evaluation| evaluation.metric_id == metric_id)
    }

    /// Các chỉ số cần chú ý (không ở trạng thái `balanced`).
    pub fn attention(&self) -> impl Iterator<Item = &MetricEvaluation> {
        self.evaluations
            .iter()
            .filter(|evaluation| evaluation.status != Status::Balanced)
    }
}

/// Bộ đánh giá dùng chung cấu hình và danh mục chỉ số.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: LabConfig,
    catalog: MetricCatalog,
}

impl Evaluator {
    pub fn new(config: LabConfig, catalog: MetricCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn with_config(config: LabConfig) -> Self {
        Self::new(config, MetricCatalog::builtin())
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn classify(&self, metric_id: &str, value: f64) -> Result<Classification, LabError> {
        classify(&self.catalog, metric_id, value)
    }

    /// Xu hướng của chỉ số, xét theo trạng thái `status` đã biết.
    pub fn trend(&self, metric: &Metric, status: Status) -> Result<Trend, LabError> {
        let profile = self.catalog.profile(&metric.id);
        derive_trend(&metric.history, status, &profile.ranges, &self.config)
    }

    pub fn chart(&self, metric: &Metric, layout: &ChartLayout) -> Result<Option<ChartData>, LabError> {
        let profile = self.catalog.profile(&metric.id);
        prepare_chart(&metric.history, &profile.ranges, layout)
    }

    /// Trạng thái do bộ phân loại quyết định, `book` khi quá hạn xét nghiệm.
    pub fn derive_status(&self, metric: &Metric, as_of: NaiveDate) -> Result<Status, LabError> {
        let classification = self.classify(&metric.id, metric.value)?;
        Ok(self.status_at(classification.status, metric, as_of))
    }

    fn status_at(&self, classified: Status, metric: &Metric, as_of: NaiveDate) -> Status {
        if days_between(metric.last_updated, as_of) > i64::from(self.config.overdue_days) {
            Status::Book
        } else {
            classified
        }
    }

    pub fn evaluate(&self, metric: &Metric, as_of: NaiveDate) -> Result<MetricEvaluation, LabError> {
        let classification = self.classify(&metric.id, metric.value)?;
        let status = self.status_at(classification.status, metric, as_of);
        let trend = self.trend(metric, status)?;

        Ok(MetricEvaluation {
            metric_id: metric.id.clone(),
            name: metric.name.clone(),
            category: metric.category,
            value: metric.value,
            unit: metric.unit.clone(),
            last_updated: metric.last_updated,
            days_since_update: days_between(metric.last_updated, as_of),
            classification,
            status,
            recorded_status: metric.status,
            status_mismatch: metric.status != status,
            trend,
            action: status.guidance().action,
        })
    }

    /// Ngày mốc: cấu hình nếu có, nếu không là ngày cập nhật mới nhất.
    pub fn anchor(&self, metrics: &[Metric]) -> NaiveDate {
        self.config
            .as_of
            .or_else(|| metrics.iter().map(|metric| metric.last_updated).max())
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn report(
        &self,
        patient: &str,
        metrics: &[Metric],
        preferences: &[String],
    ) -> Result<PatientReport, LabError> {
        let as_of = self.anchor(metrics);

        let evaluations = metrics
            .iter()
            .map(|metric| self.evaluate(metric, as_of))
            .collect::<Result<Vec<_>, _>>()?;

        let mut status_counts = StatusCounts::default();
        let mut trend_tally = TrendTally::default();
        for evaluation in &evaluations {
            status_counts.record(evaluation.status);
            trend_tally.record(&evaluation.trend);
        }

        let groups = Category::ALL
            .iter()
            .filter_map(|category| {
                let metric_ids: Vec<String> = evaluations
                    .iter()
                    .filter(|evaluation| evaluation.category == *category)
                    .map(|evaluation| evaluation.metric_id.clone())
                    .collect();
                (!metric_ids.is_empty()).then(|| CategoryGroup {
                    category: *category,
                    title: category.profile_title().to_string(),
                    metric_ids,
                })
            })
            .collect();

        Ok(PatientReport {
            generated_at: Utc::now(),
            as_of,
            patient: patient.to_string(),
            freshness: self.freshness(metrics, as_of),
            evaluations,
            groups,
            status_counts,
            trend_tally,
            preferences: preferences.to_vec(),
        })
    }

    pub fn freshness(&self, metrics: &[Metric], as_of: NaiveDate) -> Freshness {
        let latest = metrics
            .iter()
            .fold(None::<&Metric>, |best, metric| match best {
                Some(current) if current.last_updated >= metric.last_updated => Some(current),
                _ => Some(metric),
            });

        let Some(latest) = latest else {
            return Freshness {
                last_test: None,
                last_test_name: None,
                days_since: None,
                level: FreshnessLevel::Overdue,
                progress_pct: 100.0,
            };
        };

        let days = days_between(latest.last_updated, as_of);
        let level = if days <= i64::from(self.config.fresh_days) {
            FreshnessLevel::Fresh
        } else if days <= i64::from(self.config.overdue_days) {
            FreshnessLevel::Due
        } else {
            FreshnessLevel::Overdue
        };
        let progress_pct = if self.config.fresh_days == 0 {
            100.0
        } else {
            (days as f64 / f64::from(self.config.fresh_days) * 100.0).min(100.0)
        };

        Freshness {
            last_test: Some(latest.last_updated),
            last_test_name: Some(latest.name.clone()),
            days_since: Some(days),
            level,
            progress_pct,
        }
    }
}

/// Số ngày từ `from` tới `to`, không âm.
fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days().max(0)
}
