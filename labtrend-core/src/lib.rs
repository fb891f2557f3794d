//! Logic lõi phân loại kết quả xét nghiệm và suy ra xu hướng.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod chart;
pub mod classify;
pub mod model;
pub mod report;
pub mod trend;

pub use catalog::{
    GuidanceAction, LifestyleTip, MetricCatalog, MetricProfile, StatusGuidance, TipKind,
    FALLBACK_METRIC_ID,
};
pub use chart::{
    prepare_chart, ChartBand, ChartData, ChartLayout, ChartPadding, ChartPoint, ChartTick,
    TOOLTIP_HIT_DISTANCE,
};
pub use classify::{classify, classify_with_ranges, parse_value, BandMatch, Classification};
pub use model::{Category, HistoryPoint, Metric, ReferenceRange, Status};
pub use report::{
    CategoryGroup, Evaluator, Freshness, FreshnessLevel, MetricEvaluation, PatientReport,
    StatusCounts, TrendTally,
};
pub use trend::{derive_trend, sentiment_for, Sentiment, Trend, TrendDescriptor, TrendDirection};

/// Ngưỡng (%) mà thay đổi nhỏ hơn hoặc bằng được coi là ổn định.
pub const DEFAULT_STABLE_THRESHOLD_PCT: f64 = 2.0;

/// Cấu hình các ngưỡng dùng khi đánh giá chỉ số.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabConfig {
    /// |Δ%| không vượt quá ngưỡng này thì xu hướng là `stable`.
    pub stable_threshold_pct: f64,
    /// Thay đổi đáng kể khi chỉ số không có dải bình thường.
    pub significant_change_pct: f64,
    /// Thay đổi đáng kể khi chỉ số có dải bình thường.
    pub range_change_pct: f64,
    /// Số ngày kể từ lần xét nghiệm cuối vẫn coi là mới.
    pub fresh_days: u32,
    /// Quá số ngày này thì chỉ số chuyển sang `book`.
    pub overdue_days: u32,
    /// Ngày mốc của báo cáo; mặc định là ngày cập nhật mới nhất.
    pub as_of: Option<NaiveDate>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            stable_threshold_pct: DEFAULT_STABLE_THRESHOLD_PCT,
            significant_change_pct: 10.0,
            range_change_pct: 15.0,
            fresh_days: 90,
            overdue_days: 180,
            as_of: None,
        }
    }
}

/// Lỗi chung khi đánh giá chỉ số.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LabError {
    #[error("Giá trị không hợp lệ: {0}")]
    InvalidValue(String),
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
}
