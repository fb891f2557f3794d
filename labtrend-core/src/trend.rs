//! Suy ra xu hướng từ hai lần đo gần nhất.

use serde::{Deserialize, Serialize};

use crate::model::{HistoryPoint, ReferenceRange, Status};
use crate::{LabConfig, LabError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Cách trình bày thay đổi cho bệnh nhân.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Concerning,
    Neutral,
}

/// Mô tả xu hướng giữa hai lần đo cuối.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendDescriptor {
    pub direction: TrendDirection,
    pub percent_change: f64,
    pub sentiment: Sentiment,
    pub label: String,
    /// Lần đo trước bằng 0 nên phần trăm thay đổi không xác định.
    pub undefined_baseline: bool,
    pub significant: bool,
    pub previous: HistoryPoint,
    pub latest: HistoryPoint,
}

/// Kết quả suy xu hướng. Thiếu dữ liệu là một kết quả, không phải lỗi.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trend {
    Insufficient { samples: usize },
    Derived(TrendDescriptor),
}

impl Trend {
    pub fn descriptor(&self) -> Option<&TrendDescriptor> {
        match self {
            Trend::Derived(descriptor) => Some(descriptor),
            Trend::Insufficient { .. } => None,
        }
    }
}

/// Bảng (hướng × trạng thái) → sắc thái.
pub fn sentiment_for(direction: TrendDirection, status: Status) -> Sentiment {
    match (direction, status) {
        (TrendDirection::Stable, _) => Sentiment::Neutral,
        (TrendDirection::Up, Status::Balanced) => Sentiment::Positive,
        (TrendDirection::Up, Status::Manage) => Sentiment::Concerning,
        (TrendDirection::Up, Status::Consult) => Sentiment::Concerning,
        (TrendDirection::Up, Status::Book) => Sentiment::Neutral,
        (TrendDirection::Down, Status::Balanced) => Sentiment::Concerning,
        (TrendDirection::Down, Status::Manage) => Sentiment::Positive,
        (TrendDirection::Down, Status::Consult) => Sentiment::Positive,
        (TrendDirection::Down, Status::Book) => Sentiment::Neutral,
    }
}

/// Suy xu hướng từ lịch sử. Chỉ dùng hai điểm cuối sau khi sắp theo ngày.
pub fn derive_trend(
    history: &[HistoryPoint],
    status: Status,
    ranges: &[ReferenceRange],
    config: &LabConfig,
) -> Result<Trend, LabError> {
    if let Some(point) = history.iter().find(|point| !point.value.is_finite()) {
        return Err(LabError::InvalidValue(format!(
            "{} ({})",
            point.value, point.date
        )));
    }

    let mut points = history.to_vec();
    points.sort_by_key(|point| point.date);

    let [.., previous, latest] = points.as_slice() else {
        return Ok(Trend::Insufficient {
            samples: points.len(),
        });
    };
    let (previous, latest) = (*previous, *latest);

    // Chia cho |trước| để dấu luôn theo chiều thay đổi, kể cả khi mốc âm.
    let ratio = (previous.value != 0.0)
        .then(|| (latest.value - previous.value) / previous.value.abs() * 100.0)
        .filter(|pct| pct.is_finite());
    let undefined_baseline = ratio.is_none() && latest.value != previous.value;
    let percent_change = ratio.unwrap_or(0.0);

    let direction = if percent_change.abs() <= config.stable_threshold_pct {
        TrendDirection::Stable
    } else if percent_change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let sentiment = sentiment_for(direction, status);
    let normal = normal_band(ranges);
    let in_normal = normal.is_some_and(|band| band.contains(latest.value));
    let significant = is_significant(previous.value, latest.value, percent_change, normal, config);

    let label = if undefined_baseline {
        "New baseline, no previous value to compare".to_string()
    } else {
        trend_label(direction, sentiment, status, percent_change, in_normal)
    };

    Ok(Trend::Derived(TrendDescriptor {
        direction,
        percent_change,
        sentiment,
        label,
        undefined_baseline,
        significant,
        previous,
        latest,
    }))
}

fn is_significant(
    previous: f64,
    latest: f64,
    percent_change: f64,
    normal: Option<&ReferenceRange>,
    config: &LabConfig,
) -> bool {
    match normal {
        Some(normal) => {
            normal.contains(previous) != normal.contains(latest)
                || percent_change.abs() > config.range_change_pct
        }
        None => percent_change.abs() > config.significant_change_pct,
    }
}

/// Dải `balanced` đầu tiên của bảng, nếu có.
fn normal_band(ranges: &[ReferenceRange]) -> Option<&ReferenceRange> {
    ranges.iter().find(|range| range.status == Status::Balanced)
}

fn trend_label(
    direction: TrendDirection,
    sentiment: Sentiment,
    status: Status,
    percent_change: f64,
    in_normal: bool,
) -> String {
    let magnitude = percent_change.abs();
    let balanced = status == Status::Balanced;

    match direction {
        TrendDirection::Stable => format!(
            "Stable (±{magnitude:.1}%), {}",
            if in_normal { "normal range" } else { "monitor" }
        ),
        TrendDirection::Up => {
            let word = if balanced { "improvement" } else { "increase" };
            let suffix = if in_normal {
                "still normal"
            } else {
                match sentiment {
                    Sentiment::Positive => "positive",
                    Sentiment::Concerning => "concerning",
                    Sentiment::Neutral => "neutral",
                }
            };
            format!("↗ {magnitude:.1}% {word}, {suffix}")
        }
        TrendDirection::Down => {
            let word = if balanced { "decline" } else { "decrease" };
            let suffix = if in_normal {
                "still normal"
            } else {
                match sentiment {
                    Sentiment::Positive => "improvement",
                    Sentiment::Concerning => "monitor",
                    Sentiment::Neutral => "neutral",
                }
            };
            format!("↘ {magnitude:.1}% {word}, {suffix}")
        }
    }
}
