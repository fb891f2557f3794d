//! Chuẩn bị dữ liệu biểu đồ dải tham chiếu, độc lập với backend vẽ.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{HistoryPoint, ReferenceRange};
use crate::LabError;

const Y_AXIS_STEPS: usize = 5;
const MAX_DATE_LABELS: usize = 4;

/// Khoảng cách (px) tối đa để một cú nhấp chọn được điểm gần nhất.
pub const TOOLTIP_HIT_DISTANCE: f64 = 20.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartPadding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Kích thước khung vẽ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub padding: ChartPadding,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 320.0,
            height: 200.0,
            padding: ChartPadding {
                top: 20.0,
                right: 20.0,
                bottom: 30.0,
                left: 40.0,
            },
        }
    }
}

impl ChartLayout {
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    fn plot_width(&self) -> f64 {
        self.width - self.padding.left - self.padding.right
    }

    fn plot_height(&self) -> f64 {
        self.height - self.padding.top - self.padding.bottom
    }

    fn baseline(&self) -> f64 {
        self.height - self.padding.bottom
    }
}

/// Một dải tham chiếu đã quy đổi sang tọa độ dọc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartBand {
    pub label: String,
    pub color: String,
    pub y_top: f64,
    pub y_bottom: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub date: NaiveDate,
    pub band: Option<String>,
}

/// Nhãn trục: `position` là y với trục tung, x với trục hoành.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartTick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    pub domain_min: f64,
    pub domain_max: f64,
    pub bands: Vec<ChartBand>,
    pub points: Vec<ChartPoint>,
    pub y_ticks: Vec<ChartTick>,
    pub x_labels: Vec<ChartTick>,
}

impl ChartData {
    /// Điểm gần nhất theo trục hoành, chỉ khi nằm trong `max_distance`.
    pub fn nearest_point(&self, x: f64, max_distance: f64) -> Option<&ChartPoint> {
        let mut best: Option<(&ChartPoint, f64)> = None;
        for point in &self.points {
            let distance = (point.x - x).abs();
            match best {
                Some((_, current)) if current <= distance => {}
                _ => best = Some((point, distance)),
            }
        }
        best.filter(|(_, distance)| *distance < max_distance)
            .map(|(point, _)| point)
    }
}

/// Dựng dữ liệu biểu đồ. Dưới hai điểm thì không có biểu đồ.
pub fn prepare_chart(
    history: &[HistoryPoint],
    ranges: &[ReferenceRange],
    layout: &ChartLayout,
) -> Result<Option<ChartData>, LabError> {
    if let Some(point) = history.iter().find(|point| !point.value.is_finite()) {
        return Err(LabError::InvalidValue(point.value.to_string()));
    }

    let mut points = history.to_vec();
    points.sort_by_key(|point| point.date);
    if points.len() < 2 {
        return Ok(None);
    }

    let (domain_min, domain_max) = domain(&points, ranges);
    let span = match domain_max - domain_min {
        s if s == 0.0 => 1.0,
        s => s,
    };
    let to_y = |value: f64| layout.baseline() - (value - domain_min) / span * layout.plot_height();
    let last_index = (points.len() - 1) as f64;
    let to_x = |index: usize| layout.padding.left + index as f64 / last_index * layout.plot_width();

    let bands = ranges
        .iter()
        .map(|range| ChartBand {
            label: range.label.clone(),
            color: range.color.clone(),
            y_top: to_y(range.max.unwrap_or(domain_max)),
            y_bottom: to_y(range.min.unwrap_or(domain_min)),
        })
        .collect();

    let chart_points = points
        .iter()
        .enumerate()
        .map(|(index, point)| ChartPoint {
            x: to_x(index),
            y: to_y(point.value),
            value: point.value,
            date: point.date,
            band: ranges
                .iter()
                .find(|range| range.contains(point.value))
                .map(|range| range.label.clone()),
        })
        .collect();

    let y_ticks = (0..=Y_AXIS_STEPS)
        .map(|step| {
            let value = domain_min + span / Y_AXIS_STEPS as f64 * step as f64;
            ChartTick {
                position: layout.baseline()
                    - step as f64 / Y_AXIS_STEPS as f64 * layout.plot_height(),
                label: format!("{value:.0}"),
            }
        })
        .collect();

    let shown = points.len().min(MAX_DATE_LABELS);
    let stride = points.len().div_ceil(shown);
    let x_labels = (0..points.len())
        .step_by(stride)
        .map(|index| ChartTick {
            position: to_x(index),
            label: points[index].date.format("%b %-d").to_string(),
        })
        .collect();

    Ok(Some(ChartData {
        domain_min,
        domain_max,
        bands,
        points: chart_points,
        y_ticks,
        x_labels,
    }))
}

/// Miền giá trị: lịch sử nới 10% hai phía, hợp với các đầu dải có giới hạn.
fn domain(points: &[HistoryPoint], ranges: &[ReferenceRange]) -> (f64, f64) {
    let values = points.iter().map(|point| point.value);
    let low = values.clone().fold(f64::INFINITY, f64::min) * 0.9;
    let high = values.fold(f64::NEG_INFINITY, f64::max) * 1.1;

    let range_low = ranges
        .iter()
        .flat_map(|range| [range.min, range.max])
        .flatten()
        .fold(f64::INFINITY, f64::min);
    let range_high = ranges
        .iter()
        .flat_map(|range| [range.min, range.max])
        .flatten()
        .fold(f64::NEG_INFINITY, f64::max);

    (low.min(range_low), high.max(range_high))
}
