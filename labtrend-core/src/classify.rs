//! Phân loại giá trị đo vào dải tham chiếu.

use serde::{Deserialize, Serialize};

use crate::catalog::MetricCatalog;
use crate::model::{ReferenceRange, Status};
use crate::LabError;

/// Giá trị nằm trong dải hay bị kéo về dải gần nhất.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BandMatch {
    Within,
    Clamped,
}

/// Kết quả phân loại.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub label: String,
    pub status: Status,
    #[serde(rename = "match")]
    pub band_match: BandMatch,
}

/// Phân loại theo bảng dải của `metric_id`; mã lạ dùng bảng dự phòng.
pub fn classify(
    catalog: &MetricCatalog,
    metric_id: &str,
    value: f64,
) -> Result<Classification, LabError> {
    classify_with_ranges(value, &catalog.profile(metric_id).ranges)
        .or_else(|err| match err {
            LabError::MissingData => {
                classify_with_ranges(value, &catalog.fallback().ranges)
            }
            other => Err(other),
        })
}

/// Trả về dải đầu tiên chứa giá trị. Ngoài mọi dải thì chọn dải gần nhất,
/// hòa thì lấy dải đứng trước.
pub fn classify_with_ranges(
    value: f64,
    ranges: &[ReferenceRange],
) -> Result<Classification, LabError> {
    if !value.is_finite() {
        return Err(LabError::InvalidValue(value.to_string()));
    }

    if let Some(range) = ranges.iter().find(|range| range.contains(value)) {
        return Ok(Classification {
            label: range.label.clone(),
            status: range.status,
            band_match: BandMatch::Within,
        });
    }

    let nearest = ranges.iter().fold(None::<&ReferenceRange>, |best, range| match best {
        Some(current) if current.distance(value) <= range.distance(value) => Some(current),
        _ => Some(range),
    });

    let range = nearest.ok_or(LabError::MissingData)?;
    Ok(Classification {
        label: range.label.clone(),
        status: range.status,
        band_match: BandMatch::Clamped,
    })
}

/// Đọc giá trị số từ chuỗi nhập (bỏ khoảng trắng hai đầu).
pub fn parse_value(input: &str) -> Result<f64, LabError> {
    let trimmed = input.trim();
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| LabError::InvalidValue(trimmed.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LabError::InvalidValue(trimmed.to_string()))
    }
}
