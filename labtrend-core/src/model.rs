//! Mô hình dữ liệu cho chỉ số xét nghiệm và lịch sử đo.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hành động khuyến nghị cho bệnh nhân ứng với một chỉ số.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Balanced,
    Manage,
    Consult,
    Book,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Balanced,
        Status::Manage,
        Status::Consult,
        Status::Book,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Balanced => "balanced",
            Status::Manage => "manage",
            Status::Consult => "consult",
            Status::Book => "book",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nhóm hiển thị của chỉ số.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Blood,
    Vitamins,
    Heart,
    Urine,
    Organ,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Blood,
        Category::Heart,
        Category::Vitamins,
        Category::Urine,
        Category::Organ,
    ];

    /// Tiêu đề nhóm như trên trang kết quả.
    pub fn profile_title(self) -> &'static str {
        match self {
            Category::Blood => "Blood health",
            Category::Heart => "Heart & cholesterol",
            Category::Vitamins => "Vitamins",
            Category::Urine | Category::Organ => "Organ function",
        }
    }
}

/// Một lần đo trong lịch sử.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Một chỉ số sức khỏe được theo dõi.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: Status,
    pub category: Category,
    pub last_updated: NaiveDate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Metric {
    /// Lịch sử đã sắp xếp tăng dần theo ngày (ổn định với ngày trùng).
    pub fn ordered_history(&self) -> Vec<HistoryPoint> {
        let mut points = self.history.clone();
        points.sort_by_key(|point| point.date);
        points
    }

    pub fn history_is_ordered(&self) -> bool {
        self.history.windows(2).all(|pair| pair[0].date <= pair[1].date)
    }

    /// Điểm cuối của lịch sử có khớp với giá trị hiện tại không.
    /// Lịch sử rỗng được coi là khớp.
    pub fn history_matches_value(&self) -> bool {
        match self.ordered_history().last() {
            Some(last) => (last.value - self.value).abs() < f64::EPSILON,
            None => true,
        }
    }
}

/// Một dải tham chiếu có nhãn. `None` nghĩa là không giới hạn ở đầu đó.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub label: String,
    pub color: String,
    pub status: Status,
}

impl ReferenceRange {
    pub fn bounded(min: f64, max: f64, label: &str, status: Status, color: &str) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            label: label.to_string(),
            color: color.to_string(),
            status,
        }
    }

    /// Hai đầu đều bao gồm; đầu không giới hạn luôn thỏa.
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Khoảng cách từ giá trị tới dải, bằng 0 khi nằm trong dải.
    pub fn distance(&self, value: f64) -> f64 {
        if let Some(min) = self.min {
            if value < min {
                return min - value;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return value - max;
            }
        }
        0.0
    }
}
