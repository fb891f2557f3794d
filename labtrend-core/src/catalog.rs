//! Bảng cấu hình theo từng loại chỉ số: dải tham chiếu, giải thích, gợi ý lối sống.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ReferenceRange, Status};

const RED: &str = "rgba(239, 68, 68, 0.2)";
const TEAL: &str = "rgba(20, 184, 166, 0.2)";
const AMBER: &str = "rgba(245, 158, 11, 0.2)";
const AMBER_STRONG: &str = "rgba(245, 158, 11, 0.3)";

/// Mã chỉ số dùng cho bảng dự phòng.
pub const FALLBACK_METRIC_ID: &str = "default";

/// Gợi ý lối sống hiển thị dưới phần "bước tiếp theo".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifestyleTip {
    pub kind: TipKind,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    Nutrition,
    Activity,
}

/// Toàn bộ thông tin tĩnh gắn với một loại chỉ số.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricProfile {
    pub id: String,
    pub ranges: Vec<ReferenceRange>,
    pub normal_range: String,
    pub why_it_matters: String,
    pub tips: Vec<LifestyleTip>,
}

/// Danh mục tra cứu theo mã chỉ số, có bảng dự phòng cho mã lạ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricCatalog {
    profiles: BTreeMap<String, MetricProfile>,
    fallback: MetricProfile,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MetricCatalog {
    /// Danh mục dựng sẵn cho các chỉ số của bảng xét nghiệm mặc định.
    pub fn builtin() -> Self {
        let profiles = [glucose(), vitamin_d(), ldl(), blood_pressure(), urine_protein()]
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();

        Self {
            profiles,
            fallback: fallback_profile(),
        }
    }

    /// Thêm hoặc thay thế hồ sơ của một chỉ số.
    pub fn with_profile(mut self, profile: MetricProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    /// Hồ sơ cho mã chỉ số; mã lạ trả về bảng dự phòng.
    pub fn profile(&self, metric_id: &str) -> &MetricProfile {
        self.profiles.get(metric_id).unwrap_or(&self.fallback)
    }

    pub fn is_known(&self, metric_id: &str) -> bool {
        self.profiles.contains_key(metric_id)
    }

    pub fn fallback(&self) -> &MetricProfile {
        &self.fallback
    }
}

/// Hành động chính gợi ý cho từng trạng thái.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceAction {
    AskCoach,
    BookConsultation,
    ScheduleTest,
}

/// Nội dung giải thích theo trạng thái.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusGuidance {
    pub summary: String,
    pub recommendation: String,
    pub next_steps: String,
    pub follow_up: Option<String>,
    pub action: GuidanceAction,
}

impl Status {
    pub fn guidance(self) -> StatusGuidance {
        match self {
            Status::Balanced => StatusGuidance {
                summary: "Your result is within the normal range, which is a positive sign for your overall health. This indicates your body is functioning as expected for this measurement.".to_string(),
                recommendation: "Maintain your current health practices and continue with regular check-ups as recommended by your healthcare provider.".to_string(),
                next_steps: "Continue your current health practices and monitor regularly.".to_string(),
                follow_up: None,
                action: GuidanceAction::AskCoach,
            },
            Status::Manage => StatusGuidance {
                summary: "Your result is outside the optimal range but doesn't require immediate medical attention. Several factors like diet, exercise, stress, or medications could be influencing this value.".to_string(),
                recommendation: "Consider reviewing your lifestyle habits such as diet, physical activity, and stress management. Monitor this value more regularly and discuss it at your next healthcare visit.".to_string(),
                next_steps: "Consider lifestyle adjustments like diet modifications and more frequent monitoring.".to_string(),
                follow_up: Some("Consider more frequent monitoring to track how lifestyle changes affect your results. Retest in 3 months.".to_string()),
                action: GuidanceAction::AskCoach,
            },
            Status::Consult => StatusGuidance {
                summary: "Your result falls significantly outside the expected range, which may indicate a health concern that warrants attention. This could be related to various underlying factors.".to_string(),
                recommendation: "We recommend consulting with your healthcare provider soon to discuss this result. They may suggest additional testing or treatment options. Continue following your current medication and health routines until you receive professional guidance.".to_string(),
                next_steps: "Schedule a follow-up with your healthcare provider to discuss these results.".to_string(),
                follow_up: Some("Consult with your healthcare provider to determine appropriate follow-up testing. They may recommend testing in 1-2 months.".to_string()),
                action: GuidanceAction::BookConsultation,
            },
            Status::Book => StatusGuidance {
                summary: "This test needs to be scheduled. Regular monitoring helps establish your personal baselines and track important changes over time.".to_string(),
                recommendation: "Schedule this test at your convenience. Consistent testing allows your healthcare provider to monitor your health effectively and address potential concerns early.".to_string(),
                next_steps: "Follow up with your healthcare provider for guidance.".to_string(),
                follow_up: Some("Schedule a follow-up test to establish your baseline and track improvements over time.".to_string()),
                action: GuidanceAction::ScheduleTest,
            },
        }
    }
}

fn tips(nutrition: (&str, &str), activity: (&str, &str)) -> Vec<LifestyleTip> {
    vec![
        LifestyleTip {
            kind: TipKind::Nutrition,
            title: nutrition.0.to_string(),
            detail: nutrition.1.to_string(),
        },
        LifestyleTip {
            kind: TipKind::Activity,
            title: activity.0.to_string(),
            detail: activity.1.to_string(),
        },
    ]
}

fn glucose() -> MetricProfile {
    MetricProfile {
        id: "glucose".to_string(),
        ranges: vec![
            ReferenceRange::bounded(0.0, 70.0, "Low", Status::Consult, RED),
            ReferenceRange::bounded(70.0, 99.0, "Normal", Status::Balanced, TEAL),
            ReferenceRange::bounded(99.0, 125.0, "Pre-diabetic", Status::Manage, AMBER),
            ReferenceRange::bounded(125.0, 200.0, "Diabetic", Status::Consult, RED),
        ],
        normal_range: "70-99 mg/dL (fasting)".to_string(),
        why_it_matters: "Blood glucose is a key indicator of how your body processes sugar. Monitoring helps identify risk for diabetes and metabolic issues early.".to_string(),
        tips: tips(
            (
                "Balance your carbohydrate intake",
                "Choose complex carbohydrates like whole grains and limit simple sugars to better regulate blood glucose levels.",
            ),
            (
                "Regular physical activity",
                "Aim for 150 minutes of moderate exercise weekly to improve insulin sensitivity and help regulate blood sugar levels.",
            ),
        ),
    }
}

fn vitamin_d() -> MetricProfile {
    MetricProfile {
        id: "vitd".to_string(),
        ranges: vec![
            ReferenceRange::bounded(0.0, 20.0, "Deficient", Status::Consult, RED),
            ReferenceRange::bounded(20.0, 30.0, "Insufficient", Status::Manage, AMBER),
            ReferenceRange::bounded(30.0, 50.0, "Optimal", Status::Balanced, TEAL),
            ReferenceRange::bounded(50.0, 100.0, "High", Status::Manage, AMBER),
        ],
        normal_range: "30-50 ng/mL".to_string(),
        why_it_matters: "Vitamin D is essential for bone health, immune function, and mood regulation. Adequate levels support overall wellness.".to_string(),
        tips: tips(
            (
                "Increase sun exposure and dietary vitamin D",
                "Spend 15-30 minutes in sunlight several times a week and consume vitamin D-rich foods like fatty fish and fortified dairy.",
            ),
            (
                "Outdoor exercise routine",
                "Combine vitamin D production with exercise by walking, jogging, or cycling outdoors during daylight hours.",
            ),
        ),
    }
}

fn ldl() -> MetricProfile {
    MetricProfile {
        id: "ldl".to_string(),
        ranges: vec![
            ReferenceRange::bounded(0.0, 100.0, "Optimal", Status::Balanced, TEAL),
            ReferenceRange::bounded(100.0, 130.0, "Near optimal", Status::Manage, AMBER),
            ReferenceRange::bounded(130.0, 160.0, "Borderline high", Status::Consult, AMBER_STRONG),
            ReferenceRange::bounded(160.0, 190.0, "High", Status::Consult, RED),
        ],
        normal_range: "<100 mg/dL".to_string(),
        why_it_matters: "LDL cholesterol, often called 'bad' cholesterol, can build up in your arteries. Keeping levels in check reduces heart disease risk.".to_string(),
        tips: tips(
            (
                "Reduce saturated fat consumption",
                "Replace saturated fats with heart-healthy unsaturated fats found in olive oil, nuts, and avocados.",
            ),
            (
                "Consistent aerobic exercise",
                "Include 30 minutes of heart-healthy exercise most days to help lower LDL cholesterol and raise HDL cholesterol.",
            ),
        ),
    }
}

fn blood_pressure() -> MetricProfile {
    MetricProfile {
        id: "bp".to_string(),
        ranges: vec![
            ReferenceRange::bounded(0.0, 90.0, "Low", Status::Consult, RED),
            ReferenceRange::bounded(90.0, 120.0, "Normal", Status::Balanced, TEAL),
            ReferenceRange::bounded(120.0, 140.0, "Elevated", Status::Manage, AMBER),
            ReferenceRange::bounded(140.0, 180.0, "High", Status::Consult, RED),
        ],
        normal_range: "<120/80 mmHg".to_string(),
        why_it_matters: "Blood pressure measures the force of blood against artery walls. Healthy levels reduce strain on your heart and blood vessels.".to_string(),
        tips: tips(
            (
                "Reduce sodium intake",
                "Aim to consume less than 2,300mg of sodium per day. Read nutrition labels and choose low-sodium options.",
            ),
            (
                "Daily moderate exercise",
                "Regular exercise for 30 minutes most days can lower your blood pressure by 5-8 mmHg over time.",
            ),
        ),
    }
}

fn urine_protein() -> MetricProfile {
    MetricProfile {
        id: "protein".to_string(),
        ranges: vec![
            ReferenceRange::bounded(0.0, 0.0, "Normal", Status::Balanced, TEAL),
            ReferenceRange::bounded(0.0, 30.0, "Trace", Status::Manage, AMBER),
            ReferenceRange::bounded(30.0, 100.0, "Elevated", Status::Consult, RED),
        ],
        normal_range: "0 mg/dL".to_string(),
        why_it_matters: "Protein in urine can indicate how well your kidneys are filtering. Normal levels suggest healthy kidney function.".to_string(),
        tips: tips(
            (
                "Stay properly hydrated",
                "Drink at least 8 glasses of water daily to support kidney function and help flush toxins.",
            ),
            (
                "Appropriate exercise intensity",
                "Moderate your exercise intensity and stay hydrated to reduce stress on kidneys, especially if protein levels are elevated.",
            ),
        ),
    }
}

fn fallback_profile() -> MetricProfile {
    MetricProfile {
        id: FALLBACK_METRIC_ID.to_string(),
        ranges: vec![ReferenceRange::bounded(0.0, 100.0, "Normal", Status::Balanced, TEAL)],
        normal_range: "Consult your provider".to_string(),
        why_it_matters: "This measurement helps your healthcare provider understand your overall health and identify potential areas for improvement.".to_string(),
        tips: tips(
            (
                "Optimize your nutrition",
                "Focus on a balanced diet rich in fruits, vegetables, lean protein, and healthy fats.",
            ),
            (
                "Maintain active lifestyle",
                "Regular physical activity improves overall health and can positively impact multiple health markers.",
            ),
        ),
    }
}
