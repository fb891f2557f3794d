//! Patient record wire format and the default seed panel.

use chrono::NaiveDate;
use labtrend_core::{Category, HistoryPoint, Metric, Status};
use serde::{Deserialize, Serialize};

use crate::archive::LabReport;

/// Everything stored for one patient, in the camelCase layout of the
/// browser-side store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub name: String,
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub reports: Vec<LabReport>,
}

impl PatientRecord {
    pub fn metric(&self, metric_id: &str) -> Option<&Metric> {
        self.metrics.iter().find(|metric| metric.id == metric_id)
    }

    /// Insert or replace by metric id. Returns the replaced metric, if any.
    pub fn upsert_metric(&mut self, metric: Metric) -> Option<Metric> {
        match self.metrics.iter_mut().find(|existing| existing.id == metric.id) {
            Some(existing) => Some(std::mem::replace(existing, metric)),
            None => {
                self.metrics.push(metric);
                None
            }
        }
    }

    /// Adds a preference unless it is already present.
    pub fn add_preference(&mut self, preference: &str) -> bool {
        if self.preferences.iter().any(|existing| existing == preference) {
            return false;
        }
        self.preferences.push(preference.to_string());
        true
    }
}

/// Default patient used when nothing has been stored yet.
pub fn seed_patient() -> PatientRecord {
    PatientRecord {
        name: "Alex".to_string(),
        metrics: vec![
            seed_metric(
                "glucose",
                "Blood Glucose",
                "mg/dL",
                Status::Balanced,
                Category::Blood,
                [98.0, 102.0, 97.0, 95.0],
                "Blood glucose measures the amount of sugar in your blood. Normal fasting levels are below 100 mg/dL.",
            ),
            seed_metric(
                "vitd",
                "Vitamin D",
                "ng/mL",
                Status::Manage,
                Category::Vitamins,
                [22.0, 24.0, 26.0, 28.0],
                "Vitamin D is essential for bone health and immune function. Levels between 30-50 ng/mL are considered optimal.",
            ),
            seed_metric(
                "ldl",
                "LDL Cholesterol",
                "mg/dL",
                Status::Consult,
                Category::Blood,
                [155.0, 150.0, 145.0, 142.0],
                "LDL cholesterol is often called 'bad' cholesterol. Levels below 100 mg/dL are considered optimal for most people.",
            ),
            seed_metric(
                "bp",
                "Blood Pressure",
                "mmHg",
                Status::Manage,
                Category::Heart,
                [135.0, 132.0, 130.0, 128.0],
                "Blood pressure measures the force of blood against your artery walls. Normal is less than 120/80 mmHg.",
            ),
            seed_metric(
                "protein",
                "Urine Protein",
                "mg/dL",
                Status::Balanced,
                Category::Urine,
                [0.0, 0.0, 0.0, 0.0],
                "Protein in urine can indicate kidney issues. Normal levels are 0 mg/dL.",
            ),
        ],
        preferences: vec![
            "Blood sugar".to_string(),
            "Vitamin D".to_string(),
            "Cholesterol".to_string(),
        ],
        reports: Vec::new(),
    }
}

const SEED_DATES: [(i32, u32, u32); 4] = [(2023, 1, 15), (2023, 2, 15), (2023, 3, 15), (2023, 4, 15)];

fn seed_metric(
    id: &str,
    name: &str,
    unit: &str,
    status: Status,
    category: Category,
    values: [f64; 4],
    description: &str,
) -> Metric {
    let history: Vec<HistoryPoint> = SEED_DATES
        .iter()
        .zip(values)
        .filter_map(|((year, month, day), value)| {
            NaiveDate::from_ymd_opt(*year, *month, *day).map(|date| HistoryPoint { date, value })
        })
        .collect();
    let last_updated = history
        .last()
        .map(|point| point.date)
        .unwrap_or_default();

    Metric {
        id: id.to_string(),
        name: name.to_string(),
        value: values[3],
        unit: unit.to_string(),
        status,
        category,
        last_updated,
        history,
        description: Some(description.to_string()),
    }
}
