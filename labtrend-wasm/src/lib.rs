//! Bridge WASM <-> JavaScript trung lập framework.

use labtrend_core::{
    derive_trend as derive_trend_core, ChartLayout, HistoryPoint, LabConfig, LabError,
    MetricCatalog, Status,
};
use labtrend_records::{LabReport, ReportQuery};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsLabConfig {
    #[serde(default)]
    stable_threshold_pct: Option<f64>,
    #[serde(default)]
    significant_change_pct: Option<f64>,
    #[serde(default)]
    range_change_pct: Option<f64>,
    #[serde(default)]
    fresh_days: Option<u32>,
    #[serde(default)]
    overdue_days: Option<u32>,
    #[serde(default)]
    as_of: Option<String>,
}

impl JsLabConfig {
    fn into_config(self) -> Result<LabConfig, LabError> {
        let mut base = LabConfig::default();
        if let Some(pct) = self.stable_threshold_pct {
            base.stable_threshold_pct = pct;
        }
        if let Some(pct) = self.significant_change_pct {
            base.significant_change_pct = pct;
        }
        if let Some(pct) = self.range_change_pct {
            base.range_change_pct = pct;
        }
        if let Some(days) = self.fresh_days {
            base.fresh_days = days;
        }
        if let Some(days) = self.overdue_days {
            base.overdue_days = days;
        }
        if let Some(as_of) = self.as_of {
            let date = chrono::NaiveDate::parse_from_str(&as_of, "%Y-%m-%d")
                .map_err(|err| LabError::Parse(format!("as_of {as_of}: {err}")))?;
            base.as_of = Some(date);
        }
        Ok(base)
    }
}

fn read_config(config: Option<JsValue>) -> Result<LabConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsLabConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            cfg.into_config()
                .map_err(|err| JsValue::from_str(&format_lab_error(err)))
        }
        _ => Ok(LabConfig::default()),
    }
}

/// Tạo báo cáo từ bản ghi bệnh nhân (định dạng lưu trong trình duyệt).
#[wasm_bindgen]
pub fn summarize_patient(record: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let record_value = from_value::<serde_json::Value>(record)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được bản ghi: {err}")))?;
    let cfg = read_config(config)?;

    let report = labtrend_records::summarize_patient_value(&record_value, &cfg)
        .map_err(|err| JsValue::from_str(&format_lab_error(err)))?;

    to_value(&report).map_err(|err| JsValue::from_str(&format!("Không serialize báo cáo: {err}")))
}

/// Phân loại một giá trị theo bảng dải của chỉ số.
#[wasm_bindgen]
pub fn classify_value(metric_id: &str, value: f64) -> Result<JsValue, JsValue> {
    let classification = labtrend_core::classify(&MetricCatalog::builtin(), metric_id, value)
        .map_err(|err| JsValue::from_str(&format_lab_error(err)))?;
    to_value(&classification)
        .map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

/// Suy xu hướng cho lịch sử `[{date, value}]` với trạng thái đã biết.
#[wasm_bindgen]
pub fn derive_trend(
    history: JsValue,
    status: &str,
    metric_id: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let history: Vec<HistoryPoint> = from_value(history)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được lịch sử: {err}")))?;
    let status = parse_status(status)?;
    let cfg = read_config(config)?;
    let catalog = MetricCatalog::builtin();

    let trend = derive_trend_core(&history, status, &catalog.profile(metric_id).ranges, &cfg)
        .map_err(|err| JsValue::from_str(&format_lab_error(err)))?;
    to_value(&trend).map_err(|err| JsValue::from_str(&format!("Không serialize xu hướng: {err}")))
}

/// Dữ liệu biểu đồ đã quy đổi tọa độ; `null` khi chưa đủ hai điểm.
#[wasm_bindgen]
pub fn prepare_chart(
    history: JsValue,
    metric_id: &str,
    width: f64,
    height: f64,
) -> Result<JsValue, JsValue> {
    let history: Vec<HistoryPoint> = from_value(history)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được lịch sử: {err}")))?;
    let catalog = MetricCatalog::builtin();
    let layout = ChartLayout::with_size(width, height);

    let chart = labtrend_core::prepare_chart(&history, &catalog.profile(metric_id).ranges, &layout)
        .map_err(|err| JsValue::from_str(&format_lab_error(err)))?;
    match chart {
        Some(chart) => to_value(&chart)
            .map_err(|err| JsValue::from_str(&format!("Không serialize biểu đồ: {err}"))),
        None => Ok(JsValue::NULL),
    }
}

/// Lọc, sắp xếp và nhóm danh sách báo cáo xét nghiệm theo truy vấn.
#[wasm_bindgen]
pub fn query_reports(
    reports: JsValue,
    query: Option<JsValue>,
    as_of: Option<String>,
) -> Result<JsValue, JsValue> {
    let reports: Vec<LabReport> = from_value(reports)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được báo cáo: {err}")))?;
    let query: ReportQuery = match query {
        Some(js_query) if !js_query.is_undefined() && !js_query.is_null() => from_value(js_query)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được truy vấn: {err}")))?,
        _ => ReportQuery::default(),
    };
    let anchor = match as_of {
        Some(date) => chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|err| JsValue::from_str(&format!("Ngày không hợp lệ {date}: {err}")))?,
        None => chrono::Utc::now().date_naive(),
    };

    to_value(&query.run(&reports, anchor))
        .map_err(|err| JsValue::from_str(&format!("Không serialize nhóm báo cáo: {err}")))
}

fn parse_status(status: &str) -> Result<Status, JsValue> {
    Status::ALL
        .into_iter()
        .find(|candidate| candidate.as_str() == status)
        .ok_or_else(|| JsValue::from_str(&format!("Trạng thái không hợp lệ: {status}")))
}

fn format_lab_error(err: LabError) -> String {
    format!("Lab error: {err}")
}
