//! Patient record JSON to `PatientReport` converter, report archive,
//! storage and service.

use labtrend_core::{Evaluator, LabConfig, LabError, PatientReport};
use serde_json::Value;
use tracing::{debug, warn};

mod archive;
mod record;
mod repository;
mod service;

pub use archive::{
    parse_reference, DateRange, GroupMode, LabReport, LabResult, ReferenceBounds, ReportGroup,
    ReportKind, ReportQuery, ReportStatus, ReportTab, ResultFlag, SortOrder, StatusFilter,
    RECENT_TAB_DAYS,
};
pub use record::{seed_patient, PatientRecord};
pub use repository::{InMemoryRepository, JsonFileRepository, PatientRepository, RepositoryError};
pub use service::{PatientService, ServiceError};

/// Summarize a patient record from a JSON string.
pub fn summarize_patient_str(
    record_json: &str,
    config: &LabConfig,
) -> Result<PatientReport, LabError> {
    let value: Value =
        serde_json::from_str(record_json).map_err(|err| LabError::Parse(err.to_string()))?;
    summarize_patient_value(&value, config)
}

/// Summarize a patient record from a `serde_json::Value`.
pub fn summarize_patient_value(
    record: &Value,
    config: &LabConfig,
) -> Result<PatientReport, LabError> {
    if !record.is_object() {
        return Err(LabError::Parse(
            "Expected a patient record object".to_string(),
        ));
    }
    if record.get("metrics").and_then(Value::as_array).is_none() {
        return Err(LabError::MissingData);
    }

    let record: PatientRecord = serde_json::from_value(record.clone())
        .map_err(|err| LabError::Parse(err.to_string()))?;
    report_for_record(&record, &Evaluator::with_config(config.clone()))
}

pub(crate) fn report_for_record(
    record: &PatientRecord,
    evaluator: &Evaluator,
) -> Result<PatientReport, LabError> {
    for metric in &record.metrics {
        if !metric.history_is_ordered() {
            warn!(metric = %metric.id, "history is not in date order, sorting before use");
        }
        if !metric.history_matches_value() {
            warn!(
                metric = %metric.id,
                value = metric.value,
                "latest history entry differs from the current value"
            );
        }
    }

    let report = evaluator.report(&record.name, &record.metrics, &record.preferences)?;
    debug!(
        patient = %report.patient,
        as_of = %report.as_of,
        metrics = report.evaluations.len(),
        "built patient report"
    );
    Ok(report)
}
