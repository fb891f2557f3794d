//! Patient operations on top of a repository.

use chrono::Utc;
use labtrend_core::{ChartData, ChartLayout, Evaluator, LabError, Metric, PatientReport};
use tracing::{info, warn};

use crate::archive::{LabReport, ReportGroup, ReportQuery};
use crate::record::PatientRecord;
use crate::repository::{PatientRepository, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Lab(#[from] LabError),
    #[error("unknown metric {0}")]
    UnknownMetric(String),
}

/// Reads and mutates the stored record. Statuses written through the
/// service always come from the classifier.
pub struct PatientService<R: PatientRepository> {
    repository: R,
    evaluator: Evaluator,
}

impl<R: PatientRepository> PatientService<R> {
    pub fn new(repository: R, evaluator: Evaluator) -> Self {
        Self {
            repository,
            evaluator,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn record(&self) -> Result<PatientRecord, ServiceError> {
        Ok(self.repository.load()?)
    }

    pub fn rename(&self, name: &str) -> Result<(), ServiceError> {
        let mut record = self.repository.load()?;
        record.name = name.to_string();
        self.repository.save(&record)?;
        Ok(())
    }

    /// Stores a metric with its status derived from its value. A metric
    /// with the same id is replaced.
    pub fn add_metric(&self, mut metric: Metric) -> Result<Metric, ServiceError> {
        let mut record = self.repository.load()?;
        let as_of = self
            .evaluator
            .config()
            .as_of
            .unwrap_or(metric.last_updated)
            .max(metric.last_updated);
        let status = self.evaluator.derive_status(&metric, as_of)?;
        if status != metric.status {
            info!(
                metric = %metric.id,
                supplied = %metric.status,
                derived = %status,
                "overriding supplied status"
            );
            metric.status = status;
        }

        if record.upsert_metric(metric.clone()).is_some() {
            info!(metric = %metric.id, "replaced existing metric");
        }
        self.repository.save(&record)?;
        Ok(metric)
    }

    /// Returns `false` when the preference was already present.
    pub fn add_preference(&self, preference: &str) -> Result<bool, ServiceError> {
        let mut record = self.repository.load()?;
        if !record.add_preference(preference) {
            return Ok(false);
        }
        self.repository.save(&record)?;
        Ok(true)
    }

    /// Stores an uploaded report and returns how many are stored.
    pub fn add_report(&self, report: LabReport) -> Result<usize, ServiceError> {
        let mut record = self.repository.load()?;
        info!(report = %report.id, date = %report.date, "stored lab report");
        record.reports.push(report);
        self.repository.save(&record)?;
        Ok(record.reports.len())
    }

    /// Runs an archive query over the stored reports. Ages are counted
    /// from the configured `as_of`, otherwise from today.
    pub fn reports(&self, query: &ReportQuery) -> Result<Vec<ReportGroup>, ServiceError> {
        let record = self.repository.load()?;
        let anchor = self
            .evaluator
            .config()
            .as_of
            .unwrap_or_else(|| Utc::now().date_naive());
        Ok(query.run(&record.reports, anchor))
    }

    /// Rewrites stored statuses with the classifier's verdict and returns
    /// how many changed.
    pub fn reconcile_statuses(&self) -> Result<usize, ServiceError> {
        let mut record = self.repository.load()?;
        let as_of = self.evaluator.anchor(&record.metrics);

        let mut changed = 0;
        for metric in &mut record.metrics {
            let status = self.evaluator.derive_status(metric, as_of)?;
            if status != metric.status {
                warn!(
                    metric = %metric.id,
                    recorded = %metric.status,
                    derived = %status,
                    "stored status disagrees with classifier"
                );
                metric.status = status;
                changed += 1;
            }
        }

        if changed > 0 {
            self.repository.save(&record)?;
        }
        Ok(changed)
    }

    pub fn report(&self) -> Result<PatientReport, ServiceError> {
        let record = self.repository.load()?;
        Ok(crate::report_for_record(&record, &self.evaluator)?)
    }

    pub fn chart(
        &self,
        metric_id: &str,
        layout: &ChartLayout,
    ) -> Result<Option<ChartData>, ServiceError> {
        let record = self.repository.load()?;
        let metric = record
            .metric(metric_id)
            .ok_or_else(|| ServiceError::UnknownMetric(metric_id.to_string()))?;
        Ok(self.evaluator.chart(metric, layout)?)
    }
}
