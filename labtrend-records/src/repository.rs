//! Storage for the patient record.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::record::{seed_patient, PatientRecord};

/// Load/save contract for patient data.
pub trait PatientRepository: Send + Sync {
    fn load(&self) -> Result<PatientRecord, RepositoryError>;
    fn save(&self, record: &PatientRecord) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid patient record: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Keeps the record in process memory.
#[derive(Debug)]
pub struct InMemoryRepository {
    record: Mutex<PatientRecord>,
}

impl InMemoryRepository {
    pub fn new(record: PatientRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_patient())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::seeded()
    }
}

impl PatientRepository for InMemoryRepository {
    fn load(&self) -> Result<PatientRecord, RepositoryError> {
        self.record
            .lock()
            .map(|record| record.clone())
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))
    }

    fn save(&self, record: &PatientRecord) -> Result<(), RepositoryError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        *guard = record.clone();
        Ok(())
    }
}

/// Stores the record as pretty JSON in a single file. A missing file
/// loads as the seed patient.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PatientRepository for JsonFileRepository {
    fn load(&self) -> Result<PatientRecord, RepositoryError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no stored record, using seed patient");
            return Ok(seed_patient());
        }

        let data = fs::read_to_string(&self.path).map_err(|err| self.io_error(err))?;
        let record: PatientRecord = serde_json::from_str(&data)?;
        debug!(
            path = %self.path.display(),
            metrics = record.metrics.len(),
            "loaded patient record"
        );
        Ok(record)
    }

    fn save(&self, record: &PatientRecord) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let data = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, data).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), "saved patient record");
        Ok(())
    }
}
