use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, Job, JobId};

/// Storage abstraction for applications so the service can be exercised in isolation.
///
/// `list` must return records in insertion order.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    /// Replace a stored record. Implementations reject the write with
    /// [`RepositoryError::VersionMismatch`] when `application.version` no longer
    /// matches the stored version, and bump the version on success.
    fn update(&self, application: Application) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn list(&self) -> Result<Vec<Application>, RepositoryError>;
}

/// Storage abstraction for job listings.
pub trait JobRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn update_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently (expected version {expected}, found {found})")]
    VersionMismatch { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Post-mutation state handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub taken_at: DateTime<Utc>,
    pub applications: Vec<Application>,
    pub jobs: Vec<Job>,
}

/// Outbound persistence hook. Delivery is fire-and-forget from the service's
/// point of view; failures are logged, never returned to callers.
pub trait SnapshotPublisher: Send + Sync {
    fn publish(&self, snapshot: PipelineSnapshot) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("snapshot transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that discards snapshots.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSnapshots;

impl SnapshotPublisher for DiscardSnapshots {
    fn publish(&self, _snapshot: PipelineSnapshot) -> Result<(), PublishError> {
        Ok(())
    }
}
