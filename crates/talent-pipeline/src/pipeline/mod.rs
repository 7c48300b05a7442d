//! Applicant pipeline: entity store seam, predicate engine, stage grouping,
//! audited transitions and derived stage metrics.

pub mod capacity;
pub mod clock;
pub mod domain;
pub mod filters;
pub mod grouping;
pub mod metrics;
pub mod repository;
pub mod router;
pub mod service;
mod settings;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use capacity::{classify_capacity, CapacityStatus, StageCapacity};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Activity, ActivityKind, Actor, Application, ApplicationId, ApplicationStatus,
    EmploymentType, Job, JobId, JobStatus, Note, NoteDraft, Stage,
};
pub use filters::{
    filter_applications, filter_jobs, sort_applications, ApplicantFilters, JobFilters,
    SortDirection, SortKey, SortOrder,
};
pub use grouping::{group_by_stage, StageGroups};
pub use metrics::{compute_stage_metrics, MetricsPolicy, StageMetrics, Trend};
pub use repository::{
    ApplicationRepository, DiscardSnapshots, JobRepository, PipelineSnapshot, PublishError,
    RepositoryError, SnapshotPublisher,
};
pub use router::{pipeline_router, ACTOR_HEADER};
pub use service::{PipelineService, PipelineServiceError};
pub use settings::PipelineSettings;
pub use store::InMemoryPipelineStore;
pub use views::{BulkMoveFailure, BulkMoveReport, PipelineBoard, StageColumn, StageTransition};
