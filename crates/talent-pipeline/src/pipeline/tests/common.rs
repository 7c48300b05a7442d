use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::pipeline::domain::{
    Activity, ActivityKind, Application, ApplicationId, ApplicationStatus, EmploymentType, Job,
    JobId, JobStatus, Stage,
};
use crate::pipeline::repository::{
    ApplicationRepository, JobRepository, PipelineSnapshot, PublishError, RepositoryError,
    SnapshotPublisher,
};
use crate::pipeline::{
    pipeline_router, Actor, FixedClock, InMemoryPipelineStore, PipelineService, PipelineSettings,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn actor() -> Actor {
    Actor::new("recruiter@example.com")
}

pub(super) fn application(id: &str, name: &str, stage: Stage) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        candidate_name: name.to_string(),
        candidate_email: format!("{}@example.com", name.to_lowercase()),
        job_id: Some(JobId("job-backend".to_string())),
        job_title: "Backend Engineer".to_string(),
        status: ApplicationStatus::Stage(stage),
        match_score: None,
        applied_at: days_ago(30),
        skills: Vec::new(),
        tags: Vec::new(),
        assigned_recruiter: None,
        location: None,
        experience: None,
        resume_url: None,
        notes: Vec::new(),
        activities: Vec::new(),
        version: 0,
    }
}

pub(super) fn scored(id: &str, stage: Stage, score: u8) -> Application {
    let mut application = application(id, &format!("Candidate {id}"), stage);
    application.match_score = Some(score);
    application
}

pub(super) fn unrecognized(id: &str, raw: &str) -> Application {
    let mut application = application(id, "Orphan", Stage::New);
    application.status = ApplicationStatus::Unrecognized(raw.to_string());
    application
}

/// Append a recorded `status_change` to `application` without going through the service.
pub(super) fn moved(mut application: Application, to: Stage, at: DateTime<Utc>) -> Application {
    let from_stage = application.stage();
    application.status = ApplicationStatus::Stage(to);
    application.activities.push(Activity {
        id: format!("hist-{}", application.activities.len() + 1),
        kind: ActivityKind::StatusChange,
        description: format!("Moved to {to}"),
        actor: "history".to_string(),
        timestamp: at,
        from_stage,
        to_stage: Some(to),
    });
    application
}

pub(super) fn job(id: &str, title: &str, status: JobStatus) -> Job {
    Job {
        id: JobId(id.to_string()),
        title: title.to_string(),
        status,
        location: "Remote".to_string(),
        employment_type: EmploymentType::FullTime,
        applications: 0,
        views: 0,
        created_at: days_ago(60),
        expires_at: None,
        skills: vec!["Rust".to_string()],
        description: format!("{title} working on the hiring platform"),
        requirements: Vec::new(),
        responsibilities: Vec::new(),
    }
}

pub(super) fn build_service(
    applications: Vec<Application>,
) -> (
    PipelineService<InMemoryPipelineStore, MemorySnapshots>,
    Arc<InMemoryPipelineStore>,
    Arc<MemorySnapshots>,
    Arc<FixedClock>,
) {
    build_service_with(applications, PipelineSettings::default())
}

pub(super) fn build_service_with(
    applications: Vec<Application>,
    settings: PipelineSettings,
) -> (
    PipelineService<InMemoryPipelineStore, MemorySnapshots>,
    Arc<InMemoryPipelineStore>,
    Arc<MemorySnapshots>,
    Arc<FixedClock>,
) {
    let jobs = vec![
        job("job-backend", "Backend Engineer", JobStatus::Active),
        job("job-design", "Product Designer", JobStatus::Paused),
    ];
    let store = Arc::new(InMemoryPipelineStore::seeded(applications, jobs).expect("seed store"));
    let snapshots = Arc::new(MemorySnapshots::default());
    let clock = Arc::new(FixedClock::new(now()));
    let service =
        PipelineService::with_clock(store.clone(), snapshots.clone(), settings, clock.clone());
    (service, store, snapshots, clock)
}

pub(super) fn router_for(applications: Vec<Application>) -> axum::Router {
    let (service, _, _, _) = build_service(applications);
    pipeline_router(Arc::new(service), Actor::new("pipeline-operator"))
}

#[derive(Default)]
pub(super) struct MemorySnapshots {
    snapshots: Mutex<Vec<PipelineSnapshot>>,
}

impl MemorySnapshots {
    pub(super) fn snapshots(&self) -> Vec<PipelineSnapshot> {
        self.snapshots.lock().expect("snapshot mutex poisoned").clone()
    }
}

impl SnapshotPublisher for MemorySnapshots {
    fn publish(&self, snapshot: PipelineSnapshot) -> Result<(), PublishError> {
        self.snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .push(snapshot);
        Ok(())
    }
}

pub(super) struct FailingSnapshots;

impl SnapshotPublisher for FailingSnapshots {
    fn publish(&self, _snapshot: PipelineSnapshot) -> Result<(), PublishError> {
        Err(PublishError::Transport("bucket offline".to_string()))
    }
}

/// Store wrapper that lets a competing writer land between read and write.
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryPipelineStore,
}

impl ApplicationRepository for RacingRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut competing = self
            .inner
            .fetch(&application.id)?
            .ok_or(RepositoryError::NotFound)?;
        competing.assigned_recruiter = Some("someone-else@example.com".to_string());
        self.inner.update(competing)?;
        self.inner.update(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list()
    }
}

impl JobRepository for RacingRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn update_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.update_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.inner.list_jobs()
    }
}

/// Store wrapper that parks the first `list()` after its read until released.
pub(super) struct PausingRepository {
    inner: InMemoryPipelineStore,
    armed: AtomicBool,
    pub(super) paused: Barrier,
    pub(super) release: Barrier,
}

impl PausingRepository {
    pub(super) fn new(inner: InMemoryPipelineStore) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
            paused: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl ApplicationRepository for PausingRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.update(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<Application>, RepositoryError> {
        let applications = self.inner.list()?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.paused.wait();
            self.release.wait();
        }
        Ok(applications)
    }
}

impl JobRepository for PausingRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn update_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.update_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.inner.list_jobs()
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl JobRepository for UnavailableRepository {
    fn insert_job(&self, _job: Job) -> Result<Job, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_job(&self, _job: Job) -> Result<Job, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_job(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn ids(applications: &[Application]) -> Vec<&str> {
    applications
        .iter()
        .map(|application| application.id.0.as_str())
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
