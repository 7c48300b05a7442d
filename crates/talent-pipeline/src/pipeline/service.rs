use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    Activity, ActivityKind, Actor, Application, ApplicationId, ApplicationStatus, Job, JobId,
    JobStatus, Note, NoteDraft, Stage,
};
use super::filters::{
    filter_applications, filter_jobs, sort_applications, ApplicantFilters, JobFilters, SortOrder,
};
use super::grouping::group_by_stage;
use super::metrics::{compute_stage_metrics, StageMetrics};
use super::repository::{
    ApplicationRepository, JobRepository, PipelineSnapshot, RepositoryError, SnapshotPublisher,
};
use super::settings::PipelineSettings;
use super::views::{BulkMoveFailure, BulkMoveReport, PipelineBoard, StageTransition};

type StageMetricsMap = BTreeMap<Stage, StageMetrics>;

/// Audit entry produced by a mutation before id, actor and timestamp are stamped.
struct PendingActivity {
    kind: ActivityKind,
    description: String,
    from_stage: Option<Stage>,
    to_stage: Option<Stage>,
}

impl PendingActivity {
    fn new(kind: ActivityKind, description: String) -> Self {
        Self {
            kind,
            description,
            from_stage: None,
            to_stage: None,
        }
    }
}

/// Service composing the entity store, persistence hook, clock and pipeline policy.
///
/// Every mutation runs through one unit of work: fetch, mutate a copy, append
/// exactly one activity, versioned write, invalidate cached metrics, publish a
/// snapshot. A failure before the write leaves the store untouched.
pub struct PipelineService<R, P> {
    repository: Arc<R>,
    publisher: Arc<P>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
    metrics_cache: RwLock<Option<StageMetricsMap>>,
    metrics_generation: AtomicU64,
    sequence: AtomicU64,
}

impl<R, P> PipelineService<R, P>
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    pub fn new(repository: Arc<R>, publisher: Arc<P>, settings: PipelineSettings) -> Self {
        Self::with_clock(repository, publisher, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        publisher: Arc<P>,
        settings: PipelineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            publisher,
            clock,
            settings,
            metrics_cache: RwLock::new(None),
            metrics_generation: AtomicU64::new(0),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Load applications and jobs wholesale, as an external supplier would at start-up.
    pub fn seed(
        &self,
        applications: Vec<Application>,
        jobs: Vec<Job>,
    ) -> Result<usize, PipelineServiceError> {
        if let Some(highest) = highest_sequence(&applications) {
            self.sequence.fetch_max(highest + 1, Ordering::Relaxed);
        }

        let mut loaded = 0;
        for job in jobs {
            self.repository.insert_job(job)?;
        }
        for application in applications {
            self.repository.insert(application)?;
            loaded += 1;
        }

        self.invalidate_metrics();
        self.publish_snapshot();
        info!(loaded, "pipeline store seeded");
        Ok(loaded)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, PipelineServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| PipelineServiceError::NotFound(id.clone()))
    }

    /// Filtered applications in store order, optionally sorted.
    pub fn search(
        &self,
        query: &str,
        filters: &ApplicantFilters,
        sort: Option<SortOrder>,
    ) -> Result<Vec<Application>, PipelineServiceError> {
        let applications = self.repository.list()?;
        let mut matches = filter_applications(&applications, query, filters);
        if let Some(order) = sort {
            sort_applications(&mut matches, order);
        }

        debug!(
            total = applications.len(),
            matched = matches.len(),
            dimensions = ?filters.active_dimensions(),
            "filtered applications"
        );
        Ok(matches)
    }

    /// Run the whole read path: filter, group, measure and attach capacity.
    pub fn board(
        &self,
        query: &str,
        filters: &ApplicantFilters,
    ) -> Result<PipelineBoard, PipelineServiceError> {
        let generation = self.metrics_generation();
        let applications = self.repository.list()?;
        let unfiltered = query.trim().is_empty() && filters.is_empty();

        let filtered = if unfiltered {
            applications
        } else {
            filter_applications(&applications, query, filters)
        };
        let groups = group_by_stage(&filtered);

        let metrics = if unfiltered {
            self.cached_metrics_or(generation, || {
                compute_stage_metrics(&groups, &self.settings.metrics, self.clock.now())
            })
        } else {
            compute_stage_metrics(&groups, &self.settings.metrics, self.clock.now())
        };

        Ok(PipelineBoard::assemble(
            groups,
            metrics,
            &self.settings.capacity,
        ))
    }

    /// Metrics over the whole store. Cached until the next mutation.
    pub fn stage_metrics(&self) -> Result<StageMetricsMap, PipelineServiceError> {
        if let Some(cached) = self.cached_metrics() {
            return Ok(cached);
        }

        let generation = self.metrics_generation();
        let applications = self.repository.list()?;
        let groups = group_by_stage(&applications);
        Ok(self.cached_metrics_or(generation, || {
            compute_stage_metrics(&groups, &self.settings.metrics, self.clock.now())
        }))
    }

    /// Move one application to `stage`, recording a `status_change` activity.
    ///
    /// Any stage may move to any other stage.
    pub fn move_to_stage(
        &self,
        id: &ApplicationId,
        stage: Stage,
        actor: &Actor,
    ) -> Result<StageTransition, PipelineServiceError> {
        let (application, activity) = self.apply(id, actor, |application| {
            let from_stage = application.stage();
            application.status = ApplicationStatus::Stage(stage);
            Ok(PendingActivity {
                kind: ActivityKind::StatusChange,
                description: format!("Moved to {stage}"),
                from_stage,
                to_stage: Some(stage),
            })
        })?;

        info!(
            application_id = %application.id,
            from = activity.from_stage.map(Stage::as_str).unwrap_or("unrecognized"),
            to = stage.as_str(),
            actor = actor.as_str(),
            "application moved"
        );
        Ok(StageTransition {
            application,
            activity,
        })
    }

    /// Move each id independently; failures are reported per id and never stop the batch.
    pub fn bulk_move(&self, ids: &[ApplicationId], stage: Stage, actor: &Actor) -> BulkMoveReport {
        let mut report = BulkMoveReport {
            target: Some(stage),
            ..BulkMoveReport::default()
        };

        for id in ids {
            match self.move_to_stage(id, stage, actor) {
                Ok(transition) => report.moved.push(transition),
                Err(error) => {
                    warn!(application_id = %id, %error, "bulk move skipped application");
                    report.failed.push(BulkMoveFailure {
                        application_id: id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        info!(
            stage = stage.as_str(),
            moved = report.moved.len(),
            failed = report.failed.len(),
            "bulk move finished"
        );
        report
    }

    pub fn add_note(
        &self,
        id: &ApplicationId,
        draft: NoteDraft,
        actor: &Actor,
    ) -> Result<(Application, Activity), PipelineServiceError> {
        let content = draft.content.trim().to_string();
        if content.is_empty() {
            return Err(PipelineServiceError::InvalidInput(
                "note content must not be empty".to_string(),
            ));
        }

        let note_id = self.next_id("note");
        let created_at = self.clock.now();
        self.apply(id, actor, |application| {
            application.notes.push(Note {
                id: note_id,
                content,
                author: actor.as_str().to_string(),
                created_at,
                is_private: draft.is_private,
            });
            let visibility = if draft.is_private { "private" } else { "shared" };
            Ok(PendingActivity::new(
                ActivityKind::NoteAdded,
                format!("Added {visibility} note"),
            ))
        })
    }

    pub fn add_tags(
        &self,
        id: &ApplicationId,
        tags: Vec<String>,
        actor: &Actor,
    ) -> Result<(Application, Activity), PipelineServiceError> {
        let tags: Vec<String> = tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(PipelineServiceError::InvalidInput(
                "at least one tag is required".to_string(),
            ));
        }

        self.apply(id, actor, |application| {
            let description = format!("Tagged {}", tags.join(", "));
            application.tags.extend(tags);
            Ok(PendingActivity::new(ActivityKind::TagAdded, description))
        })
    }

    pub fn assign_recruiter(
        &self,
        id: &ApplicationId,
        recruiter: &str,
        actor: &Actor,
    ) -> Result<(Application, Activity), PipelineServiceError> {
        let recruiter = recruiter.trim();
        if recruiter.is_empty() {
            return Err(PipelineServiceError::InvalidInput(
                "recruiter must not be empty".to_string(),
            ));
        }

        self.apply(id, actor, |application| {
            application.assigned_recruiter = Some(recruiter.to_string());
            Ok(PendingActivity::new(
                ActivityKind::RecruiterAssigned,
                format!("Assigned to {recruiter}"),
            ))
        })
    }

    /// Filtered jobs with application counts derived from the store.
    pub fn list_jobs(
        &self,
        query: &str,
        filters: &JobFilters,
    ) -> Result<Vec<Job>, PipelineServiceError> {
        let mut counts: HashMap<JobId, usize> = HashMap::new();
        for application in self.repository.list()? {
            if let Some(job_id) = application.job_id {
                *counts.entry(job_id).or_default() += 1;
            }
        }

        let jobs = self.repository.list_jobs()?;
        let mut jobs = filter_jobs(&jobs, query, filters);
        for job in &mut jobs {
            job.applications = counts.get(&job.id).copied().unwrap_or(0);
        }
        Ok(jobs)
    }

    /// Applications linked to `job_id` by foreign key, in store order.
    pub fn job_applications(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<Application>, PipelineServiceError> {
        if self.repository.fetch_job(job_id)?.is_none() {
            return Err(PipelineServiceError::JobNotFound(job_id.clone()));
        }

        Ok(self
            .repository
            .list()?
            .into_iter()
            .filter(|application| application.job_id.as_ref() == Some(job_id))
            .collect())
    }

    pub fn set_job_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
    ) -> Result<Job, PipelineServiceError> {
        let mut job = self
            .repository
            .fetch_job(job_id)?
            .ok_or_else(|| PipelineServiceError::JobNotFound(job_id.clone()))?;
        let previous = job.status;
        job.status = status;
        let job = self.repository.update_job(job)?;

        info!(
            job_id = %job.id,
            from = previous.label(),
            to = status.label(),
            "job status changed"
        );
        self.publish_snapshot();
        Ok(job)
    }

    fn apply<F>(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        mutate: F,
    ) -> Result<(Application, Activity), PipelineServiceError>
    where
        F: FnOnce(&mut Application) -> Result<PendingActivity, PipelineServiceError>,
    {
        let mut application = self.get(id)?;
        let pending = mutate(&mut application)?;

        let activity = Activity {
            id: self.next_id("act"),
            kind: pending.kind,
            description: pending.description,
            actor: actor.as_str().to_string(),
            timestamp: self.clock.now(),
            from_stage: pending.from_stage,
            to_stage: pending.to_stage,
        };
        application.activities.push(activity.clone());

        let stored = self.repository.update(application)?;
        self.invalidate_metrics();
        self.publish_snapshot();
        Ok((stored, activity))
    }

    fn next_id(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{id:06}")
    }

    fn cached_metrics(&self) -> Option<StageMetricsMap> {
        self.metrics_cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn metrics_generation(&self) -> u64 {
        self.metrics_generation.load(Ordering::Acquire)
    }

    /// Cached metrics, or `compute` over a read taken at `generation`.
    ///
    /// The computed map is only cached when no mutation invalidated the cache
    /// since that read; otherwise it is only returned.
    fn cached_metrics_or<F>(&self, generation: u64, compute: F) -> StageMetricsMap
    where
        F: FnOnce() -> StageMetricsMap,
    {
        if let Some(cached) = self.cached_metrics() {
            return cached;
        }

        let metrics = compute();
        let mut cache = self
            .metrics_cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.metrics_generation() == generation {
            *cache = Some(metrics.clone());
        } else {
            debug!(generation, "discarded metrics computed before a mutation");
        }
        metrics
    }

    fn invalidate_metrics(&self) {
        let mut cache = self
            .metrics_cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.metrics_generation.fetch_add(1, Ordering::AcqRel);
        *cache = None;
    }

    fn publish_snapshot(&self) {
        let snapshot = match self.snapshot(self.clock.now()) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "unable to build pipeline snapshot");
                return;
            }
        };

        if let Err(error) = self.publisher.publish(snapshot) {
            warn!(%error, "pipeline snapshot was not persisted");
        }
    }

    fn snapshot(&self, taken_at: DateTime<Utc>) -> Result<PipelineSnapshot, RepositoryError> {
        Ok(PipelineSnapshot {
            taken_at,
            applications: self.repository.list()?,
            jobs: self.repository.list_jobs()?,
        })
    }
}

/// Highest numeric suffix among generated activity and note ids.
fn highest_sequence(applications: &[Application]) -> Option<u64> {
    let activity_ids = applications
        .iter()
        .flat_map(|application| application.activities.iter())
        .filter_map(|activity| activity.id.strip_prefix("act-"));
    let note_ids = applications
        .iter()
        .flat_map(|application| application.notes.iter())
        .filter_map(|note| note.id.strip_prefix("note-"));

    activity_ids
        .chain(note_ids)
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
