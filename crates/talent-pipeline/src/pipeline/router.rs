use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ApplicationId, JobId, JobStatus, NoteDraft, Stage};
use super::filters::{ApplicantFilters, JobFilters, SortOrder};
use super::repository::{
    ApplicationRepository, JobRepository, RepositoryError, SnapshotPublisher,
};
use super::service::{PipelineService, PipelineServiceError};

/// Header carrying the acting user's identifier on mutating requests.
pub const ACTOR_HEADER: &str = "x-actor";

pub struct PipelineState<R, P> {
    service: Arc<PipelineService<R, P>>,
    default_actor: Actor,
}

impl<R, P> Clone for PipelineState<R, P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            default_actor: self.default_actor.clone(),
        }
    }
}

impl<R, P> PipelineState<R, P> {
    pub fn new(service: Arc<PipelineService<R, P>>, default_actor: Actor) -> Self {
        Self {
            service,
            default_actor,
        }
    }

    fn actor(&self, headers: &HeaderMap) -> Actor {
        headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Actor::new)
            .unwrap_or_else(|| self.default_actor.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchRequest {
    #[serde(default)]
    pub(crate) query: String,
    #[serde(default)]
    pub(crate) filters: ApplicantFilters,
    #[serde(default)]
    pub(crate) sort: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BoardRequest {
    #[serde(default)]
    pub(crate) query: String,
    #[serde(default)]
    pub(crate) filters: ApplicantFilters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveRequest {
    pub(crate) stage: Stage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkMoveRequest {
    pub(crate) ids: Vec<ApplicationId>,
    pub(crate) stage: Stage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsRequest {
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecruiterRequest {
    pub(crate) recruiter: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobSearchRequest {
    #[serde(default)]
    pub(crate) query: String,
    #[serde(default)]
    pub(crate) filters: JobFilters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobStatusRequest {
    pub(crate) status: JobStatus,
}

/// Router builder exposing the pipeline read and write paths over HTTP.
pub fn pipeline_router<R, P>(service: Arc<PipelineService<R, P>>, default_actor: Actor) -> Router
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    let state = PipelineState::new(service, default_actor);

    Router::new()
        .route(
            "/api/v1/pipeline/applications/search",
            post(search_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/applications/bulk-stage",
            post(bulk_move_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/applications/:application_id",
            get(application_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/applications/:application_id/stage",
            post(move_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/applications/:application_id/notes",
            post(note_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/applications/:application_id/tags",
            post(tags_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/applications/:application_id/recruiter",
            post(recruiter_handler::<R, P>),
        )
        .route("/api/v1/pipeline/board", post(board_handler::<R, P>))
        .route(
            "/api/v1/pipeline/metrics/stages",
            get(stage_metrics_handler::<R, P>),
        )
        .route("/api/v1/pipeline/jobs", get(jobs_handler::<R, P>))
        .route(
            "/api/v1/pipeline/jobs/search",
            post(job_search_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/jobs/:job_id/applications",
            get(job_applications_handler::<R, P>),
        )
        .route(
            "/api/v1/pipeline/jobs/:job_id/status",
            post(job_status_handler::<R, P>),
        )
        .with_state(state)
}

fn error_response(error: PipelineServiceError) -> Response {
    let status = match &error {
        PipelineServiceError::NotFound(_) | PipelineServiceError::JobNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PipelineServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineServiceError::Repository(
            RepositoryError::Conflict | RepositoryError::VersionMismatch { .. },
        ) => StatusCode::CONFLICT,
        PipelineServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PipelineServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn search_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    axum::Json(request): axum::Json<SearchRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state
        .service
        .search(&request.query, &request.filters, request.sort)
    {
        Ok(applications) => {
            let payload = json!({
                "total": applications.len(),
                "applications": applications,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn board_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    axum::Json(request): axum::Json<BoardRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.board(&request.query, &request.filters) {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stage_metrics_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.stage_metrics() {
        Ok(metrics) => {
            let stages: Vec<_> = metrics.into_values().collect();
            (StatusCode::OK, axum::Json(json!({ "stages": stages }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn application_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.get(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn move_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<MoveRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    let actor = state.actor(&headers);
    match state
        .service
        .move_to_stage(&ApplicationId(application_id), request.stage, &actor)
    {
        Ok(transition) => (StatusCode::OK, axum::Json(transition)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_move_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<BulkMoveRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    let actor = state.actor(&headers);
    let report = state
        .service
        .bulk_move(&request.ids, request.stage, &actor);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn note_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<NoteDraft>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    let actor = state.actor(&headers);
    match state
        .service
        .add_note(&ApplicationId(application_id), draft, &actor)
    {
        Ok((application, activity)) => (
            StatusCode::CREATED,
            axum::Json(json!({ "application": application, "activity": activity })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn tags_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<TagsRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    let actor = state.actor(&headers);
    match state
        .service
        .add_tags(&ApplicationId(application_id), request.tags, &actor)
    {
        Ok((application, activity)) => (
            StatusCode::OK,
            axum::Json(json!({ "application": application, "activity": activity })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recruiter_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<RecruiterRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    let actor = state.actor(&headers);
    match state.service.assign_recruiter(
        &ApplicationId(application_id),
        &request.recruiter,
        &actor,
    ) {
        Ok((application, activity)) => (
            StatusCode::OK,
            axum::Json(json!({ "application": application, "activity": activity })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn jobs_handler<R, P>(State(state): State<PipelineState<R, P>>) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.list_jobs("", &JobFilters::default()) {
        Ok(jobs) => (StatusCode::OK, axum::Json(json!({ "jobs": jobs }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_search_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    axum::Json(request): axum::Json<JobSearchRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.list_jobs(&request.query, &request.filters) {
        Ok(jobs) => (StatusCode::OK, axum::Json(json!({ "jobs": jobs }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_applications_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.job_applications(&JobId(job_id)) {
        Ok(applications) => (
            StatusCode::OK,
            axum::Json(json!({ "total": applications.len(), "applications": applications })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_status_handler<R, P>(
    State(state): State<PipelineState<R, P>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<JobStatusRequest>,
) -> Response
where
    R: ApplicationRepository + JobRepository + 'static,
    P: SnapshotPublisher + 'static,
{
    match state.service.set_job_status(&JobId(job_id), request.status) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(error) => error_response(error),
    }
}
