use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_pipeline::error::AppError;
use talent_pipeline::pipeline::{
    InMemoryPipelineStore, PipelineSettings, PipelineService, PipelineSnapshot, PublishError,
    SnapshotPublisher, Stage,
};
use talent_pipeline::seed::SeedData;
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type PipelineApp = PipelineService<InMemoryPipelineStore, SnapshotSink>;

/// Where post-mutation snapshots go.
#[derive(Debug, Clone, Default)]
pub(crate) enum SnapshotSink {
    #[default]
    Discard,
    /// Overwrite a JSON file with the latest snapshot.
    File(PathBuf),
}

impl SnapshotSink {
    pub(crate) fn from_path(path: Option<PathBuf>) -> Self {
        path.map(Self::File).unwrap_or_default()
    }
}

impl SnapshotPublisher for SnapshotSink {
    fn publish(&self, snapshot: PipelineSnapshot) -> Result<(), PublishError> {
        let Self::File(path) = self else {
            return Ok(());
        };

        let payload = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| PublishError::Transport(err.to_string()))?;
        std::fs::write(path, payload).map_err(|err| {
            PublishError::Transport(format!("unable to write {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), applications = snapshot.applications.len(), "snapshot written");
        Ok(())
    }
}

/// Build the service over an in-memory store, seeding it from `seed` when given.
pub(crate) fn build_pipeline(
    settings: PipelineSettings,
    sink: SnapshotSink,
    seed: Option<&Path>,
) -> Result<PipelineApp, AppError> {
    let service = PipelineService::new(
        Arc::new(InMemoryPipelineStore::new()),
        Arc::new(sink),
        settings,
    );

    if let Some(path) = seed {
        let data = SeedData::load(path)?;
        let loaded = service.seed(data.applications, data.jobs)?;
        info!(path = %path.display(), loaded, "pipeline seed loaded");
    }

    Ok(service)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_stage(raw: &str) -> Result<Stage, String> {
    raw.parse::<Stage>()
}
