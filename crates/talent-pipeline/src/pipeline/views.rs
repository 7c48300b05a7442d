use std::collections::BTreeMap;

use serde::Serialize;

use super::capacity::{CapacityStatus, StageCapacity};
use super::domain::{Activity, Application, ApplicationId, Stage};
use super::grouping::StageGroups;
use super::metrics::StageMetrics;

/// Result of a single audited stage move.
#[derive(Debug, Clone, Serialize)]
pub struct StageTransition {
    pub application: Application,
    pub activity: Activity,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkMoveFailure {
    pub application_id: ApplicationId,
    pub reason: String,
}

/// Outcome of a bulk move; partial success is the normal case.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkMoveReport {
    pub target: Option<Stage>,
    pub moved: Vec<StageTransition>,
    pub failed: Vec<BulkMoveFailure>,
}

impl BulkMoveReport {
    pub fn moved_ids(&self) -> Vec<&ApplicationId> {
        self.moved
            .iter()
            .map(|transition| &transition.application.id)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageColumn {
    pub stage: Stage,
    pub label: &'static str,
    pub applications: Vec<Application>,
    pub capacity: CapacityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_applicants: Option<usize>,
    pub metrics: StageMetrics,
}

/// Filtered, grouped and measured view of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineBoard {
    pub total: usize,
    pub stages: Vec<StageColumn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<Application>,
}

impl PipelineBoard {
    pub(crate) fn assemble(
        groups: StageGroups,
        mut metrics: BTreeMap<Stage, StageMetrics>,
        capacity: &StageCapacity,
    ) -> Self {
        let total = groups.total();
        let (buckets, unrecognized) = groups.into_parts();

        let stages = buckets
            .into_iter()
            .filter_map(|(stage, applications)| {
                let metrics = metrics.remove(&stage)?;
                let max_applicants = capacity.limit(stage);
                Some(StageColumn {
                    stage,
                    label: stage.label(),
                    capacity: capacity.classify(stage, applications.len()),
                    max_applicants,
                    applications,
                    metrics,
                })
            })
            .collect();

        Self {
            total,
            stages,
            unrecognized,
        }
    }

    pub fn column(&self, stage: Stage) -> Option<&StageColumn> {
        self.stages.iter().find(|column| column.stage == stage)
    }
}
