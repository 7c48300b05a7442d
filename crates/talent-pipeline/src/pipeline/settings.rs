use super::capacity::StageCapacity;
use super::metrics::MetricsPolicy;

/// Policy knobs the pipeline service is constructed with.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub capacity: StageCapacity,
    pub metrics: MetricsPolicy,
}
