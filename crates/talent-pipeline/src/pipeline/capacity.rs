use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::Stage;

const NEAR_CAPACITY_RATIO: f32 = 0.8;
const AT_CAPACITY_RATIO: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityStatus {
    pub ratio: f32,
    pub near_capacity: bool,
    pub at_capacity: bool,
}

/// Classify a stage's load against its optional cap.
///
/// No cap means never near or at capacity. A cap of zero is treated as full.
pub fn classify_capacity(count: usize, max: Option<usize>) -> CapacityStatus {
    match max {
        None => CapacityStatus {
            ratio: 0.0,
            near_capacity: false,
            at_capacity: false,
        },
        Some(0) => CapacityStatus {
            ratio: 1.0,
            near_capacity: true,
            at_capacity: true,
        },
        Some(max) => {
            let ratio = count as f32 / max as f32;
            CapacityStatus {
                ratio,
                near_capacity: ratio >= NEAR_CAPACITY_RATIO,
                at_capacity: ratio >= AT_CAPACITY_RATIO,
            }
        }
    }
}

/// Optional per-stage applicant caps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCapacity {
    #[serde(default)]
    limits: BTreeMap<Stage, usize>,
}

impl StageCapacity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, stage: Stage, max: usize) -> Self {
        self.limits.insert(stage, max);
        self
    }

    pub fn set_limit(&mut self, stage: Stage, max: usize) {
        self.limits.insert(stage, max);
    }

    pub fn limit(&self, stage: Stage) -> Option<usize> {
        self.limits.get(&stage).copied()
    }

    pub fn classify(&self, stage: Stage, count: usize) -> CapacityStatus {
        classify_capacity(count, self.limit(stage))
    }
}
