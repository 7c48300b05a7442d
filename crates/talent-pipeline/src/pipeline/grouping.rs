use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::domain::{Application, Stage};

/// Applications partitioned by pipeline stage.
///
/// Every stage key is always present. Records whose status falls outside the
/// stage set land in `unrecognized` instead of being dropped.
#[derive(Debug, Clone, Serialize)]
pub struct StageGroups {
    buckets: BTreeMap<Stage, Vec<Application>>,
    unrecognized: Vec<Application>,
}

impl StageGroups {
    fn empty() -> Self {
        let buckets = Stage::ordered()
            .into_iter()
            .map(|stage| (stage, Vec::new()))
            .collect();
        Self {
            buckets,
            unrecognized: Vec::new(),
        }
    }

    pub fn bucket(&self, stage: Stage) -> &[Application] {
        self.buckets.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.bucket(stage).len()
    }

    /// Stage buckets in board order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[Application])> {
        self.buckets
            .iter()
            .map(|(stage, bucket)| (*stage, bucket.as_slice()))
    }

    pub fn unrecognized(&self) -> &[Application] {
        &self.unrecognized
    }

    /// Every grouped record, recognized buckets first.
    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.buckets
            .values()
            .flatten()
            .chain(self.unrecognized.iter())
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum::<usize>() + self.unrecognized.len()
    }

    pub fn into_parts(self) -> (BTreeMap<Stage, Vec<Application>>, Vec<Application>) {
        (self.buckets, self.unrecognized)
    }
}

/// Single-pass, order-preserving partition of `applications` by stage.
pub fn group_by_stage(applications: &[Application]) -> StageGroups {
    let mut groups = StageGroups::empty();

    for application in applications {
        match application.stage() {
            Some(stage) => groups
                .buckets
                .entry(stage)
                .or_default()
                .push(application.clone()),
            None => {
                warn!(
                    application_id = %application.id,
                    status = application.status.as_str(),
                    "application has unrecognized pipeline status"
                );
                groups.unrecognized.push(application.clone());
            }
        }
    }

    groups
}
