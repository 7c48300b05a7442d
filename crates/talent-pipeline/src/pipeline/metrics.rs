//! Per-stage pipeline metrics derived from the activity log.
//!
//! Estimation policy:
//! - a record entered its current stage at the latest `status_change` activity
//!   targeting that stage, or at `applied_at` when no such activity exists;
//! - average time in stage is the mean of `now - entry` over the bucket, in hours;
//! - a record has *reached* a forward stage when its furthest forward stage
//!   (from its current status and every recorded transition) is at or past it;
//! - conversion is `reached(next) / reached(stage)`, drop-off is the share of
//!   `reached(stage)` that was rejected with `stage` as its furthest point;
//! - trend compares stage entries in the latest window with the window before.
//!
//! `Hired` and `Rejected` are terminal and report zero conversion and drop-off.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActivityKind, Application, Stage};
use super::grouping::StageGroups;

const DEFAULT_TREND_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMetrics {
    pub stage: Stage,
    pub total_applicants: usize,
    pub average_time_in_stage_hours: f64,
    pub conversion_rate: f64,
    pub drop_off_rate: f64,
    pub trend: Trend,
}

/// Tunables for the derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsPolicy {
    pub trend_window: Duration,
}

impl MetricsPolicy {
    pub fn with_trend_window_days(days: i64) -> Self {
        let days = if days > 0 {
            days
        } else {
            DEFAULT_TREND_WINDOW_DAYS
        };
        Self {
            trend_window: Duration::days(days),
        }
    }
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self::with_trend_window_days(DEFAULT_TREND_WINDOW_DAYS)
    }
}

/// When `application` entered its current stage.
pub fn stage_entered_at(application: &Application) -> DateTime<Utc> {
    let Some(current) = application.stage() else {
        return application.applied_at;
    };

    application
        .activities
        .iter()
        .filter(|activity| {
            activity.kind == ActivityKind::StatusChange && activity.to_stage == Some(current)
        })
        .map(|activity| activity.timestamp)
        .max()
        .unwrap_or(application.applied_at)
}

/// Highest forward stage the record has ever held.
pub fn furthest_forward_stage(application: &Application) -> Stage {
    let visited = application
        .activities
        .iter()
        .filter(|activity| activity.kind == ActivityKind::StatusChange)
        .filter_map(|activity| activity.to_stage);

    std::iter::once(Stage::New)
        .chain(application.stage())
        .chain(visited)
        .filter(|stage| stage.forward_rank().is_some())
        .max_by_key(|stage| stage.forward_rank())
        .unwrap_or(Stage::New)
}

fn stage_entries(application: &Application) -> impl Iterator<Item = (Stage, DateTime<Utc>)> + '_ {
    std::iter::once((Stage::New, application.applied_at)).chain(
        application
            .activities
            .iter()
            .filter(|activity| activity.kind == ActivityKind::StatusChange)
            .filter_map(|activity| activity.to_stage.map(|stage| (stage, activity.timestamp))),
    )
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Default)]
struct EntryWindow {
    recent: usize,
    prior: usize,
}

impl EntryWindow {
    fn trend(&self) -> Trend {
        match self.recent.cmp(&self.prior) {
            std::cmp::Ordering::Greater => Trend::Up,
            std::cmp::Ordering::Less => Trend::Down,
            std::cmp::Ordering::Equal => Trend::Stable,
        }
    }
}

/// Compute metrics for every stage of `groups` as of `now`.
///
/// Records in the unrecognized bucket are not counted toward any stage.
pub fn compute_stage_metrics(
    groups: &StageGroups,
    policy: &MetricsPolicy,
    now: DateTime<Utc>,
) -> BTreeMap<Stage, StageMetrics> {
    let window = policy.trend_window;
    let recent_start = now - window;
    let prior_start = recent_start - window;

    // reached[rank] counts records whose furthest forward rank >= rank
    let mut furthest_counts = [0usize; 6];
    let mut rejected_from: BTreeMap<Stage, usize> = BTreeMap::new();
    let mut entries: BTreeMap<Stage, EntryWindow> = BTreeMap::new();

    for (stage, bucket) in groups.iter() {
        for application in bucket {
            let furthest = furthest_forward_stage(application);
            if let Some(rank) = furthest.forward_rank() {
                furthest_counts[rank as usize] += 1;
            }
            if stage == Stage::Rejected {
                *rejected_from.entry(furthest).or_default() += 1;
            }

            for (entered, at) in stage_entries(application) {
                let slot = entries.entry(entered).or_default();
                if at > recent_start && at <= now {
                    slot.recent += 1;
                } else if at > prior_start && at <= recent_start {
                    slot.prior += 1;
                }
            }
        }
    }

    let reached = |stage: Stage| -> usize {
        stage
            .forward_rank()
            .map(|rank| furthest_counts[rank as usize..].iter().sum())
            .unwrap_or(0)
    };

    groups
        .iter()
        .map(|(stage, bucket)| {
            let average_time_in_stage_hours = if bucket.is_empty() {
                0.0
            } else {
                let total_minutes: i64 = bucket
                    .iter()
                    .map(|application| (now - stage_entered_at(application)).num_minutes().max(0))
                    .sum();
                total_minutes as f64 / 60.0 / bucket.len() as f64
            };

            let (conversion_rate, drop_off_rate) = match stage.next() {
                Some(next) if !stage.is_terminal() => {
                    let reached_here = reached(stage);
                    (
                        percentage(reached(next), reached_here),
                        percentage(
                            rejected_from.get(&stage).copied().unwrap_or(0),
                            reached_here,
                        ),
                    )
                }
                _ => (0.0, 0.0),
            };

            let trend = entries
                .get(&stage)
                .map(EntryWindow::trend)
                .unwrap_or(Trend::Stable);

            (
                stage,
                StageMetrics {
                    stage,
                    total_applicants: bucket.len(),
                    average_time_in_stage_hours,
                    conversion_rate,
                    drop_off_rate,
                    trend,
                },
            )
        })
        .collect()
}
