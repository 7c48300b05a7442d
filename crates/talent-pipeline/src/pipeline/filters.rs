//! Predicate engine over applications and jobs.
//!
//! Text search is OR across fields; every filter dimension that is present is
//! AND-ed on top. Set-valued dimensions match when any member matches, and an
//! empty set is treated the same as an absent one.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Application, EmploymentType, Job, JobStatus, Stage};

/// Optional applicant filter criteria. `None` leaves a dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<BTreeSet<Stage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score_min: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score_max: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_applied_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_applied_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_recruiter: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl ApplicantFilters {
    pub fn is_empty(&self) -> bool {
        self.active_dimensions().is_empty()
    }

    /// Names of the dimensions that will constrain a result.
    pub fn active_dimensions(&self) -> Vec<&'static str> {
        let mut dimensions = Vec::new();
        if engaged(&self.stage) {
            dimensions.push("stage");
        }
        if self.match_score_min.is_some() || self.match_score_max.is_some() {
            dimensions.push("match_score");
        }
        if self.date_applied_from.is_some() || self.date_applied_to.is_some() {
            dimensions.push("date_applied");
        }
        if engaged(&self.assigned_recruiter) {
            dimensions.push("assigned_recruiter");
        }
        if engaged(&self.location) {
            dimensions.push("location");
        }
        if engaged(&self.skills) {
            dimensions.push("skills");
        }
        if engaged(&self.tags) {
            dimensions.push("tags");
        }
        dimensions
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.matches_stage(application)
            && self.matches_score(application)
            && self.matches_applied_date(application)
            && member_matches(&self.assigned_recruiter, application.assigned_recruiter.as_deref())
            && member_matches(&self.location, application.location.as_deref())
            && any_overlap(&self.skills, &application.skills)
            && any_overlap(&self.tags, &application.tags)
    }

    fn matches_stage(&self, application: &Application) -> bool {
        match &self.stage {
            Some(stages) if !stages.is_empty() => application
                .stage()
                .is_some_and(|stage| stages.contains(&stage)),
            _ => true,
        }
    }

    // Unscored records pass score filters; an inverted range excludes every scored record.
    fn matches_score(&self, application: &Application) -> bool {
        let Some(score) = application.match_score else {
            return true;
        };
        self.match_score_min.map_or(true, |min| score >= min)
            && self.match_score_max.map_or(true, |max| score <= max)
    }

    fn matches_applied_date(&self, application: &Application) -> bool {
        let applied_on = application.applied_at.date_naive();
        self.date_applied_from.map_or(true, |from| applied_on >= from)
            && self.date_applied_to.map_or(true, |to| applied_on <= to)
    }
}

fn engaged<T>(set: &Option<BTreeSet<T>>) -> bool {
    set.as_ref().is_some_and(|values| !values.is_empty())
}

fn member_matches(set: &Option<BTreeSet<String>>, value: Option<&str>) -> bool {
    match set {
        Some(values) if !values.is_empty() => value.is_some_and(|value| values.contains(value)),
        _ => true,
    }
}

fn any_overlap(set: &Option<BTreeSet<String>>, values: &[String]) -> bool {
    match set {
        Some(wanted) if !wanted.is_empty() => values.iter().any(|value| wanted.contains(value)),
        _ => true,
    }
}

/// Lower-cased, trimmed search needle. `None` means "match everything".
fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn contains_needle(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_query(application: &Application, needle: &str) -> bool {
    contains_needle(&application.candidate_name, needle)
        || contains_needle(&application.candidate_email, needle)
        || contains_needle(&application.job_title, needle)
        || application
            .skills
            .iter()
            .any(|skill| contains_needle(skill, needle))
        || application.tags.iter().any(|tag| contains_needle(tag, needle))
        || application
            .notes
            .iter()
            .any(|note| contains_needle(&note.content, needle))
}

/// Stable, non-mutating filter of `applications` by free-text `query` and `filters`.
pub fn filter_applications(
    applications: &[Application],
    query: &str,
    filters: &ApplicantFilters,
) -> Vec<Application> {
    let needle = normalize_query(query);
    applications
        .iter()
        .filter(|application| {
            needle
                .as_deref()
                .map_or(true, |needle| matches_query(application, needle))
        })
        .filter(|application| filters.matches(application))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    AppliedAt,
    MatchScore,
    CandidateName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Stable in-place sort. Records without a match score always sort last.
pub fn sort_applications(applications: &mut [Application], order: SortOrder) {
    let direct = |ordering: Ordering| match order.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };

    applications.sort_by(|a, b| match order.key {
        SortKey::AppliedAt => direct(a.applied_at.cmp(&b.applied_at)),
        SortKey::CandidateName => direct(
            a.candidate_name
                .to_lowercase()
                .cmp(&b.candidate_name.to_lowercase()),
        ),
        SortKey::MatchScore => match (a.match_score, b.match_score) {
            (Some(left), Some(right)) => direct(left.cmp(&right)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    });
}

/// Optional job listing criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BTreeSet<JobStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<BTreeSet<EmploymentType>>,
}

impl JobFilters {
    pub fn matches(&self, job: &Job) -> bool {
        let status_ok = match &self.status {
            Some(statuses) if !statuses.is_empty() => statuses.contains(&job.status),
            _ => true,
        };
        let type_ok = match &self.employment_type {
            Some(types) if !types.is_empty() => types.contains(&job.employment_type),
            _ => true,
        };
        status_ok && type_ok && member_matches(&self.location, Some(job.location.as_str()))
    }
}

/// Stable job filter; the query matches title, description or any skill.
pub fn filter_jobs(jobs: &[Job], query: &str, filters: &JobFilters) -> Vec<Job> {
    let needle = normalize_query(query);
    jobs.iter()
        .filter(|job| {
            needle.as_deref().map_or(true, |needle| {
                contains_needle(&job.title, needle)
                    || contains_needle(&job.description, needle)
                    || job.skills.iter().any(|skill| contains_needle(skill, needle))
            })
        })
        .filter(|job| filters.matches(job))
        .cloned()
        .collect()
}
