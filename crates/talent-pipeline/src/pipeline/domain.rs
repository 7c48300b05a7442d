use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for candidate applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for job listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity recorded on every audited mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor(pub String);

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed hiring pipeline stages, declared in board order.
///
/// `New` through `Hired` form the forward pipeline; `Rejected` is the off-ramp
/// reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    Reviewed,
    Shortlisted,
    Interviewed,
    Offered,
    Hired,
    Rejected,
}

impl Stage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::New,
            Self::Reviewed,
            Self::Shortlisted,
            Self::Interviewed,
            Self::Offered,
            Self::Hired,
            Self::Rejected,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Shortlisted => "shortlisted",
            Self::Interviewed => "interviewed",
            Self::Offered => "offered",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Reviewed => "Reviewed",
            Self::Shortlisted => "Shortlisted",
            Self::Interviewed => "Interviewed",
            Self::Offered => "Offered",
            Self::Hired => "Hired",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
    }

    /// Position along the forward pipeline. `Rejected` has none.
    pub const fn forward_rank(self) -> Option<u8> {
        match self {
            Self::New => Some(0),
            Self::Reviewed => Some(1),
            Self::Shortlisted => Some(2),
            Self::Interviewed => Some(3),
            Self::Offered => Some(4),
            Self::Hired => Some(5),
            Self::Rejected => None,
        }
    }

    /// The following forward stage, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::New => Some(Self::Reviewed),
            Self::Reviewed => Some(Self::Shortlisted),
            Self::Shortlisted => Some(Self::Interviewed),
            Self::Interviewed => Some(Self::Offered),
            Self::Offered => Some(Self::Hired),
            Self::Hired | Self::Rejected => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw).ok_or_else(|| format!("'{raw}' is not a pipeline stage"))
    }
}

/// Stored status of an application.
///
/// Records loaded from external suppliers may carry values outside the stage
/// set; those are kept verbatim so grouping can surface them instead of
/// losing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    Stage(Stage),
    Unrecognized(String),
}

impl ApplicationStatus {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage(stage) => Some(*stage),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stage(stage) => stage.as_str(),
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<Stage> for ApplicationStatus {
    fn from(stage: Stage) -> Self {
        Self::Stage(stage)
    }
}

impl From<String> for ApplicationStatus {
    fn from(raw: String) -> Self {
        match Stage::parse(&raw) {
            Some(stage) => Self::Stage(stage),
            None => Self::Unrecognized(raw),
        }
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Stage(stage) => stage.as_str().to_string(),
            ApplicationStatus::Unrecognized(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_private: bool,
}

/// Caller-supplied portion of a note; id, author and timestamp are assigned on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub content: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StatusChange,
    NoteAdded,
    TagAdded,
    RecruiterAssigned,
}

impl ActivityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StatusChange => "status_change",
            Self::NoteAdded => "note_added",
            Self::TagAdded => "tag_added",
            Self::RecruiterAssigned => "recruiter_assigned",
        }
    }
}

/// Immutable audit entry appended on every state-changing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub description: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_stage: Option<Stage>,
}

/// Highest match score a candidate can carry.
pub const MAX_MATCH_SCORE: u8 = 100;

fn deserialize_match_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u8>::deserialize(deserializer)? {
        Some(score) if score > MAX_MATCH_SCORE => Err(serde::de::Error::custom(format!(
            "match_score {score} is outside 0..={MAX_MATCH_SCORE}"
        ))),
        score => Ok(score),
    }
}

/// Candidate submission tracked through the hiring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(default)]
    pub job_id: Option<JobId>,
    pub job_title: String,
    pub status: ApplicationStatus,
    #[serde(default, deserialize_with = "deserialize_match_score")]
    pub match_score: Option<u8>,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assigned_recruiter: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Concurrency token bumped by the store on every accepted write.
    #[serde(default)]
    pub version: u64,
}

impl Application {
    pub fn stage(&self) -> Option<Stage> {
        self.status.stage()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Paused,
    Closed,
    Draft,
    Expired,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Closed => "closed",
            Self::Draft => "draft",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

/// Job listing; applications reference it through [`Application::job_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub status: JobStatus,
    pub location: String,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub applications: usize,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}
