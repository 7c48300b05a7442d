use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::common::*;
use crate::pipeline::domain::{JobStatus, Note, Stage};
use crate::pipeline::filters::{
    filter_applications, filter_jobs, sort_applications, ApplicantFilters, JobFilters,
    SortDirection, SortKey, SortOrder,
};

fn stages(values: &[Stage]) -> Option<BTreeSet<Stage>> {
    Some(values.iter().copied().collect())
}

fn strings(values: &[&str]) -> Option<BTreeSet<String>> {
    Some(values.iter().map(|value| value.to_string()).collect())
}

fn ann_and_ben() -> Vec<crate::pipeline::Application> {
    let mut ann = application("app-ann", "Ann", Stage::New);
    ann.skills = vec!["Go".to_string()];
    let mut ben = application("app-ben", "Ben", Stage::New);
    ben.skills = vec!["Rust".to_string()];
    vec![ann, ben]
}

#[test]
fn empty_query_and_filters_keep_everything_in_order() {
    let applications = vec![
        scored("app-1", Stage::New, 90),
        scored("app-2", Stage::Reviewed, 60),
        scored("app-3", Stage::Reviewed, 80),
    ];

    let filtered = filter_applications(&applications, "   ", &ApplicantFilters::default());

    assert_eq!(filtered, applications);
}

#[test]
fn query_matches_skills_case_insensitively() {
    let applications = ann_and_ben();

    let filtered = filter_applications(&applications, "go", &ApplicantFilters::default());
    assert_eq!(ids(&filtered), vec!["app-ann"]);

    let filtered = filter_applications(&applications, "  GO ", &ApplicantFilters::default());
    assert_eq!(ids(&filtered), vec!["app-ann"]);
}

#[test]
fn query_matches_name_substrings() {
    let applications = ann_and_ben();

    let filtered = filter_applications(&applications, "an", &ApplicantFilters::default());

    assert_eq!(ids(&filtered), vec!["app-ann"]);
}

#[test]
fn query_searches_tags_email_and_note_content() {
    let mut tagged = application("app-tagged", "Cara", Stage::New);
    tagged.tags = vec!["referral".to_string()];
    let mut noted = application("app-noted", "Dev", Stage::New);
    noted.notes.push(Note {
        id: "note-1".to_string(),
        content: "Strong on distributed systems".to_string(),
        author: "lead".to_string(),
        created_at: now(),
        is_private: false,
    });
    let applications = vec![tagged, noted];

    let by_tag = filter_applications(&applications, "REFERRAL", &ApplicantFilters::default());
    assert_eq!(ids(&by_tag), vec!["app-tagged"]);

    let by_note = filter_applications(&applications, "distributed", &ApplicantFilters::default());
    assert_eq!(ids(&by_note), vec!["app-noted"]);

    let by_email = filter_applications(&applications, "dev@example", &ApplicantFilters::default());
    assert_eq!(ids(&by_email), vec!["app-noted"]);
}

#[test]
fn stage_and_score_dimensions_combine_with_and() {
    let applications = vec![
        scored("app-1", Stage::New, 90),
        scored("app-2", Stage::Reviewed, 60),
        scored("app-3", Stage::Reviewed, 80),
    ];
    let filters = ApplicantFilters {
        stage: stages(&[Stage::Reviewed]),
        match_score_min: Some(70),
        ..ApplicantFilters::default()
    };

    let filtered = filter_applications(&applications, "", &filters);

    assert_eq!(ids(&filtered), vec!["app-3"]);
}

#[test]
fn inverted_score_range_excludes_scored_records() {
    let mut applications = vec![
        scored("app-1", Stage::New, 50),
        scored("app-2", Stage::New, 75),
    ];
    applications.push(application("app-unscored", "Una", Stage::New));
    let filters = ApplicantFilters {
        match_score_min: Some(80),
        match_score_max: Some(20),
        ..ApplicantFilters::default()
    };

    let filtered = filter_applications(&applications, "", &filters);

    assert_eq!(ids(&filtered), vec!["app-unscored"]);
}

#[test]
fn unscored_records_pass_score_filters() {
    let applications = vec![
        scored("app-low", Stage::New, 40),
        application("app-unscored", "Una", Stage::New),
    ];
    let filters = ApplicantFilters {
        match_score_min: Some(60),
        ..ApplicantFilters::default()
    };

    let filtered = filter_applications(&applications, "", &filters);

    assert_eq!(ids(&filtered), vec!["app-unscored"]);
}

#[test]
fn empty_sets_are_treated_as_absent() {
    let applications = vec![
        scored("app-1", Stage::New, 90),
        scored("app-2", Stage::Hired, 60),
    ];
    let filters = ApplicantFilters {
        stage: Some(BTreeSet::new()),
        skills: Some(BTreeSet::new()),
        ..ApplicantFilters::default()
    };

    assert!(filters.is_empty());
    assert_eq!(filter_applications(&applications, "", &filters).len(), 2);
}

#[test]
fn date_bounds_are_inclusive_by_calendar_day() {
    let mut early = application("app-early", "Early", Stage::New);
    early.applied_at = days_ago(10);
    let mut edge = application("app-edge", "Edge", Stage::New);
    edge.applied_at = days_ago(5);
    let mut late = application("app-late", "Late", Stage::New);
    late.applied_at = days_ago(1);
    let applications = vec![early, edge, late];

    let edge_day = days_ago(5).date_naive();
    let filters = ApplicantFilters {
        date_applied_from: Some(edge_day),
        date_applied_to: Some(edge_day),
        ..ApplicantFilters::default()
    };
    assert_eq!(
        ids(&filter_applications(&applications, "", &filters)),
        vec!["app-edge"]
    );

    let filters = ApplicantFilters {
        date_applied_from: NaiveDate::from_ymd_opt(2025, 5, 25),
        ..ApplicantFilters::default()
    };
    assert_eq!(
        ids(&filter_applications(&applications, "", &filters)),
        vec!["app-edge", "app-late"]
    );
}

#[test]
fn set_dimensions_match_any_member() {
    let mut remote = application("app-remote", "Remy", Stage::New);
    remote.location = Some("Remote".to_string());
    remote.assigned_recruiter = Some("alex".to_string());
    remote.skills = vec!["Rust".to_string(), "SQL".to_string()];
    let mut onsite = application("app-onsite", "Omar", Stage::New);
    onsite.location = Some("Berlin".to_string());
    onsite.skills = vec!["Python".to_string()];
    let unassigned = application("app-none", "Nia", Stage::New);
    let applications = vec![remote, onsite, unassigned];

    let filters = ApplicantFilters {
        location: strings(&["Remote", "Lisbon"]),
        ..ApplicantFilters::default()
    };
    assert_eq!(
        ids(&filter_applications(&applications, "", &filters)),
        vec!["app-remote"]
    );

    let filters = ApplicantFilters {
        skills: strings(&["SQL", "Python"]),
        ..ApplicantFilters::default()
    };
    assert_eq!(
        ids(&filter_applications(&applications, "", &filters)),
        vec!["app-remote", "app-onsite"]
    );

    let filters = ApplicantFilters {
        assigned_recruiter: strings(&["alex"]),
        skills: strings(&["Python"]),
        ..ApplicantFilters::default()
    };
    assert!(filter_applications(&applications, "", &filters).is_empty());
}

#[test]
fn stage_filter_never_matches_unrecognized_status() {
    let applications = vec![
        unrecognized("app-odd", "on_hold"),
        application("app-new", "Nia", Stage::New),
    ];
    let filters = ApplicantFilters {
        stage: stages(&Stage::ordered()),
        ..ApplicantFilters::default()
    };

    assert_eq!(
        ids(&filter_applications(&applications, "", &filters)),
        vec!["app-new"]
    );
}

#[test]
fn filtering_is_idempotent() {
    let applications = vec![
        scored("app-1", Stage::New, 90),
        scored("app-2", Stage::Reviewed, 60),
        scored("app-3", Stage::Reviewed, 80),
    ];
    let filters = ApplicantFilters {
        stage: stages(&[Stage::Reviewed]),
        ..ApplicantFilters::default()
    };

    let once = filter_applications(&applications, "candidate", &filters);
    let twice = filter_applications(&once, "candidate", &filters);

    assert_eq!(once, twice);
}

#[test]
fn active_dimensions_lists_engaged_filters() {
    let filters = ApplicantFilters {
        match_score_max: Some(90),
        tags: strings(&["urgent"]),
        location: Some(BTreeSet::new()),
        ..ApplicantFilters::default()
    };

    assert_eq!(filters.active_dimensions(), vec!["match_score", "tags"]);
}

#[test]
fn filters_deserialize_from_partial_json() {
    let filters: ApplicantFilters = serde_json::from_value(serde_json::json!({
        "stage": ["reviewed", "offered"],
        "match_score_min": 70,
        "date_applied_from": "2025-05-01"
    }))
    .expect("filters parse");

    assert_eq!(filters.stage, stages(&[Stage::Reviewed, Stage::Offered]));
    assert_eq!(filters.match_score_min, Some(70));
    assert_eq!(filters.date_applied_from, NaiveDate::from_ymd_opt(2025, 5, 1));
    assert!(filters.tags.is_none());
}

#[test]
fn score_sort_places_unscored_last_in_both_directions() {
    let mut applications = vec![
        application("app-unscored", "Una", Stage::New),
        scored("app-70", Stage::New, 70),
        scored("app-90", Stage::New, 90),
    ];

    sort_applications(
        &mut applications,
        SortOrder {
            key: SortKey::MatchScore,
            direction: SortDirection::Descending,
        },
    );
    assert_eq!(ids(&applications), vec!["app-90", "app-70", "app-unscored"]);

    sort_applications(
        &mut applications,
        SortOrder {
            key: SortKey::MatchScore,
            direction: SortDirection::Ascending,
        },
    );
    assert_eq!(ids(&applications), vec!["app-70", "app-90", "app-unscored"]);
}

#[test]
fn name_sort_is_case_insensitive_and_stable() {
    let mut applications = vec![
        application("app-b", "bea", Stage::New),
        application("app-a1", "Ann", Stage::New),
        application("app-a2", "ann", Stage::Reviewed),
    ];

    sort_applications(
        &mut applications,
        SortOrder {
            key: SortKey::CandidateName,
            direction: SortDirection::Ascending,
        },
    );

    assert_eq!(ids(&applications), vec!["app-a1", "app-a2", "app-b"]);
}

#[test]
fn job_filters_combine_query_and_status() {
    let jobs = vec![
        job("job-1", "Backend Engineer", JobStatus::Active),
        job("job-2", "Backend Lead", JobStatus::Closed),
        job("job-3", "Product Designer", JobStatus::Active),
    ];
    let filters = JobFilters {
        status: Some([JobStatus::Active].into_iter().collect()),
        ..JobFilters::default()
    };

    let filtered = filter_jobs(&jobs, "backend", &filters);

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id.0, "job-1");
    assert_eq!(filter_jobs(&jobs, "rust", &JobFilters::default()).len(), 3);
}
