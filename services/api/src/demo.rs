use crate::infra::{build_pipeline, parse_date, parse_stage, PipelineApp, SnapshotSink};
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use talent_pipeline::config::AppConfig;
use talent_pipeline::error::AppError;
use talent_pipeline::pipeline::{
    Actor, ApplicantFilters, Application, ApplicationId, ApplicationStatus, EmploymentType, Job,
    JobId, JobStatus, NoteDraft, PipelineBoard, PipelineSettings, Stage, StageCapacity,
};

#[derive(Args, Debug)]
pub(crate) struct BoardArgs {
    /// JSON seed file holding `applications` and `jobs`
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Free-text search across names, emails, titles, skills, tags and notes
    #[arg(long, default_value = "")]
    pub(crate) query: String,
    /// Restrict the board to these stages (repeatable)
    #[arg(long, value_parser = parse_stage)]
    pub(crate) stage: Vec<Stage>,
    /// Minimum match score for scored candidates
    #[arg(long)]
    pub(crate) min_score: Option<u8>,
    /// Earliest application date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) applied_from: Option<NaiveDate>,
    /// Print the board as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the final board as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_board(args: BoardArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_pipeline(
        config.pipeline.settings(),
        SnapshotSink::Discard,
        Some(args.seed.as_path()),
    )?;

    let filters = ApplicantFilters {
        stage: (!args.stage.is_empty()).then(|| args.stage.iter().copied().collect()),
        match_score_min: args.min_score,
        date_applied_from: args.applied_from,
        ..ApplicantFilters::default()
    };
    let board = service.board(&args.query, &filters)?;
    print_board(&board, args.json)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = PipelineSettings {
        capacity: StageCapacity::new()
            .with_limit(Stage::Interviewed, 3)
            .with_limit(Stage::Offered, 2),
        ..PipelineSettings::default()
    };
    let service = build_pipeline(settings, SnapshotSink::Discard, None)?;
    let (applications, jobs) = sample_pipeline();
    service.seed(applications, jobs)?;

    println!("Talent pipeline demo");
    walk_candidates(&service)?;
    let board = service.board("", &ApplicantFilters::default())?;
    print_board(&board, args.json)
}

fn walk_candidates(service: &PipelineApp) -> Result<(), AppError> {
    let recruiter = Actor::new("demo-recruiter");
    let id = |raw: &str| ApplicationId(raw.to_string());

    let report = service.bulk_move(
        &[id("app-001"), id("app-002"), id("app-009")],
        Stage::Reviewed,
        &recruiter,
    );
    println!(
        "Bulk review: moved {}, skipped {}",
        report.moved.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  - {}: {}", failure.application_id, failure.reason);
    }

    let transition = service.move_to_stage(&id("app-003"), Stage::Interviewed, &recruiter)?;
    println!(
        "{} -> {}",
        transition.application.candidate_name, transition.activity.description
    );
    service.move_to_stage(&id("app-004"), Stage::Rejected, &recruiter)?;
    service.add_note(
        &id("app-003"),
        NoteDraft {
            content: "Strong system design round; schedule team match".to_string(),
            is_private: false,
        },
        &recruiter,
    )?;
    service.add_tags(&id("app-005"), vec!["referral".to_string()], &recruiter)?;
    service.assign_recruiter(&id("app-005"), "jordan", &recruiter)?;
    Ok(())
}

fn print_board(board: &PipelineBoard, as_json: bool) -> Result<(), AppError> {
    if as_json {
        let rendered = serde_json::to_string_pretty(board).map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("\nPipeline board ({} applications)", board.total);
    for column in &board.stages {
        let capacity = match column.max_applicants {
            Some(max) => {
                let flag = if column.capacity.at_capacity {
                    " FULL"
                } else if column.capacity.near_capacity {
                    " near cap"
                } else {
                    ""
                };
                format!("{}/{max}{flag}", column.applications.len())
            }
            None => column.applications.len().to_string(),
        };
        println!(
            "- {:<12} {:<14} avg {:>6.1}h  conv {:>5.1}%  drop {:>5.1}%  trend {:?}",
            column.label,
            capacity,
            column.metrics.average_time_in_stage_hours,
            column.metrics.conversion_rate,
            column.metrics.drop_off_rate,
            column.metrics.trend,
        );
        for application in &column.applications {
            let score = application
                .match_score
                .map(|score| format!(" ({score})"))
                .unwrap_or_default();
            println!("    {}{score}", application.candidate_name);
        }
    }

    if !board.unrecognized.is_empty() {
        println!("Unrecognized status");
        for application in &board.unrecognized {
            println!(
                "    {} [{}]",
                application.candidate_name,
                application.status.as_str()
            );
        }
    }
    Ok(())
}

fn sample_pipeline() -> (Vec<Application>, Vec<Job>) {
    let now = Utc::now();
    let job = Job {
        id: JobId("job-platform".to_string()),
        title: "Platform Engineer".to_string(),
        status: JobStatus::Active,
        location: "Remote".to_string(),
        employment_type: EmploymentType::FullTime,
        applications: 0,
        views: 412,
        created_at: now - Duration::days(45),
        expires_at: Some(now + Duration::days(15)),
        skills: vec!["Rust".to_string(), "Kubernetes".to_string()],
        description: "Own the deployment platform and service mesh".to_string(),
        requirements: vec!["5+ years backend experience".to_string()],
        responsibilities: vec!["Operate the service fleet".to_string()],
    };

    let candidates = [
        ("app-001", "Ava Chen", Stage::New, Some(91), 2, &["Rust", "Go"][..]),
        ("app-002", "Ben Ortiz", Stage::New, Some(68), 3, &["Java"][..]),
        ("app-003", "Chidi Obi", Stage::Shortlisted, Some(84), 12, &["Rust", "Kubernetes"][..]),
        ("app-004", "Dana Ruiz", Stage::Reviewed, None, 9, &["Python"][..]),
        ("app-005", "Eli Novak", Stage::Interviewed, Some(77), 20, &["Go"][..]),
        ("app-006", "Fatima Khan", Stage::Offered, Some(95), 30, &["Rust"][..]),
    ];

    let mut applications: Vec<Application> = candidates
        .iter()
        .map(|(id, name, stage, score, days, skills)| {
            sample_application(id, name, *stage, *score, now - Duration::days(*days), skills)
        })
        .collect();

    let mut legacy = sample_application(
        "app-007",
        "Gus Park",
        Stage::New,
        Some(58),
        now - Duration::days(40),
        &["C++"],
    );
    legacy.status = ApplicationStatus::Unrecognized("on_hold".to_string());
    applications.push(legacy);

    (applications, vec![job])
}

fn sample_application(
    id: &str,
    name: &str,
    stage: Stage,
    match_score: Option<u8>,
    applied_at: chrono::DateTime<Utc>,
    skills: &[&str],
) -> Application {
    let handle = name.split_whitespace().next().unwrap_or(name).to_lowercase();
    Application {
        id: ApplicationId(id.to_string()),
        candidate_name: name.to_string(),
        candidate_email: format!("{handle}@example.com"),
        job_id: Some(JobId("job-platform".to_string())),
        job_title: "Platform Engineer".to_string(),
        status: ApplicationStatus::Stage(stage),
        match_score,
        applied_at,
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
        tags: Vec::new(),
        assigned_recruiter: None,
        location: Some("Remote".to_string()),
        experience: None,
        resume_url: None,
        notes: Vec::new(),
        activities: Vec::new(),
        version: 0,
    }
}
