//! 用内存门户跑完整的登录 → 翻页 → 申请流程

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use auto_apply_submit::error::AppError;
use auto_apply_submit::fakes::{self, ApplyMode, FakePortal, FakePosting};
use auto_apply_submit::{App, Config, RunSummary};
use tempfile::TempDir;

struct Policy {
    resume: bool,
    transcript: bool,
    cover_letter: bool,
}

const RESUME_ONLY: Policy = Policy {
    resume: true,
    transcript: false,
    cover_letter: false,
};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// 测试用配置，所有文件都放在临时目录
fn test_config(dir: &Path, policy: &Policy) -> Config {
    let transcript = dir.join("transcript.pdf");
    let cover_letter = dir.join("cover_letter.pdf");
    let env: HashMap<&str, String> = HashMap::from([
        ("LOGIN_URL", fakes::login_url()),
        ("SEARCH_URL", fakes::listing_url(0)),
        ("USERNAME", "student".to_string()),
        ("PASSWORD", "secret".to_string()),
        ("INCLUDE_RESUME", yes_no(policy.resume).to_string()),
        ("INCLUDE_TRANSCRIPT", yes_no(policy.transcript).to_string()),
        ("INCLUDE_COVER_LETTER", yes_no(policy.cover_letter).to_string()),
        ("TRANSCRIPT_PATH", transcript.display().to_string()),
        ("COVER_LETTER_PATH", cover_letter.display().to_string()),
    ]);

    let mut config = Config::from_sources(|key| env.get(key).cloned(), None).unwrap();
    config.ledger_file = dir.join("jobs.csv");
    config.output_log_file = dir.join("output.txt").display().to_string();
    config.wait_timeout = Duration::from_millis(100);
    config.mfa_timeout = Duration::from_millis(300);
    config.inter_job_delay = Duration::ZERO;
    config
}

async fn run(config: &Config, portal: &FakePortal) -> anyhow::Result<RunSummary> {
    App::with_gateway(config.clone(), Box::new(portal.clone()))?
        .run()
        .await
}

fn ledger_lines(config: &Config) -> Vec<String> {
    std::fs::read_to_string(&config.ledger_file)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn run_log(config: &Config) -> String {
    std::fs::read_to_string(&config.output_log_file).unwrap()
}

fn today() -> String {
    chrono::Local::now().format("%m/%d").to_string()
}

fn touch(path: PathBuf) -> PathBuf {
    std::fs::write(&path, b"%PDF-1.4").unwrap();
    path
}

#[tokio::test]
async fn test_eligible_job_is_submitted_and_logged() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new().with_page(vec![FakePosting::new("123456")
        .title(Some("Data Intern"))
        .company(Some("Acme"))]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.applied, 1);
    assert_eq!(summary.total(), 1);
    assert_eq!(portal.submitted(), vec![format!("{}/jobs/123456", fakes::PORTAL_BASE)]);
    assert_eq!(
        ledger_lines(&config),
        vec![
            "Job ID,Company,Position,Resume,Transcript,Cover Letter,Date".to_string(),
            format!("123456,Acme,Data Intern,Yes,No,No,{}", today()),
        ]
    );
}

#[tokio::test]
async fn test_second_run_rejects_already_applied() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new().with_page(vec![FakePosting::new("123456")]);

    let first = run(&config, &portal).await.unwrap();
    assert_eq!(first.applied, 1);

    let second = run(&config, &portal).await.unwrap();
    assert_eq!(second.applied, 0);
    assert_eq!(second.rejected, 1);

    assert_eq!(portal.submitted().len(), 1);
    let rows: Vec<_> = ledger_lines(&config)
        .into_iter()
        .filter(|line| line.starts_with("123456,"))
        .collect();
    assert_eq!(rows.len(), 1);
    assert!(run_log(&config).contains("123456 | rejected | already applied"));
}

#[tokio::test]
async fn test_ledgered_job_is_rejected_even_without_apply_control() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    std::fs::write(
        &config.ledger_file,
        "Job ID,Company,Position,Resume,Transcript,Cover Letter,Date\n\
         123456,Acme,Data Intern,Yes,No,No,01/02\n",
    )
    .unwrap();
    let portal =
        FakePortal::new().with_page(vec![FakePosting::new("123456").apply(ApplyMode::Missing)]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.failed, 0);
    assert!(portal.submitted().is_empty());
    assert_eq!(ledger_lines(&config).len(), 2);
    assert!(run_log(&config).contains("123456 | rejected | already applied"));
}

#[tokio::test]
async fn test_missing_transcript_fails_without_submitting() {
    let dir = TempDir::new().unwrap();
    let config = test_config(
        dir.path(),
        &Policy {
            resume: true,
            transcript: true,
            cover_letter: false,
        },
    );
    let portal = FakePortal::new().with_page(vec![
        FakePosting::new("555").field("Upload your Transcript", true)
    ]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert!(portal.submitted().is_empty());
    assert!(portal.uploads().is_empty());
    assert!(!config.ledger_file.exists());
    assert!(run_log(&config).contains("missing document"));
}

#[tokio::test]
async fn test_page_loop_survives_injected_failures() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);

    let mut portal = FakePortal::new();
    for page in 0..3 {
        let postings = (0..4)
            .map(|job| {
                let posting = FakePosting::new(&format!("{}{:02}", page + 1, job));
                match (page, job) {
                    (_, 1) => posting.broken(),
                    (1, 3) => posting.apply(ApplyMode::External),
                    _ => posting,
                }
            })
            .collect();
        portal = portal.with_page(postings);
    }

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.pages_processed, 3);
    assert!(!summary.truncated);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.applied, 8);
    assert_eq!(portal.submitted().len(), 8);
    assert_eq!(ledger_lines(&config).len(), 1 + 8);
}

#[tokio::test]
async fn test_excluded_documents_are_never_uploaded() {
    let dir = TempDir::new().unwrap();
    let transcript = touch(dir.path().join("transcript.pdf"));
    let config = test_config(
        dir.path(),
        &Policy {
            resume: true,
            transcript: true,
            cover_letter: false,
        },
    );
    let portal = FakePortal::new().with_page(vec![FakePosting::new("808")
        .field("Resume", true)
        .field("Transcript", true)
        .field("Cover Letter", true)]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.applied, 1);
    let uploads = portal.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].label, "Transcript");
    assert_eq!(uploads[0].path, transcript);
    assert!(ledger_lines(&config)[1].starts_with("808,Company 808,Position 808,Yes,Yes,No,"));
}

#[tokio::test]
async fn test_unconfirmed_upload_still_submits() {
    let dir = TempDir::new().unwrap();
    touch(dir.path().join("cover_letter.pdf"));
    let config = test_config(
        dir.path(),
        &Policy {
            resume: true,
            transcript: false,
            cover_letter: true,
        },
    );
    let portal = FakePortal::new()
        .with_page(vec![FakePosting::new("909").field("Cover Letter", false)]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.applied, 1);
    assert_eq!(portal.uploads().len(), 1);
    assert_eq!(portal.submitted().len(), 1);
}

#[tokio::test]
async fn test_restrictive_requirement_rejects() {
    let dir = TempDir::new().unwrap();
    let config = test_config(
        dir.path(),
        &Policy {
            resume: false,
            transcript: false,
            cover_letter: false,
        },
    );
    let portal = FakePortal::new().with_page(vec![
        FakePosting::new("321").modal_text("Please Attach Your Resume to continue")
    ]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.rejected, 1);
    assert!(portal.submitted().is_empty());
    assert!(run_log(&config).contains("321 | rejected | job requires resume"));
}

#[tokio::test]
async fn test_external_application_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new().with_page(vec![
        FakePosting::new("42").apply(ApplyMode::External),
        FakePosting::new("43").apply(ApplyMode::Missing),
    ]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.failed, 1);
    assert!(portal.submitted().is_empty());
    let log = run_log(&config);
    assert!(log.contains("42 | rejected | external application"));
    assert!(log.contains("43 | failed |"));
}

#[tokio::test]
async fn test_missing_metadata_is_logged_as_empty() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new().with_page(vec![
        FakePosting::new("777").title(None).company(None),
        FakePosting::without_job_id("acme"),
    ]);

    let summary = run(&config, &portal).await.unwrap();

    assert_eq!(summary.applied, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        ledger_lines(&config)[1],
        format!("777,,,Yes,No,No,{}", today())
    );
    assert_eq!(portal.submitted().len(), 1);
}

#[tokio::test]
async fn test_pagination_failure_truncates_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new()
        .with_page(vec![FakePosting::new("1")])
        .with_page(vec![FakePosting::new("2")])
        .next_page_missing_on(0);

    let summary = run(&config, &portal).await.unwrap();

    assert!(summary.truncated);
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(summary.applied, 1);
    assert!(run_log(&config).contains("翻页失败"));
}

#[tokio::test]
async fn test_missing_pagination_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new()
        .with_page(vec![FakePosting::new("1")])
        .without_pagination();

    let err = run(&config, &portal).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Navigation(_))
    ));
    assert!(portal.submitted().is_empty());
}

#[tokio::test]
async fn test_second_factor_timeout_aborts_before_any_job() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new()
        .with_page(vec![FakePosting::new("1")])
        .second_factor_completes(false);

    let err = run(&config, &portal).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Authentication(_))
    ));
    assert!(!portal.navigations().contains(&fakes::listing_url(0)));
}

#[tokio::test]
async fn test_wrong_credentials_never_reach_portal() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &RESUME_ONLY);
    let portal = FakePortal::new()
        .with_page(vec![FakePosting::new("1")])
        .with_credentials("someone-else", "secret");

    let err = run(&config, &portal).await.unwrap_err();

    let app_err = err.downcast_ref::<AppError>().unwrap();
    assert!(app_err.is_fatal());
    assert!(portal.submitted().is_empty());
}

#[tokio::test]
async fn test_ledger_write_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path(), &RESUME_ONLY);
    let ledger_dir = dir.path().join("ledger-is-a-directory");
    std::fs::create_dir(&ledger_dir).unwrap();
    config.ledger_file = ledger_dir;

    let portal = FakePortal::new().with_page(vec![FakePosting::new("1"), FakePosting::new("2")]);

    let err = run(&config, &portal).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Persistence(_))
    ));
    assert_eq!(portal.submitted().len(), 1);
}
