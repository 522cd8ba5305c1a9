//! End to end tests for the scheduled backup job
//!

#![cfg(unix)]

use axum::http::StatusCode;
use backup_job::{
    BackupJob, Config, JobError, JobOutcome, JobState, NotificationConfig, PipelineError,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDateTime;
use common::{Stubs, mock_sendgrid, mock_slack, request};
use notifier::{Emoji, SendEmailError};
use shared::test::{init_test_logger, unreachable_base_url};

mod common;

const UPPERCASE: &str = "tr '[:lower:]' '[:upper:]'";

fn job(config: Config) -> BackupJob {
    BackupJob::new(config).unwrap()
}

fn config(stubs: &Stubs, dump: &str, base_url: &str) -> Config {
    Config {
        backup: request(
            stubs.script("dump", dump),
            stubs.script("compress", UPPERCASE),
            base_url,
        ),
        notification: None,
    }
}

#[tokio::test]
async fn delivers_backup() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(StatusCode::ACCEPTED, "").await;

    let (outcome, states) = job(config(&stubs, "printf 'DUMPDATA'", &sendgrid.base_url))
        .run_with_states()
        .await;

    assert_eq!(
        states,
        vec![
            JobState::Idle,
            JobState::Dumping,
            JobState::Compressing,
            JobState::Sending,
            JobState::Done { success: true },
        ]
    );

    let filename = match outcome {
        JobOutcome::Delivered { filename } => filename,
        JobOutcome::Failed(error) => panic!("expected delivery, got {error}"),
    };

    // acme-backup_<timestamp>.sql.gz
    let timestamp = filename
        .strip_prefix("acme-backup_")
        .and_then(|rest| rest.strip_suffix(".sql.gz"))
        .unwrap();
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d_%H-%M-%S").unwrap();

    let requests = sendgrid.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer test-key"));

    let body = request.json();
    assert_eq!(
        body["subject"],
        format!("[Acme] Database backup {timestamp}")
    );
    assert_eq!(body["personalizations"][0]["to"][0]["email"], "ops@acme.test");
    assert_eq!(body["from"]["email"], "backups@acme.test");
    assert_eq!(body["content"][0]["value"], "Backup attached.");
    assert_eq!(body["attachments"][0]["filename"], filename.as_str());
    assert_eq!(body["attachments"][0]["type"], "text/plain");

    let content = body["attachments"][0]["content"].as_str().unwrap();
    assert_eq!(STANDARD.decode(content).unwrap(), b"DUMPDATA");
}

#[tokio::test]
async fn missing_dump_short_circuits() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(StatusCode::ACCEPTED, "").await;
    let marker = stubs.path("compress-started");

    let config = Config {
        backup: request(
            stubs.path("missing-dump"),
            stubs.script("compress", &format!("touch '{}'; cat", marker.display())),
            &sendgrid.base_url,
        ),
        notification: None,
    };

    let (outcome, states) = job(config).run_with_states().await;

    assert!(
        matches!(
            outcome,
            JobOutcome::Failed(JobError::Pipeline(PipelineError::Spawn(_)))
        ),
        "{outcome:?}"
    );
    assert_eq!(
        states,
        vec![
            JobState::Idle,
            JobState::Dumping,
            JobState::Done { success: false },
        ]
    );
    assert!(!marker.exists());
    assert!(sendgrid.requests().is_empty());
}

#[tokio::test]
async fn failed_dump_is_not_sent() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(StatusCode::ACCEPTED, "").await;

    let (outcome, states) = job(config(&stubs, "printf 'partial'; exit 2", &sendgrid.base_url))
        .run_with_states()
        .await;

    assert!(
        matches!(
            outcome,
            JobOutcome::Failed(JobError::Pipeline(PipelineError::Exited { .. }))
        ),
        "{outcome:?}"
    );
    assert_eq!(
        states,
        vec![
            JobState::Idle,
            JobState::Dumping,
            JobState::Compressing,
            JobState::Done { success: false },
        ]
    );
    assert!(sendgrid.requests().is_empty());
}

#[tokio::test]
async fn rejected_delivery() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(
        StatusCode::BAD_REQUEST,
        r#"{"errors":[{"message":"Invalid attachment","field":"attachments"}]}"#,
    )
    .await;

    let (outcome, states) = job(config(&stubs, "printf 'DUMPDATA'", &sendgrid.base_url))
        .run_with_states()
        .await;

    match outcome {
        JobOutcome::Failed(JobError::Delivery(SendEmailError::Rejected { status, errors })) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(errors, vec!["attachments: Invalid attachment"]);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(states.last(), Some(&JobState::Done { success: false }));
    assert!(states.contains(&JobState::Sending));
    assert_eq!(sendgrid.requests().len(), 1);
}

#[tokio::test]
async fn malformed_response_is_contained() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(StatusCode::INTERNAL_SERVER_ERROR, "{not json}").await;

    let outcome = job(config(&stubs, "printf 'DUMPDATA'", &sendgrid.base_url))
        .run()
        .await;

    match outcome {
        JobOutcome::Failed(JobError::Delivery(SendEmailError::Decode { status, .. })) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        }
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(sendgrid.requests().len(), 1);
}

#[tokio::test]
async fn unreachable_email_api() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let base_url = unreachable_base_url().await;

    let outcome = job(config(&stubs, "printf 'DUMPDATA'", &base_url))
        .run()
        .await;

    assert!(
        matches!(
            outcome,
            JobOutcome::Failed(JobError::Delivery(SendEmailError::Transport(_)))
        ),
        "{outcome:?}"
    );
}

#[tokio::test]
async fn failure_is_posted_to_slack() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(StatusCode::ACCEPTED, "").await;
    let slack = mock_slack(r#"{"ok":true}"#).await;

    let mut config = config(&stubs, "echo 'no such database' >&2; exit 1", &sendgrid.base_url);
    config.notification = Some(NotificationConfig {
        token: "xoxb-test".to_string(),
        channel: "#ops".to_string(),
        username: "backups".to_string(),
        emoji: Emoji::RobotFace,
        base_url: slack.base_url.clone(),
    });

    let outcome = job(config).run().await;

    assert!(!outcome.is_delivered());
    assert!(sendgrid.requests().is_empty());

    let posts = slack.requests();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].authorization.as_deref(), Some("Bearer xoxb-test"));

    let post = posts[0].json();
    assert_eq!(post["channel"], "#ops");
    assert_eq!(post["icon_emoji"], "robot_face");

    let text = post["text"].as_str().unwrap();
    assert!(text.contains("Acme"), "{text}");
    assert!(text.contains("no such database"), "{text}");
}

#[tokio::test]
async fn slack_refusal_does_not_escape() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let slack = mock_slack("{not json}").await;
    let base_url = unreachable_base_url().await;

    let mut config = config(&stubs, "exit 1", &base_url);
    config.notification = Some(NotificationConfig {
        token: "xoxb-test".to_string(),
        channel: "#ops".to_string(),
        username: "backups".to_string(),
        emoji: Emoji::Unlock,
        base_url: slack.base_url.clone(),
    });

    let outcome = job(config).run().await;

    assert!(!outcome.is_delivered());
    assert_eq!(slack.requests().len(), 1);
}

#[tokio::test]
async fn successful_run_does_not_notify() {
    let _logger = init_test_logger();
    let stubs = Stubs::new();
    let sendgrid = mock_sendgrid(StatusCode::ACCEPTED, "").await;
    let slack = mock_slack(r#"{"ok":true}"#).await;

    let mut config = config(&stubs, "printf 'DUMPDATA'", &sendgrid.base_url);
    config.notification = Some(NotificationConfig {
        token: "xoxb-test".to_string(),
        channel: "#ops".to_string(),
        username: "backups".to_string(),
        emoji: Emoji::RobotFace,
        base_url: slack.base_url.clone(),
    });

    assert!(job(config).run().await.is_delivered());
    assert!(slack.requests().is_empty());
}
