//! # common
//!

#![allow(dead_code)]

use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

use axum::http::StatusCode;
use backup_job::{BackupRequest, Context, DeliveryConfig};
use notifier::EmailAddress;
use shared::test::MockApi;
use tempfile::TempDir;

/// A directory of stub executables. Removed on drop.
pub struct Stubs {
    directory: TempDir,
}

impl Stubs {
    pub fn new() -> Self {
        Self {
            directory: TempDir::new().unwrap(),
        }
    }

    /// Write an executable shell script.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.directory.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A path in the stub directory that nothing has been written to.
    pub fn path(&self, name: &str) -> PathBuf {
        self.directory.path().join(name)
    }
}

/// A request for the `Acme` app against the given binaries and SendGrid URL.
pub fn request(dump_binary: PathBuf, compress_binary: PathBuf, base_url: &str) -> BackupRequest {
    BackupRequest {
        app_name: "Acme".to_string(),
        database_name: "acme_prod".to_string(),
        dump_binary,
        compress_binary,
        exclude_table_data: vec!["logs".to_string()],
        subprocess_timeout_secs: 30,
        delivery: DeliveryConfig {
            api_key: "test-key".to_string(),
            to: EmailAddress::new("ops@acme.test").with_name("Ops"),
            from: EmailAddress::new("backups@acme.test"),
            request_timeout_secs: 5,
            base_url: base_url.to_string(),
        },
    }
}

pub fn context(request: &BackupRequest) -> Context {
    Context::from(request)
}

/// A mock SendGrid API answering every send with `status` and `body`.
pub async fn mock_sendgrid(status: StatusCode, body: &'static str) -> MockApi {
    MockApi::start("/v3/mail/send", status, body).await
}

/// A mock Slack API answering every post with `body`.
pub async fn mock_slack(body: &'static str) -> MockApi {
    MockApi::start("/api/chat.postMessage", StatusCode::OK, body).await
}
