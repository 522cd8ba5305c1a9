//! Backup job config
//!

use core::time::Duration;
use std::{fs, path::PathBuf};

use notifier::{
    EmailAddress, Emoji,
    sendgrid::SENDGRID_BASE_URL,
    slack::SLACK_BASE_URL,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The job's config
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    /// What to back up and where to send it.
    pub backup: BackupRequest,

    /// Where to report failed backups, if anywhere.
    #[serde(default)]
    pub notification: Option<NotificationConfig>,
}

impl Config {
    /// Tries to load a config from a toml file.
    pub fn load_toml(file_path: PathBuf) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile);
        }

        let contents = fs::read_to_string(file_path).map_err(LoadConfigError::Read)?;
        let config = toml::from_str(&contents)?;

        Ok(config)
    }
}

/// Everything needed for one backup run. Read only once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRequest {
    /// The application name, used in the subject and file name.
    pub app_name: String,

    /// The database to dump.
    pub database_name: String,

    /// The path to the dump binary, e.g. `pg_dump`.
    pub dump_binary: PathBuf,

    /// The path to the compression binary, e.g. `gzip`.
    pub compress_binary: PathBuf,

    /// Tables whose rows are left out of the dump. Their schema is still dumped.
    #[serde(default)]
    pub exclude_table_data: Vec<String>,

    /// How long the dump and compression may take together.
    #[serde(default = "default_subprocess_timeout_secs")]
    pub subprocess_timeout_secs: u64,

    /// Where to send the backup.
    pub delivery: DeliveryConfig,
}

impl BackupRequest {
    #[allow(missing_docs)]
    pub fn subprocess_timeout(&self) -> Duration {
        Duration::from_secs(self.subprocess_timeout_secs)
    }
}

impl Default for BackupRequest {
    fn default() -> Self {
        Self {
            app_name: "My App".to_string(),
            database_name: "my_app".to_string(),
            dump_binary: PathBuf::from("/usr/bin/pg_dump"),
            compress_binary: PathBuf::from("/usr/bin/gzip"),
            exclude_table_data: Vec::new(),
            subprocess_timeout_secs: default_subprocess_timeout_secs(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// SendGrid delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// The SendGrid API key.
    pub api_key: String,

    /// Who receives the backups.
    pub to: EmailAddress,

    /// Who the backups are from.
    #[serde(default = "default_from")]
    pub from: EmailAddress,

    /// How long the send request may take.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// The SendGrid API base URL.
    #[serde(default = "default_sendgrid_url")]
    pub base_url: String,
}

impl DeliveryConfig {
    #[allow(missing_docs)]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            to: EmailAddress::new("admin@example.com"),
            from: default_from(),
            request_timeout_secs: default_request_timeout_secs(),
            base_url: default_sendgrid_url(),
        }
    }
}

/// Slack settings for failure notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// The bot token.
    pub token: String,

    /// The channel to post to.
    pub channel: String,

    /// The name to post as.
    #[serde(default = "default_username")]
    pub username: String,

    /// The icon to post with.
    #[serde(default = "default_emoji")]
    pub emoji: Emoji,

    /// The Slack API base URL.
    #[serde(default = "default_slack_url")]
    pub base_url: String,
}

fn default_subprocess_timeout_secs() -> u64 {
    60 * 60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_from() -> EmailAddress {
    EmailAddress::new("backups@example.com").with_name("Database Backups")
}

fn default_sendgrid_url() -> String {
    SENDGRID_BASE_URL.to_string()
}

fn default_username() -> String {
    "backups".to_string()
}

fn default_emoji() -> Emoji {
    Emoji::RobotFace
}

fn default_slack_url() -> String {
    SLACK_BASE_URL.to_string()
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file does not exist.")]
    NoFile,

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    Deserialize(#[from] toml::de::Error),
}
