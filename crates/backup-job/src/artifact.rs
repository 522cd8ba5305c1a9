//! The compressed backup held in memory until it is delivered.
//!

use chrono::{DateTime, Utc};
use notifier::Attachment;

/// The extension of every backup file.
pub const ARTIFACT_EXTENSION: &str = "sql.gz";

/// A finished, compressed backup.
#[derive(Debug)]
pub struct CompressedArtifact {
    bytes: Vec<u8>,
    filename: String,
    created: DateTime<Utc>,
}

impl CompressedArtifact {
    /// Wrap the output of a successful pipeline run.
    pub fn new(app_name: &str, bytes: Vec<u8>, created: DateTime<Utc>) -> Self {
        Self {
            filename: artifact_filename(app_name, created),
            bytes,
            created,
        }
    }

    #[allow(missing_docs)]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[allow(missing_docs)]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[allow(missing_docs)]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Consume the artifact into a base64 encoded email attachment.
    pub fn into_attachment(self) -> Attachment {
        Attachment::new(&self.bytes, self.filename)
    }
}

/// The timestamp used in file names and subjects, e.g. `2024-03-01_02-30-00`.
pub fn file_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `<app-slug>-backup_<file date>.sql.gz`
pub fn artifact_filename(app_name: &str, timestamp: DateTime<Utc>) -> String {
    let slug = app_name.to_lowercase().replace(' ', "-");
    format!("{slug}-backup_{}.{ARTIFACT_EXTENSION}", file_date(timestamp))
}
