//! The scheduled backup job.
//!

use core::fmt;

use chrono::Utc;
use notifier::{Emoji, SendEmailError, Slack, SlackError, SlackMessage};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    BackupRequest, CompressedArtifact, Config, Context, NotificationConfig,
    delivery::DeliveryClient,
    pipeline::{self, PipelineError},
};

/// Where a run is up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not started.
    Idle,
    /// Launching the dump and compressor.
    Dumping,
    /// Waiting for the dump to be compressed.
    Compressing,
    /// Emailing the artifact.
    Sending,
    /// Finished, successfully or not.
    Done {
        #[allow(missing_docs)]
        success: bool,
    },
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Dumping => write!(f, "Dumping"),
            Self::Compressing => write!(f, "Compressing"),
            Self::Sending => write!(f, "Sending"),
            Self::Done { success: true } => write!(f, "Done(success)"),
            Self::Done { success: false } => write!(f, "Done(failure)"),
        }
    }
}

/// The result of one run.
#[derive(Debug)]
pub enum JobOutcome {
    /// The backup was accepted by the email API.
    Delivered {
        /// The attachment's file name.
        filename: String,
    },

    /// The backup was not delivered.
    Failed(JobError),
}

impl JobOutcome {
    #[allow(missing_docs)]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Dumps, compresses and emails a database each time it is run.
///
/// Holds no state between runs.
#[derive(Debug)]
pub struct BackupJob {
    request: BackupRequest,
    context: Context,
    delivery: DeliveryClient,
    notifier: Option<FailureNotifier>,
}

impl BackupJob {
    /// Create the job and its HTTP clients.
    pub fn new(config: Config) -> Result<Self, CreateJobError> {
        let delivery = DeliveryClient::new(&config.backup)?;
        let notifier = config
            .notification
            .map(FailureNotifier::new)
            .transpose()?;

        Ok(Self {
            context: Context::from(&config.backup),
            request: config.backup,
            delivery,
            notifier,
        })
    }

    #[allow(missing_docs)]
    pub fn request(&self) -> &BackupRequest {
        &self.request
    }

    /// Run the job once.
    ///
    /// Failures are logged, reported to Slack if configured, and returned in the outcome. Nothing
    /// is retried.
    pub async fn run(&self) -> JobOutcome {
        self.run_with_states().await.0
    }

    /// Run the job once, also returning every state it passed through, from `Idle` to `Done`.
    pub async fn run_with_states(&self) -> (JobOutcome, Vec<JobState>) {
        let context = &self.context;
        let mut states = vec![JobState::Idle];

        let outcome = match self.backup(&mut states).await {
            Ok(filename) => {
                info!("{context}Successfully sent scheduled database backup {filename}");
                JobOutcome::Delivered { filename }
            }
            Err(error) => {
                error!("{context}Failed to send scheduled database backup: {error}");
                self.notify_failure(&error).await;
                JobOutcome::Failed(error)
            }
        };

        self.transition(
            &mut states,
            JobState::Done {
                success: outcome.is_delivered(),
            },
        );

        (outcome, states)
    }

    async fn backup(&self, states: &mut Vec<JobState>) -> Result<String, JobError> {
        self.transition(states, JobState::Dumping);
        let running = pipeline::start(&self.context, &self.request)?;

        self.transition(states, JobState::Compressing);
        let compressed = running.finish().await?;
        let artifact = CompressedArtifact::new(&self.request.app_name, compressed, Utc::now());
        let filename = artifact.filename().to_string();

        self.transition(states, JobState::Sending);
        self.delivery.deliver(artifact).await?;

        Ok(filename)
    }

    fn transition(&self, states: &mut Vec<JobState>, next: JobState) {
        if let Some(current) = states.last() {
            debug!("{}{current} -> {next}", self.context);
        }
        states.push(next);
    }

    async fn notify_failure(&self, error: &JobError) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let text = format!(
            "Scheduled database backup for {} ({}) failed: {error}",
            self.request.app_name, self.request.database_name
        );

        match notifier.notify(text).await {
            Ok(true) => debug!("{}Posted failure to Slack", self.context),
            Ok(false) => warn!("{}Slack did not accept the failure message", self.context),
            Err(error) => warn!("{}Could not post failure to Slack: {error}", self.context),
        }
    }
}

#[derive(Debug)]
struct FailureNotifier {
    slack: Slack,
    channel: String,
    username: String,
    emoji: Emoji,
}

impl FailureNotifier {
    fn new(config: NotificationConfig) -> Result<Self, SlackError> {
        let slack = Slack::new(config.token)?.with_base_url(config.base_url);

        Ok(Self {
            slack,
            channel: config.channel,
            username: config.username,
            emoji: config.emoji,
        })
    }

    async fn notify(&self, text: String) -> Result<bool, SlackError> {
        let message = SlackMessage::new(
            text,
            self.channel.clone(),
            self.username.clone(),
            self.emoji.clone(),
        );

        self.slack.post(&message).await
    }
}

/// Why a run did not deliver a backup.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to create backup: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Failed to deliver backup: {0}")]
    Delivery(#[from] SendEmailError),
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CreateJobError {
    #[error("Failed to create SendGrid client: {0}")]
    Delivery(#[from] SendEmailError),

    #[error("Failed to create Slack client: {0}")]
    Notification(#[from] SlackError),
}
