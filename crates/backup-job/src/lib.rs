//! # backup-job
//! Dump a database, compress the dump and email it.
//!

pub mod artifact;
pub mod config;
pub mod context;
pub mod delivery;
pub mod job;
pub mod pipeline;

pub use artifact::CompressedArtifact;
pub use config::{BackupRequest, Config, DeliveryConfig, LoadConfigError, NotificationConfig};
pub use context::Context;
pub use job::{BackupJob, CreateJobError, JobError, JobOutcome, JobState};
pub use pipeline::{PipelineError, SpawnError, Stage};
