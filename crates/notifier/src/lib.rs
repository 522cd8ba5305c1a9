//! # notifier
//! Thin clients for the SendGrid mail API and the Slack chat API.
//!

pub mod sendgrid;
pub mod slack;

pub use sendgrid::{Attachment, Email, EmailAddress, SendEmailError, SendGrid};
pub use slack::{Emoji, Slack, SlackError, SlackMessage};
