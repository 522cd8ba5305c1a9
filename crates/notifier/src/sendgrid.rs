//! SendGrid v3 mail send client.
//!

use core::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The base URL of the SendGrid API.
pub const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

const MAIL_SEND_PATH: &str = "/v3/mail/send";

/// A sender or recipient of an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// The address.
    pub email: String,

    /// The display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailAddress {
    /// An address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<&str> for EmailAddress {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
pub struct Personalization {
    pub to: Vec<EmailAddress>,
}

/// A body part of an email.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    /// The MIME type of the value.
    #[serde(rename = "type")]
    pub mime_type: String,

    /// The body.
    pub value: String,
}

/// A file attached to an email.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    /// The base64 encoded file contents.
    pub content: String,

    /// The file name shown to the recipient.
    pub filename: String,

    /// The MIME type of the file.
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl Attachment {
    /// Encode some data as an attachment.
    pub fn new(data: &[u8], filename: impl Into<String>) -> Self {
        Self {
            content: STANDARD.encode(data),
            filename: filename.into(),
            mime_type: "text/plain".to_string(),
        }
    }
}

/// The body of a mail send request.
#[derive(Debug, Clone, Serialize)]
pub struct Email {
    #[allow(missing_docs)]
    pub personalizations: Vec<Personalization>,

    /// The sender.
    pub from: EmailAddress,

    /// The subject line.
    pub subject: String,

    /// The body parts.
    pub content: Vec<Content>,

    /// Attached files.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// A single recipient HTML email.
    pub fn new(
        to: EmailAddress,
        from: EmailAddress,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            personalizations: vec![Personalization { to: vec![to] }],
            from,
            subject: subject.into(),
            content: vec![Content {
                mime_type: "text/html".to_string(),
                value: html.into(),
            }],
            attachments: Vec::new(),
        }
    }

    /// Attach a file.
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }
}

/// Client for the SendGrid mail send endpoint.
#[derive(Debug, Clone)]
pub struct SendGrid {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SendGrid {
    /// Create a client that gives up on a request after `timeout`.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, SendEmailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SendEmailError::BuildClient)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: SENDGRID_BASE_URL.to_string(),
        })
    }

    /// Send requests somewhere other than the SendGrid API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Submit an email.
    ///
    /// Only a `202 Accepted` response counts as sent. Anything else is [`SendEmailError::Rejected`],
    /// or [`SendEmailError::Decode`] when the error body is not SendGrid's JSON.
    pub async fn send(&self, email: &Email) -> Result<(), SendEmailError> {
        let url = format!("{}{MAIL_SEND_PATH}", self.base_url);
        debug!(
            "Sending '{}' with {} attachment(s)",
            email.subject,
            email.attachments.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(SendEmailError::Transport)?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let body = response.text().await.map_err(SendEmailError::Transport)?;
        let errors =
            parse_errors(&body).map_err(|source| SendEmailError::Decode { status, source })?;

        Err(SendEmailError::Rejected { status, errors })
    }

    /// Submit an email, returning if the API accepted it.
    ///
    /// Every response other than `202 Accepted` is `false`, whatever its body. Only failing to
    /// reach the API is an error.
    pub async fn accepted(&self, email: &Email) -> Result<bool, SendEmailError> {
        match self.send(email).await {
            Ok(()) => Ok(true),
            Err(SendEmailError::Rejected { status, errors }) => {
                warn!("SendGrid responded {status}: {errors:?}");
                Ok(false)
            }
            Err(SendEmailError::Decode { status, source }) => {
                warn!("SendGrid responded {status} with an unreadable body: {source}");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
    #[serde(default)]
    field: Option<String>,
}

/// Pull the messages out of an error response. An empty body has no messages.
fn parse_errors(body: &str) -> Result<Vec<String>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let body: ErrorBody = serde_json::from_str(body)?;

    let errors = body
        .errors
        .into_iter()
        .map(|error| match error.field {
            Some(field) => format!("{field}: {}", error.message),
            None => error.message,
        })
        .collect();

    Ok(errors)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SendEmailError {
    #[error("Failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("Failed to reach SendGrid: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("SendGrid rejected the email with {status}: {errors:?}")]
    Rejected {
        status: StatusCode,
        errors: Vec<String>,
    },

    #[error("Failed to decode SendGrid {status} response: {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}
