//! Slack `chat.postMessage` client.
//!

use core::{fmt, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

/// The base URL of the Slack API.
pub const SLACK_BASE_URL: &str = "https://slack.com";

const POST_MESSAGE_PATH: &str = "/api/chat.postMessage";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The icon to post a message with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emoji {
    #[allow(missing_docs)]
    Unlock,
    #[allow(missing_docs)]
    RobotFace,
    /// Any other emoji by its short name, without colons.
    Custom(String),
}

impl From<String> for Emoji {
    fn from(value: String) -> Self {
        match value.as_str() {
            "unlock" => Self::Unlock,
            "robot_face" => Self::RobotFace,
            _ => Self::Custom(value),
        }
    }
}

impl From<Emoji> for String {
    fn from(value: Emoji) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlock => write!(f, "unlock"),
            Self::RobotFace => write!(f, "robot_face"),
            Self::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

/// A message to post to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackMessage {
    #[allow(missing_docs)]
    pub text: String,
    #[allow(missing_docs)]
    pub channel: String,
    /// The name the message is posted as.
    pub username: String,
    #[allow(missing_docs)]
    pub emoji: Emoji,
}

impl SlackMessage {
    #[allow(missing_docs)]
    pub fn new(
        text: impl Into<String>,
        channel: impl Into<String>,
        username: impl Into<String>,
        emoji: Emoji,
    ) -> Self {
        Self {
            text: text.into(),
            channel: channel.into(),
            username: username.into(),
            emoji,
        }
    }

    /// The `chat.postMessage` request body. Unfurling is always off.
    pub fn body(&self) -> Value {
        json!({
            "channel": self.channel,
            "text": self.text,
            "icon_emoji": self.emoji.to_string(),
            "username": self.username,
            "unfurl_links": "false",
            "unfurl_media": "false",
        })
    }
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for posting Slack messages with a bot token.
#[derive(Debug, Clone)]
pub struct Slack {
    client: Client,
    token: String,
    base_url: String,
}

impl Slack {
    #[allow(missing_docs)]
    pub fn new(token: impl Into<String>) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SlackError::BuildClient)?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: SLACK_BASE_URL.to_string(),
        })
    }

    /// Send requests somewhere other than the Slack API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Post a message, returning if Slack reported `ok`.
    ///
    /// Slack answers most failures with a `200` and `"ok": false`, so the status is not checked.
    pub async fn post(&self, message: &SlackMessage) -> Result<bool, SlackError> {
        let url = format!("{}{POST_MESSAGE_PATH}", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&message.body())
            .send()
            .await
            .map_err(SlackError::Transport)?;

        let body = response.text().await.map_err(SlackError::Transport)?;
        let response: PostMessageResponse = serde_json::from_str(&body)?;

        if !response.ok {
            let reason = response.error.as_deref().unwrap_or("no reason given");
            warn!("Slack refused message to {}: {reason}", message.channel);
        }

        Ok(response.ok)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("Failed to reach Slack: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode Slack response: {0}")]
    Decode(#[from] serde_json::Error),
}
