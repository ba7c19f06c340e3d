use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const SLACK_API_URL: &str = "https://slack.com/api";

pub struct SlackClient {
    client: Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, SLACK_API_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Post `text` to `channel`. Returns the message timestamp.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<String> {
        let request = PostMessageRequest {
            channel,
            text,
            unfurl_links: false,
            unfurl_media: false,
        };

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SlackApi(format!("API returned {status}: {body}")));
        }

        let body = response.json::<PostMessageResponse>().await?;
        let ts = body.into_result()?;

        tracing::info!(channel, ts = %ts, "Posted message to Slack");
        Ok(ts)
    }
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    unfurl_links: bool,
    unfurl_media: bool,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

impl PostMessageResponse {
    fn into_result(self) -> Result<String> {
        if !self.ok {
            return Err(AppError::SlackApi(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(self.ts.unwrap_or_default())
    }
}
