// src/actions/slack.rs

//! Post a message to a Slack channel.
//!
//! The channel is configured by name. It is resolved to an id by paging
//! through `conversations.list`, then the message is posted with
//! `chat.postMessage` as four blocks: a header naming the watcher and
//! action, the rendered message, a divider, and the change excerpt.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::http::{HttpRequest, HttpResponse};
use super::template::{change_summary, render};
use super::{ActionEnv, ActionOutcome, ActionRequest};
use crate::errors::Result;

/// Page size for `conversations.list`.
const CHANNEL_PAGE_LIMIT: &str = "400";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackAction {
    pub name: String,
    /// Channel name, with or without a leading `#`.
    pub channel: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChannelPage {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct Channel {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

impl SlackAction {
    pub fn new(
        name: impl Into<String>,
        channel: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub async fn perform(
        &self,
        env: &ActionEnv,
        request: &ActionRequest<'_>,
    ) -> Result<ActionOutcome> {
        let Some(token) = env.slack.token.as_deref() else {
            return Err(request.failure(
                &self.name,
                format!("missing slack token. Is {} set?", env.slack.token_env),
            ));
        };

        let channel_id = self.find_channel_id(env, token, request).await?;
        let blocks = self.blocks(request);
        debug!(action = %self.name, blocks = %blocks, "posting slack blocks");

        let body = json!({
            "channel": channel_id,
            "text": format!("{}: {}", request.watcher_name, self.name),
            "blocks": blocks,
        });
        let response = env
            .http()
            .send(
                HttpRequest::post(format!("{}/chat.postMessage", env.slack.api_base), body)
                    .bearer(token),
            )
            .await?;
        self.check_reply(&response, request)?;

        info!(
            action = %self.name,
            channel = %self.channel,
            watcher = %request.watcher_name,
            "posted slack message"
        );
        Ok(ActionOutcome::Delivered {
            status: response.status,
        })
    }

    /// Message blocks: header, message, divider, change excerpt.
    pub fn blocks(&self, request: &ActionRequest<'_>) -> serde_json::Value {
        json!([
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("{}: {}", request.watcher_name, self.name),
                },
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": render(&self.message, request) },
            },
            { "type": "divider" },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": change_summary(request) },
            },
        ])
    }

    async fn find_channel_id(
        &self,
        env: &ActionEnv,
        token: &str,
        request: &ActionRequest<'_>,
    ) -> Result<String> {
        let wanted = self.channel.trim_start_matches('#');
        let mut cursor = String::new();

        loop {
            let mut page_request =
                HttpRequest::get(format!("{}/conversations.list", env.slack.api_base))
                    .bearer(token)
                    .query("exclude_archived", "true")
                    .query("limit", CHANNEL_PAGE_LIMIT)
                    .query("types", "public_channel,private_channel");
            if !cursor.is_empty() {
                page_request = page_request.query("cursor", cursor.as_str());
            }

            let response = env.http().send(page_request).await?;
            if !response.is_success() {
                return Err(request.failure(
                    &self.name,
                    format!("conversations.list returned HTTP {}", response.status),
                ));
            }
            let page: ChannelPage = response.json()?;
            if !page.ok {
                return Err(request.failure(
                    &self.name,
                    format!(
                        "conversations.list failed: {}",
                        page.error.unwrap_or_default()
                    ),
                ));
            }

            if let Some(channel) = page.channels.iter().find(|c| c.name == wanted) {
                return Ok(channel.id.clone());
            }

            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Err(request.failure(
                    &self.name,
                    format!(
                        "channel {} not found, did you /invite @changelink to the channel?",
                        self.channel
                    ),
                ));
            }
        }
    }

    fn check_reply(&self, response: &HttpResponse, request: &ActionRequest<'_>) -> Result<()> {
        if !response.is_success() {
            return Err(request.failure(
                &self.name,
                format!("chat.postMessage returned HTTP {}", response.status),
            ));
        }
        let reply: SlackReply = response.json()?;
        if !reply.ok {
            return Err(request.failure(
                &self.name,
                format!("chat.postMessage failed: {}", reply.error.unwrap_or_default()),
            ));
        }
        Ok(())
    }
}
