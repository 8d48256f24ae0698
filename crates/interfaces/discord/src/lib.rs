//! Discord REST implementation of [`ChatService`].
//!
//! Only four endpoints are used: the bot's own user (to validate the token),
//! channel lookup, the channel message listing, and message creation.  No
//! gateway connection is opened.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dom5_config::DiscordConfig;
use dom5_runtime::{ChannelHandle, ChatError, ChatService};

/// Discord returns at most this many messages per listing request.
pub const MAX_HISTORY_PAGE: usize = 100;

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/your-org/dom5-notify, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const TIMEOUT: Duration = Duration::from_secs(15);

pub struct DiscordClient {
    http: Client,
    base_url: String,
    session: Option<Session>,
}

struct Session {
    token: String,
    bot_name: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .field("logged_in", &self.session.is_some())
            .finish()
    }
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> Result<Self, ChatError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Name of the bot user, once logged in.
    pub fn bot_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.bot_name.as_str())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ChatError> {
        let session = self.session.as_ref().ok_or(ChatError::NotLoggedIn)?;
        Ok(request.header(AUTHORIZATION, bot_auth(&session.token)))
    }
}

#[async_trait]
impl ChatService for DiscordClient {
    async fn login(&mut self, token: &str) -> Result<(), ChatError> {
        let request = self
            .http
            .get(self.url("/users/@me"))
            .header(AUTHORIZATION, bot_auth(token));
        let user: DiscordUser = execute(request, "users/@me").await?;

        info!(bot = %user.username, "logged in to discord");
        self.session = Some(Session {
            token: token.to_string(),
            bot_name: user.username,
        });
        Ok(())
    }

    async fn fetch_channel(&self, channel_id: u64) -> Result<ChannelHandle, ChatError> {
        let request = self.authorized(self.http.get(self.url(&format!("/channels/{channel_id}"))))?;
        let channel: DiscordChannel = execute(request, "channel").await?;

        let id = channel.id.parse().map_err(|_| {
            ChatError::InvalidResponse(format!("channel id is not numeric: {}", channel.id))
        })?;
        Ok(ChannelHandle {
            id,
            name: channel.name,
        })
    }

    async fn history(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        let limit = clamp_history_limit(limit);
        let request = self.authorized(
            self.http
                .get(self.url(&format!("/channels/{}/messages", channel.id)))
                .query(&[("limit", limit.to_string())]),
        )?;
        let messages: Vec<DiscordMessage> = execute(request, "channel messages").await?;

        debug!(channel = channel.id, limit, fetched = messages.len(), "fetched history");
        Ok(messages.into_iter().map(|m| m.content).collect())
    }

    async fn send(&self, channel: &ChannelHandle, text: &str) -> Result<(), ChatError> {
        let body = CreateMessageRequest {
            content: text,
            allowed_mentions: AllowedMentions { parse: [] },
        };
        let request = self.authorized(
            self.http
                .post(self.url(&format!("/channels/{}/messages", channel.id)))
                .json(&body),
        )?;
        let _: serde_json::Value = execute(request, "create message").await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!(bot = %session.bot_name, "discord session released");
        }
    }
}

fn bot_auth(token: &str) -> String {
    format!("Bot {}", token.trim())
}

fn clamp_history_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_HISTORY_PAGE)
}

fn transport(err: reqwest::Error) -> ChatError {
    ChatError::Transport(err.to_string())
}

async fn execute<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T, ChatError> {
    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(status.as_u16(), &body));
    }

    response
        .json()
        .await
        .map_err(|err| ChatError::InvalidResponse(format!("{what}: {err}")))
}

/// Build an error from a non-2xx response, preferring Discord's own message.
fn api_error(status: u16, body: &str) -> ChatError {
    let message = serde_json::from_str::<DiscordErrorBody>(body)
        .ok()
        .map(|err| err.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });
    ChatError::Api { status, message }
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct DiscordChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct DiscordErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    content: &'a str,
    allowed_mentions: AllowedMentions,
}

/// Empty `parse` list: a game name can never ping anyone.
#[derive(Debug, Serialize)]
struct AllowedMentions {
    parse: [&'static str; 0],
}
