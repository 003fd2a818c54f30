// src/services/discord.rs

//! Discord notification transport.
//!
//! Talks to the Discord REST API as a bot. Opening a session checks the
//! token against `/users/@me`, so bad credentials surface before any
//! message is attempted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::DiscordConfig;
use crate::services::{NotificationSession, NotificationTransport};
use crate::utils::http::describe_failure;
use crate::utils::join_path;

const DISCORD_TIMEOUT_SECS: u64 = 30;

/// Rate-limited replies waited out per message before giving up.
const MAX_RATE_LIMIT_RETRIES: u32 = 5;

/// Used when a 429 carries no usable `retry_after`.
const DEFAULT_RETRY_AFTER_SECS: f64 = 1.0;

/// Upper bound on a single rate-limit wait.
const MAX_RETRY_AFTER_SECS: f64 = 60.0;

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

/// Body of a `429 Too Many Requests` reply.
#[derive(Deserialize)]
struct RateLimited {
    retry_after: f64,
}

/// How long Discord asks us to wait before retrying.
///
/// Prefers the body's fractional `retry_after`, then the `Retry-After` header.
async fn retry_after(response: Response) -> Duration {
    let header = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok());
    let body = response.json::<RateLimited>().await.ok().map(|b| b.retry_after);

    let secs = body
        .or(header)
        .filter(|s| s.is_finite())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
        .clamp(0.0, MAX_RETRY_AFTER_SECS);
    Duration::from_secs_f64(secs)
}

/// Opens bot sessions against a single Discord channel.
pub struct DiscordTransport {
    config: DiscordConfig,
    user_agent: String,
}

impl DiscordTransport {
    pub fn new(config: DiscordConfig, user_agent: impl Into<String>) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
        }
    }

    fn build_client(&self) -> Result<Client> {
        let mut token = HeaderValue::from_str(&format!("Bot {}", self.config.token))
            .map_err(|e| AppError::session(format!("invalid bot token: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        let client = Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(DISCORD_TIMEOUT_SECS))
            .build()?;
        Ok(client)
    }
}

#[async_trait]
impl NotificationTransport for DiscordTransport {
    async fn open_session(&self) -> Result<Box<dyn NotificationSession>> {
        let client = self
            .build_client()
            .map_err(|e| AppError::session(format!("failed to create discord session: {e}")))?;

        let me = join_path(&self.config.api_base, &["users", "@me"]).map_err(AppError::session)?;
        let response = client
            .get(me)
            .send()
            .await
            .map_err(|e| AppError::session(format!("failed to open discord session: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::session(format!(
                "failed to open discord session: {}",
                describe_failure(response).await
            )));
        }

        let messages_url = join_path(
            &self.config.api_base,
            &["channels", self.config.channel_id.as_str(), "messages"],
        )
        .map_err(AppError::session)?;
        log::info!("Discord session opened for channel {}", self.config.channel_id);

        Ok(Box::new(DiscordSession {
            client,
            messages_url,
        }))
    }
}

/// Authenticated session posting to one channel.
struct DiscordSession {
    client: Client,
    messages_url: Url,
}

#[async_trait]
impl NotificationSession for DiscordSession {
    async fn send(&mut self, block: &str) -> Result<()> {
        let mut rate_limited = 0;
        loop {
            let response = self
                .client
                .post(self.messages_url.clone())
                .json(&CreateMessage { content: block })
                .send()
                .await
                .map_err(|e| {
                    AppError::delivery(format!(
                        "failed to send discord message, message: '{block}', err: '{e}'"
                    ))
                })?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            if status == StatusCode::TOO_MANY_REQUESTS && rate_limited < MAX_RATE_LIMIT_RETRIES {
                rate_limited += 1;
                let wait = retry_after(response).await;
                log::warn!(
                    "Discord rate limited ({}/{}), retrying in {:?}",
                    rate_limited,
                    MAX_RATE_LIMIT_RETRIES,
                    wait
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            return Err(AppError::delivery(format!(
                "failed to send discord message, message: '{}', err: '{}'",
                block,
                describe_failure(response).await
            )));
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        log::debug!("Discord session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::{Reply, TestServer};

    async fn open(server: &TestServer) -> Box<dyn NotificationSession> {
        let transport = DiscordTransport::new(
            DiscordConfig {
                api_base: server.base_url.clone(),
                channel_id: "42".to_string(),
                token: "secret".to_string(),
            },
            "notifier-test",
        );
        transport.open_session().await.unwrap()
    }

    #[tokio::test]
    async fn test_send_waits_out_rate_limit() {
        let server = TestServer::start(vec![
            Reply::json(200, r#"{"id":"1"}"#),
            Reply::json(429, r#"{"message":"You are being rate limited.","retry_after":0.01,"global":false}"#),
            Reply::json(200, r#"{"id":"2"}"#),
        ])
        .await;

        let mut session = open(&server).await;
        session.send("hello").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].starts_with("GET /users/@me "));
        assert!(requests[1].starts_with("POST /channels/42/messages "));
        assert!(requests[2].starts_with("POST /channels/42/messages "));
    }

    #[tokio::test]
    async fn test_rate_limit_header_is_honoured() {
        let server = TestServer::start(vec![
            Reply::json(200, r#"{"id":"1"}"#),
            Reply::json(429, "{}").with_header("Retry-After", "0"),
            Reply::json(200, r#"{"id":"2"}"#),
        ])
        .await;

        let mut session = open(&server).await;
        session.send("hello").await.unwrap();
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_is_delivery_error() {
        let server = TestServer::start(vec![
            Reply::json(200, r#"{"id":"1"}"#),
            Reply::json(429, r#"{"retry_after":0.0}"#),
        ])
        .await;

        let mut session = open(&server).await;
        let err = session.send("hello").await.unwrap_err();

        assert!(matches!(err, AppError::Delivery(_)));
        // token check plus the first attempt plus every retry
        assert_eq!(server.requests().len(), 2 + MAX_RATE_LIMIT_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_rejected_message_is_not_retried() {
        let server = TestServer::start(vec![
            Reply::json(200, r#"{"id":"1"}"#),
            Reply::json(400, r#"{"message":"Cannot send an empty message"}"#),
        ])
        .await;

        let mut session = open(&server).await;
        let err = session.send("").await.unwrap_err();

        assert!(matches!(err, AppError::Delivery(_)));
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_token_fails_session_open() {
        let server = TestServer::start(vec![Reply::json(401, r#"{"message":"401: Unauthorized"}"#)]).await;
        let transport = DiscordTransport::new(
            DiscordConfig {
                api_base: server.base_url.clone(),
                channel_id: "42".to_string(),
                token: "wrong".to_string(),
            },
            "notifier-test",
        );

        let err = transport.open_session().await.err().unwrap();
        assert!(matches!(err, AppError::Session(_)));
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let transport = DiscordTransport::new(
            DiscordConfig {
                token: "bad\ntoken".to_string(),
                ..DiscordConfig::default()
            },
            "notifier-test",
        );
        assert!(matches!(transport.build_client(), Err(AppError::Session(_))));
    }

    #[test]
    fn test_message_body() {
        let json = serde_json::to_string(&CreateMessage { content: "hi" }).unwrap();
        assert_eq!(json, r#"{"content":"hi"}"#);
    }
}
