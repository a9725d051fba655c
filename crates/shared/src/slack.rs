use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::models::ChatMessage;

/// The chat channel notifications are posted to.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Up to `limit` most recent messages, newest first.
    async fn recent_messages(&self, limit: u32) -> Result<Vec<ChatMessage>>;

    async fn post_message(&self, text: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct PostResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client bound to a single channel.
pub struct SlackClient {
    client: Client,
    token: String,
    channel: String,
    api_base: String,
}

impl SlackClient {
    pub fn new(
        token: String,
        channel: String,
        api_base: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token,
            channel,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn api_error(method: &str, error: Option<String>) -> Error {
        Error::Messaging(format!(
            "{} returned error: {}",
            method,
            error.unwrap_or_else(|| "unknown_error".to_string())
        ))
    }
}

#[async_trait]
impl ChatChannel for SlackClient {
    async fn recent_messages(&self, limit: u32) -> Result<Vec<ChatMessage>> {
        let limit = limit.to_string();
        let url = Url::parse_with_params(
            &format!("{}/conversations.history", self.api_base),
            &[("channel", self.channel.as_str()), ("limit", limit.as_str())],
        )
        .map_err(|e| Error::Messaging(format!("invalid Slack API URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("conversations.history failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Messaging(format!(
                "conversations.history HTTP error: {status}"
            )));
        }

        let history: HistoryResponse = response
            .json()
            .await
            .map_err(|e| Error::Messaging(format!("malformed history response: {e}")))?;

        if !history.ok {
            return Err(Self::api_error("conversations.history", history.error));
        }

        Ok(history.messages)
    }

    async fn post_message(&self, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "channel": self.channel,
            "text": text,
        });

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("chat.postMessage failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Messaging(format!(
                "chat.postMessage HTTP error: {status}"
            )));
        }

        let posted: PostResponse = response
            .json()
            .await
            .map_err(|e| Error::Messaging(format!("malformed post response: {e}")))?;

        if !posted.ok {
            return Err(Self::api_error("chat.postMessage", posted.error));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SlackClient {
        SlackClient::new(
            "xoxb-test".to_string(),
            "C123".to_string(),
            server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_recent_messages_sends_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C123"))
            .and(query_param("limit", "1"))
            .and(header("authorization", "Bearer xoxb-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": [{ "type": "message", "text": "🔑 Title: *Old news*", "ts": "1.0" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = client_for(&server).recent_messages(1).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "🔑 Title: *Old news*");
    }

    #[tokio::test]
    async fn test_recent_messages_empty_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "messages": [] })),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server).recent_messages(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_messages_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "channel_not_found" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).recent_messages(1).await.unwrap_err();
        assert!(matches!(err, Error::Messaging(ref m) if m.contains("channel_not_found")));
    }

    #[tokio::test]
    async fn test_post_message_sends_channel_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_json(json!({ "channel": "C123", "text": "hello *world*" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .post_message("hello *world*")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_message_not_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "not_in_channel" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).post_message("hi").await.unwrap_err();
        assert!(matches!(err, Error::Messaging(ref m) if m.contains("not_in_channel")));
    }
}
