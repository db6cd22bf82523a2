//! Remote reasoning client
//!
//! Optional collaborator tried before the local deterministic core. Any
//! failure — connection error, non-success status, timeout, bad payload —
//! maps to `RemoteUnavailable` and the caller falls through to the local
//! responder; the error is never surfaced to the end user.

use std::time::Duration;

use serde_json::json;

use taxpilot_common::api::ChatResponse;
use taxpilot_common::error::{Error, Result};

const USER_AGENT: &str = concat!("TaxPilot/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a remote reasoning agent speaking the chat contract.
pub struct RemoteAgentClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RemoteAgentClient {
    /// Build a client with a hard request timeout; a hung remote must not
    /// stall the conversation.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::RemoteUnavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Ask the remote agent for a full chat response.
    pub async fn complete(&self, session_id: &str, message: &str) -> Result<ChatResponse> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "session_id": session_id,
                "message": message,
            }))
            .send()
            .await
            .map_err(|e| Error::RemoteUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::RemoteUnavailable(format!(
                "remote agent returned {}",
                response.status()
            )));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::RemoteUnavailable(format!("bad remote payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            RemoteAgentClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_remote_unavailable() {
        // Nothing listens on this port; the connection error must map to
        // RemoteUnavailable, not bubble up as a raw reqwest error.
        let client =
            RemoteAgentClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        let result = client.complete("s1", "hello").await;
        assert!(matches!(result, Err(Error::RemoteUnavailable(_))));
    }
}
