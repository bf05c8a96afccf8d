use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

use super::{ProvisionError, RemoteSession, SessionProvider};
use crate::utils::config::ProviderConfig;

const SEAT_TOKEN_HEADER: &str = "X-Seat-Token";

/// Session provider speaking the seat-skills HTTP API
pub struct HttpSessionProvider {
    client: reqwest::Client,
    api_base: String,
}

impl HttpSessionProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let token = config
            .seat_token
            .as_deref()
            .ok_or(ProvisionError::MissingCredential)?;

        let mut headers = HeaderMap::new();
        let mut token_value =
            HeaderValue::from_str(token).context("Seat token is not a valid header value")?;
        token_value.set_sensitive(true);
        headers.insert(SEAT_TOKEN_HEADER, token_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn read_json(response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProvisionError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        serde_json::from_str(&body).with_context(|| format!("Provider returned non-JSON: {}", body))
    }
}

/// Build a session from the provider's create payload
pub fn parse_session(payload: &serde_json::Value) -> Result<RemoteSession, ProvisionError> {
    let connect_url = payload
        .get("connect_url")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty());
    let id = payload.get("id").and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    match (connect_url, id) {
        (Some(url), Some(id)) => Ok(RemoteSession {
            id,
            connect_url: url.to_string(),
            created_at: chrono::Utc::now(),
        }),
        _ => Err(ProvisionError::MissingConnectUrl {
            payload: payload.to_string(),
        }),
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn create(&self, purpose: &str) -> Result<RemoteSession> {
        let response = self
            .client
            .post(format!("{}/sessions", self.api_base))
            .header(CONTENT_TYPE, "application/json")
            .json(&serde_json::json!({ "purpose": purpose }))
            .send()
            .await
            .context("Session create request failed")?;

        let payload = Self::read_json(response).await?;
        let session = parse_session(&payload)?;
        log::info!("Created remote session {} ({})", session.id, purpose);
        Ok(session)
    }

    async fn destroy(&self, session_id: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/sessions/{}/end", self.api_base, session_id))
            .send()
            .await
            .context("Session end request failed")?;

        let ack = Self::read_json(response).await?;
        log::info!("Ended remote session {}", session_id);
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_session() {
        let payload = json!({
            "id": "sess_123",
            "connect_url": "wss://connect.example.test/sess_123",
            "status": "RUNNING"
        });
        let session = parse_session(&payload).unwrap();
        assert_eq!(session.id, "sess_123");
        assert_eq!(session.connect_url, "wss://connect.example.test/sess_123");
    }

    #[test]
    fn test_missing_connect_url_carries_payload() {
        let payload = json!({ "error": "seat limit reached" });
        let err = parse_session(&payload).unwrap_err();
        match &err {
            ProvisionError::MissingConnectUrl { payload } => {
                assert!(payload.contains("seat limit reached"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Failed to create session:"));
    }

    #[test]
    fn test_empty_connect_url_is_rejected() {
        let payload = json!({ "id": "x", "connect_url": "" });
        assert!(parse_session(&payload).is_err());
    }

    #[test]
    fn test_requires_credential() {
        let config = ProviderConfig::default();
        let err = HttpSessionProvider::new(&config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::MissingCredential)
        ));
    }
}
