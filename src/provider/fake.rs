//! In-memory provider used by unit tests

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::{ProvisionError, RemoteSession, SessionProvider};

#[derive(Default)]
pub struct CountingProvider {
    fail_create: bool,
    fail_destroy: bool,
    created: Mutex<u32>,
    destroyed: Mutex<Vec<String>>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn with_failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub fn created(&self) -> u32 {
        *self.created.lock().unwrap()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionProvider for CountingProvider {
    async fn create(&self, _purpose: &str) -> Result<RemoteSession> {
        if self.fail_create {
            return Err(ProvisionError::MissingConnectUrl {
                payload: r#"{"error":"quota"}"#.to_string(),
            }
            .into());
        }
        let mut created = self.created.lock().unwrap();
        *created += 1;
        Ok(RemoteSession {
            id: format!("session-{}", *created),
            connect_url: format!("ws://localhost:9222/session-{}", *created),
            created_at: chrono::Utc::now(),
        })
    }

    async fn destroy(&self, session_id: &str) -> Result<serde_json::Value> {
        self.destroyed.lock().unwrap().push(session_id.to_string());
        if self.fail_destroy {
            anyhow::bail!("provider unavailable");
        }
        Ok(serde_json::json!({ "ok": true }))
    }
}
