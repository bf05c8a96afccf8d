//! Remote browser session provisioning
//!
//! A provider hands out isolated browser environments reachable over CDP.
//! Sessions are single-owner: whoever creates one releases it, see
//! [`scope::with_session`].

#[cfg(test)]
pub mod fake;
pub mod http;
pub mod scope;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::HttpSessionProvider;
pub use scope::with_session;

/// A provisioned remote browser environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSession {
    pub id: String,
    /// CDP endpoint for the remote browser
    pub connect_url: String,
    pub created_at: DateTime<Utc>,
}

/// Provisioning failures callers may want to branch on
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Failed to create session: {payload}")]
    MissingConnectUrl { payload: String },

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("No provider credential configured (set SEAT_TOKEN)")]
    MissingCredential,
}

/// Remote session provider interface
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open a new isolated browser environment
    ///
    /// # Arguments
    /// * `purpose` - Free-form label shown in the provider's dashboard
    async fn create(&self, purpose: &str) -> Result<RemoteSession>;

    /// Release a session; returns the provider's acknowledgement payload
    async fn destroy(&self, session_id: &str) -> Result<serde_json::Value>;
}
