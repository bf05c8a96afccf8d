use crate::detect::DeltaStrategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
///
/// Layered as defaults, then an optional YAML file, then environment
/// variables. CLI flags are applied on top by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Landing page of the application under test
    pub base_url: String,

    pub provider: ProviderConfig,

    pub identity: IdentityConfig,

    pub settle: SettleConfig,

    pub detector: DetectorConfig,

    pub greeting: GreetingConfig,

    /// Navigation timeout (ms)
    pub navigation_timeout_ms: u64,

    /// Responses at or below this length fail before keyword scoring
    pub min_response_chars: usize,

    /// Characters of the response kept in failure diagnostics
    pub preview_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://app.emika.ai".to_string(),
            provider: ProviderConfig::default(),
            identity: IdentityConfig::default(),
            settle: SettleConfig::default(),
            detector: DetectorConfig::default(),
            greeting: GreetingConfig::default(),
            navigation_timeout_ms: 30000,
            min_response_chars: 20,
            preview_chars: 200,
        }
    }
}

/// Remote session provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub api_base: String,
    /// Bearer credential; normally supplied through `SEAT_TOKEN`
    #[serde(skip_serializing)]
    pub seat_token: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.emika.ai/seat-skills/browserbase".to_string(),
            seat_token: None,
            request_timeout_ms: 30000,
        }
    }
}

/// Defaults for generated sign-up identities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityConfig {
    pub email_domain: String,
    pub password: String,
    pub workspace_prefix: String,
    pub user_role: String,
    pub assistant_role: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            email_domain: "emika-test.com".to_string(),
            password: "TestPass123!@#".to_string(),
            workspace_prefix: "TestWS".to_string(),
            user_role: "Founder".to_string(),
            assistant_role: "Executive Assistant".to_string(),
        }
    }
}

/// Settle periods (ms) applied after UI actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettleConfig {
    pub after_load_ms: u64,
    pub after_step_ms: u64,
    pub after_pick_ms: u64,
    pub after_back_ms: u64,
    pub after_confirm_ms: u64,
    pub after_activation_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            after_load_ms: 2000,
            after_step_ms: 3000,
            after_pick_ms: 500,
            after_back_ms: 2000,
            after_confirm_ms: 10000,
            after_activation_ms: 15000,
        }
    }
}

/// Response detection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
    /// Busy markers are ignored from this attempt on
    pub late_cutoff: u32,
    /// Delta must be longer than this to be accepted
    pub min_delta_chars: usize,
    pub busy_markers: Vec<String>,
    /// Pause after scrolling to reveal a hidden chat input
    pub reveal_settle_ms: u64,
    pub delta_strategy: DeltaStrategy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 24,
            poll_interval_ms: 5000,
            late_cutoff: 20,
            min_delta_chars: 30,
            busy_markers: vec!["is typing".to_string(), "is thinking".to_string()],
            reveal_settle_ms: 1000,
            delta_strategy: DeltaStrategy::RemovePrior,
        }
    }
}

/// Initial greeting wait
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GreetingConfig {
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
    pub markers: Vec<String>,
    /// Extra pause once the greeting showed up
    pub settle_ms: u64,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            poll_interval_ms: 5000,
            markers: ["I'm", "Hey", "Hello", "Welcome"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            settle_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration: defaults, optional YAML file, environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("Invalid config file {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("SEAT_TOKEN").filter(|t| !t.is_empty()) {
            self.provider.seat_token = Some(token);
        }
        if let Some(url) = lookup("CHATFLOW_BASE_URL") {
            self.base_url = url;
        }
        if let Some(url) = lookup("CHATFLOW_PROVIDER_URL") {
            self.provider.api_base = url;
        }
        if let Some(v) = lookup("CHATFLOW_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.detector.poll_interval_ms = v;
        }
        if let Some(v) = lookup("CHATFLOW_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.detector.max_attempts = v;
        }
    }
}
