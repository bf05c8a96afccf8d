//! Onboarding flow navigator
//!
//! A linear state machine over the onboarding screens. Every primitive
//! action is followed by a fixed settle period; missing elements are logged
//! and skipped so the caller's own checks decide whether a screen was
//! actually reached.

pub mod locators;

use crate::driver::common::first_present;
use crate::driver::{LoadPolicy, PageDriver, Selector};
use crate::utils::config::{Config, IdentityConfig};
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Onboarding checkpoints, in the only order they can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowState {
    Start,
    CredentialsEntered,
    SecretEntered,
    WorkspaceNamed,
    RoleChosen,
    AssistantChosen,
    Personalized,
    Conversational,
}

impl FlowState {
    pub const ALL: [FlowState; 8] = [
        FlowState::Start,
        FlowState::CredentialsEntered,
        FlowState::SecretEntered,
        FlowState::WorkspaceNamed,
        FlowState::RoleChosen,
        FlowState::AssistantChosen,
        FlowState::Personalized,
        FlowState::Conversational,
    ];

    pub fn position(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<FlowState> {
        Self::ALL.get(self.position() + 1).copied()
    }

    /// One state back, saturating at `Start`
    pub fn previous(self) -> FlowState {
        self.position()
            .checked_sub(1)
            .map(|i| Self::ALL[i])
            .unwrap_or(FlowState::Start)
    }

    pub fn name(self) -> &'static str {
        match self {
            FlowState::Start => "start",
            FlowState::CredentialsEntered => "credentials-entered",
            FlowState::SecretEntered => "secret-entered",
            FlowState::WorkspaceNamed => "workspace-named",
            FlowState::RoleChosen => "role-chosen",
            FlowState::AssistantChosen => "assistant-chosen",
            FlowState::Personalized => "personalized",
            FlowState::Conversational => "conversational",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlowState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown checkpoint: {}", s))
    }
}

/// Caller-supplied replacements for generated identity fields
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub email: Option<String>,
    pub password: Option<String>,
    pub workspace_name: Option<String>,
    pub user_role: Option<String>,
    pub persona: Option<String>,
    /// Display name typed on the personalization screen
    pub assistant_name: Option<String>,
}

/// Concrete values used while walking the flow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub workspace_name: String,
    pub user_role: String,
    pub persona: String,
    pub assistant_name: Option<String>,
}

impl Identity {
    /// Fill every missing field with a fresh, run-unique default
    pub fn resolve(overrides: Overrides, defaults: &IdentityConfig) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self {
            email: overrides.email.unwrap_or_else(|| {
                format!(
                    "test-{}-{}@{}",
                    millis,
                    random_suffix(4),
                    defaults.email_domain
                )
            }),
            password: overrides
                .password
                .unwrap_or_else(|| defaults.password.clone()),
            workspace_name: overrides
                .workspace_name
                .unwrap_or_else(|| format!("{}-{}", defaults.workspace_prefix, millis)),
            user_role: overrides
                .user_role
                .unwrap_or_else(|| defaults.user_role.clone()),
            persona: overrides
                .persona
                .unwrap_or_else(|| defaults.assistant_role.clone()),
            assistant_name: overrides.assistant_name,
        }
    }
}

fn random_suffix(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Pick a display name for the assistant at random
pub fn pick_assistant_name(names: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let idx = rand::thread_rng().gen_range(0..names.len());
    Some(names[idx].clone())
}

/// Where to stop and with which identity
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub target: FlowState,
    pub overrides: Overrides,
}

impl NavigationRequest {
    pub fn to(target: FlowState) -> Self {
        Self {
            target,
            overrides: Overrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Drives one page through the onboarding screens
pub struct FlowNavigator<'a, P: PageDriver + ?Sized> {
    page: &'a P,
    config: &'a Config,
    identity: Identity,
    state: FlowState,
    landed: bool,
    history: Vec<FlowState>,
}

impl<'a, P: PageDriver + ?Sized> FlowNavigator<'a, P> {
    pub fn new(page: &'a P, config: &'a Config, overrides: Overrides) -> Self {
        Self {
            page,
            config,
            identity: Identity::resolve(overrides, &config.identity),
            state: FlowState::Start,
            landed: false,
            history: vec![FlowState::Start],
        }
    }

    /// Walk a fresh page up to the requested checkpoint
    pub async fn run(page: &'a P, config: &'a Config, request: NavigationRequest) -> Result<Self> {
        let mut navigator = Self::new(page, config, request.overrides);
        navigator.advance_to(request.target).await?;
        Ok(navigator)
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[FlowState] {
        &self.history
    }

    /// Load the landing page once
    pub async fn open_landing(&mut self) -> Result<()> {
        if self.landed {
            return Ok(());
        }
        self.page
            .navigate(
                &self.config.base_url,
                LoadPolicy::DomContentLoaded,
                self.config.navigation_timeout_ms,
            )
            .await?;
        self.page.sleep(self.config.settle.after_load_ms).await;
        self.landed = true;
        Ok(())
    }

    /// Advance one checkpoint
    pub async fn advance(&mut self) -> Result<FlowState> {
        let Some(next) = self.state.next() else {
            return Ok(self.state);
        };
        log::info!("Flow: {} -> {}", self.state, next);
        self.enter(next).await?;
        self.state = next;
        self.history.push(next);
        Ok(next)
    }

    /// Advance through every intermediate checkpoint up to `target`
    ///
    /// A target at or behind the current state is a no-op.
    pub async fn advance_to(&mut self, target: FlowState) -> Result<FlowState> {
        while self.state < target {
            self.advance().await?;
        }
        Ok(self.state)
    }

    /// Use the screen's Back control and step one checkpoint back
    pub async fn back(&mut self) -> Result<FlowState> {
        self.soft_click(&locators::back_control()).await;
        self.page.sleep(self.config.settle.after_back_ms).await;
        self.state = self.state.previous();
        self.history.push(self.state);
        Ok(self.state)
    }

    async fn enter(&mut self, state: FlowState) -> Result<()> {
        let config: &'a Config = self.config;
        let settle = &config.settle;
        match state {
            FlowState::Start => {}
            FlowState::CredentialsEntered => {
                self.open_landing().await?;
                let email = self.identity.email.clone();
                self.submit(&Selector::css(locators::EMAIL_INPUT), &email)
                    .await;
            }
            FlowState::SecretEntered => {
                let password = self.identity.password.clone();
                self.submit(&Selector::css(locators::PASSWORD_INPUT), &password)
                    .await;
            }
            FlowState::WorkspaceNamed => {
                let workspace = self.identity.workspace_name.clone();
                self.submit(&Selector::css(locators::TEXT_INPUT), &workspace)
                    .await;
            }
            FlowState::RoleChosen => {
                self.soft_click(&Selector::text(self.identity.user_role.clone()))
                    .await;
                self.page.sleep(settle.after_pick_ms).await;
                self.soft_click(&locators::continue_button()).await;
                self.page.sleep(settle.after_step_ms).await;
            }
            FlowState::AssistantChosen => {
                self.pick_persona().await;
                self.page.sleep(settle.after_pick_ms).await;
                match first_present(self.page, &locators::employee_continue()).await {
                    Some(control) => self.soft_click(&control).await,
                    None => log::warn!("No continue control after persona selection"),
                }
                self.page.sleep(settle.after_step_ms).await;
            }
            FlowState::Personalized => {
                if let Some(name) = self.identity.assistant_name.clone() {
                    self.soft_fill(&Selector::css(locators::TEXT_INPUT), &name)
                        .await;
                    self.page.sleep(settle.after_pick_ms).await;
                }
            }
            FlowState::Conversational => {
                match first_present(self.page, &locators::meet_assistant()).await {
                    Some(control) => self.soft_click(&control).await,
                    None => log::warn!("No control to open the conversation"),
                }
                self.page.sleep(settle.after_confirm_ms).await;

                if let Some(control) = first_present(self.page, &locators::activation()).await {
                    log::info!("Activation prompt found, accepting via {}", control);
                    self.soft_click(&control).await;
                    self.page.sleep(settle.after_activation_ms).await;
                }
            }
        }
        Ok(())
    }

    /// Fill, press Continue, settle
    async fn submit(&self, field: &Selector, value: &str) {
        self.soft_fill(field, value).await;
        self.soft_click(&locators::continue_button()).await;
        self.page.sleep(self.config.settle.after_step_ms).await;
    }

    async fn pick_persona(&self) {
        let card = Selector::css(locators::EMPLOYEE_CARD);
        let texts = match self.page.read_all_texts(&card).await {
            Ok(texts) => texts,
            Err(e) => {
                log::warn!("Could not read persona cards: {:#}", e);
                return;
            }
        };
        match texts
            .iter()
            .position(|t| t.contains(self.identity.persona.as_str()))
        {
            Some(idx) => {
                if let Err(e) = self.page.click_nth(&card, idx).await {
                    log::warn!("Click on persona card {} failed: {:#}", idx, e);
                }
            }
            None => log::warn!("Persona '{}' not found among cards", self.identity.persona),
        }
    }

    async fn soft_fill(&self, selector: &Selector, value: &str) {
        if let Err(e) = self.page.fill(selector, value).await {
            log::warn!("Fill {} skipped: {:#}", selector, e);
        }
    }

    async fn soft_click(&self, selector: &Selector) {
        if let Err(e) = self.page.click(selector).await {
            log::warn!("Click {} skipped: {:#}", selector, e);
        }
    }
}
