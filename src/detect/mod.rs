//! Asynchronous response detection
//!
//! The chat surface exposes no completion event, so a reply is inferred by
//! sampling the page body on a fixed cadence: a reply is accepted once no
//! busy marker is visible and enough new text has appeared. Exhausting the
//! attempt budget is a soft timeout that returns the best delta seen.

use crate::driver::common::{body_inner_text, contains_any, poll_page, first_present, PollConfig};
use crate::driver::{PageDriver, Selector};
use crate::utils::config::{DetectorConfig, GreetingConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Chat input candidates, in priority order
pub fn chat_input_candidates() -> Vec<Selector> {
    vec![
        Selector::css("textarea"),
        Selector::css("[contenteditable=\"true\"]"),
        Selector::css("input[type=\"text\"]"),
    ]
}

/// Send control candidates, in priority order
pub fn send_candidates() -> Vec<Selector> {
    vec![
        Selector::css("button[type=\"submit\"]"),
        Selector::button("Send"),
        Selector::css("[class*=\"send\"]"),
    ]
}

const SCROLL_TO_BOTTOM: &str = "() => window.scrollTo(0, document.body.scrollHeight)";

/// How previously-known content is removed from a fresh sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeltaStrategy {
    /// Drop the first literal occurrence of the pre-submission text
    #[default]
    RemovePrior,
    /// Keep everything after the last occurrence of the prompt
    AfterLastPrompt,
}

/// Compute the text that appeared since `before`
///
/// With `RemovePrior` the first literal occurrence of the prior text is
/// dropped. In both strategies an echo of the prompt is then cut away by
/// keeping only what follows its last occurrence. If neither anchor is
/// found the whole sample is returned.
pub fn extract_delta(before: &str, now: &str, prompt: &str, strategy: DeltaStrategy) -> String {
    let remainder = match strategy {
        DeltaStrategy::RemovePrior if !before.is_empty() && now.contains(before) => {
            now.replacen(before, "", 1)
        }
        _ => now.to_string(),
    };
    let after_echo = if prompt.is_empty() {
        None
    } else {
        remainder.rfind(prompt).map(|idx| &remainder[idx + prompt.len()..])
    };
    after_echo.unwrap_or(remainder.as_str()).trim().to_string()
}

/// Outcome of waiting for a reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedResponse {
    pub text: String,
    /// Samples taken before returning
    pub attempts: u32,
    /// True when the budget ran out without an accepted reply
    pub timed_out: bool,
}

pub struct ResponseDetector<'a, P: PageDriver + ?Sized> {
    page: &'a P,
    config: &'a DetectorConfig,
}

impl<'a, P: PageDriver + ?Sized> ResponseDetector<'a, P> {
    pub fn new(page: &'a P, config: &'a DetectorConfig) -> Self {
        Self { page, config }
    }

    /// Submit `prompt` and wait for the reply
    ///
    /// Returns within `max_attempts * poll_interval_ms` of submission even if
    /// the page never settles. Fails only when no chat input can be found or
    /// the page stops answering.
    pub async fn await_response(&self, prompt: &str) -> Result<DetectedResponse> {
        let before = self.sample().await?;

        let input = self.locate_input().await?;
        self.page
            .fill(&input, prompt)
            .await
            .with_context(|| format!("Failed to type prompt into {}", input))?;
        self.send(&input).await?;

        let mut last_delta = String::new();
        for attempt in 0..self.config.max_attempts {
            self.page.sleep(self.config.poll_interval_ms).await;
            let now = self.sample().await?;

            let busy = contains_any(&now, &self.config.busy_markers);
            if busy && attempt < self.config.late_cutoff {
                log::debug!("Attempt {}: responder still busy", attempt + 1);
                continue;
            }

            last_delta = extract_delta(&before, &now, prompt, self.config.delta_strategy);
            if !busy && last_delta.chars().count() > self.config.min_delta_chars {
                log::debug!(
                    "Reply accepted after {} attempt(s), {} chars",
                    attempt + 1,
                    last_delta.chars().count()
                );
                return Ok(DetectedResponse {
                    text: last_delta,
                    attempts: attempt + 1,
                    timed_out: false,
                });
            }
        }

        log::warn!(
            "No stable reply after {} attempts; keeping {} chars",
            self.config.max_attempts,
            last_delta.chars().count()
        );
        Ok(DetectedResponse {
            text: last_delta,
            attempts: self.config.max_attempts,
            timed_out: true,
        })
    }

    async fn sample(&self) -> Result<String> {
        body_inner_text(self.page)
            .await
            .context("Failed to read page text")
    }

    /// First resolving chat input; scrolls to the bottom once before giving up
    async fn locate_input(&self) -> Result<Selector> {
        let candidates = chat_input_candidates();
        if let Some(found) = first_present(self.page, &candidates).await {
            return Ok(found);
        }

        self.page
            .evaluate(SCROLL_TO_BOTTOM, serde_json::Value::Null)
            .await
            .context("Failed to scroll chat into view")?;
        self.page.sleep(self.config.reveal_settle_ms).await;

        let found = first_present(self.page, &candidates).await;
        found.ok_or_else(|| anyhow::anyhow!("Chat input not found ({})", Selector::AnyOf(candidates)))
    }

    async fn send(&self, input: &Selector) -> Result<()> {
        match first_present(self.page, &send_candidates()).await {
            Some(button) => self
                .page
                .click(&button)
                .await
                .with_context(|| format!("Failed to click {}", button)),
            None => self
                .page
                .press(input, "Enter")
                .await
                .context("Failed to submit prompt with Enter"),
        }
    }
}

/// Wait for the assistant's opening message
///
/// Returns the body text once any marker shows up, or an empty string when
/// the budget runs out.
pub async fn await_greeting<P>(page: &P, config: &GreetingConfig) -> String
where
    P: PageDriver + ?Sized,
{
    let poll = PollConfig {
        max_attempts: config.max_attempts,
        interval_ms: config.poll_interval_ms,
    };
    let body = Selector::css("body");
    poll_page(page, poll, |attempt| {
        let body = body.clone();
        async move {
            match page.read_text(&body).await {
                Ok(text) if contains_any(&text, &config.markers) => Some(text),
                Ok(_) => None,
                Err(e) => {
                    log::debug!("Greeting poll {} failed: {:#}", attempt + 1, e);
                    None
                }
            }
        }
    })
    .await
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{Call, ScriptedPage};

    const PROMPT: &str = "Draft a professional email to a client named John.";
    const BEFORE: &str = "Atlas\nHi, I'm Atlas. How can I help?";

    fn detector_config() -> DetectorConfig {
        DetectorConfig::default()
    }

    fn answer() -> String {
        format!(
            "{BEFORE}\n{PROMPT}\nSubject: Project update\nDear John, delivery moves by one week."
        )
    }

    #[test]
    fn test_delta_removes_prior_text() {
        let delta = extract_delta(
            "Hello",
            "HelloWorld, here is your answer.",
            "",
            DeltaStrategy::RemovePrior,
        );
        assert_eq!(delta, "World, here is your answer.");
    }

    #[test]
    fn test_delta_drops_prompt_echo_after_prior_text() {
        let now = format!("{BEFORE}\n{PROMPT}\nDear John, the delivery slips by a week.");
        let delta = extract_delta(BEFORE, &now, PROMPT, DeltaStrategy::RemovePrior);
        assert_eq!(delta, "Dear John, the delivery slips by a week.");
    }

    #[test]
    fn test_delta_uses_last_prompt_echo() {
        let now = "Schedule it\nSure\nSchedule it\nDone: booked for Tuesday 2pm";
        let delta = extract_delta("", now, "Schedule it", DeltaStrategy::AfterLastPrompt);
        assert_eq!(delta, "Done: booked for Tuesday 2pm");
    }

    #[test]
    fn test_delta_falls_back_when_prior_text_changed() {
        let now = "Header (1 unread)\nSchedule it\nBooked.";
        let delta = extract_delta("Old header", " New header ", "", DeltaStrategy::RemovePrior);
        assert_eq!(delta, "New header");
        let delta = extract_delta("Header (0 unread)", now, "Schedule it", DeltaStrategy::RemovePrior);
        assert_eq!(delta, "Booked.");
    }

    #[tokio::test]
    async fn test_waits_out_busy_marker_then_accepts() {
        let config = detector_config();
        let page = ScriptedPage::new()
            .with_element("textarea")
            .with_frames([
                BEFORE.to_string(),
                format!("{BEFORE}\n{PROMPT}\nAtlas is typing"),
                answer(),
            ]);

        let reply = ResponseDetector::new(&page, &config)
            .await_response(PROMPT)
            .await
            .unwrap();

        assert!(!reply.timed_out);
        assert_eq!(reply.attempts, 2);
        assert!(reply.text.ends_with("Dear John, delivery moves by one week."));
        assert_eq!(page.slept_ms(), 2 * config.poll_interval_ms);
        assert_eq!(page.fills(), vec![("textarea".to_string(), PROMPT.to_string())]);
        assert!(page
            .calls()
            .contains(&Call::Press("textarea".to_string(), "Enter".to_string())));
    }

    #[tokio::test]
    async fn test_clicks_send_control_when_present() {
        let config = detector_config();
        let page = ScriptedPage::new()
            .with_element("[contenteditable=\"true\"]")
            .with_element(r#"button:has-text("Send")"#)
            .with_frames([BEFORE.to_string(), answer()]);

        ResponseDetector::new(&page, &config)
            .await_response(PROMPT)
            .await
            .unwrap();

        assert_eq!(page.clicks(), vec![r#"button:has-text("Send")"#.to_string()]);
        assert!(!page.calls().iter().any(|c| matches!(c, Call::Press(..))));
    }

    #[tokio::test]
    async fn test_never_settling_page_is_bounded() {
        let config = detector_config();
        let page = ScriptedPage::new().with_element("textarea").with_frames([
            BEFORE.to_string(),
            format!("{BEFORE}\n{PROMPT}\nAtlas is thinking about a long answer"),
        ]);

        let reply = ResponseDetector::new(&page, &config)
            .await_response(PROMPT)
            .await
            .unwrap();

        assert!(reply.timed_out);
        assert_eq!(reply.attempts, config.max_attempts);
        assert_eq!(
            page.slept_ms(),
            config.max_attempts as u64 * config.poll_interval_ms
        );
        // past the late cutoff the delta is still computed
        assert!(reply.text.contains("is thinking"));
    }

    #[tokio::test]
    async fn test_short_delta_is_not_accepted() {
        let config = DetectorConfig {
            max_attempts: 3,
            ..detector_config()
        };
        let page = ScriptedPage::new()
            .with_element("textarea")
            .with_frames([BEFORE.to_string(), format!("{BEFORE}\nOk.")]);

        let reply = ResponseDetector::new(&page, &config)
            .await_response(PROMPT)
            .await
            .unwrap();

        assert!(reply.timed_out);
        assert_eq!(reply.text, "Ok.");
    }

    #[tokio::test]
    async fn test_configured_strategy_reaches_detector() {
        let earlier = format!("{BEFORE}\n{PROMPT}\nDear John, an earlier draft.");
        let now = format!("{earlier}\nDear John, the delivery slips by one week.");
        let page = || {
            ScriptedPage::new()
                .with_element("textarea")
                .with_frames([earlier.clone(), now.clone()])
        };

        let remove_prior = detector_config();
        let first = page();
        let reply = ResponseDetector::new(&first, &remove_prior)
            .await_response(PROMPT)
            .await
            .unwrap();
        assert_eq!(reply.text, "Dear John, the delivery slips by one week.");

        let after_prompt = DetectorConfig {
            delta_strategy: DeltaStrategy::AfterLastPrompt,
            ..detector_config()
        };
        let second = page();
        let reply = ResponseDetector::new(&second, &after_prompt)
            .await_response(PROMPT)
            .await
            .unwrap();
        assert!(reply.text.starts_with("Dear John, an earlier draft."));
    }

    #[tokio::test]
    async fn test_missing_input_after_scroll() {
        let config = detector_config();
        let page = ScriptedPage::new().with_frames([BEFORE]);

        let err = ResponseDetector::new(&page, &config)
            .await_response(PROMPT)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Chat input not found"));
        assert_eq!(page.slept_ms(), config.reveal_settle_ms);
        assert!(page.fills().is_empty());
    }

    #[tokio::test]
    async fn test_greeting_found() {
        let config = GreetingConfig::default();
        let page = ScriptedPage::new().with_frames(["Loading", "Loading", "Hey, I'm Nova!"]);
        let greeting = await_greeting(&page, &config).await;
        assert_eq!(greeting, "Hey, I'm Nova!");
        assert_eq!(page.slept_ms(), 3 * config.poll_interval_ms);
    }

    #[tokio::test]
    async fn test_greeting_exhausts() {
        let config = GreetingConfig {
            max_attempts: 2,
            ..GreetingConfig::default()
        };
        let page = ScriptedPage::new().with_frames(["Loading"]);
        assert_eq!(await_greeting(&page, &config).await, "");
        assert_eq!(page.slept_ms(), 2 * config.poll_interval_ms);
    }
}
