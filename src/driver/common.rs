//! Common utilities shared by the navigator, detector and suites
//!
//! Polling on top of [`PageDriver::sleep`] and small text helpers.

use super::traits::{PageDriver, Selector};
use anyhow::Result;
use std::future::Future;

// ============================================================================
// Polling Utilities
// ============================================================================

/// Attempt-bounded polling configuration
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval_ms: 5000,
        }
    }
}

/// Poll `check_fn` after each interval until it yields a value
///
/// Sleeps through the page driver so every wait is a suspension point on the
/// caller's task. Returns `None` once `max_attempts` checks came back empty.
pub async fn poll_page<P, F, Fut, T>(page: &P, config: PollConfig, mut check_fn: F) -> Option<T>
where
    P: PageDriver + ?Sized,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 0..config.max_attempts {
        page.sleep(config.interval_ms).await;
        if let Some(value) = check_fn(attempt).await {
            return Some(value);
        }
    }
    None
}

/// Return the first candidate selector that resolves on the page
///
/// Lookup errors count as "not present".
pub async fn first_present<P>(page: &P, candidates: &[Selector]) -> Option<Selector>
where
    P: PageDriver + ?Sized,
{
    for candidate in candidates {
        match page.exists(candidate).await {
            Ok(true) => return Some(candidate.clone()),
            Ok(false) => {}
            Err(e) => log::debug!("Lookup of {} failed: {:#}", candidate, e),
        }
    }
    None
}

/// Full visible text of the document body
pub async fn body_inner_text<P>(page: &P) -> Result<String>
where
    P: PageDriver + ?Sized,
{
    let value = page
        .evaluate("() => document.body.innerText", serde_json::Value::Null)
        .await?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

// ============================================================================
// Text Utilities
// ============================================================================

/// Whether `text` contains any of the markers (case-sensitive)
pub fn contains_any(text: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| !m.is_empty() && text.contains(m.as_str()))
}

/// First `max_chars` characters of `text`, never splitting a code point
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Replace characters that are unsafe in file names
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::ScriptedPage;

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo wörld", 4), "héll");
        assert_eq!(preview("short", 300), "short");
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn test_contains_any() {
        let markers = vec!["is typing".to_string(), "is thinking".to_string()];
        assert!(contains_any("Atlas is thinking...", &markers));
        assert!(!contains_any("Atlas replied", &markers));
        assert!(!contains_any("anything", &[String::new()]));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Role: QA Engineer"), "Role__QA_Engineer");
    }

    #[tokio::test]
    async fn test_poll_page_stops_on_first_hit() {
        let page = ScriptedPage::new();
        let config = PollConfig {
            max_attempts: 5,
            interval_ms: 100,
        };
        let hit = poll_page(&page, config, |attempt| async move {
            (attempt == 2).then_some(attempt)
        })
        .await;
        assert_eq!(hit, Some(2));
        assert_eq!(page.slept_ms(), 300);
    }

    #[tokio::test]
    async fn test_poll_page_exhausts_budget() {
        let page = ScriptedPage::new();
        let config = PollConfig {
            max_attempts: 4,
            interval_ms: 250,
        };
        let hit: Option<()> = poll_page(&page, config, |_| async { None }).await;
        assert!(hit.is_none());
        assert_eq!(page.slept_ms(), 1000);
    }

    #[tokio::test]
    async fn test_first_present_respects_priority() {
        let page = ScriptedPage::new()
            .with_element("[contenteditable=\"true\"]")
            .with_element("input[type=\"text\"]");
        let candidates = vec![
            Selector::css("textarea"),
            Selector::css("[contenteditable=\"true\"]"),
            Selector::css("input[type=\"text\"]"),
        ];
        let found = first_present(&page, &candidates).await;
        assert_eq!(found, Some(Selector::css("[contenteditable=\"true\"]")));
    }
}
