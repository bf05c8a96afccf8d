use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Element selector for page elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Raw CSS selector (may carry Playwright pseudo-classes such as `:has-text`)
    Css(String),
    /// Element whose visible text matches
    Text(String),
    /// Button containing the given text
    ButtonText(String),
    /// First element matching any of the candidates, in document order
    AnyOf(Vec<Selector>),
}

impl Selector {
    pub fn css(css: impl Into<String>) -> Self {
        Selector::Css(css.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Selector::Text(text.into())
    }

    pub fn button(text: impl Into<String>) -> Self {
        Selector::ButtonText(text.into())
    }

    /// Convert to a Playwright selector string
    pub fn to_playwright(&self) -> String {
        match self {
            Selector::Css(css) => css.clone(),
            Selector::Text(text) => format!("text={}", text),
            Selector::ButtonText(text) => format!("button:has-text(\"{}\")", text),
            Selector::AnyOf(candidates) => candidates
                .iter()
                .map(|c| match c {
                    // `text=` engine can't be part of a selector list
                    Selector::Text(t) => format!(":text(\"{}\")", t),
                    other => other.to_playwright(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_playwright())
    }
}

/// When a navigation is considered done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    #[default]
    DomContentLoaded,
    Load,
    NetworkIdle,
}

/// Page-level driver interface
///
/// The primitive set the navigator, detector and suites are written against.
/// Any backend that can drive one page of a remote browser can implement it;
/// the production implementation is [`crate::driver::web::WebPage`].
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL
    ///
    /// # Arguments
    /// * `url` - Absolute URL
    /// * `policy` - Load state to wait for
    /// * `timeout_ms` - Navigation timeout
    async fn navigate(&self, url: &str, policy: LoadPolicy, timeout_ms: u64) -> Result<()>;

    /// Fill an input field, replacing its value
    async fn fill(&self, selector: &Selector, value: &str) -> Result<()>;

    /// Click the first element matching the selector
    async fn click(&self, selector: &Selector) -> Result<()>;

    /// Click the n-th (0-based) element matching the selector
    async fn click_nth(&self, selector: &Selector, index: usize) -> Result<()>;

    /// Press a key while the matched element has focus
    async fn press(&self, selector: &Selector, key: &str) -> Result<()>;

    /// Check whether at least one element matches
    async fn exists(&self, selector: &Selector) -> Result<bool>;

    /// Text content of the first matching element, or empty string if not found
    async fn read_text(&self, selector: &Selector) -> Result<String>;

    /// Text content of every matching element, in document order
    async fn read_all_texts(&self, selector: &Selector) -> Result<Vec<String>>;

    /// Attribute value of the first matching element
    async fn attribute(&self, selector: &Selector, name: &str) -> Result<Option<String>>;

    /// Evaluate a script in the page with a JSON argument
    async fn evaluate(&self, script: &str, arg: serde_json::Value) -> Result<serde_json::Value>;

    /// Evaluate `el => ...` against the first matching element
    ///
    /// # Returns
    /// `None` when nothing matches
    async fn evaluate_on(&self, selector: &Selector, script: &str)
        -> Result<Option<serde_json::Value>>;

    /// Current page URL
    async fn current_url(&self) -> Result<String>;

    /// Save a screenshot to the given path
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Suspend for the given number of milliseconds
    async fn sleep(&self, ms: u64);

    /// Detach from the page and its browser
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Opens a page driver for a remote browser endpoint
#[async_trait]
pub trait PageConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn PageDriver>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_to_playwright() {
        assert_eq!(Selector::text("Founder").to_playwright(), "text=Founder");
        assert_eq!(
            Selector::button("Continue").to_playwright(),
            r#"button:has-text("Continue")"#
        );
        let any = Selector::AnyOf(vec![
            Selector::css("textarea"),
            Selector::css("[contenteditable=\"true\"]"),
            Selector::text("Send"),
        ]);
        assert_eq!(
            any.to_playwright(),
            r#"textarea, [contenteditable="true"], :text("Send")"#
        );
    }
}
