//! Page driver backed by Playwright
//!
//! Connects to a remote Chromium over CDP (the endpoint handed out by the
//! session provider) and drives the first page of its default context.

use anyhow::{Context, Result};
use async_trait::async_trait;
use playwright::api::{Browser, DocumentLoadState, Page};
use playwright::Playwright;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::driver::traits::{LoadPolicy, PageConnector, PageDriver, Selector};

/// One remote page driven through Playwright
pub struct WebPage {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    browser: Browser,
    page: Arc<Mutex<Page>>,
}

impl WebPage {
    /// Connect to a remote browser over CDP and attach to its first page
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        log::debug!("Connecting to remote browser over CDP");
        let browser = playwright
            .chromium()
            .connect_over_cdp_builder(endpoint)
            .connect_over_cdp()
            .await
            .context("Failed to connect to remote browser")?;

        // Remote sessions come with a context and a blank page already open
        let context = match browser.contexts()?.into_iter().next() {
            Some(ctx) => ctx,
            None => browser.context_builder().build().await?,
        };

        let page = match context.pages().unwrap_or_default().into_iter().next() {
            Some(p) => p,
            None => context.new_page().await?,
        };

        Ok(Self {
            playwright: Arc::new(playwright),
            browser,
            page: Arc::new(Mutex::new(page)),
        })
    }
}

/// Opens [`WebPage`]s for provisioned sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaywrightConnector;

#[async_trait]
impl PageConnector for PlaywrightConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(WebPage::connect(endpoint).await?))
    }
}

fn load_state(policy: LoadPolicy) -> DocumentLoadState {
    match policy {
        LoadPolicy::DomContentLoaded => DocumentLoadState::DomContentLoaded,
        LoadPolicy::Load => DocumentLoadState::Load,
        LoadPolicy::NetworkIdle => DocumentLoadState::NetworkIdle,
    }
}

#[async_trait]
impl PageDriver for WebPage {
    async fn navigate(&self, url: &str, policy: LoadPolicy, timeout_ms: u64) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .wait_until(load_state(policy))
            .timeout(timeout_ms as f64)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn fill(&self, selector: &Selector, value: &str) -> Result<()> {
        let page = self.page.lock().await;
        let sel = selector.to_playwright();
        page.fill_builder(&sel, value)
            .fill()
            .await
            .with_context(|| format!("Failed to fill: {}", sel))?;
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        let page = self.page.lock().await;
        let sel = selector.to_playwright();
        page.click_builder(&sel)
            .click()
            .await
            .with_context(|| format!("Failed to click: {}", sel))?;
        Ok(())
    }

    async fn click_nth(&self, selector: &Selector, index: usize) -> Result<()> {
        let page = self.page.lock().await;
        let sel = selector.to_playwright();
        let elements = page.query_selector_all(&sel).await?;
        match elements.get(index) {
            Some(el) => {
                el.click_builder().click().await?;
                Ok(())
            }
            None => anyhow::bail!("Element not found: {} at index {}", sel, index),
        }
    }

    async fn press(&self, selector: &Selector, key: &str) -> Result<()> {
        let page = self.page.lock().await;
        let sel = selector.to_playwright();
        page.click_builder(&sel).click().await?;
        page.keyboard.down(key).await?;
        page.keyboard.up(key).await?;
        Ok(())
    }

    async fn exists(&self, selector: &Selector) -> Result<bool> {
        let page = self.page.lock().await;
        let found = page.query_selector(&selector.to_playwright()).await?;
        Ok(found.is_some())
    }

    async fn read_text(&self, selector: &Selector) -> Result<String> {
        let page = self.page.lock().await;
        match page.query_selector(&selector.to_playwright()).await? {
            Some(el) => Ok(el.text_content().await?.unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    async fn read_all_texts(&self, selector: &Selector) -> Result<Vec<String>> {
        let page = self.page.lock().await;
        let elements = page.query_selector_all(&selector.to_playwright()).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for el in elements {
            texts.push(el.text_content().await?.unwrap_or_default());
        }
        Ok(texts)
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> Result<Option<String>> {
        let page = self.page.lock().await;
        match page.query_selector(&selector.to_playwright()).await? {
            Some(el) => Ok(el.get_attribute(name).await?),
            None => Ok(None),
        }
    }

    async fn evaluate(&self, script: &str, arg: serde_json::Value) -> Result<serde_json::Value> {
        let page = self.page.lock().await;
        let value = page
            .evaluate::<serde_json::Value, serde_json::Value>(script, arg)
            .await?;
        Ok(value)
    }

    async fn evaluate_on(
        &self,
        selector: &Selector,
        script: &str,
    ) -> Result<Option<serde_json::Value>> {
        let page = self.page.lock().await;
        let sel = selector.to_playwright();
        if page.query_selector(&sel).await?.is_none() {
            return Ok(None);
        }
        let value = page
            .evaluate_on_selector::<serde_json::Value, serde_json::Value>(&sel, script, None)
            .await?;
        Ok(Some(value))
    }

    async fn current_url(&self) -> Result<String> {
        let page = self.page.lock().await;
        Ok(page.url()?)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let page = self.page.lock().await;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        page.screenshot_builder()
            .path(path.to_path_buf())
            .screenshot()
            .await?;
        Ok(())
    }

    async fn sleep(&self, ms: u64) {
        tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
    }

    async fn close(&self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close remote browser")?;
        Ok(())
    }
}
