//! Scripted in-memory page used by unit tests
//!
//! Records every primitive call, serves body text from a queue of frames and
//! accounts sleeps as virtual time.

use super::traits::{LoadPolicy, PageConnector, PageDriver, Selector};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    Fill(String, String),
    Click(String),
    ClickNth(String, usize),
    Press(String, String),
    Sleep(u64),
    Close,
}

#[derive(Default)]
pub struct ScriptedPage {
    elements: Mutex<HashSet<String>>,
    frames: Mutex<VecDeque<String>>,
    texts: HashMap<String, Vec<String>>,
    attributes: HashMap<(String, String), String>,
    eval_results: Vec<(String, serde_json::Value)>,
    element_evals: HashMap<String, serde_json::Value>,
    calls: Mutex<Vec<Call>>,
    slept: Mutex<u64>,
    panic_on_navigate: bool,
    close_log: Option<(Arc<Mutex<Vec<String>>>, String)>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a selector (in Playwright form) as present
    pub fn with_element(self, selector: &str) -> Self {
        self.elements.lock().unwrap().insert(selector.to_string());
        self
    }

    /// Body text frames served in order; the last frame repeats
    pub fn with_frames<I, S>(self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames
            .lock()
            .unwrap()
            .extend(frames.into_iter().map(Into::into));
        self
    }

    pub fn with_texts(mut self, selector: &str, texts: &[&str]) -> Self {
        self.texts.insert(
            selector.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self.with_element(selector)
    }

    pub fn with_attribute(mut self, selector: &str, name: &str, value: &str) -> Self {
        self.attributes
            .insert((selector.to_string(), name.to_string()), value.to_string());
        self.with_element(selector)
    }

    /// Result for any `evaluate` whose script contains `needle`
    pub fn with_eval(mut self, needle: &str, value: serde_json::Value) -> Self {
        self.eval_results.push((needle.to_string(), value));
        self
    }

    pub fn with_element_eval(mut self, selector: &str, value: serde_json::Value) -> Self {
        self.element_evals.insert(selector.to_string(), value);
        self.with_element(selector)
    }

    pub fn remove_element(self, selector: &str) -> Self {
        self.elements.lock().unwrap().remove(selector);
        self
    }

    /// Any navigation panics, standing in for a failed assertion mid-suite
    pub fn panicking_on_navigate(mut self) -> Self {
        self.panic_on_navigate = true;
        self
    }

    fn closing_into(mut self, log: Arc<Mutex<Vec<String>>>, endpoint: &str) -> Self {
        self.close_log = Some((log, endpoint.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Click(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fill(s, v) => Some((s, v)),
                _ => None,
            })
            .collect()
    }

    pub fn slept_ms(&self) -> u64 {
        *self.slept.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn present(&self, selector: &Selector) -> bool {
        let elements = self.elements.lock().unwrap();
        match selector {
            Selector::AnyOf(candidates) => candidates
                .iter()
                .any(|c| elements.contains(&c.to_playwright())),
            other => elements.contains(&other.to_playwright()),
        }
    }

    fn next_frame(&self) -> String {
        let mut frames = self.frames.lock().unwrap();
        if frames.len() > 1 {
            frames.pop_front().unwrap_or_default()
        } else {
            frames.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn navigate(&self, url: &str, _policy: LoadPolicy, _timeout_ms: u64) -> Result<()> {
        self.record(Call::Navigate(url.to_string()));
        if self.panic_on_navigate {
            panic!("navigation to {} blew up", url);
        }
        Ok(())
    }

    async fn fill(&self, selector: &Selector, value: &str) -> Result<()> {
        let sel = selector.to_playwright();
        self.record(Call::Fill(sel.clone(), value.to_string()));
        if !self.present(selector) {
            anyhow::bail!("Timeout waiting for {}", sel);
        }
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        let sel = selector.to_playwright();
        self.record(Call::Click(sel.clone()));
        if !self.present(selector) {
            anyhow::bail!("Timeout waiting for {}", sel);
        }
        Ok(())
    }

    async fn click_nth(&self, selector: &Selector, index: usize) -> Result<()> {
        self.record(Call::ClickNth(selector.to_playwright(), index));
        Ok(())
    }

    async fn press(&self, selector: &Selector, key: &str) -> Result<()> {
        self.record(Call::Press(selector.to_playwright(), key.to_string()));
        Ok(())
    }

    async fn exists(&self, selector: &Selector) -> Result<bool> {
        Ok(self.present(selector))
    }

    async fn read_text(&self, selector: &Selector) -> Result<String> {
        let sel = selector.to_playwright();
        if sel == "body" {
            return Ok(self.next_frame());
        }
        Ok(self
            .texts
            .get(&sel)
            .and_then(|t| t.first().cloned())
            .unwrap_or_default())
    }

    async fn read_all_texts(&self, selector: &Selector) -> Result<Vec<String>> {
        Ok(self
            .texts
            .get(&selector.to_playwright())
            .cloned()
            .unwrap_or_default())
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> Result<Option<String>> {
        if !self.present(selector) {
            return Ok(None);
        }
        Ok(self
            .attributes
            .get(&(selector.to_playwright(), name.to_string()))
            .cloned())
    }

    async fn evaluate(&self, script: &str, _arg: serde_json::Value) -> Result<serde_json::Value> {
        if script.contains("innerText") {
            return Ok(serde_json::Value::String(self.next_frame()));
        }
        Ok(self
            .eval_results
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or(serde_json::Value::Null))
    }

    async fn evaluate_on(
        &self,
        selector: &Selector,
        _script: &str,
    ) -> Result<Option<serde_json::Value>> {
        if !self.present(selector) {
            return Ok(None);
        }
        Ok(Some(
            self.element_evals
                .get(&selector.to_playwright())
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        ))
    }

    async fn current_url(&self) -> Result<String> {
        Ok("https://app.example.test/".to_string())
    }

    async fn screenshot(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    async fn sleep(&self, ms: u64) {
        self.record(Call::Sleep(ms));
        *self.slept.lock().unwrap() += ms;
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        if let Some((log, endpoint)) = &self.close_log {
            log.lock().unwrap().push(endpoint.clone());
        }
        Ok(())
    }
}

/// Connector handing out a fresh scripted page per session
pub struct ScriptedConnector {
    factory: Option<fn() -> ScriptedPage>,
    endpoints: Mutex<Vec<String>>,
    closed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(factory: fn() -> ScriptedPage) -> Self {
        Self {
            factory: Some(factory),
            endpoints: Mutex::new(Vec::new()),
            closed: Arc::default(),
        }
    }

    /// Every connection attempt fails
    pub fn refusing() -> Self {
        Self {
            factory: None,
            endpoints: Mutex::new(Vec::new()),
            closed: Arc::default(),
        }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().unwrap().clone()
    }

    /// Endpoints whose page was closed, in order
    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn PageDriver>> {
        let Some(factory) = self.factory else {
            anyhow::bail!("Failed to connect to {}: connection refused", endpoint);
        };
        self.endpoints.lock().unwrap().push(endpoint.to_string());
        Ok(Box::new(factory().closing_into(self.closed.clone(), endpoint)))
    }
}
