//! Check recording and assertion helpers used by the suites

use super::events::{EventEmitter, RunEvent};
use super::state::{CheckDetails, SuiteState};
use super::RunOptions;
use crate::catalog::ScenarioCatalog;
use crate::driver::common::sanitize_file_name;
use crate::driver::{PageDriver, Selector};
use crate::utils::Config;

/// A failed assertion, with optional diagnostics
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CheckFailure {
    pub message: String,
    pub details: Option<CheckDetails>,
}

impl CheckFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: CheckDetails) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<anyhow::Error> for CheckFailure {
    fn from(e: anyhow::Error) -> Self {
        Self::new(format!("{:#}", e))
    }
}

/// `Ok` carries diagnostics worth keeping for passed checks
pub type CheckResult = Result<Option<CheckDetails>, CheckFailure>;

pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CheckFailure> {
    if condition {
        Ok(())
    } else {
        Err(CheckFailure::new(message))
    }
}

/// Fail unless `body` contains every needle; lists all that are missing
pub fn expect_body_contains<S: AsRef<str>>(body: &str, needles: &[S]) -> Result<(), CheckFailure> {
    let missing: Vec<&str> = needles
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| !body.contains(n))
        .collect();
    ensure(
        missing.is_empty(),
        format!("Page text is missing: {}", missing.join(", ")),
    )
}

pub async fn expect_present(
    page: &dyn PageDriver,
    selector: &Selector,
    what: &str,
) -> Result<(), CheckFailure> {
    let found = page.exists(selector).await?;
    ensure(found, format!("{} should exist ({})", what, selector))
}

pub async fn body_text(page: &dyn PageDriver) -> Result<String, CheckFailure> {
    Ok(page.read_text(&Selector::css("body")).await?)
}

/// Everything a suite needs while it runs inside one session
pub struct SuiteRun<'a> {
    pub page: &'a dyn PageDriver,
    pub config: &'a Config,
    pub catalog: &'a ScenarioCatalog,
    pub options: &'a RunOptions,
    pub state: &'a mut SuiteState,
    pub emitter: &'a EventEmitter,
}

impl<'a> SuiteRun<'a> {
    /// Start a named check
    pub fn begin(&mut self, name: &str) -> usize {
        let index = self.state.begin_check(name);
        self.emitter.emit(RunEvent::CheckStarted {
            suite_name: self.state.suite_name.clone(),
            index,
            check: name.to_string(),
        });
        index
    }

    /// Record the outcome of a check started with [`SuiteRun::begin`]
    pub async fn end(&mut self, index: usize, result: CheckResult) -> bool {
        let screenshot = match &result {
            Err(_) if self.options.snapshot => self.capture(index).await,
            _ => None,
        };

        let suite_name = self.state.suite_name.clone();
        let Some(check) = self.state.check_mut(index) else {
            return false;
        };
        check.screenshot_path = screenshot;

        let passed = match result {
            Ok(details) => {
                check.details = details;
                check.pass();
                true
            }
            Err(failure) => {
                check.details = failure.details;
                check.fail(failure.message);
                false
            }
        };

        let duration_ms = check.duration_ms.unwrap_or(0);
        let event = match &check.status {
            super::CheckStatus::Failed { error } => RunEvent::CheckFailed {
                suite_name,
                index,
                error: error.clone(),
                duration_ms,
            },
            _ => RunEvent::CheckPassed {
                suite_name,
                index,
                duration_ms,
            },
        };
        self.emitter.emit(event);
        passed
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.emitter.log(message);
    }

    async fn capture(&self, index: usize) -> Option<String> {
        let file = format!(
            "{}_{:02}.png",
            sanitize_file_name(&self.state.suite_name),
            index + 1
        );
        let path = self.options.output_dir.join("screenshots").join(file);
        match self.page.screenshot(&path).await {
            Ok(()) => Some(path.to_string_lossy().to_string()),
            Err(e) => {
                log::warn!("Failure screenshot not saved: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::ScriptedPage;

    #[test]
    fn test_expect_body_contains_lists_missing() {
        let body = "Choose your AI Employee Executive Assistant QA Engineer";
        assert!(expect_body_contains(body, &["Executive Assistant", "QA Engineer"]).is_ok());
        let err = expect_body_contains(body, &["QA Engineer", "Recruiter", "Copywriter"]).unwrap_err();
        assert_eq!(err.message, "Page text is missing: Recruiter, Copywriter");
    }

    #[tokio::test]
    async fn test_expect_present() {
        let page = ScriptedPage::new().with_element("textarea");
        assert!(expect_present(&page, &Selector::css("textarea"), "Chat input")
            .await
            .is_ok());
        let err = expect_present(&page, &Selector::css("a[href*=\"terms\"]"), "Terms link")
            .await
            .unwrap_err();
        assert!(err.message.starts_with("Terms link should exist"));
    }

    #[test]
    fn test_anyhow_converts_with_context_chain() {
        let err = anyhow::anyhow!("timeout").context("Failed to read page text");
        let failure = CheckFailure::from(err);
        assert_eq!(failure.message, "Failed to read page text: timeout");
    }
}
