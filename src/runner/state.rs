use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Check execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String },
    Skipped { reason: String },
}

impl CheckStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckStatus::Passed | CheckStatus::Failed { .. } | CheckStatus::Skipped { .. }
        )
    }
}

/// Diagnostics attached to a reply check
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckDetails {
    pub matched: Vec<String>,
    pub missed: Vec<String>,
    pub required: usize,
    pub policy: String,
    pub response_len: usize,
    pub attempts: u32,
    pub timed_out: bool,
    pub preview: String,
}

/// State for a single check
#[derive(Debug, Clone)]
pub struct CheckState {
    pub index: usize,
    pub name: String,
    pub status: CheckStatus,
    pub started_at: Option<Instant>,
    pub duration_ms: Option<u64>,
    pub screenshot_path: Option<String>,
    pub details: Option<CheckDetails>,
}

impl CheckState {
    pub fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            status: CheckStatus::Pending,
            started_at: None,
            duration_ms: None,
            screenshot_path: None,
            details: None,
        }
    }

    pub fn start(&mut self) {
        self.status = CheckStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(CheckStatus::Passed);
    }

    pub fn fail(&mut self, error: String) {
        self.finish(CheckStatus::Failed { error });
    }

    pub fn skip(&mut self, reason: String) {
        self.status = CheckStatus::Skipped { reason };
    }

    fn finish(&mut self, status: CheckStatus) {
        self.status = status;
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    pub fn to_report(&self) -> CheckReport {
        CheckReport {
            index: self.index,
            name: self.name.clone(),
            status: self.status.clone(),
            duration_ms: self.duration_ms,
            screenshot_path: self.screenshot_path.clone(),
            details: self.details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub index: usize,
    pub name: String,
    pub status: CheckStatus,
    pub duration_ms: Option<u64>,
    pub screenshot_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<CheckDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuiteStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
    PartiallyPassed { passed: u32, failed: u32 },
}

/// One suite, run inside one remote session
#[derive(Debug, Clone)]
pub struct SuiteState {
    pub suite_name: String,
    pub session_id: Option<String>,
    pub status: SuiteStatus,
    pub checks: Vec<CheckState>,
    pub started_at: Option<Instant>,
    pub total_duration_ms: Option<u64>,
    /// Failure outside any check (provisioning, connection)
    pub error: Option<String>,
}

impl SuiteState {
    pub fn new(name: &str) -> Self {
        Self {
            suite_name: name.to_string(),
            session_id: None,
            status: SuiteStatus::Pending,
            checks: Vec::new(),
            started_at: None,
            total_duration_ms: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = SuiteStatus::Running;
        self.started_at = Some(Instant::now());
    }

    /// Append a running check and return its index
    pub fn begin_check(&mut self, name: &str) -> usize {
        let index = self.checks.len();
        let mut check = CheckState::new(index, name);
        check.start();
        self.checks.push(check);
        index
    }

    pub fn check_mut(&mut self, index: usize) -> Option<&mut CheckState> {
        self.checks.get_mut(index)
    }

    pub fn skip(&mut self, reason: &str) {
        self.status = SuiteStatus::Skipped;
        self.error = Some(reason.to_string());
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.started_at {
            self.total_duration_ms = Some(start.elapsed().as_millis() as u64);
        }

        let (passed, failed) = self
            .checks
            .iter()
            .fold((0, 0), |(p, f), check| match check.status {
                CheckStatus::Passed => (p + 1, f),
                CheckStatus::Failed { .. } => (p, f + 1),
                _ => (p, f),
            });

        self.status = if self.error.is_some() && self.checks.is_empty() {
            SuiteStatus::Failed
        } else if failed == 0 && self.error.is_none() {
            SuiteStatus::Passed
        } else if passed == 0 {
            SuiteStatus::Failed
        } else {
            SuiteStatus::PartiallyPassed {
                passed,
                failed: failed.max(1),
            }
        };
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self.status,
            SuiteStatus::Failed | SuiteStatus::PartiallyPassed { .. }
        )
    }

    pub fn to_report(&self) -> SuiteReport {
        SuiteReport {
            suite_name: self.suite_name.clone(),
            session_id: self.session_id.clone(),
            status: self.status.clone(),
            checks: self.checks.iter().map(|c| c.to_report()).collect(),
            total_duration_ms: self.total_duration_ms,
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub suite_name: String,
    pub session_id: Option<String>,
    pub status: SuiteStatus,
    pub checks: Vec<CheckReport>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl SuiteReport {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.status,
            SuiteStatus::Failed | SuiteStatus::PartiallyPassed { .. }
        )
    }
}

/// Whole-run state
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub suites: Vec<SuiteState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl RunState {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            suites: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn add_suite(&mut self, suite: SuiteState) {
        self.suites.push(suite);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            run_id: self.run_id.clone(),
            total_suites: self.suites.len() as u32,
            ..RunSummary::default()
        };

        for suite in &self.suites {
            if suite.is_failure() {
                summary.failed_suites += 1;
            }
            for check in &suite.checks {
                summary.total_checks += 1;
                match check.status {
                    CheckStatus::Passed => summary.passed += 1,
                    CheckStatus::Failed { .. } => summary.failed += 1,
                    CheckStatus::Skipped { .. } => summary.skipped += 1,
                    _ => {}
                }
            }
        }

        summary.total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });
        summary
    }

    pub fn to_report(&self) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            suites: self.suites.iter().map(|s| s.to_report()).collect(),
            summary: self.summary(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub total_suites: u32,
    pub failed_suites: u32,
    pub total_checks: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: Option<u64>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed_suites == 0 && self.failed == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub suites: Vec<SuiteReport>,
    pub summary: RunSummary,
}
