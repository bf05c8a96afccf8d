use crate::runner::state::{RunReport, RunSummary, SuiteReport};
use serde::{Deserialize, Serialize};

/// Everything a saved run carries, as written to `results.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResults {
    pub run_id: String,
    pub base_url: String,
    pub suites: Vec<SuiteReport>,
    pub summary: RunSummary,
    pub generated_at: String,
}

impl RunResults {
    pub fn new(report: RunReport, base_url: &str) -> Self {
        Self {
            run_id: report.run_id,
            base_url: base_url.to_string(),
            suites: report.suites,
            summary: report.summary,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
