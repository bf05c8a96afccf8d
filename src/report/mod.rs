pub mod html;
pub mod json;
pub mod junit;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;

pub use types::RunResults;

/// Output formats the `report` subcommand can regenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Html,
    Json,
    Junit,
}

/// Write `results.json`, `report.html` and `junit.xml` into `output_dir`
pub fn write_all(results: &RunResults, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    json::generate(results, Some(&output_dir.join("results.json")))?;
    html::generate(results, Some(&output_dir.join("report.html")))?;
    junit::write_report(results, output_dir)?;
    Ok(())
}

/// Regenerate a report from a saved `results.json`
pub fn generate_report(results_path: &Path, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let results = json::load(results_path)?;

    match format {
        ReportFormat::Json => json::generate(&results, output),
        ReportFormat::Html => html::generate(&results, output),
        ReportFormat::Junit => {
            let xml = junit::generate_junit_xml(&results)?;
            match output {
                Some(path) => {
                    std::fs::write(path, xml)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("JUnit report saved to: {}", path.display());
                }
                None => println!("{}", xml),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::RunState;

    #[test]
    fn test_write_all_then_regenerate() {
        let dir = std::env::temp_dir().join(format!("chatflow-report-{}", uuid::Uuid::new_v4()));
        let mut run = RunState::new("run-1");
        run.start();
        run.finish();
        let results = RunResults::new(run.to_report(), "https://app.example.test");

        write_all(&results, &dir).unwrap();
        for file in ["results.json", "report.html", "junit.xml"] {
            assert!(dir.join(file).exists(), "{} missing", file);
        }

        let loaded = json::load(&dir.join("results.json")).unwrap();
        assert_eq!(loaded.run_id, "run-1");
        assert_eq!(loaded.base_url, "https://app.example.test");

        let html = dir.join("again.html");
        generate_report(&dir.join("results.json"), ReportFormat::Html, Some(&html)).unwrap();
        assert!(std::fs::read_to_string(&html).unwrap().contains("Chat Flow Report"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
