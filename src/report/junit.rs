use super::types::RunResults;
use crate::runner::state::{CheckReport, CheckStatus, SuiteReport, SuiteStatus};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: Option<u64>) -> String {
    (ms.unwrap_or(0) as f64 / 1000.0).to_string()
}

/// Generate a JUnit XML document: one `<testsuite>` per suite, one
/// `<testcase>` per check
pub fn generate_junit_xml(results: &RunResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = &results.summary;
    let setup_failures = results
        .suites
        .iter()
        .filter(|s| s.checks.is_empty() && s.status == SuiteStatus::Failed)
        .count() as u32;

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "chatflow-tester"));
    suites_start.push_attribute((
        "tests",
        (summary.total_checks + setup_failures).to_string().as_str(),
    ));
    suites_start.push_attribute((
        "failures",
        (summary.failed + setup_failures).to_string().as_str(),
    ));
    suites_start.push_attribute(("skipped", summary.skipped.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(summary.total_duration_ms).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    for suite in &results.suites {
        write_suite(&mut writer, suite, &results.generated_at)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_suite<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &SuiteReport,
    timestamp: &str,
) -> Result<()> {
    let failed = suite
        .checks
        .iter()
        .filter(|c| matches!(c.status, CheckStatus::Failed { .. }))
        .count();
    let skipped = suite
        .checks
        .iter()
        .filter(|c| matches!(c.status, CheckStatus::Skipped { .. }))
        .count();
    // Provisioning failures show up as one failing case
    let setup_failed = suite.checks.is_empty() && suite.status == SuiteStatus::Failed;
    let tests = suite.checks.len() + usize::from(setup_failed);

    let mut start = BytesStart::new("testsuite");
    start.push_attribute(("name", suite.suite_name.as_str()));
    start.push_attribute(("tests", tests.to_string().as_str()));
    start.push_attribute((
        "failures",
        (failed + usize::from(setup_failed)).to_string().as_str(),
    ));
    start.push_attribute(("skipped", skipped.to_string().as_str()));
    if let Some(id) = &suite.session_id {
        start.push_attribute(("id", id.as_str()));
    }
    start.push_attribute(("time", seconds(suite.total_duration_ms).as_str()));
    start.push_attribute(("timestamp", timestamp));
    writer.write_event(Event::Start(start))?;

    if setup_failed {
        let message = suite.error.as_deref().unwrap_or("Suite failed before any check");
        let mut case = BytesStart::new("testcase");
        case.push_attribute(("name", "Session setup"));
        case.push_attribute(("classname", suite.suite_name.as_str()));
        writer.write_event(Event::Start(case))?;
        write_failure(writer, message, "ProvisionError")?;
        writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    }

    for check in &suite.checks {
        write_test_case(writer, &suite.suite_name, check)?;
    }

    if let Some(error) = suite.error.as_deref().filter(|_| !setup_failed) {
        writer.write_event(Event::Start(BytesStart::new("system-err")))?;
        writer.write_event(Event::Text(BytesText::new(error)))?;
        writer.write_event(Event::End(BytesEnd::new("system-err")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite_name: &str,
    check: &CheckReport,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", check.name.as_str()));
    case_start.push_attribute(("classname", suite_name));
    case_start.push_attribute(("time", seconds(check.duration_ms).as_str()));
    writer.write_event(Event::Start(case_start))?;

    match &check.status {
        CheckStatus::Failed { error } => write_failure(writer, error, "AssertionError")?,
        CheckStatus::Skipped { reason } => {
            let mut skip = BytesStart::new("skipped");
            skip.push_attribute(("message", reason.as_str()));
            writer.write_event(Event::Empty(skip))?;
        }
        _ => {}
    }

    if let Some(details) = &check.details {
        let out = format!(
            "policy: {}\nmatched: {}\nmissed: {}\nresponse length: {}\npreview: {}",
            details.policy,
            details.matched.join(", "),
            details.missed.join(", "),
            details.response_len,
            details.preview
        );
        writer.write_event(Event::Start(BytesStart::new("system-out")))?;
        writer.write_event(Event::Text(BytesText::new(&out)))?;
        writer.write_event(Event::End(BytesEnd::new("system-out")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

fn write_failure<W: std::io::Write>(writer: &mut Writer<W>, message: &str, kind: &str) -> Result<()> {
    let mut fail_start = BytesStart::new("failure");
    fail_start.push_attribute(("message", message));
    fail_start.push_attribute(("type", kind));
    writer.write_event(Event::Start(fail_start))?;
    writer.write_event(Event::Text(BytesText::new(message)))?;
    writer.write_event(Event::End(BytesEnd::new("failure")))?;
    Ok(())
}

/// Write `junit.xml` into the output directory
pub fn write_report(results: &RunResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}
