use super::types::RunResults;
use crate::runner::format_duration;
use crate::runner::state::{CheckDetails, CheckReport, CheckStatus, SuiteReport, SuiteStatus};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate HTML report
pub fn generate(results: &RunResults, output: Option<&Path>) -> Result<()> {
    let html = generate_html(results);

    if let Some(path) = output {
        std::fs::write(path, html)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

pub fn generate_html(results: &RunResults) -> String {
    let summary = &results.summary;
    let pass_rate = if summary.total_checks > 0 {
        (summary.passed as f64 / summary.total_checks as f64 * 100.0) as u32
    } else {
        0
    };

    let suites_html: String = results.suites.iter().map(suite_html).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Chat Flow Report - {run_id}</title>
    <style>
        :root {{
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --yellow: #f59e0b;
            --blue: #3b82f6;
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: system-ui, -apple-system, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.5;
            padding: 2.5rem 1rem;
        }}
        .container {{ max-width: 1100px; margin: 0 auto; }}
        header {{ display: flex; justify-content: space-between; align-items: flex-end; margin-bottom: 2rem; }}
        h1 {{ font-size: 2rem; font-weight: 800; }}
        .target {{ color: var(--text-secondary); font-size: 0.875rem; }}
        .summary {{ display: grid; grid-template-columns: repeat(5, 1fr); gap: 1rem; margin-bottom: 1.5rem; }}
        .stat {{ background: var(--bg-secondary); border: 1px solid var(--border); border-radius: 0.75rem; padding: 1rem; }}
        .stat-value {{ font-size: 1.75rem; font-weight: 700; }}
        .stat-label {{ color: var(--text-secondary); font-size: 0.75rem; text-transform: uppercase; }}
        .stat.passed .stat-value {{ color: var(--green); }}
        .stat.failed .stat-value {{ color: var(--red); }}
        .stat.skipped .stat-value {{ color: var(--yellow); }}
        .progress-bar {{ height: 0.5rem; background: var(--bg-secondary); border-radius: 999px; overflow: hidden; margin-bottom: 2rem; }}
        .progress-fill {{ height: 100%; background: var(--green); }}
        .suite {{ background: var(--bg-secondary); border: 1px solid var(--border); border-radius: 0.75rem; margin-bottom: 1.25rem; overflow: hidden; }}
        .suite-header {{ display: flex; justify-content: space-between; align-items: center; padding: 1rem 1.25rem; border-bottom: 1px solid var(--border); }}
        .suite-header h3 {{ font-size: 1.05rem; }}
        .badge {{ font-size: 0.7rem; font-weight: 700; padding: 0.15rem 0.5rem; border-radius: 999px; margin-left: 0.5rem; }}
        .suite.passed .badge {{ background: rgba(16, 185, 129, 0.15); color: var(--green); }}
        .suite.failed .badge {{ background: rgba(239, 68, 68, 0.15); color: var(--red); }}
        .suite.partial .badge, .suite.skipped .badge {{ background: rgba(245, 158, 11, 0.15); color: var(--yellow); }}
        .session {{ color: var(--text-secondary); font-size: 0.75rem; font-family: monospace; }}
        .check {{ display: flex; gap: 0.75rem; padding: 0.75rem 1.25rem; border-bottom: 1px solid rgba(255, 255, 255, 0.04); }}
        .check-icon {{ width: 1.5rem; text-align: center; font-weight: 700; }}
        .check.passed .check-icon {{ color: var(--green); }}
        .check.failed .check-icon {{ color: var(--red); }}
        .check.skipped .check-icon {{ color: var(--yellow); }}
        .check-body {{ flex: 1; }}
        .check-meta {{ display: flex; gap: 1rem; color: var(--text-secondary); font-size: 0.75rem; }}
        .check-meta a {{ color: var(--blue); text-decoration: none; }}
        .error-message {{
            background: rgba(239, 68, 68, 0.1);
            border: 1px solid rgba(239, 68, 68, 0.2);
            border-radius: 0.5rem;
            color: #fca5a5;
            font-family: monospace;
            font-size: 0.8125rem;
            margin-top: 0.5rem;
            padding: 0.5rem 0.75rem;
            white-space: pre-wrap;
        }}
        .keywords {{ margin-top: 0.5rem; font-size: 0.8125rem; }}
        .kw {{ display: inline-block; border-radius: 0.25rem; padding: 0 0.4rem; margin: 0.1rem; font-family: monospace; }}
        .kw.hit {{ background: rgba(16, 185, 129, 0.15); color: var(--green); }}
        .kw.miss {{ background: rgba(239, 68, 68, 0.15); color: var(--red); text-decoration: line-through; }}
        .preview {{ color: var(--text-secondary); font-style: italic; margin-top: 0.25rem; white-space: pre-wrap; }}
        .suite-error {{ padding: 0.75rem 1.25rem; }}
        .meta {{ margin-top: 2.5rem; color: var(--text-secondary); font-size: 0.8rem; display: flex; justify-content: center; gap: 2rem; }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <div>
                <h1>Chat Flow Report</h1>
                <div class="target">{base_url}</div>
            </div>
            <div>
                <div class="target">Run Duration</div>
                <div style="font-size: 1.25rem; font-weight: 700;">{duration}</div>
            </div>
        </header>
        <div class="summary">
            <div class="stat"><div class="stat-value">{total_suites}</div><div class="stat-label">Suites</div></div>
            <div class="stat"><div class="stat-value">{total_checks}</div><div class="stat-label">Checks</div></div>
            <div class="stat passed"><div class="stat-value">{passed}</div><div class="stat-label">Passed</div></div>
            <div class="stat failed"><div class="stat-value">{failed}</div><div class="stat-label">Failed</div></div>
            <div class="stat skipped"><div class="stat-value">{skipped}</div><div class="stat-label">Skipped</div></div>
        </div>
        <div class="progress-bar"><div class="progress-fill" style="width: {pass_rate}%"></div></div>
        {suites_html}
        <div class="meta">
            <span>Run: {run_id}</span>
            <span>Generated: {generated_at}</span>
        </div>
    </div>
</body>
</html>"#,
        run_id = html_escape(&results.run_id),
        base_url = html_escape(&results.base_url),
        duration = format_duration(summary.total_duration_ms.unwrap_or(0)),
        total_suites = summary.total_suites,
        total_checks = summary.total_checks,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        pass_rate = pass_rate,
        suites_html = suites_html,
        generated_at = html_escape(&results.generated_at),
    )
}

fn suite_html(suite: &SuiteReport) -> String {
    let (status_text, status_class) = match suite.status {
        SuiteStatus::Passed => ("Passed", "passed"),
        SuiteStatus::Failed => ("Failed", "failed"),
        SuiteStatus::Skipped => ("Skipped", "skipped"),
        _ => ("Partial", "partial"),
    };

    let session_html = suite
        .session_id
        .as_deref()
        .map(|id| format!(r#"<span class="session">session {}</span>"#, html_escape(id)))
        .unwrap_or_default();

    let duration_html = suite
        .total_duration_ms
        .map(|d| format!(r#"<span class="session">{}</span>"#, format_duration(d)))
        .unwrap_or_default();

    let error_html = suite
        .error
        .as_deref()
        .map(|e| {
            format!(
                r#"<div class="suite-error"><div class="error-message">{}</div></div>"#,
                html_escape(e)
            )
        })
        .unwrap_or_default();

    let checks_html: String = suite.checks.iter().map(check_html).collect();

    format!(
        r#"
        <div class="suite {status_class}">
            <div class="suite-header">
                <h3>{name}<span class="badge">{status_text}</span></h3>
                <div>{session_html} {duration_html}</div>
            </div>
            {error_html}
            {checks_html}
        </div>"#,
        name = html_escape(&suite.suite_name),
    )
}

fn check_html(check: &CheckReport) -> String {
    let (icon, class) = match &check.status {
        CheckStatus::Passed => ("✓", "passed"),
        CheckStatus::Failed { .. } => ("✗", "failed"),
        CheckStatus::Skipped { .. } => ("○", "skipped"),
        CheckStatus::Running => ("⋯", "running"),
        CheckStatus::Pending => ("○", "pending"),
    };

    let message_html = match &check.status {
        CheckStatus::Failed { error } => {
            format!(r#"<div class="error-message">{}</div>"#, html_escape(error))
        }
        CheckStatus::Skipped { reason } => {
            format!(r#"<div class="preview">{}</div>"#, html_escape(reason))
        }
        _ => String::new(),
    };

    let duration_html = check
        .duration_ms
        .map(|d| format!("<span>{}</span>", format_duration(d)))
        .unwrap_or_default();

    let screenshot_html = check
        .screenshot_path
        .as_deref()
        .map(|p| format!(r#"<a href="{0}" target="_blank">Screenshot</a>"#, html_escape(p)))
        .unwrap_or_default();

    let details_html = check.details.as_ref().map(details_html).unwrap_or_default();

    format!(
        r#"
            <div class="check {class}">
                <div class="check-icon">{icon}</div>
                <div class="check-body">
                    <div>{name}</div>
                    <div class="check-meta">{duration_html}{screenshot_html}</div>
                    {message_html}
                    {details_html}
                </div>
            </div>"#,
        name = html_escape(&check.name),
    )
}

/// Matched and missed keywords plus the reply preview
fn details_html(details: &CheckDetails) -> String {
    let hits: String = details
        .matched
        .iter()
        .map(|k| format!(r#"<span class="kw hit">{}</span>"#, html_escape(k)))
        .collect();
    let misses: String = details
        .missed
        .iter()
        .map(|k| format!(r#"<span class="kw miss">{}</span>"#, html_escape(k)))
        .collect();
    let timed_out = if details.timed_out { ", timed out" } else { "" };

    format!(
        r#"<div class="keywords">
                        {hits}{misses}
                        <span class="check-meta">{matched}/{total} matched, {required} required ({policy}), {len} chars after {attempts} poll(s){timed_out}</span>
                        <div class="preview">{preview}</div>
                    </div>"#,
        matched = details.matched.len(),
        total = details.matched.len() + details.missed.len(),
        required = details.required,
        policy = html_escape(&details.policy),
        len = details.response_len,
        attempts = details.attempts,
        preview = html_escape(&details.preview),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
