use super::state::{RunSummary, SuiteStatus};
use tokio::sync::broadcast;

/// Run events for real-time updates
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        suite_count: usize,
    },
    RunFinished {
        summary: RunSummary,
    },

    SuiteStarted {
        suite_name: String,
    },
    SessionOpened {
        suite_name: String,
        session_id: String,
    },
    SuiteFinished {
        suite_name: String,
        status: SuiteStatus,
        duration_ms: Option<u64>,
        error: Option<String>,
    },

    CheckStarted {
        suite_name: String,
        index: usize,
        check: String,
    },
    CheckPassed {
        suite_name: String,
        index: usize,
        duration_ms: u64,
    },
    CheckFailed {
        suite_name: String,
        index: usize,
        error: String,
        duration_ms: u64,
    },

    Log {
        message: String,
    },
}

/// Event emitter for broadcasting run events
pub struct EventEmitter {
    sender: broadcast::Sender<RunEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<RunEvent>) {
        let (sender, receiver) = broadcast::channel(256);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(RunEvent::Log {
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<RunEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        // Piped output gets no escape codes
        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinner: Option<ProgressBar> = None;
        let mut check_text = String::new();

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Console listener skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                RunEvent::RunStarted {
                    run_id,
                    suite_count,
                } => {
                    println!(
                        "\n{} Run {} started ({} suites)",
                        "▶".green().bold(),
                        run_id.cyan(),
                        suite_count
                    );
                }

                RunEvent::RunFinished { summary } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("\n{} Run finished", "■".blue().bold());
                    println!(
                        "  Suites: {} ({} failed)",
                        summary.total_suites, summary.failed_suites
                    );
                    println!(
                        "  Checks: {} passed, {} failed, {} skipped",
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.skipped.to_string().yellow()
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}", format_duration(duration));
                    }
                }

                RunEvent::SuiteStarted { suite_name } => {
                    println!("\n  {} Suite: {}", "→".blue(), suite_name.white().bold());
                }

                RunEvent::SessionOpened { session_id, .. } => {
                    println!("    {}", format!("session {}", session_id).dimmed());
                }

                RunEvent::SuiteFinished {
                    suite_name,
                    status,
                    duration_ms,
                    error,
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    let status_str = match status {
                        SuiteStatus::Passed => "PASSED".green().bold(),
                        SuiteStatus::Failed => "FAILED".red().bold(),
                        SuiteStatus::Skipped => "SKIPPED".yellow().bold(),
                        SuiteStatus::PartiallyPassed { passed, failed } => {
                            format!("PARTIAL ({}/{} passed)", passed, passed + failed)
                                .yellow()
                                .bold()
                        }
                        _ => "UNKNOWN".white().bold(),
                    };
                    println!("  {} Suite {} [{}]", "←".blue(), suite_name, status_str);
                    if let Some(err) = error {
                        println!("    {}", err.red());
                    }
                    if let Some(duration) = duration_ms {
                        println!("    Duration: {}", format_duration(duration));
                    }
                }

                RunEvent::CheckStarted { index, check, .. } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    if let Ok(style) = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                    {
                        pb.set_style(style);
                    }
                    check_text = format!("[{}] {}... ", index + 1, check.dimmed());
                    pb.set_message(check_text.clone());
                    pb.enable_steady_tick(StdDuration::from_millis(100));
                    spinner = Some(pb);
                }

                RunEvent::CheckPassed { duration_ms, .. } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "    {} {}({})",
                        "✓".green(),
                        check_text,
                        format_duration(duration_ms)
                    );
                }

                RunEvent::CheckFailed {
                    error, duration_ms, ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "    {} {}({})",
                        "✗".red(),
                        check_text,
                        format_duration(duration_ms)
                    );
                    for line in error.lines() {
                        println!("        {}", line.red());
                    }
                }

                RunEvent::Log { message } => {
                    multi.println(format!("      {}", message)).ok();
                }
            }
        }
    }
}

pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60000;
        let seconds = (ms % 60000) as f64 / 1000.0;
        format!("{}m {:.0}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(12_500), "12.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let (emitter, mut rx) = EventEmitter::new();
        emitter.log("Prompt: Draft a professional email...");
        match rx.recv().await.unwrap() {
            RunEvent::Log { message } => assert!(message.starts_with("Prompt:")),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
