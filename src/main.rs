use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use chatflow_tester::catalog::ScenarioCatalog;
use chatflow_tester::driver::web::PlaywrightConnector;
use chatflow_tester::provider::HttpSessionProvider;
use chatflow_tester::report::{self, ReportFormat, RunResults};
use chatflow_tester::runner::{ConsoleEventListener, EventEmitter, RunOptions, Runner, SuiteKind};
use chatflow_tester::utils::Config;

#[derive(Parser)]
#[command(name = "chatflow-tester")]
#[command(version = "0.1.0")]
#[command(about = "Onboarding flow and AI conversation checks against remote browser sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run suites, each in a freshly provisioned remote browser
    Run {
        /// Suite(s) to run. Can be specified multiple times; defaults to all.
        #[arg(short, long, value_enum)]
        suite: Vec<SuiteKind>,

        /// Persona(s) for the roles suite. Can be specified multiple times.
        #[arg(short, long)]
        persona: Vec<String>,

        /// Scenario catalog YAML replacing the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for reports and screenshots
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Capture a screenshot for every failed check
        #[arg(long, short = 's', default_value = "false")]
        snapshot: bool,

        /// Require half of the keywords for every use case
        #[arg(long, default_value = "false")]
        strict: bool,

        /// Reply polls before giving up on a use case
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Interval between reply polls
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },

    /// Print the scenario catalog
    Catalog {
        /// Scenario catalog YAML replacing the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Generate report from saved run results
    Report {
        /// Path to results.json
        results: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "html")]
        format: ReportFormat,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<ScenarioCatalog> {
    match path {
        Some(p) => Ok(ScenarioCatalog::load(p)?),
        None => Ok(ScenarioCatalog::builtin().clone()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            suite,
            persona,
            catalog,
            config,
            output,
            snapshot,
            strict,
            max_attempts,
            poll_interval_ms,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(n) = max_attempts {
                config.detector.max_attempts = n;
            }
            if let Some(ms) = poll_interval_ms {
                config.detector.poll_interval_ms = ms;
            }
            let catalog = load_catalog(catalog.as_deref())?;

            println!("{} Testing {}", "▶".green().bold(), config.base_url.cyan());
            if !suite.is_empty() {
                let names: Vec<String> = suite.iter().map(|s| format!("{:?}", s)).collect();
                println!("  Suites: {}", names.join(", ").cyan());
            }
            if !persona.is_empty() {
                println!("  Personas: {}", persona.join(", ").cyan());
            }
            println!("  Output: {}", output.display().to_string().cyan());
            if snapshot {
                println!("  Snapshots: {}", "Enabled".green());
            }
            if strict {
                println!("  Keyword policy: {}", "strict".yellow());
            }

            let provider = HttpSessionProvider::new(&config.provider)?;
            let connector = PlaywrightConnector;
            let (emitter, receiver) = EventEmitter::new();
            let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

            let options = RunOptions {
                suites: suite,
                personas: persona,
                output_dir: output.clone(),
                snapshot,
                strict,
            };
            let runner = Runner::new(&config, &catalog, &provider, &connector, &emitter, options);

            let stop_flag = runner.stop_flag();
            ctrlc::set_handler(move || {
                println!(
                    "\n{} Stopping after the current suite...",
                    "⏹️ ".yellow()
                );
                stop_flag.store(true, Ordering::SeqCst);
            })?;

            let run = runner.run().await?;
            drop(runner);
            drop(emitter);
            listener.await.ok();

            let results = RunResults::new(run.to_report(), &config.base_url);
            report::write_all(&results, &output)?;

            if !results.summary.is_success() {
                std::process::exit(1);
            }
        }

        Commands::Catalog { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            for entry in catalog.personas() {
                println!("{} {}", "●".green(), entry.name.white().bold());
                if !entry.description.is_empty() {
                    println!("  {}", entry.description.dimmed());
                }
                for use_case in &entry.use_cases {
                    println!(
                        "  - {} [{}]: {}",
                        use_case.name,
                        use_case.policy.to_string().yellow(),
                        use_case.expected_keywords.join(", ").cyan()
                    );
                }
            }
            if !catalog.coming_soon().is_empty() {
                println!(
                    "\n{} Coming soon: {}",
                    "○".yellow(),
                    catalog.coming_soon().join(", ")
                );
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {:?} report from: {}",
                "📊".to_string().blue(),
                format,
                results.display()
            );
            report::generate_report(&results, format, output.as_deref())?;
        }
    }

    Ok(())
}
