pub mod avatars;
pub mod checks;
pub mod events;
pub mod state;
pub mod suites;

use anyhow::Result;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::catalog::{ScenarioCatalog, ScenarioEntry};
use crate::driver::PageConnector;
use crate::provider::{with_session, SessionProvider};
use crate::utils::Config;
use checks::SuiteRun;

pub use events::*;
pub use state::*;

/// Suites selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SuiteKind {
    Signup,
    /// One suite per persona
    Roles,
    ComingSoon,
    Avatars,
}

impl SuiteKind {
    pub const ALL: [SuiteKind; 4] = [
        SuiteKind::Signup,
        SuiteKind::Roles,
        SuiteKind::ComingSoon,
        SuiteKind::Avatars,
    ];
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Empty means every suite
    pub suites: Vec<SuiteKind>,
    /// Empty means every persona in the catalog
    pub personas: Vec<String>,
    pub output_dir: PathBuf,
    /// Screenshot failed checks
    pub snapshot: bool,
    /// Score every use case with the strict policy
    pub strict: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            suites: Vec::new(),
            personas: Vec::new(),
            output_dir: PathBuf::from("./output"),
            snapshot: false,
            strict: false,
        }
    }
}

/// A suite resolved against the catalog
#[derive(Debug, Clone, Copy)]
pub enum PlannedSuite<'c> {
    Signup,
    Persona(&'c ScenarioEntry),
    ComingSoon,
    Avatars,
}

impl PlannedSuite<'_> {
    pub fn name(&self) -> String {
        match self {
            PlannedSuite::Signup => "Signup flow".to_string(),
            PlannedSuite::Persona(entry) => format!("Role: {}", entry.name),
            PlannedSuite::ComingSoon => "Coming soon personas".to_string(),
            PlannedSuite::Avatars => "Avatar images".to_string(),
        }
    }

    async fn execute(&self, run: &mut SuiteRun<'_>) {
        match self {
            PlannedSuite::Signup => suites::signup(run).await,
            PlannedSuite::Persona(entry) => suites::persona(run, entry).await,
            PlannedSuite::ComingSoon => suites::coming_soon(run).await,
            PlannedSuite::Avatars => suites::avatars(run).await,
        }
    }
}

/// Runs suites one after another, each in its own remote session
pub struct Runner<'a> {
    config: &'a Config,
    catalog: &'a ScenarioCatalog,
    provider: &'a dyn SessionProvider,
    connector: &'a dyn PageConnector,
    emitter: &'a EventEmitter,
    options: RunOptions,
    stop: Arc<AtomicBool>,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: &'a Config,
        catalog: &'a ScenarioCatalog,
        provider: &'a dyn SessionProvider,
        connector: &'a dyn PageConnector,
        emitter: &'a EventEmitter,
        options: RunOptions,
    ) -> Self {
        Self {
            config,
            catalog,
            provider,
            connector,
            emitter,
            options,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between suites; setting it skips the remaining ones
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Expand the selected suite kinds into concrete suites, in run order
    pub fn plan(&self) -> Result<Vec<PlannedSuite<'a>>> {
        let kinds: &[SuiteKind] = if self.options.suites.is_empty() {
            &SuiteKind::ALL
        } else {
            &self.options.suites
        };

        let mut planned = Vec::new();
        for kind in SuiteKind::ALL.iter().filter(|k| kinds.contains(k)) {
            match kind {
                SuiteKind::Signup => planned.push(PlannedSuite::Signup),
                SuiteKind::Roles => {
                    let personas = self.catalog.select(&self.options.personas)?;
                    planned.extend(personas.into_iter().map(PlannedSuite::Persona));
                }
                SuiteKind::ComingSoon => planned.push(PlannedSuite::ComingSoon),
                SuiteKind::Avatars => planned.push(PlannedSuite::Avatars),
            }
        }
        Ok(planned)
    }

    /// Run every planned suite; a failing suite never stops the others
    pub async fn run(&self) -> Result<RunState> {
        let planned = self.plan()?;
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut run = RunState::new(&run_id);
        run.start();

        self.emitter.emit(RunEvent::RunStarted {
            run_id: run_id.clone(),
            suite_count: planned.len(),
        });

        for suite in &planned {
            let name = suite.name();
            let mut state = SuiteState::new(&name);

            if self.stop.load(Ordering::SeqCst) {
                state.skip("Run interrupted");
                self.emit_finished(&state);
                run.add_suite(state);
                continue;
            }

            self.emitter.emit(RunEvent::SuiteStarted {
                suite_name: name.clone(),
            });
            state.start();

            if let Err(e) = self.run_in_session(suite, &mut state).await {
                log::error!("Suite '{}' aborted: {:#}", name, e);
                state.error = Some(format!("{:#}", e));
            }

            state.finish();
            self.emit_finished(&state);
            run.add_suite(state);
        }

        run.finish();
        self.emitter.emit(RunEvent::RunFinished {
            summary: run.summary(),
        });
        Ok(run)
    }

    async fn run_in_session(&self, suite: &PlannedSuite<'a>, state: &mut SuiteState) -> Result<()> {
        let purpose = format!("chatflow-tester: {}", suite.name());
        with_session(self.provider, &purpose, |session| async move {
            log::info!("Session {} opened for '{}'", session.id, state.suite_name);
            state.session_id = Some(session.id.clone());
            self.emitter.emit(RunEvent::SessionOpened {
                suite_name: state.suite_name.clone(),
                session_id: session.id.clone(),
            });

            let page = self.connector.connect(&session.connect_url).await?;
            let mut run = SuiteRun {
                page: page.as_ref(),
                config: self.config,
                catalog: self.catalog,
                options: &self.options,
                state,
                emitter: self.emitter,
            };
            // The page is closed even when a check panics
            let outcome = AssertUnwindSafe(suite.execute(&mut run)).catch_unwind().await;

            if let Err(e) = page.close().await {
                log::warn!("Failed to close page: {:#}", e);
            }
            if let Err(panic) = outcome {
                std::panic::resume_unwind(panic);
            }
            Ok(())
        })
        .await
    }

    fn emit_finished(&self, state: &SuiteState) {
        self.emitter.emit(RunEvent::SuiteFinished {
            suite_name: state.suite_name.clone(),
            status: state.status.clone(),
            duration_ms: state.total_duration_ms,
            error: state.error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{ScriptedConnector, ScriptedPage};
    use crate::provider::fake::CountingProvider;

    fn coming_soon_page() -> ScriptedPage {
        let body = ScenarioCatalog::builtin().coming_soon().join("\n");
        ScriptedPage::new().with_frames([format!("Choose your AI Employee\n{}", body)])
    }

    fn options(suites: &[SuiteKind]) -> RunOptions {
        RunOptions {
            suites: suites.to_vec(),
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_plan_expands_roles_in_fixed_order() {
        let config = Config::default();
        let provider = CountingProvider::new();
        let connector = ScriptedConnector::new(ScriptedPage::new);
        let emitter = EventEmitter::default();
        let mut opts = options(&[SuiteKind::Avatars, SuiteKind::Roles]);
        opts.personas = vec!["qa engineer".into(), "Executive Assistant".into()];
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            opts,
        );

        let names: Vec<String> = runner.plan().unwrap().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["Role: QA Engineer", "Role: Executive Assistant", "Avatar images"]
        );
    }

    #[test]
    fn test_plan_rejects_unknown_persona() {
        let config = Config::default();
        let provider = CountingProvider::new();
        let connector = ScriptedConnector::new(ScriptedPage::new);
        let emitter = EventEmitter::default();
        let mut opts = options(&[SuiteKind::Roles]);
        opts.personas = vec!["Astronaut".into()];
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            opts,
        );
        let err = runner.plan().unwrap_err();
        assert!(err.to_string().contains("Unknown persona 'Astronaut'"));
    }

    #[tokio::test]
    async fn test_suite_runs_in_one_released_session() {
        let config = Config::default();
        let provider = CountingProvider::new();
        let connector = ScriptedConnector::new(coming_soon_page);
        let emitter = EventEmitter::default();
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            options(&[SuiteKind::ComingSoon]),
        );

        let run = runner.run().await.unwrap();
        let suite = &run.suites[0];
        assert_eq!(suite.status, SuiteStatus::Passed);
        assert_eq!(suite.session_id.as_deref(), Some("session-1"));
        assert_eq!(suite.checks.len(), 2);
        assert_eq!(connector.endpoints(), vec!["ws://localhost:9222/session-1"]);
        assert_eq!(connector.closed(), vec!["ws://localhost:9222/session-1"]);
        assert_eq!(provider.destroyed(), vec!["session-1".to_string()]);
        assert!(run.summary().is_success());
    }

    fn panicking_page() -> ScriptedPage {
        coming_soon_page().panicking_on_navigate()
    }

    #[tokio::test]
    async fn test_panicking_suite_still_closes_page_and_session() {
        let config = Config::default();
        let provider = CountingProvider::new();
        let connector = ScriptedConnector::new(panicking_page);
        let emitter = EventEmitter::default();
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            options(&[SuiteKind::ComingSoon]),
        );

        let outcome = AssertUnwindSafe(runner.run()).catch_unwind().await;
        assert!(outcome.is_err());
        assert_eq!(connector.closed(), vec!["ws://localhost:9222/session-1"]);
        assert_eq!(provider.destroyed(), vec!["session-1".to_string()]);
    }

    #[tokio::test]
    async fn test_provisioning_failure_fails_suite_and_continues() {
        let config = Config::default();
        let provider = CountingProvider::failing();
        let connector = ScriptedConnector::new(coming_soon_page);
        let emitter = EventEmitter::default();
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            options(&[SuiteKind::ComingSoon, SuiteKind::Avatars]),
        );

        let run = runner.run().await.unwrap();
        assert_eq!(run.suites.len(), 2);
        for suite in &run.suites {
            assert_eq!(suite.status, SuiteStatus::Failed);
            assert!(suite.checks.is_empty());
            let error = suite.error.as_deref().unwrap();
            assert!(error.starts_with("Failed to create session"), "{}", error);
        }
        assert!(connector.endpoints().is_empty());
        assert!(provider.destroyed().is_empty());
        assert_eq!(run.summary().failed_suites, 2);
    }

    #[tokio::test]
    async fn test_connect_failure_still_releases_session() {
        let config = Config::default();
        let provider = CountingProvider::new();
        let connector = ScriptedConnector::refusing();
        let emitter = EventEmitter::default();
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            options(&[SuiteKind::Signup]),
        );

        let run = runner.run().await.unwrap();
        let suite = &run.suites[0];
        assert_eq!(suite.status, SuiteStatus::Failed);
        assert_eq!(suite.session_id.as_deref(), Some("session-1"));
        assert_eq!(provider.destroyed(), vec!["session-1".to_string()]);
    }

    #[tokio::test]
    async fn test_stop_flag_skips_remaining_suites() {
        let config = Config::default();
        let provider = CountingProvider::new();
        let connector = ScriptedConnector::new(coming_soon_page);
        let (emitter, mut rx) = EventEmitter::new();
        let runner = Runner::new(
            &config,
            ScenarioCatalog::builtin(),
            &provider,
            &connector,
            &emitter,
            options(&[SuiteKind::ComingSoon, SuiteKind::Avatars]),
        );
        runner.stop_flag().store(true, Ordering::SeqCst);

        let run = runner.run().await.unwrap();
        assert!(run
            .suites
            .iter()
            .all(|s| s.status == SuiteStatus::Skipped));
        assert_eq!(provider.created(), 0);

        let mut finished = 0;
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::SuiteFinished { status, .. } = event {
                assert_eq!(status, SuiteStatus::Skipped);
                finished += 1;
            }
        }
        assert_eq!(finished, 2);
    }
}
