//! The suites a run can execute, one remote session each

use super::avatars::{self, AvatarLoad};
use super::checks::{body_text, ensure, expect_body_contains, expect_present, CheckFailure, CheckResult, SuiteRun};
use super::state::CheckDetails;
use crate::catalog::{ScenarioEntry, UseCase};
use crate::detect::{await_greeting, chat_input_candidates, ResponseDetector};
use crate::driver::common::preview;
use crate::driver::{PageDriver, Selector};
use crate::flow::{locators, pick_assistant_name, FlowNavigator, FlowState, NavigationRequest, Overrides};
use crate::verify::{self, MatchPolicy};

/// Avatars each prefix must have
const MIN_AVATARS_PER_PREFIX: usize = 15;
const AVATAR_LOAD_COUNT: u32 = 20;
const AVATAR_DIMENSION_COUNT: u32 = 15;
const AVATAR_LOAD_TIMEOUT_MS: u64 = 5000;

/// Walk the onboarding one checkpoint at a time and assert every screen
pub async fn signup(run: &mut SuiteRun<'_>) {
    let page = run.page;
    let catalog = run.catalog;
    let overrides = Overrides {
        assistant_name: pick_assistant_name(catalog.assistant_names()),
        ..Overrides::default()
    };
    let mut nav = FlowNavigator::new(page, run.config, overrides);

    let idx = run.begin("Landing page shows the email form");
    let result: CheckResult = async {
        nav.open_landing().await?;
        expect_present(page, &Selector::css(locators::EMAIL_INPUT), "Email input").await?;
        expect_present(page, &locators::continue_button(), "Continue button").await?;
        expect_present(page, &Selector::css(locators::TERMS_LINK), "Terms of Service link").await?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Email leads to password creation");
    let result: CheckResult = async {
        nav.advance_to(FlowState::CredentialsEntered).await?;
        expect_present(page, &Selector::css(locators::PASSWORD_INPUT), "Password input").await?;
        expect_body_contains(&body_text(page).await?, &["Create your password"])?;
        expect_present(page, &Selector::button("Back"), "Back button").await?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Password leads to workspace naming");
    let result: CheckResult = async {
        nav.advance_to(FlowState::SecretEntered).await?;
        expect_body_contains(&body_text(page).await?, &["Name your workspace"])?;
        expect_present(page, &Selector::css(locators::TEXT_INPUT), "Workspace input").await?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Workspace leads to role selection");
    let result: CheckResult = async {
        nav.advance_to(FlowState::WorkspaceNamed).await?;
        let body = body_text(page).await?;
        expect_body_contains(&body, &["Tell us about yourself", "What's your role?"])?;
        expect_body_contains(&body, catalog.user_roles())?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Role leads to persona selection");
    let result: CheckResult = async {
        nav.advance_to(FlowState::RoleChosen).await?;
        let body = body_text(page).await?;
        expect_body_contains(&body, &["Choose your AI Employee"])?;
        let active: Vec<&str> = catalog.personas().iter().map(|p| p.name.as_str()).collect();
        expect_body_contains(&body, &active)?;
        expect_body_contains(&body, catalog.coming_soon())?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Persona leads to personalization");
    let result: CheckResult = async {
        nav.advance_to(FlowState::AssistantChosen).await?;
        expect_body_contains(&body_text(page).await?, &["Personalize your AI", "Male", "Female"])?;
        expect_present(page, &Selector::css(locators::AVATAR_IMAGE), "Avatar image").await?;
        nav.advance_to(FlowState::Personalized).await?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Back returns to persona selection");
    let result: CheckResult = async {
        expect_present(page, &locators::back_control(), "Back control").await?;
        nav.back().await?;
        expect_body_contains(&body_text(page).await?, &["Choose your AI Employee"])?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;
}

/// Onboard with one persona and check its replies to every use case
pub async fn persona(run: &mut SuiteRun<'_>, persona: &ScenarioEntry) {
    let page = run.page;
    let config = run.config;

    let idx = run.begin(&format!("Chat opens after choosing {}", persona.name));
    let result: CheckResult = async {
        let request = NavigationRequest::to(FlowState::Conversational).with_overrides(Overrides {
            persona: Some(persona.name.clone()),
            ..Overrides::default()
        });
        let nav = FlowNavigator::run(page, config, request).await?;
        let url = page.current_url().await.unwrap_or_default();
        run.log(format!("URL after onboarding ({}): {}", nav.state(), url));

        let greeting = await_greeting(page, &config.greeting).await;
        run.log(format!("Greeting: {}", preview(greeting.trim(), 300)));

        let input = Selector::AnyOf(chat_input_candidates());
        let found = page.exists(&input).await?;
        page.sleep(config.greeting.settle_ms).await;
        ensure(found, format!("Chat input should exist for {}", persona.name))?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    for use_case in &persona.use_cases {
        let idx = run.begin(&use_case.name);
        let result = use_case_check(run, persona, use_case).await;
        run.end(idx, result).await;
    }
}

async fn use_case_check(run: &SuiteRun<'_>, persona: &ScenarioEntry, use_case: &UseCase) -> CheckResult {
    let config = run.config;
    let policy = if run.options.strict {
        MatchPolicy::Strict
    } else {
        use_case.policy
    };

    let reply = ResponseDetector::new(run.page, &config.detector)
        .await_response(&use_case.prompt)
        .await?;

    let text = reply.text.as_str();
    let response_len = text.chars().count();
    run.log(format!("[{}] {}", persona.name, use_case.name));
    run.log(format!("Prompt: {}...", preview(&use_case.prompt, 80)));
    run.log(format!(
        "Response length: {} chars after {} poll(s){}",
        response_len,
        reply.attempts,
        if reply.timed_out { " (timed out)" } else { "" }
    ));
    run.log(format!("Response preview: {}", preview(text, 300)));

    let result = verify::score(text, &use_case.expected_keywords, policy);
    run.log(result.summary());

    let details = CheckDetails {
        matched: result.matched.clone(),
        missed: result.missed.clone(),
        required: result.required,
        policy: policy.to_string(),
        response_len,
        attempts: reply.attempts,
        timed_out: reply.timed_out,
        preview: preview(text, config.preview_chars),
    };

    if response_len <= config.min_response_chars {
        return Err(CheckFailure::new(format!(
            "AI should respond with substantial text (got {} chars)",
            response_len
        ))
        .with_details(details));
    }
    if !result.passed {
        return Err(CheckFailure::new(format!(
            "Should match >= {}/{} keywords ({}). {}. Response: {}",
            result.required,
            use_case.expected_keywords.len(),
            policy,
            result.summary(),
            preview(text, config.preview_chars)
        ))
        .with_details(details));
    }
    Ok(Some(details))
}

/// Coming-soon personas are listed but cannot be picked
pub async fn coming_soon(run: &mut SuiteRun<'_>) {
    let page = run.page;
    let catalog = run.catalog;
    let config = run.config;
    let mut nav = FlowNavigator::new(page, config, Overrides::default());

    let idx = run.begin("Coming soon personas are visible");
    let result: CheckResult = async {
        nav.advance_to(FlowState::RoleChosen).await?;
        expect_body_contains(&body_text(page).await?, catalog.coming_soon())?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;

    let idx = run.begin("Coming soon cards are not selectable");
    let card = Selector::css(locators::COMING_SOON_CARD);
    let count = page.read_all_texts(&card).await.map(|t| t.len()).unwrap_or(0);
    run.log(format!("Found {} Coming Soon cards", count));
    let result: CheckResult = async {
        if count == 0 {
            return Ok(None);
        }
        page.click_nth(&card, 0).await?;
        page.sleep(config.settle.after_pick_ms).await;
        let selected = page
            .evaluate_on(&card, "el => el.classList.contains('selected')")
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        ensure(!selected, "Coming Soon cards should not get selected")?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;
}

/// Avatar images exist, are consistently sized, and render during onboarding
pub async fn avatars(run: &mut SuiteRun<'_>) {
    let page = run.page;
    let config = run.config;
    let prefixes = run.catalog.avatar_prefixes().to_vec();

    let idx = run.begin("Avatar images load");
    let loads = async {
        let mut nav = FlowNavigator::new(page, config, Overrides::default());
        nav.open_landing().await.map_err(CheckFailure::from)?;
        load_avatars(page, &prefixes, AVATAR_LOAD_COUNT).await
    }
    .await;
    let result: CheckResult = match loads {
        Ok(loads) => {
            let summary = avatars::summarize(&prefixes, &loads);
            let loaded = loads.iter().filter(|p| p.ok).count();
            run.log(format!(
                "Checked {} avatars: {} loaded, {} failed",
                loads.len(),
                loaded,
                loads.len() - loaded
            ));
            for s in &summary {
                let range = s
                    .range
                    .map(|(lo, hi)| format!("{}-{}", lo, hi))
                    .unwrap_or_else(|| "none".to_string());
                run.log(format!("{}: {} images (range: {})", s.prefix, s.loaded, range));
            }
            for p in loads.iter().filter(|p| !p.ok) {
                run.log(format!(
                    "Failed: {}{}",
                    p.url,
                    if p.timed_out { " (timeout)" } else { "" }
                ));
            }
            let short: Vec<String> = summary
                .iter()
                .filter(|s| s.loaded < MIN_AVATARS_PER_PREFIX)
                .map(|s| format!("{} ({})", s.prefix, s.loaded))
                .collect();
            ensure(
                short.is_empty(),
                format!(
                    "Each prefix should have at least {} images: {}",
                    MIN_AVATARS_PER_PREFIX,
                    short.join(", ")
                ),
            )
            .map(|_| None)
        }
        Err(e) => Err(e),
    };
    run.end(idx, result).await;

    // Reported only; mixed sizes do not fail the run
    let idx = run.begin("Avatar dimensions per prefix");
    let result: CheckResult = match load_avatars(page, &prefixes, AVATAR_DIMENSION_COUNT).await {
        Ok(loads) => {
            for s in avatars::summarize(&prefixes, &loads) {
                let dims: Vec<&str> = s.dimensions.iter().map(String::as_str).collect();
                let marker = if s.is_consistent() { "" } else { " (inconsistent)" };
                run.log(format!(
                    "{}: {} unique dimension(s): {}{}",
                    s.prefix,
                    dims.len(),
                    dims.join(", "),
                    marker
                ));
            }
            Ok(None)
        }
        Err(e) => Err(e),
    };
    run.end(idx, result).await;

    let idx = run.begin("Personalization avatar renders");
    let result: CheckResult = async {
        // Fresh navigator: starts over from the landing page
        let mut nav = FlowNavigator::new(page, config, Overrides::default());
        nav.advance_to(FlowState::AssistantChosen).await?;

        let img = Selector::css(locators::AVATAR_IMAGE);
        let src = page.attribute(&img, "src").await?;
        ensure(src.is_some(), "Avatar image element should exist on personalization page")?;
        run.log(format!("Personalization page shows: {}", src.unwrap_or_default()));

        let size = page
            .evaluate_on(&img, avatars::NATURAL_SIZE_SCRIPT)
            .await?
            .unwrap_or_default();
        let width = size.get("w").and_then(|v| v.as_u64()).unwrap_or(0);
        let height = size.get("h").and_then(|v| v.as_u64()).unwrap_or(0);
        run.log(format!("Image dimensions: {}x{}", width, height));
        ensure(width > 0, "Avatar image should have loaded (naturalWidth > 0)")?;
        Ok::<_, CheckFailure>(None)
    }
    .await;
    run.end(idx, result).await;
}

async fn load_avatars(
    page: &dyn PageDriver,
    prefixes: &[String],
    count: u32,
) -> Result<Vec<AvatarLoad>, CheckFailure> {
    let value = page
        .evaluate(
            avatars::LOAD_SCRIPT,
            avatars::load_arg(prefixes, count, AVATAR_LOAD_TIMEOUT_MS),
        )
        .await?;
    serde_json::from_value(value)
        .map_err(|e| CheckFailure::new(format!("Unexpected avatar load result: {}", e)))
}
