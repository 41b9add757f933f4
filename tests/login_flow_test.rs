//! Login state machine integration tests against a scripted page.

mod common;

use std::sync::Arc;

use common::{FakePage, APP_URL, SIGNIN_URL};
use proofloop::domain::models::{Credentials, LoginConfig, LoginFailure};
use proofloop::services::LoginStateMachine;

fn fast_config(max_retries: u32) -> LoginConfig {
    LoginConfig {
        max_retries,
        base_backoff_ms: 2_000,
        max_backoff_ms: 30_000,
        settle_delay_ms: 10,
    }
}

fn credentials() -> Credentials {
    Credentials::new("user@example.com", "s3cr3t-hunter2")
}

#[tokio::test(start_paused = true)]
async fn unclassified_failure_retries_and_succeeds() {
    let page = Arc::new(FakePage::at(APP_URL));
    // First submission leaves the page on the sign-in URL; the second
    // redirects into the app.
    page.urls_after_login_submit
        .lock()
        .unwrap()
        .extend([None, Some(APP_URL.to_string())]);
    // The verification probe after the successful attempt sees an avatar.
    page.push_auth_response(true);

    let machine = LoginStateMachine::new(page.as_ref(), fast_config(1), SIGNIN_URL);
    let result = machine.run(&credentials()).await;

    assert!(result.success, "expected success, got {result:?}");
    // Exactly two full attempts ran: two sign-in submissions, two
    // verification passes.
    assert_eq!(page.login_submit_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn classified_failure_suppresses_retry() {
    let page = Arc::new(FakePage::at(SIGNIN_URL));
    page.urls_after_login_submit.lock().unwrap().push_back(None);
    page.failure_observations.lock().unwrap().push(
        proofloop::domain::ports::ObservedElement::described("Incorrect email or password"),
    );

    // Even with a generous retry budget, a classified failure is terminal.
    let machine = LoginStateMachine::new(page.as_ref(), fast_config(2), SIGNIN_URL);
    let result = machine.run(&credentials()).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(LoginFailure::InvalidCredentials));
    assert_eq!(page.login_submit_count(), 1, "no retry may happen");
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_yield_generic_error() {
    let page = Arc::new(FakePage::at(SIGNIN_URL));
    // Every submission fails unclassified; budget is 1 retry.
    let machine = LoginStateMachine::new(page.as_ref(), fast_config(1), SIGNIN_URL);
    let result = machine.run(&credentials()).await;

    assert!(!result.success);
    assert_eq!(result.failure, None);
    assert_eq!(
        result.error.as_deref(),
        Some("Login failed after all retry attempts")
    );
    assert_eq!(page.login_submit_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn password_never_reaches_an_instruction() {
    let page = Arc::new(FakePage::at(SIGNIN_URL));
    page.urls_after_login_submit
        .lock()
        .unwrap()
        .push_back(Some(APP_URL.to_string()));
    page.push_auth_response(true);

    let creds = credentials();
    let machine = LoginStateMachine::new(page.as_ref(), fast_config(1), SIGNIN_URL);
    let result = machine.run(&creds).await;
    assert!(result.success);

    // The password went through the direct fill path...
    let fills = page.fill_log.lock().unwrap().clone();
    assert!(
        fills
            .iter()
            .any(|(selector, value)| selector.contains("password") && value == &creds.password),
        "password fill missing from {fills:?}"
    );

    // ...and through nothing else: no observation query and no fallback
    // instruction may contain it.
    for instruction in page.all_instructions() {
        assert!(
            !instruction.contains(&creds.password),
            "password leaked into instruction: {instruction:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn visible_password_field_is_filled_without_waiting() {
    let page = Arc::new(FakePage::at(SIGNIN_URL));
    page.mark_visible(r#"input[type="password"]"#);
    page.urls_after_login_submit
        .lock()
        .unwrap()
        .push_back(Some(APP_URL.to_string()));
    page.push_auth_response(true);

    let creds = credentials();
    let machine = LoginStateMachine::new(page.as_ref(), fast_config(0), SIGNIN_URL);
    let result = machine.run(&creds).await;
    assert!(result.success);

    // Whether or not the field needed a settle period first, the fill
    // goes through the structural selector and nothing else.
    let fills = page.fill_log.lock().unwrap().clone();
    assert!(fills.contains(&(r#"input[type="password"]"#.to_string(), creds.password.clone())));
}

#[tokio::test(start_paused = true)]
async fn email_uses_first_visible_structural_locator() {
    let page = Arc::new(FakePage::at(SIGNIN_URL));
    page.mark_visible(r#"input[type="email"]"#);
    page.urls_after_login_submit
        .lock()
        .unwrap()
        .push_back(Some(APP_URL.to_string()));
    page.push_auth_response(true);

    let creds = credentials();
    let machine = LoginStateMachine::new(page.as_ref(), fast_config(0), SIGNIN_URL);
    let result = machine.run(&creds).await;
    assert!(result.success);

    let fills = page.fill_log.lock().unwrap().clone();
    assert!(fills.contains(&(r#"input[type="email"]"#.to_string(), creds.username.clone())));
    // With a visible structural locator, the username stays out of
    // fallback instructions too.
    for instruction in page.all_instructions() {
        assert!(!instruction.contains(&creds.username));
    }
}

#[tokio::test(start_paused = true)]
async fn email_fallback_instruction_used_as_last_resort() {
    let page = Arc::new(FakePage::at(SIGNIN_URL));
    page.urls_after_login_submit
        .lock()
        .unwrap()
        .push_back(Some(APP_URL.to_string()));
    page.push_auth_response(true);

    let creds = credentials();
    let machine = LoginStateMachine::new(page.as_ref(), fast_config(0), SIGNIN_URL);
    let result = machine.run(&creds).await;
    assert!(result.success);

    // No locator was visible, so the username travels in an instruction;
    // the password still must not.
    let instructions = page.all_instructions();
    assert!(instructions.iter().any(|i| i.contains(&creds.username)));
    assert!(instructions.iter().all(|i| !i.contains(&creds.password)));
}
