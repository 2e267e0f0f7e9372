//! MFA code tests.
//!
//! Covers the single-flight property (a new code kills the old one),
//! replay protection, both lockout windows and the delivery-failure
//! policies.

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use bankauth::config::DeliveryFailurePolicy;
use bankauth::mocks::{MockMfaStore, MockNotifier};
use bankauth::providers::MfaStore;
use bankauth::state::{AccountStatus, UserRecord};
use bankauth::{AuthError, LoginOutcome, MfaCodeManager, SessionId, UserId};
use chrono::Duration;
use common::{client_ip, harness, harness_with_config, login, seed_user, test_config, Harness};

async fn pending_login(harness: &Harness, email: &str) -> (UserId, SessionId, String) {
    let user_id = seed_user(harness, email, "correct horse", true);
    let LoginOutcome::MfaRequired { session_id, .. } = login(harness, email, "correct horse")
        .await
        .expect("Login succeeds")
    else {
        panic!("Expected a pending login");
    };
    let code = harness
        .notifier
        .last_code()
        .expect("Notifier readable")
        .expect("A code was delivered");
    (user_id, session_id, code)
}

/// Any six-digit string other than the given one.
fn wrong_code(code: &str) -> &'static str {
    if code == "000000" {
        "111111"
    } else {
        "000000"
    }
}

#[tokio::test]
async fn test_resend_replaces_the_previous_code() {
    let harness = harness();
    let (_, session_id, first_code) = pending_login(&harness, "jane@example.com").await;

    harness
        .orchestrator
        .resend_mfa(&session_id, Some(client_ip()))
        .await
        .expect("Resend succeeds");
    let mut second_code = harness
        .notifier
        .last_code()
        .expect("Notifier readable")
        .expect("A second code was delivered");
    if second_code == first_code {
        // Random six-digit collision; burn the last resend to get a
        // distinct code.
        harness
            .orchestrator
            .resend_mfa(&session_id, None)
            .await
            .expect("Resend succeeds");
        second_code = harness
            .notifier
            .last_code()
            .expect("Notifier readable")
            .expect("A third code was delivered");
    }

    // The first code died the moment the second was issued
    let denied = harness
        .orchestrator
        .verify_mfa(&session_id, &first_code, None)
        .await;
    assert!(matches!(denied, Err(AuthError::CodeMismatch)));

    // The latest code completes the login
    harness
        .orchestrator
        .verify_mfa(&session_id, &second_code, None)
        .await
        .expect("Latest code verifies");
}

#[tokio::test]
async fn test_a_verified_code_cannot_be_replayed() {
    let store = MockMfaStore::new();
    let notifier = MockNotifier::new();
    let manager = MfaCodeManager::new(store, notifier.clone(), test_config());

    let user = UserRecord {
        user_id: UserId::new(),
        email: "jane@example.com".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        password_hash: String::new(),
        mfa_enabled: true,
        status: AccountStatus::Active,
        last_login: None,
    };

    manager.issue(&user).await.expect("Issue succeeds");
    let code = notifier
        .last_code()
        .expect("Notifier readable")
        .expect("A code was delivered");

    manager
        .verify(user.user_id, &code)
        .await
        .expect("First verification succeeds");

    // The challenge was consumed; the same code is dead
    let replay = manager.verify(user.user_id, &code).await;
    assert!(matches!(replay, Err(AuthError::CodeExpired)));
}

#[tokio::test]
async fn test_resend_window_locks_out() {
    let harness = harness();
    let (_, session_id, _) = pending_login(&harness, "jane@example.com").await;

    // The login-time issue is free; the full budget of 3 resends remains
    for attempt in 1..=3 {
        harness
            .orchestrator
            .resend_mfa(&session_id, None)
            .await
            .unwrap_or_else(|e| panic!("Resend {attempt} should succeed, got {e:?}"));
    }

    let locked = harness
        .orchestrator
        .resend_mfa(&session_id, Some(client_ip()))
        .await;
    assert!(matches!(locked, Err(AuthError::TooManyAttempts { .. })));

    let actions = harness.audit.actions().expect("Audit readable");
    assert!(actions.iter().any(|a| a == "MFA_LOCKOUT"));
    assert_eq!(harness.notifier.code_count().expect("Notifier readable"), 4);
}

#[tokio::test]
async fn test_repeated_logins_are_not_resend_throttled() {
    let harness = harness();
    seed_user(&harness, "jane@example.com", "correct horse", true);

    // Abandoning the pending login and starting over issues a fresh
    // code every time; only explicit resends count against the window.
    for attempt in 1..=5 {
        let outcome = login(&harness, "jane@example.com", "correct horse")
            .await
            .unwrap_or_else(|e| panic!("Login {attempt} should succeed, got {e:?}"));
        assert!(matches!(outcome, LoginOutcome::MfaRequired { .. }));
    }
}

#[tokio::test]
async fn test_failure_window_locks_out_even_the_correct_code() {
    let harness = harness();
    let (_, session_id, code) = pending_login(&harness, "jane@example.com").await;

    for _ in 0..5 {
        let denied = harness
            .orchestrator
            .verify_mfa(&session_id, wrong_code(&code), Some(client_ip()))
            .await;
        assert!(matches!(denied, Err(AuthError::CodeMismatch)));
    }

    // Five failures in the window: even the right code is refused now
    let locked = harness
        .orchestrator
        .verify_mfa(&session_id, &code, Some(client_ip()))
        .await;
    assert!(matches!(locked, Err(AuthError::TooManyAttempts { .. })));

    let actions = harness.audit.actions().expect("Audit readable");
    assert!(actions.iter().any(|a| a == "MFA_FAILED"));
    assert!(actions.iter().any(|a| a == "MFA_LOCKOUT"));
}

#[tokio::test]
async fn test_a_wrong_code_does_not_consume_the_challenge() {
    let harness = harness();
    let (_, session_id, code) = pending_login(&harness, "jane@example.com").await;

    let denied = harness
        .orchestrator
        .verify_mfa(&session_id, wrong_code(&code), None)
        .await;
    assert!(matches!(denied, Err(AuthError::CodeMismatch)));

    harness
        .orchestrator
        .verify_mfa(&session_id, &code, None)
        .await
        .expect("Correct code still verifies after a miss");
}

#[tokio::test]
async fn test_delivery_failure_discards_the_code() {
    let harness = harness();
    let user_id = seed_user(&harness, "jane@example.com", "correct horse", true);
    harness.notifier.set_failing(true);

    let failed = login(&harness, "jane@example.com", "correct horse").await;
    assert!(matches!(failed, Err(AuthError::EmailDeliveryFailed)));

    // An undelivered code must not remain verifiable
    let stored = harness
        .mfa_store
        .get_code(user_id)
        .await
        .expect("Store readable");
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_log_only_policy_keeps_the_code_live() {
    let config = bankauth::AuthConfig {
        delivery_failure: DeliveryFailurePolicy::LogOnly,
        ..test_config()
    };
    let harness = harness_with_config(config);
    let user_id = seed_user(&harness, "jane@example.com", "correct horse", true);
    harness.notifier.set_failing(true);

    let LoginOutcome::MfaRequired { session_id, .. } =
        login(&harness, "jane@example.com", "correct horse")
            .await
            .expect("Login succeeds despite the delivery failure")
    else {
        panic!("Expected a pending login");
    };

    // The challenge stayed live and verifies normally
    let code = harness
        .mfa_store
        .get_code(user_id)
        .await
        .expect("Store readable")
        .expect("Code kept per policy");
    harness
        .orchestrator
        .verify_mfa(&session_id, &code, None)
        .await
        .expect("Code verifies");
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let config = bankauth::AuthConfig {
        mfa_code_ttl: Duration::seconds(1),
        ..test_config()
    };
    let harness = harness_with_config(config);
    let (_, session_id, code) = pending_login(&harness, "jane@example.com").await;

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let expired = harness
        .orchestrator
        .verify_mfa(&session_id, &code, None)
        .await;
    assert!(matches!(expired, Err(AuthError::CodeExpired)));
}

#[tokio::test]
async fn test_verify_against_a_completed_session_is_rejected() {
    let harness = harness();
    let (_, session_id, code) = pending_login(&harness, "jane@example.com").await;

    harness
        .orchestrator
        .verify_mfa(&session_id, &code, None)
        .await
        .expect("Verification succeeds");

    // The session is no longer pending; a second verify has nothing to do
    let replay = harness
        .orchestrator
        .verify_mfa(&session_id, &code, None)
        .await;
    assert!(matches!(replay, Err(AuthError::SessionNotFound)));
}
