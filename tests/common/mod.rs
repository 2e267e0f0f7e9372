//! Shared test harness: the orchestrator wired to the in-memory mocks.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use bankauth::mocks::{
    MockAuditSink, MockMfaStore, MockNotifier, MockSessionCache, MockSessionRepository,
    MockTokenIssuer, MockUserDirectory,
};
use bankauth::state::{AccountStatus, UserId, UserRecord};
use bankauth::{AuthConfig, AuthOrchestrator, LoginOutcome};
use std::net::{IpAddr, Ipv4Addr};

pub type TestOrchestrator = AuthOrchestrator<
    MockUserDirectory,
    MockNotifier,
    MockAuditSink,
    MockTokenIssuer,
    MockSessionRepository,
    MockSessionCache,
    MockMfaStore,
>;

pub struct Harness {
    pub orchestrator: TestOrchestrator,
    pub directory: MockUserDirectory,
    pub notifier: MockNotifier,
    pub audit: MockAuditSink,
    pub tokens: MockTokenIssuer,
    pub repo: MockSessionRepository,
    pub cache: MockSessionCache,
    pub mfa_store: MockMfaStore,
}

/// Low bcrypt cost keeps the suite fast; production stays at 12.
pub fn test_config() -> AuthConfig {
    AuthConfig {
        bcrypt_cost: 4,
        ..AuthConfig::default()
    }
}

pub fn harness_with_config(config: AuthConfig) -> Harness {
    let directory = MockUserDirectory::new();
    let notifier = MockNotifier::new();
    let audit = MockAuditSink::new();
    let tokens = MockTokenIssuer::new();
    let repo = MockSessionRepository::new();
    let cache = MockSessionCache::new();
    let mfa_store = MockMfaStore::new();

    let orchestrator = AuthOrchestrator::new(
        directory.clone(),
        notifier.clone(),
        audit.clone(),
        tokens.clone(),
        repo.clone(),
        cache.clone(),
        mfa_store.clone(),
        config,
    )
    .expect("Failed to build orchestrator");

    Harness {
        orchestrator,
        directory,
        notifier,
        audit,
        tokens,
        repo,
        cache,
        mfa_store,
    }
}

pub fn harness() -> Harness {
    harness_with_config(test_config())
}

pub fn seed_user(harness: &Harness, email: &str, password: &str, mfa_enabled: bool) -> UserId {
    let user_id = UserId::new();
    let password_hash = bcrypt::hash(password, 4).expect("Failed to hash test password");

    harness
        .directory
        .insert_user(UserRecord {
            user_id,
            email: email.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            password_hash,
            mfa_enabled,
            status: AccountStatus::Active,
            last_login: None,
        })
        .expect("Failed to seed user");

    user_id
}

pub fn client_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7))
}

pub async fn login(
    harness: &Harness,
    email: &str,
    password: &str,
) -> bankauth::Result<LoginOutcome> {
    harness
        .orchestrator
        .login(
            email,
            password,
            client_ip(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
            None,
            None,
        )
        .await
}
