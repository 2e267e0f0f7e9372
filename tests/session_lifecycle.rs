//! Session lifecycle tests.
//!
//! Covers expiry, token refresh, bulk revocation, the read-through cache
//! (fail-open reads, eviction on revocation) and the retention sweep.

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use bankauth::providers::{SessionCache, SessionRepository};
use bankauth::state::CachedSession;
use bankauth::{AuthError, LoginOutcome};
use chrono::{Duration, Utc};
use common::{client_ip, harness, harness_with_config, login, seed_user, test_config, Harness};

async fn live_session(harness: &Harness) -> (bankauth::SessionId, bankauth::TokenPair) {
    seed_user(harness, "jane@example.com", "correct horse", false);
    let LoginOutcome::Complete { session, tokens, .. } =
        login(harness, "jane@example.com", "correct horse")
            .await
            .expect("Login succeeds")
    else {
        panic!("Expected a complete login");
    };
    (session.session_id, tokens)
}

#[tokio::test]
async fn test_session_expires_after_its_lifetime() {
    let config = bankauth::AuthConfig {
        session_lifetime: Duration::seconds(1),
        ..test_config()
    };
    let harness = harness_with_config(config);
    let (session_id, _) = live_session(&harness).await;

    harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("Session authorizes within its lifetime");

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let denied = harness.orchestrator.authorize(&session_id).await;
    assert!(matches!(denied, Err(AuthError::SessionExpired)));
}

#[tokio::test]
async fn test_expired_cache_entry_revokes_the_session() {
    let harness = harness();
    let (session_id, _) = live_session(&harness).await;

    // Plant a cache entry whose recorded expiry is already in the past
    // but whose TTL has not run out, as clock skew would produce.
    let stale = CachedSession {
        user_id: bankauth::UserId::new(),
        ip_address: client_ip(),
        expires_at: Utc::now() - Duration::seconds(5),
        mfa_verified: true,
        created_at: Utc::now() - Duration::hours(1),
    };
    harness
        .cache
        .put(&session_id, &stale, 600)
        .await
        .expect("Cache put succeeds");

    let denied = harness.orchestrator.authorize(&session_id).await;
    assert!(matches!(denied, Err(AuthError::SessionExpired)));

    // The durable row was revoked, not just the cache entry
    let row = harness
        .repo
        .fetch(&session_id)
        .await
        .expect("Repo readable")
        .expect("Row still present");
    assert!(!row.is_active);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let harness = harness();
    let (session_id, original) = live_session(&harness).await;

    let (descriptor, rotated) = harness
        .orchestrator
        .refresh(&session_id, &original.refresh_token, Some(client_ip()))
        .await
        .expect("Refresh with the stored token succeeds");

    assert_eq!(descriptor.session_id, session_id);
    assert_ne!(rotated.access_token, original.access_token);
    assert_ne!(rotated.refresh_token, original.refresh_token);

    // The rotated-out access token was sent for revocation
    let invalidated = harness.tokens.invalidated().expect("Tokens readable");
    assert!(invalidated.contains(&original.access_token));

    // The old refresh token is single-use
    let replay = harness
        .orchestrator
        .refresh(&session_id, &original.refresh_token, None)
        .await;
    assert!(matches!(replay, Err(AuthError::RefreshTokenInvalid)));

    // The new one keeps working
    harness
        .orchestrator
        .refresh(&session_id, &rotated.refresh_token, None)
        .await
        .expect("Refresh with the rotated token succeeds");
}

#[tokio::test]
async fn test_refresh_with_wrong_token_is_rejected_and_audited() {
    let harness = harness();
    let (session_id, tokens) = live_session(&harness).await;

    let denied = harness
        .orchestrator
        .refresh(&session_id, "not-the-refresh-token", Some(client_ip()))
        .await;
    assert!(matches!(denied, Err(AuthError::RefreshTokenInvalid)));

    let actions = harness.audit.actions().expect("Audit readable");
    assert!(actions.iter().any(|a| a == "REFRESH_REJECTED"));

    // The session itself is untouched
    harness
        .orchestrator
        .refresh(&session_id, &tokens.refresh_token, None)
        .await
        .expect("Stored token still refreshes");
}

#[tokio::test]
async fn test_logout_all_spares_the_current_session() {
    let harness = harness();
    let user_id = seed_user(&harness, "jane@example.com", "correct horse", false);

    let mut session_ids = Vec::new();
    for _ in 0..3 {
        let LoginOutcome::Complete { session, .. } =
            login(&harness, "jane@example.com", "correct horse")
                .await
                .expect("Login succeeds")
        else {
            panic!("Expected a complete login");
        };
        session_ids.push(session.session_id);
    }

    let current = session_ids[2].clone();
    let ended = harness
        .orchestrator
        .logout_all(user_id, Some(&current), Some(client_ip()))
        .await
        .expect("Bulk logout succeeds");
    assert_eq!(ended, 2);

    for other in &session_ids[..2] {
        let denied = harness.orchestrator.authorize(other).await;
        assert!(matches!(denied, Err(AuthError::SessionNotFound)));
    }
    harness
        .orchestrator
        .authorize(&current)
        .await
        .expect("Current session survives");

    let actions = harness.audit.actions().expect("Audit readable");
    assert!(actions.iter().any(|a| a == "LOGOUT_ALL"));
}

#[tokio::test]
async fn test_validation_survives_a_cache_outage() {
    let harness = harness();
    let (session_id, _) = live_session(&harness).await;

    harness.cache.set_failing(true);

    // Reads fall through to the durable store
    let descriptor = harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("Validation falls through to the durable store");
    assert!(descriptor.mfa_verified);

    // And keep working once the cache recovers
    harness.cache.set_failing(false);
    harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("Validation works after the cache recovers");
}

#[tokio::test]
async fn test_refresh_survives_a_cache_outage() {
    let harness = harness();
    let (session_id, original) = live_session(&harness).await;

    harness.cache.set_failing(true);

    // The rotation commits durably; the client must receive the new
    // pair even though the old refresh token is already dead.
    let (_, rotated) = harness
        .orchestrator
        .refresh(&session_id, &original.refresh_token, Some(client_ip()))
        .await
        .expect("Refresh succeeds during the cache outage");
    assert_ne!(rotated.refresh_token, original.refresh_token);

    harness.cache.set_failing(false);
    harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("Session authorizes after the cache recovers");
    harness
        .orchestrator
        .refresh(&session_id, &rotated.refresh_token, None)
        .await
        .expect("The rotated token refreshes after the cache recovers");
}

#[tokio::test]
async fn test_mfa_completion_survives_a_cache_outage() {
    let harness = harness();
    seed_user(&harness, "jane@example.com", "correct horse", true);
    let LoginOutcome::MfaRequired { session_id, .. } =
        login(&harness, "jane@example.com", "correct horse")
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

    harness.cache.set_failing(true);

    // The code is consumed and the session flipped durably; the caller
    // must get their tokens, not an error they cannot retry.
    harness
        .orchestrator
        .verify_mfa(&session_id, &code, Some(client_ip()))
        .await
        .expect("Verification succeeds during the cache outage");

    harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("Completed session authorizes via the durable store");
}

/// Cache whose calls never return, as a wedged backend would produce.
#[derive(Clone)]
struct StalledCache;

impl SessionCache for StalledCache {
    async fn put(
        &self,
        _session_id: &bankauth::SessionId,
        _cached: &CachedSession,
        _ttl_secs: u64,
    ) -> bankauth::Result<()> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn get(
        &self,
        _session_id: &bankauth::SessionId,
    ) -> bankauth::Result<Option<CachedSession>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn evict(&self, _session_id: &bankauth::SessionId) -> bankauth::Result<()> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_revocation_is_bounded_when_the_cache_hangs() {
    use bankauth::mocks::MockSessionRepository;
    use bankauth::state::{DeviceInfo, UserId};
    use bankauth::{SessionService, TokenPair};

    let repo = MockSessionRepository::new();
    let service = SessionService::new(repo, StalledCache, test_config());

    let tokens = TokenPair {
        access_token: "at".to_string(),
        refresh_token: "rt".to_string(),
    };
    let session = service
        .create(
            UserId::new(),
            tokens,
            client_ip(),
            "Test".to_string(),
            DeviceInfo::default(),
            true,
        )
        .await
        .expect("Create succeeds despite the hung cache");

    // Ending must fail closed within the cache bound, never hang
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        service.end(&session.session_id),
    )
    .await
    .expect("End returns within the cache bound");
    assert!(matches!(outcome, Err(AuthError::CacheError(_))));

    // The durable row was revoked regardless
    let denied = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        service.validate(&session.session_id),
    )
    .await
    .expect("Validation returns within the cache bound");
    assert!(matches!(denied, Err(AuthError::SessionNotFound)));
}

#[tokio::test]
async fn test_repeated_validation_is_served_from_cache() {
    let harness = harness();
    let (session_id, _) = live_session(&harness).await;

    harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("First validation succeeds");
    harness
        .orchestrator
        .authorize(&session_id)
        .await
        .expect("Second validation succeeds");

    assert!(harness.cache.hit_count() >= 1);
}

#[tokio::test]
async fn test_logout_evicts_the_cache_entry() {
    let harness = harness();
    let (session_id, _) = live_session(&harness).await;

    assert!(harness
        .cache
        .contains(&session_id)
        .expect("Cache readable"));

    harness
        .orchestrator
        .logout(&session_id, None)
        .await
        .expect("Logout succeeds");

    assert!(!harness
        .cache
        .contains(&session_id)
        .expect("Cache readable"));
}

#[tokio::test]
async fn test_short_lived_sessions_are_flagged_expiring_soon() {
    let config = bankauth::AuthConfig {
        session_lifetime: Duration::minutes(30),
        ..test_config()
    };
    let harness = harness_with_config(config);
    let user_id = seed_user(&harness, "jane@example.com", "correct horse", false);
    login(&harness, "jane@example.com", "correct horse")
        .await
        .expect("Login succeeds");

    let sessions = harness
        .orchestrator
        .list_sessions(user_id)
        .await
        .expect("Listing succeeds");
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].is_expiring_soon);
}

#[tokio::test]
async fn test_fresh_sessions_are_not_flagged_expiring_soon() {
    let harness = harness();
    let user_id = seed_user(&harness, "jane@example.com", "correct horse", false);
    login(&harness, "jane@example.com", "correct horse")
        .await
        .expect("Login succeeds");

    let sessions = harness
        .orchestrator
        .list_sessions(user_id)
        .await
        .expect("Listing succeeds");
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].is_expiring_soon);
}

#[tokio::test]
async fn test_flagging_suspicious_does_not_revoke() {
    let harness = harness();
    let user_id = seed_user(&harness, "jane@example.com", "correct horse", false);
    let LoginOutcome::Complete { session, .. } =
        login(&harness, "jane@example.com", "correct horse")
            .await
            .expect("Login succeeds")
    else {
        panic!("Expected a complete login");
    };

    harness
        .orchestrator
        .flag_suspicious(&session.session_id, "login from new country")
        .await
        .expect("Flagging succeeds");

    // Annotation only: the session keeps authorizing
    harness
        .orchestrator
        .authorize(&session.session_id)
        .await
        .expect("Flagged session still authorizes");

    let sessions = harness
        .orchestrator
        .list_sessions(user_id)
        .await
        .expect("Listing succeeds");
    assert!(sessions[0].is_suspicious);

    let actions = harness.audit.actions().expect("Audit readable");
    assert!(actions.iter().any(|a| a == "SESSION_FLAGGED"));
}

#[tokio::test]
async fn test_extend_pushes_the_expiry_out() {
    use bankauth::mocks::{MockSessionCache, MockSessionRepository};
    use bankauth::state::{DeviceInfo, UserId};
    use bankauth::{SessionService, TokenPair};

    let repo = MockSessionRepository::new();
    let cache = MockSessionCache::new();
    let service = SessionService::new(repo, cache, test_config());

    let tokens = TokenPair {
        access_token: "at".to_string(),
        refresh_token: "rt".to_string(),
    };
    let session = service
        .create(
            UserId::new(),
            tokens,
            client_ip(),
            "Test".to_string(),
            DeviceInfo::default(),
            true,
        )
        .await
        .expect("Create succeeds");

    let extended = service
        .extend(&session.session_id)
        .await
        .expect("Extend succeeds");
    assert!(extended.expires_at >= session.expires_at);
    assert_eq!(extended.access_token, "at");

    // An ended session cannot be extended back to life
    service.end(&session.session_id).await.expect("End succeeds");
    let denied = service.extend(&session.session_id).await;
    assert!(matches!(denied, Err(AuthError::SessionNotFound)));
}

#[tokio::test]
async fn test_cleanup_removes_expired_rows() {
    let harness = harness();
    let (session_id, _) = live_session(&harness).await;

    harness
        .repo
        .expire_now(&session_id)
        .expect("Repo writable");

    let removed = harness
        .orchestrator
        .cleanup_expired_sessions()
        .await
        .expect("Cleanup succeeds");
    assert_eq!(removed, 1);
    assert_eq!(harness.repo.row_count().expect("Repo readable"), 0);
}
