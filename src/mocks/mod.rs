//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all
//! provider traits for use in unit and integration tests. They run on
//! the application clock and collapse TTL windows to wall-clock
//! comparisons, which is enough to exercise every flow deterministically.

pub mod audit;
pub mod directory;
pub mod mfa_store;
pub mod notifier;
pub mod session_cache;
pub mod session_repo;
pub mod tokens;

pub use audit::MockAuditSink;
pub use directory::MockUserDirectory;
pub use mfa_store::MockMfaStore;
pub use notifier::MockNotifier;
pub use session_cache::MockSessionCache;
pub use session_repo::MockSessionRepository;
pub use tokens::MockTokenIssuer;
