//! Collaborator interfaces for the authentication core.
//!
//! This module defines traits for all external dependencies used by the
//! auth components. These traits enable dependency injection and make
//! the auth logic testable: the core depends only on these interfaces,
//! and the runtime supplies concrete implementations.
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic)
//! - **Production**: Use real services (PostgreSQL, Redis, SMTP, etc.)
//! - **Development**: Use instrumented versions (console notifier,
//!   tracing audit sink)

pub mod audit;
pub mod console_notifier;
pub mod directory;
pub mod mfa_store;
pub mod notifier;
pub mod session_cache;
pub mod session_repo;
pub mod smtp_notifier;
pub mod tokens;

// Re-export provider traits
pub use audit::{AuditSink, SecurityEvent, TracingAuditSink};
pub use console_notifier::ConsoleNotifier;
pub use directory::UserDirectory;
pub use mfa_store::MfaStore;
pub use notifier::NotificationSender;
pub use session_cache::SessionCache;
pub use session_repo::SessionRepository;
pub use smtp_notifier::SmtpNotifier;
pub use tokens::TokenIssuer;
