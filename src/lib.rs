//! # Bankauth: Authentication Session Lifecycle Core
//!
//! This crate provides the authentication core of a retail banking
//! backend: password verification, email MFA and the full session
//! lifecycle backed by a durable store with a read-through cache.
//!
//! ## Features
//!
//! - **Non-enumerable failures**: unknown email, wrong password and bad
//!   account status are indistinguishable at the API surface
//! - **Email MFA**: six-digit single-flight codes with resend and
//!   failure lockouts
//! - **Durable sessions**: PostgreSQL is the source of truth, Redis
//!   accelerates validation and fails open
//! - **Testable**: every collaborator is a trait with an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//! AuthOrchestrator
//!   ├── CredentialVerifier ── UserDirectory, AuditSink
//!   ├── MfaCodeManager ────── MfaStore, NotificationSender
//!   └── SessionService ────── SessionRepository, SessionCache
//! ```
//!
//! ## Example: password + MFA login
//!
//! ```rust,ignore
//! use bankauth::*;
//!
//! // 1. Verify credentials; MFA users get a pending session
//! let outcome = orchestrator.login(email, password, ip, ua, None, None).await?;
//!
//! // 2. Complete the MFA step with the emailed code
//! if let LoginOutcome::MfaRequired { session_id, .. } = outcome {
//!     let (session, tokens, profile) =
//!         orchestrator.verify_mfa(&session_id, &code, Some(ip)).await?;
//! }
//!
//! // 3. Authorize requests against the session
//! let descriptor = orchestrator.authorize(&session_id).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod constants;
pub mod error;
pub mod mfa;
pub mod orchestrator;
pub mod providers;
pub mod session;
pub mod state;
pub mod stores;
pub mod utils;
pub mod verifier;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use config::{AuthConfig, DeliveryFailurePolicy};
pub use error::{AuthError, Result};
pub use mfa::MfaCodeManager;
pub use orchestrator::{AuthOrchestrator, LoginOutcome};
pub use session::SessionService;
pub use state::{Session, SessionDescriptor, SessionId, TokenPair, UserId, UserProfile};
pub use verifier::CredentialVerifier;
