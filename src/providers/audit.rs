//! Best-effort audit sink.

use crate::error::Result;
use crate::state::UserId;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Security event reported at every state transition of the
/// authentication flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Acting user, when known (login failures for unknown emails have
    /// no user).
    pub user_id: Option<UserId>,

    /// Stable action identifier
    /// (see [`crate::constants::audit_actions`]).
    pub action: String,

    /// Client IP, when the transition has one.
    pub ip_address: Option<IpAddr>,

    /// Free-form detail for the audit trail. May name the internal
    /// reason (e.g. account locked) that the API response hides.
    pub detail: String,
}

impl SecurityEvent {
    /// Build an event.
    #[must_use]
    pub fn new(
        user_id: Option<UserId>,
        action: &str,
        ip_address: Option<IpAddr>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action: action.to_string(),
            ip_address,
            detail: detail.into(),
        }
    }
}

/// Audit/security-event logger.
///
/// Invoked at every state transition (attempt, success, failure,
/// lockout, mass logout). Callers treat this as a best-effort sink:
/// failures are caught and discarded at the call site so a logging
/// outage can never block authentication.
pub trait AuditSink: Send + Sync {
    /// Record a user-attributed action with structured detail.
    ///
    /// # Errors
    ///
    /// Returns error if the audit backend rejects the record; callers
    /// swallow this.
    fn log_action(
        &self,
        user_id: UserId,
        action: &str,
        detail: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Record a security event.
    ///
    /// # Errors
    ///
    /// Returns error if the audit backend rejects the record; callers
    /// swallow this.
    fn log_security_event(
        &self,
        event: &SecurityEvent,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Audit sink that writes structured `tracing` events.
///
/// Default production sink when no external audit service is wired;
/// downstream log shipping turns these into the audit trail.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Create a new tracing audit sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingAuditSink {
    async fn log_action(
        &self,
        user_id: UserId,
        action: &str,
        detail: serde_json::Value,
    ) -> Result<()> {
        tracing::info!(
            target: "bankauth::audit",
            user_id = %user_id,
            action = %action,
            detail = %detail,
            "audit action"
        );
        Ok(())
    }

    async fn log_security_event(&self, event: &SecurityEvent) -> Result<()> {
        tracing::info!(
            target: "bankauth::audit",
            user_id = event.user_id.map(|id| id.to_string()),
            action = %event.action,
            ip_address = event.ip_address.map(|ip| ip.to_string()),
            detail = %event.detail,
            "security event"
        );
        Ok(())
    }
}
