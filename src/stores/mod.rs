//! Concrete store implementations.
//!
//! This module provides production-ready implementations of the provider
//! traits:
//! - **`RedisSessionCache`**: Read-through session cache with TTL
//! - **`RedisMfaStore`**: Ephemeral MFA codes and abuse counters
//! - **`PostgresSessionRepository`**: Durable session store (`postgres` feature)
//! - **`PostgresUserDirectory`**: User directory backed by the profile
//!   database (`postgres` feature)

pub mod mfa_redis;
pub mod session_redis;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use mfa_redis::RedisMfaStore;
pub use session_redis::RedisSessionCache;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresSessionRepository, PostgresUserDirectory};
