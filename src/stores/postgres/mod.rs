//! PostgreSQL store implementations.
//!
//! Requires the `postgres` feature.

pub mod session;
pub mod user;

pub use session::PostgresSessionRepository;
pub use user::PostgresUserDirectory;
