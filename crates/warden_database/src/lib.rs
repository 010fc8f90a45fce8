//! PostgreSQL persistence for Warden.
//!
//! Provides the Diesel schema, embedded migrations and [`PgGuardRepository`],
//! the production implementation of
//! [`GuardRepository`](warden_interface::GuardRepository).
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_database::{PgGuardRepository, connect_pool, run_migrations};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect_pool(&std::env::var("DATABASE_URL")?, 4)?;
//! run_migrations(&pool)?;
//! let repo = PgGuardRepository::new(pool);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod connection;
#[allow(missing_docs)]
mod models;
mod repository;

#[allow(missing_docs)]
pub mod schema;

pub use connection::{PgPool, connect_pool, run_migrations};
pub use models::{
    AllowListRow, AuditEventRow, NewAllowListRow, NewAuditEventRow, NewPunishmentRow,
    PunishmentRow,
};
pub use repository::PgGuardRepository;

use warden_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
