//! Error types for Warden.
//!
//! This crate provides the foundation error types used throughout the Warden workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use warden_error::{ConfigError, WardenResult};
//!
//! fn load() -> WardenResult<String> {
//!     Err(ConfigError::new("guild_id missing"))?
//! }
//!
//! match load() {
//!     Ok(value) => println!("Got: {}", value),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod guard;
mod platform;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{WardenError, WardenErrorKind, WardenResult};
pub use guard::{GuardError, GuardErrorKind, GuardResult};
pub use platform::{PlatformError, PlatformErrorKind, PlatformResult};
