//! Error types for the Guildscout workspace.
//!
//! This crate provides the foundation error types shared by the rate limiter,
//! the Discord integration and the command-line front end.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - leaf errors (`HttpError`, `JsonError`, `ConfigError`) carry a message
//!   and the source location where they were raised
//! - `GuildscoutErrorKind` collects the leaf errors
//! - `GuildscoutError` boxes the kind
//!
//! # Examples
//!
//! ```
//! use guildscout_error::{GuildscoutResult, ConfigError};
//!
//! fn load() -> GuildscoutResult<String> {
//!     Err(ConfigError::new("missing [discord] section"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod json;

pub use config::ConfigError;
pub use error::{GuildscoutError, GuildscoutErrorKind, GuildscoutResult};
pub use http::HttpError;
pub use json::JsonError;
