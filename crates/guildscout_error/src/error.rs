//! Top-level error wrapper types.

use crate::{ConfigError, HttpError, JsonError};

/// Foundation error enum collecting the leaf error types.
///
/// # Examples
///
/// ```
/// use guildscout_error::{GuildscoutError, HttpError};
///
/// let err: GuildscoutError = HttpError::new("Connection failed").into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GuildscoutErrorKind {
    /// HTTP client error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Guildscout error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Guildscout Error: {}", _0)]
pub struct GuildscoutError(Box<GuildscoutErrorKind>);

impl GuildscoutError {
    /// Create a new error from a kind.
    pub fn new(kind: GuildscoutErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GuildscoutErrorKind {
        &self.0
    }
}

impl<T> From<T> for GuildscoutError
where
    T: Into<GuildscoutErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Guildscout operations.
pub type GuildscoutResult<T> = std::result::Result<T, GuildscoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level_error() {
        let err: GuildscoutError = ConfigError::new("bad bucket").into();
        assert!(matches!(err.kind(), GuildscoutErrorKind::Config(_)));
        assert!(err.to_string().contains("bad bucket"));
    }

    #[test]
    fn leaf_errors_record_their_location() {
        let err = JsonError::new("trailing characters");
        assert!(err.file.ends_with("error.rs"));
        assert!(err.line > 0);
    }
}
