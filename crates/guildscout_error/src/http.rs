//! HTTP error types.

/// HTTP client error with source location.
///
/// Raised when the HTTP client itself cannot be constructed or used, as
/// opposed to a remote call returning a failure status.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP Error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Create a new HttpError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use guildscout_error::HttpError;
    ///
    /// let err = HttpError::new("TLS backend unavailable");
    /// assert!(err.message.contains("TLS"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
