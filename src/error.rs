//! Grepable error codes shared by service errors and HTTP responses.

/// Machine-readable error code carried alongside a human message.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;

    /// Whether a caller may retry the same request unchanged.
    fn retryable(&self) -> bool {
        false
    }
}
