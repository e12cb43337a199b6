//! Structured errors for the swcache host.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the swcache host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Invalid input parameters (e.g., an empty method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The named cache does not exist.
    #[error("UNKNOWN_CACHE: {0}")]
    UnknownCache(String),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let (code, message) = match &err {
            HostError::InvalidInput(msg) => (-32602, msg.clone()),
            HostError::UnknownCache(msg) => (-32014, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
