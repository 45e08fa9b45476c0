//! Error types for the spreadsheet client

use fotoreg_core::SinkError;

/// Spreadsheet client error
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// Request could not be sent or the body not read
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Non-success status
    #[error("status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// No tab with this title in the spreadsheet
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),

    /// Body did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SheetError {
    /// Whether the service rejected the credentials
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

impl From<SheetError> for SinkError {
    fn from(value: SheetError) -> Self {
        match value {
            SheetError::Status { status: 401 | 403, body } => SinkError::Unauthorized(body),
            SheetError::Status { status, body } => SinkError::Rejected {
                status,
                message: body,
            },
            SheetError::WorksheetNotFound(title) => SinkError::WorksheetNotFound(title),
            SheetError::Http(e) => SinkError::Transport(e.to_string()),
            SheetError::InvalidUrl(e) => SinkError::Transport(e),
            SheetError::Decode(e) => SinkError::Malformed(e.to_string()),
        }
    }
}
