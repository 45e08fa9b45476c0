//! Error types for the form server

use fotoreg_core::{ConfigError, SessionError, VocabularyError};
use fotoreg_sheets::SheetError;
use std::net::SocketAddr;
use warp::http::StatusCode;

/// Form server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reference data could not be loaded
    #[error("vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    /// Spreadsheet client could not be built
    #[error("spreadsheet client error: {0}")]
    Sheets(#[from] SheetError),

    /// Workflow error
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Upload could not be read
    #[error("invalid form upload: {0}")]
    Upload(#[from] warp::Error),

    /// Listener could not be bound
    #[error("could not bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying error
        source: warp::Error,
    },
}

impl ServerError {
    /// Status used when the error ends a request
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Upload(_) => StatusCode::BAD_REQUEST,
            ServerError::Session(SessionError::Sink(_)) | ServerError::Sheets(_) => {
                StatusCode::BAD_GATEWAY
            }
            ServerError::Session(
                SessionError::SubmitUnavailable(_) | SessionError::NotValidated(_),
            ) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fotoreg_core::{DraftPhase, SinkError};

    #[test]
    fn external_failures_are_bad_gateway() {
        let err = ServerError::from(SessionError::Sink(SinkError::Transport("reset".into())));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn premature_save_is_a_conflict() {
        let err = ServerError::from(SessionError::SubmitUnavailable(DraftPhase::Editing));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
