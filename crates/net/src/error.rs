//! Network error types

use std::io;

use quizroom_core::ErrorKind;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request rejected ({kind}): {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("Not connected")]
    NotConnected,
}

impl From<quizroom_core::Error> for Error {
    fn from(err: quizroom_core::Error) -> Self {
        Error::Rejected {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Failure class, if the server (or local validation) rejected a request
    pub fn rejection_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
