//! Error types for the visualization host.

use axum::http::StatusCode;
use thiserror::Error;

/// Result type for session and server operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An animation is still playing; the command was not applied
    #[error("busy: an animation is still playing")]
    Busy,

    /// Unknown structure key
    #[error("unknown structure: {0:?}")]
    UnknownStructure(String),

    /// A configuration value did not parse
    #[error("invalid {key}: {value:?}")]
    Config { key: &'static str, value: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status the API answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Busy => StatusCode::CONFLICT,
            Error::UnknownStructure(_) | Error::Config { .. } => StatusCode::BAD_REQUEST,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<dsviz_engine::UnknownKind> for Error {
    fn from(e: dsviz_engine::UnknownKind) -> Self {
        Error::UnknownStructure(e.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(Error::Busy.status_code(), StatusCode::CONFLICT);
        let unknown = Error::from(dsviz_engine::UnknownKind("graph".into()));
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unknown.to_string(), "unknown structure: \"graph\"");
    }

    #[tokio::test]
    async fn bind_failure_is_io() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let err = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(Error::from)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
