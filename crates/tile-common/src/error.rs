//! Error types for the footprint tile services.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Top-level error for a tile or stats request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    #[error(transparent)]
    Malformed(#[from] MalformedRequest),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl TileError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            TileError::Malformed(_) => 400,
            TileError::Engine(e) => e.http_status_code(),
        }
    }
}

/// The request could not be turned into a tile address.
///
/// Detected before any query is built; never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRequest {
    #[error("Invalid {segment} '{value}': expected a non-negative integer")]
    InvalidSegment { segment: &'static str, value: String },

    #[error("Unsupported tile extension '{0}': expected .tile, .pbf or .mvt")]
    UnsupportedExtension(String),
}

/// A well-formed query could not be executed by the spatial store.
///
/// Adapters convert every driver-level failure into one of these variants
/// so that no driver type leaks to the response layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Spatial store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Execution(String),

    #[error("Query timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected result from spatial store: {0}")]
    Decode(String),
}

impl EngineError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Unavailable(_) => "unavailable",
            EngineError::Execution(_) => "execution",
            EngineError::Timeout(_) => "timeout",
            EngineError::Decode(_) => "decode",
        }
    }

    /// Every engine failure is a server error; callers decide on retries.
    pub fn http_status_code(&self) -> u16 {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_is_client_error() {
        let err: TileError = MalformedRequest::InvalidSegment {
            segment: "zoom",
            value: "-1".to_string(),
        }
        .into();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(
            err.to_string(),
            "Invalid zoom '-1': expected a non-negative integer"
        );
    }

    #[test]
    fn test_engine_errors_are_server_errors() {
        let errors = [
            EngineError::Unavailable("pool closed".to_string()),
            EngineError::Execution("function st_tileenvelope does not exist".to_string()),
            EngineError::Timeout(5000),
            EngineError::Decode("missing column".to_string()),
        ];
        for e in errors {
            assert_eq!(TileError::from(e).http_status_code(), 500);
        }
    }

    #[test]
    fn test_engine_error_kind_labels() {
        assert_eq!(EngineError::Timeout(10).kind(), "timeout");
        assert_eq!(EngineError::Timeout(10).to_string(), "Query timed out after 10 ms");
        assert_eq!(EngineError::Execution(String::new()).kind(), "execution");
    }
}
