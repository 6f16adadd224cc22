//! Global error types for the ServiceHub application.
//!
//! All error categories across the application are unified into a single
//! `ShError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using ShError.
pub type ShResult<T> = Result<T, ShError>;

/// Unified error type covering all error categories in ServiceHub.
#[derive(Error, Debug)]
pub enum ShError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Snapshot database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Snapshot schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Backend errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Backend returned an error response.
    #[error("backend error (status {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error message from the backend.
        message: String,
    },

    /// Authentication with the backend failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The backend client could not be created.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A remote row was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (table name).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    // -- Domain errors --
    /// Caller supplied an invalid value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A status change is not allowed from the current status.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    // -- Liveness errors --
    /// The user (or platform) refused camera access.
    #[error("camera permission denied: {0}")]
    CameraPermissionDenied(String),

    /// The camera failed after it was granted.
    #[error("camera error: {0}")]
    Camera(String),

    /// Face detection failed on a frame.
    #[error("detection error: {0}")]
    Detection(String),

    /// A liveness session is already running.
    #[error("liveness session already active")]
    SessionActive,

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    /// A service is not yet initialized.
    #[error("service not initialized: {0}")]
    ServiceNotInitialized(String),

    /// A service operation failed.
    #[error("service error: {0}")]
    Service(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShError {
    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ShError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether this error came from talking to the backend.
    ///
    /// Remote failures degrade to empty/default results and a toast
    /// instead of aborting the caller.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ShError::Http(_)
                | ShError::Timeout(_)
                | ShError::ServerError { .. }
                | ShError::AuthFailed(_)
                | ShError::BackendUnavailable(_)
        )
    }

    /// Short, user-facing text suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ShError::Http(_) | ShError::Timeout(_) => {
                "Network problem, please try again.".to_string()
            }
            ShError::ServerError { .. } => "The server could not complete the request.".to_string(),
            ShError::AuthFailed(_) => "Your session has expired, please sign in again.".to_string(),
            ShError::BackendUnavailable(_) => "Service temporarily unavailable.".to_string(),
            ShError::CameraPermissionDenied(_) => {
                "Camera access was denied. Allow camera access and try again.".to_string()
            }
            ShError::Camera(_) => "The camera could not be started.".to_string(),
            ShError::InvalidInput(msg) => msg.clone(),
            ShError::NotFound { entity, .. } => format!("{entity} not found."),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ShError {
    fn from(e: serde_json::Error) -> Self {
        ShError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ShError {
    fn from(e: toml::de::Error) -> Self {
        ShError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sh_error_display() {
        let err = ShError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_not_found_display() {
        let err = ShError::not_found("booking", "b-1");
        assert_eq!(err.to_string(), "booking not found: b-1");
    }

    #[test]
    fn test_remote_classification() {
        assert!(ShError::Timeout("x".into()).is_remote());
        assert!(ShError::ServerError { status: 500, message: String::new() }.is_remote());
        assert!(!ShError::InvalidInput("x".into()).is_remote());
        assert!(!ShError::CameraPermissionDenied("x".into()).is_remote());
    }

    #[test]
    fn test_user_message_for_camera_denial() {
        let msg = ShError::CameraPermissionDenied("NotAllowedError".into()).user_message();
        assert!(msg.contains("Camera access was denied"));
    }
}
