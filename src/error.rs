//! Error handling for Chalkcast
//!
//! Every error carries a stable code and, where it helps, recovery suggestions
//! that the UI layer can surface next to the status flag.

use thiserror::Error;

/// Result type alias for Chalkcast operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Classification of collaborator failures, derived from the transport message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorFault {
    /// Service is not available in the caller's region
    RegionUnsupported,
    /// Credentials rejected or missing (403 / permission / key)
    AccessDenied,
    /// Socket or network failure
    Network,
    /// Anything the classifier does not recognise
    Other,
}

impl CollaboratorFault {
    /// Classify a raw failure message the way the live service reports them.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();
        if msg.contains("not supported") || msg.contains("region") || msg.contains("location") {
            CollaboratorFault::RegionUnsupported
        } else if msg.contains("403") || msg.contains("permission") || msg.contains("key") {
            CollaboratorFault::AccessDenied
        } else if msg.contains("network") || msg.contains("socket") || msg.contains("connection")
        {
            CollaboratorFault::Network
        } else {
            CollaboratorFault::Other
        }
    }
}

impl std::fmt::Display for CollaboratorFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollaboratorFault::RegionUnsupported => write!(f, "region not supported"),
            CollaboratorFault::AccessDenied => write!(f, "access denied"),
            CollaboratorFault::Network => write!(f, "connection lost"),
            CollaboratorFault::Other => write!(f, "collaborator error"),
        }
    }
}

/// Main error type for Chalkcast operations
#[derive(Error, Debug)]
pub enum StudioError {
    // Construction-time errors
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Invalid parameter '{param}': got {value}, expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // Device errors
    #[error("Permission denied for {device}")]
    PermissionDenied { device: String },

    // Transient errors
    #[error("Collaborator {kind}: {reason}")]
    Collaborator {
        kind: CollaboratorFault,
        reason: String,
    },

    #[error("Encoder delivery failed: {reason}")]
    EncoderDelivery { reason: String },

    // Session state errors
    #[error("A recording session is already active")]
    SessionActive,

    #[error("No recording session is active")]
    NoActiveSession,

    // Encoding errors
    #[error("Encoding error: {reason}")]
    Encoding { reason: String },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StudioError {
    /// Shorthand for an out-of-range parameter
    pub fn invalid_parameter(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        StudioError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Build a collaborator error, classifying the message
    pub fn collaborator(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        StudioError::Collaborator {
            kind: CollaboratorFault::classify(&reason),
            reason,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StudioError::Configuration { .. } => "CONFIGURATION",
            StudioError::InvalidParameter { .. } => "INVALID_PARAMETER",
            StudioError::PermissionDenied { .. } => "PERMISSION_DENIED",
            StudioError::Collaborator { .. } => "COLLABORATOR",
            StudioError::EncoderDelivery { .. } => "ENCODER_DELIVERY",
            StudioError::SessionActive => "SESSION_ACTIVE",
            StudioError::NoActiveSession => "NO_ACTIVE_SESSION",
            StudioError::Encoding { .. } => "ENCODING",
            StudioError::Wav(_) => "WAV_ERROR",
            StudioError::Io(_) => "IO_ERROR",
            StudioError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Transient errors degrade the session instead of aborting it
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StudioError::Collaborator { .. }
                | StudioError::EncoderDelivery { .. }
                | StudioError::SessionActive
                | StudioError::NoActiveSession
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StudioError::Configuration { .. } | StudioError::InvalidParameter { .. } => vec![
                "Check the configuration file against the defaults",
                "Pitch ratios must be greater than zero",
            ],
            StudioError::PermissionDenied { .. } => vec![
                "Grant microphone access and start the session again",
                "Recording cannot start without an audio input",
            ],
            StudioError::Collaborator { kind, .. } => match kind {
                CollaboratorFault::RegionUnsupported => {
                    vec!["The assistant is unavailable here; recording continues without it"]
                }
                CollaboratorFault::AccessDenied => vec!["Check the API key"],
                CollaboratorFault::Network | CollaboratorFault::Other => {
                    vec!["Check the network connection", "Start a new session to reconnect"]
                }
            },
            StudioError::SessionActive => vec!["Stop the current recording first"],
            _ => vec![],
        }
    }
}
