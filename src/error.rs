//! Error types for the restore engine.
//!
//! This module provides the error hierarchy for all phases of a restore
//! run: configuration, identity mapping, state capture, the management
//! API transport, and action execution.
//!
//! The taxonomy mirrors the failure-isolation rules of the pipeline:
//! scope-level failures never become errors at all (they are recorded as
//! diagnostics on the affected outcome record), structural failures are
//! [`ActionError`]s that abort one action, and capture/mapping failures
//! abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the restore engine.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identity-map construction errors.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// State-capture errors.
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Management API transport errors.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Action execution errors.
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// The run was cancelled by the user.
    ///
    /// Cancellation is honored at action boundaries only; an in-flight
    /// write is always allowed to complete.
    #[error("Run cancelled by user")]
    Cancelled,

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The plan or snapshot file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A file could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    ParseError {
        /// What was being parsed (plan file, snapshot, FID map).
        what: String,
        /// Description of the parse error.
        message: String,
    },

    /// Validation failed.
    #[error("Validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// An unknown restore-category token was requested.
    #[error("Unknown restore category: {token}")]
    UnknownCategory {
        /// The unrecognized token.
        token: String,
    },

    /// The snapshot does not identify a single chassis to restore from.
    #[error("Chassis selection failed: {message}")]
    ChassisSelection {
        /// Description of the selection problem.
        message: String,
    },
}

/// Identity-map construction errors.
///
/// Individual bad mapping rules are *not* errors — they are dropped with
/// diagnostics. Only a map with nothing usable in it is fatal.
#[derive(Debug, Error)]
pub enum MappingError {
    /// No mapping rule survived validation.
    #[error("No usable identity-map entries ({diagnostics} rules rejected)")]
    NoUsableEntries {
        /// Number of rejected rules.
        diagnostics: usize,
    },
}

/// State-capture errors.
///
/// A read failure for a subset of resources is not an error; it becomes a
/// partial-data marker on the target tree. Only a transport-level failure
/// for the batch is fatal.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture batch failed at the transport level.
    #[error("Capture failed reading {resource}: {message}")]
    BatchFailed {
        /// Resource path whose read failed.
        resource: String,
        /// Description of the transport failure.
        message: String,
    },
}

/// Management API transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// The device reported an application-level failure.
    ///
    /// A parseable error object was returned; the enclosing capture or
    /// action may treat the affected resource as partial data.
    #[error("Device error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Normalized error message from the device.
        message: String,
    },

    /// The device is busy; the request may be retried.
    #[error("Device busy, retry after {retry_after_secs} seconds")]
    Busy {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Transport-level failure: no response object was obtained.
    ///
    /// Fatal for the enclosing capture or action.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// The response could not be interpreted.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Action execution errors.
///
/// Only structural failures surface as errors; per-scope failures are
/// converted to outcome-record diagnostics inside the action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The whole action cannot proceed.
    ///
    /// Skipped for ordinary actions; promoted to run-aborting when the
    /// action is mandatory.
    #[error("Action '{action}' cannot proceed: {reason}")]
    Structural {
        /// Name of the failed action.
        action: String,
        /// Why the action cannot proceed.
        reason: String,
    },
}

/// Result type alias for restore operations.
pub type Result<T> = std::result::Result<T, RestoreError>;

impl RestoreError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ConfigError {
    /// Creates a parse error for the named input.
    #[must_use]
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl TransportError {
    /// Creates a device-reported error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns true if this error is transient and worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::Network { .. })
    }

    /// Returns true if the device produced a parseable error object.
    ///
    /// Application-level failures leave the enclosing capture usable
    /// (partial data); anything else is fatal for the caller.
    #[must_use]
    pub const fn is_application_level(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Busy { retry_after_secs } => Some(*retry_after_secs),
            Self::Network { .. } => Some(5),
            _ => None,
        }
    }
}

impl ActionError {
    /// Creates a structural failure for the named action.
    #[must_use]
    pub fn structural(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structural {
            action: action.into(),
            reason: reason.into(),
        }
    }
}
