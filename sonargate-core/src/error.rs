//! Error types for SonarGate core.

use std::{error::Error, fmt};

/// Error type for SonarGate core operations.
#[derive(Debug)]
pub enum SonarGateError {
    /// Invalid configuration supplied by the caller.
    Config(String),
    /// Structured output could not be serialized.
    Serialize(serde_json::Error),
}

impl fmt::Display for SonarGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Serialize(err) => write!(f, "serialization error: {err}"),
        }
    }
}

impl Error for SonarGateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SonarGateError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Convenience result type for SonarGate core.
pub type Result<T> = std::result::Result<T, SonarGateError>;
