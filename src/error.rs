// src/error.rs
//! Error handling for the assessment pipeline
//!
//! Untracked joints and invalid sessions are ordinary detector outcomes and
//! never surface here. These errors cover the ambient surfaces: the skeleton
//! source, configuration, the result log and the announcer.

use crate::config::loader::ConfigError;
use crate::sensor::simulator::SimulatorError;
use crate::utils::validation::ValidationError;
use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum AssessError {
    /// The skeleton source could not be opened. Fatal at startup.
    #[error("Skeleton source unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Skeleton source error: {0}")]
    Sensor(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Result log error: {0}")]
    ResultLog(#[from] std::io::Error),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AssessError {
    /// Whether the application should stop instead of retrying
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AssessError::SensorUnavailable(_) | AssessError::Configuration(_)
        )
    }
}

impl From<ConfigError> for AssessError {
    fn from(err: ConfigError) -> Self {
        AssessError::Configuration(err.to_string())
    }
}

impl From<SimulatorError> for AssessError {
    fn from(err: SimulatorError) -> Self {
        match err {
            SimulatorError::Configuration(reason) => AssessError::Configuration(reason),
            other => AssessError::Sensor(other.to_string()),
        }
    }
}

/// Result type alias for assessment operations
pub type AssessResult<T> = Result<T, AssessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_error_conversion() {
        let err: AssessError = SimulatorError::NotOpen.into();
        assert!(matches!(err, AssessError::Sensor(_)));
        assert!(!err.is_fatal());

        let err: AssessError = SimulatorError::Configuration("bad jitter".into()).into();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Configuration error: bad jitter");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: AssessError = io.into();
        assert!(matches!(err, AssessError::ResultLog(_)));
    }

    #[test]
    fn test_sensor_unavailable_is_fatal() {
        assert!(AssessError::SensorUnavailable("no device".into()).is_fatal());
        assert!(!AssessError::Speech("busy".into()).is_fatal());
    }
}
