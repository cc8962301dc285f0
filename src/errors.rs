//! Typed error hierarchy for pdftrans.
//!
//! Two enums cover the two fallible subsystems:
//! - `JobError`: starting, cancelling and observing translation jobs
//! - `ConfigError`: loading and writing the settings file
//!
//! Translator output never produces an error: malformed or unrecognised
//! lines are dropped or logged, and process failures end up in the job log.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the job controller and the progress engine.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to spawn translator process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("A translation job is already running")]
    AlreadyRunning,

    #[error("No translation job is running")]
    NoActiveJob,

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Job controller has shut down")]
    ControllerClosed,
}

/// Errors from the settings layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_error_spawn_failed_is_matchable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "pdf2zh not found");
        let err = JobError::SpawnFailed(io_err);
        match &err {
            JobError::SpawnFailed(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected SpawnFailed variant"),
        }
        assert!(err.to_string().contains("pdf2zh not found"));
    }

    #[test]
    fn job_error_input_not_found_carries_path() {
        let err = JobError::InputNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert!(err.to_string().contains("/tmp/missing.pdf"));
    }

    #[test]
    fn config_error_read_carries_path() {
        let path = PathBuf::from("/etc/pdftrans/config.toml");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = ConfigError::Read {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            ConfigError::Read { path: p, source: s } => {
                assert_eq!(p, &path);
                assert_eq!(s.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Read"),
        }
    }

    #[test]
    fn config_error_invalid_value_names_field() {
        let err = ConfigError::InvalidValue {
            field: "translator.command".into(),
            message: "must not be empty".into(),
        };
        assert!(err.to_string().contains("translator.command"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&JobError::AlreadyRunning);
        assert_std_error(&ConfigError::InvalidValue {
            field: "x".into(),
            message: "y".into(),
        });
    }
}
