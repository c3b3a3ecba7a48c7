//! Error types for failure normalization and message resolution.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::FailureDetail;

/// Malformed raw failure records.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failure detail {index} has an empty path")]
    EmptyPath { index: usize },

    #[error("failure detail {index} at {path} has an empty kind")]
    EmptyKind { index: usize, path: String },
}

/// Errors while resolving override messages.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid override pattern \"{key}\": {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised by the fail action pipeline.
#[derive(Debug, Error)]
pub enum FailActionError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors loading options or failures from disk or strings.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", details.len())]
    Invalid { details: Vec<FailureDetail> },
}

impl NormalizeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl FailActionError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FailActionError::Normalize(e) => e.exit_code(),
            FailActionError::Resolve(e) => e.exit_code(),
        }
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
