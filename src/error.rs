use crate::models;
use std::fmt;

#[derive(Debug)]
pub enum CascadeError {
    /// Caller sent something the cascade cannot run on.
    MalformedInput(String),
    /// The configured catalog override or KV binding could not be used.
    Config(String),
    /// Registry read or task-log write failed. Safe to retry.
    Storage(worker::Error),
    /// Failure inside the worker itself, e.g. no entropy for a task id.
    Internal(String),
    NotFound(String),
}

impl CascadeError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Config(_) | Self::Internal(_) => 500,
            Self::Storage(_) => 503,
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn to_response(&self) -> models::ErrorResponse {
        models::ErrorResponse {
            error: self.to_string(),
            retryable: self.retryable(),
        }
    }
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Storage(err) => write!(f, "storage unavailable: {err}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
        }
    }
}

impl std::error::Error for CascadeError {}
