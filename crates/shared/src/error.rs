use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    ServerRejected,
}

/// Failure of a single request against a collection endpoint.
///
/// The backend returns no structured field errors, so a rejection only carries
/// the HTTP status and a short reason produced on this side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{operation} request could not complete: {message}")]
    NetworkFailure {
        operation: Operation,
        message: String,
    },
    #[error("server rejected {operation} request (status {status}): {reason}")]
    ServerRejected {
        operation: Operation,
        status: u16,
        reason: String,
    },
    /// The request could not be built locally; nothing was sent.
    #[error("{operation} request could not be encoded: {reason}")]
    InvalidRequest {
        operation: Operation,
        reason: String,
    },
}

impl ApiError {
    pub fn network(operation: Operation, message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            operation,
            message: message.into(),
        }
    }

    pub fn rejected(operation: Operation, status: u16, reason: impl Into<String>) -> Self {
        Self::ServerRejected {
            operation,
            status,
            reason: reason.into(),
        }
    }

    pub fn invalid_request(operation: Operation, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            operation,
            reason: reason.into(),
        }
    }

    /// Unsendable requests are reported to users like rejections.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            ApiError::ServerRejected { .. } | ApiError::InvalidRequest { .. } => {
                ErrorKind::ServerRejected
            }
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ApiError::NetworkFailure { operation, .. }
            | ApiError::ServerRejected { operation, .. }
            | ApiError::InvalidRequest { operation, .. } => *operation,
        }
    }
}
