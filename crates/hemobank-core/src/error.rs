// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hemobank inventory engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::types::{ComponentType, UnitStatus};

/// The primary error type shared by the registry, the workflows, and the binary.
///
/// Every variant maps onto one stable [`ErrorKind`] so callers can branch on
/// the category without matching on message text.
#[derive(Debug, Error)]
pub enum HemoError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A required field is missing or malformed. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// A serial ID submitted for intake already exists somewhere in the registry.
    #[error("Serial ID already exists: {serial_id}")]
    DuplicateSerial { serial_id: String },

    /// No unit with this serial exists in the registry.
    #[error("No stock found with serial ID: {serial_id}")]
    NotFound { serial_id: String },

    /// The serial exists, but under a different blood component.
    #[error("No {expected} stock found with serial ID: {serial_id}")]
    CategoryMismatch {
        serial_id: String,
        expected: ComponentType,
        actual: ComponentType,
    },

    /// The unit is not in a status that permits the requested action.
    #[error("cannot {action} unit {serial_id}: status is {status}")]
    Precondition {
        serial_id: String,
        status: UnitStatus,
        action: String,
    },

    /// A workflow step was attempted from a phase that does not allow it.
    #[error("cannot {event} while workflow is {phase}")]
    InvalidPhase { phase: String, event: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A registry request did not complete in time.
    #[error("registry request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The workflow was cancelled before the request was dispatched.
    #[error("workflow cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable error taxonomy surfaced to callers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    CategoryMismatch,
    Precondition,
    Registry,
    Cancelled,
    Config,
}

impl HemoError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HemoError::Config(_) => ErrorKind::Config,
            HemoError::Validation(_) | HemoError::DuplicateSerial { .. } => ErrorKind::Validation,
            HemoError::NotFound { .. } => ErrorKind::NotFound,
            HemoError::CategoryMismatch { .. } => ErrorKind::CategoryMismatch,
            HemoError::Precondition { .. } | HemoError::InvalidPhase { .. } => {
                ErrorKind::Precondition
            }
            HemoError::Storage { .. } | HemoError::Timeout { .. } | HemoError::Internal(_) => {
                ErrorKind::Registry
            }
            HemoError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Registry failures can be retried by resubmitting; everything else needs
    /// the operator to change the input first.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Registry
    }

    /// Shorthand for wrapping any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HemoError::Storage {
            source: Box::new(err),
        }
    }
}
