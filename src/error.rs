use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AciError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("failed to parse subentries: {0}")]
    ParseError(String),

    #[error("Poisoned lock error: {0}")]
    PoisonedLockError(String),

    #[error("insufficient access rights: {0}")]
    InsufficientAccessRights(String),

    #[error("subentry not found: {0}")]
    SubentryNotFound(String),

    #[error("duplicate subentry: {0}")]
    DuplicateSubentry(String),
}

impl AciError {
    /// True for errors caused by a misconfigured rule set rather than a
    /// failing collaborator.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AciError::Configuration(_))
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, AciError::Lookup(_))
    }
}

impl From<serde_json::Error> for AciError {
    fn from(err: serde_json::Error) -> Self {
        AciError::ParseError(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for AciError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        AciError::PoisonedLockError(err.to_string())
    }
}
