use thiserror::Error;

use crate::domain::RevisionId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainerError {
    #[error("container names should not contain spaces: {0:?}")]
    InvalidName(String),
    #[error("invalid revision passed in, unable to set revisions: {0}")]
    InvalidRevision(String),
    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("revision {0} is not part of this container")]
    UnknownRevision(RevisionId),
    #[error("no revision ids left to hand out")]
    RevisionIdsExhausted,
}

impl ContainerError {
    /// Errors caused by bad caller input, recoverable by correcting it
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ContainerError::InvalidName(_)
                | ContainerError::InvalidRevision(_)
                | ContainerError::InvalidField { .. }
        )
    }
}
