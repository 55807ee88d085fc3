//! Service-level error: domain failures plus storage failures.

use thiserror::Error;

use cardboard_core::{DomainError, ErrorKind, FieldErrors, error::NON_FIELD_ERRORS};

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Deterministic business failure (validation, not found, ownership, conflict).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store could not serve the request.
    #[error("store failure: {0}")]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) | StoreError::Duplicate(msg) => {
                ServiceError::Domain(DomainError::conflict(msg))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// Classification for transports; `None` for infrastructure failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ServiceError::Domain(e) => Some(e.kind()),
            ServiceError::Store(_) => None,
        }
    }

    /// Field → messages payload for clients.
    pub fn payload(&self) -> FieldErrors {
        match self {
            ServiceError::Domain(e) => e.payload(),
            ServiceError::Store(e) => FieldErrors::single(NON_FIELD_ERRORS, e.to_string()),
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}
