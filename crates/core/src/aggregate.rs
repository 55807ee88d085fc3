//! Aggregate root trait for persisted domain models.

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// Aggregate root: an entity that is loaded and saved as one unit.
///
/// The version is owned by persistence. Domain code reads it to build an
/// [`ExpectedVersion`] for the next write; stores assign the new value after a
/// successful write through [`AggregateRoot::set_version`].
pub trait AggregateRoot: Entity {
    /// Monotonically increasing revision of the persisted state (0 = never saved).
    fn version(&self) -> u64;

    /// Record the revision assigned by the store.
    fn set_version(&mut self, version: u64);

    /// Expectation matching the currently loaded revision.
    fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.version())
    }
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (last write wins).
    Any,
    /// Require the aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
