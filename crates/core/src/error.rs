//! Domain error model.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Key used for errors that are not tied to a single input field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field → messages map carried by validation failures.
///
/// Validation collects every offending field before failing so callers get the
/// whole picture in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when nothing was collected, otherwise a validation error.
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl core::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Coarse classification used by transports to pick a response status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Permission,
    Conflict,
    Invariant,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, ownership, conflicts). Storage failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more input fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An inventory item named in a batch could not be resolved.
    #[error("invalid inventory item {id}: {source}")]
    InvalidInventoryItem {
        id: String,
        #[source]
        source: Box<DomainError>,
    },

    /// The acting user does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A conflict occurred (duplicate provisioning, stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_item(id: impl ToString, source: DomainError) -> Self {
        Self::InvalidInventoryItem {
            id: id.to_string(),
            source: Box::new(source),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::Validation,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::InvalidInventoryItem { source, .. } => source.kind(),
            DomainError::Forbidden(_) => ErrorKind::Permission,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::InvariantViolation(_) => ErrorKind::Invariant,
        }
    }

    /// Structured field → messages view of the error for clients.
    pub fn payload(&self) -> FieldErrors {
        match self {
            DomainError::Validation(errors) => errors.clone(),
            DomainError::NotFound { entity, .. } => FieldErrors::single(*entity, self.to_string()),
            DomainError::InvalidInventoryItem { id, source } => FieldErrors::single(
                "inventory_items",
                format!("unable to retrieve inventory item {id}: {source}"),
            ),
            DomainError::Forbidden(msg) => FieldErrors::single("owner", msg.clone()),
            DomainError::Conflict(msg) | DomainError::InvariantViolation(msg) => {
                FieldErrors::single(NON_FIELD_ERRORS, msg.clone())
            }
            DomainError::InvalidId(msg) => FieldErrors::single("id", msg.clone()),
        }
    }

    /// Id carried by an [`DomainError::InvalidInventoryItem`] failure.
    pub fn offending_item(&self) -> Option<&str> {
        match self {
            DomainError::InvalidInventoryItem { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_aggregate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("condition", "unknown condition 'XX'");
        errors.add("is_foil", "expected a boolean");
        errors.add("condition", "second message");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("condition").unwrap().len(), 2);
        assert!(errors.contains("is_foil"));

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn invalid_item_inherits_kind_of_cause() {
        let missing =
            DomainError::invalid_item("abc", DomainError::not_found("inventory item", "abc"));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.offending_item(), Some("abc"));

        let foreign = DomainError::invalid_item("abc", DomainError::forbidden("not yours"));
        assert_eq!(foreign.kind(), ErrorKind::Permission);
    }

    #[test]
    fn every_error_has_a_payload() {
        let errors = [
            DomainError::validation("serial_number", "too long"),
            DomainError::not_found("inventory", "x"),
            DomainError::forbidden("nope"),
            DomainError::conflict("stale"),
            DomainError::invariant("broken"),
            DomainError::invalid_id("bad"),
        ];
        for err in errors {
            assert!(!err.payload().is_empty(), "{err:?} has an empty payload");
        }
    }

    #[test]
    fn display_lists_fields() {
        let mut errors = FieldErrors::new();
        errors.add("a", "one");
        errors.add("b", "two");
        assert_eq!(errors.to_string(), "a: one; b: two");
    }
}
