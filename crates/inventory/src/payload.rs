//! Loosely-typed (JSON) input readers.
//!
//! Creation and update payloads arrive as JSON objects from whatever transport
//! sits on top. Every reader records a message against the field instead of
//! failing immediately, so one call reports all bad fields.

use core::str::FromStr;

use serde_json::{Map, Value};

use cardboard_core::{DomainError, DomainResult, FieldErrors, error::NON_FIELD_ERRORS};

use crate::grading::Grade;
use crate::ids::CardId;

/// Tri-state view of an optional, nullable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Key not present (or present with an invalid value, which was recorded).
    Absent,
    /// Key present with an explicit `null`.
    Null,
    Set(T),
}

impl<T> Field<T> {
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Field::Absent => None,
            Field::Null => Some(None),
            Field::Set(v) => Some(Some(v)),
        }
    }
}

pub(crate) struct JsonFields<'a> {
    object: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> JsonFields<'a> {
    pub(crate) fn parse(value: &'a Value) -> DomainResult<Self> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                errors: FieldErrors::new(),
            }),
            _ => Err(DomainError::validation(
                NON_FIELD_ERRORS,
                "Invalid data. Expected a JSON object.",
            )),
        }
    }

    pub(crate) fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    fn raw(&self, key: &str) -> Field<&'a Value> {
        match self.object.get(key) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(v) => Field::Set(v),
        }
    }

    /// Non-nullable field: `null` is recorded as an error.
    fn required_non_null(&mut self, key: &str) -> Option<&'a Value> {
        match self.raw(key) {
            Field::Absent => None,
            Field::Null => {
                self.error(key, "This field may not be null.");
                None
            }
            Field::Set(v) => Some(v),
        }
    }

    pub(crate) fn require(&mut self, key: &str) {
        if !self.object.contains_key(key) {
            self.error(key, "This field is required.");
        }
    }

    pub(crate) fn bool(&mut self, key: &str) -> Option<bool> {
        let value = self.required_non_null(key)?;
        match value {
            Value::Bool(b) => Some(*b),
            _ => {
                self.error(key, "Must be a valid boolean.");
                None
            }
        }
    }

    /// Non-negative integer quantity; `nullable` controls whether `null` is accepted.
    pub(crate) fn count(&mut self, key: &str, nullable: bool) -> Field<u32> {
        let value = match self.raw(key) {
            Field::Absent => return Field::Absent,
            Field::Null if nullable => return Field::Null,
            Field::Null => {
                self.error(key, "This field may not be null.");
                return Field::Absent;
            }
            Field::Set(v) => v,
        };
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Field::Set(n),
            None if value.as_i64().is_some_and(|n| n < 0) => {
                self.error(key, "Ensure this value is greater than or equal to 0.");
                Field::Absent
            }
            None => {
                self.error(key, "A valid integer is required.");
                Field::Absent
            }
        }
    }

    pub(crate) fn string(&mut self, key: &str, max_len: usize, nullable: bool) -> Field<String> {
        let value = match self.raw(key) {
            Field::Absent => return Field::Absent,
            Field::Null if nullable => return Field::Null,
            Field::Null => {
                self.error(key, "This field may not be null.");
                return Field::Absent;
            }
            Field::Set(v) => v,
        };
        let Some(s) = value.as_str() else {
            self.error(key, "Not a valid string.");
            return Field::Absent;
        };
        if s.chars().count() > max_len {
            self.error(
                key,
                format!("Ensure this field has no more than {max_len} characters."),
            );
            return Field::Absent;
        }
        Field::Set(s.to_string())
    }

    /// String-coded choice parsed through `FromStr`.
    pub(crate) fn choice<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let value = self.required_non_null(key)?;
        let parsed = value.as_str().and_then(|s| s.parse::<T>().ok());
        if parsed.is_none() {
            let shown = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
            self.error(key, crate::choices::invalid_choice(&shown));
        }
        parsed
    }

    pub(crate) fn grade(&mut self, key: &str) -> Field<Grade> {
        let value = match self.raw(key) {
            Field::Absent => return Field::Absent,
            Field::Null => return Field::Null,
            Field::Set(v) => v,
        };
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.error(key, "A valid number is required.");
                return Field::Absent;
            }
        };
        match text.parse::<Grade>() {
            Ok(grade) => Field::Set(grade),
            Err(err) => {
                for (_, messages) in err.payload().iter() {
                    for message in messages {
                        self.error(key, message.clone());
                    }
                }
                Field::Absent
            }
        }
    }

    /// Catalog reference: a UUID string or `null`.
    pub(crate) fn card(&mut self, key: &str) -> Field<CardId> {
        let value = match self.raw(key) {
            Field::Absent => return Field::Absent,
            Field::Null => return Field::Null,
            Field::Set(v) => v,
        };
        match value.as_str().map(str::parse::<CardId>) {
            Some(Ok(card)) => Field::Set(card),
            _ => {
                self.error(key, "Invalid catalog reference - expected a card id.");
                Field::Absent
            }
        }
    }

    pub(crate) fn finish(self) -> DomainResult<()> {
        self.errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn non_object_payload_is_rejected() {
        let value = json!([1, 2, 3]);
        assert!(JsonFields::parse(&value).is_err());
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let value = json!({ "is_foil": "yes", "quantity_owned": -1, "card": 7 });
        let mut fields = JsonFields::parse(&value).unwrap();
        assert_eq!(fields.bool("is_foil"), None);
        assert_eq!(fields.count("quantity_owned", false), Field::Absent);
        assert_eq!(fields.card("card"), Field::Absent);

        match fields.finish().unwrap_err() {
            DomainError::Validation(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.contains("is_foil"));
                assert!(errors.contains("quantity_owned"));
                assert!(errors.contains("card"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn nullable_counts_accept_null() {
        let value = json!({ "quantity_wanted": null, "quantity_owned": null });
        let mut fields = JsonFields::parse(&value).unwrap();
        assert_eq!(fields.count("quantity_wanted", true), Field::Null);
        assert_eq!(fields.count("quantity_owned", false), Field::Absent);
        assert!(fields.finish().is_err());
    }

    #[test]
    fn strings_respect_max_length() {
        let value = json!({ "serial_number": "1234567890123" });
        let mut fields = JsonFields::parse(&value).unwrap();
        assert_eq!(fields.string("serial_number", 12, false), Field::Absent);
        assert!(fields.finish().is_err());
    }
}
