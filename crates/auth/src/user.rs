//! Owner record as supplied by the identity collaborator.

use serde::{Deserialize, Serialize};

use cardboard_core::{DomainResult, FieldErrors, UserId};

pub const USERNAME_MAX_LEN: usize = 32;

/// A registered user. Owns inventories, items and sub-collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl User {
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> DomainResult<Self> {
        let user = Self {
            id,
            username: username.into(),
            email: email.into().trim().to_lowercase(),
            is_staff: false,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if self.username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this field has no more than {USERNAME_MAX_LEN} characters."),
            );
        }
        if self.email.is_empty() {
            errors.add("email", "The given email must be set.");
        } else if !self.email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardboard_core::DomainError;

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new(UserId::new(), "alice", " Alice@Example.COM ").unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_staff);
        assert!(user.staff().is_staff);
    }

    #[test]
    fn invalid_users_report_every_field() {
        let err = User::new(UserId::new(), "", "nope").unwrap_err();
        match err {
            DomainError::Validation(errors) => {
                assert!(errors.contains("username"));
                assert!(errors.contains("email"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn staff_flag_defaults_when_missing() {
        let user: User = serde_json::from_str(&format!(
            r#"{{"id":"{}","username":"bob","email":"bob@example.com"}}"#,
            UserId::new()
        ))
        .unwrap();
        assert!(!user.is_staff);
    }
}
