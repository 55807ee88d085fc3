use serde::{Deserialize, Serialize};

use cardboard_core::UserId;

use crate::User;

/// The authenticated actor behind an operation.
///
/// Built by the transport from whatever it authenticated (session, token);
/// this crate never looks credentials up itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub is_staff: bool,
}

impl Principal {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_staff: false,
        }
    }

    pub fn staff(user_id: UserId) -> Self {
        Self {
            user_id,
            is_staff: true,
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            is_staff: user.is_staff,
        }
    }
}
