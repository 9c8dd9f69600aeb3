use serde::Serialize;

use folio_core::UserId;

use crate::{permissions_for, Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// The role comes from the user's stored profile at request time, never from
/// the token, so a role change takes effect on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        permissions_for(self.role)
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}
