use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "books.create").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const BOOKS_VIEW: Permission = Permission(Cow::Borrowed("books.view"));
    pub const BOOKS_CREATE: Permission = Permission(Cow::Borrowed("books.create"));
    pub const BOOKS_EDIT: Permission = Permission(Cow::Borrowed("books.edit"));
    pub const BOOKS_DELETE: Permission = Permission(Cow::Borrowed("books.delete"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role → permission mapping.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    match role {
        Role::Admin => vec![Permission::WILDCARD],
        Role::Librarian => vec![
            Permission::BOOKS_VIEW,
            Permission::BOOKS_CREATE,
            Permission::BOOKS_EDIT,
            Permission::BOOKS_DELETE,
        ],
        Role::Member => vec![Permission::BOOKS_VIEW],
    }
}
