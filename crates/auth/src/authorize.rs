use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: requires the {required} role")]
    RoleRequired { required: Role },

    #[error("forbidden: only the owner may do this")]
    NotOwner,
}

/// Check a permission against the principal's role.
///
/// - No IO
/// - No panics
/// - Pure policy check
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions()
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Role gate: permitted iff the principal's profile role is exactly `required`.
pub fn require_role(principal: &Principal, required: Role) -> Result<(), AuthzError> {
    if principal.role == required {
        Ok(())
    } else {
        Err(AuthzError::RoleRequired { required })
    }
}

#[cfg(test)]
mod tests {
    use folio_core::UserId;

    use super::*;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), "reader", role)
    }

    #[test]
    fn admin_wildcard_grants_any_permission() {
        let p = principal(Role::Admin);
        assert!(authorize(&p, &Permission::BOOKS_DELETE).is_ok());
        assert!(authorize(&p, &Permission::new("anything.else")).is_ok());
    }

    #[test]
    fn librarian_manages_books() {
        let p = principal(Role::Librarian);
        assert!(authorize(&p, &Permission::BOOKS_CREATE).is_ok());
        assert!(authorize(&p, &Permission::BOOKS_EDIT).is_ok());
        assert!(authorize(&p, &Permission::BOOKS_DELETE).is_ok());
    }

    #[test]
    fn member_cannot_create_books() {
        let p = principal(Role::Member);
        let err = authorize(&p, &Permission::BOOKS_CREATE).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("books.create".to_string()));
    }

    #[test]
    fn role_gate_requires_exact_match() {
        assert!(require_role(&principal(Role::Librarian), Role::Librarian).is_ok());

        // Admin is not implicitly a librarian.
        let err = require_role(&principal(Role::Admin), Role::Librarian).unwrap_err();
        assert_eq!(err, AuthzError::RoleRequired { required: Role::Librarian });
    }
}
