use core::str::FromStr;

use serde::{Deserialize, Serialize};

use folio_core::DomainError;

/// Role stored on a user's profile.
///
/// Every account has exactly one role. New accounts start as `Member`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Librarian,
    #[default]
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Librarian, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Librarian => "Librarian",
            Role::Member => "Member",
        }
    }

    /// Staff may moderate content they do not own (e.g. other users' comments).
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::field("role", format!("'{s}' is not one of Admin, Librarian, Member"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("librarian".parse::<Role>().unwrap(), Role::Librarian);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn unknown_role_is_a_field_error() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(matches!(err, DomainError::Fields(_)));
    }

    #[test]
    fn default_is_member_and_only_admin_is_staff() {
        assert_eq!(Role::default(), Role::Member);
        assert!(Role::Admin.is_staff());
        assert!(!Role::Librarian.is_staff());
        assert!(!Role::Member.is_staff());
    }
}
