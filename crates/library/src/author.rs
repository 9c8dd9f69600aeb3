use serde::{Deserialize, Serialize};

use folio_core::{AuthorId, DomainResult, Entity, FieldErrors};

use crate::{check_required_len, NAME_MAX_LEN};

/// A book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

impl Entity for Author {
    type Id = AuthorId;

    fn id(&self) -> AuthorId {
        self.id
    }
}

impl core::fmt::Display for Author {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorForm {
    #[serde(default)]
    pub name: String,
}

impl AuthorForm {
    pub fn clean(mut self) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        self.name = self.name.trim().to_string();
        check_required_len(&mut errors, "name", &self.name, NAME_MAX_LEN);
        errors.into_result()?;
        Ok(self)
    }

    pub fn into_author(self, id: AuthorId) -> Author {
        Author { id, name: self.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_required() {
        let form = AuthorForm { name: "  Ursula K. Le Guin ".to_string() }.clean().unwrap();
        assert_eq!(form.name, "Ursula K. Le Guin");

        assert!(AuthorForm { name: "   ".to_string() }.clean().is_err());
    }

    #[test]
    fn displays_as_name() {
        let author = AuthorForm { name: "Octavia Butler".to_string() }
            .clean()
            .unwrap()
            .into_author(AuthorId::new());
        assert_eq!(author.to_string(), "Octavia Butler");
    }
}
