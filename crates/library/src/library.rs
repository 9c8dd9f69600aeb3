use serde::{Deserialize, Serialize};

use folio_core::{DomainResult, Entity, FieldErrors, LibraryId};

use crate::{check_required_len, NAME_MAX_LEN};

/// A library branch holding books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub location: String,
}

impl Entity for Library {
    type Id = LibraryId;

    fn id(&self) -> LibraryId {
        self.id
    }
}

impl core::fmt::Display for Library {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

impl LibraryForm {
    pub fn clean(mut self) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        self.name = self.name.trim().to_string();
        self.location = self.location.trim().to_string();
        check_required_len(&mut errors, "name", &self.name, NAME_MAX_LEN);
        check_required_len(&mut errors, "location", &self.location, NAME_MAX_LEN);
        errors.into_result()?;
        Ok(self)
    }

    pub fn into_library(self, id: LibraryId) -> Library {
        Library {
            id,
            name: self.name,
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use folio_core::DomainError;

    use super::*;

    #[test]
    fn both_fields_are_required() {
        let err = LibraryForm {
            name: String::new(),
            location: String::new(),
        }
        .clean()
        .unwrap_err();

        let DomainError::Fields(errors) = err else {
            panic!("expected field errors");
        };
        assert!(errors.get("name").is_some());
        assert!(errors.get("location").is_some());
    }

    #[test]
    fn long_location_is_rejected() {
        let result = LibraryForm {
            name: "Central".to_string(),
            location: "x".repeat(101),
        }
        .clean();
        assert!(result.is_err());
    }
}
