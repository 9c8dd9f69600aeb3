use serde::{Deserialize, Serialize};

use folio_core::{DomainResult, Entity, FieldErrors, LibrarianId, LibraryId};

use crate::{check_required_len, NAME_MAX_LEN};

/// The librarian running a library. Each library has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Librarian {
    pub id: LibrarianId,
    pub name: String,
    pub library_id: LibraryId,
}

impl Entity for Librarian {
    type Id = LibrarianId;

    fn id(&self) -> LibrarianId {
        self.id
    }
}

impl core::fmt::Display for Librarian {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibrarianForm {
    #[serde(default)]
    pub name: String,
}

impl LibrarianForm {
    pub fn clean(mut self) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        self.name = self.name.trim().to_string();
        check_required_len(&mut errors, "name", &self.name, NAME_MAX_LEN);
        errors.into_result()?;
        Ok(self)
    }

    pub fn into_librarian(self, id: LibrarianId, library_id: LibraryId) -> Librarian {
        Librarian {
            id,
            name: self.name,
            library_id,
        }
    }
}
