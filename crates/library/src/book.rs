use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use folio_core::{AuthorId, BookId, DomainResult, Entity, FieldErrors, LibraryId};

use crate::{check_required_len, NAME_MAX_LEN};

pub const DEFAULT_LANGUAGE: &str = "English";
pub const LANGUAGE_MAX_LEN: usize = 50;

/// A book held by one library and written by one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub library_id: LibraryId,
    pub publication_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub pages: Option<i32>,
    pub language: String,
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> BookId {
        self.id
    }
}

impl core::fmt::Display for Book {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Create/update payload for a book.
///
/// Blank optional strings are treated as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    pub author_id: AuthorId,
    pub library_id: LibraryId,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub pages: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
}

impl BookForm {
    pub fn clean(mut self) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        self.title = self.title.trim().to_string();
        check_required_len(&mut errors, "title", &self.title, NAME_MAX_LEN);

        self.isbn = non_blank(self.isbn.take());
        if let Some(isbn) = &self.isbn {
            let len = isbn.chars().count();
            if len != 10 && len != 13 {
                errors.add("isbn", "ISBN must be either 10 or 13 characters long.");
            }
        }

        if self.pages.is_some_and(|pages| pages <= 0) {
            errors.add("pages", "Ensure this value is greater than 0.");
        }

        self.language = non_blank(self.language.take());
        if let Some(language) = &self.language {
            let len = language.chars().count();
            if len > LANGUAGE_MAX_LEN {
                errors.add(
                    "language",
                    format!("Ensure this value has at most {LANGUAGE_MAX_LEN} characters (it has {len})."),
                );
            }
        }

        errors.into_result()?;
        Ok(self)
    }

    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author_id: self.author_id,
            library_id: self.library_id,
            publication_date: self.publication_date,
            isbn: self.isbn,
            pages: self.pages,
            language: self.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use folio_core::DomainError;
    use proptest::prelude::*;

    use super::*;

    fn form() -> BookForm {
        BookForm {
            title: "The Dispossessed".to_string(),
            author_id: AuthorId::new(),
            library_id: LibraryId::new(),
            publication_date: None,
            isbn: None,
            pages: None,
            language: None,
        }
    }

    fn field_errors(result: DomainResult<BookForm>) -> FieldErrors {
        match result {
            Err(DomainError::Fields(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn language_defaults_to_english() {
        let book = form().clean().unwrap().into_book(BookId::new());
        assert_eq!(book.language, DEFAULT_LANGUAGE);
        assert_eq!(book.to_string(), "The Dispossessed");
    }

    #[test]
    fn blank_isbn_is_absent() {
        let cleaned = BookForm { isbn: Some("  ".to_string()), ..form() }.clean().unwrap();
        assert_eq!(cleaned.isbn, None);
    }

    #[test]
    fn isbn_of_wrong_length_is_rejected() {
        let errors = field_errors(BookForm { isbn: Some("12345".to_string()), ..form() }.clean());
        assert_eq!(
            errors.get("isbn").unwrap(),
            ["ISBN must be either 10 or 13 characters long.".to_string()]
        );
    }

    #[test]
    fn zero_pages_is_rejected() {
        let errors = field_errors(BookForm { pages: Some(0), ..form() }.clean());
        assert!(errors.get("pages").is_some());
    }

    #[test]
    fn title_is_required() {
        let errors = field_errors(BookForm { title: " ".to_string(), ..form() }.clean());
        assert_eq!(errors.get("title").unwrap(), ["This field is required.".to_string()]);
    }

    proptest! {
        #[test]
        fn isbn_accepted_only_at_10_or_13(len in 1usize..20) {
            let result = BookForm { isbn: Some("9".repeat(len)), ..form() }.clean();
            prop_assert_eq!(result.is_ok(), len == 10 || len == 13);
        }
    }
}
