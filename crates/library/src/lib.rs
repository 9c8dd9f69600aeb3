//! Library catalog domain: authors, library branches, their books and
//! librarians.

pub mod author;
pub mod book;
pub mod librarian;
pub mod library;

pub use author::{Author, AuthorForm};
pub use book::{Book, BookForm, DEFAULT_LANGUAGE};
pub use librarian::{Librarian, LibrarianForm};
pub use library::{Library, LibraryForm};

/// Longest name, title or location the catalog accepts.
pub const NAME_MAX_LEN: usize = 100;

pub(crate) fn check_required_len(
    errors: &mut folio_core::FieldErrors,
    field: &'static str,
    value: &str,
    max: usize,
) {
    let len = value.chars().count();
    if len == 0 {
        errors.add(field, "This field is required.");
    } else if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}
