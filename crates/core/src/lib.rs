//! `folio-core` — shared domain building blocks.
//!
//! Identifiers, the domain error model and pagination. No storage or HTTP
//! concerns live here.

pub mod entity;
pub mod error;
pub mod id;
pub mod page;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{AuthorId, BookId, CommentId, LibrarianId, LibraryId, PostId, TagId, UserId};
pub use page::Page;
