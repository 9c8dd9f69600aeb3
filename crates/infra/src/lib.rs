//! Infrastructure layer: persistence for accounts, the library catalog and
//! the blog.
//!
//! Two interchangeable backends implement the [`store`] traits:
//! [`memory::InMemoryDatabase`] for tests and development, and
//! [`postgres::PgDatabase`] backed by sqlx.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;


pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDatabase;
pub use postgres::PgDatabase;
pub use store::{BlogStore, CatalogStore, Database, UserStore};
