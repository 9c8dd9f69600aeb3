use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use folio_core::{AuthorId, BookId, LibrarianId, LibraryId};
use folio_library::{Author, Book, Librarian, Library};

use super::{expect_one, map_sqlx_error, PgDatabase};
use crate::store::CatalogStore;
use crate::{StoreError, StoreResult};

const BOOK_COLUMNS: &str =
    "id, title, author_id, library_id, publication_date, isbn, pages, language";

fn author_from_row(row: &PgRow) -> StoreResult<Author> {
    Ok(Author {
        id: AuthorId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
    })
}

fn library_from_row(row: &PgRow) -> StoreResult<Library> {
    Ok(Library {
        id: LibraryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        location: row.try_get("location")?,
    })
}

fn librarian_from_row(row: &PgRow) -> StoreResult<Librarian> {
    Ok(Librarian {
        id: LibrarianId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        library_id: LibraryId::from_uuid(row.try_get("library_id")?),
    })
}

fn book_from_row(row: &PgRow) -> StoreResult<Book> {
    Ok(Book {
        id: BookId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        author_id: AuthorId::from_uuid(row.try_get("author_id")?),
        library_id: LibraryId::from_uuid(row.try_get("library_id")?),
        publication_date: row.try_get("publication_date")?,
        isbn: row.try_get("isbn")?,
        pages: row.try_get("pages")?,
        language: row.try_get("language")?,
    })
}

#[async_trait]
impl CatalogStore for PgDatabase {
    #[instrument(skip(self, author), fields(author_id = %author.id), err)]
    async fn create_author(&self, author: &Author) -> StoreResult<()> {
        sqlx::query("INSERT INTO authors (id, name) VALUES ($1, $2)")
            .bind(author.id.as_uuid())
            .bind(&author.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_author", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn author(&self, id: AuthorId) -> StoreResult<Option<Author>> {
        let row = sqlx::query("SELECT id, name FROM authors WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(author_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let rows = sqlx::query("SELECT id, name FROM authors ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(author_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete_author(&self, id: AuthorId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), || format!("author {id}"))
    }

    #[instrument(skip(self, library), fields(library_id = %library.id), err)]
    async fn create_library(&self, library: &Library) -> StoreResult<()> {
        sqlx::query("INSERT INTO libraries (id, name, location) VALUES ($1, $2, $3)")
            .bind(library.id.as_uuid())
            .bind(&library.name)
            .bind(&library.location)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_library", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn library(&self, id: LibraryId) -> StoreResult<Option<Library>> {
        let row = sqlx::query("SELECT id, name, location FROM libraries WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(library_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_libraries(&self) -> StoreResult<Vec<Library>> {
        let rows = sqlx::query("SELECT id, name, location FROM libraries ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(library_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete_library(&self, id: LibraryId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), || format!("library {id}"))
    }

    #[instrument(skip(self, librarian), fields(library_id = %librarian.library_id), err)]
    async fn appoint_librarian(&self, librarian: &Librarian) -> StoreResult<()> {
        sqlx::query("INSERT INTO librarians (id, name, library_id) VALUES ($1, $2, $3)")
            .bind(librarian.id.as_uuid())
            .bind(&librarian.name)
            .bind(librarian.library_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| match map_sqlx_error("appoint_librarian", e) {
                StoreError::Conflict(_) => StoreError::conflict("This library already has a librarian."),
                other => other,
            })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn librarian_for(&self, library_id: LibraryId) -> StoreResult<Option<Librarian>> {
        let row = sqlx::query("SELECT id, name, library_id FROM librarians WHERE library_id = $1")
            .bind(library_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(librarian_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_librarians(&self) -> StoreResult<Vec<Librarian>> {
        let rows = sqlx::query("SELECT id, name, library_id FROM librarians ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(librarian_from_row).collect()
    }

    #[instrument(skip(self, book), fields(book_id = %book.id), err)]
    async fn create_book(&self, book: &Book) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author_id, library_id, publication_date, isbn, pages, language)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.title)
        .bind(book.author_id.as_uuid())
        .bind(book.library_id.as_uuid())
        .bind(book.publication_date)
        .bind(&book.isbn)
        .bind(book.pages)
        .bind(&book.language)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_book", e))?;
        Ok(())
    }

    #[instrument(skip(self, book), fields(book_id = %book.id), err)]
    async fn update_book(&self, book: &Book) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, library_id = $4, publication_date = $5,
                isbn = $6, pages = $7, language = $8
            WHERE id = $1
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.title)
        .bind(book.author_id.as_uuid())
        .bind(book.library_id.as_uuid())
        .bind(book.publication_date)
        .bind(&book.isbn)
        .bind(book.pages)
        .bind(&book.language)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_book", e))?;
        expect_one(result.rows_affected(), || format!("book {}", book.id))
    }

    #[instrument(skip(self), err)]
    async fn book(&self, id: BookId) -> StoreResult<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(book_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_book(&self, id: BookId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), || format!("book {id}"))
    }

    #[instrument(skip(self), err)]
    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title, id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(book_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn books_in_library(&self, library_id: LibraryId) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE library_id = $1 ORDER BY title, id"
        ))
        .bind(library_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(book_from_row).collect()
    }
}
