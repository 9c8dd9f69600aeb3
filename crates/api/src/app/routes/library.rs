//! The library catalog: books, libraries, librarians and authors.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;

use folio_auth::{Permission, Role};
use folio_core::{AuthorId, BookId, FieldErrors, LibrarianId, LibraryId};
use folio_library::{AuthorForm, BookForm, LibrarianForm, LibraryForm};

use crate::app::dto::{self, BookSummary};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz::{require_permission, require_role};
use crate::context::PrincipalContext;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

pub fn router() -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/:id", put(update_book).delete(delete_book))
        .route("/api/books", get(api_books))
        .route("/libraries", get(list_libraries).post(create_library))
        .route("/libraries/:id", get(library_detail).delete(delete_library))
        .route("/libraries/:id/librarian", post(appoint_librarian))
        .route("/authors", get(list_authors).post(create_author))
        .route("/authors/:id", delete(delete_author))
}

// ─────────────────────────────────────────────────────────────────────────────
// Books
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_books(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let db = services.db();
    let books = db.list_books().await?;
    let authors = db.list_authors().await?;
    let libraries = db.list_libraries().await?;

    Ok(Json(json!({ "books": dto::book_views(&books, &authors, &libraries) })).into_response())
}

/// Bare JSON array for API clients.
pub async fn api_books(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let db = services.db();
    let books = db.list_books().await?;
    let authors = db.list_authors().await?;
    let libraries = db.list_libraries().await?;

    let summaries: Vec<BookSummary> = dto::book_views(&books, &authors, &libraries)
        .into_iter()
        .map(|b| BookSummary {
            id: b.id,
            title: b.title,
            author: b.author,
        })
        .collect();
    Ok(Json(summaries).into_response())
}

/// The referenced author and library must exist; reported as form errors.
async fn check_book_refs(services: &AppServices, form: &BookForm) -> ApiResult<()> {
    let db = services.db();
    let mut errors = FieldErrors::new();
    if db.author(form.author_id).await?.is_none() {
        errors.add("author_id", INVALID_CHOICE);
    }
    if db.library(form.library_id).await?.is_none() {
        errors.add("library_id", INVALID_CHOICE);
    }
    errors.into_result().map_err(ApiError::from)
}

pub async fn create_book(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(form): ApiJson<BookForm>,
) -> ApiResult<Response> {
    require_permission(&principal, &Permission::BOOKS_CREATE)?;

    let form = form.clean()?;
    check_book_refs(&services, &form).await?;
    let book = form.into_book(BookId::new());
    services.db().create_book(&book).await?;
    tracing::info!(book_id = %book.id, "book created");

    Ok((StatusCode::CREATED, Json(book)).into_response())
}

pub async fn update_book(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<BookForm>,
) -> ApiResult<Response> {
    require_permission(&principal, &Permission::BOOKS_EDIT)?;

    let id: BookId = parse_id(&id)?;
    if services.db().book(id).await?.is_none() {
        return Err(ApiError::not_found("book not found"));
    }

    let form = form.clean()?;
    check_book_refs(&services, &form).await?;
    let book = form.into_book(id);
    services.db().update_book(&book).await?;
    tracing::info!(book_id = %book.id, "book updated");

    Ok(Json(book).into_response())
}

pub async fn delete_book(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    require_permission(&principal, &Permission::BOOKS_DELETE)?;

    let id: BookId = parse_id(&id)?;
    services.db().delete_book(id).await?;
    tracing::info!(book_id = %id, "book deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Libraries and librarians
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_libraries(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let libraries = services.db().list_libraries().await?;
    Ok(Json(json!({ "libraries": libraries })).into_response())
}

pub async fn library_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: LibraryId = parse_id(&id)?;
    let db = services.db();
    let library = db
        .library(id)
        .await?
        .ok_or_else(|| ApiError::not_found("library not found"))?;
    let books = db.books_in_library(id).await?;
    let authors = db.list_authors().await?;
    let librarian = db.librarian_for(id).await?;

    Ok(Json(json!({
        "books": dto::book_views(&books, &authors, std::slice::from_ref(&library)),
        "library": library,
        "librarian": librarian,
    }))
    .into_response())
}

pub async fn create_library(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(form): ApiJson<LibraryForm>,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let library = form.clean()?.into_library(LibraryId::new());
    services.db().create_library(&library).await?;
    tracing::info!(library_id = %library.id, "library created");

    Ok((StatusCode::CREATED, Json(library)).into_response())
}

/// Removes the library with its books and librarian.
pub async fn delete_library(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let id: LibraryId = parse_id(&id)?;
    services.db().delete_library(id).await?;
    tracing::info!(library_id = %id, "library deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn appoint_librarian(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<LibrarianForm>,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let library_id: LibraryId = parse_id(&id)?;
    if services.db().library(library_id).await?.is_none() {
        return Err(ApiError::not_found("library not found"));
    }

    let librarian = form.clean()?.into_librarian(LibrarianId::new(), library_id);
    services.db().appoint_librarian(&librarian).await?;
    tracing::info!(library_id = %library_id, librarian_id = %librarian.id, "librarian appointed");

    Ok((StatusCode::CREATED, Json(librarian)).into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authors
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_authors(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let authors = services.db().list_authors().await?;
    Ok(Json(json!({ "authors": authors })).into_response())
}

pub async fn create_author(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(form): ApiJson<AuthorForm>,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let author = form.clean()?.into_author(AuthorId::new());
    services.db().create_author(&author).await?;
    tracing::info!(author_id = %author.id, "author created");

    Ok((StatusCode::CREATED, Json(author)).into_response())
}

pub async fn delete_author(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let id: AuthorId = parse_id(&id)?;
    services.db().delete_author(id).await?;
    tracing::info!(author_id = %id, "author deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
