use axum::Router;

use folio_core::DomainError;

use crate::app::errors::ApiResult;

pub mod accounts;
pub mod admin;
pub mod comments;
pub mod library;
pub mod posts;
pub mod system;

/// Every endpoint. Access checks happen per handler through the
/// `PrincipalContext` extractor and the guards in `crate::authz`.
pub fn router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(accounts::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(library::router())
        .merge(admin::router())
}

/// Parse a path segment into a typed id; malformed ids are a 400.
pub(crate) fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: core::str::FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}
