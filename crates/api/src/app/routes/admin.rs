//! Role dashboards and user role administration.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use folio_auth::Role;

use crate::app::dto::RoleChangeRequest;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz::require_role;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/admin/users/:username/role", put(change_role))
        .route("/librarian", get(librarian_dashboard))
        .route("/member", get(member_dashboard))
}

fn welcome(principal: &PrincipalContext, access: &str) -> String {
    format!("Welcome, {}! You have {access} access.", principal.username())
}

pub async fn admin_dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let db = services.db();
    let users = db.list_users().await?.len();
    let posts = db.list_posts().await?.len();
    let books = db.list_books().await?.len();
    let libraries = db.list_libraries().await?.len();
    let authors = db.list_authors().await?.len();

    Ok(Json(json!({
        "message": welcome(&principal, "admin"),
        "role": principal.role(),
        "stats": {
            "users": users,
            "posts": posts,
            "books": books,
            "libraries": libraries,
            "authors": authors,
        },
    }))
    .into_response())
}

pub async fn librarian_dashboard(principal: PrincipalContext) -> ApiResult<Response> {
    require_role(&principal, Role::Librarian)?;

    Ok(Json(json!({
        "message": welcome(&principal, "librarian"),
        "role": principal.role(),
    }))
    .into_response())
}

pub async fn member_dashboard(principal: PrincipalContext) -> ApiResult<Response> {
    require_role(&principal, Role::Member)?;

    Ok(Json(json!({
        "message": welcome(&principal, "member"),
        "role": principal.role(),
    }))
    .into_response())
}

/// Takes effect on the target's next request; roles are never cached in tokens.
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(username): Path<String>,
    ApiJson(body): ApiJson<RoleChangeRequest>,
) -> ApiResult<Response> {
    require_role(&principal, Role::Admin)?;

    let role: Role = body.role.parse()?;
    let db = services.db();
    let user = db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let profile = db.set_role(user.id, role).await?;
    tracing::info!(user_id = %user.id, role = %profile.role, by = %principal.user_id(), "role changed");

    Ok(Json(json!({
        "username": user.username,
        "role": profile.role,
    }))
    .into_response())
}
