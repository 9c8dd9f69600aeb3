//! Registration, login and user profiles.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use folio_auth::RegistrationForm;
use folio_blog::USER_COMMENTS_PER_PAGE;
use folio_core::{DomainError, DomainResult, FieldErrors, Page};

use crate::app::dto::{self, LoginRequest, PageQuery, ProfileUpdateRequest, ProfileView, PublicUserView};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(own_profile).put(update_profile))
        .route("/profile/:username", get(public_profile))
        .route("/users/:username/comments", get(user_comments))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(form): ApiJson<RegistrationForm>,
) -> ApiResult<Response> {
    let (user, profile) = services.register(form).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Account created for {}! You can now log in.", user.username),
            "user": PublicUserView::from(&user),
            "email": user.email,
            "profile": ProfileView::from(&profile),
        })),
    )
        .into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let grant = services.login(&body.username, &body.password).await?;
    Ok(Json(grant).into_response())
}

/// Tokens are stateless; the client forgets its token.
pub async fn logout(principal: PrincipalContext) -> impl IntoResponse {
    tracing::info!(user_id = %principal.user_id(), "logout");
    Json(json!({ "message": "You have been logged out." }))
}

pub async fn own_profile(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> ApiResult<Response> {
    let db = services.db();
    let user = db
        .user(principal.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let profile = db
        .profile(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;
    let posts = db.posts_by_author(user.id).await?;

    Ok(Json(json!({
        "user": PublicUserView::from(&user),
        "email": user.email,
        "profile": ProfileView::from(&profile),
        "posts": dto::post_views(&services, &posts).await?,
    }))
    .into_response())
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(mut body): ApiJson<ProfileUpdateRequest>,
) -> ApiResult<Response> {
    let user_check = body.user.clean();
    let profile_check = body.profile.clean();
    merge_checks([user_check, profile_check])?;

    let db = services.db();
    let mut user = db
        .user(principal.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let mut profile = db
        .profile(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;

    body.user.apply_to(&mut user);
    body.profile.apply_to(&mut profile);
    db.update_account(&user, &profile).await?;
    tracing::info!(user_id = %user.id, "profile updated");

    Ok(Json(json!({
        "message": "Your account has been updated!",
        "user": PublicUserView::from(&user),
        "email": user.email,
        "profile": ProfileView::from(&profile),
    }))
    .into_response())
}

pub async fn public_profile(
    Extension(services): Extension<Arc<AppServices>>,
    viewer: Option<PrincipalContext>,
    Path(username): Path<String>,
) -> ApiResult<Response> {
    let db = services.db();
    let user = db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let profile = db
        .profile(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;
    let posts = db.posts_by_author(user.id).await?;

    Ok(Json(json!({
        "user": PublicUserView::from(&user),
        "profile": ProfileView::from(&profile),
        "posts": dto::post_views(&services, &posts).await?,
        "is_own_profile": viewer.is_some_and(|v| v.user_id() == user.id),
    }))
    .into_response())
}

pub async fn user_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let db = services.db();
    let user = db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let comments = db.comments_by_author(user.id).await?;
    let page = Page::paginate(comments, USER_COMMENTS_PER_PAGE, query.page());

    Ok(Json(json!({
        "user": PublicUserView::from(&user),
        "comments": dto::comment_page(&services, page).await?,
    }))
    .into_response())
}

/// Combine several form checks so every field problem is reported at once.
fn merge_checks(checks: impl IntoIterator<Item = DomainResult<()>>) -> DomainResult<()> {
    let mut errors = FieldErrors::new();
    for check in checks {
        match check {
            Ok(()) => {}
            Err(DomainError::Fields(fields)) => errors.merge(fields),
            Err(other) => return Err(other),
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_checks_keep_every_field() {
        let merged = merge_checks([
            Err(DomainError::field("username", "bad")),
            Ok(()),
            Err(DomainError::field("website", "Enter a valid URL.")),
        ]);
        let Err(DomainError::Fields(fields)) = merged else {
            panic!("expected field errors");
        };
        assert!(fields.get("username").is_some());
        assert!(fields.get("website").is_some());
    }

    #[test]
    fn all_passing_checks_pass() {
        assert_eq!(merge_checks([Ok(()), Ok(())]), Ok(()));
    }
}
