//! Comment threads under posts.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use folio_blog::{Comment, CommentDeleteForm, CommentForm, Post, COMMENTS_PER_PAGE};
use folio_core::{CommentId, DomainError, Page, PostId};

use crate::app::dto::{self, CommentView, PageQuery};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz::{require_comment_editor, require_comment_remover};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/posts/:id/comments", get(list_comments).post(create_comment))
        .route("/posts/slug/:slug/comments/ajax", post(create_comment_ajax))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
}

async fn load_post(services: &AppServices, raw_id: &str) -> ApiResult<Post> {
    let id: PostId = parse_id(raw_id)?;
    services
        .db()
        .post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("post not found"))
}

/// Deactivated comments are hidden everywhere, so they 404 too.
async fn load_comment(services: &AppServices, raw_id: &str) -> ApiResult<Comment> {
    let id: CommentId = parse_id(raw_id)?;
    services
        .db()
        .comment(id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ApiError::not_found("comment not found"))
}

async fn add_comment(
    services: &AppServices,
    principal: &PrincipalContext,
    post: &Post,
    content: String,
) -> ApiResult<Comment> {
    let comment = Comment::new(CommentId::new(), post.id, principal.user_id(), content, Utc::now());
    services.db().create_comment(&comment).await?;
    tracing::info!(comment_id = %comment.id, post_id = %post.id, "comment added");
    Ok(comment)
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let post = load_post(&services, &id).await?;
    let comments = services.db().comments_for_post(post.id).await?;
    let page = Page::paginate(comments, COMMENTS_PER_PAGE, query.page());

    Ok(Json(json!({
        "post_id": post.id,
        "comments": dto::comment_page(&services, page).await?,
    }))
    .into_response())
}

pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<CommentForm>,
) -> ApiResult<Response> {
    let post = load_post(&services, &id).await?;
    let content = form.clean()?;
    let comment = add_comment(&services, &principal, &post, content).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentView::new(&comment, principal.username())),
    )
        .into_response())
}

/// Same as `create_comment`, answering in the envelope the in-page widget
/// expects: form problems come back as `success: false` with a 200.
pub async fn create_comment_ajax(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(slug): Path<String>,
    ApiJson(form): ApiJson<CommentForm>,
) -> ApiResult<Response> {
    let post = services
        .db()
        .post_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("post not found"))?;

    let content = match form.clean() {
        Ok(content) => content,
        Err(DomainError::Fields(errors)) => {
            return Ok(Json(json!({
                "success": false,
                "errors": errors,
                "message": "Please correct the errors below.",
            }))
            .into_response());
        }
        Err(other) => return Err(other.into()),
    };

    let comment = add_comment(&services, &principal, &post, content).await?;

    Ok(Json(json!({
        "success": true,
        "comment_id": comment.id,
        "author": principal.username(),
        "content": comment.content,
        "created_at": comment.created_at,
        "message": "Comment posted successfully!",
    }))
    .into_response())
}

pub async fn update_comment(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<CommentForm>,
) -> ApiResult<Response> {
    let comment = load_comment(&services, &id).await?;
    require_comment_editor(&principal, &comment)?;

    let content = form.clean()?;
    let comment = services.db().update_comment(comment.id, content, Utc::now()).await?;
    tracing::info!(comment_id = %comment.id, "comment updated");

    let names = services.usernames(&[comment.author_id]).await?;
    let author = names.get(&comment.author_id).map(String::as_str).unwrap_or_default();

    Ok(Json(json!({
        "message": "Comment updated successfully!",
        "comment": CommentView::new(&comment, author),
    }))
    .into_response())
}

/// Deleting needs `{"confirm": true}`; a missing body counts as unconfirmed.
pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    body: Option<ApiJson<CommentDeleteForm>>,
) -> ApiResult<Response> {
    let comment = load_comment(&services, &id).await?;
    require_comment_remover(&principal, &comment)?;

    let form = body.map(|ApiJson(form)| form).unwrap_or_default();
    form.clean()?;

    services.db().delete_comment(comment.id).await?;
    tracing::info!(comment_id = %comment.id, "comment deleted");

    Ok(Json(json!({
        "message": "Comment deleted successfully!",
        "post_id": comment.post_id,
    }))
    .into_response())
}
