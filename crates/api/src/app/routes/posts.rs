//! Posts, the home page, search and tag listings.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use folio_blog::{PostForm, COMMENTS_PER_PAGE, HOME_POSTS, POSTS_PER_PAGE};
use folio_core::{Page, PostId};

use crate::app::dto::{self, PageQuery, SearchQuery, TagView};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz::require_post_author;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/slug/:slug", get(post_by_slug))
        .route("/search", get(search))
        .route("/tags/:slug", get(posts_with_tag))
}

pub async fn home(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let mut posts = services.db().list_posts().await?;
    posts.truncate(HOME_POSTS);

    Ok(Json(json!({ "posts": dto::post_views(&services, &posts).await? })).into_response())
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let posts = services.db().list_posts().await?;
    let page = Page::paginate(posts, POSTS_PER_PAGE, query.page());

    Ok(Json(dto::post_page(&services, page).await?).into_response())
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(form): ApiJson<PostForm>,
) -> ApiResult<Response> {
    let draft = form.clean()?;
    let post = services.db().create_post(principal.user_id(), draft, Utc::now()).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "post created");

    Ok((StatusCode::CREATED, Json(dto::post_view(&services, &post).await?)).into_response())
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: PostId = parse_id(&id)?;
    let post = services
        .db()
        .post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("post not found"))?;

    Ok(Json(dto::post_view(&services, &post).await?).into_response())
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<PostForm>,
) -> ApiResult<Response> {
    let id: PostId = parse_id(&id)?;
    let db = services.db();
    let post = db.post(id).await?.ok_or_else(|| ApiError::not_found("post not found"))?;
    require_post_author(&principal, &post)?;

    let draft = form.clean()?;
    let post = db.update_post(id, draft).await?;
    tracing::info!(post_id = %post.id, "post updated");

    Ok(Json(dto::post_view(&services, &post).await?).into_response())
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: PostId = parse_id(&id)?;
    let db = services.db();
    let post = db.post(id).await?.ok_or_else(|| ApiError::not_found("post not found"))?;
    require_post_author(&principal, &post)?;

    db.delete_post(id).await?;
    tracing::info!(post_id = %id, "post deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Post detail by slug with its active comments, oldest first.
pub async fn post_by_slug(
    Extension(services): Extension<Arc<AppServices>>,
    viewer: Option<PrincipalContext>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let db = services.db();
    let post = db
        .post_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("post not found"))?;

    let comments = db.comments_for_post(post.id).await?;
    let total_comments = comments.len();
    let page = Page::paginate(comments, COMMENTS_PER_PAGE, query.page());
    let is_author = viewer.as_ref().is_some_and(|v| post.is_author(v.user_id()));
    let post_view = dto::post_view(&services, &post).await?;
    let comments = dto::comment_page(&services, page).await?;

    Ok(Json(json!({
        "post": post_view,
        "comments": comments,
        "total_comments": total_comments,
        "can_comment": viewer.is_some(),
        "is_author": is_author,
    }))
    .into_response())
}

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let query = query.q.trim().to_string();
    let results = services.db().search_posts(&query).await?;

    Ok(Json(json!({
        "query": query,
        "count": results.len(),
        "results": dto::post_views(&services, &results).await?,
    }))
    .into_response())
}

pub async fn posts_with_tag(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    let db = services.db();
    let tag = db
        .tag_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("tag not found"))?;
    let posts = db.posts_with_tag(tag.id).await?;

    Ok(Json(json!({
        "tag": TagView::from(&tag),
        "posts": dto::post_views(&services, &posts).await?,
    }))
    .into_response())
}
