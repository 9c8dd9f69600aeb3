use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::app::errors::ApiError;
use crate::authz::ACCESS_DENIED;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/whoami", get(whoami))
        .route("/access-denied", get(access_denied))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn whoami(principal: PrincipalContext) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": principal.user_id(),
        "username": principal.username(),
        "role": principal.role(),
        "is_staff": principal.is_staff(),
        "permissions": principal.principal().permissions(),
    }))
}

pub async fn access_denied() -> ApiError {
    ApiError::forbidden(ACCESS_DENIED)
}
