use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use folio_auth::{JwtValidator, Principal};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub services: Arc<AppServices>,
}

/// Resolve the caller from an `Authorization: Bearer` header, if any.
///
/// Public pages stay reachable without a token, so a missing or bad token
/// only means no [`PrincipalContext`] is attached; protected handlers reject
/// at extraction time. The role is read from the stored profile on every
/// request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer(req.headers()) {
        match resolve_principal(&state, token).await {
            Ok(Some(principal)) => {
                req.extensions_mut().insert(PrincipalContext::new(principal));
            }
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}

async fn resolve_principal(state: &AuthState, token: &str) -> Result<Option<Principal>, ApiError> {
    let claims = match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring invalid bearer token");
            return Ok(None);
        }
    };

    let db = state.services.db();
    let Some(user) = db.user(claims.sub).await? else {
        tracing::debug!(user_id = %claims.sub, "token subject no longer exists");
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }
    let role = db.profile(user.id).await?.map(|p| p.role).unwrap_or_default();

    Ok(Some(Principal::new(user.id, user.username, role)))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        assert_eq!(extract_bearer(&headers("Basic Zm9vOmJhcg==")), None);
        assert_eq!(extract_bearer(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
