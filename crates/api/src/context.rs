use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use folio_auth::{Principal, Role};
use folio_core::UserId;

use crate::app::errors::ApiError;

/// The authenticated caller for a request.
///
/// Inserted by the auth middleware once the bearer token checks out and the
/// account is still active. Extracting it from a request that carries no
/// valid token rejects with 401, so handlers that take a `PrincipalContext`
/// are protected; handlers that take `Option<PrincipalContext>` are not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn is_staff(&self) -> bool {
        self.principal.is_staff()
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PrincipalContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalContext>()
            .cloned()
            .ok_or_else(ApiError::unauthenticated)
    }
}
