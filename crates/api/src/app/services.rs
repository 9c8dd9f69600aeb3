//! Storage and token wiring shared by every handler.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use folio_auth::{
    hash_password, verify_password, Hs256JwtValidator, JwtClaims, JwtValidator, NewUser, Profile,
    RegistrationForm, Role, User,
};
use folio_core::UserId;
use folio_infra::{Database, InMemoryDatabase, PgDatabase};

use crate::app::errors::{ApiError, ApiResult};
use crate::config::{AdminBootstrap, ApiConfig};

const BAD_CREDENTIALS: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub struct AppServices {
    db: Arc<dyn Database>,
    jwt: Arc<dyn JwtValidator>,
    token_ttl: chrono::Duration,
    bcrypt_cost: u32,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginGrant {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl AppServices {
    pub fn new(
        db: Arc<dyn Database>,
        jwt: Arc<dyn JwtValidator>,
        token_ttl: chrono::Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            db,
            jwt,
            token_ttl,
            bcrypt_cost,
        }
    }

    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub fn jwt(&self) -> Arc<dyn JwtValidator> {
        Arc::clone(&self.jwt)
    }

    /// Validate the form and create the account together with its Member profile.
    pub async fn register(&self, mut form: RegistrationForm) -> ApiResult<(User, Profile)> {
        form.clean()?;

        let password = std::mem::take(&mut form.password1);
        let cost = self.bcrypt_cost;
        // bcrypt is deliberately slow; keep it off the async workers.
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))??;

        let new_user = NewUser {
            username: form.username,
            email: form.email,
            first_name: form.first_name,
            last_name: form.last_name,
            password_hash,
        };
        let (user, profile) = self.db.create_user(new_user, Utc::now()).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok((user, profile))
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginGrant> {
        let Some(user) = self.db.user_by_username(username.trim()).await? else {
            return Err(ApiError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        };
        if !user.is_active {
            return Err(ApiError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        }

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))??;
        if !matches {
            tracing::info!(username = %user.username, "login refused");
            return Err(ApiError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        }

        let role = self.db.profile(user.id).await?.map(|p| p.role).unwrap_or_default();
        let now = Utc::now();
        let claims = JwtClaims::new(user.id, user.username.clone(), now, self.token_ttl);
        let token = self.jwt.issue(&claims)?;

        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(LoginGrant {
            token,
            token_type: "Bearer",
            expires_at: now + self.token_ttl,
            user_id: user.id,
            username: user.username,
            role,
        })
    }

    /// Create the configured admin account if it does not exist yet.
    ///
    /// An existing account of that name is left untouched.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> ApiResult<()> {
        if self.db.user_by_username(&admin.username).await?.is_some() {
            tracing::info!(username = %admin.username, "bootstrap admin already present");
            return Ok(());
        }

        let form = RegistrationForm {
            username: admin.username.clone(),
            email: admin.email.clone(),
            first_name: String::new(),
            last_name: String::new(),
            password1: admin.password.clone(),
            password2: admin.password.clone(),
        };
        let (user, _) = self.register(form).await?;
        self.db.set_role(user.id, Role::Admin).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "bootstrap admin created");
        Ok(())
    }

    /// Usernames for a set of user ids, for rendering authors.
    pub async fn usernames(&self, ids: &[UserId]) -> ApiResult<HashMap<UserId, String>> {
        let mut names = HashMap::new();
        for &id in ids {
            if names.contains_key(&id) {
                continue;
            }
            if let Some(user) = self.db.user(id).await? {
                names.insert(id, user.username);
            }
        }
        Ok(names)
    }
}

/// Pick the storage backend from config and wire the token codec.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let db: Arc<dyn Database> = match &config.database_url {
        Some(url) => {
            let pg = PgDatabase::connect(url).await?;
            tracing::info!("using PostgreSQL storage");
            Arc::new(pg)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory storage");
            Arc::new(InMemoryDatabase::new())
        }
    };
    let jwt: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes()));

    Ok(AppServices::new(db, jwt, config.token_ttl, config.bcrypt_cost))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services() -> AppServices {
        AppServices::new(
            Arc::new(InMemoryDatabase::new()),
            Arc::new(Hs256JwtValidator::new("unit-secret")),
            chrono::Duration::minutes(5),
            4,
        )
    }

    fn form(username: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password1: "long-enough-pw".to_string(),
            password2: "long-enough-pw".to_string(),
        }
    }

    #[tokio::test]
    async fn registered_users_can_log_in() {
        let services = services();
        let (user, profile) = services.register(form("ada")).await.unwrap();
        assert_eq!(profile.role, Role::Member);

        let grant = services.login("ada", "long-enough-pw").await.unwrap();
        assert_eq!(grant.user_id, user.id);
        let claims = services.jwt().validate(&grant.token, Utc::now()).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let services = services();
        services.register(form("ada")).await.unwrap();

        let wrong = services.login("ada", "nope-nope-nope").await.unwrap_err();
        let unknown = services.login("bob", "long-enough-pw").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let services = services();
        let admin = AdminBootstrap {
            username: "root".to_string(),
            password: "root-password".to_string(),
            email: "root@example.com".to_string(),
        };
        services.ensure_admin(&admin).await.unwrap();
        services.ensure_admin(&admin).await.unwrap();

        let user = services.db().user_by_username("root").await.unwrap().unwrap();
        let profile = services.db().profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert_eq!(services.db().list_users().await.unwrap().len(), 1);
    }
}
