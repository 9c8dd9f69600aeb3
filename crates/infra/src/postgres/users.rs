use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use folio_auth::{NewUser, Profile, Role, User};
use folio_core::UserId;

use super::{expect_one, map_sqlx_error, PgDatabase};
use crate::store::UserStore;
use crate::{StoreError, StoreResult};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_active, date_joined";

const PROFILE_COLUMNS: &str =
    "user_id, role, bio, location, birth_date, website, profile_picture";

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        date_joined: row.try_get("date_joined")?,
    })
}

fn profile_from_row(row: &PgRow) -> StoreResult<Profile> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|_| StoreError::Corrupt(format!("unknown role '{role}'")))?;
    Ok(Profile {
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        role,
        bio: row.try_get("bio")?,
        location: row.try_get("location")?,
        birth_date: row.try_get("birth_date")?,
        website: row.try_get("website")?,
        profile_picture: row.try_get("profile_picture")?,
    })
}

fn username_conflict(operation: &str, err: sqlx::Error) -> StoreError {
    match map_sqlx_error(operation, err) {
        StoreError::Conflict(_) => StoreError::conflict(USERNAME_TAKEN),
        other => other,
    }
}

#[async_trait]
impl UserStore for PgDatabase {
    #[instrument(skip(self, new_user), fields(username = %new_user.username), err)]
    async fn create_user(&self, new_user: NewUser, now: DateTime<Utc>) -> StoreResult<(User, Profile)> {
        let user = new_user.into_user(UserId::new(), now);
        let profile = Profile::default_for(user.id);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_active, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.date_joined)
        .execute(&mut *tx)
        .await
        .map_err(|e| username_conflict("create_user", e))?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, role, bio, location, birth_date, website, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(profile.role.as_str())
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(profile.birth_date)
        .bind(&profile.website)
        .bind(&profile.profile_picture)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        tx.commit().await?;
        Ok((user, profile))
    }

    #[instrument(skip(self), err)]
    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn profile(&self, user_id: UserId) -> StoreResult<Option<Profile>> {
        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    #[instrument(skip(self, user, profile), fields(user_id = %user.id), err)]
    async fn update_account(&self, user: &User, profile: &Profile) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, first_name = $4, last_name = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| username_conflict("update_account", e))?;
        expect_one(updated.rows_affected(), || format!("user {}", user.id))?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET bio = $2, location = $3, birth_date = $4, website = $5, profile_picture = $6
            WHERE user_id = $1
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(profile.birth_date)
        .bind(&profile.website)
        .bind(&profile.profile_picture)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_account", e))?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<Profile> {
        let row = sqlx::query(&format!(
            "UPDATE profiles SET role = $2 WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => profile_from_row(&row),
            None => Err(StoreError::not_found(format!("profile for user {user_id}"))),
        }
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        // Profile, posts (with their comments and tag links) and comments
        // follow through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), || format!("user {id}"))
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }
}

