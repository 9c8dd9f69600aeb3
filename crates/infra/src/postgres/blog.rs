use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use tracing::instrument;
use uuid::Uuid;

use folio_blog::{
    slugify_or, unique_slug, Comment, Post, PostDraft, Tag, POST_FALLBACK_SLUG, TAG_FALLBACK_SLUG,
};
use folio_core::{CommentId, PostId, TagId, UserId};

use super::{expect_one, like_escape, map_sqlx_error, PgDatabase};
use crate::store::BlogStore;
use crate::{StoreError, StoreResult};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.published_date, p.author_id, p.slug";
const NEWEST_FIRST: &str = "ORDER BY p.published_date DESC, p.id DESC";

const COMMENT_COLUMNS: &str = "id, post_id, author_id, content, created_at, updated_at, is_active";

/// Decodes the post columns; tags are attached separately.
fn post_from_row(row: &PgRow) -> StoreResult<Post> {
    Ok(Post {
        id: PostId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        published_date: row.try_get("published_date")?,
        author_id: UserId::from_uuid(row.try_get("author_id")?),
        slug: row.try_get("slug")?,
        tags: Vec::new(),
    })
}

fn tag_from_row(row: &PgRow) -> StoreResult<Tag> {
    Ok(Tag {
        id: TagId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

fn comment_from_row(row: &PgRow) -> StoreResult<Comment> {
    Ok(Comment {
        id: CommentId::from_uuid(row.try_get("id")?),
        post_id: PostId::from_uuid(row.try_get("post_id")?),
        author_id: UserId::from_uuid(row.try_get("author_id")?),
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_active: row.try_get("is_active")?,
    })
}

/// Slugs equal to `base` or of the form `base-…`.
async fn slugs_like(conn: &mut PgConnection, table: &str, base: &str) -> StoreResult<HashSet<String>> {
    let rows = sqlx::query(&format!(
        r#"SELECT slug FROM {table} WHERE slug = $1 OR slug LIKE $2 ESCAPE '\'"#
    ))
    .bind(base)
    .bind(format!("{}-%", like_escape(base)))
    .fetch_all(conn)
    .await?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("slug").map_err(StoreError::from))
        .collect()
}

/// Hold a transaction-scoped advisory lock on `base` within `table`.
///
/// Concurrent writers that want a slug from the same base queue here, so the
/// read in [`slugs_like`] and the following insert cannot interleave.
async fn lock_slug(conn: &mut PgConnection, table: &str, base: &str) -> StoreResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("{table}:{base}"))
        .execute(conn)
        .await?;
    Ok(())
}

/// Look up each tag by name ignoring case, creating the missing ones.
async fn resolve_tags(conn: &mut PgConnection, names: &[String]) -> StoreResult<Vec<Tag>> {
    let bases: Vec<String> = names.iter().map(|n| slugify_or(n, TAG_FALLBACK_SLUG)).collect();

    // Sorted so two transactions never wait on each other's locks.
    let mut lock_order: Vec<&str> = bases.iter().map(String::as_str).collect();
    lock_order.sort_unstable();
    lock_order.dedup();
    for base in lock_order {
        lock_slug(&mut *conn, "tags", base).await?;
    }

    let mut tags = Vec::with_capacity(names.len());
    for (name, base) in names.iter().zip(&bases) {
        let existing = sqlx::query("SELECT id, name, slug FROM tags WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(row) = existing {
            tags.push(tag_from_row(&row)?);
            continue;
        }

        let taken = slugs_like(&mut *conn, "tags", base).await?;
        let tag = Tag {
            id: TagId::new(),
            name: name.clone(),
            slug: unique_slug(base, |s| taken.contains(s)),
        };
        sqlx::query("INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3)")
            .bind(tag.id.as_uuid())
            .bind(&tag.name)
            .bind(&tag.slug)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("resolve_tags", e))?;
        tags.push(tag);
    }
    Ok(tags)
}

fn tag_position(position: usize) -> StoreResult<i32> {
    i32::try_from(position).map_err(|_| StoreError::Corrupt(format!("tag position {position} out of range")))
}

async fn link_tags(conn: &mut PgConnection, post_id: PostId, tags: &[Tag]) -> StoreResult<()> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id.as_uuid())
        .execute(&mut *conn)
        .await?;
    for (position, tag) in tags.iter().enumerate() {
        sqlx::query("INSERT INTO post_tags (post_id, tag_id, position) VALUES ($1, $2, $3)")
            .bind(post_id.as_uuid())
            .bind(tag.id.as_uuid())
            .bind(tag_position(position)?)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("link_tags", e))?;
    }
    Ok(())
}

impl PgDatabase {
    /// Decode post rows and fill in their tags with one extra query.
    async fn posts_with_tags(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Post>> {
        let mut posts = rows.iter().map(post_from_row).collect::<StoreResult<Vec<_>>>()?;
        if posts.is_empty() {
            return Ok(posts);
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| *p.id.as_uuid()).collect();
        let tag_rows = sqlx::query(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY pt.position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in &tag_rows {
            let post_id: Uuid = row.try_get("post_id")?;
            by_post.entry(post_id).or_default().push(tag_from_row(row)?);
        }
        for post in &mut posts {
            post.tags = by_post.remove(post.id.as_uuid()).unwrap_or_default();
        }
        Ok(posts)
    }

    async fn one_post(&self, row: Option<PgRow>) -> StoreResult<Option<Post>> {
        match row {
            Some(row) => Ok(self.posts_with_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BlogStore for PgDatabase {
    #[instrument(skip(self, draft), fields(title = %draft.title), err)]
    async fn create_post(&self, author_id: UserId, draft: PostDraft, now: DateTime<Utc>) -> StoreResult<Post> {
        let mut tx = self.pool.begin().await?;

        let base = slugify_or(&draft.title, POST_FALLBACK_SLUG);
        lock_slug(&mut tx, "posts", &base).await?;
        let taken = slugs_like(&mut tx, "posts", &base).await?;
        let slug = unique_slug(&base, |s| taken.contains(s));

        let id = PostId::new();
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, published_date, author_id, slug)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(now)
        .bind(author_id.as_uuid())
        .bind(&slug)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_post", e))?;

        let tags = resolve_tags(&mut tx, &draft.tag_names).await?;
        link_tags(&mut tx, id, &tags).await?;
        tx.commit().await?;

        Ok(Post {
            id,
            title: draft.title,
            content: draft.content,
            published_date: now,
            author_id,
            slug,
            tags,
        })
    }

    #[instrument(skip(self, draft), err)]
    async fn update_post(&self, id: PostId, draft: PostDraft) -> StoreResult<Post> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE posts p SET title = $2, content = $3 WHERE p.id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&draft.title)
        .bind(&draft.content)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("post {id}")))?;
        let mut post = post_from_row(&row)?;

        post.tags = resolve_tags(&mut tx, &draft.tag_names).await?;
        link_tags(&mut tx, id, &post.tags).await?;
        tx.commit().await?;
        Ok(post)
    }

    #[instrument(skip(self), err)]
    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), || format!("post {id}"))
    }

    #[instrument(skip(self), err)]
    async fn post(&self, id: PostId) -> StoreResult<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        self.one_post(row).await
    }

    #[instrument(skip(self), err)]
    async fn post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        self.one_post(row).await
    }

    #[instrument(skip(self), err)]
    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts p {NEWEST_FIRST}"))
            .fetch_all(&self.pool)
            .await?;
        self.posts_with_tags(rows).await
    }

    #[instrument(skip(self), err)]
    async fn posts_by_author(&self, author_id: UserId) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.author_id = $1 {NEWEST_FIRST}"
        ))
        .bind(author_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        self.posts_with_tags(rows).await
    }

    #[instrument(skip(self), err)]
    async fn tag_by_slug(&self, slug: &str) -> StoreResult<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, slug FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(tag_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn posts_with_tag(&self, tag_id: TagId) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN post_tags pt ON pt.post_id = p.id
            WHERE pt.tag_id = $1
            {NEWEST_FIRST}
            "#
        ))
        .bind(tag_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        self.posts_with_tags(rows).await
    }

    #[instrument(skip(self), err)]
    async fn search_posts(&self, query: &str) -> StoreResult<Vec<Post>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", like_escape(query));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            WHERE p.title ILIKE $1 ESCAPE '\'
               OR p.content ILIKE $1 ESCAPE '\'
               OR EXISTS (
                    SELECT 1
                    FROM post_tags pt
                    JOIN tags t ON t.id = pt.tag_id
                    WHERE pt.post_id = p.id AND t.name ILIKE $1 ESCAPE '\'
               )
            {NEWEST_FIRST}
            "#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        self.posts_with_tags(rows).await
    }

    #[instrument(skip(self, comment), fields(post_id = %comment.post_id), err)]
    async fn create_comment(&self, comment: &Comment) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(comment.id.as_uuid())
        .bind(comment.post_id.as_uuid())
        .bind(comment.author_id.as_uuid())
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .bind(comment.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_comment", e))?;
        Ok(())
    }

    #[instrument(skip(self, content), err)]
    async fn update_comment(&self, id: CommentId, content: String, now: DateTime<Utc>) -> StoreResult<Comment> {
        let row = sqlx::query(&format!(
            "UPDATE comments SET content = $2, updated_at = $3 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&content)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => comment_from_row(&row),
            None => Err(StoreError::not_found(format!("comment {id}"))),
        }
    }

    #[instrument(skip(self), err)]
    async fn delete_comment(&self, id: CommentId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), || format!("comment {id}"))
    }

    #[instrument(skip(self), err)]
    async fn comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn comments_for_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 AND is_active ORDER BY created_at, id"
        ))
        .bind(post_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(comment_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn comments_by_author(&self, author_id: UserId) -> StoreResult<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE author_id = $1 AND is_active ORDER BY created_at DESC, id DESC"
        ))
        .bind(author_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(comment_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_positions_fit_the_column() {
        assert_eq!(tag_position(0).unwrap(), 0);
        assert_eq!(tag_position(i32::MAX as usize).unwrap(), i32::MAX);
        assert!(matches!(
            tag_position(i32::MAX as usize + 1),
            Err(StoreError::Corrupt(_))
        ));
    }
}
