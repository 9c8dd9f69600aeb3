use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use folio_auth::{Profile, ProfileUpdate, Role, User, UserUpdate};
use folio_blog::{Comment, Post, Tag};
use folio_core::{AuthorId, BookId, CommentId, LibraryId, Page, PostId, UserId};
use folio_library::{Author, Book, Library};

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `PUT /profile`: account and profile fields in one flat object.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(flatten)]
    pub user: UserUpdate,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// -------------------------
// Response views
// -------------------------

/// What anyone may see about a user.
#[derive(Debug, Serialize)]
pub struct PublicUserView {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for PublicUserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub role: Role,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
    pub website: String,
    pub profile_picture: String,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            role: profile.role,
            bio: profile.bio.clone(),
            location: profile.location.clone(),
            birth_date: profile.birth_date,
            website: profile.website.clone(),
            profile_picture: profile.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagView {
    pub name: String,
    pub slug: String,
}

impl From<&Tag> for TagView {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub author_id: UserId,
    pub author: String,
    pub tags: Vec<TagView>,
}

impl PostView {
    pub fn new(post: &Post, author: &str) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            published_date: post.published_date,
            author_id: post.author_id,
            author: author.to_string(),
            tags: post.tags.iter().map(TagView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: &Comment, author: &str) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            author: author.to_string(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookView {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub author: String,
    pub library_id: LibraryId,
    pub library: String,
    pub publication_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub pages: Option<i32>,
    pub language: String,
}

/// Row of the minimal JSON book list.
#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
}

// -------------------------
// Mapping helpers
// -------------------------

fn name_of(names: &HashMap<UserId, String>, id: UserId) -> &str {
    names.get(&id).map(String::as_str).unwrap_or_default()
}

fn author_ids(ids: impl Iterator<Item = UserId>) -> Vec<UserId> {
    ids.collect()
}

pub async fn post_views(services: &AppServices, posts: &[Post]) -> ApiResult<Vec<PostView>> {
    let names = services.usernames(&author_ids(posts.iter().map(|p| p.author_id))).await?;
    Ok(posts
        .iter()
        .map(|p| PostView::new(p, name_of(&names, p.author_id)))
        .collect())
}

pub async fn post_view(services: &AppServices, post: &Post) -> ApiResult<PostView> {
    let names = services.usernames(&[post.author_id]).await?;
    Ok(PostView::new(post, name_of(&names, post.author_id)))
}

pub async fn post_page(services: &AppServices, page: Page<Post>) -> ApiResult<Page<PostView>> {
    let names = services.usernames(&author_ids(page.items.iter().map(|p| p.author_id))).await?;
    Ok(page.map(|p| PostView::new(&p, name_of(&names, p.author_id))))
}

pub async fn comment_page(services: &AppServices, page: Page<Comment>) -> ApiResult<Page<CommentView>> {
    let names = services.usernames(&author_ids(page.items.iter().map(|c| c.author_id))).await?;
    Ok(page.map(|c| CommentView::new(&c, name_of(&names, c.author_id))))
}

/// Join books with their author and library names.
pub fn book_views(books: &[Book], authors: &[Author], libraries: &[Library]) -> Vec<BookView> {
    let authors: HashMap<AuthorId, &str> = authors.iter().map(|a| (a.id, a.name.as_str())).collect();
    let libraries: HashMap<LibraryId, &str> = libraries.iter().map(|l| (l.id, l.name.as_str())).collect();

    books
        .iter()
        .map(|b| BookView {
            id: b.id,
            title: b.title.clone(),
            author_id: b.author_id,
            author: authors.get(&b.author_id).copied().unwrap_or_default().to_string(),
            library_id: b.library_id,
            library: libraries.get(&b.library_id).copied().unwrap_or_default().to_string(),
            publication_date: b.publication_date,
            isbn: b.isbn.clone(),
            pages: b.pages,
            language: b.language.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_request_reads_one_flat_object() {
        let req: ProfileUpdateRequest = serde_json::from_value(serde_json::json!({
            "username": "ada",
            "email": "ada@example.com",
            "bio": "Counts things.",
            "website": "https://ada.dev"
        }))
        .unwrap();
        assert_eq!(req.user.username, "ada");
        assert_eq!(req.profile.bio, "Counts things.");
        assert_eq!(req.user.first_name, "");
    }

    #[test]
    fn book_views_fill_in_names() {
        let author = Author { id: AuthorId::new(), name: "Le Guin".to_string() };
        let library = Library {
            id: LibraryId::new(),
            name: "Central".to_string(),
            location: "Main St".to_string(),
        };
        let book = Book {
            id: BookId::new(),
            title: "The Dispossessed".to_string(),
            author_id: author.id,
            library_id: library.id,
            publication_date: None,
            isbn: None,
            pages: Some(387),
            language: "English".to_string(),
        };

        let views = book_views(&[book], &[author], &[library]);
        assert_eq!(views[0].author, "Le Guin");
        assert_eq!(views[0].library, "Central");
    }
}
