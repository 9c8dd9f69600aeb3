//! Storage traits shared by every backend.
//!
//! Each backend must give the same answers: cascades on delete, atomic
//! user + profile creation, slug uniqueness and the same orderings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use folio_auth::{NewUser, Profile, Role, User};
use folio_blog::{Comment, Post, PostDraft, Tag};
use folio_core::{AuthorId, BookId, CommentId, LibraryId, PostId, TagId, UserId};
use folio_library::{Author, Book, Librarian, Library};

use crate::StoreResult;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the account and its Member profile in one step.
    ///
    /// Fails with `Conflict` if the username is taken.
    async fn create_user(&self, new_user: NewUser, now: DateTime<Utc>) -> StoreResult<(User, Profile)>;

    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn profile(&self, user_id: UserId) -> StoreResult<Option<Profile>>;

    /// Persist edited account and profile fields together.
    async fn update_account(&self, user: &User, profile: &Profile) -> StoreResult<()>;

    async fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<Profile>;

    /// Removes the user's profile, posts and comments too.
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;

    /// All users, by username.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_author(&self, author: &Author) -> StoreResult<()>;
    async fn author(&self, id: AuthorId) -> StoreResult<Option<Author>>;
    async fn list_authors(&self) -> StoreResult<Vec<Author>>;
    /// Removes the author's books too.
    async fn delete_author(&self, id: AuthorId) -> StoreResult<()>;

    async fn create_library(&self, library: &Library) -> StoreResult<()>;
    async fn library(&self, id: LibraryId) -> StoreResult<Option<Library>>;
    async fn list_libraries(&self) -> StoreResult<Vec<Library>>;
    /// Removes the library's books and librarian too.
    async fn delete_library(&self, id: LibraryId) -> StoreResult<()>;

    /// Fails with `Conflict` if the library already has a librarian.
    async fn appoint_librarian(&self, librarian: &Librarian) -> StoreResult<()>;
    async fn librarian_for(&self, library_id: LibraryId) -> StoreResult<Option<Librarian>>;
    async fn list_librarians(&self) -> StoreResult<Vec<Librarian>>;

    /// Fails with `NotFound` if the author or library does not exist.
    async fn create_book(&self, book: &Book) -> StoreResult<()>;
    async fn update_book(&self, book: &Book) -> StoreResult<()>;
    async fn book(&self, id: BookId) -> StoreResult<Option<Book>>;
    async fn delete_book(&self, id: BookId) -> StoreResult<()>;
    /// All books, by title.
    async fn list_books(&self) -> StoreResult<Vec<Book>>;
    async fn books_in_library(&self, library_id: LibraryId) -> StoreResult<Vec<Book>>;
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Store a new post, assigning a unique slug and linking its tags
    /// (creating any tag not seen before).
    async fn create_post(&self, author_id: UserId, draft: PostDraft, now: DateTime<Utc>) -> StoreResult<Post>;

    /// Replace title, content and tags. The slug is kept.
    async fn update_post(&self, id: PostId, draft: PostDraft) -> StoreResult<Post>;

    /// Removes the post's comments and tag links too.
    async fn delete_post(&self, id: PostId) -> StoreResult<()>;

    async fn post(&self, id: PostId) -> StoreResult<Option<Post>>;
    async fn post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>>;

    /// All posts, newest first.
    async fn list_posts(&self) -> StoreResult<Vec<Post>>;
    async fn posts_by_author(&self, author_id: UserId) -> StoreResult<Vec<Post>>;

    async fn tag_by_slug(&self, slug: &str) -> StoreResult<Option<Tag>>;
    async fn posts_with_tag(&self, tag_id: TagId) -> StoreResult<Vec<Post>>;

    /// Case-insensitive match on title, content or tag name, newest first.
    async fn search_posts(&self, query: &str) -> StoreResult<Vec<Post>>;

    /// Fails with `NotFound` if the post does not exist.
    async fn create_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn update_comment(&self, id: CommentId, content: String, now: DateTime<Utc>) -> StoreResult<Comment>;
    async fn delete_comment(&self, id: CommentId) -> StoreResult<()>;
    async fn comment(&self, id: CommentId) -> StoreResult<Option<Comment>>;

    /// Active comments on a post, oldest first.
    async fn comments_for_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>>;

    /// Active comments by a user, newest first.
    async fn comments_by_author(&self, author_id: UserId) -> StoreResult<Vec<Comment>>;
}

/// Everything the application needs from storage.
pub trait Database: UserStore + CatalogStore + BlogStore {}

impl<T> Database for T where T: UserStore + CatalogStore + BlogStore {}
