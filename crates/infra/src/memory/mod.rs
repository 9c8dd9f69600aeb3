//! In-memory backend for tests and local development.
//!
//! All tables sit behind one `RwLock`, so every operation (cascades
//! included) is atomic with respect to the others.

mod table;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use folio_auth::{NewUser, Profile, Role, User};
use folio_blog::{
    search, slugify_or, unique_slug, Comment, Post, PostDraft, Tag, POST_FALLBACK_SLUG, TAG_FALLBACK_SLUG,
};
use folio_core::{AuthorId, BookId, CommentId, LibraryId, PostId, TagId, UserId};
use folio_library::{Author, Book, Librarian, Library};

use crate::store::{BlogStore, CatalogStore, UserStore};
use crate::{StoreError, StoreResult};

use table::Table;

#[derive(Debug, Default)]
struct State {
    users: Table<User>,
    profiles: Table<Profile>,
    authors: Table<Author>,
    libraries: Table<Library>,
    librarians: Table<Librarian>,
    books: Table<Book>,
    // Tags are immutable once created, so posts carry their own copies.
    posts: Table<Post>,
    tags: Table<Tag>,
    comments: Table<Comment>,
}

impl State {
    fn remove_post_cascade(&mut self, id: PostId) -> Option<Post> {
        let post = self.posts.remove(id)?;
        self.comments.retain(|c| c.post_id != id);
        Some(post)
    }

    /// Existing tags matched by name ignoring case; new ones get a unique slug.
    fn resolve_tags(&mut self, names: &[String]) -> Vec<Tag> {
        names
            .iter()
            .map(|name| {
                let folded = name.to_lowercase();
                if let Some(tag) = self.tags.find(|t| t.name.to_lowercase() == folded) {
                    return tag.clone();
                }
                let base = slugify_or(name, TAG_FALLBACK_SLUG);
                let slug = unique_slug(&base, |s| self.tags.any(|t| t.slug == s));
                let tag = Tag {
                    id: TagId::new(),
                    name: name.clone(),
                    slug,
                };
                self.tags.insert(tag.clone());
                tag
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    state: RwLock<State>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

fn by<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    Post::sort_newest_first(&mut posts);
    posts
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for InMemoryDatabase {
    async fn create_user(&self, new_user: NewUser, now: DateTime<Utc>) -> StoreResult<(User, Profile)> {
        let mut state = self.write()?;
        if state.users.any(|u| u.username == new_user.username) {
            return Err(StoreError::conflict("A user with that username already exists."));
        }
        let user = new_user.into_user(UserId::new(), now);
        let profile = Profile::default_for(user.id);
        state.users.insert(user.clone());
        state.profiles.insert(profile.clone());
        Ok((user, profile))
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.find(|u| u.username == username).cloned())
    }

    async fn profile(&self, user_id: UserId) -> StoreResult<Option<Profile>> {
        Ok(self.read()?.profiles.get(user_id).cloned())
    }

    async fn update_account(&self, user: &User, profile: &Profile) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.users.contains(user.id) {
            return Err(StoreError::not_found(format!("user {}", user.id)));
        }
        if state.users.any(|u| u.id != user.id && u.username == user.username) {
            return Err(StoreError::conflict("A user with that username already exists."));
        }
        state.users.insert(user.clone());
        state.profiles.insert(profile.clone());
        Ok(())
    }

    async fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<Profile> {
        let mut state = self.write()?;
        let profile = state
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found(format!("profile for user {user_id}")))?;
        profile.role = role;
        Ok(profile.clone())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .users
            .remove(id)
            .ok_or_else(|| StoreError::not_found(format!("user {id}")))?;
        state.profiles.remove(id);
        for post in state.posts.filter(|p| p.author_id == id) {
            state.remove_post_cascade(post.id);
        }
        state.comments.retain(|c| c.author_id != id);
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(by(self.read()?.users.all(), |u| u.username.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Library catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CatalogStore for InMemoryDatabase {
    async fn create_author(&self, author: &Author) -> StoreResult<()> {
        self.write()?.authors.insert(author.clone());
        Ok(())
    }

    async fn author(&self, id: AuthorId) -> StoreResult<Option<Author>> {
        Ok(self.read()?.authors.get(id).cloned())
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        Ok(by(self.read()?.authors.all(), |a| a.name.clone()))
    }

    async fn delete_author(&self, id: AuthorId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .authors
            .remove(id)
            .ok_or_else(|| StoreError::not_found(format!("author {id}")))?;
        state.books.retain(|b| b.author_id != id);
        Ok(())
    }

    async fn create_library(&self, library: &Library) -> StoreResult<()> {
        self.write()?.libraries.insert(library.clone());
        Ok(())
    }

    async fn library(&self, id: LibraryId) -> StoreResult<Option<Library>> {
        Ok(self.read()?.libraries.get(id).cloned())
    }

    async fn list_libraries(&self) -> StoreResult<Vec<Library>> {
        Ok(by(self.read()?.libraries.all(), |l| l.name.clone()))
    }

    async fn delete_library(&self, id: LibraryId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .libraries
            .remove(id)
            .ok_or_else(|| StoreError::not_found(format!("library {id}")))?;
        state.books.retain(|b| b.library_id != id);
        state.librarians.retain(|l| l.library_id != id);
        Ok(())
    }

    async fn appoint_librarian(&self, librarian: &Librarian) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.libraries.contains(librarian.library_id) {
            return Err(StoreError::not_found(format!("library {}", librarian.library_id)));
        }
        if state.librarians.any(|l| l.library_id == librarian.library_id) {
            return Err(StoreError::conflict("This library already has a librarian."));
        }
        state.librarians.insert(librarian.clone());
        Ok(())
    }

    async fn librarian_for(&self, library_id: LibraryId) -> StoreResult<Option<Librarian>> {
        Ok(self.read()?.librarians.find(|l| l.library_id == library_id).cloned())
    }

    async fn list_librarians(&self) -> StoreResult<Vec<Librarian>> {
        Ok(by(self.read()?.librarians.all(), |l| l.name.clone()))
    }

    async fn create_book(&self, book: &Book) -> StoreResult<()> {
        let mut state = self.write()?;
        check_book_refs(&state, book)?;
        state.books.insert(book.clone());
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.books.contains(book.id) {
            return Err(StoreError::not_found(format!("book {}", book.id)));
        }
        check_book_refs(&state, book)?;
        state.books.insert(book.clone());
        Ok(())
    }

    async fn book(&self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(self.read()?.books.get(id).cloned())
    }

    async fn delete_book(&self, id: BookId) -> StoreResult<()> {
        self.write()?
            .books
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("book {id}")))
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(by(self.read()?.books.all(), |b| (b.title.clone(), b.id)))
    }

    async fn books_in_library(&self, library_id: LibraryId) -> StoreResult<Vec<Book>> {
        let books = self.read()?.books.filter(|b| b.library_id == library_id);
        Ok(by(books, |b| (b.title.clone(), b.id)))
    }
}

fn check_book_refs(state: &State, book: &Book) -> StoreResult<()> {
    if !state.authors.contains(book.author_id) {
        return Err(StoreError::not_found(format!("author {}", book.author_id)));
    }
    if !state.libraries.contains(book.library_id) {
        return Err(StoreError::not_found(format!("library {}", book.library_id)));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Blog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl BlogStore for InMemoryDatabase {
    async fn create_post(&self, author_id: UserId, draft: PostDraft, now: DateTime<Utc>) -> StoreResult<Post> {
        let mut state = self.write()?;
        if !state.users.contains(author_id) {
            return Err(StoreError::not_found(format!("user {author_id}")));
        }
        let base = slugify_or(&draft.title, POST_FALLBACK_SLUG);
        let slug = unique_slug(&base, |s| state.posts.any(|p| p.slug == s));
        let tags = state.resolve_tags(&draft.tag_names);
        let post = Post {
            id: PostId::new(),
            title: draft.title,
            content: draft.content,
            published_date: now,
            author_id,
            slug,
            tags,
        };
        state.posts.insert(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: PostId, draft: PostDraft) -> StoreResult<Post> {
        let mut state = self.write()?;
        if !state.posts.contains(id) {
            return Err(StoreError::not_found(format!("post {id}")));
        }
        let tags = state.resolve_tags(&draft.tag_names);
        let post = state
            .posts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("post {id}")))?;
        post.title = draft.title;
        post.content = draft.content;
        post.tags = tags;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        self.write()?
            .remove_post_cascade(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("post {id}")))
    }

    async fn post(&self, id: PostId) -> StoreResult<Option<Post>> {
        Ok(self.read()?.posts.get(id).cloned())
    }

    async fn post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        Ok(self.read()?.posts.find(|p| p.slug == slug).cloned())
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(newest_first(self.read()?.posts.all()))
    }

    async fn posts_by_author(&self, author_id: UserId) -> StoreResult<Vec<Post>> {
        Ok(newest_first(self.read()?.posts.filter(|p| p.author_id == author_id)))
    }

    async fn tag_by_slug(&self, slug: &str) -> StoreResult<Option<Tag>> {
        Ok(self.read()?.tags.find(|t| t.slug == slug).cloned())
    }

    async fn posts_with_tag(&self, tag_id: TagId) -> StoreResult<Vec<Post>> {
        let posts = self.read()?.posts.filter(|p| p.tags.iter().any(|t| t.id == tag_id));
        Ok(newest_first(posts))
    }

    async fn search_posts(&self, query: &str) -> StoreResult<Vec<Post>> {
        Ok(search(self.read()?.posts.all(), query))
    }

    async fn create_comment(&self, comment: &Comment) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.posts.contains(comment.post_id) {
            return Err(StoreError::not_found(format!("post {}", comment.post_id)));
        }
        if !state.users.contains(comment.author_id) {
            return Err(StoreError::not_found(format!("user {}", comment.author_id)));
        }
        state.comments.insert(comment.clone());
        Ok(())
    }

    async fn update_comment(&self, id: CommentId, content: String, now: DateTime<Utc>) -> StoreResult<Comment> {
        let mut state = self.write()?;
        let comment = state
            .comments
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("comment {id}")))?;
        comment.content = content;
        comment.updated_at = now;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> StoreResult<()> {
        self.write()?
            .comments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("comment {id}")))
    }

    async fn comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        Ok(self.read()?.comments.get(id).cloned())
    }

    async fn comments_for_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>> {
        let mut comments = self.read()?.comments.filter(|c| c.post_id == post_id && c.is_active);
        Comment::sort_oldest_first(&mut comments);
        Ok(comments)
    }

    async fn comments_by_author(&self, author_id: UserId) -> StoreResult<Vec<Comment>> {
        let mut comments = self.read()?.comments.filter(|c| c.author_id == author_id && c.is_active);
        Comment::sort_newest_first(&mut comments);
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use folio_core::{BookId, LibrarianId};

    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
        }
    }

    fn draft(title: &str, tags: &[&str]) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            content: "Some content".to_string(),
            tag_names: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn comment(post_id: PostId, author_id: UserId, at: DateTime<Utc>) -> Comment {
        Comment::new(CommentId::new(), post_id, author_id, "A comment".to_string(), at)
    }

    #[tokio::test]
    async fn creating_a_user_creates_a_member_profile() {
        let db = InMemoryDatabase::new();
        let (user, profile) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();

        assert_eq!(profile.user_id, user.id);
        assert_eq!(profile.role, Role::Member);
        assert_eq!(db.profile(user.id).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let db = InMemoryDatabase::new();
        db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let err = db.create_user(new_user("ada"), Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn colliding_titles_get_numbered_slugs() {
        let db = InMemoryDatabase::new();
        let (user, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();

        let first = db.create_post(user.id, draft("Hello World", &[]), Utc::now()).await.unwrap();
        let second = db.create_post(user.id, draft("Hello, world!", &[]), Utc::now()).await.unwrap();
        let third = db.create_post(user.id, draft("hello world", &[]), Utc::now()).await.unwrap();

        assert_eq!(first.slug, "hello-world");
        assert_eq!(second.slug, "hello-world-1");
        assert_eq!(third.slug, "hello-world-2");
    }

    #[tokio::test]
    async fn updating_a_post_keeps_its_slug() {
        let db = InMemoryDatabase::new();
        let (user, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let post = db.create_post(user.id, draft("Original", &["rust"]), Utc::now()).await.unwrap();

        let updated = db.update_post(post.id, draft("Renamed", &["web"])).await.unwrap();
        assert_eq!(updated.slug, "original");
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].name, "web");
    }

    #[tokio::test]
    async fn tags_are_shared_ignoring_case() {
        let db = InMemoryDatabase::new();
        let (user, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let a = db.create_post(user.id, draft("A", &["Rust"]), Utc::now()).await.unwrap();
        let b = db.create_post(user.id, draft("B", &["rust"]), Utc::now()).await.unwrap();

        assert_eq!(a.tags[0].id, b.tags[0].id);
        let tag = db.tag_by_slug("rust").await.unwrap().unwrap();
        assert_eq!(db.posts_with_tag(tag.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn posts_list_newest_first() {
        let db = InMemoryDatabase::new();
        let (user, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let now = Utc::now();
        db.create_post(user.id, draft("Old", &[]), now - Duration::hours(1)).await.unwrap();
        db.create_post(user.id, draft("New", &[]), now).await.unwrap();

        let titles: Vec<String> = db.list_posts().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() {
        let db = InMemoryDatabase::new();
        let (ada, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let (bob, _) = db.create_user(new_user("bob"), Utc::now()).await.unwrap();

        let ada_post = db.create_post(ada.id, draft("Ada's", &[]), Utc::now()).await.unwrap();
        let bob_post = db.create_post(bob.id, draft("Bob's", &[]), Utc::now()).await.unwrap();
        db.create_comment(&comment(ada_post.id, bob.id, Utc::now())).await.unwrap();
        db.create_comment(&comment(bob_post.id, ada.id, Utc::now())).await.unwrap();
        db.create_comment(&comment(bob_post.id, bob.id, Utc::now())).await.unwrap();

        db.delete_user(ada.id).await.unwrap();

        assert!(db.profile(ada.id).await.unwrap().is_none());
        assert!(db.post(ada_post.id).await.unwrap().is_none());
        // Bob's comment on Ada's post goes with the post; Ada's comment on Bob's post goes with Ada.
        assert_eq!(db.comments_by_author(bob.id).await.unwrap().len(), 1);
        assert_eq!(db.comments_for_post(bob_post.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn comment_orderings() {
        let db = InMemoryDatabase::new();
        let (user, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let post = db.create_post(user.id, draft("P", &[]), Utc::now()).await.unwrap();
        let now = Utc::now();
        let early = comment(post.id, user.id, now - Duration::minutes(5));
        let late = comment(post.id, user.id, now);
        db.create_comment(&late).await.unwrap();
        db.create_comment(&early).await.unwrap();

        let on_post: Vec<CommentId> = db.comments_for_post(post.id).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(on_post, vec![early.id, late.id]);

        let by_user: Vec<CommentId> = db.comments_by_author(user.id).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(by_user, vec![late.id, early.id]);
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let db = InMemoryDatabase::new();
        let (user, _) = db.create_user(new_user("ada"), Utc::now()).await.unwrap();
        let err = db.create_comment(&comment(PostId::new(), user.id, Utc::now())).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn library_allows_one_librarian_and_cascades() {
        let db = InMemoryDatabase::new();
        let author = Author { id: AuthorId::new(), name: "Le Guin".to_string() };
        let library = Library {
            id: LibraryId::new(),
            name: "Central".to_string(),
            location: "Main St".to_string(),
        };
        db.create_author(&author).await.unwrap();
        db.create_library(&library).await.unwrap();

        let librarian = |name: &str| Librarian {
            id: LibrarianId::new(),
            name: name.to_string(),
            library_id: library.id,
        };
        db.appoint_librarian(&librarian("Mo")).await.unwrap();
        let err = db.appoint_librarian(&librarian("Jo")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let book = Book {
            id: BookId::new(),
            title: "Earthsea".to_string(),
            author_id: author.id,
            library_id: library.id,
            publication_date: None,
            isbn: None,
            pages: None,
            language: "English".to_string(),
        };
        db.create_book(&book).await.unwrap();

        db.delete_library(library.id).await.unwrap();
        assert!(db.book(book.id).await.unwrap().is_none());
        assert!(db.librarian_for(library.id).await.unwrap().is_none());
        assert!(db.author(author.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn book_needs_existing_author() {
        let db = InMemoryDatabase::new();
        let library = Library {
            id: LibraryId::new(),
            name: "Central".to_string(),
            location: "Main St".to_string(),
        };
        db.create_library(&library).await.unwrap();
        let book = Book {
            id: BookId::new(),
            title: "Orphan".to_string(),
            author_id: AuthorId::new(),
            library_id: library.id,
            publication_date: None,
            isbn: None,
            pages: None,
            language: "English".to_string(),
        };
        assert!(matches!(db.create_book(&book).await, Err(StoreError::NotFound(_))));
    }
}
