//! Blog domain: posts, tags, comments and search.
//!
//! Pure rules only. Persistence lives in `folio-infra`, which calls back
//! into [`slug::unique_slug`] and friends so both stores agree.

pub mod comment;
pub mod post;
pub mod search;
pub mod slug;
pub mod tag;

pub use comment::{Comment, CommentDeleteForm, CommentForm, COMMENT_MAX_LEN, COMMENT_MIN_LEN};
pub use post::{Post, PostDraft, PostForm, TITLE_MAX_LEN};
pub use search::{matches_query, search};
pub use slug::{slugify, slugify_or, unique_slug, POST_FALLBACK_SLUG, TAG_FALLBACK_SLUG};
pub use tag::{parse_tags, Tag};

/// Posts per page on the post list.
pub const POSTS_PER_PAGE: usize = 5;

/// Comments per page under a post.
pub const COMMENTS_PER_PAGE: usize = 10;

/// Comments per page on a user's comment history.
pub const USER_COMMENTS_PER_PAGE: usize = 15;

/// Posts shown on the home page.
pub const HOME_POSTS: usize = 5;
