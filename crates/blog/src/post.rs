use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{DomainResult, Entity, FieldErrors, PostId, UserId};

use crate::{parse_tags, Tag};

pub const TITLE_MAX_LEN: usize = 200;

/// A blog post with its tags loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub author_id: UserId,
    /// Assigned once on creation and never regenerated.
    pub slug: String,
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn is_author(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// Newest first, ties broken by id so the order is stable.
    pub fn sort_newest_first(posts: &mut [Post]) {
        posts.sort_by(|a, b| {
            b.published_date
                .cmp(&a.published_date)
                .then_with(|| b.id.cmp(&a.id))
        });
    }
}

impl Entity for Post {
    type Id = PostId;

    fn id(&self) -> PostId {
        self.id
    }
}

impl core::fmt::Display for Post {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Create/update payload. `tags` is comma-separated.
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: String,
}

/// A validated post, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub tag_names: Vec<String>,
}

impl PostForm {
    pub fn clean(self) -> DomainResult<PostDraft> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();

        let title_len = title.chars().count();
        if title_len == 0 {
            errors.add("title", "This field is required.");
        } else if title_len > TITLE_MAX_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_LEN} characters (it has {title_len})."),
            );
        }
        if content.is_empty() {
            errors.add("content", "This field is required.");
        }

        errors.into_result()?;
        Ok(PostDraft {
            title,
            content,
            tag_names: parse_tags(&self.tags),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use folio_core::DomainError;

    use super::*;

    fn post(published_date: DateTime<Utc>) -> Post {
        Post {
            id: PostId::new(),
            title: "t".to_string(),
            content: "c".to_string(),
            published_date,
            author_id: UserId::new(),
            slug: "t".to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn clean_parses_tags() {
        let draft = PostForm {
            title: " Hello ".to_string(),
            content: "Body".to_string(),
            tags: "rust, axum".to_string(),
        }
        .clean()
        .unwrap();
        assert_eq!(draft.title, "Hello");
        assert_eq!(draft.tag_names, vec!["rust", "axum"]);
    }

    #[test]
    fn title_and_content_are_required() {
        let err = PostForm {
            title: String::new(),
            content: "  ".to_string(),
            tags: String::new(),
        }
        .clean()
        .unwrap_err();
        let DomainError::Fields(errors) = err else {
            panic!("expected field errors");
        };
        assert!(errors.get("title").is_some());
        assert!(errors.get("content").is_some());
    }

    #[test]
    fn long_title_is_rejected() {
        let result = PostForm {
            title: "x".repeat(201),
            content: "Body".to_string(),
            tags: String::new(),
        }
        .clean();
        assert!(result.is_err());
    }

    #[test]
    fn newest_posts_sort_first() {
        let now = Utc::now();
        let old = post(now - Duration::days(1));
        let new = post(now);
        let mut posts = vec![old.clone(), new.clone()];
        Post::sort_newest_first(&mut posts);
        assert_eq!(posts, vec![new, old]);
    }
}
