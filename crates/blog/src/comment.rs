use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{CommentId, DomainError, DomainResult, Entity, PostId, UserId};

pub const COMMENT_MIN_LEN: usize = 5;
pub const COMMENT_MAX_LEN: usize = 1000;

/// Markup a comment may keep. Everything else is stripped.
const ALLOWED_TAGS: [&str; 7] = ["b", "i", "u", "em", "strong", "p", "br"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Comment {
    pub fn new(id: CommentId, post_id: PostId, author_id: UserId, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            post_id,
            author_id,
            content,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    pub fn can_edit(&self, user_id: UserId, is_staff: bool) -> bool {
        self.author_id == user_id || is_staff
    }

    pub fn can_delete(&self, user_id: UserId, is_staff: bool) -> bool {
        self.author_id == user_id || is_staff
    }

    /// Oldest first, the order comments read in under a post.
    pub fn sort_oldest_first(comments: &mut [Comment]) {
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }

    pub fn sort_newest_first(comments: &mut [Comment]) {
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> CommentId {
        self.id
    }
}

/// Create/edit payload for a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

impl CommentForm {
    /// Returns the stored form of the content: trimmed, length-checked and
    /// sanitized.
    pub fn clean(self) -> DomainResult<String> {
        let content = self.content.trim();
        let len = content.chars().count();

        if content.is_empty() {
            return Err(DomainError::field("content", "Comment cannot be empty."));
        }
        if len > COMMENT_MAX_LEN {
            return Err(DomainError::field(
                "content",
                format!("Ensure this value has at most {COMMENT_MAX_LEN} characters (it has {len})."),
            ));
        }
        if len < COMMENT_MIN_LEN {
            return Err(DomainError::field(
                "content",
                format!("Comment must be at least {COMMENT_MIN_LEN} characters long."),
            ));
        }

        Ok(sanitize(content))
    }
}

fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .tags(ALLOWED_TAGS.into_iter().collect::<HashSet<_>>())
        .tag_attributes(HashMap::new())
        .generic_attributes(HashSet::new())
        .clean(html)
        .to_string()
}

/// Explicit confirmation required before a comment is deleted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentDeleteForm {
    #[serde(default)]
    pub confirm: bool,
}

impl CommentDeleteForm {
    pub fn clean(&self) -> DomainResult<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(DomainError::field("confirm", "Confirmation required to delete comment."))
        }
    }
}
