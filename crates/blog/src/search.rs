//! Case-insensitive post search over title, content and tag names.

use crate::Post;

/// True when `query` occurs in the post's title, content or any tag name.
///
/// An empty (or all-whitespace) query matches nothing.
pub fn matches_query(post: &Post, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    post.title.to_lowercase().contains(&needle)
        || post.content.to_lowercase().contains(&needle)
        || post.tags.iter().any(|t| t.name.to_lowercase().contains(&needle))
}

/// Filter `posts` to matches. Each post appears at most once, newest first.
pub fn search(posts: impl IntoIterator<Item = Post>, query: &str) -> Vec<Post> {
    let mut hits: Vec<Post> = posts.into_iter().filter(|p| matches_query(p, query)).collect();
    Post::sort_newest_first(&mut hits);
    hits.dedup_by_key(|p| p.id);
    hits
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use folio_core::{PostId, TagId, UserId};

    use super::*;
    use crate::Tag;

    fn post(title: &str, content: &str, tags: &[&str]) -> Post {
        Post {
            id: PostId::new(),
            title: title.to_string(),
            content: content.to_string(),
            published_date: Utc::now(),
            author_id: UserId::new(),
            slug: "s".to_string(),
            tags: tags
                .iter()
                .map(|t| Tag {
                    id: TagId::new(),
                    name: t.to_string(),
                    slug: t.to_lowercase(),
                })
                .collect(),
        }
    }

    #[test]
    fn matches_title_content_or_tag() {
        assert!(matches_query(&post("Rust Tips", "", &[]), "rust"));
        assert!(matches_query(&post("x", "learning RUST", &[]), "Rust"));
        assert!(matches_query(&post("x", "y", &["Rustacean"]), "rust"));
        assert!(!matches_query(&post("x", "y", &["go"]), "rust"));
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(search(vec![post("a", "b", &[])], "  ").is_empty());
    }

    #[test]
    fn post_matching_many_ways_appears_once() {
        let p = post("rust", "rust", &["rust", "Rust web"]);
        let hits = search(vec![p.clone(), p], "rust");
        assert_eq!(hits.len(), 1);
    }
}
