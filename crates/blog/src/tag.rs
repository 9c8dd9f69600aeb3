use serde::{Deserialize, Serialize};

use folio_core::{Entity, TagId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
}

impl Entity for Tag {
    type Id = TagId;

    fn id(&self) -> TagId {
        self.id
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Split comma-separated tag input into distinct names.
///
/// Only commas separate tags, so `"rust web"` is the single tag `rust web`.
/// django-taggit would split that on the space when no comma is present.
/// Names are trimmed, blanks dropped, and duplicates removed ignoring case
/// (the first spelling wins). Input order is kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in input.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let folded = name.to_lowercase();
        if !names.iter().any(|seen| seen.to_lowercase() == folded) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        assert_eq!(parse_tags(" rust, Web ,rust,, RUST , web"), vec!["rust", "Web"]);
    }

    #[test]
    fn spaces_do_not_separate_tags() {
        assert_eq!(parse_tags("rust web"), vec!["rust web".to_string()]);
        assert_eq!(parse_tags("rust web, async"), vec!["rust web".to_string(), "async".to_string()]);
    }

    #[test]
    fn empty_input_has_no_tags() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn tag_displays_its_name() {
        let tag = Tag {
            id: TagId::new(),
            name: "Async Rust".to_string(),
            slug: "async-rust".to_string(),
        };
        assert_eq!(tag.to_string(), "Async Rust");
    }
}
