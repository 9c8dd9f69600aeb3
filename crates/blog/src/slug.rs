//! URL slugs for posts and tags.

use unicode_normalization::UnicodeNormalization;

/// Base slug for a post whose title has no sluggable characters.
pub const POST_FALLBACK_SLUG: &str = "post";

/// Base slug for a tag whose name has no sluggable characters.
pub const TAG_FALLBACK_SLUG: &str = "tag";

/// Lowercase ASCII slug: letters, digits, `_` and single `-` separators.
///
/// Input is NFKD-decomposed first, so accented letters keep their ASCII
/// base (`é` becomes `e`). Anything still non-ASCII is dropped.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.nfkd() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            pending_dash = true;
        }
    }

    out.trim_matches(['-', '_']).to_string()
}

/// [`slugify`], or `fallback` when nothing sluggable is left.
pub fn slugify_or(text: &str, fallback: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() { fallback.to_string() } else { slug }
}

/// First of `base`, `base-1`, `base-2`, ... for which `taken` is false.
pub fn unique_slug(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn slugify_basic_titles() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust -- in   production "), "rust-in-production");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_transliterates_accented_letters() {
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        assert_eq!(slugify("Ångström Über Straße"), "angstrom-uber-strae");
        assert_eq!(slugify("ﬁne print"), "fine-print");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let taken: HashSet<&str> = ["hello", "hello-1"].into_iter().collect();
        assert_eq!(unique_slug("hello", |s| taken.contains(s)), "hello-2");
        assert_eq!(unique_slug("other", |s| taken.contains(s)), "other");
    }

    #[test]
    fn unsluggable_text_uses_fallback() {
        assert_eq!(slugify_or("???", POST_FALLBACK_SLUG), "post");
        assert_eq!(slugify_or("Rust!", POST_FALLBACK_SLUG), "rust");
    }

    proptest! {
        #[test]
        fn slugs_are_url_safe(title in ".{0,80}") {
            let slug = slugify(&title);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn unique_slug_avoids_every_taken_slug(n in 0usize..20) {
            let mut taken: HashSet<String> = HashSet::new();
            taken.insert("title".to_string());
            for i in 1..=n {
                taken.insert(format!("title-{i}"));
            }
            let slug = unique_slug("title", |s| taken.contains(s));
            prop_assert!(!taken.contains(&slug));
        }
    }
}
