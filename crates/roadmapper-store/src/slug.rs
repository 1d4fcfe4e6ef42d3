use unicode_normalization::UnicodeNormalization;

/// Longest slug produced before uniqueness suffixes
const MAX_SLUG_LEN: usize = 60;

/// Fallback when a title has no usable characters
const EMPTY_SLUG: &str = "roadmap";

/// Derive a store id from a title: ASCII lowercase, `-` separated.
///
/// Accents are folded (`Café` becomes `cafe`); other non-ASCII characters
/// are dropped.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.nfkd() {
        if c.is_ascii_alphanumeric() {
            let dash = pending_dash && !slug.is_empty();
            if slug.len() + usize::from(dash) + 1 > MAX_SLUG_LEN {
                break;
            }
            if dash {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c.is_ascii_punctuation() {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// `base`, or `base-2`, `base-3`, ... whichever `taken` rejects first.
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// True if `id` could have been produced by [`slugify`]/[`unique_slug`].
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_examples() {
        assert_eq!(slugify("Learn Rust: The Hard Way!"), "learn-rust-the-hard-way");
        assert_eq!(slugify("  Café   Systems  "), "cafe-systems");
        assert_eq!(slugify("日本語"), "roadmap");
        assert_eq!(slugify("C++ & Go"), "c-go");
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let taken = ["rust", "rust-2"];
        assert_eq!(unique_slug("rust", |s| taken.contains(&s)), "rust-3");
        assert_eq!(unique_slug("go", |s| taken.contains(&s)), "go");
    }

    #[test]
    fn test_is_valid_id_rejects_paths() {
        assert!(is_valid_id("learn-rust-2"));
        assert!(!is_valid_id("../etc/passwd"));
        assert!(!is_valid_id("a/b"));
        assert!(!is_valid_id(""));
    }

    proptest! {
        #[test]
        fn prop_slugify_output_is_a_valid_id(title in ".{0,120}") {
            let slug = slugify(&title);
            prop_assert!(is_valid_id(&slug));
            prop_assert!(slug.len() <= MAX_SLUG_LEN);
            prop_assert!(!slug.ends_with('-'));
        }
    }
}
