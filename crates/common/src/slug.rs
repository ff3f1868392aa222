//! Slug generation.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[^a-z0-9]+").expect("valid slug regex")
});

/// Turn a display name into a lowercase, dash-separated slug.
///
/// Non-ASCII letters are transliterated first. Returns an empty string when
/// nothing alphanumeric is left.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lower = deunicode(name.trim()).to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug with a numeric suffix, used when the bare slug is already taken.
#[must_use]
pub fn with_suffix(base: &str, n: u32) -> String {
    format!("{base}-{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jane Doe"), "jane-doe");
        assert_eq!(slugify("  Dr. Ada   Lovelace!! "), "dr-ada-lovelace");
        assert_eq!(slugify("R2-D2"), "r2-d2");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("José García"), "jose-garcia");
        assert_eq!(slugify("Zoë Ærø"), "zoe-aero");
        assert_eq!(slugify("Łukasz Żółć"), "lukasz-zolc");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("jane-doe", 2), "jane-doe-2");
    }
}
