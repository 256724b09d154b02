//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Whether `url` uses the `http` or `https` scheme.
#[must_use]
pub fn is_external_url(url: &str) -> bool {
    let url = url.trim_start();
    ["http://", "https://"].iter().any(|prefix| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_urls() {
        assert!(is_external_url("https://example.com"));
        assert!(is_external_url("http://example.com/a?b"));
        assert!(is_external_url("HTTPS://EXAMPLE.COM"));
    }

    #[test]
    fn test_non_external_urls() {
        assert!(!is_external_url("#top"));
        assert!(!is_external_url("page.md"));
        assert!(!is_external_url("mailto:a@b.c"));
        assert!(!is_external_url("//cdn.example.com"));
        assert!(!is_external_url("httpx://x"));
        assert!(!is_external_url("ht"));
    }

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }
}
