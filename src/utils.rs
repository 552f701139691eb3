//! Utility functions for object keys and text handling

/// Maximum number of response-body characters kept in error messages
const MAX_BODY_CHARS: usize = 300;

/// Final `/`-separated segment of an object key
///
/// # Examples
///
/// ```
/// use media_autopost::utils::file_name;
///
/// assert_eq!(file_name("reels n shorts/9am content/clip.mp4"), "clip.mp4");
/// assert_eq!(file_name("clip.mp4"), "clip.mp4");
/// ```
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// File name with its last extension removed
///
/// A leading dot (hidden file) is not treated as an extension separator.
///
/// # Examples
///
/// ```
/// use media_autopost::utils::file_stem;
///
/// assert_eq!(file_stem("2025-06-01 - My Title.mp4"), "2025-06-01 - My Title");
/// assert_eq!(file_stem("v1.2 final.mp4"), "v1.2 final");
/// assert_eq!(file_stem("noext"), "noext");
/// ```
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Whether `key` ends with `extension`, ignoring ASCII case
pub fn has_extension(key: &str, extension: &str) -> bool {
    key.len() >= extension.len()
        && key
            .get(key.len() - extension.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(extension))
}

/// Truncate to at most `max` characters without splitting a UTF-8 sequence
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shorten a response body for inclusion in errors and logs
pub(crate) fn body_excerpt(body: &str) -> String {
    truncate_chars(body.trim(), MAX_BODY_CHARS).to_string()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_handles_nested_and_trailing_segments() {
        assert_eq!(file_name("a/b/c.mp4"), "c.mp4");
        assert_eq!(file_name("standard videos/9:30am content/x.mp4"), "x.mp4");
        assert_eq!(file_name("dir/"), "");
    }

    #[test]
    fn file_stem_keeps_hidden_files() {
        assert_eq!(file_stem(".env"), ".env");
        assert_eq!(file_stem("a.b.c"), "a.b");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(has_extension("clip.MP4", ".mp4"));
        assert!(has_extension("clip.mp4", ".mp4"));
        assert!(!has_extension("clip.mov", ".mp4"));
        assert!(!has_extension("mp4", ".mp4"));
    }

    #[test]
    fn extension_match_survives_multibyte_keys() {
        // 4-byte tail starts inside the first "é"
        assert!(!has_extension("ééa", ".mp4"));
        assert!(has_extension("vidéo.mp4", ".mp4"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn body_excerpt_trims_and_limits() {
        let long = "x".repeat(1000);
        assert_eq!(body_excerpt(&long).len(), MAX_BODY_CHARS);
        assert_eq!(body_excerpt("  ok \n"), "ok");
    }
}
