// src/utils/url.rs

//! List identifier resolution.

use url::Url;

use crate::error::{AppError, Result};

/// Resolve a list URL or bare identifier to the numeric list id.
///
/// # Examples
/// ```
/// use listpager::utils::url::resolve_list_id;
///
/// assert_eq!(resolve_list_id("1234567890").unwrap(), "1234567890");
/// assert_eq!(
///     resolve_list_id("https://x.com/i/lists/1234567890?s=20").unwrap(),
///     "1234567890"
/// );
/// ```
pub fn resolve_list_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if is_numeric_id(trimmed) {
        return Ok(trimmed.to_string());
    }

    let parsed = Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{trimmed}")))
        .map_err(|_| not_a_list(input))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    segments
        .windows(2)
        .find(|pair| pair[0] == "lists" && is_numeric_id(pair[1]))
        .map(|pair| pair[1].to_string())
        .ok_or_else(|| not_a_list(input))
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn not_a_list(input: &str) -> AppError {
    AppError::config(format!(
        "'{input}' is neither a list id nor a list URL (expected .../lists/<digits>)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_ids() {
        assert_eq!(resolve_list_id("42").unwrap(), "42");
        assert_eq!(resolve_list_id("  111 \n").unwrap(), "111");
    }

    #[test]
    fn test_list_urls() {
        for url in [
            "https://x.com/i/lists/1585430245762441216",
            "https://twitter.com/i/lists/1585430245762441216/members",
            "http://mobile.twitter.com/i/lists/1585430245762441216?s=20&t=abc",
            "x.com/i/lists/1585430245762441216",
            "https://twitter.com/someone/lists/1585430245762441216/",
        ] {
            assert_eq!(
                resolve_list_id(url).unwrap(),
                "1585430245762441216",
                "url {url}"
            );
        }
    }

    #[test]
    fn test_rejects_non_lists() {
        for input in [
            "",
            "abc",
            "-42",
            "https://x.com/rustlang",
            "https://x.com/i/lists/slug-name",
        ] {
            let err = resolve_list_id(input).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "input {input:?}");
        }
    }
}
