//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod url;

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, Result};

/// Longest file stem produced by [`sanitize_name`].
const MAX_STEM_CHARS: usize = 80;

/// Map a list display name to a filesystem-safe file stem.
///
/// Keeps ASCII alphanumerics, `-` and `_`; every other run of characters
/// becomes a single `_`.
pub fn sanitize_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_run = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));

    let replaced = unsafe_run.replace_all(name, "_");
    let stem: String = replaced
        .trim_matches('_')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = stem.trim_end_matches('_');

    if stem.is_empty() {
        "list".to_string()
    } else {
        stem.to_string()
    }
}

/// Read the bearer token from `var`.
pub fn read_bearer_token(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Ok(_) => Err(AppError::config(format!("{var} is set but empty"))),
        Err(_) => Err(AppError::config(format!(
            "{var} is not set; export a bearer token for the X API"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_name("rust-lang_core"), "rust-lang_core");
    }

    #[test]
    fn test_sanitize_collapses_unsafe_runs() {
        assert_eq!(sanitize_name("Rust / Folks: 2024!"), "Rust_Folks_2024");
        assert_eq!(sanitize_name("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_name("카페 list"), "list");
    }

    #[test]
    fn test_sanitize_empty_and_long() {
        assert_eq!(sanitize_name(""), "list");
        assert_eq!(sanitize_name("🦀🦀"), "list");
        assert_eq!(sanitize_name(&"a".repeat(200)).len(), MAX_STEM_CHARS);
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let err = read_bearer_token("LISTPAGER_TEST_TOKEN_SURELY_UNSET").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
