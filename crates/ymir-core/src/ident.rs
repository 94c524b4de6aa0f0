//! Identifier sanitizing shared by the emitters.
//!
//! Script-level names (path aliases, auth block identities) may contain
//! characters that are not valid in the generated JavaScript or Java
//! identifiers. The helpers here produce the cross-language form.

/// Reduce `raw` to a valid cross-language identifier.
///
/// Keeps ASCII alphanumerics and underscores, drops everything else, and
/// prefixes a leading digit with `_`.
pub fn sanitize(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Sanitize and capitalize in one step (the "display name" form).
pub fn display_name(raw: &str) -> String {
    capitalize(&sanitize(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_punctuation() {
        assert_eq!(sanitize("API-Key"), "APIKey");
        assert_eq!(sanitize("user.name"), "username");
        assert_eq!(sanitize("plain_name"), "plain_name");
    }

    #[test]
    fn test_sanitize_leading_digit() {
        assert_eq!(sanitize("2fa"), "_2fa");
        assert_eq!(sanitize("42"), "_42");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("apiKey"), "ApiKey");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("Hello"), "Hello");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("apiKey"), "ApiKey");
        assert_eq!(display_name("API-Key"), "APIKey");
    }
}
