//! Input validation functions
//!
//! Length limits are enforced by the `validator` derive on the request types;
//! these helpers cover what the derive cannot express.

use crate::types::MAX_USERNAME_LEN;

/// Validate a username supplied at login
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err("Username too long".to_string());
    }
    if username.chars().any(char::is_control) {
        return Err("Username contains invalid characters".to_string());
    }
    Ok(())
}

/// Check that a token is safe to carry in a header or cookie
pub fn is_header_safe(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b';' && b != b',' && b != b'"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", true)]
    #[case("data.scope_user-01", true)]
    #[case("", false)]
    #[case("   ", false)]
    #[case("bad\nname", false)]
    #[case("tab\tname", false)]
    fn test_validate_username(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(validate_username(input).is_ok(), ok);
    }

    #[test]
    fn test_username_too_long() {
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[rstest]
    #[case("abc.def-ghi_jkl", true)]
    #[case("", false)]
    #[case("has space", false)]
    #[case("semi;colon", false)]
    #[case("line\r\nbreak", false)]
    fn test_is_header_safe(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(is_header_safe(input), ok);
    }

    proptest! {
        #[test]
        fn prop_base64url_tokens_are_header_safe(token in "[A-Za-z0-9_-]{1,40}(\\.[A-Za-z0-9_-]{1,40}){2}") {
            prop_assert!(is_header_safe(&token));
        }
    }
}
