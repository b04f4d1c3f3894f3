//! Short code generation and URL normalization

const MIN_CODE_LEN: usize = 6;
const MAX_CODE_LEN: usize = 12;
const MAX_CUSTOM_CODE_LEN: usize = 16;

/// Prefix `https://` unless the URL already starts with an HTTP(S) scheme
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

/// Length of the code generated for `normalized_url`.
///
/// Half of the scheme-less URL, clamped to 6..=12, and kept below the
/// URL's own length where that still leaves at least 6 characters.
pub fn code_length(normalized_url: &str) -> usize {
    let rest = normalized_url
        .strip_prefix("https://")
        .or_else(|| normalized_url.strip_prefix("http://"))
        .unwrap_or(normalized_url);
    let original_len = rest.len();

    let len = (original_len / 2).clamp(MIN_CODE_LEN, MAX_CODE_LEN);
    if len >= original_len {
        original_len.saturating_sub(1).max(MIN_CODE_LEN)
    } else {
        len
    }
}

/// Random lowercase hex code sized by [`code_length`].
///
/// Uniqueness is not guaranteed here; callers check the store.
pub fn generate_short_code(normalized_url: &str) -> String {
    let len = code_length(normalized_url);
    let mut code: String = (0..len)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect();
    code.truncate(len);
    code
}

/// Custom codes are 1 to 16 ASCII letters or digits
pub fn is_valid_custom_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CUSTOM_CODE_LEN
        && code.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https_once() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com/a"), "http://example.com/a");
        assert_eq!(
            normalize_url(&normalize_url("example.com/path")),
            "https://example.com/path"
        );
    }

    #[test]
    fn test_code_length_rules() {
        // "a.co" is 4 chars: clamps up to 6, which is >= 4, so stays at 6
        assert_eq!(code_length("https://a.co"), 6);
        // 14 chars: half is 7
        assert_eq!(code_length("https://example.com/ab"), 7);
        // long URLs cap at 12
        assert_eq!(
            code_length("https://example.com/a/very/long/path/to/something"),
            12
        );
        // 8 chars: clamps up to 6, still shorter
        assert_eq!(code_length("http://abc.com1"), 6);
        // 6 chars: 6 >= 6, so max(5, 6)
        assert_eq!(code_length("abc.de"), 6);
    }

    #[test]
    fn test_generated_code_shape() {
        for url in [
            "https://a.co",
            "https://example.com/ab",
            "https://example.com/a/very/long/path/to/something",
        ] {
            let code = generate_short_code(url);
            assert_eq!(code.len(), code_length(url));
            assert!((6..=12).contains(&code.len()));
            assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_generated_code_shorter_than_input_when_possible() {
        let url = "https://example.com/articles/2024";
        let rest_len = url.len() - "https://".len();
        assert!(generate_short_code(url).len() < rest_len);
    }

    #[test]
    fn test_generated_codes_differ() {
        let url = "https://example.com/a/very/long/path/to/something";
        let a = generate_short_code(url);
        let b = generate_short_code(url);
        assert_ne!(a, b);
    }

    #[test]
    fn test_custom_code_validation() {
        assert!(is_valid_custom_code("abc"));
        assert!(is_valid_custom_code("A1b2C3"));
        assert!(is_valid_custom_code("a"));
        assert!(is_valid_custom_code(&"x".repeat(16)));
        assert!(!is_valid_custom_code(""));
        assert!(!is_valid_custom_code(&"x".repeat(17)));
        assert!(!is_valid_custom_code("my-code"));
        assert!(!is_valid_custom_code("my code"));
        assert!(!is_valid_custom_code("短碼"));
    }
}
