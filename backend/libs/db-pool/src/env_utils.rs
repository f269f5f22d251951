//! Environment variable parsing helpers

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// `None` if the variable is missing, empty or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("NONEXISTENT_VAR_XYZ", 42);
        assert_eq!(result, 42);

        std::env::set_var("TEST_PORT", "8080");
        let result: u16 = parse_env_with_default("TEST_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("TEST_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_env_optional() {
        assert_eq!(parse_env_optional::<u32>("NONEXISTENT_VAR_XYZ"), None);

        std::env::set_var("TEST_OPT", " 123 ");
        assert_eq!(parse_env_optional::<u32>("TEST_OPT"), Some(123));

        std::env::set_var("TEST_OPT", "");
        assert_eq!(parse_env_optional::<u32>("TEST_OPT"), None);
        std::env::remove_var("TEST_OPT");
    }
}
