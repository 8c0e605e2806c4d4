//! Parsing ids out of raw arguments.

use reinhard_core::Snowflake;

/// Parses a raw id or a user, nickname or role mention.
///
/// Accepts `123`, `<@123>`, `<@!123>` and `<@&123>`.
pub fn parse_id(argument: &str) -> Option<Snowflake> {
    let argument = argument.trim();
    let digits = match argument.strip_prefix("<@").and_then(|s| s.strip_suffix('>')) {
        Some(inner) => inner
            .strip_prefix('!')
            .or_else(|| inner.strip_prefix('&'))
            .unwrap_or(inner),
        None => argument,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_forms() {
        assert_eq!(parse_id("115590097100865541"), Some(Snowflake(115590097100865541)));
        assert_eq!(parse_id(" <@123> "), Some(Snowflake(123)));
        assert_eq!(parse_id("<@!123>"), Some(Snowflake(123)));
        assert_eq!(parse_id("<@&456>"), Some(Snowflake(456)));
    }

    #[test]
    fn test_parse_id_rejects_names() {
        assert_eq!(parse_id("reinhard"), None);
        assert_eq!(parse_id("<@abc>"), None);
        assert_eq!(parse_id("<@>"), None);
        assert_eq!(parse_id("+123"), None);
        assert_eq!(parse_id("99999999999999999999999"), None);
    }
}
