// Helper functions for timestamps and safe logging

use chrono::{DateTime, SecondsFormat, Utc};

/// Current instant as a fixed-width UTC RFC 3339 string
/// (`2026-08-04T12:00:00Z`).
///
/// All persisted timestamps use this format so plain TEXT comparison in
/// SQL (`expires_at > ?`) is also chronological comparison.
pub fn now_rfc3339() -> String {
    format_rfc3339(Utc::now())
}

pub fn format_rfc3339(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a stored timestamp, tolerating any RFC 3339 offset.
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|when| when.with_timezone(&Utc))
}

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            format!("{}***@{}", &parts[0][..1.min(parts[0].len())], parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let when = Utc.with_ymd_and_hms(2026, 8, 4, 9, 30, 0).unwrap();
        assert_eq!(format_rfc3339(when), "2026-08-04T09:30:00Z");
        assert_eq!(parse_rfc3339("2026-08-04T09:30:00Z"), Some(when));
    }

    #[test]
    fn parse_tolerates_offsets() {
        let parsed = parse_rfc3339("2026-08-04T11:30:00+02:00").unwrap();
        assert_eq!(format_rfc3339(parsed), "2026-08-04T09:30:00Z");
        assert_eq!(parse_rfc3339("not a timestamp"), None);
    }

    #[test]
    fn emails_are_masked() {
        assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
        assert_eq!(safe_email_log("a"), "***@***.***");
    }

    #[test]
    fn tokens_are_masked() {
        assert_eq!(safe_token_log("srv-token-123456"), "srv-...3456");
        assert_eq!(safe_token_log("short"), "***");
    }
}
