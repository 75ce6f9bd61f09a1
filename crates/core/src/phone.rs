//! Mobile phone number validation.
//!
//! Signature flows require a reachable mobile number on the acting
//! signatory slot, because SMS reminders depend on it. The check is
//! deliberately lenient on formatting (spaces, dots, dashes) and strict
//! on shape.

/// Normalize a raw phone string: strip separators, fold `00` prefix to `+`.
fn normalize(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '(' | ')'))
        .collect();
    if let Some(rest) = stripped.strip_prefix("00") {
        format!("+{rest}")
    } else {
        stripped
    }
}

/// Whether `raw` parses as a mobile number.
///
/// Accepted shapes:
/// - national: `0` + 9 digits, where the leading pair is `06` or `07`
/// - international: `+` + 8..=14 digits; for a French prefix (`+33`) the
///   subscriber number must start with `6` or `7`, other country codes
///   are accepted without carrier classification
pub fn is_mobile_phone(raw: &str) -> bool {
    let normalized = normalize(raw);

    if let Some(digits) = normalized.strip_prefix('+') {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if !(8..=14).contains(&digits.len()) {
            return false;
        }
        if let Some(subscriber) = digits.strip_prefix("33") {
            return subscriber.len() == 9 && matches!(subscriber.as_bytes().first(), Some(b'6' | b'7'));
        }
        return true;
    }

    normalized.len() == 10
        && normalized.chars().all(|c| c.is_ascii_digit())
        && matches!(normalized.as_bytes(), [b'0', b'6' | b'7', ..])
}
