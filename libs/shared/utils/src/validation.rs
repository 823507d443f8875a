use std::sync::OnceLock;

use regex::Regex;

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9()\-\s.]{6,22}[0-9]$").expect("phone pattern is valid")
    })
}

/// Loose phone check: digits with the usual separators, 8 to 15 digits overall.
pub fn is_valid_phone(raw: &str) -> bool {
    let trimmed = raw.trim();
    let digit_count = trimmed.chars().filter(char::is_ascii_digit).count();
    phone_pattern().is_match(trimmed) && (8..=15).contains(&digit_count)
}

/// Round a currency amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
