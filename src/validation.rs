//! # Input Validation Module
//!
//! Validators for everything users type into the registration, profile,
//! event and purchase forms. Each validator returns the cleaned value or a
//! short error code the flow handlers translate into a re-prompt.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

// Accepts anything shaped like local@domain.tld; intentionally loose so real
// addresses are never rejected on formality.
pub const EMAIL_PATTERN: &str = r"^[^@]+@[^@]+\.[^@]+";

// +7 followed by exactly ten digits, no spaces or dashes.
pub const PHONE_PATTERN: &str = r"^\+7\d{10}$";

lazy_static! {
    pub static ref EMAIL_REGEX: Regex =
        Regex::new(EMAIL_PATTERN).expect("email pattern should be valid");
    pub static ref PHONE_REGEX: Regex =
        Regex::new(PHONE_PATTERN).expect("phone pattern should be valid");
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").expect("digit pattern should be valid");
}

/// Validates a full name input
pub fn validate_full_name(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    Ok(trimmed.to_string())
}

/// Validates an email address against [`EMAIL_PATTERN`]
pub fn validate_email(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err("invalid_format");
    }

    Ok(trimmed.to_string())
}

/// Validates a phone number against [`PHONE_PATTERN`]
pub fn validate_phone(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if !PHONE_REGEX.is_match(trimmed) {
        return Err("invalid_format");
    }

    Ok(trimmed.to_string())
}

/// Validates a password input
pub fn validate_password(input: &str) -> Result<String, &'static str> {
    if input.trim().is_empty() {
        return Err("empty");
    }

    Ok(input.to_string())
}

/// Validates the text of a news post
pub fn validate_news_text(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    Ok(trimmed.to_string())
}

/// Parses an event date in `YYYY-MM-DD` form
pub fn parse_event_date(input: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| "bad_date")
}

/// Parses a ticket quantity: a whole number of at least one
pub fn parse_quantity(input: &str) -> Result<u32, &'static str> {
    match input.trim().parse::<u32>() {
        Ok(qty) if qty > 0 => Ok(qty),
        _ => Err("invalid"),
    }
}

/// Extract the numeric amount from a free-form price string.
///
/// Organizers enter prices as text ("5000 KZT", "от 1000", "Free"); the first
/// run of digits is the amount, anything without digits counts as free.
pub fn parse_price(price: &str) -> u64 {
    DIGIT_RUN
        .find(price)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Total for one order: quantity times the parsed unit price. Saturates
/// rather than wraps when an oversized price meets a large quantity.
pub fn order_total(qty: u32, price: &str) -> u64 {
    u64::from(qty).saturating_mul(parse_price(price))
}

/// SHA-256 hex digest used for stored passwords.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        // Valid addresses
        assert!(validate_email("anna@example.com").is_ok());
        assert!(validate_email("  user.name@mail.example.org  ").is_ok());

        // Invalid addresses
        assert!(validate_email("plain-text").is_err());
        assert!(validate_email("missing-domain@host").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("+77051234567").is_ok());
        assert!(validate_phone("+7705123456").is_err()); // nine digits
        assert!(validate_phone("+770512345678").is_err()); // eleven digits
        assert!(validate_phone("87051234567").is_err()); // missing +7
    }

    #[test]
    fn test_price_parsing() {
        assert_eq!(parse_price("5000 KZT"), 5000);
        assert_eq!(parse_price("от 1000 до 5000"), 1000);
        assert_eq!(parse_price("Free"), 0);
        assert_eq!(parse_price(""), 0);
    }

    #[test]
    fn test_order_total_saturates_instead_of_wrapping() {
        assert_eq!(order_total(3, "5000 KZT"), 15_000);
        assert_eq!(order_total(4, "Free"), 0);

        // A u64-sized price times two clamps at the top.
        assert_eq!(order_total(2, "18000000000000000000"), u64::MAX);
    }

    #[test]
    fn test_password_hashing_is_deterministic() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("Secret"));
        assert_eq!(hash_password("secret").len(), 64);
    }
}
