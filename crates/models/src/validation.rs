//! Field validation shared by entities and services.

use crate::errors::ModelError;

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ModelError::Validation("invalid email".into()));
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ModelError::Validation("invalid email".into()));
    }
    if email.len() > 255 {
        return Err(ModelError::Validation("email too long".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ModelError::Validation("name required".into()));
    }
    if len > 160 {
        return Err(ModelError::Validation("name too long (<=160)".into()));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err(ModelError::Validation("title required".into()));
    }
    if len > 255 {
        return Err(ModelError::Validation("title too long (<=255)".into()));
    }
    Ok(())
}

/// Brazilian phone numbers: 10 to 13 digits (country code allowed) once punctuation is removed.
pub fn validate_phone(phone: &str) -> Result<(), ModelError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let junk = phone.chars().any(|c| !(c.is_ascii_digit() || " ()-+".contains(c)));
    if junk || !(10..=13).contains(&digits) {
        return Err(ModelError::Validation("invalid phone".into()));
    }
    Ok(())
}

pub fn validate_price_cents(cents: i64) -> Result<(), ModelError> {
    if cents < 0 {
        return Err(ModelError::Validation("price must be >= 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(validate_email("ana@cidade.com.br").is_ok());
        assert!(validate_email("ana@cidade").is_err());
        assert!(validate_email("@cidade.com").is_err());
        assert!(validate_email("no-at-sign").is_err());
    }

    #[test]
    fn names_and_titles() {
        assert!(validate_name("  ").is_err());
        assert!(validate_name("Padaria Central").is_ok());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }

    #[test]
    fn phones() {
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("+55 11 3333-4444").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("11 9876x-4321").is_err());
    }
}
