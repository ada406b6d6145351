//! Validation utilities for the Pharmacy Management Platform

use rust_decimal::Decimal;

// ============================================================================
// Catalogue Validations
// ============================================================================

/// Largest price a `NUMERIC(10, 2)` column holds
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Validate a unit price or selling price
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if price > MAX_PRICE {
        return Err("Price must not exceed 99999999.99");
    }
    if price.scale() > 2 && price.round_dp(2) != price {
        return Err("Price must have at most 2 decimal places");
    }
    Ok(())
}

/// Validate medicine code format (1-10 uppercase alphanumeric or dash)
pub fn validate_medicine_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Medicine code cannot be empty");
    }
    if code.len() > 10 {
        return Err("Medicine code must be at most 10 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Medicine code must be uppercase alphanumeric or '-'");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate username (3-150 characters of letters, digits and @.+-_)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 || username.len() > 150 {
        return Err("Username must be between 3 and 150 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
    {
        return Err("Username may only contain letters, digits and @.+-_");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric");
    }
    Ok(())
}
