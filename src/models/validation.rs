use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

/// Local part, then a dotted domain of labels without leading/trailing hyphens.
static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

pub fn require_email(field: &str, value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    if value.len() > 254 || !RE_EMAIL.is_match(value) {
        return Err(AppError::InvalidInput(format!(
            "{} is not a valid email address",
            field
        )));
    }
    Ok(())
}

pub fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: i64) -> AppResult<()> {
    if value < 0 {
        return Err(AppError::InvalidInput(format!(
            "{} must be non-negative",
            field
        )));
    }
    Ok(())
}
