// Validation utilities module
// Provides custom validation functions for account input

use validator::ValidationError;

/// Rejects values that are empty or whitespace only
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Canonical form for usernames and emails: trimmed and lowercased
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}

/// True when the optional value is present and not blank
pub fn is_present(value: Option<&str>) -> bool {
    value.map_or(false, |v| !v.trim().is_empty())
}
