//! Input validation for catalog, user and API key fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too short.
    TooShort { field: String, min: usize, actual: usize },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Number outside its allowed range.
    OutOfRange { field: String, detail: String },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooShort { field, min, .. } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::OutOfRange { field, detail } => write!(f, "{} {}", field, detail),
            ValidationError::Empty(field) => write!(f, "{} is required", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum length of an agent name.
pub const MIN_AGENT_NAME_LENGTH: usize = 3;

/// Maximum length of an agent name.
pub const MAX_AGENT_NAME_LENGTH: usize = 80;

/// Maximum allowed length for model names.
pub const MAX_MODEL_LENGTH: usize = 64;

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain has a misplaced dot".to_string(),
        ));
    }

    Ok(())
}

/// Require a non-blank value.
pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    Ok(())
}

/// Validate an agent name: 3 to 80 characters after trimming.
pub fn validate_agent_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();

    if len < MIN_AGENT_NAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "Agent name".to_string(),
            min: MIN_AGENT_NAME_LENGTH,
            actual: len,
        });
    }

    if len > MAX_AGENT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Agent name".to_string(),
            max: MAX_AGENT_NAME_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate a price: finite and strictly positive.
pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            detail: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

/// Validate a sampling temperature in [0, 1].
pub fn validate_temperature(temperature: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&temperature) {
        return Err(ValidationError::OutOfRange {
            field: "temperature".to_string(),
            detail: "must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

/// Validate a max-token budget (> 0).
pub fn validate_max_tokens(max_tokens: i64) -> Result<(), ValidationError> {
    if max_tokens <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "max tokens".to_string(),
            detail: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

/// Validate a model name length.
pub fn validate_model_length(model: &str) -> Result<(), ValidationError> {
    let model = model.trim();

    if model.is_empty() {
        return Err(ValidationError::Empty("model".to_string()));
    }

    if model.len() > MAX_MODEL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "model".to_string(),
            max: MAX_MODEL_LENGTH,
            actual: model.len(),
        });
    }

    Ok(())
}
