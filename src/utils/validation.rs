use crate::utils::error::{Result, StatementError};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(StatementError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(StatementError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StatementError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(StatementError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Tesseract language profiles: `eng`, `chi_sim`, or combinations like `eng+deu`.
pub fn validate_ocr_language(field_name: &str, language: &str) -> Result<()> {
    static LANGUAGE_RE: OnceLock<Regex> = OnceLock::new();
    let re = LANGUAGE_RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z_]*(\+[a-z][a-z_]*)*$").expect("language pattern is valid")
    });

    if !re.is_match(language) {
        return Err(StatementError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: language.to_string(),
            reason: "Expected a tesseract language code such as 'eng' or 'eng+deu'".to_string(),
        });
    }
    Ok(())
}
