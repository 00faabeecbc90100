use crate::config::Config;
use crate::error::{LogshapeError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_format(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LogshapeError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_format(config: &Config, errors: &mut Vec<ValidationError>) {
        let format = &config.format;

        // An empty marker would make "a*b" and "ab" hash identically
        if format.wildcard.is_empty() {
            errors.push(ValidationError::new(
                "format.wildcard",
                "Wildcard marker cannot be empty",
            ));
        }

        if format.wildcard.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new(
                "format.wildcard",
                format!("Wildcard marker cannot contain whitespace: {:?}", format.wildcard),
            ));
        }

        // SHA-256 hex digest is 64 characters
        if !(1..=64).contains(&format.short_id_len) {
            errors.push(ValidationError::new(
                "format.short_id_len",
                format!(
                    "Short id length must be between 1 and 64, got {}",
                    format.short_id_len
                ),
            ));
        }

        if format.count_width > 20 {
            errors.push(ValidationError::new(
                "format.count_width",
                format!("Count width must be at most 20, got {}", format.count_width),
            ));
        }
    }
}
