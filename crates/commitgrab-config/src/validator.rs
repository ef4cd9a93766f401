//! Configuration validation.

use commitgrab_extract::validate_pattern;

use crate::schema::Config;

/// Timeouts above this are allowed but probably a mistake.
const LONG_TIMEOUT_MS: u64 = 60_000;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_capture(config, &mut result);
        Self::validate_patterns(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.browser.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "Endpoint must be an http(s) URL",
            ));
        }
    }

    fn validate_capture(config: &Config, result: &mut ValidationResult) {
        if config.capture.url_filter.trim().is_empty() {
            result.add_error(ValidationError::new(
                "capture.url_filter",
                "URL filter cannot be empty",
            ));
        }

        if config.capture.timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "capture.timeout_ms",
                "timeout_ms must be greater than 0",
            ));
        } else if config.capture.timeout_ms > LONG_TIMEOUT_MS {
            result.add_warning(ValidationWarning::new(
                "capture.timeout_ms",
                "timeout_ms is over a minute, failed captures will hang for a long time",
            ));
        }
    }

    fn validate_patterns(config: &Config, result: &mut ValidationResult) {
        let fields = [
            ("patterns.ticket", config.patterns.ticket.as_deref()),
            ("patterns.clean", config.patterns.clean.as_deref()),
        ];

        for (path, pattern) in fields {
            if let Some(raw) = pattern {
                if let Err(e) = validate_pattern(raw) {
                    result.add_error(ValidationError::new(path, e.message));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
