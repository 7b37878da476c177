//! Error and warning trail collected during one tree walk

use crate::error::StructuralError;
use tracing::{error, warn};

/// Ordered `parsing_errors` / `parsing_warnings`, mirrored to the log
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Diagnostics {
    /// Start from warnings already raised by the decoder
    pub fn with_warnings(warnings: &[String]) -> Self {
        Self {
            errors: Vec::new(),
            warnings: warnings.to_vec(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.errors.push(message);
    }

    /// Record a structural failure, prefixed with where it happened
    pub fn structural(&mut self, location: &str, err: &StructuralError) {
        if location.is_empty() {
            self.error(err.to_string());
        } else {
            self.error(format!("{}: {}", location, err));
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.errors, self.warnings)
    }
}
