//! Error types for tintbar-core.

use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration and I/O errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration:\n  - {}", .0.join("\n  - "))]
    ConfigValidation(Vec<String>),

    #[error("invalid color '{0}': expected a hex color like '#3584e4' or '#3584e4cc'")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why an icon could not be resolved.
///
/// Callers treat every variant the same way: no artifact is available and
/// the previous visual stays on screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The raw identity is not present in any table.
    #[error("unknown icon '{0}'")]
    UnknownIcon(String),

    /// The asset source failed to produce the image.
    #[error("asset '{id}' unavailable: {reason}")]
    ResourceUnavailable { id: String, reason: String },
}

/// A host-held reference was momentarily invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host field '{field}' unavailable: {reason}")]
pub struct FieldAccessError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldAccessError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Log-once bookkeeping for repeated failures.
///
/// The first failure for a given key is logged at `warn`, later ones at
/// `trace` only.
#[derive(Debug, Default)]
pub struct MutedErrors {
    seen: HashSet<String>,
}

impl MutedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `err` unless an error with the same key was already logged.
    /// Returns true if this call produced the log line.
    pub fn log(&mut self, key: &str, err: &dyn Display) -> bool {
        if self.seen.contains(key) {
            tracing::trace!("{}: {} (muted)", key, err);
            return false;
        }
        tracing::warn!("{}: {}", key, err);
        self.seen.insert(key.to_string());
        true
    }

    /// Number of distinct keys logged so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_errors_logs_each_key_once() {
        let mut muted = MutedErrors::new();
        let err = FieldAccessError::new("wifi_strength", "detached");

        assert!(muted.log("update", &err));
        assert!(!muted.log("update", &err));
        assert!(muted.log("apply", &err));
        assert_eq!(muted.len(), 2);
    }

    #[test]
    fn test_validation_error_lists_every_message() {
        let err = Error::ConfigValidation(vec!["a: bad".to_string(), "b: worse".to_string()]);
        let text = err.to_string();
        assert!(text.contains("a: bad"));
        assert!(text.contains("b: worse"));
    }
}
