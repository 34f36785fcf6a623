//! Error types shared across Folio crates.
//!
//! The motion primitives themselves never fail; errors only arise at the
//! edges (configuration files, replay scripts, trace output).

use std::path::PathBuf;

/// Top-level error type for Folio operations.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("Trace error: {message}")]
    Trace { message: String },

    #[error("Unknown section: {id}")]
    UnknownSection { id: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using FolioError.
pub type FolioResult<T> = Result<T, FolioError>;

impl FolioError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn script(line: usize, msg: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: msg.into(),
        }
    }

    pub fn trace(msg: impl Into<String>) -> Self {
        Self::Trace {
            message: msg.into(),
        }
    }

    pub fn unknown_section(id: impl Into<String>) -> Self {
        Self::UnknownSection { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_error_reports_line() {
        let err = FolioError::script(7, "expected a JSON object");
        assert_eq!(
            err.to_string(),
            "Script error on line 7: expected a JSON object"
        );
    }

    #[test]
    fn test_file_not_found_names_path() {
        let err = FolioError::FileNotFound {
            path: PathBuf::from("/tmp/missing.jsonl"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/missing.jsonl");
    }

    #[test]
    fn test_json_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: FolioError = parse.unwrap_err().into();
        assert!(matches!(err, FolioError::Json(_)));
    }
}
