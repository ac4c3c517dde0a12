//! Typed error handling for typeconsts.
//!
//! Scanning itself only ever fails in two ways: the requested type has no
//! constants at all, or the symbol table and the syntax disagree. Everything
//! else here belongs to loading a package from disk.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for typeconsts operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// No constant of the requested type exists in any file of the package
    #[error("no values defined for type {type_name}")]
    NotFound { type_name: String },

    /// The symbol table and the declaration syntax disagree about a constant
    #[error("internal inconsistency for constant {name}: {detail}")]
    InternalInconsistency { name: String, detail: String },

    /// I/O error when reading files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Syntax error in Go source
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
        /// Column number (1-indexed) if available
        column: Option<usize>,
    },

    /// Type error found while evaluating declarations
    #[error("Type error in {path}: {message}")]
    Check {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// The directory does not resolve to exactly one Go package
    #[error("Load error at {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl ScanError {
    /// Create a not-found error for a type name.
    pub fn not_found(type_name: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
        }
    }

    /// Create an inconsistency error for a constant name.
    pub fn inconsistency(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error without location.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a parse error with line/column info.
    pub fn parse_at(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a type error with line/column info.
    pub fn check_at(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Check {
            path: path.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a package resolution error.
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error still lets a batch of scans continue.
    ///
    /// Only a missing type is recoverable: the caller can move on to the
    /// next type name.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Check { path, .. } => Some(path),
            Self::Load { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for typeconsts results.
pub type ScanResult<T> = Result<T, ScanError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> ScanResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> ScanResult<T> {
        self.map_err(|e| ScanError::io(path, e))
    }
}
