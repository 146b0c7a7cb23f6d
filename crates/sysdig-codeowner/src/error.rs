//! Error types for CODEOWNERS lookups

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`crate::OwnerLoader`]
#[derive(Error, Debug)]
pub enum CodeownerError {
    /// The CODEOWNERS file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of the CODEOWNERS file is malformed
    #[error("CODEOWNERS line {line}: {message}")]
    Parse { line: usize, message: String },

    /// No rule covers the requested path
    #[error("no CODEOWNERS rule matches {0}")]
    NoMatch(String),

    /// The matching rule has no `report to:` comment
    #[error("missing report comment")]
    MissingReportComment,

    /// The working directory could not be determined
    #[error("failed to determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}
