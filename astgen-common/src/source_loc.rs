//! Source location tracking for schema diagnostics
//!
//! Schema entries come either from the built-in tables or from a schema
//! file on disk. Both are addressed the same way so every fatal error can
//! point at the entry that caused it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a schema source (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Create a location with filename
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location of the `index`-th entry (0-based) of a built-in family table
    pub fn builtin(group: &str, index: usize) -> Self {
        Self {
            filename: format!("<builtin:{}>", group),
            line: index as u32 + 1,
            column: 1,
        }
    }

    /// Create a dummy location for testing
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}
