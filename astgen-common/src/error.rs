//! Error handling for the AST generator
//!
//! This module defines the single error type used across the workspace.
//! Schema errors are fatal and are always raised while the registry is
//! being built, before any artifact is written.

use crate::source_loc::SourceLocation;
use thiserror::Error;

/// Main generator error type that encompasses every phase
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenError {
    #[error("Malformed entry at {location}: missing ':' between name and field list in `{entry}`")]
    MissingSeparator {
        location: SourceLocation,
        entry: String,
    },

    #[error("Malformed entry at {location}: empty name in `{entry}`")]
    EmptyName {
        location: SourceLocation,
        entry: String,
    },

    #[error("Invalid name `{name}` at {location}: not a C identifier")]
    InvalidName {
        location: SourceLocation,
        name: String,
    },

    #[error("Malformed field at {location}: {message} in `{field}`")]
    MalformedField {
        location: SourceLocation,
        field: String,
        message: String,
    },

    #[error("Base record `{record}` at {location} must start with `Node self`")]
    MissingHeader {
        location: SourceLocation,
        record: String,
    },

    #[error("Family `{group}` at {location} has no base record")]
    EmptyFamily {
        location: SourceLocation,
        group: String,
    },

    #[error("Family `{group}` at {location} clashes with an earlier family: {reason}")]
    DuplicateFamily {
        location: SourceLocation,
        group: String,
        reason: String,
    },

    #[error("Discriminator collision at {location}: `{variant}` and `{previous}` both map to {discriminator}")]
    DiscriminatorCollision {
        location: SourceLocation,
        variant: String,
        previous: String,
        discriminator: String,
    },

    #[error("Name `{name}` at {location} is already declared as {existing}")]
    DuplicateTypeName {
        location: SourceLocation,
        name: String,
        existing: String,
    },

    #[error("Record `{record}` at {location} declares member `{field}` more than once")]
    DuplicateField {
        location: SourceLocation,
        record: String,
        field: String,
    },

    #[error("Schema format error in {source_name}: {message}")]
    SchemaFormat {
        source_name: String,
        message: String,
    },

    #[error("Unknown variant `{name}`")]
    UnknownVariant { name: String },

    #[error("Variant `{variant}` has no field `{field}`")]
    UnknownField { variant: String, field: String },

    #[error("Field `{variant}.{field}` is {actual}, not {expected}")]
    OwnershipMismatch {
        variant: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Node handle #{index} is stale or was never allocated")]
    StaleNode { index: u32 },

    #[error("Field `{variant}.{field}` holds `{expected}` nodes, not `{actual}`")]
    FamilyMismatch {
        variant: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Node #{index} already has an owner")]
    AlreadyOwned { index: u32 },

    #[error("Attaching node #{index} would make it own itself")]
    OwnershipCycle { index: u32 },

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl GenError {
    /// Create a malformed-field error
    pub fn malformed_field(field: &str, message: &str, location: SourceLocation) -> Self {
        GenError::MalformedField {
            location,
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a schema format error
    pub fn schema_format(source_name: &str, message: String) -> Self {
        GenError::SchemaFormat {
            source_name: source_name.to_string(),
            message,
        }
    }

    /// Schema location the error points at, if it has one
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            GenError::MissingSeparator { location, .. }
            | GenError::EmptyName { location, .. }
            | GenError::InvalidName { location, .. }
            | GenError::MalformedField { location, .. }
            | GenError::MissingHeader { location, .. }
            | GenError::EmptyFamily { location, .. }
            | GenError::DuplicateFamily { location, .. }
            | GenError::DiscriminatorCollision { location, .. }
            | GenError::DuplicateTypeName { location, .. }
            | GenError::DuplicateField { location, .. } => Some(location),
            _ => None,
        }
    }

    /// True for errors raised while reading or validating a schema
    pub fn is_schema_error(&self) -> bool {
        self.location().is_some() || matches!(self, GenError::SchemaFormat { .. })
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for GenError {
    fn from(err: std::io::Error) -> Self {
        GenError::IoError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_separator_message() {
        let err = GenError::MissingSeparator {
            location: SourceLocation::new("ast.schema", 4, 1),
            entry: "Binary Expr* left".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed entry at ast.schema:4:1: missing ':' between name and field list in `Binary Expr* left`"
        );
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_collision_message() {
        let err = GenError::DiscriminatorCollision {
            location: SourceLocation::builtin("stmt", 3),
            variant: "GETITEM".to_string(),
            previous: "GetItem".to_string(),
            discriminator: "NODE_GETITEM".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("<builtin:stmt>:4:1"));
        assert!(msg.contains("NODE_GETITEM"));
    }

    #[test]
    fn test_runtime_errors_have_no_location() {
        let err = GenError::UnknownVariant { name: "Nope".to_string() };
        assert!(err.location().is_none());
        assert!(!err.is_schema_error());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GenError = io.into();
        assert_eq!(err, GenError::IoError { message: "gone".to_string() });
    }
}
