//! Field Descriptor Parser
//!
//! Turns one textual field entry (`Token operator`, `Expr *right`,
//! `struct Variable* superclass`, `StmtArray body`) into a typed [`Field`]
//! and classifies how the enclosing node owns it.

use crate::naming::is_c_identifier;
use astgen_common::{GenError, SourceLocation};
use serde::Serialize;
use std::fmt;

/// Pointer marker accepted on either side of the whitespace
const POINTER_MARKER: char = '*';

/// Type names ending with this suffix denote an owned child sequence
const SEQUENCE_SUFFIX: &str = "Array";

/// How a node owns the data behind one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Ownership {
    /// Stored by value: tokens, literal values, enum tags, unknown scalars
    Value,
    /// Exclusively owned single child node
    OwnedChild,
    /// Exclusively owned homogeneous child sequence (an `...Array` container)
    OwnedSequence,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Value => write!(f, "a value field"),
            Ownership::OwnedChild => write!(f, "an owned child"),
            Ownership::OwnedSequence => write!(f, "an owned child sequence"),
        }
    }
}

/// Declared type of a field: base type text plus pointer depth
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeSpec {
    /// Base type, whitespace-normalized (`Token`, `struct Variable`)
    pub base: String,
    /// Number of pointer markers
    pub pointer_depth: u8,
}

impl TypeSpec {
    pub fn new(base: &str, pointer_depth: u8) -> Self {
        Self {
            base: base.to_string(),
            pointer_depth,
        }
    }

    /// A plain, non-pointer type
    pub fn value(base: &str) -> Self {
        Self::new(base, 0)
    }

    /// A single pointer to `base`
    pub fn pointer(base: &str) -> Self {
        Self::new(base, 1)
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    /// The type name without an elaborated `struct`/`enum`/`union` keyword
    pub fn type_name(&self) -> &str {
        self.base.rsplit(' ').next().unwrap_or(&self.base)
    }

    /// Classify the ownership this type implies
    pub fn ownership(&self) -> Ownership {
        if self.is_pointer() {
            Ownership::OwnedChild
        } else {
            let name = self.type_name();
            if name.len() > SEQUENCE_SUFFIX.len() && name.ends_with(SEQUENCE_SUFFIX) {
                Ownership::OwnedSequence
            } else {
                Ownership::Value
            }
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for _ in 0..self.pointer_depth {
            write!(f, "{}", POINTER_MARKER)?;
        }
        Ok(())
    }
}

/// One data member of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    pub name: String,
}

impl Field {
    pub fn new(ty: TypeSpec, name: &str) -> Self {
        Self {
            ty,
            name: name.to_string(),
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.ty.ownership()
    }

    /// Container type backing this field, for owned sequences
    pub fn container_type(&self) -> Option<&str> {
        match self.ownership() {
            Ownership::OwnedSequence => Some(self.ty.type_name()),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// Parse a single field entry such as `Expr *left` or `Token name`
pub fn parse_field(text: &str, location: &SourceLocation) -> Result<Field, GenError> {
    let entry = text.trim();
    if entry.is_empty() {
        return Err(GenError::malformed_field(text, "empty field entry", location.clone()));
    }

    // The identifier is the trailing run of identifier characters
    let ident_start = entry
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|pos| pos + 1)
        .unwrap_or(0);
    let name = &entry[ident_start..];
    if ident_start == 0 {
        return Err(GenError::malformed_field(
            entry,
            "expected a type followed by an identifier",
            location.clone(),
        ));
    }
    if !is_c_identifier(name) {
        return Err(GenError::malformed_field(
            entry,
            "field name is not a C identifier",
            location.clone(),
        ));
    }

    let mut rest = &entry[..ident_start];
    let mut pointer_depth = 0u8;
    loop {
        rest = rest.trim_end();
        match rest.strip_suffix(POINTER_MARKER) {
            Some(stripped) => {
                pointer_depth += 1;
                rest = stripped;
            }
            None => break,
        }
    }

    let base = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    if base.is_empty() {
        return Err(GenError::malformed_field(entry, "missing field type", location.clone()));
    }
    if !base.split(' ').all(is_c_identifier) {
        return Err(GenError::malformed_field(
            entry,
            "unsupported type syntax",
            location.clone(),
        ));
    }

    Ok(Field::new(TypeSpec::new(&base, pointer_depth), name))
}

/// Parse a comma-separated field list; a blank list yields no fields
pub fn parse_field_list(text: &str, location: &SourceLocation) -> Result<Vec<Field>, GenError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    text.split(',')
        .map(|entry| parse_field(entry, location))
        .collect()
}
