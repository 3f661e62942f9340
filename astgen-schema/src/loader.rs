//! Schema file loaders
//!
//! Two on-disk formats feed the same [`RegistryBuilder`]:
//!
//! - a line-oriented text format:
//!   ```text
//!   # comment
//!   enum FunctionType : TYPE_FUNCTION, TYPE_SCRIPT
//!   [stmt]
//!   Stmt  : Node self
//!   Break : Token keyword
//!   ```
//! - a JSON document with `enums` and `families` arrays (see [`SchemaFile`]).

use crate::registry::{Registry, RegistryBuilder};
use astgen_common::{GenError, SourceLocation};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Keyword that introduces a prelude enum line
const ENUM_KEYWORD: &str = "enum ";

/// JSON schema document
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub enums: Vec<EnumSource>,
    pub families: Vec<FamilyFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumSource {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyFile {
    pub group: String,
    /// `Name : type ident, ...` entries, base record first
    pub entries: Vec<String>,
}

/// Load a schema file, choosing the format from its extension
pub fn load_schema(path: &Path) -> Result<Registry, GenError> {
    let text = fs::read_to_string(path).map_err(|e| GenError::IoError {
        message: format!("{}: {}", path.display(), e),
    })?;
    let source_name = path.display().to_string();

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    debug!(
        "Loading {} schema from {}",
        if is_json { "JSON" } else { "text" },
        source_name
    );

    if is_json {
        parse_schema_json(&text, &source_name)
    } else {
        parse_schema_text(&text, &source_name)
    }
}

/// Parse the line-oriented text format
pub fn parse_schema_text(text: &str, source_name: &str) -> Result<Registry, GenError> {
    let mut builder = RegistryBuilder::new();
    let mut current: Option<(String, SourceLocation, Vec<(String, SourceLocation)>)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        if line.trim().is_empty() {
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        let location = SourceLocation::new(source_name, index as u32 + 1, indent as u32 + 1);
        let line = line.trim();

        if let Some(header) = line.strip_prefix('[') {
            let group = header.strip_suffix(']').map(str::trim).ok_or_else(|| {
                GenError::schema_format(
                    source_name,
                    format!("unterminated family header at {}", location),
                )
            })?;
            if group.is_empty() {
                return Err(GenError::schema_format(
                    source_name,
                    format!("empty family name at {}", location),
                ));
            }
            if let Some((group, at, entries)) = current.take() {
                builder.family_at(&group, entries, at);
            }
            current = Some((group.to_string(), location, Vec::new()));
        } else if let Some(decl) = line.strip_prefix(ENUM_KEYWORD) {
            let (name, members) = decl.split_once(':').ok_or_else(|| GenError::MissingSeparator {
                location: location.clone(),
                entry: line.to_string(),
            })?;
            let members: Vec<&str> = members
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect();
            builder.prelude_enum(name, &members, location);
        } else {
            match current.as_mut() {
                Some((_, _, entries)) => entries.push((line.to_string(), location)),
                None => {
                    return Err(GenError::schema_format(
                        source_name,
                        format!("entry outside of a [family] section at {}", location),
                    ))
                }
            }
        }
    }

    if let Some((group, at, entries)) = current.take() {
        builder.family_at(&group, entries, at);
    }

    builder.build()
}

/// Parse the JSON format
pub fn parse_schema_json(text: &str, source_name: &str) -> Result<Registry, GenError> {
    let file: SchemaFile = serde_json::from_str(text)
        .map_err(|e| GenError::schema_format(source_name, e.to_string()))?;

    let mut builder = RegistryBuilder::new();
    for (index, prelude) in file.enums.iter().enumerate() {
        let members: Vec<&str> = prelude.members.iter().map(String::as_str).collect();
        let location = SourceLocation::new(&format!("{}[enums]", source_name), index as u32 + 1, 1);
        builder.prelude_enum(&prelude.name, &members, location);
    }
    for family in &file.families {
        let filename = format!("{}[{}]", source_name, family.group);
        let entries = family
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.clone(), SourceLocation::new(&filename, i as u32 + 1, 1)))
            .collect();
        builder.family_at(&family.group, entries, SourceLocation::new(&filename, 1, 1));
    }

    builder.build()
}
