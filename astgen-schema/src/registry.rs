//! Schema Registry
//!
//! An ordered collection of node families. Each family source list starts
//! with the family's base record; every following entry is a variant.
//! All validation happens in [`RegistryBuilder::build`], so a [`Registry`]
//! that exists is always self-consistent and safe to emit.

use crate::field::{parse_field_list, Field, TypeSpec};
use crate::naming::{
    container_member_name, container_type_name, discriminator_name, is_c_identifier, title_case,
};
use astgen_common::{GenError, SourceLocation};
use log::{debug, trace};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Name of the shared node header record
pub const NODE_HEADER_TYPE: &str = "Node";

/// Name of the discriminator enum
pub const DISCRIMINATOR_TYPE: &str = "NodeType";

/// Member name every base record uses for the embedded header
pub const HEADER_MEMBER: &str = "self";

/// A named record: a family base or a variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(skip)]
    pub location: SourceLocation,
}

impl Record {
    /// Fields after the embedded `Node self` header (base records only)
    pub fn extra_fields(&self) -> &[Field] {
        match self.fields.first() {
            Some(first) if first.name == HEADER_MEMBER => &self.fields[1..],
            _ => &self.fields,
        }
    }
}

/// A variant is a record that belongs to exactly one family
pub type Variant = Record;

/// A named group of structurally related node kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Family {
    pub group: String,
    pub base: Record,
    pub variants: Vec<Variant>,
}

impl Family {
    /// Group name with its first letter capitalized (`typeNode` -> `TypeNode`)
    pub fn title(&self) -> String {
        title_case(&self.group)
    }

    /// Public base type name, used as the embedded `self` of every variant
    pub fn base_name(&self) -> &str {
        &self.base.name
    }

    pub fn container_type(&self) -> String {
        container_type_name(&self.group)
    }

    pub fn container_member(&self) -> String {
        container_member_name(&self.group)
    }

    /// Element type stored in the container buffer
    pub fn element_type(&self) -> TypeSpec {
        TypeSpec::pointer(&self.base.name)
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// An auxiliary plain enum emitted ahead of the node types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreludeEnum {
    pub name: String,
    pub members: Vec<String>,
}

/// One entry of the global discriminator enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    /// Emitted enumerator, e.g. `NODE_BINARY`
    pub name: String,
    pub variant: String,
    /// Index of the owning family in declaration order
    pub family: usize,
}

/// The finished, validated schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    enums: Vec<PreludeEnum>,
    families: Vec<Family>,
    discriminators: Vec<Discriminator>,
}

impl Registry {
    pub fn enums(&self) -> &[PreludeEnum] {
        &self.enums
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn family(&self, group: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.group == group)
    }

    /// Family whose base record is named `base` (e.g. `Expr`)
    pub fn family_by_base(&self, base: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.base_name() == base)
    }

    /// Family whose container type is `container` (e.g. `StmtArray`)
    pub fn family_by_container(&self, container: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.container_type() == container)
    }

    /// Discriminators in global order: family order, then variant order
    pub fn discriminators(&self) -> &[Discriminator] {
        &self.discriminators
    }

    pub fn variant_count(&self) -> usize {
        self.discriminators.len()
    }

    /// Every variant with its family, in discriminator order
    pub fn variants(&self) -> impl Iterator<Item = (&Family, &Variant)> {
        self.families
            .iter()
            .flat_map(|family| family.variants.iter().map(move |variant| (family, variant)))
    }

    /// Look up a variant by its (globally unique) name
    pub fn variant(&self, name: &str) -> Option<(&Family, &Variant)> {
        self.variants().find(|(_, variant)| variant.name == name)
    }

    /// Ordinal of a variant's discriminator
    pub fn discriminator_of(&self, variant: &str) -> Option<usize> {
        self.discriminators.iter().position(|d| d.variant == variant)
    }
}

/// Raw family definition collected before validation
#[derive(Debug, Clone)]
struct FamilySource {
    group: String,
    entries: Vec<(String, SourceLocation)>,
    location: SourceLocation,
}

/// Collects family and enum definitions, then validates them all at once
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    enums: Vec<(PreludeEnum, SourceLocation)>,
    families: Vec<FamilySource>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an auxiliary enum emitted before the discriminator enum
    pub fn prelude_enum(
        &mut self,
        name: &str,
        members: &[&str],
        location: SourceLocation,
    ) -> &mut Self {
        let members = members.iter().map(|m| m.trim().to_string()).collect();
        self.enums.push((
            PreludeEnum {
                name: name.trim().to_string(),
                members,
            },
            location,
        ));
        self
    }

    /// Add a family from a built-in table; entry `i` is located at line `i + 1`
    pub fn family(&mut self, group: &str, entries: &[&str]) -> &mut Self {
        let entries = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.to_string(), SourceLocation::builtin(group, i)))
            .collect();
        let location = SourceLocation::builtin(group, 0);
        self.family_at(group, entries, location)
    }

    /// Add a family whose entries carry their own source locations
    pub fn family_at(
        &mut self,
        group: &str,
        entries: Vec<(String, SourceLocation)>,
        location: SourceLocation,
    ) -> &mut Self {
        self.families.push(FamilySource {
            group: group.trim().to_string(),
            entries,
            location,
        });
        self
    }

    /// Validate everything and produce the registry, or the first fatal error
    pub fn build(&self) -> Result<Registry, GenError> {
        let mut names = NameTable::new();
        names.declare(NODE_HEADER_TYPE, "the node header", &SourceLocation::dummy())?;
        names.declare(DISCRIMINATOR_TYPE, "the discriminator enum", &SourceLocation::dummy())?;

        let mut enumerators: HashMap<String, String> = HashMap::new();
        let mut enums = Vec::new();
        for (prelude, location) in &self.enums {
            check_identifier(&prelude.name, location)?;
            names.declare(&prelude.name, "a prelude enum", location)?;
            for member in &prelude.members {
                check_identifier(member, location)?;
                if let Some(owner) = enumerators.get(member) {
                    return Err(GenError::DuplicateTypeName {
                        location: location.clone(),
                        name: member.clone(),
                        existing: format!("an enumerator of `{}`", owner),
                    });
                }
                enumerators.insert(member.clone(), prelude.name.clone());
            }
            enums.push(prelude.clone());
        }

        // Bases and containers first, so a variant can never shadow a later family's type
        let mut families = Vec::new();
        for source in &self.families {
            families.push(self.build_base(source, &families, &mut names)?);
        }

        let mut discriminators: Vec<Discriminator> = Vec::new();
        let mut by_tag: HashMap<String, String> = HashMap::new();
        for (index, source) in self.families.iter().enumerate() {
            for (entry, location) in &source.entries[1..] {
                let variant = parse_entry(entry, location)?;
                check_unique_fields(&variant, Some(HEADER_MEMBER), location)?;
                let tag = discriminator_name(&variant.name);

                if let Some(previous) = by_tag.get(&tag) {
                    return Err(GenError::DiscriminatorCollision {
                        location: location.clone(),
                        variant: variant.name.clone(),
                        previous: previous.clone(),
                        discriminator: tag,
                    });
                }
                if let Some(owner) = enumerators.get(&tag) {
                    return Err(GenError::DuplicateTypeName {
                        location: location.clone(),
                        name: tag,
                        existing: format!("an enumerator of `{}`", owner),
                    });
                }
                names.declare(&variant.name, "a variant record", location)?;

                trace!("{}: variant {} -> {}", source.group, variant.name, tag);
                by_tag.insert(tag.clone(), variant.name.clone());
                discriminators.push(Discriminator {
                    name: tag,
                    variant: variant.name.clone(),
                    family: index,
                });
                families[index].variants.push(variant);
            }
        }

        debug!(
            "Built registry: {} families, {} variants, {} prelude enums",
            families.len(),
            discriminators.len(),
            enums.len()
        );

        Ok(Registry {
            enums,
            families,
            discriminators,
        })
    }

    fn build_base(
        &self,
        source: &FamilySource,
        previous: &[Family],
        names: &mut NameTable,
    ) -> Result<Family, GenError> {
        check_identifier(&source.group, &source.location)?;

        let (entry, location) = source.entries.first().ok_or_else(|| GenError::EmptyFamily {
            location: source.location.clone(),
            group: source.group.clone(),
        })?;

        if previous.iter().any(|f| f.group == source.group) {
            return Err(GenError::DuplicateFamily {
                location: source.location.clone(),
                group: source.group.clone(),
                reason: "group name already used".to_string(),
            });
        }
        let container = container_type_name(&source.group);
        if previous.iter().any(|f| f.container_type() == container) {
            return Err(GenError::DuplicateFamily {
                location: source.location.clone(),
                group: source.group.clone(),
                reason: format!("container type `{}` already used", container),
            });
        }

        let base = parse_entry(entry, location)?;
        let has_header = base.fields.first().is_some_and(|f| {
            f.name == HEADER_MEMBER && f.ty == TypeSpec::value(NODE_HEADER_TYPE)
        });
        if !has_header {
            return Err(GenError::MissingHeader {
                location: location.clone(),
                record: base.name.clone(),
            });
        }
        check_unique_fields(&base, None, location)?;

        names.declare(&base.name, "a family base record", location)?;
        names.declare(&container, "a container type", location)?;
        debug!(
            "Family {}: base {} with {} extra field(s), container {}",
            source.group,
            base.name,
            base.extra_fields().len(),
            container
        );

        Ok(Family {
            group: source.group.clone(),
            base,
            variants: Vec::new(),
        })
    }
}

/// Build a registry from ordered `(group, entries)` tables
pub fn registry_from_tables(tables: &[(&str, &[&str])]) -> Result<Registry, GenError> {
    let mut builder = RegistryBuilder::new();
    for (group, entries) in tables {
        builder.family(group, entries);
    }
    builder.build()
}

/// Parse one `Name : type ident, ...` entry
pub fn parse_entry(entry: &str, location: &SourceLocation) -> Result<Record, GenError> {
    let (name, fields) = entry.split_once(':').ok_or_else(|| GenError::MissingSeparator {
        location: location.clone(),
        entry: entry.trim().to_string(),
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(GenError::EmptyName {
            location: location.clone(),
            entry: entry.trim().to_string(),
        });
    }
    check_identifier(name, location)?;

    Ok(Record {
        name: name.to_string(),
        fields: parse_field_list(fields, location)?,
        location: location.clone(),
    })
}

fn check_identifier(name: &str, location: &SourceLocation) -> Result<(), GenError> {
    if is_c_identifier(name) {
        Ok(())
    } else {
        Err(GenError::InvalidName {
            location: location.clone(),
            name: name.to_string(),
        })
    }
}

/// Member names of one emitted record must be distinct, including the
/// `embedded` member the emitter prepends to variant records
fn check_unique_fields(
    record: &Record,
    embedded: Option<&str>,
    location: &SourceLocation,
) -> Result<(), GenError> {
    let mut seen: HashSet<&str> = embedded.into_iter().collect();
    for field in &record.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(GenError::DuplicateField {
                location: location.clone(),
                record: record.name.clone(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

/// Type-level names already claimed in the emitted declarations
struct NameTable {
    claimed: HashMap<String, &'static str>,
}

impl NameTable {
    fn new() -> Self {
        Self {
            claimed: HashMap::new(),
        }
    }

    fn declare(
        &mut self,
        name: &str,
        what: &'static str,
        location: &SourceLocation,
    ) -> Result<(), GenError> {
        if let Some(existing) = self.claimed.get(name) {
            return Err(GenError::DuplicateTypeName {
                location: location.clone(),
                name: name.to_string(),
                existing: existing.to_string(),
            });
        }
        self.claimed.insert(name.to_string(), what);
        Ok(())
    }
}
