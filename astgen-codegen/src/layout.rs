//! Record layout calculation
//!
//! Computes field offsets and sizes of emitted records under a C data
//! model, with natural alignment and trailing padding. Used to check that
//! every variant record starts with an exact copy of its family base
//! record, which is what makes `(Expr*) &binary` a valid upcast.

use crate::c_model::CUnit;
use astgen_schema::TypeSpec;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Record `{0}` contains itself by value")]
    RecursiveRecord(String),

    #[error("Unknown record `{0}`")]
    UnknownRecord(String),
}

/// Size and alignment in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scalar {
    pub size: u64,
    pub align: u64,
}

impl Scalar {
    pub const fn new(size: u64, align: u64) -> Self {
        Self { size, align }
    }
}

/// Sizes of the types a generated header can mention
#[derive(Debug, Clone)]
pub struct TargetModel {
    pub pointer: Scalar,
    /// Every enum, prelude or discriminator
    pub enumeration: Scalar,
    primitives: HashMap<String, Scalar>,
    opaque: HashMap<String, Scalar>,
    /// Used for value types the model has never heard of
    pub default_opaque: Scalar,
}

impl TargetModel {
    /// LP64 with the interpreter's `Token` and `Value` registered
    pub fn lp64() -> Self {
        let primitives = [
            ("char", Scalar::new(1, 1)),
            ("bool", Scalar::new(1, 1)),
            ("short", Scalar::new(2, 2)),
            ("int", Scalar::new(4, 4)),
            ("float", Scalar::new(4, 4)),
            ("long", Scalar::new(8, 8)),
            ("double", Scalar::new(8, 8)),
            ("size_t", Scalar::new(8, 8)),
        ]
        .into_iter()
        .map(|(name, scalar)| (name.to_string(), scalar))
        .collect();

        Self {
            pointer: Scalar::new(8, 8),
            enumeration: Scalar::new(4, 4),
            primitives,
            opaque: HashMap::new(),
            default_opaque: Scalar::new(8, 8),
        }
        // Token: { TokenType; const char*; int; int }
        .with_opaque("Token", 24, 8)
        // Value: { ValueType; union { bool; double; Obj* } }
        .with_opaque("Value", 16, 8)
    }

    /// Register a value type defined outside the generated header
    pub fn with_opaque(mut self, name: &str, size: u64, align: u64) -> Self {
        self.opaque.insert(name.to_string(), Scalar::new(size, align));
        self
    }
}

impl Default for TargetModel {
    fn default() -> Self {
        Self::lp64()
    }
}

/// Layout information for a single member
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    pub field_type: TypeSpec,
    pub offset: u64,
    pub size: u64,
    pub align: u64,
}

/// Information about a record's memory layout
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
    pub size: u64,
    pub align: u64,
}

impl RecordLayout {
    pub fn first_member(&self) -> Option<&FieldLayout> {
        self.fields.first()
    }
}

/// Find a field in a record layout by name
pub fn find_field<'a>(layout: &'a RecordLayout, field_name: &str) -> Option<&'a FieldLayout> {
    layout.fields.iter().find(|f| f.name == field_name)
}

fn align_to(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align) * align
}

/// Computes and caches layouts of the records of one unit
pub struct LayoutEngine<'a> {
    unit: &'a CUnit,
    model: &'a TargetModel,
    cache: HashMap<String, RecordLayout>,
    in_progress: HashSet<String>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(unit: &'a CUnit, model: &'a TargetModel) -> Self {
        Self {
            unit,
            model,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Layout of the record called `name` (typedef name or struct tag)
    pub fn record_layout(&mut self, name: &str) -> Result<RecordLayout, LayoutError> {
        if let Some(layout) = self.cache.get(name) {
            return Ok(layout.clone());
        }

        let unit = self.unit;
        let record = unit
            .record(name)
            .ok_or_else(|| LayoutError::UnknownRecord(name.to_string()))?;
        if !self.in_progress.insert(name.to_string()) {
            return Err(LayoutError::RecursiveRecord(name.to_string()));
        }

        let mut fields = Vec::with_capacity(record.members.len());
        let mut offset = 0u64;
        let mut align = 1u64;
        for member in &record.members {
            let scalar = match self.member_scalar(&member.ty) {
                Ok(scalar) => scalar,
                Err(e) => {
                    self.in_progress.remove(name);
                    return Err(e);
                }
            };
            offset = align_to(offset, scalar.align);
            fields.push(FieldLayout {
                name: member.name.clone(),
                field_type: member.ty.clone(),
                offset,
                size: scalar.size,
                align: scalar.align,
            });
            offset += scalar.size;
            align = align.max(scalar.align);
        }

        self.in_progress.remove(name);
        let layout = RecordLayout {
            name: name.to_string(),
            fields,
            size: align_to(offset, align),
            align,
        };
        self.cache.insert(name.to_string(), layout.clone());
        Ok(layout)
    }

    fn member_scalar(&mut self, ty: &TypeSpec) -> Result<Scalar, LayoutError> {
        if ty.is_pointer() {
            return Ok(self.model.pointer);
        }

        let name = ty.type_name();
        if self.unit.record(name).is_some() {
            let layout = self.record_layout(name)?;
            return Ok(Scalar::new(layout.size, layout.align));
        }
        if self.unit.enum_named(name).is_some() {
            return Ok(self.model.enumeration);
        }
        if let Some(scalar) = self.model.primitives.get(name) {
            return Ok(*scalar);
        }
        Ok(self
            .model
            .opaque
            .get(name)
            .copied()
            .unwrap_or(self.model.default_opaque))
    }
}
