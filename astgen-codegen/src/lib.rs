//! AST generator - C Code Generation
//!
//! This crate turns a validated [`Registry`] into the two generated source
//! units the interpreter compiles:
//!
//! - the operations unit (`ast.c`): per-family container operations
//! - the declarations unit (`ast.h`): discriminator enum, node header,
//!   base/container records, operation prototypes and variant records
//!
//! Emission is a pure function of the registry and [`EmitOptions`].

pub mod c_model;
pub mod declarations;
pub mod layout;
pub mod operations;

pub use c_model::{CItem, CRecord, CUnit, RecordKind};
pub use declarations::declarations_unit;
pub use layout::{LayoutEngine, LayoutError, RecordLayout, TargetModel};
pub use operations::{operations_unit, MIN_CAPACITY};

use astgen_common::GenError;
use astgen_schema::Registry;
use log::{debug, info};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Names and boilerplate of the generated units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// File name of the declarations unit, also `#include`d by the operations unit
    pub header_name: String,
    /// File name of the operations unit
    pub source_name: String,
    /// Include guard macro of the declarations unit
    pub guard: String,
    /// Interpreter headers providing `Token`, `Value` and the array macros
    pub includes: Vec<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            header_name: "ast.h".to_string(),
            source_name: "ast.c".to_string(),
            guard: "saffron_AST_H".to_string(),
            includes: vec![
                "../scanner.h".to_string(),
                "../value.h".to_string(),
                "../memory.h".to_string(),
            ],
        }
    }
}

/// Rendered text of both generated units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub operations: String,
    pub declarations: String,
}

impl Artifacts {
    /// Write both units into `dir`, returning the written paths (source, header)
    pub fn write_to(&self, dir: &Path, options: &EmitOptions) -> Result<Vec<PathBuf>, GenError> {
        fs::create_dir_all(dir)?;

        let outputs = [
            (dir.join(&options.source_name), &self.operations),
            (dir.join(&options.header_name), &self.declarations),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (path, text) in outputs {
            let file = fs::File::create(&path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(text.as_bytes())?;
            writer.flush()?;
            debug!("Wrote {} bytes to {}", text.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Main entry point for code generation
pub fn generate(registry: &Registry, options: &EmitOptions) -> Artifacts {
    info!(
        "Generating {} and {} for {} families, {} variants",
        options.source_name,
        options.header_name,
        registry.families().len(),
        registry.variant_count()
    );
    Artifacts {
        operations: operations_unit(registry, options).render(),
        declarations: declarations_unit(registry, options).render(),
    }
}
