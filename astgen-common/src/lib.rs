//! AST generator - Common Types and Utilities
//!
//! This crate contains the error type and source locations shared by the
//! schema registry, the C emitters, the runtime node model and the driver.

pub mod error;
pub mod source_loc;

pub use error::GenError;
pub use source_loc::SourceLocation;
