//! AST generator - Runtime Model
//!
//! A Rust rendition of the data model the generated C describes, driven
//! by the same [`Registry`](astgen_schema::Registry):
//!
//! - [`NodeArray`]: the growable per-family container
//! - [`NodeArena`]: handle-indexed node storage with exclusive ownership,
//!   collector mark bits and subtree teardown

pub mod arena;
pub mod array;

pub use arena::{FieldSlot, NodeArena, NodeHeader, NodeId};
pub use array::{grow_capacity, NodeArray, MIN_CAPACITY};
