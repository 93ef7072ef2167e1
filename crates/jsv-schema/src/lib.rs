#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-schema
//!
//! Schema model, compiler, and reference resolution for jsv.
//!
//! A raw schema [`Value`](jsv_ir::Value) is compiled once into an immutable
//! [`Schema`] whose nodes are closed records. References are expanded at
//! compile time through an injected [`SchemaResolver`], so validation is pure
//! and the compiled schema can be shared across threads.
//!
//! ```rust
//! use jsv_ir::Value;
//! use jsv_schema::Compiler;
//!
//! let raw = Value::from(serde_json::json!({
//!     "type": "object",
//!     "required": ["id"]
//! }));
//! let schema = Compiler::new().compile(&raw).unwrap();
//! assert_eq!(schema.root().required, vec!["id".to_string()]);
//! ```

pub mod compiler;
pub mod draft;
pub mod model;
pub mod registry;

pub use compiler::{Compiler, CompilerConfig};
pub use draft::Draft;
pub use model::{
    AdditionalItems, AdditionalProperties, Conditional, Dependency, Items, PrimitiveType, Schema,
    SchemaNode, TypeSet,
};
pub use registry::{DocumentRegistry, ResolveError, SchemaResolver};

use thiserror::Error;

/// Errors that can occur while compiling a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed keyword '{keyword}' at {pointer}: {reason}")]
    MalformedKeyword {
        keyword: String,
        pointer: String,
        reason: String,
    },

    #[error("Unresolved reference '{reference}': {reason}")]
    UnresolvedReference { reference: String, reason: String },

    #[error("Cyclic reference '{reference}'")]
    CyclicReference { reference: String },

    #[error("Reference '{reference}' nested deeper than {limit} expansions")]
    DepthExceeded { reference: String, limit: usize },
}

/// Compilation failure; no partial schema is ever produced
pub type CompileError = Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to compile a schema with default settings
///
/// # Errors
///
/// Returns an error when the schema is malformed or holds a reference that
/// cannot be resolved without a resolver.
pub fn compile(raw: &jsv_ir::Value) -> Result<Schema> {
    Compiler::new().compile(raw)
}
