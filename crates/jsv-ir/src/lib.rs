#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-ir
//!
//! Value model and navigation APIs shared by schemas and instances.
//!
//! Both the raw schema document and the instance being validated arrive as
//! already-decoded [`Value`] trees. This crate owns that tree, the
//! [`InstancePath`] used to locate validation errors, and a JSON Pointer
//! [`Cursor`] used to resolve local schema references.

/// Instance paths and their `(root)` / dotted rendering.
pub mod path;
/// JSON Pointer cursor and visitor-based walking of value trees.
pub mod traversal;
/// Decoded JSON value model.
pub mod value;

/// Location of a value inside an instance document.
pub use path::{InstancePath, PathSegment};
/// Traversal entry points for pointer lookups and tree walks.
pub use traversal::{walk, Cursor, Traversal};
/// Value primitives.
pub use value::{Kind, Number, Value};

use thiserror::Error;

/// Errors that can occur when working with value trees
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("No value found at pointer: {pointer}")]
    NodeNotFound { pointer: String },

    #[error("Invalid JSON pointer '{pointer}': {reason}")]
    InvalidPointer { pointer: String, reason: String },

    #[error("Conversion error in {context}: {message}")]
    Conversion { context: String, message: String },
}

impl Error {
    /// Build a node-not-found error for the pointer that failed.
    pub fn node_not_found(pointer: impl Into<String>) -> Self {
        Self::NodeNotFound {
            pointer: pointer.into(),
        }
    }

    /// Build an invalid-pointer error with the offending input and reason.
    pub fn invalid_pointer(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPointer {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }

    /// Build a conversion error with conversion context.
    pub fn conversion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for value operations.
pub type Result<T> = std::result::Result<T, Error>;
