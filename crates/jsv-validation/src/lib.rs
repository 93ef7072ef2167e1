#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-validation
//!
//! Validation engine for compiled JSON Schemas.
//!
//! Validation is a pure function of a compiled [`Schema`](jsv_schema::Schema)
//! and an instance [`Value`](jsv_ir::Value). It never stops at the first
//! problem: every error is collected with the path of the offending value,
//! and each result carries a score used to pick the most plausible failing
//! branch of `anyOf` / `oneOf`.
//!
//! ## Example Usage
//!
//! ```rust
//! use jsv_ir::Value;
//! use jsv_schema::Compiler;
//! use jsv_validation::ValidationEngine;
//!
//! let schema = Compiler::new()
//!     .compile(&Value::from(serde_json::json!({
//!         "type": "object",
//!         "required": ["id"]
//!     })))
//!     .unwrap();
//!
//! let engine = ValidationEngine::new();
//! let result = engine.validate(&schema, &Value::from(serde_json::json!({})));
//! assert!(!result.is_valid());
//! assert_eq!(result.errors()[0].to_string(), "(root): id is required");
//! ```

mod combinators;
pub mod engine;
pub mod formats;
pub mod reporter;
pub mod result;
pub mod rules;

// Re-export main types
pub use engine::{ValidationConfig, ValidationEngine};
pub use reporter::{ValidationReport, ValidationReporter};
pub use result::{ErrorKind, ValidationError, ValidationResult};
pub use rules::RuleResult;

use jsv_ir::Value;
use jsv_schema::Schema;
use thiserror::Error;

/// Errors that can occur before validation starts
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] jsv_schema::CompileError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to validate an instance with default settings
pub fn validate(schema: &Schema, instance: &Value) -> ValidationResult {
    ValidationEngine::new().validate(schema, instance)
}

/// Shorthand for `validate(schema, instance).is_valid()`
pub fn is_valid(schema: &Schema, instance: &Value) -> bool {
    validate(schema, instance).is_valid()
}

/// Compile a raw schema and validate an instance against it
///
/// # Errors
///
/// Returns an error when the schema fails to compile.
pub fn validate_raw(raw_schema: &Value, instance: &Value) -> Result<ValidationResult> {
    let schema = jsv_schema::compile(raw_schema)?;
    Ok(validate(&schema, instance))
}

/// Validation entry points on a compiled [`Schema`]
pub trait SchemaExt {
    fn validate(&self, instance: &Value) -> ValidationResult;

    fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_valid()
    }
}

impl SchemaExt for Schema {
    fn validate(&self, instance: &Value) -> ValidationResult {
        validate(self, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convenience_validate() {
        let schema = jsv_schema::compile(&Value::from(json!({"type": "string"}))).unwrap();
        assert!(is_valid(&schema, &Value::from("value")));
        assert!(!validate(&schema, &Value::from(1_i64)).is_valid());
    }

    #[test]
    fn test_schema_ext() {
        let schema = jsv_schema::compile(&Value::from(json!({"minimum": 3}))).unwrap();
        assert!(schema.is_valid(&Value::from(3_i64)));
        assert_eq!(schema.validate(&Value::from(2_i64)).errors().len(), 1);
    }

    #[test]
    fn test_validate_raw_reports_compile_errors() {
        let err = validate_raw(&Value::from(json!({"type": 7})), &Value::Null).unwrap_err();
        assert!(err.to_string().starts_with("Schema error: Malformed keyword 'type'"));
    }
}
