//! Validation reporter
//!
//! Turns a [`ValidationResult`] into a summary for people (text) or tools
//! (JSON).

use crate::result::{ValidationError, ValidationResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Summary of one validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub score: i64,
    pub error_count: usize,
    /// Error counts keyed by error code
    pub counts_by_kind: BTreeMap<&'static str, usize>,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// `Errors: N`
    pub fn summary(&self) -> String {
        format!("Errors: {}", self.error_count)
    }

    /// Plain-text rendering, one error per line
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if self.valid {
            out.push_str("Validation passed.\n");
        } else {
            out.push_str("Validation failed.\n");
        }
        for error in &self.errors {
            let _ = writeln!(out, "- {error}");
        }
        let _ = writeln!(out, "{}", self.summary());
        out
    }

    /// Pretty-printed JSON rendering
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Reports validation results
#[derive(Debug, Clone, Default)]
pub struct ValidationReporter {
    max_errors: Option<usize>,
}

impl ValidationReporter {
    /// Create a new validation reporter
    pub fn new() -> Self {
        Self { max_errors: None }
    }

    /// Keep at most `limit` errors in the report body; counts still cover
    /// every error.
    #[must_use]
    pub fn max_errors(mut self, limit: usize) -> Self {
        self.max_errors = Some(limit);
        self
    }

    pub fn report(&self, result: &ValidationResult) -> ValidationReport {
        let mut counts_by_kind = BTreeMap::new();
        for error in result.errors() {
            *counts_by_kind.entry(error.kind.code()).or_insert(0) += 1;
        }

        let shown = self.max_errors.unwrap_or(usize::MAX);
        ValidationReport {
            valid: result.is_valid(),
            score: result.score(),
            error_count: result.errors().len(),
            counts_by_kind,
            errors: result.errors().iter().take(shown).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationEngine;
    use jsv_ir::Value;
    use jsv_schema::Compiler;
    use serde_json::json;

    fn failing_result() -> ValidationResult {
        let schema = Compiler::new()
            .compile(&Value::from(json!({
                "required": ["a", "b"],
                "properties": {"c": {"type": "string"}}
            })))
            .unwrap();
        ValidationEngine::new().validate(&schema, &Value::from(json!({"c": 1})))
    }

    #[test]
    fn test_report_counts_by_kind() {
        let report = ValidationReporter::new().report(&failing_result());
        assert!(!report.valid);
        assert_eq!(report.error_count, 3);
        assert_eq!(report.counts_by_kind.get("required-missing"), Some(&2));
        assert_eq!(report.counts_by_kind.get("type-mismatch"), Some(&1));
        assert_eq!(report.summary(), "Errors: 3");
    }

    #[test]
    fn test_render_text() {
        let text = ValidationReporter::new().report(&failing_result()).render_text();
        assert_eq!(
            text,
            "Validation failed.\n\
             - (root): a is required\n\
             - (root): b is required\n\
             - c: Invalid type. Expected: string, given: integer\n\
             Errors: 3\n"
        );

        let valid = ValidationReporter::new().report(&ValidationResult::valid());
        assert_eq!(valid.render_text(), "Validation passed.\nErrors: 0\n");
    }

    #[test]
    fn test_max_errors_truncates_body_only() {
        let report = ValidationReporter::new()
            .max_errors(1)
            .report(&failing_result());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.error_count, 3);
    }

    #[test]
    fn test_json_rendering() {
        let report = ValidationReporter::new().report(&failing_result());
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error_count"], 3);
        assert_eq!(json["errors"][2]["path"], "c");
        assert_eq!(json["errors"][2]["kind"], "type-mismatch");
    }
}
