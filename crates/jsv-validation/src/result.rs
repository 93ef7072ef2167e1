//! Validation results and structured errors

use jsv_ir::InstancePath;
use serde::{Serialize, Serializer};
use std::fmt;

/// Category of a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    TypeMismatch,
    RequiredMissing,
    AdditionalPropertyForbidden,
    PatternMismatch,
    RangeViolation,
    LengthViolation,
    UniquenessViolation,
    NotViolation,
    AllOfViolation,
    AnyOfViolation,
    OneOfViolation,
    FormatMismatch,
    EnumMismatch,
    ConstMismatch,
    DependencyMissing,
    PropertyNameViolation,
    ContainsViolation,
    ConditionalViolation,
    AdditionalItemsForbidden,
    FalseSchema,
    MultipleOfViolation,
    PropertyCountViolation,
    ItemCountViolation,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::RequiredMissing => "required-missing",
            ErrorKind::AdditionalPropertyForbidden => "additional-property-forbidden",
            ErrorKind::PatternMismatch => "pattern-mismatch",
            ErrorKind::RangeViolation => "range-violation",
            ErrorKind::LengthViolation => "length-violation",
            ErrorKind::UniquenessViolation => "uniqueness-violation",
            ErrorKind::NotViolation => "not-violation",
            ErrorKind::AllOfViolation => "allof-violation",
            ErrorKind::AnyOfViolation => "anyof-violation",
            ErrorKind::OneOfViolation => "oneof-violation",
            ErrorKind::FormatMismatch => "format-mismatch",
            ErrorKind::EnumMismatch => "enum-mismatch",
            ErrorKind::ConstMismatch => "const-mismatch",
            ErrorKind::DependencyMissing => "dependency-missing",
            ErrorKind::PropertyNameViolation => "property-name-violation",
            ErrorKind::ContainsViolation => "contains-violation",
            ErrorKind::ConditionalViolation => "conditional-violation",
            ErrorKind::AdditionalItemsForbidden => "additional-items-forbidden",
            ErrorKind::FalseSchema => "false-schema",
            ErrorKind::MultipleOfViolation => "multiple-of-violation",
            ErrorKind::PropertyCountViolation => "property-count-violation",
            ErrorKind::ItemCountViolation => "item-count-violation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Location of the offending value, from the document root
    pub path: InstancePath,
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, path: InstancePath, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

/// Renders `<path>: <message>`, e.g. `(root): A is required`
impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of validating one instance (or sub-instance) against one node
///
/// Built fresh for every call and owned by the caller. `score` ranks how
/// close a failing alternative came to validating; it has no meaning on its
/// own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    score: i64,
    errors: Vec<ValidationError>,
}

/// Score cost of one error: a net -1 against the +1 a node earns on completion.
const ERROR_PENALTY: i64 = 2;

impl ValidationResult {
    /// Create a new valid result with a zero score
    pub fn valid() -> Self {
        Self {
            valid: true,
            score: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Errors in discovery order
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Errors rendered as `<path>: <message>` lines
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub(crate) fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.score -= ERROR_PENALTY;
        self.valid = false;
    }

    pub(crate) fn increment_score(&mut self) {
        self.score += 1;
    }

    /// Fold a child outcome into this one: its errors are appended in order
    /// and its score is added.
    pub(crate) fn merge(&mut self, other: ValidationResult) {
        self.score += other.score;
        if !other.errors.is_empty() {
            self.valid = false;
            self.errors.extend(other.errors);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}
