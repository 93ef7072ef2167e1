//! Validation engine

use crate::combinators;
use crate::formats;
use crate::result::{ErrorKind, ValidationError, ValidationResult};
use crate::rules::{self, RuleResult};
use indexmap::IndexMap;
use jsv_ir::{InstancePath, Number, Value};
use jsv_schema::{AdditionalItems, AdditionalProperties, Dependency, Items, Schema, SchemaNode};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Property names an enclosing node has already accounted for
///
/// Keys in this set are never reported by `additionalProperties`. Borrowed
/// from the compiled schema, so it lives as long as the schema does.
pub(crate) type KnownNames<'s> = BTreeSet<&'s str>;

/// Validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Treat `format` as an assertion; when false it is an annotation only
    pub assert_formats: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            assert_formats: true,
        }
    }
}

impl ValidationConfig {
    #[must_use]
    pub fn assert_formats(mut self, assert: bool) -> Self {
        self.assert_formats = assert;
        self
    }
}

/// Main validation engine
///
/// Stateless apart from its configuration; one engine can validate any
/// number of instances against any number of schemas, from any thread.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Create a new validation engine
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Create with specific configuration
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a complete instance document
    pub fn validate(&self, schema: &Schema, instance: &Value) -> ValidationResult {
        debug!(draft = %schema.draft(), kind = %instance.kind(), "Validating instance");
        let result = self.validate_at(schema.root(), instance, &InstancePath::root());
        debug!(
            valid = result.is_valid(),
            errors = result.errors().len(),
            score = result.score(),
            "Validation finished"
        );
        result
    }

    /// Validate a sub-instance located at `path` against a single node
    pub fn validate_at(
        &self,
        node: &SchemaNode,
        instance: &Value,
        path: &InstancePath,
    ) -> ValidationResult {
        self.validate_node(node, instance, path, &KnownNames::new())
    }

    /// Core recursive step
    ///
    /// The node earns +1 for each stage it completes (kind-specific,
    /// enum/const, combinators, and the node itself) and loses 2 per error.
    pub(crate) fn validate_node<'s>(
        &self,
        node: &'s SchemaNode,
        instance: &Value,
        path: &InstancePath,
        known: &KnownNames<'s>,
    ) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if let Some(pass) = node.boolean {
            if !pass {
                result.add_error(ValidationError::new(
                    ErrorKind::FalseSchema,
                    path.clone(),
                    "False always fails validation",
                ));
            }
            return result;
        }

        let kind = instance.kind();
        if node.types.accepts(kind) {
            match instance {
                Value::Object(map) => {
                    self.validate_object(node, instance, map, path, known, &mut result);
                }
                Value::Array(items) => self.validate_array(node, items, path, &mut result),
                Value::String(s) => self.validate_string(node, s, path, &mut result),
                Value::Number(n) => self.validate_number(node, *n, path, &mut result),
                Value::Null | Value::Bool(_) => {}
            }
            self.validate_common(node, instance, path, &mut result);
        } else {
            trace!(path = %path, expected = %node.types, given = %kind, "Type mismatch");
            result.add_error(ValidationError::new(
                ErrorKind::TypeMismatch,
                path.clone(),
                format!("Invalid type. Expected: {}, given: {kind}", node.types),
            ));
        }

        combinators::validate_combinators(self, node, instance, path, known, &mut result);

        result.increment_score();
        result
    }

    fn validate_object<'s>(
        &self,
        node: &'s SchemaNode,
        instance: &Value,
        map: &IndexMap<String, Value>,
        path: &InstancePath,
        known: &KnownNames<'s>,
        result: &mut ValidationResult,
    ) {
        apply_rule(
            result,
            ErrorKind::PropertyCountViolation,
            path,
            rules::validate_property_count(map.len(), node.min_properties, node.max_properties),
        );

        for name in &node.required {
            if map.contains_key(name) {
                result.increment_score();
            } else {
                result.add_error(ValidationError::new(
                    ErrorKind::RequiredMissing,
                    path.clone(),
                    format!("{name} is required"),
                ));
            }
        }

        for (name, child) in &node.properties {
            if let Some(value) = map.get(name) {
                result.merge(self.validate_at(child, value, &path.push_key(name)));
            }
        }

        for (key, value) in map {
            let mut matched = node.properties.contains_key(key);
            for (pattern, child) in &node.pattern_properties {
                if pattern.is_match(key) {
                    matched = true;
                    result.merge(self.validate_at(child, value, &path.push_key(key)));
                }
            }
            if matched || known.contains(key.as_str()) {
                continue;
            }
            match &node.additional_properties {
                AdditionalProperties::Allowed => {}
                AdditionalProperties::Forbidden => {
                    result.add_error(ValidationError::new(
                        ErrorKind::AdditionalPropertyForbidden,
                        path.clone(),
                        format!("Additional property {key} is not allowed"),
                    ));
                }
                AdditionalProperties::Schema(extra) => {
                    result.merge(self.validate_at(extra, value, &path.push_key(key)));
                }
            }
        }

        if let Some(names) = &node.property_names {
            for key in map.keys() {
                let outcome = self.validate_at(names, &Value::String(key.clone()), path);
                if !outcome.is_valid() {
                    result.add_error(ValidationError::new(
                        ErrorKind::PropertyNameViolation,
                        path.clone(),
                        format!("Property name of \"{key}\" does not match"),
                    ));
                    result.merge(outcome);
                }
            }
        }

        for (trigger, dependency) in &node.dependencies {
            if !map.contains_key(trigger) {
                continue;
            }
            match dependency {
                Dependency::Properties(names) => {
                    for name in names.iter().filter(|name| !map.contains_key(*name)) {
                        result.add_error(ValidationError::new(
                            ErrorKind::DependencyMissing,
                            path.clone(),
                            format!("Has a dependency on {name}"),
                        ));
                    }
                }
                Dependency::Schema(schema) => {
                    result.merge(self.validate_node(schema, instance, path, known));
                }
            }
        }

        result.increment_score();
    }

    fn validate_array(
        &self,
        node: &SchemaNode,
        items: &[Value],
        path: &InstancePath,
        result: &mut ValidationResult,
    ) {
        match &node.items {
            Some(Items::Single(schema)) => {
                for (idx, item) in items.iter().enumerate() {
                    result.merge(self.validate_at(schema, item, &path.push_index(idx)));
                }
            }
            Some(Items::Tuple(schemas)) => {
                for (idx, (item, schema)) in items.iter().zip(schemas).enumerate() {
                    result.merge(self.validate_at(schema, item, &path.push_index(idx)));
                }
                if items.len() > schemas.len() {
                    match &node.additional_items {
                        AdditionalItems::Allowed => {}
                        AdditionalItems::Forbidden => {
                            result.add_error(ValidationError::new(
                                ErrorKind::AdditionalItemsForbidden,
                                path.clone(),
                                "No additional items allowed on array",
                            ));
                        }
                        AdditionalItems::Schema(extra) => {
                            for (idx, item) in items.iter().enumerate().skip(schemas.len()) {
                                result.merge(self.validate_at(extra, item, &path.push_index(idx)));
                            }
                        }
                    }
                }
            }
            None => {}
        }

        apply_rule(
            result,
            ErrorKind::ItemCountViolation,
            path,
            rules::validate_item_count(items.len(), node.min_items, node.max_items),
        );

        if node.unique_items {
            for (i, j) in rules::find_duplicates(items) {
                result.add_error(ValidationError::new(
                    ErrorKind::UniquenessViolation,
                    path.clone(),
                    format!("array items[{i},{j}] must be unique"),
                ));
            }
        }

        if let Some(contains) = &node.contains {
            self.validate_contains(contains, items, path, result);
        }

        result.increment_score();
    }

    fn validate_contains(
        &self,
        contains: &SchemaNode,
        items: &[Value],
        path: &InstancePath,
        result: &mut ValidationResult,
    ) {
        let mut failures = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let outcome = self.validate_at(contains, item, &path.push_index(idx));
            if outcome.is_valid() {
                return;
            }
            failures.push(outcome);
        }

        result.add_error(ValidationError::new(
            ErrorKind::ContainsViolation,
            path.clone(),
            "At least one of the items must match",
        ));
        if let Some(best) = combinators::best_failure(&failures) {
            result.merge(failures.swap_remove(best));
        }
    }

    fn validate_string(
        &self,
        node: &SchemaNode,
        value: &str,
        path: &InstancePath,
        result: &mut ValidationResult,
    ) {
        apply_rule(
            result,
            ErrorKind::LengthViolation,
            path,
            rules::validate_length(value, node.min_length, node.max_length),
        );

        if let Some(pattern) = &node.pattern {
            apply_rule(
                result,
                ErrorKind::PatternMismatch,
                path,
                rules::validate_pattern(value, pattern),
            );
        }

        if let Some(format) = &node.format {
            if self.config.assert_formats && !formats::check_format(format, value) {
                result.add_error(ValidationError::new(
                    ErrorKind::FormatMismatch,
                    path.clone(),
                    format!("Does not match format '{format}'"),
                ));
            }
        }

        result.increment_score();
    }

    fn validate_number(
        &self,
        node: &SchemaNode,
        value: Number,
        path: &InstancePath,
        result: &mut ValidationResult,
    ) {
        if let Some(divisor) = node.multiple_of {
            apply_rule(
                result,
                ErrorKind::MultipleOfViolation,
                path,
                rules::validate_multiple_of(value, divisor),
            );
        }

        let bounds = [
            node.minimum.map(|min| rules::validate_minimum(value, min, false)),
            node.exclusive_minimum.map(|min| rules::validate_minimum(value, min, true)),
            node.maximum.map(|max| rules::validate_maximum(value, max, false)),
            node.exclusive_maximum.map(|max| rules::validate_maximum(value, max, true)),
        ];
        for rule in bounds.into_iter().flatten() {
            apply_rule(result, ErrorKind::RangeViolation, path, rule);
        }

        result.increment_score();
    }

    /// `enum` and `const`, which apply to every kind
    fn validate_common(
        &self,
        node: &SchemaNode,
        instance: &Value,
        path: &InstancePath,
        result: &mut ValidationResult,
    ) {
        if let Some(allowed) = &node.enum_values {
            apply_rule(
                result,
                ErrorKind::EnumMismatch,
                path,
                rules::validate_enum(instance, allowed),
            );
        }

        if let Some(expected) = &node.const_value {
            apply_rule(
                result,
                ErrorKind::ConstMismatch,
                path,
                rules::validate_const(instance, expected),
            );
        }

        result.increment_score();
    }
}

fn apply_rule(
    result: &mut ValidationResult,
    kind: ErrorKind,
    path: &InstancePath,
    rule: RuleResult,
) {
    if let Some(message) = rule.message.filter(|_| !rule.is_valid) {
        result.add_error(ValidationError::new(kind, path.clone(), message));
    }
}
