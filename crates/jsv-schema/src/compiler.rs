//! Schema compiler: raw schema documents to [`SchemaNode`] graphs

use crate::draft::Draft;
use crate::model::{
    AdditionalItems, AdditionalProperties, Conditional, Dependency, Items, PrimitiveType, Schema,
    SchemaNode, TypeSet,
};
use crate::registry::SchemaResolver;
use crate::{Error, Result};
use indexmap::IndexMap;
use jsv_ir::{walk, Cursor, Number, Traversal, Value};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

const DEFAULT_MAX_REF_DEPTH: usize = 64;

/// Compiler configuration
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Draft used when the root schema has no recognizable `$schema`
    pub default_draft: Draft,
    /// Maximum number of nested `$ref` expansions
    pub max_ref_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_draft: Draft::default(),
            max_ref_depth: DEFAULT_MAX_REF_DEPTH,
        }
    }
}

impl CompilerConfig {
    #[must_use]
    pub fn default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    #[must_use]
    pub fn max_ref_depth(mut self, depth: usize) -> Self {
        self.max_ref_depth = depth;
        self
    }
}

/// Turns raw schema values into immutable [`Schema`]s
///
/// Every nested sub-schema is compiled eagerly and `$ref`s are expanded, so
/// validation never looks at the raw document again.
pub struct Compiler {
    config: CompilerConfig,
    resolver: Option<Arc<dyn SchemaResolver>>,
}

impl Compiler {
    /// Create a compiler with default settings and no resolver
    pub fn new() -> Self {
        Self {
            config: CompilerConfig::default(),
            resolver: None,
        }
    }

    /// Create with specific configuration
    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            config,
            resolver: None,
        }
    }

    /// Install the capability used to fetch non-local `$ref` targets
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl SchemaResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a raw schema document
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedKeyword`] when a keyword holds a value of the
    /// wrong shape, and the reference errors when a `$ref` cannot be expanded.
    pub fn compile(&self, raw: &Value) -> Result<Schema> {
        let draft = raw
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Draft::from_uri)
            .unwrap_or(self.config.default_draft);
        debug!(%draft, "Compiling schema");

        let document = Arc::new(raw.clone());
        let base = document
            .get(draft.id_keyword())
            .and_then(Value::as_str)
            .and_then(|id| Url::parse(id).ok())
            .map(strip_fragment);

        let mut session = Session {
            config: &self.config,
            resolver: self.resolver.as_deref(),
            documents: HashMap::new(),
            compiled_refs: HashMap::new(),
            ref_stack: Vec::new(),
        };
        if let Some(base) = &base {
            session
                .documents
                .insert(base.to_string(), Arc::clone(&document));
        }
        let scope = Scope {
            document: Arc::clone(&document),
            base,
            draft,
        };
        let root = session.compile_schema(raw, "", &scope)?;

        debug!(
            refs = session.compiled_refs.len(),
            "Schema compiled"
        );
        Ok(Schema::new(root, draft))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Document a sub-schema lives in and the base URI in effect for it
#[derive(Clone)]
struct Scope {
    document: Arc<Value>,
    base: Option<Url>,
    draft: Draft,
}

/// State of one `compile` call
struct Session<'c> {
    config: &'c CompilerConfig,
    resolver: Option<&'c dyn SchemaResolver>,
    /// Documents fetched so far, keyed by fragment-less URI
    documents: HashMap<String, Arc<Value>>,
    /// Expanded `$ref` targets, shared wherever the same target is referenced
    compiled_refs: HashMap<String, Arc<SchemaNode>>,
    /// References currently being expanded
    ref_stack: Vec<String>,
}

impl Session<'_> {
    fn compile_schema(&mut self, raw: &Value, pointer: &str, scope: &Scope) -> Result<Arc<SchemaNode>> {
        match raw {
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref") {
                    let reference = reference
                        .as_str()
                        .ok_or_else(|| malformed("$ref", pointer, "must be a string"))?;
                    return self.expand_ref(reference, scope);
                }

                let scope = scope_for(map, scope);
                self.compile_object(map, pointer, &scope).map(Arc::new)
            }
            Value::Bool(pass) if scope.draft.allows_boolean_schemas() => {
                Ok(Arc::new(SchemaNode::boolean(*pass)))
            }
            Value::Bool(_) => Err(malformed(
                "(schema)",
                pointer,
                format!("boolean schemas are not allowed in {}", scope.draft),
            )),
            other => Err(malformed(
                "(schema)",
                pointer,
                format!("a schema must be an object, found {}", other.kind()),
            )),
        }
    }

    fn compile_object(
        &mut self,
        map: &IndexMap<String, Value>,
        pointer: &str,
        scope: &Scope,
    ) -> Result<SchemaNode> {
        let draft = scope.draft;
        let mut node = SchemaNode::default();

        for (keyword, value) in map {
            let here = format!("{pointer}/{}", escape(keyword));
            match keyword.as_str() {
                "$schema" => node.schema_uri = Some(expect_str(keyword, pointer, value)?.to_string()),
                "$id" if draft >= Draft::Draft6 => {
                    node.id = Some(expect_str(keyword, pointer, value)?.to_string());
                }
                "id" if draft == Draft::Draft4 => {
                    node.id = Some(expect_str(keyword, pointer, value)?.to_string());
                }
                "title" => node.title = Some(expect_str(keyword, pointer, value)?.to_string()),
                "description" => {
                    node.description = Some(expect_str(keyword, pointer, value)?.to_string());
                }
                "definitions" => {
                    // Only reachable through `$ref`; compiled on demand.
                    if value.as_object().is_none() {
                        return Err(malformed(keyword, pointer, "must be an object"));
                    }
                }
                "type" => node.types = compile_types(value, pointer)?,

                "properties" => {
                    for (name, sub) in expect_object(keyword, pointer, value)? {
                        let sub_pointer = format!("{here}/{}", escape(name));
                        let child = self.compile_schema(sub, &sub_pointer, scope)?;
                        node.properties.insert(name.clone(), child);
                    }
                }
                "patternProperties" => {
                    for (pattern, sub) in expect_object(keyword, pointer, value)? {
                        let regex = compile_regex(keyword, pointer, pattern)?;
                        let sub_pointer = format!("{here}/{}", escape(pattern));
                        let child = self.compile_schema(sub, &sub_pointer, scope)?;
                        node.pattern_properties.push((regex, child));
                    }
                }
                "additionalProperties" => {
                    node.additional_properties = match value {
                        Value::Bool(true) => AdditionalProperties::Allowed,
                        Value::Bool(false) => AdditionalProperties::Forbidden,
                        _ => AdditionalProperties::Schema(self.compile_schema(value, &here, scope)?),
                    };
                }
                "required" => node.required = expect_string_array(keyword, pointer, value)?,
                "propertyNames" if draft.has_draft6_keywords() => {
                    node.property_names = Some(self.compile_schema(value, &here, scope)?);
                }
                "minProperties" => node.min_properties = Some(expect_count(keyword, pointer, value)?),
                "maxProperties" => node.max_properties = Some(expect_count(keyword, pointer, value)?),
                "dependencies" => {
                    for (name, dep) in expect_object(keyword, pointer, value)? {
                        let dependency = if dep.as_array().is_some() {
                            Dependency::Properties(expect_string_array(keyword, pointer, dep)?)
                        } else {
                            let sub_pointer = format!("{here}/{}", escape(name));
                            Dependency::Schema(self.compile_schema(dep, &sub_pointer, scope)?)
                        };
                        node.dependencies.insert(name.clone(), dependency);
                    }
                }

                "items" => {
                    node.items = Some(match value {
                        Value::Array(items) => Items::Tuple(
                            self.compile_schema_list(items, &here, scope)?,
                        ),
                        _ => Items::Single(self.compile_schema(value, &here, scope)?),
                    });
                }
                "additionalItems" => {
                    node.additional_items = match value {
                        Value::Bool(true) => AdditionalItems::Allowed,
                        Value::Bool(false) => AdditionalItems::Forbidden,
                        _ => AdditionalItems::Schema(self.compile_schema(value, &here, scope)?),
                    };
                }
                "minItems" => node.min_items = Some(expect_count(keyword, pointer, value)?),
                "maxItems" => node.max_items = Some(expect_count(keyword, pointer, value)?),
                "uniqueItems" => {
                    node.unique_items = value
                        .as_bool()
                        .ok_or_else(|| malformed(keyword, pointer, "must be a boolean"))?;
                }
                "contains" if draft.has_draft6_keywords() => {
                    node.contains = Some(self.compile_schema(value, &here, scope)?);
                }

                "minLength" => node.min_length = Some(expect_count(keyword, pointer, value)?),
                "maxLength" => node.max_length = Some(expect_count(keyword, pointer, value)?),
                "pattern" => {
                    let pattern = expect_str(keyword, pointer, value)?;
                    node.pattern = Some(compile_regex(keyword, pointer, pattern)?);
                }
                "format" => node.format = Some(expect_str(keyword, pointer, value)?.to_string()),

                "minimum" => node.minimum = Some(expect_number(keyword, pointer, value)?),
                "maximum" => node.maximum = Some(expect_number(keyword, pointer, value)?),
                // Boolean forms are folded in once every keyword was read.
                "exclusiveMinimum" | "exclusiveMaximum" => {
                    if let Value::Number(n) = value {
                        if keyword == "exclusiveMinimum" {
                            node.exclusive_minimum = Some(*n);
                        } else {
                            node.exclusive_maximum = Some(*n);
                        }
                    } else if value.as_bool().is_none() {
                        return Err(malformed(keyword, pointer, "must be a number or a boolean"));
                    }
                }
                "multipleOf" => {
                    let n = expect_number(keyword, pointer, value)?;
                    if n.as_f64() <= 0.0 {
                        return Err(malformed(keyword, pointer, "must be strictly greater than 0"));
                    }
                    node.multiple_of = Some(n);
                }

                "enum" => {
                    let values = value
                        .as_array()
                        .ok_or_else(|| malformed(keyword, pointer, "must be an array"))?;
                    node.enum_values = Some(values.to_vec());
                }
                "const" if draft.has_draft6_keywords() => node.const_value = Some(value.clone()),

                "allOf" => node.all_of = Some(self.compile_combinator(keyword, pointer, value, scope)?),
                "anyOf" => node.any_of = Some(self.compile_combinator(keyword, pointer, value, scope)?),
                "oneOf" => node.one_of = Some(self.compile_combinator(keyword, pointer, value, scope)?),
                "not" => node.not = Some(self.compile_schema(value, &here, scope)?),
                "if" | "then" | "else" if draft.has_conditionals() => {}

                _ => {
                    node.unknown.insert(keyword.clone(), value.clone());
                }
            }
        }

        fold_boolean_exclusive(map, &mut node);

        if draft.has_conditionals() {
            if let Some(condition) = map.get("if") {
                let then_branch = map
                    .get("then")
                    .map(|v| self.compile_schema(v, &format!("{pointer}/then"), scope))
                    .transpose()?;
                let else_branch = map
                    .get("else")
                    .map(|v| self.compile_schema(v, &format!("{pointer}/else"), scope))
                    .transpose()?;
                node.conditional = Some(Conditional {
                    condition: self.compile_schema(condition, &format!("{pointer}/if"), scope)?,
                    then_branch,
                    else_branch,
                });
            }
        }

        node.collect_declared_names();
        Ok(node)
    }

    fn compile_combinator(
        &mut self,
        keyword: &str,
        pointer: &str,
        value: &Value,
        scope: &Scope,
    ) -> Result<Vec<Arc<SchemaNode>>> {
        let branches = value
            .as_array()
            .ok_or_else(|| malformed(keyword, pointer, "must be an array of schemas"))?;
        self.compile_schema_list(branches, &format!("{pointer}/{keyword}"), scope)
    }

    fn compile_schema_list(
        &mut self,
        raw: &[Value],
        pointer: &str,
        scope: &Scope,
    ) -> Result<Vec<Arc<SchemaNode>>> {
        raw.iter()
            .enumerate()
            .map(|(idx, sub)| self.compile_schema(sub, &format!("{pointer}/{idx}"), scope))
            .collect()
    }

    /// Expand a `$ref` into the compiled node it points at
    fn expand_ref(&mut self, reference: &str, scope: &Scope) -> Result<Arc<SchemaNode>> {
        let (target_scope, fragment) = self.locate_document(reference, scope)?;
        let key = format!(
            "{}#{}",
            target_scope.base.as_ref().map(Url::as_str).unwrap_or_default(),
            fragment
        );

        if let Some(node) = self.compiled_refs.get(&key) {
            trace!(reference, "Reusing compiled reference");
            return Ok(Arc::clone(node));
        }
        if self.ref_stack.contains(&key) {
            return Err(Error::CyclicReference {
                reference: reference.to_string(),
            });
        }
        if self.ref_stack.len() >= self.config.max_ref_depth {
            return Err(Error::DepthExceeded {
                reference: reference.to_string(),
                limit: self.config.max_ref_depth,
            });
        }

        let document = Arc::clone(&target_scope.document);
        let pointer = resolve_fragment(&document, &fragment).ok_or_else(|| {
            Error::UnresolvedReference {
                reference: reference.to_string(),
                reason: format!("no schema found at fragment '#{fragment}'"),
            }
        })?;
        let target = Cursor::new(&document)
            .navigate(&pointer)
            .map_err(|e| Error::UnresolvedReference {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?
            .value();

        trace!(reference, target = %key, "Expanding reference");
        self.ref_stack.push(key.clone());
        let compiled = self.compile_schema(target, &pointer, &target_scope);
        self.ref_stack.pop();
        let compiled = compiled?;

        self.compiled_refs.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Find the document a reference points into, fetching it if needed
    fn locate_document(&mut self, reference: &str, scope: &Scope) -> Result<(Scope, String)> {
        if let Some(fragment) = reference.strip_prefix('#') {
            return Ok((scope.clone(), decode_fragment(fragment)));
        }

        let absolute = match &scope.base {
            Some(base) => base.join(reference),
            None => Url::parse(reference),
        }
        .map_err(|e| Error::UnresolvedReference {
            reference: reference.to_string(),
            reason: format!("cannot build an absolute URI: {e}"),
        })?;

        let fragment = decode_fragment(absolute.fragment().unwrap_or_default());
        let document_uri = strip_fragment(absolute);

        if scope.base.as_ref() == Some(&document_uri) {
            return Ok((scope.clone(), fragment));
        }

        let document = self.fetch(reference, &document_uri)?;
        let draft = document
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Draft::from_uri)
            .unwrap_or(scope.draft);
        Ok((
            Scope {
                document,
                base: Some(document_uri),
                draft,
            },
            fragment,
        ))
    }

    fn fetch(&mut self, reference: &str, uri: &Url) -> Result<Arc<Value>> {
        if let Some(document) = self.documents.get(uri.as_str()) {
            return Ok(Arc::clone(document));
        }
        let resolver = self.resolver.ok_or_else(|| Error::UnresolvedReference {
            reference: reference.to_string(),
            reason: "no resolver configured for external references".to_string(),
        })?;
        let document = resolver
            .resolve(uri.as_str())
            .map(Arc::new)
            .map_err(|e| Error::UnresolvedReference {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;
        debug!(uri = %uri, "Fetched external schema document");
        self.documents
            .insert(uri.to_string(), Arc::clone(&document));
        Ok(document)
    }
}

/// Scope with the base URI moved by a schema's own identifier
fn scope_for(map: &IndexMap<String, Value>, scope: &Scope) -> Scope {
    let id = map.get(scope.draft.id_keyword()).and_then(Value::as_str);
    match id {
        Some(id) if !id.starts_with('#') => {
            let joined = match &scope.base {
                Some(base) => base.join(id).ok(),
                None => Url::parse(id).ok(),
            };
            Scope {
                document: Arc::clone(&scope.document),
                base: joined.map(strip_fragment).or_else(|| scope.base.clone()),
                draft: scope.draft,
            }
        }
        _ => scope.clone(),
    }
}

/// Turn a fragment into a JSON pointer. Plain-name fragments are looked up
/// as `#name` identifiers anywhere in the document.
fn resolve_fragment(document: &Value, fragment: &str) -> Option<String> {
    if fragment.is_empty() || fragment.starts_with('/') {
        return Some(fragment.to_string());
    }

    let mut finder = AnchorFinder {
        anchor: format!("#{fragment}"),
        found: None,
    };
    walk(document, &mut finder);
    finder.found.map(|tokens| {
        tokens
            .iter()
            .map(|t| format!("/{}", escape(t)))
            .collect()
    })
}

/// Locates the schema whose `$id` / `id` is a given `#anchor`
struct AnchorFinder {
    anchor: String,
    found: Option<Vec<String>>,
}

impl Traversal for AnchorFinder {
    fn visit(&mut self, value: &Value, path: &[String]) {
        let matches = ["$id", "id"]
            .iter()
            .any(|key| value.get(key).and_then(Value::as_str) == Some(self.anchor.as_str()));
        if matches {
            self.found = Some(path.to_vec());
        }
    }

    fn should_continue(&self) -> bool {
        self.found.is_none()
    }
}

/// Draft-4 `exclusiveMinimum: true` turns `minimum` into an exclusive bound.
fn fold_boolean_exclusive(map: &IndexMap<String, Value>, node: &mut SchemaNode) {
    if map.get("exclusiveMinimum").and_then(Value::as_bool) == Some(true) {
        node.exclusive_minimum = node.minimum.take();
    }
    if map.get("exclusiveMaximum").and_then(Value::as_bool) == Some(true) {
        node.exclusive_maximum = node.maximum.take();
    }
}

fn compile_types(value: &Value, pointer: &str) -> Result<TypeSet> {
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| malformed("type", pointer, "must be a string or an array of strings"))
            })
            .collect::<Result<_>>()?,
        _ => return Err(malformed("type", pointer, "must be a string or an array of strings")),
    };

    let types = names
        .into_iter()
        .map(|name| {
            PrimitiveType::from_name(name)
                .ok_or_else(|| malformed("type", pointer, format!("unknown type '{name}'")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TypeSet::new(types))
}

fn compile_regex(keyword: &str, pointer: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| malformed(keyword, pointer, format!("invalid pattern '{pattern}': {e}")))
}

fn expect_str<'v>(keyword: &str, pointer: &str, value: &'v Value) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| malformed(keyword, pointer, "must be a string"))
}

fn expect_object<'v>(
    keyword: &str,
    pointer: &str,
    value: &'v Value,
) -> Result<&'v IndexMap<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| malformed(keyword, pointer, "must be an object"))
}

fn expect_string_array(keyword: &str, pointer: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(keyword, pointer, "must be an array of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(keyword, pointer, "must be an array of strings"))
        })
        .collect()
}

fn expect_count(keyword: &str, pointer: &str, value: &Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| malformed(keyword, pointer, "must be a non-negative integer"))
}

fn expect_number(keyword: &str, pointer: &str, value: &Value) -> Result<Number> {
    value
        .as_number()
        .filter(|n| n.is_finite())
        .ok_or_else(|| malformed(keyword, pointer, "must be a number"))
}

fn malformed(keyword: &str, pointer: &str, reason: impl Into<String>) -> Error {
    Error::MalformedKeyword {
        keyword: keyword.to_string(),
        pointer: if pointer.is_empty() { "#".to_string() } else { format!("#{pointer}") },
        reason: reason.into(),
    }
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Undo the percent-encoding URI fragments may carry (`%25` -> `%`).
fn decode_fragment(fragment: &str) -> String {
    percent_decode_str(fragment)
        .decode_utf8()
        .map_or_else(|_| fragment.to_string(), |decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(raw: serde_json::Value) -> Result<Schema> {
        Compiler::new().compile(&Value::from(raw))
    }

    #[test]
    fn test_compile_properties_and_required() {
        let schema = compile(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "string"}},
            "required": ["a"],
            "additionalProperties": false
        }))
        .unwrap();

        let root = schema.root();
        assert!(root.types.contains(PrimitiveType::Object));
        assert_eq!(root.properties.len(), 2);
        assert_eq!(root.required, vec!["a".to_string()]);
        assert!(matches!(
            root.additional_properties,
            AdditionalProperties::Forbidden
        ));
    }

    #[test]
    fn test_unknown_keywords_are_preserved() {
        let schema = compile(json!({"x-vendor": {"a": 1}, "default": 3})).unwrap();
        assert_eq!(schema.root().unknown.len(), 2);
        assert!(schema.root().unknown.contains_key("x-vendor"));
    }

    #[test]
    fn test_required_must_be_string_array() {
        let err = compile(json!({"required": ["a", 1]})).unwrap_err();
        assert!(matches!(err, Error::MalformedKeyword { ref keyword, .. } if keyword == "required"));
    }

    #[test]
    fn test_malformed_pointer_names_location() {
        let err = compile(json!({"properties": {"a": {"minLength": -1}}})).unwrap_err();
        match err {
            Error::MalformedKeyword { keyword, pointer, .. } => {
                assert_eq!(keyword, "minLength");
                assert_eq!(pointer, "#/properties/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_combinator_is_kept() {
        let schema = compile(json!({"anyOf": []})).unwrap();
        assert_eq!(schema.root().any_of.as_ref().map(Vec::len), Some(0));
        assert!(schema.root().one_of.is_none());
    }

    #[test]
    fn test_draft4_exclusive_bounds() {
        let schema = compile(json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "minimum": 1,
            "exclusiveMinimum": true,
            "maximum": 9
        }))
        .unwrap();
        assert_eq!(schema.draft(), Draft::Draft4);
        assert!(schema.root().minimum.is_none());
        assert_eq!(schema.root().exclusive_minimum, Some(Number::from(1_u64)));
        assert_eq!(schema.root().maximum, Some(Number::from(9_u64)));
    }

    #[test]
    fn test_boolean_schema_requires_draft6() {
        assert!(compile(json!({"not": false})).is_ok());
        let err = compile(json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "not": false
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedKeyword { .. }));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = compile(json!({"pattern": "("})).unwrap_err();
        assert!(matches!(err, Error::MalformedKeyword { ref keyword, .. } if keyword == "pattern"));
    }

    #[test]
    fn test_local_ref_expansion() {
        let schema = compile(json!({
            "definitions": {"positive": {"type": "integer", "minimum": 1}},
            "properties": {
                "a": {"$ref": "#/definitions/positive"},
                "b": {"$ref": "#/definitions/positive"}
            }
        }))
        .unwrap();
        let a = &schema.root().properties["a"];
        let b = &schema.root().properties["b"];
        assert!(a.types.contains(PrimitiveType::Integer));
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_percent_encoded_ref() {
        let schema = compile(json!({
            "definitions": {"unit price": {"type": "number"}},
            "properties": {"price": {"$ref": "#/definitions/unit%20price"}}
        }))
        .unwrap();
        assert!(schema.root().properties["price"]
            .types
            .contains(PrimitiveType::Number));
    }

    #[test]
    fn test_anchor_ref() {
        let schema = compile(json!({
            "definitions": {"name": {"$id": "#name", "type": "string"}},
            "properties": {"n": {"$ref": "#name"}}
        }))
        .unwrap();
        assert!(schema.root().properties["n"]
            .types
            .contains(PrimitiveType::String));
    }

    #[test]
    fn test_cyclic_ref_is_rejected() {
        let err = compile(json!({
            "properties": {"child": {"$ref": "#"}}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::CyclicReference { .. }));
    }

    #[test]
    fn test_missing_local_target() {
        let err = compile(json!({"$ref": "#/definitions/nope"})).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn test_external_ref_without_resolver() {
        let err = compile(json!({"$ref": "https://example.com/other.json"})).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn test_declared_names_are_collected() {
        let schema = compile(json!({
            "properties": {"x": {}},
            "oneOf": [{"properties": {"A": {}}}, {"properties": {"B": {}}}]
        }))
        .unwrap();
        let names: Vec<&str> = schema
            .root()
            .declared_names
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["A", "B", "x"]);
    }

    #[test]
    fn test_conditionals_compile_in_draft7() {
        let schema = compile(json!({
            "if": {"properties": {"kind": {"const": "a"}}},
            "then": {"required": ["a"]}
        }))
        .unwrap();
        let conditional = schema.root().conditional.as_ref().unwrap();
        assert!(conditional.then_branch.is_some());
        assert!(conditional.else_branch.is_none());
    }

    #[test]
    fn test_decode_fragment() {
        assert_eq!(decode_fragment("/definitions/a%25b"), "/definitions/a%b");
        assert_eq!(decode_fragment("/x%2"), "/x%2");
        assert_eq!(decode_fragment("/definitions/a%20b%25"), "/definitions/a b%");
        assert_eq!(decode_fragment("/%FF"), "/%FF");
    }
}
