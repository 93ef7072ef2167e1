//! Compiled schema model

use crate::draft::Draft;
use indexmap::IndexMap;
use jsv_ir::{Kind, Number, Value};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A compiled schema, ready to validate any number of instances
///
/// Cloning is cheap: the node graph is shared.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Arc<SchemaNode>,
    draft: Draft,
}

impl Schema {
    pub fn new(root: Arc<SchemaNode>, draft: Draft) -> Self {
        Self { root, draft }
    }

    /// The root node of the compiled graph
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Draft whose keyword semantics were applied while compiling
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// `$id` (or draft-4 `id`) of the root schema, if any
    pub fn id(&self) -> Option<&str> {
        self.root.id.as_deref()
    }
}

/// Primitive type names accepted by the `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => PrimitiveType::Null,
            "boolean" => PrimitiveType::Boolean,
            "integer" => PrimitiveType::Integer,
            "number" => PrimitiveType::Number,
            "string" => PrimitiveType::String,
            "array" => PrimitiveType::Array,
            "object" => PrimitiveType::Object,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::String => "string",
            PrimitiveType::Array => "array",
            PrimitiveType::Object => "object",
        }
    }

    /// Whether an instance of `kind` is an instance of this type.
    /// `number` accepts integers; `integer` accepts integral numbers only.
    pub fn accepts(self, kind: Kind) -> bool {
        match (self, kind) {
            (PrimitiveType::Null, Kind::Null)
            | (PrimitiveType::Boolean, Kind::Boolean)
            | (PrimitiveType::Integer, Kind::Integer)
            | (PrimitiveType::Number, Kind::Number | Kind::Integer)
            | (PrimitiveType::String, Kind::String)
            | (PrimitiveType::Array, Kind::Array)
            | (PrimitiveType::Object, Kind::Object) => true,
            _ => false,
        }
    }
}

/// Allowed instance types; empty means unconstrained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet {
    types: Vec<PrimitiveType>,
}

impl TypeSet {
    /// Build a set, dropping duplicates while keeping declaration order
    pub fn new(types: impl IntoIterator<Item = PrimitiveType>) -> Self {
        let mut set = Self::default();
        for ty in types {
            if !set.types.contains(&ty) {
                set.types.push(ty);
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, ty: PrimitiveType) -> bool {
        self.types.contains(&ty)
    }

    /// Unconstrained sets accept every kind.
    pub fn accepts(&self, kind: Kind) -> bool {
        self.types.is_empty() || self.types.iter().any(|ty| ty.accepts(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = PrimitiveType> + '_ {
        self.types.iter().copied()
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types.iter().map(|ty| ty.name()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Policy for object keys not covered by `properties` or `patternProperties`
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Forbidden,
    Schema(Arc<SchemaNode>),
}

/// Form of the `items` keyword
#[derive(Debug, Clone)]
pub enum Items {
    /// Every element validates against one schema
    Single(Arc<SchemaNode>),
    /// Element `i` validates against schema `i`
    Tuple(Vec<Arc<SchemaNode>>),
}

/// Policy for array elements past a tuple-form `items`
#[derive(Debug, Clone, Default)]
pub enum AdditionalItems {
    #[default]
    Allowed,
    Forbidden,
    Schema(Arc<SchemaNode>),
}

/// Value of one `dependencies` entry
#[derive(Debug, Clone)]
pub enum Dependency {
    /// Other properties that must be present
    Properties(Vec<String>),
    /// Schema the whole object must satisfy
    Schema(Arc<SchemaNode>),
}

/// `if` / `then` / `else`
#[derive(Debug, Clone)]
pub struct Conditional {
    pub condition: Arc<SchemaNode>,
    pub then_branch: Option<Arc<SchemaNode>>,
    pub else_branch: Option<Arc<SchemaNode>>,
}

/// One compiled schema or sub-schema
///
/// A closed record: the validator checks a fixed set of fields instead of
/// dispatching on keywords. Absent keywords are `None` (or empty for
/// collection-valued keywords where emptiness and absence coincide).
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// `Some` for the literal `true` / `false` schemas
    pub boolean: Option<bool>,

    // Metadata
    pub schema_uri: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Unrecognized keywords, kept verbatim and never validated
    pub unknown: IndexMap<String, Value>,

    pub types: TypeSet,

    // Objects
    pub properties: IndexMap<String, Arc<SchemaNode>>,
    pub pattern_properties: Vec<(Regex, Arc<SchemaNode>)>,
    pub additional_properties: AdditionalProperties,
    pub required: Vec<String>,
    pub property_names: Option<Arc<SchemaNode>>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependencies: IndexMap<String, Dependency>,

    // Arrays
    pub items: Option<Items>,
    pub additional_items: AdditionalItems,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<Arc<SchemaNode>>,

    // Strings
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Regex>,
    pub format: Option<String>,

    // Numbers
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,

    // Any kind
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,

    // Combinators. `None` is an absent keyword; `Some(vec![])` was written
    // by the schema author and still takes part in validation.
    pub all_of: Option<Vec<Arc<SchemaNode>>>,
    pub any_of: Option<Vec<Arc<SchemaNode>>>,
    pub one_of: Option<Vec<Arc<SchemaNode>>>,
    pub not: Option<Arc<SchemaNode>>,
    pub conditional: Option<Conditional>,

    /// Property names declared here or by this node's own combinator branches
    pub declared_names: BTreeSet<String>,
}

impl SchemaNode {
    /// The `true` / `false` schema
    pub fn boolean(pass: bool) -> Self {
        Self {
            boolean: Some(pass),
            ..Self::default()
        }
    }

    /// Whether any combinator (`allOf`, `anyOf`, `oneOf`, `not`, `if`) is present
    pub fn has_combinators(&self) -> bool {
        self.all_of.is_some()
            || self.any_of.is_some()
            || self.one_of.is_some()
            || self.not.is_some()
            || self.conditional.is_some()
    }

    /// Recompute `declared_names` from `properties` and combinator branches.
    pub fn collect_declared_names(&mut self) {
        let mut names: BTreeSet<String> = self.properties.keys().cloned().collect();
        for branches in [&self.all_of, &self.any_of, &self.one_of].into_iter().flatten() {
            for branch in branches {
                names.extend(branch.declared_names.iter().cloned());
            }
        }
        self.declared_names = names;
    }
}
