//! JSON Schema draft selection

use std::fmt;

/// Draft whose keyword set and semantics the compiler applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Draft {
    Draft4,
    Draft6,
    #[default]
    Draft7,
}

impl Draft {
    /// Detect a draft from a `$schema` URI. Unknown URIs yield `None`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let uri = uri.trim_end_matches('#');
        if uri.contains("draft-04") {
            Some(Draft::Draft4)
        } else if uri.contains("draft-06") {
            Some(Draft::Draft6)
        } else if uri.contains("draft-07") {
            Some(Draft::Draft7)
        } else {
            None
        }
    }

    /// Parse the short forms accepted on the command line (`4`, `draft-06`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "4" | "draft4" | "draft-04" => Some(Draft::Draft4),
            "6" | "draft6" | "draft-06" => Some(Draft::Draft6),
            "7" | "draft7" | "draft-07" => Some(Draft::Draft7),
            _ => None,
        }
    }

    /// Keyword carrying a schema's identifier
    pub fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft4 => "id",
            Draft::Draft6 | Draft::Draft7 => "$id",
        }
    }

    /// `true` / `false` are valid schemas from draft 6 on
    pub fn allows_boolean_schemas(self) -> bool {
        self >= Draft::Draft6
    }

    /// `const`, `contains` and `propertyNames` exist from draft 6 on
    pub fn has_draft6_keywords(self) -> bool {
        self >= Draft::Draft6
    }

    /// `if` / `then` / `else` exist from draft 7 on
    pub fn has_conditionals(self) -> bool {
        self >= Draft::Draft7
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Draft::Draft4 => f.write_str("draft-04"),
            Draft::Draft6 => f.write_str("draft-06"),
            Draft::Draft7 => f.write_str("draft-07"),
        }
    }
}
