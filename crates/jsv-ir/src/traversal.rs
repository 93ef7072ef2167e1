//! Cursor and visitor APIs for navigating value trees

use crate::value::Value;
use crate::Error;
use crate::Result;
use tracing::trace;

/// A cursor positioned on a value inside a larger document
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Current value
    value: &'a Value,

    /// Unescaped pointer tokens leading to the current value
    path: Vec<String>,
}

/// Visitor over every value of a tree, parents before children
pub trait Traversal {
    /// Visit a value. `path` holds the unescaped pointer tokens to it.
    fn visit(&mut self, value: &Value, path: &[String]);

    /// Returns true if traversal should continue
    fn should_continue(&self) -> bool {
        true
    }
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the given value
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            path: Vec::new(),
        }
    }

    /// Get the current value
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The current position as an RFC 6901 pointer
    pub fn pointer(&self) -> String {
        self.path
            .iter()
            .map(|token| format!("/{}", token.replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    /// Navigate to an object member by name
    pub fn child(&self, name: &str) -> Result<Cursor<'a>> {
        match self.value.get(name) {
            Some(child) => {
                let mut path = self.path.clone();
                path.push(name.to_string());
                Ok(Cursor { value: child, path })
            }
            None => Err(Error::node_not_found(format!(
                "{}/{}",
                self.pointer(),
                name
            ))),
        }
    }

    /// Navigate to an array element by index
    pub fn child_at(&self, index: usize) -> Result<Cursor<'a>> {
        match self.value.get_index(index) {
            Some(child) => {
                let mut path = self.path.clone();
                path.push(index.to_string());
                Ok(Cursor { value: child, path })
            }
            None => Err(Error::node_not_found(format!(
                "{}/{}",
                self.pointer(),
                index
            ))),
        }
    }

    /// Navigate using an RFC 6901 pointer (e.g. `/definitions/item/0`)
    ///
    /// Array containers interpret tokens as indices; a token that is not a
    /// plain decimal index is an error rather than a missing node.
    pub fn navigate(&self, pointer: &str) -> Result<Cursor<'a>> {
        if pointer.is_empty() {
            return Ok(self.clone());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(Error::invalid_pointer(pointer, "must start with '/'"));
        };

        let mut current = self.clone();
        for raw in rest.split('/') {
            let token = unescape_token(pointer, raw)?;
            current = match current.value {
                Value::Array(_) => {
                    let index = parse_index(&token)
                        .ok_or_else(|| Error::invalid_pointer(pointer, format!("'{token}' is not an array index")))?;
                    current.child_at(index)?
                }
                Value::Object(_) => current.child(&token)?,
                _ => {
                    return Err(Error::node_not_found(format!(
                        "{}/{}",
                        current.pointer(),
                        raw
                    )))
                }
            };
        }

        trace!(pointer, "Resolved JSON pointer");
        Ok(current)
    }
}

fn unescape_token(pointer: &str, raw: &str) -> Result<String> {
    let mut token = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => token.push('~'),
                Some('1') => token.push('/'),
                _ => {
                    return Err(Error::invalid_pointer(
                        pointer,
                        "'~' must be followed by '0' or '1'",
                    ))
                }
            }
        } else {
            token.push(c);
        }
    }
    Ok(token)
}

fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Walk the tree using a visitor
pub fn walk<T: Traversal>(value: &Value, visitor: &mut T) {
    walk_recursive(value, visitor, &mut vec![]);
}

fn walk_recursive<T: Traversal>(value: &Value, visitor: &mut T, path: &mut Vec<String>) {
    if !visitor.should_continue() {
        return;
    }

    visitor.visit(value, path);

    match value {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                path.push(idx.to_string());
                walk_recursive(item, visitor, path);
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, member) in map {
                path.push(key.clone());
                walk_recursive(member, visitor, path);
                path.pop();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        Value::from(json!({
            "definitions": {
                "item": {"type": "string"},
                "a/b": {"type": "number"},
                "m~n": {"type": "null"}
            },
            "list": [10, 20, {"deep": true}]
        }))
    }

    #[test]
    fn test_cursor_creation() {
        let doc = sample();
        let cursor = Cursor::new(&doc);

        assert_eq!(cursor.pointer(), "");
    }

    #[test]
    fn test_cursor_child() {
        let doc = sample();
        let cursor = Cursor::new(&doc).child("definitions").unwrap();

        assert_eq!(cursor.pointer(), "/definitions");
        assert!(cursor.value().get("item").is_some());
    }

    #[test]
    fn test_navigate_pointer() {
        let doc = sample();
        let cursor = Cursor::new(&doc).navigate("/definitions/item").unwrap();
        assert_eq!(cursor.value(), &Value::from(json!({"type": "string"})));

        let deep = Cursor::new(&doc).navigate("/list/2/deep").unwrap();
        assert_eq!(deep.value(), &Value::Bool(true));
        assert_eq!(deep.pointer(), "/list/2/deep");
    }

    #[test]
    fn test_navigate_escaped_tokens() {
        let doc = sample();
        let slash = Cursor::new(&doc).navigate("/definitions/a~1b").unwrap();
        assert_eq!(slash.value().get("type"), Some(&Value::from("number")));

        let tilde = Cursor::new(&doc).navigate("/definitions/m~0n").unwrap();
        assert_eq!(tilde.value().get("type"), Some(&Value::from("null")));
    }

    #[test]
    fn test_navigate_empty_pointer_is_root() {
        let doc = sample();
        let cursor = Cursor::new(&doc).navigate("").unwrap();
        assert_eq!(cursor.value(), &doc);
    }

    #[test]
    fn test_navigate_errors() {
        let doc = sample();
        assert!(matches!(
            Cursor::new(&doc).navigate("/definitions/missing"),
            Err(Error::NodeNotFound { .. })
        ));
        assert!(matches!(
            Cursor::new(&doc).navigate("definitions"),
            Err(Error::InvalidPointer { .. })
        ));
        assert!(matches!(
            Cursor::new(&doc).navigate("/list/01"),
            Err(Error::InvalidPointer { .. })
        ));
        assert!(matches!(
            Cursor::new(&doc).navigate("/list/9"),
            Err(Error::NodeNotFound { .. })
        ));
        assert!(matches!(
            Cursor::new(&doc).navigate("/bad~2"),
            Err(Error::InvalidPointer { .. })
        ));
    }

    struct CountingVisitor {
        visited: Vec<String>,
        max: usize,
    }

    impl Traversal for CountingVisitor {
        fn visit(&mut self, _value: &Value, path: &[String]) {
            self.visited.push(path.join("/"));
        }

        fn should_continue(&self) -> bool {
            self.visited.len() < self.max
        }
    }

    #[test]
    fn test_walk_visits_parents_first() {
        let doc = Value::from(json!({"a": [1, 2], "b": null}));
        let mut visitor = CountingVisitor {
            visited: Vec::new(),
            max: usize::MAX,
        };
        walk(&doc, &mut visitor);
        assert_eq!(visitor.visited, vec!["", "a", "a/0", "a/1", "b"]);
    }

    #[test]
    fn test_walk_stops_early() {
        let doc = Value::from(json!({"a": [1, 2], "b": null}));
        let mut visitor = CountingVisitor {
            visited: Vec::new(),
            max: 2,
        };
        walk(&doc, &mut visitor);
        assert_eq!(visitor.visited.len(), 2);
    }
}
