//! Reference resolution capability and an in-memory document registry

use dashmap::DashMap;
use jsv_ir::Value;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors a resolver reports back to the compiler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No document registered for '{0}'")]
    NotFound(String),

    #[error("Document '{uri}' could not be loaded: {reason}")]
    Invalid { uri: String, reason: String },
}

/// Fetches the raw schema document behind a `$ref` URI
///
/// Injected into the [`Compiler`](crate::Compiler); the core never reads
/// files or the network itself. The URI has no fragment.
pub trait SchemaResolver: Send + Sync {
    fn resolve(&self, uri: &str) -> Result<Value, ResolveError>;
}

impl<F> SchemaResolver for F
where
    F: Fn(&str) -> Result<Value, ResolveError> + Send + Sync,
{
    fn resolve(&self, uri: &str) -> Result<Value, ResolveError> {
        self(uri)
    }
}

/// Thread-safe uri -> document store usable as a [`SchemaResolver`]
pub struct DocumentRegistry {
    documents: DashMap<String, Value>,
}

impl DocumentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Register a document under a URI, replacing any previous one
    pub fn register(&self, uri: impl AsRef<str>, document: Value) {
        let key = normalize(uri.as_ref());
        debug!(uri = %key, "Registered schema document");
        self.documents.insert(key, document);
    }

    /// Get a copy of the document registered under `uri`
    pub fn get(&self, uri: &str) -> Option<Value> {
        self.documents
            .get(&normalize(uri))
            .map(|entry| entry.value().clone())
    }

    /// Check if a document exists
    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(&normalize(uri))
    }

    /// Remove a document, returning it if it was present
    pub fn remove(&self, uri: &str) -> Option<Value> {
        self.documents.remove(&normalize(uri)).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaResolver for DocumentRegistry {
    fn resolve(&self, uri: &str) -> Result<Value, ResolveError> {
        trace!(uri, "Resolving document from registry");
        self.get(uri)
            .ok_or_else(|| ResolveError::NotFound(uri.to_string()))
    }
}

fn normalize(uri: &str) -> String {
    uri.trim_end_matches('#').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_and_resolve() {
        let registry = DocumentRegistry::new();
        registry.register("https://example.com/a.json", Value::from("doc"));

        assert!(registry.contains("https://example.com/a.json"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve("https://example.com/a.json").unwrap(),
            Value::from("doc")
        );
    }

    #[test]
    fn test_trailing_hash_is_ignored() {
        let registry = DocumentRegistry::new();
        registry.register("https://example.com/a.json#", Value::Null);
        assert!(registry.contains("https://example.com/a.json"));
    }

    #[test]
    fn test_missing_document() {
        let registry = DocumentRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve("urn:missing"),
            Err(ResolveError::NotFound("urn:missing".to_string()))
        );
    }

    #[test]
    fn test_remove() {
        let registry = DocumentRegistry::default();
        registry.register("urn:x", Value::Bool(true));
        assert_eq!(registry.remove("urn:x"), Some(Value::Bool(true)));
        assert!(!registry.contains("urn:x"));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |uri: &str| -> Result<Value, ResolveError> {
            if uri == "urn:ok" {
                Ok(Value::Bool(true))
            } else {
                Err(ResolveError::NotFound(uri.to_string()))
            }
        };
        assert_eq!(resolver.resolve("urn:ok").unwrap(), Value::Bool(true));
        assert!(resolver.resolve("urn:nope").is_err());
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(DocumentRegistry::new());
        let handles: Vec<_> = (0..4_i64)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.register(format!("urn:doc:{i}"), Value::from(i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("urn:doc:2"), Some(Value::from(2_i64)));
    }
}
