//! Document store seam. The application talks to its backing store through
//! this trait only, so tests can substitute failing or counting stores.

mod local;

pub use local::LocalDocStore;

use serde_json::{Map, Value};

use crate::error::AppResult;

/// Key/value document store with merge and append-unique semantics.
///
/// The surface mirrors what the application actually consumes from its
/// backend: get a document by key, create one with a fixed key, merge fields
/// into an existing one, and append a value to an array field only if absent.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. `Ok(None)` when the key does not exist.
    fn get(&self, collection: &str, key: &str) -> AppResult<Option<Value>>;

    /// Create a document under `key`. Fails if the key already exists.
    fn create(&self, collection: &str, key: &str, value: Value) -> AppResult<()>;

    /// Merge `fields` into an existing document, overwriting field-wise.
    /// Fails with `NotFound` when the document does not exist.
    fn merge(&self, collection: &str, key: &str, fields: Map<String, Value>) -> AppResult<()>;

    /// Append `value` to the array field `field` unless already present.
    /// Creates the field as a one-element array when missing.
    fn array_union(&self, collection: &str, key: &str, field: &str, value: Value) -> AppResult<()>;
}
