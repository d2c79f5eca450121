//! Local JSON-file document store.
//! One file per document under `<root>/<collection>/<key>.json`, with an
//! in-memory cache so reads never touch disk after first load. Writes go
//! through to disk on every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::store::DocumentStore;

fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[derive(Clone)]
pub struct LocalDocStore {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<(String, String), Value>>>,
}

impl LocalDocStore {
    pub fn new<P: AsRef<Path>>(root: P) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| AppError::unavailable(format!("store root: {}", e)))?;
        Ok(Self { root, cache: Arc::new(RwLock::new(HashMap::new())) })
    }

    fn doc_path(&self, collection: &str, key: &str) -> PathBuf {
        self.root
            .join(sanitize_filename(collection))
            .join(format!("{}.json", sanitize_filename(key)))
    }

    fn load(&self, collection: &str, key: &str) -> AppResult<Option<Value>> {
        let ck = (collection.to_string(), key.to_string());
        if let Some(v) = self.cache.read().get(&ck) {
            return Ok(Some(v.clone()));
        }
        let path = self.doc_path(collection, key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| AppError::unavailable(format!("read {}: {}", path.display(), e)))?;
        let val: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::unavailable(format!("parse {}: {}", path.display(), e)))?;
        self.cache.write().insert(ck, val.clone());
        Ok(Some(val))
    }

    fn persist(&self, collection: &str, key: &str, value: &Value) -> AppResult<()> {
        let path = self.doc_path(collection, key);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| AppError::unavailable(format!("mkdir {}: {}", dir.display(), e)))?;
        }
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::unavailable(format!("encode: {}", e)))?;
        std::fs::write(&path, bytes)
            .map_err(|e| AppError::unavailable(format!("write {}: {}", path.display(), e)))?;
        self.cache
            .write()
            .insert((collection.to_string(), key.to_string()), value.clone());
        Ok(())
    }
}

impl DocumentStore for LocalDocStore {
    fn get(&self, collection: &str, key: &str) -> AppResult<Option<Value>> {
        self.load(collection, key)
    }

    fn create(&self, collection: &str, key: &str, value: Value) -> AppResult<()> {
        if self.load(collection, key)?.is_some() {
            return Err(AppError::unavailable(format!(
                "document already exists: {}/{}",
                collection, key
            )));
        }
        self.persist(collection, key, &value)
    }

    fn merge(&self, collection: &str, key: &str, fields: Map<String, Value>) -> AppResult<()> {
        let Some(mut doc) = self.load(collection, key)? else {
            return Err(AppError::NotFound);
        };
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| AppError::unavailable(format!("not an object: {}/{}", collection, key)))?;
        for (k, v) in fields {
            obj.insert(k, v);
        }
        self.persist(collection, key, &doc)
    }

    fn array_union(&self, collection: &str, key: &str, field: &str, value: Value) -> AppResult<()> {
        let Some(mut doc) = self.load(collection, key)? else {
            return Err(AppError::NotFound);
        };
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| AppError::unavailable(format!("not an object: {}/{}", collection, key)))?;
        let arr = obj
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = arr else {
            return Err(AppError::unavailable(format!(
                "field is not an array: {}/{}/{}",
                collection, key, field
            )));
        };
        if !items.contains(&value) {
            items.push(value);
            return self.persist(collection, key, &doc);
        }
        Ok(())
    }
}
