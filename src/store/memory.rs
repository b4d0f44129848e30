// src/store/memory.rs

use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tracing::trace;

use crate::errors::{DagError, Result};

use super::DataStore;

/// In-memory document store backed by a single JSON object.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    document: Mutex<Map<String, Value>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the whole document.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.lock().clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Walk to the slot addressed by `key`, creating intermediate objects.
    fn slot_mut<'a>(doc: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Value> {
        let parts = split_key(key)?;
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| store_error(key, "empty key"))?;

        let mut current = doc;
        for part in parents {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => return Err(store_error(key, &format!("'{part}' is not an object"))),
            };
        }

        Ok(current.entry(last.to_string()).or_insert(Value::Null))
    }

    fn append(&self, key: &str, values: Vec<Value>) -> Result<()> {
        let mut doc = self.lock();
        let slot = Self::slot_mut(&mut doc, key)?;
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => {
                items.extend(values);
                Ok(())
            }
            _ => Err(store_error(key, "value is not a sequence")),
        }
    }
}

impl DataStore for MemoryDataStore {
    fn get(&self, key: &str) -> Option<Value> {
        let parts = split_key(key).ok()?;
        let doc = self.lock();
        let (first, rest) = parts.split_first()?;
        let mut current = doc.get(*first)?;
        for part in rest {
            current = current.as_object()?.get(*part)?;
        }
        Some(current.clone())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        trace!(key, "data store set");
        let mut doc = self.lock();
        *Self::slot_mut(&mut doc, key)? = value;
        Ok(())
    }

    fn push(&self, key: &str, value: Value) -> Result<()> {
        trace!(key, "data store push");
        self.append(key, vec![value])
    }

    fn extend(&self, key: &str, values: Vec<Value>) -> Result<()> {
        trace!(key, count = values.len(), "data store extend");
        self.append(key, values)
    }
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(store_error(key, "key contains an empty path segment"));
    }
    Ok(parts)
}

fn store_error(key: &str, reason: &str) -> DagError {
    DagError::DataStore {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
