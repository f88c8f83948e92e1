//! A small JSON document store with live subscriptions.
//!
//! Documents live at slash-separated paths that alternate collection and
//! document ids (`artifacts/{app}/public/data/plants/{user}`). Writes either
//! replace a document or merge into it, and every write is broadcast to
//! subscribers of that path.
//!
//! Persistence goes through [`Database`]; change notification is an in-process
//! `tokio::sync::broadcast` channel, so subscribers only see writes made
//! through the same `DocumentStore` (or its clones).

mod path;
mod plants;

pub use path::DocPath;
pub use plants::*;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::db::Database;
use crate::error::ValidationError;

const CHANNEL_CAPACITY: usize = 256;

/// A write observed by subscribers. `data` is `None` after a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub path: String,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge into the existing document instead of replacing it.
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

impl Default for SetOptions {
    fn default() -> Self {
        Self::merge()
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    db: Database,
    changes: broadcast::Sender<DocumentChange>,
    /// Held from commit through publish so subscribers see writes in commit order.
    writes: Arc<Mutex<()>>,
}

impl DocumentStore {
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            db,
            changes,
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        self.db.get_document(path.as_str())
    }

    /// Write `data` at `path` and notify subscribers.
    ///
    /// `data` must be a JSON object. With `merge`, nested objects are merged
    /// key by key and every other value (arrays and `null` included) replaces
    /// what was there. Returns the stored document.
    pub fn set(&self, path: &DocPath, data: Value, options: SetOptions) -> Result<Value> {
        if !data.is_object() {
            return Err(ValidationError::invalid("document data must be a JSON object").into());
        }

        let _guard = self.write_guard();
        let stored = self
            .db
            .write_document(path.as_str(), path.collection(), |current| {
                Ok(match current {
                    Some(mut existing) if options.merge => {
                        merge_into(&mut existing, data);
                        existing
                    }
                    _ => data,
                })
            })?;

        tracing::debug!("Wrote document {} (merge: {})", path, options.merge);
        self.publish(path, Some(stored.clone()));
        Ok(stored)
    }

    pub fn delete(&self, path: &DocPath) -> Result<bool> {
        let _guard = self.write_guard();
        let deleted = self.db.delete_document(path.as_str())?;
        if deleted {
            self.publish(path, None);
        }
        Ok(deleted)
    }

    /// Documents directly inside `collection`, as `(document id, data)` pairs.
    pub fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let docs = self.db.list_documents(collection)?;
        Ok(docs
            .into_iter()
            .map(|(path, data)| {
                let id = path.rsplit('/').next().unwrap_or_default().to_string();
                (id, data)
            })
            .collect())
    }

    /// Watch one document.
    ///
    /// The subscription yields the current snapshot first, then every later
    /// write to `path`.
    pub fn subscribe(&self, path: &DocPath) -> Result<DocumentSubscription> {
        // No write can land between subscribing and the initial read.
        let _guard = self.write_guard();
        let changes = self.changes.subscribe();
        let initial = self.get(path)?;
        Ok(DocumentSubscription {
            path: path.clone(),
            db: self.db.clone(),
            pending: Some(initial),
            changes,
        })
    }

    fn publish(&self, path: &DocPath, data: Option<Value>) {
        // No receivers is fine; nobody is watching.
        let _ = self.changes.send(DocumentChange {
            path: path.as_str().to_string(),
            data,
        });
    }
}

/// Live view of a single document. See [`DocumentStore::subscribe`].
pub struct DocumentSubscription {
    path: DocPath,
    db: Database,
    pending: Option<Option<Value>>,
    changes: broadcast::Receiver<DocumentChange>,
}

impl DocumentSubscription {
    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Next snapshot of the document (`Some(None)` when it does not exist).
    ///
    /// Returns `None` once every [`DocumentStore`] handle has been dropped.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot);
        }

        loop {
            match self.changes.recv().await {
                Ok(change) if change.path == self.path.as_str() => return Some(change.data),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        "Subscription to {} lagged by {} changes, re-reading",
                        self.path,
                        missed
                    );
                    match self.db.get_document(self.path.as_str()) {
                        Ok(snapshot) => return Some(snapshot),
                        Err(e) => {
                            tracing::error!("Error re-reading {}: {:#}", self.path, e);
                            continue;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Recursively merge `patch` into `target`.
pub fn merge_into(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_into(existing, value)
                    }
                    _ => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_scalars_and_keeps_untouched_keys() {
        let mut doc = json!({"name": "Fern", "health": 80, "species": "Boston"});
        merge_into(&mut doc, json!({"health": 90}));
        assert_eq!(doc, json!({"name": "Fern", "health": 90, "species": "Boston"}));
    }

    #[test]
    fn merge_recurses_into_nested_objects() {
        let mut doc = json!({"care": {"water": 1, "light": "low"}});
        merge_into(&mut doc, json!({"care": {"water": 2}}));
        assert_eq!(doc, json!({"care": {"water": 2, "light": "low"}}));
    }

    #[test]
    fn merge_replaces_arrays_and_accepts_null() {
        let mut doc = json!({"tags": [1, 2, 3], "note": "hi"});
        merge_into(&mut doc, json!({"tags": [4], "note": null}));
        assert_eq!(doc, json!({"tags": [4], "note": null}));
    }

    #[test]
    fn set_rejects_non_objects() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let store = DocumentStore::new(db);
        let path = DocPath::new("plants/u1").unwrap();

        let err = store.set(&path, json!([1, 2]), SetOptions::merge()).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }
}
