//! Document store: sled-backed whole-document storage at fixed paths.
//!
//! Documents are JSON objects keyed by a slash-separated path
//! (`artifacts/<app_id>/public/data/<collection>/<doc>`). Writes are either a
//! whole-document overwrite or a shallow merge; there are no field-level
//! transactions and the last writer wins.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

const DEFAULT_DATA_PATH: &str = "./data/sensi_documents";

/// Fixed document paths for one deployment (`app_id`).
#[derive(Debug, Clone)]
pub struct DocumentPaths {
    app_id: String,
}

impl DocumentPaths {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }

    fn public(&self, collection: &str, doc: &str) -> String {
        format!("artifacts/{}/public/data/{}/{}", self.app_id, collection, doc)
    }

    pub fn presets(&self) -> String {
        self.public("sensitivityPresets", "allPresets")
    }

    pub fn game_data(&self) -> String {
        self.public("gameData", "main")
    }

    pub fn usage(&self) -> String {
        self.public("analytics", "usage")
    }
}

/// Embedded document database.
#[derive(Clone)]
pub struct DocumentStore {
    db: sled::Db,
}

impl DocumentStore {
    /// Open the store at the given path (or `./data/sensi_documents`).
    pub fn open(path: Option<impl AsRef<Path>>) -> Result<Self, StoreError> {
        let p = path
            .map(|x| x.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new(DEFAULT_DATA_PATH).to_path_buf());
        let db = sled::open(p)?;
        Ok(Self { db })
    }

    /// Raw JSON of a document, `None` when it does not exist.
    pub fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        match self.db.get(path.as_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Typed read.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        match self.get(path)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Whole-document overwrite.
    pub fn set<T: Serialize>(&self, path: &str, doc: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)?;
        if !value.is_object() {
            return Err(StoreError::NotAnObject(path.to_string()));
        }
        self.db.insert(path.as_bytes(), serde_json::to_vec(&value)?)?;
        Ok(())
    }

    /// Shallow merge: top-level keys of `fields` replace the stored ones, others are kept.
    pub fn merge(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut current = match self.get(path)? {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(StoreError::NotAnObject(path.to_string())),
            None => Map::new(),
        };
        current.extend(fields);
        self.db
            .insert(path.as_bytes(), serde_json::to_vec(&Value::Object(current))?)?;
        Ok(())
    }

    /// Atomically add one to an integer field, creating the document if needed.
    /// `stamp_field` is set to the current UTC time on every increment.
    /// A stored document that does not decode is left untouched and reported.
    pub fn increment(&self, path: &str, field: &str, stamp_field: &str) -> Result<i64, StoreError> {
        let mut count = 0;
        let mut failure: Option<serde_json::Error> = None;
        self.db.update_and_fetch(path.as_bytes(), |old| {
            failure = None;
            let mut doc = match old.map(serde_json::from_slice::<Map<String, Value>>) {
                Some(Ok(doc)) => doc,
                Some(Err(e)) => {
                    failure = Some(e);
                    return old.map(<[u8]>::to_vec);
                }
                None => Map::new(),
            };
            count = doc.get(field).and_then(Value::as_i64).unwrap_or(0) + 1;
            doc.insert(field.to_string(), Value::from(count));
            doc.insert(
                stamp_field.to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
            match serde_json::to_vec(&Value::Object(doc)) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    failure = Some(e);
                    old.map(<[u8]>::to_vec)
                }
            }
        })?;
        if let Some(source) = failure {
            tracing::warn!("[SENSI DOCUMENTS] {} not incremented: {}", path, source);
            return Err(StoreError::Decode {
                path: path.to_string(),
                source,
            });
        }
        Ok(count)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
