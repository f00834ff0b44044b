//! Record store clients
//!
//! [`RecordStore`] is the only capability the pipeline needs from the document store:
//! fetch one record by id. Two implementations:
//!
//! - [`FirebaseStore`] talks to the Firebase Realtime Database REST API
//! - [`MemoryStore`] serves fixtures from memory (tests, offline demos)

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::record::Record;

/// Read-only access to tree records.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the stored document for `id`.
    ///
    /// Returns [`Error::NotFound`] when nothing is stored under the id and
    /// [`Error::StoreUnavailable`] for transport, auth or decoding failures.
    async fn fetch(&self, id: &str) -> Result<Record>;
}

/// Firebase Realtime Database over REST
#[derive(Clone)]
pub struct FirebaseStore {
    http: Client,
    config: StoreConfig,
}

impl FirebaseStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// REST location of a record, without credentials
    pub fn document_url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.config.database_url.trim_end_matches('/'),
            self.config.collection.trim_matches('/'),
            urlencoding::encode(id)
        )
    }
}

#[async_trait]
impl RecordStore for FirebaseStore {
    async fn fetch(&self, id: &str) -> Result<Record> {
        let url = self.document_url(id);
        debug!(%url, "GET record");

        // The token rides in the query string; keep it out of logs and errors
        let request_url = match &self.config.auth_token {
            Some(token) => format!("{}?auth={}", url, urlencoding::encode(token)),
            None => url,
        };

        let resp = self.http.get(&request_url).send().await.map_err(|e| {
            let e = e.without_url();
            warn!(id, error = %e, "Record store request failed");
            Error::StoreUnavailable(e.to_string())
        })?;

        match resp.status() {
            status if status.is_success() => {}
            // Firebase rejects ids that are not legal keys; nothing can live there
            StatusCode::BAD_REQUEST => return Err(Error::NotFound(id.to_string())),
            status => {
                warn!(id, %status, "Record store returned error status");
                return Err(Error::StoreUnavailable(format!("status {}", status)));
            }
        }

        // A missing child comes back as a literal `null`
        let document: Option<Record> = resp.json().await.map_err(|e| {
            let e = e.without_url();
            warn!(id, error = %e, "Failed to decode record");
            Error::StoreUnavailable(format!("invalid record document: {}", e))
        })?;

        document.ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

/// In-memory record store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, id: impl Into<String>, record: Record) -> Self {
        self.insert(id, record);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, record: Record) {
        self.records.insert(id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Build from a database export.
    ///
    /// Accepts either the whole export (`{"trees": {"<id>": {...}}}`) or just the
    /// collection (`{"<id>": {...}}`).
    pub fn from_value(mut value: Value, collection: &str) -> Result<Self> {
        let is_export = value.get(collection).is_some_and(Value::is_object);
        let trees = if is_export {
            value[collection].take()
        } else {
            value
        };
        let records: HashMap<String, Record> = serde_json::from_value(trees)
            .map_err(|e| Error::Config(format!("invalid fixture export: {}", e)))?;
        Ok(Self { records })
    }

    pub fn from_json_file(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid JSON in {}: {}", path.display(), e)))?;
        Self::from_value(value, collection)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, id: &str) -> Result<Record> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_url_joins_segments() {
        let store = FirebaseStore::new(StoreConfig {
            database_url: "https://example.firebaseio.com/".into(),
            ..StoreConfig::default()
        })
        .unwrap();

        assert_eq!(
            store.document_url("tree-42"),
            "https://example.firebaseio.com/trees/tree-42.json"
        );
    }

    #[test]
    fn test_document_url_keeps_id_in_one_segment() {
        let store = FirebaseStore::new(StoreConfig::default()).unwrap();
        let url = store.document_url("a/b c");
        assert!(url.ends_with("/trees/a%2Fb%20c.json"), "{url}");
    }

    #[tokio::test]
    async fn test_memory_store_fetch() {
        let store = MemoryStore::new().with_record(
            "tree-1",
            Record {
                name: "Oak".into(),
                ..Record::default()
            },
        );

        let record = store.fetch("tree-1").await.unwrap();
        assert_eq!(record.name, "Oak");

        let err = store.fetch("tree-2").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == "tree-2"));
    }

    #[test]
    fn test_memory_store_from_full_export() {
        let export = json!({
            "trees": {
                "t1": { "Name": "Oak" },
                "t2": { "Name": "Pine", "images": [] }
            },
            "users": {}
        });

        let store = MemoryStore::from_value(export, "trees").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_memory_store_from_collection_only() {
        let store = MemoryStore::from_value(json!({ "t1": { "Name": "Oak" } }), "trees").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_rejects_malformed_export() {
        let err = MemoryStore::from_value(json!({ "t1": "not a record" }), "trees").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
