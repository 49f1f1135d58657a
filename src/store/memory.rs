//! In-process document store used for development and tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{DocPath, Document, DocumentStore, StoreError, WriteBatch, WriteOp};

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<BTreeMap<DocPath, Value>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self { Self::default() }

    /// Number of documents across all collections.
    pub async fn len(&self) -> usize { self.docs.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.docs.read().await.is_empty() }

    pub async fn contains(&self, path: &DocPath) -> bool { self.docs.read().await.contains_key(path) }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|(path, _)| path.collection == collection)
            .map(|(path, data)| Document { path: path.clone(), data: data.clone() })
            .collect())
    }

    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .list(collection)
            .await?
            .into_iter()
            .filter(|doc| doc.data.get(field) == Some(value))
            .collect())
    }

    async fn set(&self, path: &DocPath, data: Value) -> Result<(), StoreError> {
        self.docs.write().await.insert(path.clone(), data);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.docs.write().await.remove(path);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        // One write guard for the whole batch, so readers never see half of it.
        let mut docs = self.docs.write().await;
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { path, data } => { docs.insert(path, data); }
                WriteOp::Delete { path } => { docs.remove(&path); }
            }
        }
        Ok(())
    }
}
