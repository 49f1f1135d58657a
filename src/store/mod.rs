//! Document store abstraction
//!
//! Records live at slash-separated paths (`products/{id}/variants/{vid}`).
//! A path is split into its collection (`products/{id}/variants`) and its
//! document id. The only all-or-nothing operation is [`DocumentStore::commit`].

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self { collection: collection.into(), id: id.into() }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}/{}", self.collection, self.id) }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub data: Value,
}

impl Document {
    pub fn id(&self) -> &str { &self.path.id }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Set { path: DocPath, data: Value },
    Delete { path: DocPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocPath {
        match self { Self::Set { path, .. } | Self::Delete { path } => path }
    }
}

/// Heterogeneous set/delete operations applied in one commit.
///
/// Later operations on the same path win, matching the order they were staged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self { Self::default() }

    pub fn set(&mut self, path: DocPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn ops(&self) -> &[WriteOp] { &self.ops }
    pub fn len(&self) -> usize { self.ops.len() }
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }
    pub fn into_ops(self) -> Vec<WriteOp> { self.ops }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    /// Direct children of a collection, ordered by document id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents of a collection whose top-level `field` equals `value`.
    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>, StoreError>;

    async fn set(&self, path: &DocPath, data: Value) -> Result<(), StoreError>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// Applies every operation of the batch or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Storage layout of the catalog.
pub mod paths {
    use super::DocPath;

    pub const PRODUCTS: &str = "products";
    pub const INVENTORY: &str = "inventory";

    pub fn product(product_id: &str) -> DocPath { DocPath::new(PRODUCTS, product_id) }
    pub fn variants(product_id: &str) -> String { format!("{PRODUCTS}/{product_id}/variants") }
    pub fn variant(product_id: &str, variant_id: &str) -> DocPath { DocPath::new(variants(product_id), variant_id) }
    pub fn skus(product_id: &str) -> String { format!("{PRODUCTS}/{product_id}/skus") }
    pub fn sku(product_id: &str, sku: &str) -> DocPath { DocPath::new(skus(product_id), sku) }
    pub fn inventory(sku: &str) -> DocPath { DocPath::new(INVENTORY, sku) }
}
