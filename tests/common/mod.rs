//! Helpers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use storefront_catalog::catalog::NewProduct;
use storefront_catalog::media::InMemoryImageStore;
use storefront_catalog::store::{DocPath, Document, DocumentStore, InMemoryDocumentStore, StoreError, WriteBatch};
use storefront_catalog::{Catalog, CommittedImage, ImageRef, ProductFields, SizeLabel, SizeSelection, VariantInput};

/// Catalog over in-memory backends, keeping handles for assertions.
pub struct TestCatalog {
    pub catalog: Catalog,
    pub store: Arc<InMemoryDocumentStore>,
    pub images: Arc<InMemoryImageStore>,
}

impl TestCatalog {
    pub fn new() -> Self { Self::with_images(InMemoryImageStore::new()) }

    pub fn with_images(images: InMemoryImageStore) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let images = Arc::new(images);
        let catalog = Catalog::new(store.clone(), images.clone());
        Self { catalog, store, images }
    }

    pub async fn doc(&self, collection: &str, id: &str) -> Option<Value> {
        self.store.get(&DocPath::new(collection, id)).await.unwrap()
    }
}

/// Document store whose batch commits always fail and write nothing.
#[derive(Default)]
pub struct FailingCommitStore {
    pub inner: InMemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for FailingCommitStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> { self.inner.get(path).await }
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> { self.inner.list(collection).await }
    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>, StoreError> {
        self.inner.find_by_field(collection, field, value).await
    }
    async fn set(&self, path: &DocPath, data: Value) -> Result<(), StoreError> { self.inner.set(path, data).await }
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> { self.inner.delete(path).await }
    async fn commit(&self, _batch: WriteBatch) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("commit rejected".into()))
    }
}

pub fn fields(sizes: &[SizeLabel]) -> ProductFields {
    ProductFields {
        model: "Phone X".into(),
        product_type: "Smartphone".into(),
        base_sku: "PHX".into(),
        sizes: SizeSelection::from_selected(sizes.iter().copied()),
        ..Default::default()
    }
}

pub fn variant(id: &str, color: &str, stock: &[(SizeLabel, u32)], images: &[&str]) -> VariantInput {
    VariantInput {
        id: Some(id.into()),
        color: color.into(),
        color_display: None,
        current_price: Decimal::new(1200, 0),
        actual_price: Decimal::new(999, 0),
        images: images.iter().map(|name| ImageRef { name: name.to_string() }).collect(),
        inventory: stock.iter().copied().collect::<BTreeMap<_, _>>(),
    }
}

pub fn image(name: &str) -> CommittedImage {
    CommittedImage { id: format!("product-images/{name}"), name: name.into(), url: format!("https://img.test/{name}") }
}

/// Phone X in 128GB and 256GB, one Space Gray variant with one image.
pub fn phone() -> NewProduct {
    NewProduct {
        fields: fields(&[SizeLabel::Gb128, SizeLabel::Gb256]),
        variants: vec![variant("v-gray", "Space Gray", &[(SizeLabel::Gb128, 5), (SizeLabel::Gb256, 2)], &["front.png"])],
        images: vec![image("front.png")],
    }
}
