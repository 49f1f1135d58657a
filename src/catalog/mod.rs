//! Catalog workflows
//!
//! Each entry point runs to completion on behalf of one admin action. There is
//! no locking between concurrent edits of the same product; the last commit
//! wins.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::aggregates::{CommittedImage, InventoryLevel, ProductFields, ProductRecord, VariantInput, VariantRecord};
use crate::domain::events::CatalogEvent;
use crate::domain::value_objects::Sku;
use crate::media::ImageStore;
use crate::store::{paths, DocumentStore};
use crate::{CatalogError, Result};

pub mod assembly;
pub mod delete;
pub mod fetch;
pub mod inventory;
pub mod reconcile;

/// Catalog service over a document store and an image host.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    images: Arc<dyn ImageStore>,
}

/// Create request. Pending images must already be uploaded; `images` holds the
/// committed set variants refer to by filename.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub fields: ProductFields,
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub images: Vec<CommittedImage>,
}

/// Edit request: full replacement of the product and its variants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEdit {
    pub fields: ProductFields,
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub images: Vec<CommittedImage>,
    /// Inventory snapshot the editor was opened with.
    #[serde(default)]
    pub current_inventory_levels: Vec<InventoryLevel>,
    #[serde(default)]
    pub images_marked_for_removal: Vec<CommittedImage>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProduct {
    pub product: ProductRecord,
    pub variants: Vec<VariantRecord>,
    pub skus: Vec<Sku>,
    /// SKUs deleted because their variant or size is gone. Empty on create.
    pub retired_skus: Vec<Sku>,
    /// Committed images no variant referenced; deletion was attempted.
    pub orphaned_images: Vec<CommittedImage>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VariantDeletion {
    VariantRemoved { product: ProductRecord, variant_id: String, remaining_variants: usize, removed_skus: Vec<Sku> },
    /// The deleted variant was the last one, so the product went with it.
    ProductRemoved { product_id: String, variant_id: String, removed_skus: Vec<Sku> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDeletion {
    pub product_id: String,
    pub variants: usize,
    pub skus: Vec<Sku>,
    pub images: usize,
}

impl SavedProduct {
    pub fn created_event(&self) -> CatalogEvent {
        CatalogEvent::ProductCreated { product_id: self.product.id.clone(), skus: self.skus.clone() }
    }

    pub fn updated_event(&self) -> CatalogEvent {
        CatalogEvent::ProductUpdated {
            product_id: self.product.id.clone(),
            skus: self.skus.clone(),
            retired_skus: self.retired_skus.clone(),
        }
    }
}

impl From<&VariantDeletion> for CatalogEvent {
    fn from(outcome: &VariantDeletion) -> Self {
        match outcome {
            VariantDeletion::VariantRemoved { product, variant_id, .. } => {
                CatalogEvent::VariantRemoved { product_id: product.id.clone(), variant_id: variant_id.clone() }
            }
            VariantDeletion::ProductRemoved { product_id, .. } => CatalogEvent::ProductRemoved { product_id: product_id.clone() },
        }
    }
}

impl From<&ProductDeletion> for CatalogEvent {
    fn from(deletion: &ProductDeletion) -> Self { CatalogEvent::ProductRemoved { product_id: deletion.product_id.clone() } }
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>, images: Arc<dyn ImageStore>) -> Self { Self { store, images } }

    pub fn store(&self) -> &Arc<dyn DocumentStore> { &self.store }
    pub fn images(&self) -> &Arc<dyn ImageStore> { &self.images }

    async fn load_product(&self, product_id: &str) -> Result<ProductRecord> {
        let data = self
            .store
            .get(&paths::product(product_id))
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Product {product_id}")))?;
        Ok(serde_json::from_value(data)?)
    }

    /// Variant records in the order of the product's `variant_slugs`; records
    /// whose slug is not listed come last.
    async fn load_variants(&self, product: &ProductRecord) -> Result<Vec<VariantRecord>> {
        let mut variants = Vec::new();
        for doc in self.store.list(&paths::variants(&product.id)).await? {
            let mut variant: VariantRecord = serde_json::from_value(doc.data)?;
            variant.id = doc.path.id;
            variants.push(variant);
        }
        let position = |v: &VariantRecord| product.variant_slugs.iter().position(|s| *s == v.slug).unwrap_or(usize::MAX);
        variants.sort_by_key(position);
        Ok(variants)
    }
}
