//! Variant and product deletion
//!
//! Images go first (best-effort), then the structural records in one batch.
//! Product deletion removes the root record last, so an interrupted run can
//! leave a product pointing at deleted children but never the reverse.

use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, instrument};

use super::assembly::product_price;
use super::inventory::stage_removal;
use super::{Catalog, ProductDeletion, VariantDeletion};
use crate::domain::aggregates::CommittedImage;
use crate::domain::value_objects::Sku;
use crate::media::delete_best_effort;
use crate::store::{paths, WriteBatch};
use crate::{CatalogError, Result};

impl Catalog {
    /// Deletes one variant with its images, SKUs and inventory rows. Removing
    /// the last variant removes the product as well.
    #[instrument(skip(self))]
    pub async fn delete_variant(&self, product_id: &str, variant_id: &str) -> Result<VariantDeletion> {
        let mut product = self.load_product(product_id).await?;
        let mut remaining = self.load_variants(&product).await?;
        let position = remaining
            .iter()
            .position(|v| v.id == variant_id)
            .ok_or_else(|| CatalogError::NotFound(format!("Variant {variant_id} of product {product_id}")))?;
        let target = remaining.remove(position);

        // Images and SKUs a sibling still references stay.
        let shared_images: HashSet<&str> = remaining.iter().flat_map(|v| v.images.iter().map(|i| i.name.as_str())).collect();
        for image in target.images.iter().filter(|i| !shared_images.contains(i.name.as_str())) {
            delete_best_effort(self.images.as_ref(), image).await;
        }
        let shared_skus: HashSet<&Sku> = remaining.iter().flat_map(|v| v.inventory_levels.iter().map(|l| &l.sku)).collect();
        let removed_skus: Vec<Sku> = target
            .inventory_levels
            .iter()
            .map(|l| l.sku.clone())
            .filter(|sku| !shared_skus.contains(sku))
            .collect();

        let mut batch = WriteBatch::new();
        stage_removal(&mut batch, product_id, &removed_skus);
        batch.delete(paths::variant(product_id, variant_id));

        let outcome = if remaining.is_empty() {
            batch.delete(paths::product(product_id));
            VariantDeletion::ProductRemoved {
                product_id: product_id.to_string(),
                variant_id: variant_id.to_string(),
                removed_skus,
            }
        } else {
            if let Some(slug_index) = product.variant_slugs.iter().position(|s| *s == target.slug) {
                product.variant_slugs.remove(slug_index);
            }
            product.price = product_price(&remaining);
            product.updated_at = Utc::now();
            batch.set(paths::product(product_id), serde_json::to_value(&product)?);
            VariantDeletion::VariantRemoved {
                product,
                variant_id: variant_id.to_string(),
                remaining_variants: remaining.len(),
                removed_skus,
            }
        };

        self.store.commit(batch).await.map_err(|e| CatalogError::Write(e.to_string()))?;

        match &outcome {
            VariantDeletion::VariantRemoved { remaining_variants, .. } => {
                info!(product_id, variant_id, remaining_variants, "Deleted variant");
            }
            VariantDeletion::ProductRemoved { .. } => info!(product_id, variant_id, "Deleted last variant and its product"),
        }
        Ok(outcome)
    }

    /// Deletes a product with every variant, SKU, inventory row and image.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: &str) -> Result<ProductDeletion> {
        let product = self.load_product(product_id).await?;
        let variants = self.load_variants(&product).await?;
        let sku_docs = self.store.list(&paths::skus(product_id)).await?;

        let mut images: Vec<&CommittedImage> = Vec::new();
        for image in variants.iter().flat_map(|v| v.images.iter()) {
            if !images.iter().any(|known| known.id == image.id) {
                images.push(image);
            }
        }
        for image in &images {
            delete_best_effort(self.images.as_ref(), image).await;
        }

        let skus: Vec<Sku> = sku_docs
            .iter()
            .filter_map(|doc| Sku::new(doc.id()).ok())
            .chain(variants.iter().flat_map(|v| v.inventory_levels.iter().map(|l| l.sku.clone())))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut batch = WriteBatch::new();
        stage_removal(&mut batch, product_id, &skus);
        for variant in &variants {
            batch.delete(paths::variant(product_id, &variant.id));
        }
        self.store.commit(batch).await.map_err(|e| CatalogError::Write(e.to_string()))?;

        self.store
            .delete(&paths::product(product_id))
            .await
            .map_err(|e| CatalogError::Write(e.to_string()))?;

        info!(product_id, variants = variants.len(), skus = skus.len(), images = images.len(), "Deleted product");
        Ok(ProductDeletion { product_id: product_id.to_string(), variants: variants.len(), skus, images: images.len() })
    }
}
