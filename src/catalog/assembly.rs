//! Product assembly
//!
//! Turns editor input into the product, variant, SKU and inventory records of
//! one product and persists them with a single batch commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::inventory::InventoryBatch;
use super::{Catalog, NewProduct, ProductEdit, SavedProduct};
use crate::domain::aggregates::{
    CommittedImage, InventoryLevelRef, ProductFields, ProductRecord, SkuRecord, VariantInput, VariantRecord,
};
use crate::domain::value_objects::{slugify, Sku};
use crate::media::delete_best_effort;
use crate::store::{paths, WriteBatch};
use crate::{CatalogError, Result};

/// Records built from one submission, not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
    pub product: ProductRecord,
    pub variants: Vec<VariantRecord>,
    pub sku_records: Vec<(Sku, SkuRecord)>,
    pub inventory: InventoryBatch,
}

impl Assembly {
    /// Stages every record, plus deletion of `retired` SKUs, into `batch`.
    pub fn write_into(&self, batch: &mut WriteBatch, retired: &[Sku]) -> Result<()> {
        let product_id = &self.product.id;
        self.inventory.write_into(batch, retired)?;
        batch.set(paths::product(product_id), serde_json::to_value(&self.product)?);
        for variant in &self.variants {
            batch.set(paths::variant(product_id, &variant.id), serde_json::to_value(variant)?);
        }
        for (sku, record) in &self.sku_records {
            batch.set(paths::sku(product_id, sku.as_str()), serde_json::to_value(record)?);
        }
        Ok(())
    }
}

/// Checks a normalized submission before anything is written.
pub fn validate_submission(fields: &ProductFields, variants: &[VariantInput]) -> Result<()> {
    fields.validate()?;
    if fields.sizes.selected().is_empty() {
        return Err(CatalogError::Validation("no sizes selected".into()));
    }
    if variants.is_empty() {
        return Err(CatalogError::Validation("a product needs at least one variant".into()));
    }
    let mut ids = HashSet::new();
    for (index, variant) in variants.iter().enumerate() {
        if variant.color.trim().is_empty() {
            return Err(CatalogError::Validation(format!("variant {} has no color", index + 1)));
        }
        if let Some(id) = &variant.id {
            if !ids.insert(id.as_str()) {
                return Err(CatalogError::Validation(format!("duplicate variant id {id}")));
            }
        }
    }
    Ok(())
}

/// Product price: first variant's actual price, or its current price when the
/// actual price is zero.
pub fn product_price(variants: &[VariantRecord]) -> Decimal {
    variants
        .first()
        .map(|v| if v.actual_price.is_zero() { v.current_price } else { v.actual_price })
        .unwrap_or(Decimal::ZERO)
}

/// Builds the records of a product from normalized fields.
///
/// Variant image references resolve by filename against `images`; references
/// that do not resolve are dropped.
pub fn assemble(
    product_id: &str,
    fields: &ProductFields,
    variants: &[VariantInput],
    images: &[CommittedImage],
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Assembly {
    let sizes = fields.sizes.selected();
    let mut inventory = InventoryBatch::new(product_id);
    let mut records = Vec::with_capacity(variants.len());
    let mut sku_records = Vec::new();
    let mut variant_slugs = Vec::with_capacity(variants.len());

    for input in variants {
        let variant_id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut variant_images = Vec::with_capacity(input.images.len());
        for reference in &input.images {
            match images.iter().find(|image| image.name == reference.name) {
                Some(image) => variant_images.push(image.clone()),
                None => warn!(variant_id = %variant_id, image = %reference.name, "Dropping unresolved image reference"),
            }
        }

        let slug = slugify(&[fields.product_type.as_str(), fields.model.as_str(), input.display_color()]);

        for size in input.inventory.keys().filter(|size| !fields.sizes.is_offered(**size)) {
            debug!(variant_id = %variant_id, size = %size, "Ignoring stock for a size that is not offered");
        }

        let mut inventory_levels = Vec::with_capacity(sizes.len());
        for (order, size) in sizes.iter().enumerate() {
            let sku = Sku::generate(&fields.base_sku, &input.color, *size);
            let stock = input.inventory.get(size).copied().unwrap_or(0);
            inventory.stage(sku.clone(), stock, *size);
            sku_records.push((
                sku.clone(),
                SkuRecord { order: order as u32 + 1, quantity: stock, size: *size, variant_id: variant_id.clone() },
            ));
            inventory_levels.push(InventoryLevelRef { sku });
        }

        variant_slugs.push(slug.clone());
        records.push(VariantRecord {
            id: variant_id,
            color: input.color.clone(),
            color_display: input.color_display.clone().filter(|d| !d.trim().is_empty()),
            current_price: input.current_price,
            actual_price: input.actual_price,
            images: variant_images,
            inventory_levels,
            slug,
        });
    }

    let product = ProductRecord {
        id: product_id.to_string(),
        model: fields.model.clone(),
        product_type: fields.product_type.clone(),
        collection: fields.collection.clone(),
        description: fields.description.clone(),
        specs: fields.specs.clone(),
        tags: fields.tags.clone(),
        price: product_price(&records),
        base_sku: fields.base_sku.clone(),
        slug: slugify(&[fields.product_type.as_str(), fields.model.as_str()]),
        variant_slugs,
        created_at,
        updated_at: now,
    };

    Assembly { product, variants: records, sku_records, inventory }
}

impl Catalog {
    #[instrument(skip(self, request), fields(variants = request.variants.len()))]
    pub async fn create_product(&self, request: NewProduct) -> Result<SavedProduct> {
        let fields = request.fields.normalized();
        validate_submission(&fields, &request.variants)?;

        let product_id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let assembly = assemble(&product_id, &fields, &request.variants, &request.images, now, now);

        let orphaned_images = self.reconcile_images(&request.images, &assembly.variants, &[]).await;

        let mut batch = WriteBatch::new();
        assembly.write_into(&mut batch, &[])?;
        self.store.commit(batch).await.map_err(|e| CatalogError::Write(e.to_string()))?;

        let skus = assembly.inventory.skus();
        info!(product_id = %product_id, slug = %assembly.product.slug, skus = skus.len(), "Created product");
        Ok(SavedProduct {
            product: assembly.product,
            variants: assembly.variants,
            skus,
            retired_skus: Vec::new(),
            orphaned_images,
        })
    }

    #[instrument(skip(self, edit), fields(variants = edit.variants.len()))]
    pub async fn edit_product(&self, product_id: &str, edit: ProductEdit) -> Result<SavedProduct> {
        let fields = edit.fields.normalized();
        validate_submission(&fields, &edit.variants)?;
        let existing = self.load_product(product_id).await?;

        for image in &edit.images_marked_for_removal {
            delete_best_effort(self.images.as_ref(), image).await;
        }

        let assembly = assemble(product_id, &fields, &edit.variants, &edit.images, existing.created_at, Utc::now());

        let orphaned_images = self
            .reconcile_images(&edit.images, &assembly.variants, &edit.images_marked_for_removal)
            .await;

        let stored_skus = self.store.list(&paths::skus(product_id)).await?;
        let prior = edit
            .current_inventory_levels
            .iter()
            .map(|level| level.sku.clone())
            .chain(stored_skus.iter().filter_map(|doc| Sku::new(doc.id()).ok()));
        let retired_skus = assembly.inventory.retired(prior);

        let mut batch = WriteBatch::new();
        assembly.write_into(&mut batch, &retired_skus)?;
        for doc in self.store.list(&paths::variants(product_id)).await? {
            if !assembly.variants.iter().any(|v| v.id == doc.id()) {
                debug!(variant_id = %doc.id(), "Removing variant dropped from the product");
                batch.delete(doc.path);
            }
        }
        self.store.commit(batch).await.map_err(|e| CatalogError::Write(e.to_string()))?;

        let skus = assembly.inventory.skus();
        info!(product_id = %product_id, skus = skus.len(), retired = retired_skus.len(), "Updated product");
        Ok(SavedProduct {
            product: assembly.product,
            variants: assembly.variants,
            skus,
            retired_skus,
            orphaned_images,
        })
    }
}
