//! Product Aggregate
//!
//! Editor input (`ProductFields`, `VariantInput`) on one side, stored records
//! (`ProductRecord`, `VariantRecord`, `SkuRecord`, `InventoryRecord`) on the
//! other, and the reconstituted editable shape (`ProductAggregate`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::image::{CommittedImage, ImageRef};
use crate::domain::value_objects::{normalize_text, SizeLabel, SizeSelection, Sku};

/// Free-text specification fields shown on the product page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSpecs {
    pub display: String,
    pub chip: String,
    pub camera: String,
    pub ram: String,
    pub truecamera: String,
    pub faceid: String,
    pub battery: String,
    pub weight: String,
    pub touchid: String,
}

/// Product-level fields submitted by the editor.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    #[validate(length(min = 1, message = "model is required"))]
    pub model: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub product_type: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: ProductSpecs,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(alias = "sku")]
    #[validate(length(min = 1, max = 20, message = "base SKU must be 1-20 characters"))]
    pub base_sku: String,
    pub sizes: SizeSelection,
}

impl ProductFields {
    /// Collapses and lowercases the free-text fields, cleans tags and trims the
    /// base SKU.
    pub fn normalized(&self) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.iter().map(|t| normalize_text(t)).filter(|t| !t.is_empty()) {
            if !tags.contains(&tag) { tags.push(tag); }
        }
        Self {
            model: normalize_text(&self.model),
            product_type: normalize_text(&self.product_type),
            collection: self.collection.trim().to_string(),
            description: normalize_text(&self.description),
            specs: self.specs.clone(),
            tags,
            base_sku: self.base_sku.trim().to_string(),
            sizes: self.sizes.clone(),
        }
    }
}

/// One color of a product as submitted by the editor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(default)]
    pub id: Option<String>,
    pub color: String,
    #[serde(default)]
    pub color_display: Option<String>,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub actual_price: Decimal,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    /// Raw stock per size; sizes outside the product selection are ignored.
    #[serde(default)]
    pub inventory: BTreeMap<SizeLabel, u32>,
}

impl VariantInput {
    /// Display color when present and non-empty, otherwise the color.
    pub fn display_color(&self) -> &str {
        match self.color_display.as_deref() {
            Some(display) if !display.trim().is_empty() => display,
            _ => &self.color,
        }
    }
}

/// Stored at `products/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub model: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub collection: String,
    pub description: String,
    #[serde(default)]
    pub specs: ProductSpecs,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: Decimal,
    /// Base the SKUs were generated from. It may itself contain hyphens, so it
    /// is kept here rather than recovered from a SKU.
    #[serde(default)]
    pub base_sku: String,
    pub slug: String,
    pub variant_slugs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SKU reference held by a variant. Stock lives in the inventory record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevelRef { pub sku: Sku }

/// Stored at `products/{id}/variants/{variantId}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    pub id: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_display: Option<String>,
    pub current_price: Decimal,
    pub actual_price: Decimal,
    pub images: Vec<CommittedImage>,
    pub inventory_levels: Vec<InventoryLevelRef>,
    pub slug: String,
}

/// Stored at `products/{id}/skus/{sku}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuRecord {
    pub order: u32,
    pub quantity: u32,
    pub size: SizeLabel,
    pub variant_id: String,
}

/// Stored at `inventory/{sku}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub product_id: String,
    pub stock: u32,
    /// Size label this SKU stands for.
    pub value: SizeLabel,
}

/// Inventory row joined with its SKU, as handed back to the editor and
/// returned by it on edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevel {
    pub sku: Sku,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub stock: u32,
    pub value: Option<SizeLabel>,
}

/// Variant as reconstituted for editing: SKU references replaced by stock per size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
    pub id: String,
    pub color: String,
    pub color_display: Option<String>,
    pub current_price: Decimal,
    pub actual_price: Decimal,
    pub images: Vec<CommittedImage>,
    pub slug: String,
    pub inventory: BTreeMap<SizeLabel, u32>,
}

impl VariantView {
    /// Editor input that resubmits this variant unchanged.
    pub fn to_input(&self) -> VariantInput {
        VariantInput {
            id: Some(self.id.clone()),
            color: self.color.clone(),
            color_display: self.color_display.clone(),
            current_price: self.current_price,
            actual_price: self.actual_price,
            images: self.images.iter().map(ImageRef::from).collect(),
            inventory: self.inventory.clone(),
        }
    }
}

/// Everything the editor needs to show and resubmit a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAggregate {
    pub product: ProductRecord,
    pub variants: Vec<VariantView>,
    pub images: Vec<CommittedImage>,
    pub sizes_input: SizeSelection,
    pub sizes: Vec<SizeLabel>,
    pub current_inventory_levels: Vec<InventoryLevel>,
    pub base_sku: Option<String>,
}

impl ProductAggregate {
    /// Editor fields that resubmit this product unchanged.
    pub fn to_fields(&self) -> ProductFields {
        ProductFields {
            model: self.product.model.clone(),
            product_type: self.product.product_type.clone(),
            collection: self.product.collection.clone(),
            description: self.product.description.clone(),
            specs: self.product.specs.clone(),
            tags: self.product.tags.clone(),
            base_sku: self.base_sku.clone().unwrap_or_default(),
            sizes: self.sizes_input.clone(),
        }
    }
}
