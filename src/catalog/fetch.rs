//! Product fetch
//!
//! Rebuilds the editable product from the three stored record families:
//! product, variants and the global inventory rows filtered by product id.

use serde_json::json;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

use super::inventory::index_by_sku;
use super::Catalog;
use crate::domain::aggregates::{CommittedImage, InventoryLevel, InventoryRecord, ProductAggregate, VariantView};
use crate::domain::value_objects::{SizeLabel, SizeSelection};
use crate::store::paths;
use crate::Result;

impl Catalog {
    #[instrument(skip(self))]
    pub async fn fetch_product(&self, product_id: &str) -> Result<ProductAggregate> {
        let product = self.load_product(product_id).await?;
        let variants = self.load_variants(&product).await?;

        let mut rows = Vec::new();
        for doc in self.store.find_by_field(paths::INVENTORY, "productId", &json!(product_id)).await? {
            let record: InventoryRecord = serde_json::from_value(doc.data)?;
            rows.push((doc.path.id, record));
        }
        let inventory = index_by_sku(rows);

        let mut views = Vec::with_capacity(variants.len());
        let mut levels = Vec::new();
        let mut images: Vec<CommittedImage> = Vec::new();

        for variant in variants {
            let mut stock_by_size = BTreeMap::new();
            for level in &variant.inventory_levels {
                let Some(row) = inventory.get(level.sku.as_str()) else {
                    warn!(sku = %level.sku, variant_id = %variant.id, "Variant refers to a SKU with no inventory row");
                    continue;
                };
                stock_by_size.insert(row.value, row.stock);
                levels.push(InventoryLevel {
                    sku: level.sku.clone(),
                    product_id: row.product_id.clone(),
                    stock: row.stock,
                    value: Some(row.value),
                });
            }

            for image in &variant.images {
                if !images.iter().any(|known| known.name == image.name) {
                    images.push(image.clone());
                }
            }

            views.push(VariantView {
                id: variant.id,
                color: variant.color,
                color_display: variant.color_display,
                current_price: variant.current_price,
                actual_price: variant.actual_price,
                images: variant.images,
                slug: variant.slug,
                inventory: stock_by_size,
            });
        }

        // The first variant defines the size set; all variants are generated
        // from one product-level selection.
        let sizes: Vec<SizeLabel> = views.first().map(|v| v.inventory.keys().copied().collect()).unwrap_or_default();
        for view in views.iter().skip(1) {
            if !view.inventory.keys().copied().eq(sizes.iter().copied()) {
                warn!(product_id = %product_id, variant_id = %view.id, "Variant sizes differ from the first variant");
            }
        }

        // Records written before the base was stored fall back to the SKU prefix.
        let base_sku = Some(product.base_sku.clone())
            .filter(|base| !base.is_empty())
            .or_else(|| levels.first().map(|level| level.sku.base().to_string()));

        Ok(ProductAggregate {
            product,
            variants: views,
            images,
            sizes_input: SizeSelection::from_selected(sizes.iter().copied()),
            sizes,
            current_inventory_levels: levels,
            base_sku,
        })
    }
}
