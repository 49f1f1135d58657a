//! Domain events
use crate::domain::value_objects::Sku;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CatalogEvent {
    ProductCreated { product_id: String, skus: Vec<Sku> },
    ProductUpdated { product_id: String, skus: Vec<Sku>, retired_skus: Vec<Sku> },
    VariantRemoved { product_id: String, variant_id: String },
    ProductRemoved { product_id: String },
}

impl CatalogEvent {
    /// Subject suffix used when publishing, e.g. `catalog.product_created`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProductCreated { .. } => "product_created",
            Self::ProductUpdated { .. } => "product_updated",
            Self::VariantRemoved { .. } => "variant_removed",
            Self::ProductRemoved { .. } => "product_removed",
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            Self::ProductCreated { product_id, .. }
            | Self::ProductUpdated { product_id, .. }
            | Self::VariantRemoved { product_id, .. }
            | Self::ProductRemoved { product_id } => product_id,
        }
    }
}
