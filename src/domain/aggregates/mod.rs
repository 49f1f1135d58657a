//! Aggregates module
pub mod image;
pub mod product;

pub use image::{CommittedImage, ImageRef, PendingImage};
pub use product::{
    InventoryLevel, InventoryLevelRef, InventoryRecord, ProductAggregate, ProductFields, ProductRecord,
    ProductSpecs, SkuRecord, VariantInput, VariantRecord, VariantView,
};
