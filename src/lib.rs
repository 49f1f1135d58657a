//! Storefront Catalog
//!
//! Admin-side catalog workflows for a storefront.
//!
//! ## Features
//! - Product create / edit with generated SKUs and per-SKU inventory
//! - Product fetch for the editor (stock per size rebuilt from inventory)
//! - Variant and product deletion with image cleanup
//! - Image hosting adapter (Cloudinary, in-memory)
//! - Document store backends (Postgres JSONB, in-memory)
//! - Bank-redirect payment URL signing and callback verification

use thiserror::Error;

pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod media;
pub mod payments;
pub mod store;

pub use catalog::{Catalog, ProductDeletion, SavedProduct, VariantDeletion};
pub use domain::aggregates::{
    CommittedImage, ImageRef, InventoryLevel, PendingImage, ProductAggregate, ProductFields, ProductRecord,
    VariantInput,
};
pub use domain::events::CatalogEvent;
pub use domain::value_objects::{SizeLabel, SizeSelection, Sku};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Storage error: {0}")]
    Storage(#[from] store::StoreError),

    #[error("Malformed record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CatalogError::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
