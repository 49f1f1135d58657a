//! Image reconciliation
//!
//! After a save, committed images that no variant references are removed
//! from the image host.

use std::collections::HashSet;
use tracing::info;

use super::Catalog;
use crate::domain::aggregates::{CommittedImage, VariantRecord};
use crate::media::delete_best_effort;

/// Images from `images` whose filename no variant references.
pub fn unreferenced_images<'a>(images: &'a [CommittedImage], variants: &[VariantRecord]) -> Vec<&'a CommittedImage> {
    let in_use: HashSet<&str> = variants.iter().flat_map(|v| v.images.iter().map(|i| i.name.as_str())).collect();
    images.iter().filter(|image| !in_use.contains(image.name.as_str())).collect()
}

impl Catalog {
    /// Deletes unreferenced images, skipping any in `already_deleted`, and
    /// returns the images it tried to delete.
    pub(crate) async fn reconcile_images(
        &self,
        images: &[CommittedImage],
        variants: &[VariantRecord],
        already_deleted: &[CommittedImage],
    ) -> Vec<CommittedImage> {
        let orphans: Vec<CommittedImage> = unreferenced_images(images, variants)
            .into_iter()
            .filter(|image| !already_deleted.iter().any(|d| d.id == image.id))
            .cloned()
            .collect();
        if !orphans.is_empty() {
            info!(count = orphans.len(), "Deleting images no variant uses");
        }
        for image in &orphans {
            delete_best_effort(self.images.as_ref(), image).await;
        }
        orphans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn image(name: &str) -> CommittedImage {
        CommittedImage { id: format!("id-{name}"), name: name.into(), url: String::new() }
    }

    fn variant_with(images: &[&str]) -> VariantRecord {
        VariantRecord {
            id: "v".into(),
            color: "red".into(),
            color_display: None,
            current_price: Decimal::ZERO,
            actual_price: Decimal::ZERO,
            images: images.iter().map(|n| image(n)).collect(),
            inventory_levels: vec![],
            slug: "s".into(),
        }
    }

    #[test]
    fn keeps_images_used_by_any_variant() {
        let images = [image("a.png"), image("b.png"), image("c.png")];
        let variants = [variant_with(&["a.png"]), variant_with(&["c.png", "a.png"])];
        let orphans = unreferenced_images(&images, &variants);
        assert_eq!(orphans, vec![&images[1]]);
    }

    #[test]
    fn everything_is_orphaned_without_variants() {
        let images = [image("a.png")];
        assert_eq!(unreferenced_images(&images, &[]).len(), 1);
    }
}
