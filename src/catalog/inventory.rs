//! Inventory batch writer
//!
//! Stock rows live at `inventory/{sku}`, keyed globally by SKU. Every product
//! mutation stages its inventory changes into the same [`WriteBatch`] as the
//! rest of its records.

use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::domain::aggregates::InventoryRecord;
use crate::domain::value_objects::{SizeLabel, Sku};
use crate::store::{paths, WriteBatch};
use crate::Result;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryBatch {
    product_id: String,
    staged: Vec<(Sku, InventoryRecord)>,
}

impl InventoryBatch {
    pub fn new(product_id: impl Into<String>) -> Self { Self { product_id: product_id.into(), staged: Vec::new() } }

    /// Stages the stock row for one SKU. Staging a SKU twice keeps the later
    /// row, the same way the store would overwrite it.
    pub fn stage(&mut self, sku: Sku, stock: u32, size: SizeLabel) {
        let record = InventoryRecord { product_id: self.product_id.clone(), stock, value: size };
        if let Some(existing) = self.staged.iter_mut().find(|(staged, _)| *staged == sku) {
            warn!(sku = %sku, product_id = %self.product_id, "SKU generated twice, later stock wins");
            existing.1 = record;
        } else {
            self.staged.push((sku, record));
        }
    }

    pub fn skus(&self) -> Vec<Sku> { self.staged.iter().map(|(sku, _)| sku.clone()).collect() }

    pub fn get(&self, sku: &Sku) -> Option<&InventoryRecord> {
        self.staged.iter().find(|(staged, _)| staged == sku).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize { self.staged.len() }
    pub fn is_empty(&self) -> bool { self.staged.is_empty() }

    /// SKUs from `prior` that this batch no longer stages, sorted and unique.
    pub fn retired(&self, prior: impl IntoIterator<Item = Sku>) -> Vec<Sku> {
        let current: BTreeSet<&Sku> = self.staged.iter().map(|(sku, _)| sku).collect();
        prior
            .into_iter()
            .filter(|sku| !current.contains(sku))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Writes every staged row and deletes the retired SKUs.
    pub fn write_into(&self, batch: &mut WriteBatch, retired: &[Sku]) -> Result<()> {
        for (sku, record) in &self.staged {
            batch.set(paths::inventory(sku.as_str()), serde_json::to_value(record)?);
        }
        stage_removal(batch, &self.product_id, retired);
        Ok(())
    }
}

/// Deletes the inventory row and the product's SKU record of each SKU.
pub fn stage_removal(batch: &mut WriteBatch, product_id: &str, skus: &[Sku]) {
    for sku in skus {
        batch.delete(paths::inventory(sku.as_str()));
        batch.delete(paths::sku(product_id, sku.as_str()));
    }
}

/// Joins stored inventory rows by SKU.
pub fn index_by_sku(rows: impl IntoIterator<Item = (String, InventoryRecord)>) -> BTreeMap<String, InventoryRecord> {
    rows.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WriteOp;

    fn sku(s: &str) -> Sku { Sku::new(s).unwrap() }

    #[test]
    fn restaging_overwrites_stock() {
        let mut inv = InventoryBatch::new("p1");
        inv.stage(sku("A-B-SM"), 1, SizeLabel::S);
        inv.stage(sku("A-B-SM"), 7, SizeLabel::S);
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.get(&sku("A-B-SM")).unwrap().stock, 7);
    }

    #[test]
    fn retired_is_prior_minus_staged() {
        let mut inv = InventoryBatch::new("p1");
        inv.stage(sku("PHX-SGR-128"), 3, SizeLabel::Gb128);
        let retired = inv.retired(vec![sku("PHX-SGR-256"), sku("PHX-SGR-128"), sku("PHX-SGR-256")]);
        assert_eq!(retired, vec![sku("PHX-SGR-256")]);
    }

    #[test]
    fn write_into_sets_rows_and_deletes_retired() {
        let mut inv = InventoryBatch::new("p1");
        inv.stage(sku("PHX-SGR-128"), 3, SizeLabel::Gb128);
        let mut batch = WriteBatch::new();
        inv.write_into(&mut batch, &[sku("PHX-SGR-256")]).unwrap();

        let ops = batch.ops();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], WriteOp::Set { path, data } if *path == paths::inventory("PHX-SGR-128")
            && data["productId"] == "p1" && data["stock"] == 3 && data["value"] == "128GB"));
        assert_eq!(ops[1], WriteOp::Delete { path: paths::inventory("PHX-SGR-256") });
        assert_eq!(ops[2], WriteOp::Delete { path: paths::sku("p1", "PHX-SGR-256") });
    }
}
