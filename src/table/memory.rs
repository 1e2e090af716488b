//! In-memory table

use super::{Item, Table};
use crate::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Partition key → sort key → item
type Partitions = BTreeMap<String, BTreeMap<String, Item>>;

/// A [`Table`] held entirely in memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryTable {
    partitions: RwLock<Partitions>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of items across all partitions
    pub fn len(&self) -> usize {
        self.partitions.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Table for MemoryTable {
    fn query(&self, key: &str) -> Result<Vec<Item>> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(key)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    fn put(&self, item: Item) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions
            .entry(item.key.clone())
            .or_default()
            .insert(item.sort.clone(), item);
        Ok(())
    }
}
