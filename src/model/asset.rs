//! Asset metadata - one record per stored asset

use serde::{Deserialize, Serialize};

/// Properties of a stored asset
///
/// The ID is assigned once and never changes. `size` is only authoritative
/// after the content write has completed; the storage layer overwrites it with
/// the byte count the content backend reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    pub id: String,
    /// File or asset name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Reserved for revisioning, currently always 0
    pub version: u32,
}

impl AssetMeta {
    /// Create metadata for a new asset with a random ID
    pub fn new(name: impl Into<String>) -> Self {
        AssetMeta {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            size: 0,
            version: 0,
        }
    }

    /// Create metadata with a caller-chosen ID
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        AssetMeta {
            id: id.into(),
            name: name.into(),
            size: 0,
            version: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }
}
