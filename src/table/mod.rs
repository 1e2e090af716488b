//! Single-table storage for asset metadata and tokens
//!
//! Both record kinds share one flat table. Every item has a namespaced primary
//! key, a sort key carrying a per-kind payload, and string attributes:
//!
//! ```text
//! ObjID               ObjSort        attributes
//! ASSET_<asset id>    <version>      AssetName, Size
//! TOKEN_<token>       <expiry>       AssetID
//! ```
//!
//! An item's identity is the (primary key, sort key) pair. A query by primary
//! key returns every item stored under it.

mod file;
pub mod keys;
mod memory;
mod meta_token;

pub use file::FileTable;
pub use memory::MemoryTable;
pub use meta_token::MetaTokenStore;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Namespaced primary key (`ObjID`)
    pub key: String,
    /// Sort key (`ObjSort`)
    pub sort: String,
    pub attrs: BTreeMap<String, String>,
}

impl Item {
    pub fn new(key: impl Into<String>, sort: impl Into<String>) -> Self {
        Item {
            key: key.into(),
            sort: sort.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// A keyed table backend
///
/// Implementations need only exact-match queries on the primary key and
/// upserts keyed on (primary key, sort key).
pub trait Table: Send + Sync {
    /// All items whose primary key equals `key`, in sort key order
    fn query(&self, key: &str) -> Result<Vec<Item>>;

    /// Insert `item`, fully replacing any item with the same key pair
    fn put(&self, item: Item) -> Result<()>;
}
