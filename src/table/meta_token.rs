//! Asset metadata and token records over a shared [`Table`]

use super::keys::{KeyKind, ATTR_ASSET_ID, ATTR_ASSET_NAME, ATTR_SIZE};
use super::{Item, Table};
use crate::clock::{Clock, SystemClock};
use crate::model::{AssetMeta, AssetToken};
use crate::traits::{MetaRetriever, MetaStorer, TokenRetriever, TokenStorer};
use crate::{Error, Result};
use std::sync::Arc;

/// Stores [`AssetMeta`] and [`AssetToken`] records in one table
///
/// Implements all four metadata/token capabilities, so one instance can serve
/// as both the meta handler and the token handler of an
/// [`AssetStorage`](crate::AssetStorage).
pub struct MetaTokenStore<T: Table> {
    table: T,
    clock: Arc<dyn Clock>,
}

impl<T: Table> MetaTokenStore<T> {
    pub fn new(table: T) -> Self {
        Self::with_clock(table, Arc::new(SystemClock))
    }

    pub fn with_clock(table: T, clock: Arc<dyn Clock>) -> Self {
        MetaTokenStore { table, clock }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Query for exactly one item under `key`
    fn get_unique(&self, key: &str, what: &str, id: &str) -> Result<Item> {
        let mut items = self.table.query(key)?;
        match items.len() {
            1 => Ok(items.remove(0)),
            0 => Err(Error::NotFound(format!("{} {}", what, id))),
            count => Err(Error::Ambiguous {
                key: key.to_string(),
                count,
            }),
        }
    }
}

impl<T: Table> MetaRetriever for MetaTokenStore<T> {
    fn get_meta(&self, id: &str) -> Result<AssetMeta> {
        if id.is_empty() {
            return Err(Error::InvalidInput("zero-length id".into()));
        }
        let item = self.get_unique(&KeyKind::Asset.encode(id), "asset", id)?;
        meta_from_item(&item)
    }
}

impl<T: Table> MetaStorer for MetaTokenStore<T> {
    fn store_meta(&self, meta: &AssetMeta) -> Result<()> {
        if !meta.is_valid() {
            return Err(Error::InvalidInput(format!(
                "meta invalid: id {:?}, name {:?}",
                meta.id, meta.name
            )));
        }
        self.table.put(meta_to_item(meta))
    }
}

impl<T: Table> TokenRetriever for MetaTokenStore<T> {
    fn get_token(&self, token: &str) -> Result<AssetToken> {
        if token.is_empty() {
            return Err(Error::InvalidInput("zero-length token".into()));
        }
        let item = self.get_unique(&KeyKind::Token.encode(token), "token", token)?;
        let decoded = token_from_item(&item)?;
        if self.clock.now() >= decoded.expiry {
            return Err(Error::Expired(token.to_string()));
        }
        Ok(decoded)
    }
}

impl<T: Table> TokenStorer for MetaTokenStore<T> {
    fn store_token(&self, token: &AssetToken) -> Result<()> {
        if !token.is_valid_at(self.clock.now()) {
            return Err(Error::InvalidInput(format!(
                "token invalid: token {:?}, asset {:?}, expiry {}",
                token.token, token.asset_id, token.expiry
            )));
        }
        self.table.put(token_to_item(token))
    }
}

fn meta_to_item(meta: &AssetMeta) -> Item {
    Item::new(KeyKind::Asset.encode(&meta.id), meta.version.to_string())
        .with_attr(ATTR_ASSET_NAME, meta.name.clone())
        .with_attr(ATTR_SIZE, meta.size.to_string())
}

fn meta_from_item(item: &Item) -> Result<AssetMeta> {
    let id = KeyKind::Asset.decode(&item.key)?;
    let name = required_attr(item, ATTR_ASSET_NAME)?;
    let size = parse_field(required_attr(item, ATTR_SIZE)?, ATTR_SIZE, &item.key)?;
    let version = parse_field(&item.sort, "version", &item.key)?;

    Ok(AssetMeta {
        id: id.to_string(),
        name: name.to_string(),
        size,
        version,
    })
}

fn token_to_item(token: &AssetToken) -> Item {
    Item::new(KeyKind::Token.encode(&token.token), token.expiry.to_string())
        .with_attr(ATTR_ASSET_ID, token.asset_id.clone())
}

fn token_from_item(item: &Item) -> Result<AssetToken> {
    let token = KeyKind::Token.decode(&item.key)?;
    let asset_id = required_attr(item, ATTR_ASSET_ID)?;
    let expiry = parse_field(&item.sort, "expiry", &item.key)?;

    Ok(AssetToken {
        token: token.to_string(),
        expiry,
        asset_id: asset_id.to_string(),
    })
}

fn required_attr<'a>(item: &'a Item, name: &str) -> Result<&'a str> {
    item.attr(name)
        .ok_or_else(|| Error::Decode(format!("{} has no {} attribute", item.key, name)))
}

fn parse_field<N: std::str::FromStr>(value: &str, field: &str, key: &str) -> Result<N> {
    value
        .parse()
        .map_err(|_| Error::Decode(format!("{} has non-numeric {}: {:?}", key, field, value)))
}
