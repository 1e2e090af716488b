//! Capability traits between the storage layer and its backends
//!
//! The orchestrator only sees these traits. Each backend adapter translates its
//! native records and streams into [`AssetMeta`], [`AssetToken`] and
//! [`ContentStream`] at its own boundary.

use crate::model::{AssetMeta, AssetToken};
use crate::Result;
use std::io::Read;

/// A lazily consumed byte stream. Dropping it releases the underlying handle.
pub type ContentStream = Box<dyn Read + Send>;

pub trait MetaRetriever: Send + Sync {
    /// Fetch metadata by asset ID. Exactly one stored record must match.
    fn get_meta(&self, id: &str) -> Result<AssetMeta>;
}

pub trait MetaStorer: Send + Sync {
    /// Upsert metadata. Invalid metadata is rejected without touching the backend.
    fn store_meta(&self, meta: &AssetMeta) -> Result<()>;
}

pub trait TokenRetriever: Send + Sync {
    /// Fetch a token by value. Expired tokens are an error distinct from a miss.
    fn get_token(&self, token: &str) -> Result<AssetToken>;
}

pub trait TokenStorer: Send + Sync {
    /// Upsert a token. Tokens that are not currently valid are rejected.
    fn store_token(&self, token: &AssetToken) -> Result<()>;
}

pub trait ContentReader: Send + Sync {
    /// Open the content stored under `id`
    fn read(&self, id: &str) -> Result<ContentStream>;
}

pub trait ContentWriter: Send + Sync {
    /// Consume `content` and store it under `id`, replacing anything already
    /// there. Returns the length the backend reports once the write is durable.
    fn write(&self, id: &str, content: ContentStream) -> Result<u64>;
}

/// Read and write access to asset metadata
pub trait MetaHandler: MetaRetriever + MetaStorer {}
impl<T: MetaRetriever + MetaStorer> MetaHandler for T {}

/// Read and write access to asset tokens
pub trait TokenHandler: TokenRetriever + TokenStorer {}
impl<T: TokenRetriever + TokenStorer> TokenHandler for T {}

/// Read and write access to asset content
pub trait ContentHandler: ContentReader + ContentWriter {}
impl<T: ContentReader + ContentWriter> ContentHandler for T {}

/// Store an asset from its metadata, an optional token and its content
pub trait AssetStorer: Send + Sync {
    /// Returns the metadata as stored, with the authoritative size
    fn store(&self, meta: AssetMeta, token: &AssetToken, content: ContentStream)
        -> Result<AssetMeta>;
}

/// Retrieve an asset by its permanent ID
pub trait AssetIdRetriever: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<(AssetMeta, ContentStream)>;
}

/// Retrieve an asset through an access token
pub trait AssetTokenRetriever: Send + Sync {
    fn get_by_token(&self, token: &str) -> Result<(AssetMeta, ContentStream)>;
}
