//! High-level asset storage API
//!
//! [`AssetStorage`] composes a metadata handler, a token handler and a content
//! handler into the three operations a request layer needs.
//!
//! Writes happen strictly in order: content, then metadata, then token. So
//! metadata never points at content that was not written, and a token never
//! points at an asset whose metadata was not stored. Nothing is rolled back. A
//! failed metadata write leaves orphaned content. A failed token write leaves
//! the asset readable by ID. Calling `store` again with the same ID is safe.

use crate::clock::{Clock, SystemClock};
use crate::content::{FsContentStore, MemoryContentStore};
use crate::model::{AssetMeta, AssetToken};
use crate::table::{FileTable, MemoryTable, MetaTokenStore};
use crate::traits::{
    AssetIdRetriever, AssetStorer, AssetTokenRetriever, ContentHandler, ContentStream,
    MetaHandler, TokenHandler,
};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// The asset storage facade
///
/// Holds no per-request state, so one instance can be shared across threads.
/// Backend errors are returned unchanged; failures are logged with the step
/// and identifiers involved.
#[derive(Clone)]
pub struct AssetStorage {
    meta: Arc<dyn MetaHandler>,
    tokens: Arc<dyn TokenHandler>,
    content: Arc<dyn ContentHandler>,
    clock: Arc<dyn Clock>,
}

impl AssetStorage {
    pub fn new(
        meta: Arc<dyn MetaHandler>,
        tokens: Arc<dyn TokenHandler>,
        content: Arc<dyn ContentHandler>,
    ) -> Self {
        AssetStorage {
            meta,
            tokens,
            content,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the clock used to decide whether a token should be issued
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Storage backed by a table file and a content directory
    pub fn open(table_path: impl AsRef<Path>, content_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(table_path, content_dir, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        table_path: impl AsRef<Path>,
        content_dir: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let table = FileTable::open_or_create(table_path)?;
        let records = Arc::new(MetaTokenStore::with_clock(table, clock.clone()));
        let content = Arc::new(FsContentStore::open_or_create(content_dir.as_ref())?);
        Ok(Self::new(records.clone(), records, content).with_clock(clock))
    }

    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Self {
        let records = Arc::new(MetaTokenStore::with_clock(MemoryTable::new(), clock.clone()));
        Self::new(records.clone(), records, Arc::new(MemoryContentStore::new())).with_clock(clock)
    }

    /// Store content, then metadata, then (if valid) the token
    ///
    /// `meta.size` is replaced by the length the content backend reports.
    /// Returns the metadata as stored. A valid token must reference `meta.id`;
    /// otherwise nothing is written.
    pub fn store(
        &self,
        mut meta: AssetMeta,
        token: &AssetToken,
        content: ContentStream,
    ) -> Result<AssetMeta> {
        let issue_token = token.is_valid_at(self.clock.now());
        if issue_token && token.asset_id != meta.id {
            tracing::error!(
                context = "AssetStorage::store",
                step = "validate",
                id = %meta.id,
                token = %token.token,
                asset_id = %token.asset_id,
                "token references a different asset"
            );
            return Err(Error::InvalidInput(format!(
                "token references asset {}, not {}",
                token.asset_id, meta.id
            )));
        }

        let size = self.content.write(&meta.id, content).map_err(|e| {
            tracing::error!(
                context = "AssetStorage::store",
                step = "content",
                id = %meta.id,
                name = %meta.name,
                error = %e
            );
            e
        })?;
        meta.size = size;

        self.meta.store_meta(&meta).map_err(|e| {
            tracing::error!(
                context = "AssetStorage::store",
                step = "meta",
                id = %meta.id,
                name = %meta.name,
                size,
                error = %e
            );
            e
        })?;

        if issue_token {
            self.tokens.store_token(token).map_err(|e| {
                tracing::error!(
                    context = "AssetStorage::store",
                    step = "token",
                    id = %meta.id,
                    token = %token.token,
                    expiry = token.expiry,
                    error = %e
                );
                e
            })?;
            tracing::debug!(id = %meta.id, size, expiry = token.expiry, "stored asset with token");
        } else {
            tracing::debug!(id = %meta.id, size, "stored asset");
        }

        Ok(meta)
    }

    /// Fetch metadata, then open the content it names
    pub fn get_by_id(&self, id: &str) -> Result<(AssetMeta, ContentStream)> {
        let meta = self.meta.get_meta(id).map_err(|e| {
            tracing::error!(context = "AssetStorage::get_by_id", step = "meta", id, error = %e);
            e
        })?;
        let content = self.content.read(&meta.id).map_err(|e| {
            tracing::error!(context = "AssetStorage::get_by_id", step = "content", id, error = %e);
            e
        })?;
        Ok((meta, content))
    }

    /// Resolve token → asset ID → metadata → content
    ///
    /// Expiry is checked by the token handler on every call.
    pub fn get_by_token(&self, token: &str) -> Result<(AssetMeta, ContentStream)> {
        let asset_token = self.tokens.get_token(token).map_err(|e| {
            tracing::error!(context = "AssetStorage::get_by_token", step = "token", token, error = %e);
            e
        })?;
        let meta = self.meta.get_meta(&asset_token.asset_id).map_err(|e| {
            tracing::error!(
                context = "AssetStorage::get_by_token",
                step = "meta",
                token,
                asset_id = %asset_token.asset_id,
                error = %e
            );
            e
        })?;
        let content = self.content.read(&meta.id).map_err(|e| {
            tracing::error!(
                context = "AssetStorage::get_by_token",
                step = "content",
                token,
                id = %meta.id,
                error = %e
            );
            e
        })?;
        Ok((meta, content))
    }

    /// Metadata only, without opening content
    pub fn get_meta(&self, id: &str) -> Result<AssetMeta> {
        self.meta.get_meta(id)
    }
}

impl AssetStorer for AssetStorage {
    fn store(
        &self,
        meta: AssetMeta,
        token: &AssetToken,
        content: ContentStream,
    ) -> Result<AssetMeta> {
        AssetStorage::store(self, meta, token, content)
    }
}

impl AssetIdRetriever for AssetStorage {
    fn get_by_id(&self, id: &str) -> Result<(AssetMeta, ContentStream)> {
        AssetStorage::get_by_id(self, id)
    }
}

impl AssetTokenRetriever for AssetStorage {
    fn get_by_token(&self, token: &str) -> Result<(AssetMeta, ContentStream)> {
        AssetStorage::get_by_token(self, token)
    }
}
