//! # asset_store
//!
//! Binary asset storage with permanent IDs and short-lived access tokens.
//!
//! Three concerns are kept behind independent backends:
//!
//! - **Metadata** ([`AssetMeta`]) and **tokens** ([`AssetToken`]) share one
//!   keyed table ([`table`]), namespaced by key prefix.
//! - **Content** lives in a blob store ([`content`]) addressed by asset ID.
//!
//! [`AssetStorage`] coordinates them: content is written first, then metadata,
//! then the optional token. Reads go by ID (metadata → content) or by token
//! (token → metadata → content), with token expiry checked on every read.
//!
//! ## Example
//!
//! ```
//! use asset_store::{AssetMeta, AssetStorage, AssetToken};
//! use std::io::{Cursor, Read};
//!
//! let storage = AssetStorage::in_memory();
//! let meta = AssetMeta::with_id("a1", "file.txt");
//! storage.store(meta, &AssetToken::default(), Box::new(Cursor::new(b"hello".to_vec())))?;
//!
//! let (meta, mut content) = storage.get_by_id("a1")?;
//! let mut body = String::new();
//! content.read_to_string(&mut body)?;
//! assert_eq!(meta.size, 5);
//! assert_eq!(body, "hello");
//! # Ok::<(), asset_store::Error>(())
//! ```

pub mod clock;
pub mod config;
pub mod content;
pub mod logging;
pub mod model;
pub mod table;
pub mod traits;

mod error;
mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use content::{FsContentStore, MemoryContentStore};
pub use error::{Error, Result};
pub use model::{AssetMeta, AssetToken};
pub use storage::AssetStorage;
pub use table::{FileTable, Item, MemoryTable, MetaTokenStore, Table};
pub use traits::{
    AssetIdRetriever, AssetStorer, AssetTokenRetriever, ContentHandler, ContentReader,
    ContentStream, ContentWriter, MetaHandler, MetaRetriever, MetaStorer, TokenHandler,
    TokenRetriever, TokenStorer,
};
