//! Raw asset content storage
//!
//! Content is addressed by asset ID and stored byte-for-byte. Writes are
//! upserts; the reported length always comes from the backend after the write
//! has landed.

mod fs;
mod memory;

pub use fs::FsContentStore;
pub use memory::MemoryContentStore;
