//! Directory-backed content store
//!
//! Content for an asset lives at `root/{hash[0:2]}/{hash}` where `hash` is the
//! hex BLAKE3 digest of the asset ID, so any ID maps to a safe file name.

use crate::traits::{ContentReader, ContentStream, ContentWriter};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Use `root` as the content directory. Shard directories are created on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsContentStore { root: root.into() }
    }

    /// Like [`new`](Self::new), creating `root` if it is missing
    pub fn open_or_create(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    /// Get the filesystem path for an asset's content
    pub fn path_for(&self, id: &str) -> PathBuf {
        let hash = hex::encode(blake3::hash(id.as_bytes()).as_bytes());
        self.root.join(&hash[0..2]).join(hash)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether content exists for `id`
    pub fn contains(&self, id: &str) -> bool {
        !id.is_empty() && self.path_for(id).is_file()
    }

    fn write_temp(temp_path: &Path, mut content: ContentStream) -> io::Result<u64> {
        let mut file = File::create(temp_path)?;
        let copied = io::copy(&mut content, &mut file)?;
        file.sync_all()?;
        Ok(copied)
    }
}

impl ContentWriter for FsContentStore {
    fn write(&self, id: &str, content: ContentStream) -> Result<u64> {
        if id.is_empty() {
            return Err(Error::InvalidInput("zero-length content id".into()));
        }

        let path = self.path_for(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Unique temp name so concurrent writers to one id never share a file
        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let copied = match Self::write_temp(&temp_path, content) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e.into());
            }
        };
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        if let Some(parent) = path.parent() {
            sync_dir(parent)?;
        }

        let stored = fs::metadata(&path)?.len();
        if stored != copied {
            tracing::warn!(id, copied, stored, "content length differs from bytes copied");
        }
        tracing::debug!(id, bytes = stored, path = %path.display(), "wrote content");
        Ok(stored)
    }
}

impl ContentReader for FsContentStore {
    fn read(&self, id: &str) -> Result<ContentStream> {
        if id.is_empty() {
            return Err(Error::InvalidInput("zero-length content id".into()));
        }

        let file = File::open(self.path_for(id)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(format!("content for asset {}", id)),
            _ => Error::Io(e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Flush a directory entry so a rename into it survives a crash
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

// Directories cannot be opened as files here; the rename is all we get.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
