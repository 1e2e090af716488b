//! Single-file append-only table
//!
//! File format:
//! ```text
//! [HEADER: 32 bytes]
//!   - magic: 8 bytes ("ASSETTBL")
//!   - version: 4 bytes (u32 LE)
//!   - flags: 4 bytes
//!   - record_count: 8 bytes (u64 LE)
//!   - reserved: 8 bytes
//!
//! [RECORDS: variable]
//!   - length: 4 bytes (u32 LE)
//!   - bincode-encoded Item
//! ```
//!
//! Records are replayed in order on open, so a later record replaces an earlier
//! one with the same (key, sort) pair.
//!
//! Several handles, in one process or many, may share a file. Every put takes
//! an exclusive advisory lock, replays whatever other handles appended since
//! this handle last looked, then appends at the real end of the file. Queries
//! take a shared lock and catch up the same way before reading the index.

use super::{Item, MemoryTable, Table};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for table file identification
pub const TABLE_MAGIC: &[u8; 8] = b"ASSETTBL";
/// Table file format version
pub const TABLE_VERSION: u32 = 1;

const HEADER_SIZE: u64 = 32;
const RECORD_COUNT_OFFSET: u64 = 16;
const RECORD_LEN_SIZE: usize = 4;

/// How much of the file this handle has replayed into its index
struct LogState {
    /// End of the last complete record seen
    synced_offset: u64,
    record_count: u64,
}

/// Advisory lock on the table file, released on drop
struct FileLock<'a>(&'a File);

impl<'a> FileLock<'a> {
    fn exclusive(file: &'a File) -> Result<Self> {
        file.lock()?;
        Ok(FileLock(file))
    }

    fn shared(file: &'a File) -> Result<Self> {
        file.lock_shared()?;
        Ok(FileLock(file))
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            tracing::warn!(error = %e, "failed to unlock table file");
        }
    }
}

/// A [`Table`] persisted to a single file, with an in-memory index for lookups
pub struct FileTable {
    path: PathBuf,
    file: File,
    log: Mutex<LogState>,
    index: MemoryTable,
}

impl FileTable {
    /// Create a new, empty table file, truncating any existing one
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        {
            let _lock = FileLock::exclusive(&file)?;
            write_header(&file)?;
        }

        tracing::debug!(path = %path.display(), "created table file");

        Ok(FileTable {
            path,
            file,
            log: Mutex::new(LogState {
                synced_offset: HEADER_SIZE,
                record_count: 0,
            }),
            index: MemoryTable::new(),
        })
    }

    /// Open an existing table file and replay its records
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::load(path, file, false)
    }

    /// Open the table file if it exists, otherwise create it
    ///
    /// Never truncates, so concurrent callers racing on a missing file all end
    /// up sharing one table.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Self::load(path, file, true)
    }

    fn load(path: PathBuf, file: File, init_empty: bool) -> Result<Self> {
        let table = FileTable {
            path,
            file,
            log: Mutex::new(LogState {
                synced_offset: HEADER_SIZE,
                record_count: 0,
            }),
            index: MemoryTable::new(),
        };

        {
            let _lock = FileLock::exclusive(&table.file)?;
            let len = table.file.metadata()?.len();
            if len == 0 && init_empty {
                write_header(&table.file)?;
                tracing::debug!(path = %table.path.display(), "initialized empty table file");
            } else {
                check_header(&table.file)?;
            }
            table.catch_up(&mut table.log.lock())?;
        }

        tracing::debug!(
            path = %table.path.display(),
            records = table.record_count(),
            "opened table file"
        );
        Ok(table)
    }

    /// Number of complete records in the file, as of this handle's last look
    pub fn record_count(&self) -> u64 {
        self.log.lock().record_count
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay records appended past `synced_offset` into the index
    ///
    /// Must be called with the file lock held.
    fn catch_up(&self, log: &mut LogState) -> Result<()> {
        let mut file = &self.file;
        let end = file.seek(SeekFrom::End(0))?;
        if end < log.synced_offset {
            return Err(Error::InvalidFile(format!(
                "{} shrank from {} to {} bytes",
                self.path.display(),
                log.synced_offset,
                end
            )));
        }
        if end == log.synced_offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(log.synced_offset))?;
        let mut data = Vec::with_capacity((end - log.synced_offset) as usize);
        file.read_to_end(&mut data)?;

        let mut offset = 0usize;
        while offset < data.len() {
            let body_start = offset + RECORD_LEN_SIZE;
            if body_start > data.len() {
                break;
            }
            let len = read_u32(&data[offset..body_start]) as usize;
            let body_end = body_start + len;
            if body_end > data.len() {
                break;
            }

            let item: Item = bincode::deserialize(&data[body_start..body_end]).map_err(|e| {
                Error::InvalidFile(format!(
                    "Corrupt record at offset {}: {}",
                    log.synced_offset + offset as u64,
                    e
                ))
            })?;
            self.index.put(item)?;

            log.record_count += 1;
            offset = body_end;
        }
        log.synced_offset += offset as u64;

        if offset < data.len() {
            // Writers hold the exclusive lock for a whole append, so this is
            // left over from an interrupted one. The next put overwrites it.
            tracing::warn!(
                path = %self.path.display(),
                offset = log.synced_offset,
                trailing_bytes = data.len() - offset,
                "ignoring partial trailing record"
            );
        }
        Ok(())
    }
}

impl Table for FileTable {
    fn query(&self, key: &str) -> Result<Vec<Item>> {
        let mut log = self.log.lock();
        let _lock = FileLock::shared(&self.file)?;
        self.catch_up(&mut log)?;
        self.index.query(key)
    }

    fn put(&self, item: Item) -> Result<()> {
        let body = bincode::serialize(&item)?;
        let len = u32::try_from(body.len())
            .map_err(|_| Error::InvalidInput(format!("record for {} is too large", item.key)))?;

        let mut log = self.log.lock();
        let _lock = FileLock::exclusive(&self.file)?;
        self.catch_up(&mut log)?;

        let offset = log.synced_offset;
        let count = log.record_count + 1;

        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&len.to_le_bytes())?;
        file.write_all(&body)?;
        let end = file.stream_position()?;
        // Drop whatever a previous interrupted append left behind.
        file.set_len(end)?;

        file.seek(SeekFrom::Start(RECORD_COUNT_OFFSET))?;
        file.write_all(&count.to_le_bytes())?;
        file.sync_data()?;

        log.synced_offset = end;
        log.record_count = count;

        // Index under the lock so lookups see puts in file order.
        self.index.put(item)
    }
}

fn write_header(mut file: &File) -> Result<()> {
    let mut header = [0u8; HEADER_SIZE as usize];
    header[0..8].copy_from_slice(TABLE_MAGIC);
    header[8..12].copy_from_slice(&TABLE_VERSION.to_le_bytes());
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header)?;
    file.sync_all()?;
    Ok(())
}

fn check_header(mut file: &File) -> Result<()> {
    let mut header = [0u8; HEADER_SIZE as usize];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut header).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::InvalidFile("Truncated header".into()),
        _ => Error::Io(e),
    })?;

    if &header[0..8] != TABLE_MAGIC {
        return Err(Error::InvalidFile("Invalid magic bytes".into()));
    }
    let version = read_u32(&header[8..12]);
    if version != TABLE_VERSION {
        return Err(Error::VersionMismatch {
            expected: TABLE_VERSION,
            found: version,
        });
    }
    Ok(())
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta_item(id: &str, name: &str) -> Item {
        Item::new(format!("ASSET_{}", id), "0")
            .with_attr("AssetName", name)
            .with_attr("Size", "5")
    }

    #[test]
    fn test_create_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");

        {
            let table = FileTable::create(&path).unwrap();
            assert_eq!(table.record_count(), 0);
        }

        {
            let table = FileTable::open(&path).unwrap();
            assert_eq!(table.record_count(), 0);
            assert!(table.query("ASSET_a").unwrap().is_empty());
        }
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");

        {
            let table = FileTable::create(&path).unwrap();
            table.put(meta_item("a", "first.txt")).unwrap();
            table.put(meta_item("b", "second.txt")).unwrap();
        }

        let table = FileTable::open(&path).unwrap();
        assert_eq!(table.record_count(), 2);
        let items = table.query("ASSET_b").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attr("AssetName"), Some("second.txt"));
    }

    #[test]
    fn test_replay_keeps_latest_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");

        {
            let table = FileTable::create(&path).unwrap();
            table.put(meta_item("a", "old.txt")).unwrap();
            table.put(meta_item("a", "new.txt")).unwrap();
        }

        let table = FileTable::open(&path).unwrap();
        let items = table.query("ASSET_a").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attr("AssetName"), Some("new.txt"));
    }

    #[test]
    fn test_partial_trailing_record_is_ignored_and_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");

        {
            let table = FileTable::create(&path).unwrap();
            table.put(meta_item("a", "kept.txt")).unwrap();
        }

        // Simulate a crash halfway through an append
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&100u32.to_le_bytes()).unwrap();
            file.write_all(b"partial").unwrap();
        }

        {
            let table = FileTable::open(&path).unwrap();
            assert_eq!(table.query("ASSET_a").unwrap().len(), 1);
            table.put(meta_item("b", "after.txt")).unwrap();
        }

        let table = FileTable::open(&path).unwrap();
        assert_eq!(table.query("ASSET_a").unwrap().len(), 1);
        assert_eq!(table.query("ASSET_b").unwrap().len(), 1);
        assert_eq!(table.record_count(), 2);
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not-a-table");
        std::fs::write(&path, [0u8; 64]).unwrap();

        assert!(matches!(FileTable::open(&path), Err(Error::InvalidFile(_))));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");
        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..8].copy_from_slice(TABLE_MAGIC);
        header[8..12].copy_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, header).unwrap();

        assert!(matches!(
            FileTable::open(&path),
            Err(Error::VersionMismatch {
                expected: TABLE_VERSION,
                found: 99
            })
        ));
    }

    #[test]
    fn test_two_handles_on_one_file_keep_both_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");

        let first = FileTable::open_or_create(&path).unwrap();
        let second = FileTable::open_or_create(&path).unwrap();
        first.put(meta_item("a", "from-first.txt")).unwrap();
        second.put(meta_item("b", "from-second.txt")).unwrap();
        first.put(meta_item("c", "first-again.txt")).unwrap();

        // Each handle sees the other's appends without reopening
        assert_eq!(first.query("ASSET_b").unwrap().len(), 1);
        assert_eq!(second.query("ASSET_c").unwrap().len(), 1);

        let table = FileTable::open(&path).unwrap();
        assert_eq!(table.record_count(), 3);
        let expected = [
            ("a", "from-first.txt"),
            ("b", "from-second.txt"),
            ("c", "first-again.txt"),
        ];
        for (id, name) in expected {
            let items = table.query(&format!("ASSET_{}", id)).unwrap();
            assert_eq!(items.len(), 1, "lost record {}", id);
            assert_eq!(items[0].attr("AssetName"), Some(name));
        }
    }

    #[test]
    fn test_concurrent_handles_from_threads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");
        FileTable::create(&path).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let table = FileTable::open(&path).unwrap();
                    for i in 0..10 {
                        table.put(meta_item(&format!("{}-{}", t, i), "x.txt")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let table = FileTable::open(&path).unwrap();
        assert_eq!(table.record_count(), 40);
        for t in 0..4 {
            for i in 0..10 {
                assert_eq!(table.query(&format!("ASSET_{}-{}", t, i)).unwrap().len(), 1);
            }
        }
    }

    #[test]
    fn test_open_or_create_initializes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.table");
        std::fs::File::create(&path).unwrap();

        assert!(matches!(FileTable::open(&path), Err(Error::InvalidFile(_))));

        let table = FileTable::open_or_create(&path).unwrap();
        table.put(meta_item("a", "a.txt")).unwrap();
        assert_eq!(FileTable::open(&path).unwrap().record_count(), 1);
    }
}
