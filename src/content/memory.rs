//! In-memory content store

use crate::traits::{ContentReader, ContentStream, ContentWriter};
use crate::{Error, Result};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Content held in memory. Reads hand out cheap clones of the stored bytes.
#[derive(Default)]
pub struct MemoryContentStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentWriter for MemoryContentStore {
    fn write(&self, id: &str, mut content: ContentStream) -> Result<u64> {
        if id.is_empty() {
            return Err(Error::InvalidInput("zero-length content id".into()));
        }

        let mut data = Vec::new();
        content.read_to_end(&mut data)?;
        drop(content);

        let data = Bytes::from(data);
        let mut objects = self.objects.write();
        objects.insert(id.to_string(), data);
        Ok(objects.get(id).map_or(0, |b| b.len() as u64))
    }
}

impl ContentReader for MemoryContentStore {
    fn read(&self, id: &str) -> Result<ContentStream> {
        if id.is_empty() {
            return Err(Error::InvalidInput("zero-length content id".into()));
        }

        let objects = self.objects.read();
        let data = objects
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("content for asset {}", id)))?;
        Ok(Box::new(Cursor::new(data)))
    }
}
