//! Storage for cover art and other images referenced by image fields.
//!
//! An image field holds an image id, `<sha256 hex>.<format>`, derived from
//! the bytes so identical images are stored once.

use crate::error::ModelResult;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Where fetched images go. Implementations must be usable from fetcher
/// tasks.
pub trait ImageStore: Send + Sync {
    /// Stores `data` and returns its id, or `None` if nothing was stored.
    fn add_image(&self, data: &[u8], format: &str) -> Option<String>;

    fn has_image(&self, id: &str) -> bool;

    fn image(&self, id: &str) -> Option<Vec<u8>>;
}

/// The id an image with these bytes and format is stored under.
pub fn image_id(data: &[u8], format: &str) -> String {
    let digest = hex::encode(Sha256::digest(data));
    format!("{}.{}", digest, format.to_ascii_lowercase())
}

/// Keeps images in memory.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageStore for MemoryImageStore {
    fn add_image(&self, data: &[u8], format: &str) -> Option<String> {
        if data.is_empty() {
            return None;
        }
        let id = image_id(data, format);
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_insert_with(|| data.to_vec());
        Some(id)
    }

    fn has_image(&self, id: &str) -> bool {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    fn image(&self, id: &str) -> Option<Vec<u8>> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

/// Keeps images as files named by their id in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryImageStore {
    dir: PathBuf,
}

impl DirectoryImageStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> ModelResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: &str) -> Option<PathBuf> {
        // ids are file names; refuse anything that could leave the directory
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return None;
        }
        Some(self.dir.join(id))
    }
}

impl ImageStore for DirectoryImageStore {
    fn add_image(&self, data: &[u8], format: &str) -> Option<String> {
        if data.is_empty() {
            return None;
        }
        let id = image_id(data, format);
        let path = self.path(&id)?;
        if path.exists() {
            return Some(id);
        }
        match fs::write(&path, data) {
            Ok(()) => {
                debug!(path = %path.display(), "image written");
                Some(id)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write image");
                None
            }
        }
    }

    fn has_image(&self, id: &str) -> bool {
        self.path(id).is_some_and(|p| p.is_file())
    }

    fn image(&self, id: &str) -> Option<Vec<u8>> {
        fs::read(self.path(id)?).ok()
    }
}
