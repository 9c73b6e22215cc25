//! Object-storage seam. Uploads are routed by folder (`posts` for post
//! media, `pfp` for profile images) and only the returned storage path is
//! persisted on the owning document.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

pub trait MediaStore: Send + Sync {
    /// Store the bytes and return the path to persist, `{folder}/{name}`.
    fn save(&self, folder: &str, filename: &str, data: &[u8]) -> Result<String>;
}

pub(crate) fn storage_path(folder: &str, filename: &str) -> String {
    // Drop any client-supplied directory components
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    format!("{}/{}-{}", folder, Uuid::new_v4(), base)
}

/// Keeps uploads in memory; used by the native binary and the tests.
#[derive(Default)]
pub struct MemoryMedia {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.read().ok()?.get(path).cloned()
    }
}

impl MediaStore for MemoryMedia {
    fn save(&self, folder: &str, filename: &str, data: &[u8]) -> Result<String> {
        let path = storage_path(folder, filename);
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| anyhow::anyhow!("media lock poisoned"))?;
        blobs.insert(path.clone(), data.to_vec());
        Ok(path)
    }
}

/// Writes uploads under a local root directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct DiskMedia {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DiskMedia {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl MediaStore for DiskMedia {
    fn save(&self, folder: &str, filename: &str, data: &[u8]) -> Result<String> {
        let path = storage_path(folder, filename);
        let full = self.root.join(&path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, data)?;
        Ok(path)
    }
}
