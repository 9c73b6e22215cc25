use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

/// Document-store seam. Values are opaque bytes; everything above this
/// trait reads and writes JSON documents through [`DbExt`].
pub trait Db: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

pub trait DbExt {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;
}

impl<D: Db + ?Sized> DbExt for D {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &serde_json::to_vec(value)?)
    }
}

/// In-memory store used by the native binary and the test suite.
/// Each operation is synchronized on its own; read-then-write sequences
/// above this layer are not transactional.
#[derive(Default)]
pub struct MemoryDb {
    map: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Db for MemoryDb {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self
            .map
            .read()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}
