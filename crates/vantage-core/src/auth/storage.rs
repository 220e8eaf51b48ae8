use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Key holding the raw bearer token
pub const TOKEN_KEY: &str = "token";

/// Key holding the serialized user profile
pub const USER_INFO_KEY: &str = "userInfo";

/// Session file name in cache directory
const STORE_FILE: &str = "session.json";

/// Durable string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    entries: BTreeMap<String, String>,
    updated_at: DateTime<Utc>,
}

/// JSON document on disk holding every entry.
pub struct FileStore {
    cache_dir: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    fn store_path(&self) -> PathBuf {
        self.cache_dir.join(STORE_FILE)
    }

    /// Current entries. A corrupt document reads as empty so the next write replaces it.
    fn read(&self) -> Result<BTreeMap<String, String>> {
        let path = self.store_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session store")?;
        match serde_json::from_str::<StoreDocument>(&contents) {
            Ok(doc) => Ok(doc.entries),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Discarding corrupt session store");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write(&self, entries: BTreeMap<String, String>) -> Result<()> {
        let path = self.store_path();
        if entries.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove session store")?;
            }
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let doc = StoreDocument {
            entries,
            updated_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&doc)?;
        std::fs::write(&path, contents).context("Failed to write session store")?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        if entries.remove(key).is_some() {
            self.write(entries)?;
        }
        Ok(())
    }
}
