// String-keyed value storage backing the task store

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub(crate) const LOCK_FILE: &str = ".lock";

/// Key/value store holding string values under string keys
///
/// Mirrors the browser's local storage: values are opaque strings and every
/// write replaces the previous value wholesale.
pub trait Storage {
    /// Read the value under `key`, `None` if it has never been written
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// In-memory storage, lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key
///
/// Opening takes an exclusive lock on the directory's lock file and holds it
/// until the storage is dropped, so a read-modify-write session in one
/// process never interleaves with another's. Writes go through a temp file
/// and rename, so a reader never sees a partial value.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
    _lock: File,
}

impl FileStorage {
    /// Open or create file storage rooted at `path`
    ///
    /// Blocks while another handle on the same directory is open.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create storage directory")?;
        let lock = lock_dir(&base_path)?;

        debug!(path = ?base_path, "Opened file storage");
        Ok(Self {
            base_path,
            _lock: lock,
        })
    }

    /// Get the base path of this storage
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let value = match String::from_utf8(bytes) {
            Ok(value) => value,
            Err(e) => {
                // Hand the damaged value on; the caller decides what malformed data means
                warn!(file = ?path, error = ?e.utf8_error(), "Value is not valid UTF-8");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok(Some(value))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;

        let tmp = path.with_extension("json.tmp");
        let mut file = File::create(&tmp).context("Failed to create temp file")?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(key, bytes = value.len(), "set_item: written");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        let path = self.item_path(key)?;

        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Take the exclusive lock on `dir`'s lock file, blocking until it is free
///
/// The lock is released when the returned file is dropped.
pub(crate) fn lock_dir(dir: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(dir.join(LOCK_FILE))
        .context("Failed to open storage lock file")?;

    file.lock_exclusive().context("Failed to acquire file lock")?;
    Ok(file)
}

/// Validate a storage key
///
/// Keys double as file names, so they are restricted to alphanumerics, `_`
/// and `-`.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}
