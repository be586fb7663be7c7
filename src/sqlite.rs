// SQLite-backed key/value storage

use crate::storage::{LOCK_FILE, Storage, lock_dir, validate_key};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DB_FILE: &str = "todostore.db";

/// Storage backed by a single `kv` table in `todostore.db`
///
/// An on-disk database holds the directory lock for as long as it is open,
/// the same as [`FileStorage`](crate::FileStorage).
pub struct SqliteStorage {
    base_path: PathBuf,
    db: Connection,
    _lock: Option<File>,
}

impl SqliteStorage {
    /// Open or create the database under `path`
    ///
    /// Blocks while another handle on the same directory is open.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create storage directory")?;
        let lock = lock_dir(&base_path)?;

        let db_path = base_path.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let storage = Self {
            base_path,
            db,
            _lock: Some(lock),
        };
        storage.create_schema()?;
        storage.create_gitignore()?;

        Ok(storage)
    }

    /// In-memory database, for tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let storage = Self {
            base_path: PathBuf::new(),
            db,
            _lock: None,
        };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Get the base path of this storage
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(
                gitignore_path,
                format!("todostore.db\ntodostore.db-shm\ntodostore.db-wal\n{}\n", LOCK_FILE),
            )?;
        }
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;

        debug!(key, bytes = value.len(), "set_item: written");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}
