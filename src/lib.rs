// todostore - To-do list manager with a persistent task store

pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod render;
pub mod sqlite;
pub mod storage;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::ValidationError;
pub use filter::{SortKey, StatusFilter, View};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use sqlite::SqliteStorage;
pub use store::{Confirm, STORAGE_KEY, Stats, TaskStore};
pub use task::{Category, NewTask, Priority, Task, TaskEdit};
