pub mod in_memory;
pub mod sqlite_log_store;

pub use in_memory::InMemoryModerationLog;
pub use sqlite_log_store::SqliteModerationLog;
