//! Key/value backends for message-resumption state.
//!
//! The history store only needs string keys and string values, the same
//! contract a browser's `localStorage` offers.

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Persistent string key/value space shared by every channel of a client.
///
/// Writes to one key are last-write-wins. A write never drops or rolls back
/// other keys, even when several handles share the same storage.
pub trait KeyValueBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: String) -> std::io::Result<()>;
}
