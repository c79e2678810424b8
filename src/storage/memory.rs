use dashmap::DashMap;

use super::KeyValueBackend;

/// Process-local backend. Survives reconnects, not restarts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|v| v.value().clone())
    }

    fn set_item(&self, key: &str, value: String) -> std::io::Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}
