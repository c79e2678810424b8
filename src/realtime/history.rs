use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::config::{ClientConfig, DEFAULT_HISTORY_PREFIX};
use crate::logging::{LogEntry, LogLevel, Logger};
use crate::storage::KeyValueBackend;
use crate::jlog_debug;

/// Last-seen message id per topic, kept in a shared key/value backend so a
/// rejoin (or a restarted process) resumes where it left off.
///
/// Without a backend both operations are no-ops and `get` always yields
/// `None`. Writes are last-write-wins across every channel and process that
/// shares the backend.
#[derive(Clone)]
pub struct HistoryStore {
    backend: Option<Arc<dyn KeyValueBackend>>,
    prefix: String,
    logger: Logger,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>, prefix: impl Into<String>, logger: Logger) -> Self {
        Self {
            backend: Some(backend),
            prefix: prefix.into(),
            logger,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            prefix: DEFAULT_HISTORY_PREFIX.to_string(),
            logger: Logger::disabled(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            backend: config.storage.clone(),
            prefix: config.history_prefix.clone(),
            logger: config.logger.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn key_for(&self, topic: &str) -> String {
        format!("{}{}", self.prefix, topic)
    }

    /// Last stored id for `topic`. Absent, null and unreadable values are all
    /// `None`.
    pub fn get(&self, topic: &str) -> Option<JsonValue> {
        let backend = self.backend.as_ref()?;
        let key = self.key_for(topic);
        let raw = backend.get_item(&key);
        jlog_debug!(self.logger, "history", "get {} -> {:?}", key, raw);

        match serde_json::from_str::<JsonValue>(&raw?) {
            Ok(JsonValue::Null) => None,
            Ok(id) => Some(id),
            Err(e) => {
                self.logger.log_entry(
                    LogEntry::new(LogLevel::Warn, format!("ignoring unreadable id under {key}: {e}"))
                        .with_target("history")
                        .with_topic(topic),
                );
                None
            }
        }
    }

    pub fn set(&self, topic: &str, id: &JsonValue) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let key = self.key_for(topic);
        jlog_debug!(self.logger, "history", "set {} = {}", key, id);

        if let Err(e) = backend.set_item(&key, id.to_string()) {
            self.logger.log_entry(
                LogEntry::new(LogLevel::Warn, format!("failed to store id under {key}: {e}"))
                    .with_target("history")
                    .with_topic(topic),
            );
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("enabled", &self.is_enabled())
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    fn store() -> (HistoryStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = HistoryStore::new(backend.clone(), "jsp_msgid__", Logger::disabled());
        (store, backend)
    }

    #[test]
    fn stores_json_encoded_ids_under_prefixed_key() {
        let (store, backend) = store();
        assert_eq!(store.get("jwp:a1:room"), None);

        store.set("jwp:a1:room", &json!(42));
        assert_eq!(
            backend.get_item("jsp_msgid__jwp:a1:room").as_deref(),
            Some("42")
        );
        assert_eq!(store.get("jwp:a1:room"), Some(json!(42)));

        store.set("jwp:a1:room", &json!("m-43"));
        assert_eq!(store.get("jwp:a1:room"), Some(json!("m-43")));
    }

    #[test]
    fn unreadable_values_are_absent_and_logged() {
        let backend = Arc::new(MemoryBackend::new());
        let logger = Logger::memory(LogLevel::Warn);
        let store = HistoryStore::new(backend.clone(), "p_", logger.clone());
        backend.set_item("p_t", "{not json".into()).unwrap();

        assert_eq!(store.get("t"), None);
        let entries = logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].topic.as_deref(), Some("t"));
    }

    #[test]
    fn disabled_store_is_a_no_op() {
        let store = HistoryStore::disabled();
        store.set("jwp:a1:room", &json!(7));
        assert_eq!(store.get("jwp:a1:room"), None);
        assert!(!store.is_enabled());
    }
}
