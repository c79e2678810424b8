use std::fmt;
use std::sync::Arc;

use crate::logging::Logger;
use crate::storage::KeyValueBackend;

pub const DEFAULT_NAMESPACE: &str = "jwp";
pub const DEFAULT_HISTORY_PREFIX: &str = "jsp_msgid__";
pub const DEFAULT_PLACEHOLDER_TOPIC: &str = "__temporary__";

/// Client-wide settings shared by a socket and every channel created from it.
///
/// Without a storage backend, message resumption is disabled and every join
/// starts from `last_message_id: null`.
#[derive(Clone)]
pub struct ClientConfig {
    /// First segment of every topic: `namespace:app_id:channel`.
    pub namespace: String,
    /// Prefix of history keys in the storage backend.
    pub history_prefix: String,
    /// Topic a channel carries until its first join resolves the real one.
    pub placeholder_topic: String,
    pub logger: Logger,
    pub storage: Option<Arc<dyn KeyValueBackend>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            history_prefix: DEFAULT_HISTORY_PREFIX.to_string(),
            placeholder_topic: DEFAULT_PLACEHOLDER_TOPIC.to_string(),
            logger: Logger::disabled(),
            storage: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_history_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.history_prefix = prefix.into();
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn KeyValueBackend>) -> Self {
        self.storage = Some(storage);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("namespace", &self.namespace)
            .field("history_prefix", &self.history_prefix)
            .field("placeholder_topic", &self.placeholder_topic)
            .field("logger", &self.logger)
            .field("storage", &self.storage.is_some())
            .finish()
    }
}
