use serde_json::Value as JsonValue;

use super::history::HistoryStore;
use super::transport::{ChannelTopic, MessageHook};
use crate::logging::Logger;
use crate::jlog_debug;

/// Shape of an inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{tid, data}`: an application payload tagged with its message id.
    Wrapped { tid: JsonValue, data: JsonValue },
    Raw(JsonValue),
}

impl Envelope {
    /// A payload is wrapped when it is an object with a non-null `tid`.
    pub fn classify(payload: JsonValue) -> Self {
        match payload {
            JsonValue::Object(mut map)
                if map.get("tid").is_some_and(|tid| !tid.is_null()) =>
            {
                let tid = map.remove("tid").unwrap_or_default();
                let data = map.remove("data").unwrap_or_default();
                Envelope::Wrapped { tid, data }
            }
            other => Envelope::Raw(other),
        }
    }
}

/// Records the id of every wrapped message for the channel's topic and hands
/// subscribers the inner payload.
pub struct EnvelopeUnwrapper {
    history: HistoryStore,
    logger: Logger,
}

impl EnvelopeUnwrapper {
    pub fn new(history: HistoryStore, logger: Logger) -> Self {
        Self { history, logger }
    }
}

impl MessageHook for EnvelopeUnwrapper {
    fn on_message(
        &self,
        channel: &dyn ChannelTopic,
        event: &str,
        payload: JsonValue,
        _reference: Option<&str>,
    ) -> JsonValue {
        jlog_debug!(self.logger, "channel", "message {} on {}: {}", event, channel.topic(), payload);
        match Envelope::classify(payload) {
            Envelope::Wrapped { tid, data } => {
                self.history.set(&channel.topic(), &tid);
                data
            }
            Envelope::Raw(payload) => payload,
        }
    }
}
