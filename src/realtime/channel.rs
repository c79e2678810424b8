use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value as JsonValue};

use super::history::HistoryStore;
use super::transport::{ChannelTopic, JoinPayloadBuilder, TransportChannel};
use crate::auth::{ChannelIdentity, NegotiationContext, ParamProvider, SocketIdentity};
use crate::errors::{JwpError, Result};
use crate::logging::{LogEntry, LogLevel, Logger};
use crate::utils::merge_objects;

/// `namespace:app_id:channel_name`
pub fn topic_for(namespace: &str, app_id: &str, channel_name: &str) -> String {
    format!("{}:{}:{}", namespace, app_id, channel_name)
}

/// Join payload builder installed on every channel.
///
/// Each run negotiates fresh channel credentials, derives the topic from the
/// socket's current app id, assigns it, and reads the current last message
/// id. Nothing is carried over from a previous join attempt.
pub struct JoinNegotiation {
    channel_name: String,
    namespace: String,
    provider: ParamProvider,
    socket_identity: Arc<RwLock<Option<SocketIdentity>>>,
    history: HistoryStore,
    logger: Logger,
}

impl JoinNegotiation {
    pub(crate) fn new(
        channel_name: String,
        namespace: String,
        provider: ParamProvider,
        socket_identity: Arc<RwLock<Option<SocketIdentity>>>,
        history: HistoryStore,
        logger: Logger,
    ) -> Self {
        Self {
            channel_name,
            namespace,
            provider,
            socket_identity,
            history,
            logger,
        }
    }

    fn app_id(&self) -> Result<String> {
        self.socket_identity
            .read()
            .as_ref()
            .map(|identity| identity.app_id.clone())
            .ok_or_else(|| {
                JwpError::Validation(format!(
                    "cannot join {:?}: the socket has no resolved app_id, connect first",
                    self.channel_name
                ))
            })
    }
}

#[async_trait]
impl JoinPayloadBuilder for JoinNegotiation {
    async fn build_join_payload(&self, channel: &dyn ChannelTopic) -> Result<JsonValue> {
        let context = NegotiationContext::channel(&self.channel_name).to_value();
        let identity = self
            .provider
            .call(&context, ChannelIdentity::from_params)
            .await?;

        let topic = topic_for(&self.namespace, &self.app_id()?, &self.channel_name);
        channel.set_topic(&topic);

        let last_message_id = self.history.get(&topic).unwrap_or(JsonValue::Null);
        self.logger.log_entry(
            LogEntry::new(
                LogLevel::Debug,
                format!("joining with last_message_id {}", last_message_id),
            )
            .with_target("channel")
            .with_topic(topic.as_str()),
        );

        let mut base = Map::new();
        base.insert("last_message_id".into(), last_message_id);
        Ok(JsonValue::Object(merge_objects(base, identity.params)))
    }
}

/// A transport channel whose topic and join payload are resolved at join
/// time. Created through [`crate::realtime::Socket::channel`].
pub struct Channel<C: TransportChannel> {
    name: String,
    transport: C,
    negotiation: Arc<JoinNegotiation>,
}

impl<C: TransportChannel> Channel<C> {
    pub(crate) fn new(name: String, transport: C, negotiation: Arc<JoinNegotiation>) -> Self {
        Self {
            name,
            transport,
            negotiation,
        }
    }

    /// Name given at creation, without namespace or app id.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current topic; the placeholder until the first join resolves it.
    pub fn topic(&self) -> String {
        self.transport.topic()
    }

    pub async fn join(&self) -> Result<()> {
        self.transport.join().await
    }

    pub async fn leave(&self) -> Result<()> {
        self.transport.leave().await
    }

    /// Run the join negotiation without sending anything.
    pub async fn join_payload(&self) -> Result<JsonValue> {
        self.negotiation.build_join_payload(&self.transport).await
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }
}

impl<C: TransportChannel> std::fmt::Debug for Channel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("topic", &self.topic())
            .finish()
    }
}
