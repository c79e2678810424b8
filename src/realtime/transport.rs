//! Contract of the underlying real-time transport.
//!
//! The transport (socket framing, heartbeats, reconnection scheduling,
//! presence diffs) lives outside this crate. Wrappers hold a transport value
//! and talk to it only through these traits; behavior that used to be
//! patched into transport objects is expressed as hooks the transport calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::errors::Result;

/// Mutable topic of a transport channel. The transport reads it at the last
/// moment before every frame it sends.
pub trait ChannelTopic: Send + Sync {
    fn topic(&self) -> String;

    fn set_topic(&self, topic: &str);
}

/// Computes the join payload.
///
/// Installed once per channel. The transport calls it immediately before
/// every join-send, the first join and every rejoin alike, and sends the
/// returned payload under whatever topic the channel carries afterwards.
/// When it returns an error the transport must not send the join.
#[async_trait]
pub trait JoinPayloadBuilder: Send + Sync {
    async fn build_join_payload(&self, channel: &dyn ChannelTopic) -> Result<JsonValue>;
}

/// Inbound hook. The returned value is what subscribers receive.
pub trait MessageHook: Send + Sync {
    fn on_message(
        &self,
        channel: &dyn ChannelTopic,
        event: &str,
        payload: JsonValue,
        reference: Option<&str>,
    ) -> JsonValue;
}

#[async_trait]
pub trait TransportChannel: ChannelTopic {
    /// Presence capability bound to this channel.
    type Presence;

    fn set_join_builder(&self, builder: Arc<dyn JoinPayloadBuilder>);

    fn set_message_hook(&self, hook: Arc<dyn MessageHook>);

    async fn join(&self) -> Result<()>;

    async fn leave(&self) -> Result<()>;

    fn presence(&self) -> Self::Presence;
}

#[async_trait]
pub trait TransportSocket: Send + Sync {
    type Channel: TransportChannel;

    /// Replace the static params sent with the next connection attempt.
    fn set_params(&self, params: JsonValue);

    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    fn channel(&self, topic: &str) -> Self::Channel;
}
