//! In-memory stand-in for the real-time transport.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use jwp_client::realtime::{ChannelTopic, JoinPayloadBuilder, MessageHook, TransportChannel, TransportSocket};
use jwp_client::{JwpError, Result};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

#[derive(Default)]
pub struct MockSocket {
    pub params: Mutex<Option<Value>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub fail_connect: Mutex<Option<String>>,
}

impl MockSocket {
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn params(&self) -> Option<Value> {
        self.params.lock().clone()
    }
}

#[async_trait]
impl TransportSocket for MockSocket {
    type Channel = MockChannel;

    fn set_params(&self, params: Value) {
        *self.params.lock() = Some(params);
    }

    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.fail_connect.lock().clone() {
            Some(reason) => Err(JwpError::Transport(reason)),
            None => Ok(()),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn channel(&self, topic: &str) -> MockChannel {
        MockChannel {
            topic: RwLock::new(topic.to_string()),
            builder: Mutex::new(None),
            hook: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            left: AtomicUsize::new(0),
        }
    }
}

pub struct MockChannel {
    topic: RwLock<String>,
    builder: Mutex<Option<Arc<dyn JoinPayloadBuilder>>>,
    hook: Mutex<Option<Arc<dyn MessageHook>>>,
    /// (topic, payload) of every join that went out
    pub sent: Mutex<Vec<(String, Value)>>,
    pub left: AtomicUsize,
}

impl MockChannel {
    pub fn leave_count(&self) -> usize {
        self.left.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().clone()
    }

    /// Push an inbound message through the installed hook, returning what a
    /// subscriber would see.
    pub fn deliver(&self, event: &str, payload: Value) -> Value {
        let hook = self.hook.lock().clone();
        match hook {
            Some(hook) => hook.on_message(self, event, payload, Some("1")),
            None => payload,
        }
    }
}

impl ChannelTopic for MockChannel {
    fn topic(&self) -> String {
        self.topic.read().clone()
    }

    fn set_topic(&self, topic: &str) {
        *self.topic.write() = topic.to_string();
    }
}

#[derive(Debug, PartialEq)]
pub struct MockPresence {
    pub topic: String,
}

#[async_trait]
impl TransportChannel for MockChannel {
    type Presence = MockPresence;

    fn set_join_builder(&self, builder: Arc<dyn JoinPayloadBuilder>) {
        *self.builder.lock() = Some(builder);
    }

    fn set_message_hook(&self, hook: Arc<dyn MessageHook>) {
        *self.hook.lock() = Some(hook);
    }

    async fn join(&self) -> Result<()> {
        let builder = self.builder.lock().clone();
        let payload = match builder {
            Some(builder) => builder.build_join_payload(self).await?,
            None => Value::Null,
        };
        self.sent.lock().push((self.topic(), payload));
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        self.left.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn presence(&self) -> MockPresence {
        MockPresence { topic: self.topic() }
    }
}
