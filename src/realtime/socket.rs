use std::sync::Arc;

use parking_lot::RwLock;

use super::channel::{Channel, JoinNegotiation};
use super::envelope::EnvelopeUnwrapper;
use super::history::HistoryStore;
use super::transport::{TransportChannel, TransportSocket};
use crate::auth::params::require_params;
use crate::auth::{NegotiationContext, ParamProvider, ParamSource, SocketIdentity};
use crate::config::ClientConfig;
use crate::errors::Result;
use crate::{jlog_debug, jlog_info, jlog_warn};

struct SocketInner<T> {
    transport: T,
    provider: ParamProvider,
    identity: Arc<RwLock<Option<SocketIdentity>>>,
    history: HistoryStore,
    config: ClientConfig,
}

/// Authenticating wrapper around a transport socket.
///
/// Every [`Socket::connect`] negotiates socket credentials from scratch
/// before delegating, so the transport's reconnection scheduler should
/// re-enter through it to pick up rotated credentials. Clones share state.
pub struct Socket<T: TransportSocket> {
    inner: Arc<SocketInner<T>>,
}

impl<T: TransportSocket> Clone for Socket<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: TransportSocket> Socket<T> {
    /// Wrap `transport` without connecting. Fails before any network
    /// activity when `params` is missing or null.
    pub fn new(transport: T, params: impl Into<ParamSource>, config: ClientConfig) -> Result<Self> {
        let provider = require_params(params.into(), "Socket")?;
        let history = HistoryStore::from_config(&config);
        Ok(Self {
            inner: Arc::new(SocketInner {
                transport,
                provider,
                identity: Arc::new(RwLock::new(None)),
                history,
                config,
            }),
        })
    }

    /// Negotiate socket credentials, then connect the transport with them.
    ///
    /// Nothing is recorded and the transport is not touched when
    /// negotiation or validation fails.
    pub async fn connect(&self) -> Result<SocketIdentity> {
        let logger = &self.inner.config.logger;
        let context = NegotiationContext::socket().to_value();

        let identity = self
            .inner
            .provider
            .call(&context, |params| {
                jlog_debug!(logger, "socket", "socket params {}", params);
                SocketIdentity::from_params(params)
            })
            .await
            .inspect_err(|e| jlog_warn!(logger, "socket", "socket negotiation failed: {}", e))?;

        *self.inner.identity.write() = Some(identity.clone());
        self.inner.transport.set_params(identity.to_params());
        self.inner.transport.connect().await?;

        jlog_info!(logger, "socket", "connected as app {}", identity.app_id);
        Ok(identity)
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.inner.transport.disconnect().await
    }

    /// Identity resolved by the most recent successful negotiation.
    pub fn identity(&self) -> Option<SocketIdentity> {
        self.inner.identity.read().clone()
    }

    /// Create a channel named `name`. Its topic stays a placeholder until a
    /// join resolves `namespace:app_id:name`.
    pub fn channel(
        &self,
        name: impl Into<String>,
        params: impl Into<ParamSource>,
    ) -> Result<Channel<T::Channel>> {
        let provider = require_params(params.into(), "Channel")?;
        let name = name.into();
        let config = &self.inner.config;

        let transport = self.inner.transport.channel(&config.placeholder_topic);
        let negotiation = Arc::new(JoinNegotiation::new(
            name.clone(),
            config.namespace.clone(),
            provider,
            self.inner.identity.clone(),
            self.inner.history.clone(),
            config.logger.clone(),
        ));
        transport.set_join_builder(negotiation.clone());
        transport.set_message_hook(Arc::new(EnvelopeUnwrapper::new(
            self.inner.history.clone(),
            config.logger.clone(),
        )));

        jlog_debug!(config.logger, "socket", "created channel {}", name);
        Ok(Channel::new(name, transport, negotiation))
    }

    pub fn history(&self) -> &HistoryStore {
        &self.inner.history
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Turn on diagnostic logging for this socket and its channels.
    pub fn enable_debug(&self) {
        self.inner.config.logger.enable_debug();
    }
}

/// Build a [`Socket`] and connect it at once.
pub async fn connect<T: TransportSocket>(
    transport: T,
    params: impl Into<ParamSource>,
    config: ClientConfig,
) -> Result<Socket<T>> {
    let socket = Socket::new(transport, params, config)?;
    socket.connect().await?;
    Ok(socket)
}
