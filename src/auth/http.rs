//! HTTP bindings used to reach the auth endpoint.
//!
//! Two bindings share one request/response contract: [`ReqwestTransport`]
//! awaits the response directly, [`CallbackTransport`] hands a completion
//! callback to a callback-style client and awaits that callback.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use tokio::sync::oneshot;

use crate::errors::{JwpError, Result};

/// A negotiation request, already JSON-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// `POST url` with a JSON body and JSON accept/content-type headers.
    pub fn json(url: &str, body: &JsonValue) -> Self {
        Self {
            url: url.to_string(),
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Narrow contract consumed by the negotiator: post a request, get the raw
/// status and body back. Network failures are [`JwpError::Transport`].
#[async_trait]
pub trait AuthTransport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<HttpReply>;
}

// ---------------------------------------------------------------------------
// Promise-style binding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpReply> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

// ---------------------------------------------------------------------------
// Callback-style binding
// ---------------------------------------------------------------------------

/// Completion callback; must be called at most once.
pub type HttpCallback = Box<dyn FnOnce(Result<HttpReply>) + Send>;

type SendFn = dyn Fn(HttpRequest, HttpCallback) + Send + Sync;

#[derive(Clone)]
pub struct CallbackTransport {
    send: Arc<SendFn>,
}

impl CallbackTransport {
    /// Wrap a callback-style client. Dropping the callback without calling
    /// it fails the negotiation with a transport error.
    pub fn new<F>(send: F) -> Self
    where
        F: Fn(HttpRequest, HttpCallback) + Send + Sync + 'static,
    {
        Self {
            send: Arc::new(send),
        }
    }

    /// Callback client driven by reqwest on the current tokio runtime.
    pub fn reqwest() -> Self {
        let transport = ReqwestTransport::new();
        Self::new(move |request, done| {
            let transport = transport.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        done(transport.post(request).await);
                    });
                }
                Err(e) => done(Err(JwpError::transport(e))),
            }
        })
    }
}

impl fmt::Debug for CallbackTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackTransport(..)")
    }
}

#[async_trait]
impl AuthTransport for CallbackTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpReply> {
        let (tx, rx) = oneshot::channel();
        (self.send)(
            request,
            Box::new(move |reply| {
                let _ = tx.send(reply);
            }),
        );
        rx.await.map_err(|_| {
            JwpError::Transport("auth request callback dropped without completing".into())
        })?
    }
}
