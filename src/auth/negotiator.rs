use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::http::{AuthTransport, CallbackTransport, HttpReply, HttpRequest, ReqwestTransport};
use super::params::ParamProvider;
use crate::errors::{JwpError, ProtocolError, Result};
use crate::logging::Logger;
use crate::utils::{merge_objects, type_name};
use crate::{jlog_debug, jlog_warn};

/// Decoded answer of the auth endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuthResponse {
    Ok { data: JsonValue },
    Error { error: String },
}

impl AuthResponse {
    /// Decode a raw reply. Only HTTP 200 with a `status` of `ok` or `error`
    /// is a valid answer.
    pub fn decode(url: &str, reply: &HttpReply) -> std::result::Result<Self, ProtocolError> {
        if reply.status != 200 {
            return Err(ProtocolError::HttpStatus {
                url: url.to_string(),
                status: reply.status,
            });
        }

        let body: JsonValue =
            serde_json::from_str(&reply.body).map_err(|e| ProtocolError::MalformedJson {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        match body.get("status").and_then(JsonValue::as_str) {
            Some("ok") | Some("error") => {
                serde_json::from_value(body).map_err(|e| ProtocolError::MalformedJson {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Err(ProtocolError::UnexpectedStatus {
                url: url.to_string(),
                status: body.get("status").map(|s| match s {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            }),
        }
    }

    pub fn into_result(self) -> Result<JsonValue> {
        match self {
            AuthResponse::Ok { data } => Ok(data),
            AuthResponse::Error { error } => Err(ProtocolError::Rejected(error).into()),
        }
    }
}

/// Resolves credentials by POSTing the negotiation context to an endpoint.
///
/// The body is the context, with the fields of an optional seed provider
/// merged over it. The endpoint's `data` is returned untouched; callers
/// validate it.
#[derive(Clone)]
pub struct AuthNegotiator {
    endpoint: String,
    transport: Arc<dyn AuthTransport>,
    seed: Option<ParamProvider>,
    logger: Logger,
}

impl AuthNegotiator {
    /// Negotiator using the reqwest binding.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_transport(endpoint, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(endpoint: impl Into<String>, transport: Arc<dyn AuthTransport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            seed: None,
            logger: Logger::disabled(),
        }
    }

    /// Extra request fields, resolved against the context on every call.
    pub fn with_seed(mut self, seed: ParamProvider) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_body(&self, context: &JsonValue) -> Result<JsonValue> {
        let base = context.as_object().cloned().unwrap_or_default();
        let seed = match &self.seed {
            Some(seed) => match seed.resolve(context).await? {
                JsonValue::Object(map) => map,
                JsonValue::Null => Map::new(),
                other => {
                    return Err(JwpError::Validation(format!(
                        "negotiation seed must resolve to an object, got {}",
                        type_name(&other)
                    )))
                }
            },
            None => Map::new(),
        };
        Ok(JsonValue::Object(merge_objects(base, seed)))
    }

    pub async fn negotiate(&self, context: &JsonValue) -> Result<JsonValue> {
        let body = self.request_body(context).await?;
        jlog_debug!(self.logger, "auth", "negotiating with {}: {}", self.endpoint, body);

        let reply = self
            .transport
            .post(HttpRequest::json(&self.endpoint, &body))
            .await?;

        let result = AuthResponse::decode(&self.endpoint, &reply)
            .map_err(JwpError::from)
            .and_then(AuthResponse::into_result);
        if let Err(e) = &result {
            jlog_warn!(self.logger, "auth", "negotiation with {} failed: {}", self.endpoint, e);
        }
        result
    }

    /// Async provider bound to this endpoint.
    pub fn into_provider(self) -> ParamProvider {
        let negotiator = Arc::new(self);
        ParamProvider::from_async(move |context| {
            let negotiator = negotiator.clone();
            async move { negotiator.negotiate(&context).await }
        })
    }
}

/// Provider that negotiates with `url` over reqwest.
pub fn fetch_params(url: impl Into<String>) -> ParamProvider {
    AuthNegotiator::new(url).into_provider()
}

/// Provider that negotiates with `url` over a callback-style client.
/// Every failure is reported to `on_error` and still returned to the caller.
pub fn xhr_params<E>(url: impl Into<String>, on_error: E) -> ParamProvider
where
    E: Fn(&JwpError) + Send + Sync + 'static,
{
    xhr_params_with(url, CallbackTransport::reqwest(), on_error)
}

/// [`xhr_params`] over a caller-supplied callback client.
pub fn xhr_params_with<E>(
    url: impl Into<String>,
    transport: CallbackTransport,
    on_error: E,
) -> ParamProvider
where
    E: Fn(&JwpError) + Send + Sync + 'static,
{
    let negotiator = Arc::new(AuthNegotiator::with_transport(url, Arc::new(transport)));
    let on_error = Arc::new(on_error);
    ParamProvider::from_async(move |context| {
        let negotiator = negotiator.clone();
        let on_error = on_error.clone();
        async move {
            let result = negotiator.negotiate(&context).await;
            if let Err(e) = &result {
                on_error(e);
            }
            result
        }
    })
}
