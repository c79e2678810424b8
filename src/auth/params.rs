use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value as JsonValue;

use crate::errors::{JwpError, Result};

type SyncFn = dyn Fn(&JsonValue) -> Result<JsonValue> + Send + Sync;
type AsyncFn = dyn Fn(JsonValue) -> BoxFuture<'static, Result<JsonValue>> + Send + Sync;

/// Source of credentials, tagged by calling convention.
///
/// The caller picks the variant; nothing is inferred from the shape of the
/// function. Cloning shares the underlying function.
#[derive(Clone)]
pub enum ParamProvider {
    /// Computes params directly from the negotiation context.
    Sync(Arc<SyncFn>),
    /// Resolves params later, e.g. after an HTTP round trip.
    Async(Arc<AsyncFn>),
}

impl ParamProvider {
    /// Provider that ignores the context and always yields `value`.
    pub fn constant(value: JsonValue) -> Self {
        Self::sync(move |_ctx| Ok(value.clone()))
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&JsonValue) -> Result<JsonValue> + Send + Sync + 'static,
    {
        ParamProvider::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(JsonValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonValue>> + Send + 'static,
    {
        ParamProvider::Async(Arc::new(move |ctx: JsonValue| f(ctx).boxed()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, ParamProvider::Async(_))
    }

    /// Resolve the params for `context`.
    pub async fn resolve(&self, context: &JsonValue) -> Result<JsonValue> {
        match self {
            ParamProvider::Sync(f) => f(context),
            ParamProvider::Async(f) => f(context.clone()).await,
        }
    }

    /// Resolve the params and hand them to `next`, exactly once. When the
    /// provider fails, `next` is not invoked and the error is returned.
    pub async fn call<T, F>(&self, context: &JsonValue, next: F) -> Result<T>
    where
        F: FnOnce(JsonValue) -> Result<T>,
    {
        let params = self.resolve(context).await?;
        next(params)
    }
}

impl fmt::Debug for ParamProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamProvider::Sync(_) => f.write_str("ParamProvider::Sync(..)"),
            ParamProvider::Async(_) => f.write_str("ParamProvider::Async(..)"),
        }
    }
}

/// Normalize a constant into a provider.
pub fn normalize(value: JsonValue) -> ParamProvider {
    ParamProvider::constant(value)
}

impl From<JsonValue> for ParamProvider {
    fn from(value: JsonValue) -> Self {
        normalize(value)
    }
}

/// What a caller hands to a socket or channel constructor: nothing, a
/// constant, or a provider.
#[derive(Debug, Clone)]
pub enum ParamSource {
    Missing,
    Value(JsonValue),
    Provider(ParamProvider),
}

impl ParamSource {
    pub fn into_provider(self) -> Option<ParamProvider> {
        match self {
            ParamSource::Missing => None,
            ParamSource::Value(value) => Some(normalize(value)),
            ParamSource::Provider(provider) => Some(provider),
        }
    }
}

impl From<JsonValue> for ParamSource {
    fn from(value: JsonValue) -> Self {
        ParamSource::Value(value)
    }
}

impl From<ParamProvider> for ParamSource {
    fn from(provider: ParamProvider) -> Self {
        ParamSource::Provider(provider)
    }
}

impl<T: Into<ParamSource>> From<Option<T>> for ParamSource {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamSource::Missing)
    }
}

/// Turn constructor params into a provider, rejecting missing or null ones
/// before anything touches the network.
pub(crate) fn require_params(source: ParamSource, owner: &str) -> Result<ParamProvider> {
    match source {
        ParamSource::Missing => Err(JwpError::Configuration(format!(
            "{owner} params are not defined."
        ))),
        ParamSource::Value(JsonValue::Null) => Err(JwpError::Configuration(format!(
            "{owner} params must not be null."
        ))),
        ParamSource::Value(value) => Ok(normalize(value)),
        ParamSource::Provider(provider) => Ok(provider),
    }
}
