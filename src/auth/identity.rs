use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::errors::{ensure_valid, Result};
use crate::utils::type_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Socket,
    Channel,
}

/// What a provider is asked to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiationContext {
    pub auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
}

impl NegotiationContext {
    pub fn socket() -> Self {
        Self {
            auth_type: AuthType::Socket,
            channel_name: None,
        }
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Channel,
            channel_name: Some(name.into()),
        }
    }

    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Map::new()))
    }
}

fn into_object(params: JsonValue, owner: &str) -> Result<Map<String, JsonValue>> {
    match params {
        JsonValue::Object(map) => Ok(map),
        other => Err(crate::errors::JwpError::Validation(format!(
            "{} params must resolve to an object, got {}",
            owner,
            type_name(&other)
        ))),
    }
}

fn string_field<'a>(map: &'a Map<String, JsonValue>, field: &str) -> Option<&'a str> {
    map.get(field).and_then(JsonValue::as_str)
}

/// Socket-level credentials, resolved on every connect.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketIdentity {
    pub app_id: String,
    pub auth: String,
    /// Everything the provider returned, `app_id` and `auth` included.
    pub params: Map<String, JsonValue>,
}

impl SocketIdentity {
    pub fn from_params(params: JsonValue) -> Result<Self> {
        let params = into_object(params, "Socket")?;
        let app_id = string_field(&params, "app_id").unwrap_or_default().to_string();
        let auth = string_field(&params, "auth").unwrap_or_default().to_string();
        ensure_valid!(
            !app_id.is_empty(),
            "Socket params must have an app_id (String) property"
        );
        ensure_valid!(
            !auth.is_empty(),
            "Socket params must have an auth (String) property"
        );
        Ok(Self {
            app_id,
            auth,
            params,
        })
    }

    /// Static params handed to the transport.
    pub fn to_params(&self) -> JsonValue {
        JsonValue::Object(self.params.clone())
    }
}

/// Channel-level credentials, resolved on every join. The app id comes from
/// the owning socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelIdentity {
    pub auth: String,
    pub params: Map<String, JsonValue>,
}

impl ChannelIdentity {
    pub fn from_params(params: JsonValue) -> Result<Self> {
        let params = into_object(params, "Channel")?;
        let auth = string_field(&params, "auth").map(str::to_string);
        ensure_valid!(
            auth.is_some(),
            "Channel params must have an auth (String) property"
        );
        Ok(Self {
            auth: auth.unwrap_or_default(),
            params,
        })
    }
}
