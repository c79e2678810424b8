//! Credential providers and negotiation with the auth endpoint.

pub mod http;
pub mod identity;
pub mod negotiator;
pub mod params;

pub use http::{AuthTransport, CallbackTransport, HttpCallback, HttpReply, HttpRequest, ReqwestTransport};
pub use identity::{AuthType, ChannelIdentity, NegotiationContext, SocketIdentity};
pub use negotiator::{fetch_params, xhr_params, xhr_params_with, AuthNegotiator, AuthResponse};
pub use params::{normalize, ParamProvider, ParamSource};
