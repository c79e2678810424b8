//! Authenticated, namespaced and resumable pub/sub channels layered over a
//! topic-multiplexing real-time transport.
//!
//! The transport itself is supplied by the caller through the traits in
//! [`realtime::transport`]. This crate negotiates socket and channel
//! credentials with an auth endpoint, derives `jwp:<app_id>:<channel>`
//! topics at join time, and keeps the last seen message id per topic so
//! rejoins resume where they left off.

pub mod auth;
pub mod config;
pub mod errors;
pub mod logging;
pub mod realtime;
pub mod storage;
pub mod utils;

pub use auth::{fetch_params, xhr_params, ParamProvider, ParamSource};
pub use config::ClientConfig;
pub use errors::{ErrorKind, JwpError, ProtocolError, Result};
pub use logging::{LogConfig, LogLevel, Logger};
pub use realtime::{connect, Channel, HistoryStore, Socket};
pub use storage::{FileBackend, KeyValueBackend, MemoryBackend};
