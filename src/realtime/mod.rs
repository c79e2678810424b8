//! Authenticated, resumable channels over a pluggable real-time transport.
//!
//! Provides the socket and channel wrappers, the join negotiation that
//! derives `namespace:app_id:channel` topics, message-id history for
//! resumption, and the inbound envelope unwrapper.

pub mod channel;
pub mod envelope;
pub mod history;
pub mod presence;
pub mod socket;
pub mod transport;

// Re-export main types for convenience
pub use channel::{topic_for, Channel, JoinNegotiation};
pub use envelope::{Envelope, EnvelopeUnwrapper};
pub use history::HistoryStore;
pub use socket::{connect, Socket};
pub use transport::{ChannelTopic, JoinPayloadBuilder, MessageHook, TransportChannel, TransportSocket};
