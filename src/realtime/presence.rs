use super::channel::Channel;
use super::transport::TransportChannel;

impl<C: TransportChannel> Channel<C> {
    /// Presence tracking for this channel, provided by the transport.
    pub fn presence(&self) -> C::Presence {
        self.transport().presence()
    }
}
