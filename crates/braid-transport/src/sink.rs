//! Outbound send port.

use async_trait::async_trait;

use braid_core::error::Result;
use braid_core::protocol::OutboundQuery;

use crate::status::ConnectionStatus;

/// An abstract outbound message port.
///
/// This trait decouples the interaction controller from the concrete socket
/// so it can be exercised against an in-memory mock. Implementations must
/// reject sends while not connected with [`BraidError::NotConnected`] and
/// must not consume the caller's input when doing so.
///
/// [`BraidError::NotConnected`]: braid_core::BraidError::NotConnected
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Sends one query to the gateway. Fire-and-forget: no acknowledgement
    /// is tracked.
    async fn send(&self, payload: OutboundQuery) -> Result<()>;

    /// The current connection status.
    fn status(&self) -> ConnectionStatus;
}
