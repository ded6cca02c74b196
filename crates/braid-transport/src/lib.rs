//! WebSocket transport adapter for the chat gateway.
//!
//! The adapter owns the socket: a reader task decodes inbound frames into
//! protocol events and forwards them over a channel, a writer task encodes
//! outbound queries, and a watch channel publishes the connection status the
//! UI gates on. The rest of the client only sees the [`MessageSink`] port
//! and the inbound event channel.

mod sink;
mod status;
mod ws;

pub use sink::MessageSink;
pub use status::ConnectionStatus;
pub use ws::{InboundEvent, WsTransport, connect};
