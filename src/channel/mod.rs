//! Real-time interview channel
//!
//! - `messages`: the inbound `SessionMessage` union
//! - `transport`: the `ChannelTransport` seam and its factory
//! - `websocket` / `nats`: transport implementations
//! - `session_channel`: connect with backoff, decode, close

pub mod messages;
pub mod nats;
pub mod session_channel;
pub mod transport;
pub mod websocket;

pub use messages::SessionMessage;
pub use nats::NatsTransport;
pub use session_channel::{ChannelEvent, ReconnectPolicy, SessionChannel};
pub use transport::{ChannelTransport, InboundFrame, TransportFactory, TransportKind};
pub use websocket::WebSocketTransport;
