//! Real-time transport: wire protocol, the transport seam and the actix
//! websocket actor that implements it.

pub mod protocol;
pub mod session;
pub mod transport;

pub use protocol::{AiMeta, ClientMsg, ServerMsg};
pub use transport::{Transport, TransportError};
