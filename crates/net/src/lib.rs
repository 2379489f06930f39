//! Matchday gateway transport
//!
//! Length-prefixed JSON frames over TCP between the bot and the chat
//! gateway. The gateway owns everything chat-platform-specific; this crate
//! only speaks the gateway protocol.

pub mod client;
pub mod error;
pub mod frame;
pub mod protocol;

pub use client::{GatewayClient, GatewayEvent};
pub use error::{Error, Result};
pub use protocol::{Button, GatewayMessage, SenderInfo};
