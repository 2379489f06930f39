//! Gateway protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire. The
//! gateway translates between these and whatever the chat platform speaks;
//! the bot never sees platform encodings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who sent a command or pressed a button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    /// Display name as the chat shows it
    pub name: String,
    /// Stable handle, unique within a chat
    pub handle: String,
}

/// One inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    /// Opaque payload echoed back in a Callback when pressed
    pub data: String,
}

/// Gateway protocol messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayMessage {
    /// Bot authenticates against the gateway
    Register { token: String },

    /// Gateway accepted the registration; updates will flow
    Registered,

    /// Gateway rejected the registration
    Rejected { reason: String },

    /// A slash command arrived from a chat
    Command {
        chat_id: i64,
        chat_title: String,
        sender: SenderInfo,
        command: String,
        args: String,
        update_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A keyboard button was pressed
    Callback {
        chat_id: i64,
        message_ref: i64,
        sender: SenderInfo,
        data: String,
        update_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Post a new message; the gateway answers with MessagePosted
    SendMessage {
        correlation: Uuid,
        chat_id: i64,
        text: String,
        #[serde(default)]
        keyboard: Vec<Vec<Button>>,
    },

    /// Rewrite an existing message in place
    EditMessage {
        chat_id: i64,
        message_ref: i64,
        text: String,
        #[serde(default)]
        keyboard: Vec<Vec<Button>>,
    },

    /// Pin a message in its chat
    PinMessage { chat_id: i64, message_ref: i64 },

    /// Ack for a SendMessage, carrying the posted message ref
    MessagePosted {
        correlation: Uuid,
        chat_id: i64,
        message_ref: i64,
    },

    /// Keep the connection alive
    Ping,

    /// Response to ping
    Pong,
}

impl GatewayMessage {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
