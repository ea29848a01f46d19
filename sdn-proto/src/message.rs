//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// The closed set of wire message types. Receivers must
/// reject anything outside this set with an `ERROR` reply and tear down
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "REGISTER")]
    Register,
    #[serde(rename = "REGISTER_ACK")]
    RegisterAck,
    #[serde(rename = "HEARTBEAT")]
    Heartbeat,
    #[serde(rename = "HEARTBEAT_ACK")]
    HeartbeatAck,
    #[serde(rename = "DISCONNECT")]
    Disconnect,
    #[serde(rename = "NEIGHBOR_UPDATE")]
    NeighborUpdate,
    #[serde(rename = "LINK_STATE")]
    LinkState,
    #[serde(rename = "TOPOLOGY_UPDATE")]
    TopologyUpdate,
    #[serde(rename = "ROUTE_UPDATE")]
    RouteUpdate,
    #[serde(rename = "ROUTE_REQUEST")]
    RouteRequest,
    #[serde(rename = "ROUTE_RESPONSE")]
    RouteResponse,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "NACK")]
    Nack,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageType::Register => "REGISTER",
            MessageType::RegisterAck => "REGISTER_ACK",
            MessageType::Heartbeat => "HEARTBEAT",
            MessageType::HeartbeatAck => "HEARTBEAT_ACK",
            MessageType::Disconnect => "DISCONNECT",
            MessageType::NeighborUpdate => "NEIGHBOR_UPDATE",
            MessageType::LinkState => "LINK_STATE",
            MessageType::TopologyUpdate => "TOPOLOGY_UPDATE",
            MessageType::RouteUpdate => "ROUTE_UPDATE",
            MessageType::RouteRequest => "ROUTE_REQUEST",
            MessageType::RouteResponse => "ROUTE_RESPONSE",
            MessageType::Error => "ERROR",
            MessageType::Nack => "NACK",
        };
        write!(f, "{s}")
    }
}

/// The control-plane wire message envelope.
///
/// `payload` is kept as a loosely-typed [`Value`] rather than an enum tied
/// one-to-one with [`MessageType`]: the schema of each payload is small and
/// closed per type, but the envelope itself carries no static link between
/// `type` and the shape of `payload` (receivers branch on `msg_type` and
/// then pull the fields they expect), matching the dynamically-typed
/// envelope in the source protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub sender: String,
    pub receiver: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        msg_type: MessageType,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        payload: Value,
    ) -> Self {
        Message {
            msg_type,
            sender: sender.into(),
            receiver: receiver.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Serializes the message as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Error::Encode)
    }

    /// Serializes the message to bytes with the `\n` line delimiter
    /// appended, ready to write to a socket.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = self.to_json()?.into_bytes();
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parses a single JSON line (without the delimiter) into a message.
    pub fn from_json(line: &str) -> Result<Self, Error> {
        serde_json::from_str(line.trim()).map_err(Error::Decode)
    }

    /// Parses a delimited line of bytes into a message.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let line = std::str::from_utf8(data).map_err(|_| Error::InvalidUtf8)?;
        Self::from_json(line)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message({}, {} -> {})", self.msg_type, self.sender, self.receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_bytes() {
        let msg = Message::new(
            MessageType::Heartbeat,
            "R1",
            "CONTROLLER",
            json!({}),
        );
        let bytes = msg.to_bytes().unwrap();
        assert_eq!(*bytes.last().unwrap(), b'\n');
        let decoded = Message::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(decoded.msg_type, MessageType::Heartbeat);
        assert_eq!(decoded.sender, "R1");
        assert_eq!(decoded.receiver, "CONTROLLER");
    }

    #[test]
    fn type_names_match_wire_values() {
        assert_eq!(serde_json::to_string(&MessageType::Register).unwrap(), "\"REGISTER\"");
        assert_eq!(serde_json::to_string(&MessageType::RouteResponse).unwrap(), "\"ROUTE_RESPONSE\"");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let line = r#"{"type":"BOGUS","sender":"a","receiver":"b","payload":{},"timestamp":"2024-01-01T00:00:00Z"}"#;
        assert!(Message::from_json(line).is_err());
    }
}
