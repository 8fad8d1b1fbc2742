use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Result, ViewerError};

/// Identifier of a dish being watched. Opaque to the presence core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DishId(Uuid);

impl DishId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DishId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for DishId {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ViewerError::InvalidDishId(format!("{}: {}", s, e)))
    }
}

impl fmt::Display for DishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one live transport connection.
///
/// Never empty: an empty id is a caller bug and is rejected at construction,
/// so the tracker itself can treat every id as valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ViewerError::InvalidConnectionId);
        }
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notification sent to a dish's audience whenever its viewer count changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCountUpdate {
    pub dish_id: DishId,
    pub viewer_count: usize,
}

impl ViewerCountUpdate {
    pub fn new(dish_id: DishId, viewer_count: usize) -> Self {
        Self { dish_id, viewer_count }
    }
}

/// Frames a client may send over the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    StartViewing { dish_id: DishId },
    #[serde(rename_all = "camelCase")]
    StopViewing { dish_id: DishId },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ViewerError::InvalidMessage(e.to_string()))
    }
}

/// Frames the hub pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    ViewerCountUpdated(ViewerCountUpdate),
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ViewerError::InvalidMessage(e.to_string()))
    }
}

impl From<ViewerCountUpdate> for ServerMessage {
    fn from(update: ViewerCountUpdate) -> Self {
        ServerMessage::ViewerCountUpdated(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_rejects_blank() {
        assert_eq!(ConnectionId::new(""), Err(ViewerError::InvalidConnectionId));
        assert_eq!(ConnectionId::new("  "), Err(ViewerError::InvalidConnectionId));
        assert_eq!(ConnectionId::new("conn-1").unwrap().as_str(), "conn-1");
    }

    #[test]
    fn test_dish_id_parse() {
        let id: DishId = "6f1c2a3e-0b7d-4a55-9f0e-1b2c3d4e5f60".parse().unwrap();
        assert_eq!(id.to_string(), "6f1c2a3e-0b7d-4a55-9f0e-1b2c3d4e5f60");

        let err = "not-a-uuid".parse::<DishId>().unwrap_err();
        assert!(matches!(err, ViewerError::InvalidDishId(_)));
    }

    #[test]
    fn test_client_message_wire_format() {
        let msg = ClientMessage::parse(
            r#"{"type":"startViewing","dishId":"6f1c2a3e-0b7d-4a55-9f0e-1b2c3d4e5f60"}"#,
        )
        .unwrap();
        let expected: DishId = "6f1c2a3e-0b7d-4a55-9f0e-1b2c3d4e5f60".parse().unwrap();
        assert_eq!(msg, ClientMessage::StartViewing { dish_id: expected });

        assert!(ClientMessage::parse(r#"{"type":"startViewing"}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type":"dance","dishId":"x"}"#).is_err());
    }

    #[test]
    fn test_viewer_count_update_wire_format() {
        let dish: DishId = "6f1c2a3e-0b7d-4a55-9f0e-1b2c3d4e5f60".parse().unwrap();
        let json = ServerMessage::from(ViewerCountUpdate::new(dish, 3)).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "viewerCountUpdated");
        assert_eq!(value["dishId"], "6f1c2a3e-0b7d-4a55-9f0e-1b2c3d4e5f60");
        assert_eq!(value["viewerCount"], 3);
    }
}
