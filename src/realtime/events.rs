use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AnnouncementPayload, SnapshotEntry};

pub const DISPLAY_BOARDS_GROUP: &str = "display_boards";

pub fn announcement_group(id: Uuid) -> String {
    format!("announcement_{}", id)
}

/// Server → board messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    AnnouncementReady {
        announcement: AnnouncementPayload,
    },
    CurrentAnnouncements {
        announcements: Vec<SnapshotEntry>,
    },
}

/// Board → server requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    GetCurrent,
    Subscribe { announcement_id: Uuid },
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    Message(ClientMessage),
    /// Well-formed JSON with a `type` this server does not handle.
    Unknown(String),
    Malformed(String),
}

impl ClientMessage {
    pub fn parse(text: &str) -> ParseOutcome {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => return ParseOutcome::Malformed(format!("Invalid JSON: {}", e)),
        };

        let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
            return ParseOutcome::Malformed("Missing message type".to_string());
        };

        match kind {
            "get_current" => ParseOutcome::Message(ClientMessage::GetCurrent),
            "subscribe" => {
                let id = value
                    .get("announcement_id")
                    .and_then(|v| match v {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Null => None,
                        other => Some(other.to_string()),
                    });
                match id.as_deref().map(Uuid::parse_str) {
                    Some(Ok(announcement_id)) => {
                        ParseOutcome::Message(ClientMessage::Subscribe { announcement_id })
                    }
                    Some(Err(_)) => ParseOutcome::Malformed(format!(
                        "Invalid announcement id: {}",
                        id.unwrap_or_default()
                    )),
                    None => ParseOutcome::Malformed("subscribe without announcement_id".to_string()),
                }
            }
            other => ParseOutcome::Unknown(other.to_string()),
        }
    }
}
