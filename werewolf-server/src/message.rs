//! src/message.rs
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::game::assign::RoleCounts;
use crate::game::NightAction;
use crate::types::{PlayerId, RoomId};

/// The wire format: { "type": 1, "target": "...", "arguments": [...] }
#[derive(Debug, Deserialize)]
pub struct Incoming {
    #[serde(rename = "type")]
    pub frame_type: u8, // always 1 for invocation frames
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

/// Canonical outgoing format
#[derive(Debug, Serialize)]
pub struct Outgoing<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub frame_type: u8,
    pub target: &'a str,
    pub arguments: [T; 1], // one payload object per frame
}

impl<'a, T: Serialize> Outgoing<'a, T> {
    pub fn new(target: &'a str, payload: T) -> Self {
        Self {
            frame_type: 1,
            target,
            arguments: [payload],
        }
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Every client → server command the server understands.
#[derive(Debug, PartialEq)]
pub enum ClientEvent {
    CreateRoom { name: String, config: GameConfig },
    JoinRoom { room_id: RoomId, name: String },
    StartGame { roles: RoleCounts },
    NightAction(NightAction),
    Vote { target: PlayerId },
    Duel { target: PlayerId },
    EndSpeech,
    Chat { text: String },
}

fn payload<T: serde::de::DeserializeOwned>(msg: &Incoming, what: &str) -> Result<T, String> {
    let raw = msg
        .arguments
        .first()
        .ok_or_else(|| format!("{what} expects 1 argument"))?;
    serde_json::from_value(raw.clone()).map_err(|e| format!("bad {what} payload: {e}"))
}

/// Parse `Incoming` into typed `ClientEvent`. Unknown targets are an error,
/// never silently dropped.
pub fn to_client_event(msg: Incoming) -> Result<ClientEvent, String> {
    match msg.target.as_str() {
        "createRoom" => {
            #[derive(Deserialize)]
            struct CreatePayload {
                name: String,
                #[serde(default)]
                config: GameConfig,
            }
            let CreatePayload { name, config } = payload(&msg, "createRoom")?;
            Ok(ClientEvent::CreateRoom { name, config })
        }
        "joinRoom" => {
            #[derive(Deserialize)]
            #[serde(rename_all = "camelCase")]
            struct JoinPayload {
                room_id: RoomId,
                name: String,
            }
            let JoinPayload { room_id, name } = payload(&msg, "joinRoom")?;
            Ok(ClientEvent::JoinRoom { room_id, name })
        }
        "startGame" => {
            #[derive(Deserialize)]
            struct StartPayload {
                roles: RoleCounts,
            }
            let StartPayload { roles } = payload(&msg, "startGame")?;
            Ok(ClientEvent::StartGame { roles })
        }
        "nightAction" => Ok(ClientEvent::NightAction(payload(&msg, "nightAction")?)),
        "vote" => Ok(ClientEvent::Vote {
            target: target_of(&msg, "vote")?,
        }),
        "duel" => Ok(ClientEvent::Duel {
            target: target_of(&msg, "duel")?,
        }),
        "endSpeech" => Ok(ClientEvent::EndSpeech),
        "chat" => {
            #[derive(Deserialize)]
            struct ChatPayload {
                text: String,
            }
            let ChatPayload { text } = payload(&msg, "chat")?;
            Ok(ClientEvent::Chat { text })
        }
        other => Err(format!("unknown command {other:?}")),
    }
}

/// `vote` and `duel` accept either a bare id or `{ "target": id }`.
fn target_of(msg: &Incoming, what: &str) -> Result<PlayerId, String> {
    match msg.arguments.first() {
        Some(serde_json::Value::String(id)) => Ok(id.clone()),
        Some(_) => {
            #[derive(Deserialize)]
            struct TargetPayload {
                target: PlayerId,
            }
            let TargetPayload { target } = payload(msg, what)?;
            Ok(target)
        }
        None => Err(format!("{what} expects 1 argument")),
    }
}
