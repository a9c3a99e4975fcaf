//! src/message.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::SetupError;
use crate::game::engine::GameSettings;
use crate::game::role::RoleDistribution;
use crate::types::DEFAULT_PLAYER_COUNT;

/// The wire format: { "type": 1, "target": "...", "arguments": [...] }
#[derive(Debug, Deserialize)]
pub struct Incoming {
    #[serde(rename = "type")]
    pub frame_type: u8, // always 1 for invocation frames
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// Canonical outgoing format.
#[derive(Debug, Serialize)]
pub struct Outgoing<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub frame_type: u8,
    pub target: &'a str,
    pub arguments: [T; 1], // always a single payload object
}

impl<'a, T: Serialize> Outgoing<'a, T> {
    pub fn new(target: &'a str, payload: T) -> Self {
        Self {
            frame_type: 1,
            target,
            arguments: [payload],
        }
    }
}

/// Serializes one server → client frame.
pub fn encode<T: Serialize>(target: &str, payload: T) -> serde_json::Result<String> {
    serde_json::to_string(&Outgoing::new(target, payload))
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("`{0}` expects an argument")]
    MissingArgument(&'static str),

    #[error("bad `{target}` payload: {source}")]
    BadPayload {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("answers must be a string or a number")]
    BadAnswer,
}

fn default_player_count() -> usize {
    DEFAULT_PLAYER_COUNT
}

fn default_use_ai() -> bool {
    true
}

/// `startGame` payload as the browser sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGamePayload {
    #[serde(default)]
    pub player_name: String,
    #[serde(default = "default_player_count")]
    pub player_count: usize,
    #[serde(default = "default_use_ai", rename = "useAI")]
    pub use_ai: bool,
    #[serde(default)]
    pub role_distribution: Option<BTreeMap<String, usize>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StartGamePayload {
    /// Role names are checked here; counts are checked by the engine.
    pub fn into_settings(self) -> Result<GameSettings, SetupError> {
        let role_distribution = self
            .role_distribution
            .as_ref()
            .map(RoleDistribution::from_named)
            .transpose()?;
        Ok(GameSettings {
            player_name: self.player_name,
            player_count: self.player_count,
            use_ai: self.use_ai,
            role_distribution,
            seed: self.seed,
        })
    }
}

/// Known client → server events.
#[derive(Debug, PartialEq)]
pub enum ClientEvent {
    StartGame(StartGamePayload),
    Answer(String),
    Reset,
    RawUnknown(String), // unrecognised target
}

pub fn parse_frame(raw: &str) -> Result<ClientEvent, FrameError> {
    let incoming: Incoming = serde_json::from_str(raw)?;
    to_client_event(incoming)
}

/// Parse `Incoming` into a typed `ClientEvent`.
pub fn to_client_event(msg: Incoming) -> Result<ClientEvent, FrameError> {
    match msg.target.as_str() {
        "startGame" => {
            let payload = msg
                .arguments
                .into_iter()
                .next()
                .unwrap_or_else(|| Value::Object(Default::default()));
            let payload = serde_json::from_value(payload).map_err(|source| {
                FrameError::BadPayload {
                    target: "startGame",
                    source,
                }
            })?;
            Ok(ClientEvent::StartGame(payload))
        }
        "answer" => {
            let value = msg
                .arguments
                .into_iter()
                .next()
                .ok_or(FrameError::MissingArgument("answer"))?;
            match value {
                Value::String(text) => Ok(ClientEvent::Answer(text)),
                Value::Number(n) => Ok(ClientEvent::Answer(n.to_string())),
                _ => Err(FrameError::BadAnswer),
            }
        }
        "reset" => Ok(ClientEvent::Reset),
        _ => Ok(ClientEvent::RawUnknown(msg.target)),
    }
}
