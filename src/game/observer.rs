//! Notifications the engine pushes to whatever renders the game.
use serde::Serialize;

use crate::types::{Phase, Player, PlayerId, Role, Winner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageCategory {
    Title,
    Warning,
    Error,
    Success,
    Info,
    Player,
    Night,
    Day,
    Role,
    Action,
    Dead,
    System,
}

/// What the client may know about one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_human: bool,
    pub is_alive: bool,
    pub role: Option<Role>,
}

impl PlayerView {
    /// Roles stay hidden unless `reveal` is set or the seat is the viewer's own.
    pub fn of(player: &Player, viewer: PlayerId, reveal: bool) -> Self {
        let role = if reveal || player.id == viewer {
            player.role
        } else {
            None
        };
        Self {
            id: player.id,
            name: player.name.clone(),
            is_human: player.is_human,
            is_alive: player.is_alive,
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub phase: Phase,
    pub day: u32,
    pub players: Vec<PlayerView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub winner: Winner,
    pub players: Vec<PlayerView>,
}

pub trait GameObserver: Send + Sync {
    fn on_state_change(&self, snapshot: &StateSnapshot);
    fn on_question(&self, text: &str);
    fn on_options(&self, text: &str, options: &[String]);
    fn on_game_message(&self, text: &str, category: MessageCategory);
    fn on_game_end(&self, summary: &GameSummary);
}
