use serde::Serialize;

use crate::types::{Phase, PlayerId, VoteMap, Winner};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeerCheck {
    pub day: u32,
    pub seer_id: PlayerId,
    pub target_id: PlayerId,
    pub is_werewolf: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub day: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    pub content: String,
}

/// Mutable state of one game. Players live next to it on the engine.
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: Phase,
    pub day: u32,
    /// Everyone who died during the last night, without duplicates.
    pub night_killed: Option<Vec<PlayerId>>,
    pub werewolf_vote_result: Option<PlayerId>,
    pub werewolf_votes: VoteMap,
    pub witch_saved: bool,
    pub witch_poisoned: bool,
    pub witch_poison_target: Option<PlayerId>,
    pub guard_protected: Option<PlayerId>,
    pub seer_checks: Vec<SeerCheck>,
    pub votes: VoteMap,
    pub day_discussions: Vec<Discussion>,
    pub winner: Option<Winner>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: Phase::Setup,
            day: 0,
            night_killed: None,
            werewolf_vote_result: None,
            werewolf_votes: VoteMap::new(),
            witch_saved: false,
            witch_poisoned: false,
            witch_poison_target: None,
            guard_protected: None,
            seer_checks: Vec::new(),
            votes: VoteMap::new(),
            day_discussions: Vec::new(),
            winner: None,
        }
    }
}

impl GameState {
    /// Drops everything that only lives for one night.
    pub fn clear_night(&mut self) {
        self.werewolf_vote_result = None;
        self.werewolf_votes.clear();
        self.witch_saved = false;
        self.witch_poisoned = false;
        self.witch_poison_target = None;
        self.guard_protected = None;
    }

    pub fn checks_by(&self, seer_id: PlayerId) -> impl Iterator<Item = &SeerCheck> {
        self.seer_checks
            .iter()
            .filter(move |check| check.seer_id == seer_id)
    }

    pub fn discussions_on(&self, day: u32) -> impl Iterator<Item = &Discussion> {
        self.day_discussions
            .iter()
            .filter(move |entry| entry.day == day)
    }
}
