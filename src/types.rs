use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type PlayerId = u32;

/// Ballots keyed by voter. `None` records an abstention.
pub type VoteMap = BTreeMap<PlayerId, Option<PlayerId>>;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 20;
pub const DEFAULT_PLAYER_COUNT: usize = 8;

/// The id the human player always receives.
pub const HUMAN_PLAYER_ID: PlayerId = 1;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Role {
    Werewolf,
    Villager,
    Seer,
    Witch,
    Hunter,
    Guard,
}

/// Roles that act at night, in the order they act.
pub const NIGHT_ACTION_ORDER: [Role; 4] = [Role::Guard, Role::Werewolf, Role::Witch, Role::Seer];

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Werewolf,
        Role::Villager,
        Role::Seer,
        Role::Witch,
        Role::Hunter,
        Role::Guard,
    ];

    pub fn is_werewolf(self) -> bool {
        self == Role::Werewolf
    }

    pub fn faction(self) -> Winner {
        match self {
            Role::Werewolf => Winner::Werewolf,
            _ => Winner::Village,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Werewolf => "Werewolf",
            Role::Villager => "Villager",
            Role::Seer => "Seer",
            Role::Witch => "Witch",
            Role::Hunter => "Hunter",
            Role::Guard => "Guard",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "werewolf" | "wolf" => Ok(Role::Werewolf),
            "villager" => Ok(Role::Villager),
            "seer" => Ok(Role::Seer),
            "witch" => Ok(Role::Witch),
            "hunter" => Ok(Role::Hunter),
            "guard" => Ok(Role::Guard),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Setup,
    Night,
    DayDiscussion,
    Voting,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Setup => "setup",
            Phase::Night => "night",
            Phase::DayDiscussion => "day discussion",
            Phase::Voting => "voting",
            Phase::GameOver => "game over",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Winner {
    Village,
    Werewolf,
}

/// Role-specific mutable state. Each variant is set once at role assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Abilities {
    #[default]
    None,
    Witch {
        has_medicine: bool,
        has_poison: bool,
    },
    Hunter {
        can_shoot: bool,
    },
    Guard {
        last_protected: Option<PlayerId>,
    },
}

impl Abilities {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Witch => Abilities::Witch {
                has_medicine: true,
                has_poison: true,
            },
            Role::Hunter => Abilities::Hunter { can_shoot: true },
            Role::Guard => Abilities::Guard {
                last_protected: None,
            },
            Role::Werewolf | Role::Villager | Role::Seer => Abilities::None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_human: bool,
    pub is_alive: bool,
    pub role: Option<Role>,
    pub abilities: Abilities,
}

impl Player {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    pub fn is_werewolf(&self) -> bool {
        self.has_role(Role::Werewolf)
    }

    /// One-way transition; a dead player is never revived.
    pub fn kill(&mut self) {
        self.is_alive = false;
    }

    pub fn label(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}
