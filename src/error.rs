//! Error types for game setup, the answer slot, the LLM backends and the
//! game loop.
use thiserror::Error;

use crate::types::{PlayerId, Role, MAX_PLAYERS, MIN_PLAYERS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("player count {found} is below the minimum of {MIN_PLAYERS}")]
    TooFewPlayers { found: usize },

    #[error("player count {found} is above the maximum of {MAX_PLAYERS}")]
    TooManyPlayers { found: usize },

    #[error("{special_roles} special roles do not fit into {player_count} seats")]
    NegativeVillagers {
        player_count: usize,
        special_roles: usize,
    },

    #[error("role distribution contains no werewolf")]
    NoWerewolves,

    #[error("unknown role `{0}`")]
    UnknownRole(String),

    #[error("{count} seats requested for {role}, the table holds at most {MAX_PLAYERS}")]
    RoleCountTooLarge { role: Role, count: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("a question is already waiting for an answer")]
    AlreadyPending,

    #[error("the pending question was cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured for {0}")]
    MissingApiKey(String),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider returned no text")]
    EmptyCompletion,
}

impl CompletionError {
    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Http(err) => !err.is_builder() && !err.is_decode(),
            CompletionError::Status { status, .. } => *status >= 500,
            CompletionError::MissingApiKey(_) | CompletionError::EmptyCompletion => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("AI decisions are disabled")]
    Disabled,

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("decision timed out")]
    Timeout,

    #[error("malformed decision: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("decision is missing `{0}`")]
    MissingField(&'static str),

    #[error("player {0} is not an eligible target")]
    IneligibleTarget(PlayerId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("game was replaced by a newer session")]
    Cancelled,

    #[error("game has not been set up")]
    NotSetUp,
}
