pub mod engine;
pub mod history;
pub mod observer;
pub mod phases;
pub mod player;
pub mod prompt;
pub mod role;
pub mod roles;
pub mod session;
pub mod state;

pub use engine::{Engine, GameSettings};
pub use observer::{GameObserver, GameSummary, MessageCategory, PlayerView, StateSnapshot};
