//! Per-role night actions and the hunter's death shot. Each role has a
//! `handle_*` resolver for the human and a `simulate_*` resolver for NPCs;
//! both write the same fields of the game state.
pub mod guard;
pub mod hunter;
pub mod seer;
pub mod werewolf;
pub mod witch;
