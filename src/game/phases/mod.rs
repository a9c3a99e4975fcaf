//! The three phases of a game day. Each controller mutates the engine state
//! and leaves the phase set to whatever comes next.
pub mod day;
pub mod night;
pub mod voting;
