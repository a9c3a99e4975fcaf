pub mod client;
pub mod decision;
pub mod fallback;

pub use client::{LlmClient, TextCompletion};
pub use decision::{Candidate, Decision, DecisionKind, DecisionProvider, DecisionRequest, SpeechRequest};
