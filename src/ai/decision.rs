//! Structured AI decisions and free-text speech on top of [`TextCompletion`].
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::client::TextCompletion;
use crate::config::AiTuning;
use crate::error::DecisionError;
use crate::types::{PlayerId, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Kill,
    Check,
    Save,
    Poison,
    Guard,
    Vote,
    Shoot,
}

impl DecisionKind {
    fn instruction(self) -> &'static str {
        match self {
            DecisionKind::Kill => {
                "decide which player to kill tonight. Reply with JSON only: {\"targetId\": number}"
            }
            DecisionKind::Check => {
                "decide whose identity to check tonight. Reply with JSON only: {\"targetId\": number}"
            }
            DecisionKind::Save => {
                "decide whether to use your antidote on tonight's victim. Reply with JSON only: {\"save\": true|false}"
            }
            DecisionKind::Poison => {
                "decide whether to use your poison and on whom. Reply with JSON only: {\"poison\": true|false, \"targetId\": number|null}"
            }
            DecisionKind::Guard => {
                "decide which player to protect tonight. Reply with JSON only: {\"targetId\": number}"
            }
            DecisionKind::Vote => {
                "decide which player to vote out, or null to abstain. Reply with JSON only: {\"targetId\": number|null}"
            }
            DecisionKind::Shoot => {
                "you were eliminated and may shoot one player. Reply with JSON only: {\"shoot\": true|false, \"targetId\": number|null}"
            }
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionKind::Kill => "kill",
            DecisionKind::Check => "check",
            DecisionKind::Save => "save",
            DecisionKind::Poison => "poison",
            DecisionKind::Guard => "guard",
            DecisionKind::Vote => "vote",
            DecisionKind::Shoot => "shoot",
        };
        f.write_str(label)
    }
}

/// A validated decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Target(PlayerId),
    /// Declined to act (abstain, keep the poison, hold fire).
    Pass,
    Use(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: PlayerId,
    pub name: String,
}

/// Everything the model is told about one decision.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub kind: DecisionKind,
    pub actor_id: PlayerId,
    pub role: Role,
    pub candidates: Vec<Candidate>,
    /// Situation summary for this decision.
    pub context: String,
    /// Formatted game history, may be empty.
    pub history: String,
}

impl DecisionRequest {
    fn system_instruction(&self) -> String {
        format!(
            "You are playing a {} (player {}) in a game of Werewolf. Please {}",
            self.role,
            self.actor_id,
            self.kind.instruction()
        )
    }

    fn prompt(&self) -> String {
        let mut prompt = String::new();
        if !self.history.is_empty() {
            prompt.push_str(&self.history);
            prompt.push_str("\n\n");
        }
        prompt.push_str(&self.context);
        if !self.candidates.is_empty() {
            prompt.push_str("\n\nEligible targets:");
            for candidate in &self.candidates {
                prompt.push_str(&format!("\nID: {}, name: {}", candidate.id, candidate.name));
            }
        }
        prompt
    }

    fn eligible(&self) -> Vec<PlayerId> {
        self.candidates.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub speaker_id: PlayerId,
    pub speaker_name: String,
    pub role: Role,
    pub context: String,
    pub history: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDecision {
    #[serde(default)]
    target_id: Option<PlayerId>,
    #[serde(default)]
    save: Option<bool>,
    #[serde(default)]
    poison: Option<bool>,
    #[serde(default)]
    shoot: Option<bool>,
}

/// Removes one surrounding Markdown code fence (with an optional language
/// tag). Anything else is handed to the parser as is.
fn strip_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = body.strip_suffix("```") else {
        return text;
    };
    match body.split_once('\n') {
        Some((tag, rest)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => rest.trim(),
        _ => body.trim(),
    }
}

/// Parses a completion into a decision of `kind`, rejecting unknown fields,
/// wrong types and targets outside `eligible`.
pub fn parse_decision(
    kind: DecisionKind,
    text: &str,
    eligible: &[PlayerId],
) -> Result<Decision, DecisionError> {
    let raw: RawDecision =
        serde_json::from_str(strip_fence(text)).map_err(DecisionError::Malformed)?;

    let target = |id: Option<PlayerId>| -> Result<Decision, DecisionError> {
        let id = id.ok_or(DecisionError::MissingField("targetId"))?;
        if eligible.contains(&id) {
            Ok(Decision::Target(id))
        } else {
            Err(DecisionError::IneligibleTarget(id))
        }
    };

    match kind {
        DecisionKind::Kill | DecisionKind::Check | DecisionKind::Guard => target(raw.target_id),
        DecisionKind::Vote => match raw.target_id {
            None => Ok(Decision::Pass),
            some => target(some),
        },
        DecisionKind::Save => raw
            .save
            .map(Decision::Use)
            .ok_or(DecisionError::MissingField("save")),
        DecisionKind::Poison => match raw.poison {
            None => Err(DecisionError::MissingField("poison")),
            Some(false) => Ok(Decision::Pass),
            Some(true) => target(raw.target_id),
        },
        DecisionKind::Shoot => match (raw.shoot, raw.target_id) {
            (Some(false), _) | (None, None) => Ok(Decision::Pass),
            (_, some) => target(some),
        },
    }
}

/// Asks the model for decisions and speeches. Without a completion backend
/// every call fails fast with [`DecisionError::Disabled`] so callers fall
/// back to their random policy.
#[derive(Clone)]
pub struct DecisionProvider {
    completion: Option<Arc<dyn TextCompletion>>,
    timeout: Duration,
    tuning: AiTuning,
}

impl DecisionProvider {
    pub fn new(
        completion: Option<Arc<dyn TextCompletion>>,
        timeout: Duration,
        tuning: AiTuning,
    ) -> Self {
        Self {
            completion,
            timeout,
            tuning,
        }
    }

    pub fn disabled(tuning: AiTuning) -> Self {
        Self::new(None, Duration::from_secs(1), tuning)
    }

    pub fn is_enabled(&self) -> bool {
        self.completion.is_some()
    }

    pub fn tuning(&self) -> &AiTuning {
        &self.tuning
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, DecisionError> {
        let completion = self.completion.as_ref().ok_or(DecisionError::Disabled)?;
        tokio::time::timeout(self.timeout, completion.complete(prompt, Some(system)))
            .await
            .map_err(|_| DecisionError::Timeout)?
            .map_err(DecisionError::from)
    }

    pub async fn decide(&self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        let text = self
            .complete(&request.prompt(), &request.system_instruction())
            .await?;
        let decision = parse_decision(request.kind, &text, &request.eligible())?;
        debug!(
            actor = request.actor_id,
            kind = %request.kind,
            ?decision,
            "AI decision"
        );
        Ok(decision)
    }

    /// One cheap round trip to find out whether the backend answers at all.
    pub async fn check_connection(&self) -> Result<(), DecisionError> {
        let text = self
            .complete(
                "Reply with the single word OK.",
                "You are checking that a game server can reach you.",
            )
            .await?;
        if text.trim().is_empty() {
            return Err(crate::error::CompletionError::EmptyCompletion.into());
        }
        Ok(())
    }

    pub async fn speak(&self, request: &SpeechRequest) -> Result<String, DecisionError> {
        let system = format!(
            "You are playing a {} (player {}, {}) in a game of Werewolf. \
             Say one or two short sentences for the day discussion, in character. \
             Never state your role if you are a werewolf.",
            request.role, request.speaker_id, request.speaker_name
        );
        let prompt = if request.history.is_empty() {
            request.context.clone()
        } else {
            format!("{}\n\n{}", request.history, request.context)
        };

        let text = self.complete(&prompt, &system).await?;
        let speech = text.trim().trim_matches('"').trim().to_string();
        if speech.is_empty() {
            return Err(crate::error::CompletionError::EmptyCompletion.into());
        }
        Ok(speech)
    }
}
