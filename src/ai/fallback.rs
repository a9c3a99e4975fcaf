//! Random policy used whenever the model is unavailable or answers badly.
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::types::Role;

const GENERIC_LINES: [&str; 10] = [
    "This round is hard to read, I can't tell who the wolves are yet.",
    "Someone died last night. It might be a trap set by the wolves.",
    "We should listen closely to how everyone speaks.",
    "Remember what was said in earlier rounds, the clues matter.",
    "Let's be careful with this vote and not throw it away.",
    "If we have a seer, now would be a good time to share something.",
    "Last night's result feels odd. I think someone is lying.",
    "Trust your instincts. Wolves always slip up eventually.",
    "We should trust each other and find the wolves together.",
    "Stay calm and reason it through, don't let emotions decide.",
];

const WEREWOLF_LINES: [&str; 5] = [
    "I'd be suspicious of the quiet ones.",
    "Whoever keeps accusing others might be the wolf.",
    "I'm on the village side, I promise.",
    "Believe the seer, but watch out for a fake one.",
    "Last night's kill was clearly meant to confuse us.",
];

const SEER_LINES: [&str; 5] = [
    "I have a lead, but it isn't safe to share yet.",
    "I've been watching a few people and some of them look suspicious.",
    "From what I've seen, not everyone here is on our side.",
    "Please trust me, I have important information.",
    "We need more information before we can be sure.",
];

/// A discussion line for `role` drawn from the phrase bank.
pub fn fallback_speech<R: Rng + ?Sized>(role: Role, rng: &mut R) -> String {
    let extra: &[&str] = match role {
        Role::Werewolf => &WEREWOLF_LINES,
        Role::Seer => &SEER_LINES,
        _ => &[],
    };
    let lines: Vec<&str> = GENERIC_LINES.iter().chain(extra).copied().collect();
    lines
        .choose(rng)
        .copied()
        .unwrap_or(GENERIC_LINES[0])
        .to_string()
}

/// `true` with probability `p`.
pub fn chance<R: Rng + ?Sized>(p: f64, rng: &mut R) -> bool {
    rng.random_bool(p.clamp(0.0, 1.0))
}
