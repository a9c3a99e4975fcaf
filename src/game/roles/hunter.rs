use std::collections::VecDeque;

use tracing::debug;

use crate::ai::fallback::chance;
use crate::ai::{Decision, DecisionKind};
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::types::{Abilities, PlayerId};
use crate::utils::pick_random;

/// Takes the hunter's shot if it is still loaded. The ability is spent the
/// moment it triggers, whether or not the hunter fires.
fn take_shot(engine: &mut Engine, hunter: PlayerId) -> bool {
    match engine.player_mut(hunter).map(|p| &mut p.abilities) {
        Some(Abilities::Hunter { can_shoot }) if *can_shoot => {
            *can_shoot = false;
            true
        }
        _ => false,
    }
}

/// Gives every loaded hunter among `dead` their shot. A hunter shot by
/// another hunter fires in turn.
pub async fn trigger_hunters(engine: &mut Engine, dead: &[PlayerId]) -> Result<(), EngineError> {
    let mut queue: VecDeque<PlayerId> = dead.iter().copied().collect();

    while let Some(hunter) = queue.pop_front() {
        if !take_shot(engine, hunter) {
            continue;
        }
        let shot = if engine.is_human(hunter) {
            handle_hunter(engine, hunter).await?
        } else {
            simulate_hunter(engine, hunter).await?
        };
        if let Some(target) = shot {
            if engine.kill_player(target) {
                let text = format!(
                    "{} fires a last shot and takes {} down!",
                    engine.label(hunter),
                    engine.label(target)
                );
                engine.message(&text, MessageCategory::Dead);
                engine.record("System", text);
                queue.push_back(target);
            }
        } else if !engine.is_human(hunter) {
            let text = format!("{} breathes their last without firing.", engine.label(hunter));
            engine.message(&text, MessageCategory::Action);
            engine.record("System", text);
        }
    }
    Ok(())
}

pub async fn handle_hunter(
    engine: &mut Engine,
    hunter: PlayerId,
) -> Result<Option<PlayerId>, EngineError> {
    engine.message(
        "You are the Hunter. You may take one player down with you.",
        MessageCategory::Role,
    );
    if !engine.ask_yes_no("Fire your gun?").await? {
        engine.message("You lower your gun.", MessageCategory::Warning);
        return Ok(None);
    }
    let targets = engine.alive_ids();
    let choice = engine.select_player(&targets, "Choose your target:").await?;
    if choice.is_none() {
        engine.message("You lower your gun.", MessageCategory::Warning);
    }
    Ok(choice)
}

pub async fn simulate_hunter(
    engine: &mut Engine,
    hunter: PlayerId,
) -> Result<Option<PlayerId>, EngineError> {
    let targets = engine.alive_ids();
    if targets.is_empty() {
        return Ok(None);
    }

    let context = format!(
        "Day {}. You have been eliminated and may shoot one player.",
        engine.state.day
    );
    let target = match engine
        .ai_decide(DecisionKind::Shoot, hunter, &targets, context)
        .await?
    {
        Some(Decision::Target(id)) => Some(id),
        Some(_) => None,
        None => {
            let p = engine.tuning().hunter_shoot_probability;
            if chance(p, &mut engine.rng) {
                pick_random(&targets, &mut engine.rng)
            } else {
                None
            }
        }
    };
    debug!(hunter, ?target, "hunter shot");
    Ok(target)
}
