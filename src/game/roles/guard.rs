use tracing::debug;

use crate::ai::{Decision, DecisionKind};
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::types::{Abilities, PlayerId};
use crate::utils::pick_random;

fn last_protected(engine: &Engine, guard: PlayerId) -> Option<PlayerId> {
    match engine.player(guard).map(|p| &p.abilities) {
        Some(Abilities::Guard { last_protected }) => *last_protected,
        _ => None,
    }
}

/// Alive players, excluding whoever the guard protected last night.
pub fn protect_targets(engine: &Engine, guard: PlayerId) -> Vec<PlayerId> {
    let last = last_protected(engine, guard);
    engine
        .alive_ids()
        .into_iter()
        .filter(|id| Some(*id) != last)
        .collect()
}

fn protect(engine: &mut Engine, guard: PlayerId, target: PlayerId) {
    engine.state.guard_protected = Some(target);
    if let Some(Abilities::Guard { last_protected }) =
        engine.player_mut(guard).map(|p| &mut p.abilities)
    {
        *last_protected = Some(target);
    }
}

pub async fn handle_guard(engine: &mut Engine, guard: PlayerId) -> Result<(), EngineError> {
    let targets = protect_targets(engine, guard);
    match engine
        .select_player(&targets, "You are the Guard. Choose a player to protect:")
        .await?
    {
        Some(target) => {
            protect(engine, guard, target);
            engine.message(
                format!("You are protecting {}.", engine.label(target)),
                MessageCategory::Action,
            );
        }
        None => engine.message("You protect nobody tonight.", MessageCategory::Warning),
    }
    Ok(())
}

pub async fn simulate_guard(engine: &mut Engine, guard: PlayerId) -> Result<(), EngineError> {
    let targets = protect_targets(engine, guard);
    if targets.is_empty() {
        return Ok(());
    }

    let context = format!("Night {}. Choose someone to protect.", engine.state.day);
    let target = match engine
        .ai_decide(DecisionKind::Guard, guard, &targets, context)
        .await?
    {
        Some(Decision::Target(id)) => Some(id),
        _ => pick_random(&targets, &mut engine.rng),
    };
    if let Some(target) = target {
        protect(engine, guard, target);
        debug!(guard, target, "guard protects");
    }
    Ok(())
}
