use tracing::debug;

use crate::ai::{Decision, DecisionKind};
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::game::phases::voting::tally_votes;
use crate::types::{PlayerId, Role};
use crate::utils::pick_random;

/// Alive non-werewolves, ascending.
pub fn kill_targets(engine: &Engine) -> Vec<PlayerId> {
    engine
        .alive_ids()
        .into_iter()
        .filter(|id| engine.player(*id).is_some_and(|p| !p.is_werewolf()))
        .collect()
}

/// Collects one ballot per living werewolf, then settles the pack's target.
pub async fn resolve_pack(engine: &mut Engine) -> Result<(), EngineError> {
    let wolves = engine.alive_with_role(Role::Werewolf);
    if wolves.is_empty() {
        return Ok(());
    }
    engine.state.werewolf_votes.clear();
    engine.message("The werewolves are choosing their prey...", MessageCategory::Night);

    for wolf in wolves {
        if engine.is_human(wolf) {
            handle_werewolf(engine, wolf).await?;
        } else {
            simulate_werewolf(engine, wolf).await?;
        }
    }

    let result = tally_votes(&engine.state.werewolf_votes, &mut engine.rng);
    engine.state.werewolf_vote_result = result;
    debug!(target_id = ?result, votes = ?engine.state.werewolf_votes, "pack decided");

    if engine.human().is_some_and(|h| h.is_alive && h.is_werewolf()) {
        let text = match result {
            Some(target) => format!("The pack will attack {} tonight.", engine.label(target)),
            None => "The pack could not agree on a target tonight.".to_string(),
        };
        engine.message(text, MessageCategory::Action);
    }
    Ok(())
}

pub async fn handle_werewolf(engine: &mut Engine, wolf: PlayerId) -> Result<(), EngineError> {
    let targets = kill_targets(engine);
    if targets.is_empty() {
        engine.message("There is nobody left to attack.", MessageCategory::Warning);
        engine.state.werewolf_votes.insert(wolf, None);
        return Ok(());
    }

    let choice = engine
        .select_player(&targets, "You are a werewolf. Choose a player to kill:")
        .await?;
    match choice {
        Some(target) => {
            engine.message(
                format!("You chose to kill {}.", engine.label(target)),
                MessageCategory::Action,
            );
        }
        None => engine.message("You hold back tonight.", MessageCategory::Warning),
    }
    engine.state.werewolf_votes.insert(wolf, choice);
    Ok(())
}

pub async fn simulate_werewolf(engine: &mut Engine, wolf: PlayerId) -> Result<(), EngineError> {
    let targets = kill_targets(engine);
    if targets.is_empty() {
        engine.state.werewolf_votes.insert(wolf, None);
        return Ok(());
    }

    let context = format!(
        "Night {}. You and your pack must pick tonight's victim.",
        engine.state.day
    );
    let target = match engine
        .ai_decide(DecisionKind::Kill, wolf, &targets, context)
        .await?
    {
        Some(Decision::Target(id)) => Some(id),
        _ => pick_random(&targets, &mut engine.rng),
    };

    debug!(wolf, ?target, "werewolf ballot");
    engine.state.werewolf_votes.insert(wolf, target);
    Ok(())
}
