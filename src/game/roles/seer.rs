use tracing::debug;

use crate::ai::{Decision, DecisionKind};
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::game::state::SeerCheck;
use crate::types::PlayerId;
use crate::utils::pick_random;

fn check_targets(engine: &Engine, seer: PlayerId) -> Vec<PlayerId> {
    engine
        .alive_ids()
        .into_iter()
        .filter(|id| *id != seer)
        .collect()
}

fn record_check(engine: &mut Engine, seer: PlayerId, target: PlayerId) -> SeerCheck {
    let is_werewolf = engine.player(target).is_some_and(|p| p.is_werewolf());
    let check = SeerCheck {
        day: engine.state.day,
        seer_id: seer,
        target_id: target,
        is_werewolf,
    };
    engine.state.seer_checks.push(check.clone());
    check
}

pub async fn handle_seer(engine: &mut Engine, seer: PlayerId) -> Result<(), EngineError> {
    let targets = check_targets(engine, seer);
    let Some(target) = engine
        .select_player(&targets, "You are the Seer. Choose a player to check:")
        .await?
    else {
        engine.message("You skip your check tonight.", MessageCategory::Warning);
        return Ok(());
    };

    let check = record_check(engine, seer, target);
    let verdict = if check.is_werewolf {
        "a werewolf"
    } else {
        "on the village side"
    };
    engine.message(
        format!("{} is {verdict}.", engine.label(target)),
        MessageCategory::Role,
    );
    Ok(())
}

pub async fn simulate_seer(engine: &mut Engine, seer: PlayerId) -> Result<(), EngineError> {
    let targets = check_targets(engine, seer);
    if targets.is_empty() {
        return Ok(());
    }

    let context = format!(
        "Night {}. Previous checks: {}",
        engine.state.day,
        describe_checks(engine, seer)
    );
    let target = match engine
        .ai_decide(DecisionKind::Check, seer, &targets, context)
        .await?
    {
        Some(Decision::Target(id)) => id,
        _ => {
            // Prefer someone this seer has not looked at yet.
            let unchecked: Vec<PlayerId> = targets
                .iter()
                .copied()
                .filter(|id| !engine.state.checks_by(seer).any(|c| c.target_id == *id))
                .collect();
            let pool = if unchecked.is_empty() { &targets } else { &unchecked };
            match pick_random(pool, &mut engine.rng) {
                Some(id) => id,
                None => return Ok(()),
            }
        }
    };

    let check = record_check(engine, seer, target);
    debug!(seer, target, is_werewolf = check.is_werewolf, "seer check");
    Ok(())
}

/// Private knowledge of `seer`, used as speech context.
pub fn describe_checks(engine: &Engine, seer: PlayerId) -> String {
    let lines: Vec<String> = engine
        .state
        .checks_by(seer)
        .map(|check| {
            let verdict = if check.is_werewolf { "werewolf" } else { "good" };
            format!("night {}: {} is {verdict}", check.day, engine.label(check.target_id))
        })
        .collect();
    if lines.is_empty() {
        "none".to_string()
    } else {
        lines.join("; ")
    }
}
