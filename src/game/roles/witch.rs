use tracing::debug;

use crate::ai::fallback::chance;
use crate::ai::{Decision, DecisionKind};
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::types::{Abilities, PlayerId};
use crate::utils::pick_random;

fn potions(engine: &Engine, witch: PlayerId) -> (bool, bool) {
    match engine.player(witch).map(|p| &p.abilities) {
        Some(Abilities::Witch {
            has_medicine,
            has_poison,
        }) => (*has_medicine, *has_poison),
        _ => (false, false),
    }
}

fn use_medicine(engine: &mut Engine, witch: PlayerId) {
    if let Some(Abilities::Witch { has_medicine, .. }) =
        engine.player_mut(witch).map(|p| &mut p.abilities)
    {
        *has_medicine = false;
    }
    engine.state.witch_saved = true;
}

fn use_poison(engine: &mut Engine, witch: PlayerId, target: PlayerId) {
    if let Some(Abilities::Witch { has_poison, .. }) =
        engine.player_mut(witch).map(|p| &mut p.abilities)
    {
        *has_poison = false;
    }
    engine.state.witch_poisoned = true;
    engine.state.witch_poison_target = Some(target);
}

fn poison_targets(engine: &Engine, witch: PlayerId) -> Vec<PlayerId> {
    engine
        .alive_ids()
        .into_iter()
        .filter(|id| *id != witch)
        .collect()
}

pub async fn handle_witch(engine: &mut Engine, witch: PlayerId) -> Result<(), EngineError> {
    let (has_medicine, has_poison) = potions(engine, witch);
    let victim = engine.state.werewolf_vote_result;

    match (has_medicine, victim) {
        (true, Some(victim)) => {
            let name = engine.label(victim);
            engine.message(
                format!("Tonight {name} was attacked by the werewolves."),
                MessageCategory::Info,
            );
            if engine
                .ask_yes_no(&format!("Use your antidote to save {name}?"))
                .await?
            {
                use_medicine(engine, witch);
                engine.message(format!("You saved {name}."), MessageCategory::Action);
            }
        }
        (true, None) => engine.message("Nobody was attacked tonight.", MessageCategory::Info),
        (false, _) => engine.message("You have no antidote left.", MessageCategory::Info),
    }

    if !has_poison {
        engine.message("You have no poison left.", MessageCategory::Info);
        return Ok(());
    }
    if !engine.ask_yes_no("Use your poison tonight?").await? {
        return Ok(());
    }

    let targets = poison_targets(engine, witch);
    match engine
        .select_player(&targets, "Choose a player to poison:")
        .await?
    {
        Some(target) => {
            use_poison(engine, witch, target);
            engine.message(
                format!("You poisoned {}.", engine.label(target)),
                MessageCategory::Action,
            );
        }
        None => engine.message("You put the poison away.", MessageCategory::Warning),
    }
    Ok(())
}

pub async fn simulate_witch(engine: &mut Engine, witch: PlayerId) -> Result<(), EngineError> {
    let (has_medicine, has_poison) = potions(engine, witch);
    let tuning = engine.tuning();

    if let (true, Some(victim)) = (has_medicine, engine.state.werewolf_vote_result) {
        let context = format!(
            "Night {}. The werewolves attacked {}.",
            engine.state.day,
            engine.label(victim)
        );
        let save = match engine
            .ai_decide(DecisionKind::Save, witch, &[], context)
            .await?
        {
            Some(Decision::Use(save)) => save,
            _ => chance(tuning.witch_save_probability, &mut engine.rng),
        };
        if save {
            use_medicine(engine, witch);
            debug!(witch, victim, "witch saved");
        }
    }

    if has_poison {
        let targets = poison_targets(engine, witch);
        if targets.is_empty() {
            return Ok(());
        }
        let context = format!("Night {}. You may use your poison.", engine.state.day);
        let target = match engine
            .ai_decide(DecisionKind::Poison, witch, &targets, context)
            .await?
        {
            Some(Decision::Target(id)) => Some(id),
            Some(_) => None,
            None => {
                if chance(tuning.witch_poison_probability, &mut engine.rng) {
                    pick_random(&targets, &mut engine.rng)
                } else {
                    None
                }
            }
        };
        if let Some(target) = target {
            use_poison(engine, witch, target);
            debug!(witch, target, "witch poisoned");
        }
    }
    Ok(())
}
