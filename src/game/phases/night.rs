use tracing::info;

use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::game::roles::{guard, hunter, seer, werewolf, witch};
use crate::game::state::GameState;
use crate::types::{Phase, PlayerId, Role, NIGHT_ACTION_ORDER};

/// Runs one night: every acting role in order, then kills and poison are
/// settled and any fallen hunter fires.
pub async fn run_night(engine: &mut Engine) -> Result<(), EngineError> {
    engine.state.day += 1;
    engine.state.phase = Phase::Night;
    engine.state.clear_night();
    engine.state.night_killed = None;

    let day = engine.state.day;
    engine.message(format!("=== Night {day} ==="), MessageCategory::Night);
    engine.record("System", format!("Night {day} falls."));
    engine.publish_state();

    for role in NIGHT_ACTION_ORDER {
        act(engine, role).await?;
    }

    let deaths = night_deaths(&engine.state);
    engine.message("Dawn is breaking...", MessageCategory::Night);
    if let Some(target) = engine.state.werewolf_vote_result {
        if !deaths.contains(&target) {
            engine.message("The werewolves' prey survived the night!", MessageCategory::Night);
        }
    }

    let mut fallen = Vec::with_capacity(deaths.len());
    for id in deaths {
        if engine.kill_player(id) {
            fallen.push(id);
        }
    }
    engine.state.night_killed = (!fallen.is_empty()).then(|| fallen.clone());
    engine.state.clear_night();
    info!(day, deaths = ?fallen, "night resolved");

    if fallen.is_empty() {
        engine.message("A peaceful night, nobody died.", MessageCategory::Success);
        engine.record("System", format!("Nobody died during night {day}."));
    } else {
        engine.message("These players did not survive the night:", MessageCategory::Warning);
        for id in &fallen {
            let label = engine.label(*id);
            engine.message(format!("- {label}"), MessageCategory::Dead);
            engine.record("System", format!("{label} died during night {day}."));
        }
    }

    hunter::trigger_hunters(engine, &fallen).await?;

    engine.state.phase = Phase::DayDiscussion;
    engine.publish_state();
    Ok(())
}

async fn act(engine: &mut Engine, role: Role) -> Result<(), EngineError> {
    if role == Role::Werewolf {
        return werewolf::resolve_pack(engine).await;
    }

    for actor in engine.alive_with_role(role) {
        let human = engine.is_human(actor);
        match (role, human) {
            (Role::Guard, true) => guard::handle_guard(engine, actor).await?,
            (Role::Guard, false) => guard::simulate_guard(engine, actor).await?,
            (Role::Witch, true) => witch::handle_witch(engine, actor).await?,
            (Role::Witch, false) => witch::simulate_witch(engine, actor).await?,
            (Role::Seer, true) => seer::handle_seer(engine, actor).await?,
            (Role::Seer, false) => seer::simulate_seer(engine, actor).await?,
            _ => {}
        }
    }
    Ok(())
}

/// Who dies tonight: the pack's target unless guarded or saved, plus the
/// poison target. No id appears twice.
pub fn night_deaths(state: &GameState) -> Vec<PlayerId> {
    let mut deaths = Vec::new();
    if let Some(target) = state.werewolf_vote_result {
        let protected = state.guard_protected == Some(target);
        if !protected && !state.witch_saved {
            deaths.push(target);
        }
    }
    if state.witch_poisoned {
        if let Some(target) = state.witch_poison_target {
            if !deaths.contains(&target) {
                deaths.push(target);
            }
        }
    }
    deaths
}
