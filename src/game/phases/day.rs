use crate::ai::fallback::fallback_speech;
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::game::roles::seer::describe_checks;
use crate::game::state::Discussion;
use crate::types::{Phase, PlayerId, Role};

/// Every living player speaks once, in ascending id order.
pub async fn run_day(engine: &mut Engine) -> Result<(), EngineError> {
    engine.state.phase = Phase::DayDiscussion;
    let day = engine.state.day;
    engine.message(format!("=== Day {day} ==="), MessageCategory::Day);
    engine.message(
        "The village gathers to discuss. Everyone speaks once.",
        MessageCategory::Day,
    );
    engine.publish_state();

    for speaker in engine.alive_ids() {
        let content = if engine.is_human(speaker) {
            human_speech(engine).await?
        } else {
            npc_speech(engine, speaker).await?
        };
        speak(engine, speaker, content);
    }

    engine.message("Discussion is over. Time to vote.", MessageCategory::System);
    engine.state.phase = Phase::Voting;
    engine.publish_state();
    Ok(())
}

async fn human_speech(engine: &Engine) -> Result<String, EngineError> {
    let answer = engine.ask("Your turn to speak:").await?;
    let trimmed = answer.trim();
    Ok(if trimmed.is_empty() {
        "(stays silent)".to_string()
    } else {
        trimmed.to_string()
    })
}

async fn npc_speech(engine: &mut Engine, speaker: PlayerId) -> Result<String, EngineError> {
    let context = speech_context(engine, speaker);
    if let Some(speech) = engine.ai_speak(speaker, context).await? {
        return Ok(speech);
    }
    let role = engine
        .player(speaker)
        .and_then(|p| p.role)
        .unwrap_or(Role::Villager);
    Ok(fallback_speech(role, &mut engine.rng))
}

/// Public facts of the day plus whatever the speaker privately knows.
fn speech_context(engine: &Engine, speaker: PlayerId) -> String {
    let day = engine.state.day;
    let deaths = match &engine.state.night_killed {
        Some(ids) => ids
            .iter()
            .map(|id| engine.label(*id))
            .collect::<Vec<_>>()
            .join(", "),
        None => "nobody".to_string(),
    };
    let alive = engine
        .alive_ids()
        .into_iter()
        .map(|id| engine.label(id))
        .collect::<Vec<_>>()
        .join(", ");
    let said_today = engine
        .state
        .discussions_on(day)
        .map(|d| format!("{}: {}", d.player_name, d.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut context =
        format!("Day {day}. Died last night: {deaths}. Still alive: {alive}.\nSaid so far today:\n{said_today}");
    match engine.player(speaker).and_then(|p| p.role) {
        Some(Role::Seer) => {
            context.push_str(&format!("\nYour checks: {}", describe_checks(engine, speaker)));
        }
        Some(Role::Werewolf) => {
            let pack: Vec<String> = engine
                .alive_with_role(Role::Werewolf)
                .into_iter()
                .filter(|id| *id != speaker)
                .map(|id| engine.label(id))
                .collect();
            if !pack.is_empty() {
                context.push_str(&format!("\nYour fellow werewolves: {}", pack.join(", ")));
            }
        }
        _ => {}
    }
    context
}

fn speak(engine: &mut Engine, speaker: PlayerId, content: String) {
    let Some(player) = engine.player(speaker) else {
        return;
    };
    let name = player.name.clone();
    let label = player.label();
    engine.message(format!("{label}: {content}"), MessageCategory::Player);
    engine.record(label, content.clone());
    engine.state.day_discussions.push(Discussion {
        day: engine.state.day,
        player_id: speaker,
        player_name: name,
        content,
    });
}
