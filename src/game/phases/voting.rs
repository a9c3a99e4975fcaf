use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info};

use crate::ai::{Decision, DecisionKind};
use crate::error::EngineError;
use crate::game::engine::Engine;
use crate::game::observer::MessageCategory;
use crate::game::roles::hunter;
use crate::types::{Phase, PlayerId, VoteMap};
use crate::utils::pick_random;

/// Plurality over the ballots, abstentions ignored. Ties are broken uniformly
/// at random among the leaders; no ballots means no result.
pub fn tally_votes<R: Rng + ?Sized>(votes: &VoteMap, rng: &mut R) -> Option<PlayerId> {
    let mut counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
    for target in votes.values().flatten() {
        *counts.entry(*target).or_default() += 1;
    }
    let max = counts.values().copied().max()?;
    let leaders: Vec<PlayerId> = counts
        .into_iter()
        .filter(|(_, count)| *count == max)
        .map(|(id, _)| id)
        .collect();
    pick_random(&leaders, rng)
}

/// Collects one ballot per living player in id order, executes the plurality
/// and lets an executed hunter fire.
pub async fn run_voting(engine: &mut Engine) -> Result<(), EngineError> {
    engine.state.phase = Phase::Voting;
    engine.state.votes.clear();
    engine.message("Voting begins. Choose who to banish.", MessageCategory::Day);
    engine.record("System", "Voting begins.");
    engine.publish_state();

    for voter in engine.alive_ids() {
        let ballot = if engine.is_human(voter) {
            human_ballot(engine, voter).await?
        } else {
            npc_ballot(engine, voter).await?
        };
        engine.state.votes.insert(voter, ballot);

        let voter_label = engine.label(voter);
        let line = match ballot {
            Some(target) => format!("votes for {}", engine.label(target)),
            None => "abstains".to_string(),
        };
        engine.message(format!("{voter_label} {line}."), MessageCategory::Action);
        engine.record(voter_label, line);
    }

    let leaders = leaders(&engine.state.votes);
    if leaders.len() > 1 {
        engine.message(
            "The vote is tied! One of the leaders is picked at random.",
            MessageCategory::Warning,
        );
    }
    let executed = tally_votes(&engine.state.votes, &mut engine.rng);
    info!(day = engine.state.day, ?executed, "vote resolved");

    match executed {
        None => {
            engine.message("Nobody is banished today.", MessageCategory::Warning);
            engine.record("System", "Nobody was banished.");
        }
        Some(id) => {
            engine.kill_player(id);
            let label = engine.label(id);
            let role = engine
                .player(id)
                .and_then(|p| p.role)
                .map(|r| r.to_string())
                .unwrap_or_default();
            engine.message(format!("{label} is banished from the village."), MessageCategory::Dead);
            engine.message(format!("{label} was a {role}."), MessageCategory::Role);
            engine.record("System", format!("{label} was banished. They were a {role}."));
            hunter::trigger_hunters(engine, &[id]).await?;
        }
    }

    engine.state.phase = Phase::Night;
    engine.publish_state();
    Ok(())
}

fn leaders(votes: &VoteMap) -> Vec<PlayerId> {
    let mut counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
    for target in votes.values().flatten() {
        *counts.entry(*target).or_default() += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    counts
        .into_iter()
        .filter(|(_, count)| max > 0 && *count == max)
        .map(|(id, _)| id)
        .collect()
}

fn vote_targets(engine: &Engine, voter: PlayerId) -> Vec<PlayerId> {
    engine
        .alive_ids()
        .into_iter()
        .filter(|id| *id != voter)
        .collect()
}

async fn human_ballot(engine: &Engine, voter: PlayerId) -> Result<Option<PlayerId>, EngineError> {
    let targets = vote_targets(engine, voter);
    engine
        .select_player(&targets, "Choose a player to banish (-1 to abstain):")
        .await
}

async fn npc_ballot(engine: &mut Engine, voter: PlayerId) -> Result<Option<PlayerId>, EngineError> {
    let targets = vote_targets(engine, voter);
    if targets.is_empty() {
        return Ok(None);
    }

    let context = format!("Day {}. Cast your vote.", engine.state.day);
    match engine
        .ai_decide(DecisionKind::Vote, voter, &targets, context)
        .await?
    {
        Some(Decision::Target(id)) => return Ok(Some(id)),
        Some(Decision::Pass) => return Ok(None),
        _ => {}
    }

    // Werewolves keep their votes off the pack while anyone else is left.
    let is_wolf = engine.player(voter).is_some_and(|p| p.is_werewolf());
    let pool: Vec<PlayerId> = if is_wolf {
        let outsiders: Vec<PlayerId> = targets
            .iter()
            .copied()
            .filter(|id| engine.player(*id).is_some_and(|p| !p.is_werewolf()))
            .collect();
        if outsiders.is_empty() {
            targets
        } else {
            outsiders
        }
    } else {
        targets
    };
    let ballot = pick_random(&pool, &mut engine.rng);
    debug!(voter, ?ballot, "fallback ballot");
    Ok(ballot)
}
