//! The game engine: owns one game's players and state and drives the phase
//! loop. Human input arrives through the [`AnswerHandle`]; autonomous players
//! consult the [`DecisionProvider`] and fall back to the random policy.
use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::history::GameHistory;
use super::observer::{GameObserver, GameSummary, MessageCategory, PlayerView, StateSnapshot};
use super::phases::{day, night, voting};
use super::player::{create_player, generate_player_name};
use super::prompt::{parse_option_answer, parse_yes_no, wait_for_answer, AnswerHandle};
use super::role::{assign_roles, check_player_count, RoleDistribution};
use super::session::SessionToken;
use super::state::GameState;
use crate::ai::{
    Candidate, Decision, DecisionKind, DecisionProvider, DecisionRequest, SpeechRequest,
};
use crate::config::AiTuning;
use crate::error::{EngineError, SetupError};
use crate::types::{Phase, Player, PlayerId, Role, Winner, DEFAULT_PLAYER_COUNT, HUMAN_PLAYER_ID};

/// How many history records are handed to the model as context.
const HISTORY_CONTEXT_RECORDS: usize = 30;

#[derive(Debug, Clone)]
pub struct GameSettings {
    pub player_name: String,
    pub player_count: usize,
    pub use_ai: bool,
    /// `None` picks a table that fits `player_count`.
    pub role_distribution: Option<RoleDistribution>,
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            player_count: DEFAULT_PLAYER_COUNT,
            use_ai: true,
            role_distribution: None,
            seed: None,
        }
    }
}

pub struct Engine {
    pub(crate) players: Vec<Player>,
    pub(crate) state: GameState,
    pub(crate) history: GameHistory,
    pub(crate) rng: StdRng,
    answers: AnswerHandle,
    observer: Arc<dyn GameObserver>,
    decisions: DecisionProvider,
    ai_requested: bool,
    session: SessionToken,
}

impl Engine {
    pub fn new(
        observer: Arc<dyn GameObserver>,
        decisions: DecisionProvider,
        answers: AnswerHandle,
        session: SessionToken,
    ) -> Self {
        Self {
            players: Vec::new(),
            state: GameState::default(),
            history: GameHistory::new(),
            rng: StdRng::from_os_rng(),
            answers,
            observer,
            decisions,
            ai_requested: false,
            session,
        }
    }

    /// Seats the players and deals roles. Nothing is announced when the
    /// settings are rejected.
    pub fn setup(&mut self, settings: &GameSettings) -> Result<(), SetupError> {
        check_player_count(settings.player_count)?;
        if let Some(seed) = settings.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.ai_requested = settings.use_ai;
        if !settings.use_ai {
            self.decisions = DecisionProvider::disabled(*self.decisions.tuning());
        }

        let human_name = match settings.player_name.trim() {
            "" => "Player 1".to_string(),
            name => name.to_string(),
        };
        let mut used = HashSet::from([human_name.clone()]);
        let mut players = vec![create_player(HUMAN_PLAYER_ID, human_name, true)];
        for id in (HUMAN_PLAYER_ID + 1)..=(settings.player_count as PlayerId) {
            let name = generate_player_name(&used, &mut self.rng);
            used.insert(name.clone());
            players.push(create_player(id, name, false));
        }

        let requested = settings
            .role_distribution
            .clone()
            .unwrap_or_else(|| RoleDistribution::recommended(settings.player_count));
        assign_roles(&mut players, &requested, &mut self.rng)?;

        self.players = players;
        self.state = GameState::default();
        self.history.clear();
        info!(
            players = self.players.len(),
            ai = self.decisions.is_enabled(),
            generation = self.session.generation(),
            "game set up"
        );
        self.announce_setup();
        Ok(())
    }

    fn announce_setup(&mut self) {
        self.message("=== Werewolf ===", MessageCategory::Title);
        self.message(
            format!("{} players are seated:", self.players.len()),
            MessageCategory::Success,
        );
        for player in &self.players {
            let suffix = if player.is_human { " (you)" } else { "" };
            self.message(format!("- {}{suffix}", player.label()), MessageCategory::Player);
        }

        if let Some(human) = self.human() {
            if let Some(role) = human.role {
                self.message(format!("Your role is: {role}"), MessageCategory::Role);
            }
            if human.is_werewolf() {
                let mates: Vec<String> = self
                    .players
                    .iter()
                    .filter(|p| p.is_werewolf() && !p.is_human)
                    .map(Player::label)
                    .collect();
                if mates.is_empty() {
                    self.message("You are the only werewolf.", MessageCategory::Role);
                } else {
                    self.message(
                        format!("Your fellow werewolves: {}", mates.join(", ")),
                        MessageCategory::Role,
                    );
                }
            }
        }

        self.record("System", format!("The game begins with {} players.", self.players.len()));
        self.publish_state();
    }

    /// Drives the game until a side wins.
    pub async fn run(mut self) -> Result<Winner, EngineError> {
        if self.players.is_empty() {
            return Err(EngineError::NotSetUp);
        }
        if self.state.phase == Phase::Setup {
            self.announce_ai().await?;
            self.state.phase = Phase::Night;
        }

        loop {
            self.ensure_current()?;
            match self.state.phase {
                Phase::Setup => self.state.phase = Phase::Night,
                Phase::Night => {
                    if let Some(winner) = self.check_winner() {
                        return Ok(self.finish(winner));
                    }
                    night::run_night(&mut self).await?;
                }
                Phase::DayDiscussion => day::run_day(&mut self).await?,
                Phase::Voting => {
                    voting::run_voting(&mut self).await?;
                    if let Some(winner) = self.check_winner() {
                        return Ok(self.finish(winner));
                    }
                }
                Phase::GameOver => {
                    return self.state.winner.ok_or(EngineError::NotSetUp);
                }
            }
        }
    }

    /// Tells the player whether the AI players will think for themselves. An
    /// unreachable backend is switched off for the rest of the game.
    async fn announce_ai(&mut self) -> Result<(), EngineError> {
        if !self.ai_requested {
            return Ok(());
        }
        let reachable = self.decisions.check_connection().await;
        self.ensure_current()?;

        match reachable {
            Ok(()) => {
                info!("AI backend reachable");
                self.message("AI players enabled.", MessageCategory::System);
            }
            Err(err) => {
                warn!(error = %err, "AI backend unavailable, NPCs will act randomly");
                self.decisions = DecisionProvider::disabled(*self.decisions.tuning());
                self.message(
                    "AI unavailable, NPCs will act randomly.",
                    MessageCategory::Warning,
                );
            }
        }
        Ok(())
    }

    pub fn check_winner(&self) -> Option<Winner> {
        check_winner(&self.players, self.state.day)
    }

    fn finish(&mut self, winner: Winner) -> Winner {
        self.state.winner = Some(winner);
        self.state.phase = Phase::GameOver;

        let headline = match winner {
            Winner::Village => "The village wins! Every werewolf is gone.",
            Winner::Werewolf => "The werewolves win! They now rule the village.",
        };
        self.message("=== Game over ===", MessageCategory::Title);
        self.message(headline, MessageCategory::Success);
        for player in &self.players {
            let role = player.role.map(|r| r.to_string()).unwrap_or_default();
            let status = if player.is_alive { "alive" } else { "dead" };
            self.message(
                format!("{}: {role} ({status})", player.label()),
                MessageCategory::Role,
            );
        }
        self.record("System", headline);
        info!(?winner, day = self.state.day, "game over");

        let summary = GameSummary {
            winner,
            players: self.views(true),
        };
        self.notify(|observer| observer.on_game_end(&summary));
        self.publish_state();
        winner
    }

    pub fn ensure_current(&self) -> Result<(), EngineError> {
        if self.session.is_current() {
            Ok(())
        } else {
            Err(EngineError::Cancelled)
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn GameObserver)) {
        if self.session.is_current() {
            f(self.observer.as_ref());
        }
    }

    pub fn message(&self, text: impl AsRef<str>, category: MessageCategory) {
        self.notify(|observer| observer.on_game_message(text.as_ref(), category));
    }

    fn views(&self, reveal: bool) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| PlayerView::of(p, HUMAN_PLAYER_ID, reveal))
            .collect()
    }

    pub fn publish_state(&self) {
        let snapshot = StateSnapshot {
            phase: self.state.phase,
            day: self.state.day,
            players: self.views(self.state.phase == Phase::GameOver),
        };
        self.notify(|observer| observer.on_state_change(&snapshot));
    }

    /// Appends a public event to the history under the current phase and day.
    pub fn record(&mut self, source: impl Into<String>, message: impl Into<String>) {
        let (phase, day) = (self.state.phase, self.state.day);
        self.history.add(source, message, phase, day);
    }

    // --- questions -------------------------------------------------------

    /// Suspends until the UI answers. A reset resolves to an error instead.
    pub async fn ask(&self, question: &str) -> Result<String, EngineError> {
        self.ensure_current()?;
        let rx = self.answers.open()?;
        self.notify(|observer| observer.on_question(question));
        let answer = wait_for_answer(rx).await?;
        self.ensure_current()?;
        Ok(answer)
    }

    /// Returns the chosen index, or `None` when the player cancels. Invalid
    /// answers re-ask the same question.
    pub async fn select_option(
        &self,
        options: &[String],
        prompt: &str,
    ) -> Result<Option<usize>, EngineError> {
        loop {
            self.ensure_current()?;
            let rx = self.answers.open()?;
            self.notify(|observer| observer.on_options(prompt, options));
            let answer = wait_for_answer(rx).await?;
            self.ensure_current()?;

            if let Some(choice) = parse_option_answer(&answer, options.len()) {
                return Ok(choice);
            }
            self.message(
                format!(
                    "Invalid choice `{}`. Pick 0 to {} or -1 to skip.",
                    answer.trim(),
                    options.len().saturating_sub(1)
                ),
                MessageCategory::Warning,
            );
        }
    }

    pub async fn ask_yes_no(&self, question: &str) -> Result<bool, EngineError> {
        let prompt = format!("{question} (y/n)");
        loop {
            let answer = self.ask(&prompt).await?;
            if let Some(yes) = parse_yes_no(&answer) {
                return Ok(yes);
            }
            self.message("Please answer y or n.", MessageCategory::Warning);
        }
    }

    /// Offers `targets` to the human as labelled options.
    pub async fn select_player(
        &self,
        targets: &[PlayerId],
        prompt: &str,
    ) -> Result<Option<PlayerId>, EngineError> {
        if targets.is_empty() {
            self.message("There is nobody to choose.", MessageCategory::Warning);
            return Ok(None);
        }
        let options: Vec<String> = targets
            .iter()
            .filter_map(|id| self.player(*id))
            .map(Player::label)
            .collect();
        let choice = self.select_option(&options, prompt).await?;
        Ok(choice.and_then(|index| targets.get(index).copied()))
    }

    // --- autonomous players -----------------------------------------------

    /// Asks the model for a decision. `None` means "use the random policy".
    pub async fn ai_decide(
        &self,
        kind: DecisionKind,
        actor: PlayerId,
        targets: &[PlayerId],
        context: String,
    ) -> Result<Option<Decision>, EngineError> {
        if !self.decisions.is_enabled() {
            return Ok(None);
        }
        let Some(role) = self.player(actor).and_then(|p| p.role) else {
            return Ok(None);
        };
        let request = DecisionRequest {
            kind,
            actor_id: actor,
            role,
            candidates: self.candidates(targets),
            context,
            history: self.history.format_recent(HISTORY_CONTEXT_RECORDS),
        };

        let result = self.decisions.decide(&request).await;
        // A reset may have happened while the request was in flight.
        self.ensure_current()?;

        match result {
            Ok(decision) => Ok(Some(decision)),
            Err(err) => {
                warn!(actor, %kind, error = %err, "AI decision failed, using random policy");
                Ok(None)
            }
        }
    }

    pub async fn ai_speak(
        &self,
        speaker: PlayerId,
        context: String,
    ) -> Result<Option<String>, EngineError> {
        if !self.decisions.is_enabled() {
            return Ok(None);
        }
        let Some(player) = self.player(speaker) else {
            return Ok(None);
        };
        let Some(role) = player.role else {
            return Ok(None);
        };
        let request = SpeechRequest {
            speaker_id: speaker,
            speaker_name: player.name.clone(),
            role,
            context,
            history: self.history.format_recent(HISTORY_CONTEXT_RECORDS),
        };

        let result = self.decisions.speak(&request).await;
        self.ensure_current()?;

        match result {
            Ok(speech) => Ok(Some(speech)),
            Err(err) => {
                warn!(speaker, error = %err, "AI speech failed, using phrase bank");
                Ok(None)
            }
        }
    }

    pub fn tuning(&self) -> AiTuning {
        *self.decisions.tuning()
    }

    // --- players ------------------------------------------------------------

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn human(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_human)
    }

    pub fn is_human(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.is_human)
    }

    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.is_alive)
    }

    pub fn label(&self, id: PlayerId) -> String {
        self.player(id)
            .map(Player::label)
            .unwrap_or_else(|| format!("Unknown (ID: {id})"))
    }

    /// Alive player ids in ascending order.
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_alive)
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn alive_with_role(&self, role: Role) -> Vec<PlayerId> {
        self.alive_ids()
            .into_iter()
            .filter(|id| self.player(*id).is_some_and(|p| p.has_role(role)))
            .collect()
    }

    /// Marks `id` dead. Returns `false` if they already were.
    pub fn kill_player(&mut self, id: PlayerId) -> bool {
        match self.player_mut(id) {
            Some(player) if player.is_alive => {
                player.kill();
                debug!(player = id, "player died");
                true
            }
            _ => false,
        }
    }

    fn candidates(&self, ids: &[PlayerId]) -> Vec<Candidate> {
        ids.iter()
            .filter_map(|id| self.player(*id))
            .map(|p| Candidate {
                id: p.id,
                name: p.name.clone(),
            })
            .collect()
    }
}

/// Village wins once no werewolf lives. Werewolves win when they match the
/// rest of the living, but never before the first night has passed.
pub fn check_winner(players: &[Player], day: u32) -> Option<Winner> {
    let alive = players.iter().filter(|p| p.is_alive);
    let wolves = alive.clone().filter(|p| p.is_werewolf()).count();
    let others = alive.filter(|p| !p.is_werewolf()).count();

    if wolves == 0 {
        Some(Winner::Village)
    } else if day >= 1 && wolves >= others {
        Some(Winner::Werewolf)
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::{no_ai, seated_engine};
    use super::*;
    use crate::ai::decision::testing::ScriptedCompletion;
    use crate::error::PromptError;
    use crate::game::observer::testing::{ObserverEvent, RecordingObserver};
    use crate::game::session::SessionCounter;
    use crate::types::Abilities;

    fn villagers_and(wolves: usize, others: usize) -> Vec<Player> {
        let mut players = Vec::new();
        for i in 0..(wolves + others) {
            let mut p = create_player(i as PlayerId + 1, format!("P{i}"), i == 0);
            p.role = Some(if i < wolves { Role::Werewolf } else { Role::Villager });
            players.push(p);
        }
        players
    }

    #[test]
    fn village_wins_without_werewolves() {
        let mut players = villagers_and(1, 3);
        players[0].kill();
        assert_eq!(check_winner(&players, 2), Some(Winner::Village));
    }

    #[test]
    fn werewolves_win_at_parity_after_first_night() {
        let players = villagers_and(2, 2);
        assert_eq!(check_winner(&players, 1), Some(Winner::Werewolf));
        assert_eq!(check_winner(&players, 0), None);
    }

    #[test]
    fn game_continues_while_village_outnumbers() {
        let players = villagers_and(2, 3);
        assert_eq!(check_winner(&players, 3), None);
    }

    #[tokio::test]
    async fn setup_seats_human_first_and_deals_roles() {
        let (observer, _prompts) = RecordingObserver::new();
        let counter = SessionCounter::new();
        let mut engine = Engine::new(
            Arc::new(observer.clone()),
            no_ai(),
            AnswerHandle::new(),
            counter.issue(),
        );
        let settings = GameSettings {
            player_name: "Ada".to_string(),
            seed: Some(99),
            ..GameSettings::default()
        };
        engine.setup(&settings).unwrap();

        assert_eq!(engine.players().len(), 8);
        let human = engine.human().unwrap();
        assert_eq!((human.id, human.name.as_str()), (1, "Ada"));
        assert!(engine.players().iter().all(|p| p.role.is_some()));
        let names: HashSet<&str> = engine.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 8, "names are unique");
        assert!(observer
            .messages()
            .iter()
            .any(|m| m.starts_with("Your role is:")));
    }

    #[tokio::test]
    async fn setup_rejects_bad_tables_without_announcing() {
        let (observer, _prompts) = RecordingObserver::new();
        let counter = SessionCounter::new();
        let mut engine = Engine::new(
            Arc::new(observer.clone()),
            no_ai(),
            AnswerHandle::new(),
            counter.issue(),
        );
        let settings = GameSettings {
            player_count: 2,
            ..GameSettings::default()
        };
        assert_eq!(
            engine.setup(&settings),
            Err(SetupError::TooFewPlayers { found: 2 })
        );
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn ask_round_trips_an_answer() {
        let (observer, mut prompts) = RecordingObserver::new();
        let (engine, answers, _counter) =
            seated_engine(&[Role::Villager, Role::Werewolf], Arc::new(observer), no_ai(), 1);

        let waiter = tokio::spawn(async move { engine.ask("Your name?").await });
        assert_eq!(
            prompts.recv().await,
            Some(ObserverEvent::Question("Your name?".to_string()))
        );
        assert!(answers.submit_answer("Ada"));
        assert_eq!(waiter.await.unwrap(), Ok("Ada".to_string()));
    }

    #[tokio::test]
    async fn select_option_reprompts_until_valid() {
        let (observer, mut prompts) = RecordingObserver::new();
        let (engine, answers, _counter) = seated_engine(
            &[Role::Villager, Role::Werewolf],
            Arc::new(observer.clone()),
            no_ai(),
            1,
        );
        let options = vec!["a".to_string(), "b".to_string()];

        let waiter = tokio::spawn(async move { engine.select_option(&options, "pick").await });
        for answer in ["7", "x", "1"] {
            let prompt = prompts.recv().await.unwrap();
            assert!(matches!(prompt, ObserverEvent::Options(ref text, _) if text == "pick"));
            assert!(answers.submit_answer(answer));
        }
        assert_eq!(waiter.await.unwrap(), Ok(Some(1)));
        let warnings = observer
            .events()
            .into_iter()
            .filter(|e| matches!(e, ObserverEvent::Message(_, MessageCategory::Warning)))
            .count();
        assert_eq!(warnings, 2);
    }

    #[tokio::test]
    async fn select_option_cancel_returns_none() {
        let (observer, mut prompts) = RecordingObserver::new();
        let (engine, answers, _counter) =
            seated_engine(&[Role::Villager, Role::Werewolf], Arc::new(observer), no_ai(), 1);
        let options = vec!["a".to_string()];

        let waiter = tokio::spawn(async move { engine.select_option(&options, "pick").await });
        prompts.recv().await.unwrap();
        answers.submit_answer("-1");
        assert_eq!(waiter.await.unwrap(), Ok(None));
    }

    #[tokio::test]
    async fn yes_no_accepts_case_insensitive_answers() {
        let (observer, mut prompts) = RecordingObserver::new();
        let (engine, answers, _counter) =
            seated_engine(&[Role::Villager, Role::Werewolf], Arc::new(observer), no_ai(), 1);

        let waiter = tokio::spawn(async move { engine.ask_yes_no("Save?").await });
        prompts.recv().await.unwrap();
        answers.submit_answer("maybe");
        prompts.recv().await.unwrap();
        answers.submit_answer("Y");
        assert_eq!(waiter.await.unwrap(), Ok(true));
    }

    #[tokio::test]
    async fn reset_cancels_a_pending_question() {
        let (observer, mut prompts) = RecordingObserver::new();
        let (engine, answers, counter) =
            seated_engine(&[Role::Villager, Role::Werewolf], Arc::new(observer), no_ai(), 1);

        let waiter = tokio::spawn(async move { engine.ask("still there?").await });
        prompts.recv().await.unwrap();
        counter.invalidate();
        answers.close();

        assert_eq!(
            waiter.await.unwrap(),
            Err(EngineError::Prompt(PromptError::Cancelled))
        );
        assert!(!answers.submit_answer("late"));
    }

    #[tokio::test(start_paused = true)]
    async fn late_ai_answer_cannot_touch_a_replaced_game() {
        let (observer, _prompts) = RecordingObserver::new();
        let completion = ScriptedCompletion::new([r#"{"targetId": 1}"#])
            .with_delay(Duration::from_secs(2));
        let decisions = DecisionProvider::new(
            Some(Arc::new(completion)),
            Duration::from_secs(10),
            AiTuning::default(),
        );
        let (engine, _answers, counter) = seated_engine(
            &[Role::Villager, Role::Werewolf],
            Arc::new(observer.clone()),
            decisions,
            1,
        );

        let pending = tokio::spawn(async move {
            engine
                .ai_decide(DecisionKind::Kill, 2, &[1], "night".to_string())
                .await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        counter.invalidate();

        assert_eq!(pending.await.unwrap(), Err(EngineError::Cancelled));
    }

    #[tokio::test]
    async fn stale_engine_stays_silent() {
        let (observer, _prompts) = RecordingObserver::new();
        let (engine, _answers, counter) = seated_engine(
            &[Role::Villager, Role::Werewolf],
            Arc::new(observer.clone()),
            no_ai(),
            1,
        );
        counter.invalidate();
        engine.message("hello", MessageCategory::Info);
        engine.publish_state();
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn failed_ai_decision_falls_back() {
        let (observer, _prompts) = RecordingObserver::new();
        let decisions = DecisionProvider::new(
            Some(Arc::new(ScriptedCompletion::new(["not json"]))),
            Duration::from_secs(1),
            AiTuning::default(),
        );
        let (engine, _answers, _counter) = seated_engine(
            &[Role::Villager, Role::Werewolf],
            Arc::new(observer),
            decisions,
            1,
        );
        let decision = engine
            .ai_decide(DecisionKind::Kill, 2, &[1], "night".to_string())
            .await
            .unwrap();
        assert_eq!(decision, None);
    }

    fn scripted(replies: &[&str]) -> DecisionProvider {
        DecisionProvider::new(
            Some(Arc::new(ScriptedCompletion::new(replies.iter().copied()))),
            Duration::from_secs(1),
            AiTuning::default(),
        )
    }

    #[tokio::test]
    async fn reachable_ai_is_announced() {
        let (observer, _prompts) = RecordingObserver::new();
        let (mut engine, _answers, _counter) = seated_engine(
            &[Role::Villager, Role::Werewolf, Role::Villager],
            Arc::new(observer.clone()),
            scripted(&["OK"]),
            1,
        );
        engine.ai_requested = true;
        engine.announce_ai().await.unwrap();

        assert!(engine.decisions.is_enabled());
        assert_eq!(observer.messages(), vec!["AI players enabled.".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_ai_is_switched_off_with_a_notice() {
        let (observer, _prompts) = RecordingObserver::new();
        let (mut engine, _answers, _counter) = seated_engine(
            &[Role::Villager, Role::Werewolf, Role::Villager],
            Arc::new(observer.clone()),
            scripted(&[]),
            1,
        );
        engine.ai_requested = true;
        engine.announce_ai().await.unwrap();

        assert!(!engine.decisions.is_enabled());
        assert_eq!(
            observer.messages(),
            vec!["AI unavailable, NPCs will act randomly.".to_string()]
        );
    }

    #[tokio::test]
    async fn six_player_cycle_kills_the_seer_and_returns_to_night() {
        let (observer, mut prompts) = RecordingObserver::new();
        // Human witch; the wolf goes for the seer, NPC ballots pile onto 4.
        let decisions = scripted(&[
            r#"{"targetId": 3}"#,
            r#"{"targetId": 2}"#,
            "Something feels off about this village.",
            "I slept badly, but I am innocent.",
            "We should be careful with our votes.",
            "Let us hear everyone first.",
            r#"{"targetId": 4}"#,
            r#"{"targetId": 5}"#,
            r#"{"targetId": 4}"#,
            r#"{"targetId": 4}"#,
        ]);
        let (mut engine, answers, _counter) = seated_engine(
            &[
                Role::Witch,
                Role::Werewolf,
                Role::Seer,
                Role::Villager,
                Role::Villager,
                Role::Villager,
            ],
            Arc::new(observer.clone()),
            decisions,
            6,
        );

        let feeder = tokio::spawn(async move {
            // Keep the antidote, keep the poison, speak, abstain.
            for answer in ["n", "n", "I saw nothing.", "-1"] {
                prompts.recv().await.unwrap();
                answers.submit_answer(answer);
            }
        });

        engine.publish_state();
        night::run_night(&mut engine).await.unwrap();
        assert_eq!(engine.state.day, 1);
        assert_eq!(engine.state.night_killed, Some(vec![3]));
        assert!(!engine.is_alive(3));
        assert_eq!(engine.alive_ids(), vec![1, 2, 4, 5, 6]);
        assert_eq!(
            engine.player(1).unwrap().abilities,
            Abilities::Witch {
                has_medicine: true,
                has_poison: true,
            }
        );

        day::run_day(&mut engine).await.unwrap();
        let speakers: Vec<PlayerId> = engine
            .state
            .discussions_on(1)
            .map(|d| d.player_id)
            .collect();
        assert_eq!(speakers, vec![1, 2, 4, 5, 6]);

        voting::run_voting(&mut engine).await.unwrap();
        feeder.await.unwrap();
        assert_eq!(engine.state.votes.get(&1), Some(&None));
        assert!(!engine.is_alive(4));
        assert_eq!(engine.check_winner(), None);

        let mut phases: Vec<Phase> = Vec::new();
        for event in observer.events() {
            if let ObserverEvent::State(snapshot) = event {
                if phases.last() != Some(&snapshot.phase) {
                    phases.push(snapshot.phase);
                }
            }
        }
        assert_eq!(
            phases,
            vec![
                Phase::Setup,
                Phase::Night,
                Phase::DayDiscussion,
                Phase::Voting,
                Phase::Night,
            ]
        );
    }
}
