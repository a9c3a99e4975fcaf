use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ai::{DecisionProvider, LlmClient};
use crate::config::Config;
use crate::error::{EngineError, SetupError};
use crate::game::engine::{Engine, GameSettings};
use crate::game::observer::GameObserver;
use crate::game::prompt::AnswerHandle;
use crate::game::session::SessionCounter;

/// Builds the decision provider every session starts from. Without an API key
/// the provider is disabled and NPCs use their random policy.
pub fn decision_provider(config: &Config) -> DecisionProvider {
    match LlmClient::new(&config.llm) {
        Ok(client) if client.has_api_key() => {
            info!(provider = %client.provider(), "AI decisions enabled");
            DecisionProvider::new(Some(Arc::new(client)), config.llm.timeout, config.tuning)
        }
        Ok(client) => {
            warn!(
                provider = %client.provider(),
                "no API key configured, NPCs will act randomly"
            );
            DecisionProvider::disabled(config.tuning)
        }
        Err(e) => {
            warn!(error = %e, "could not build the LLM client, NPCs will act randomly");
            DecisionProvider::disabled(config.tuning)
        }
    }
}

/// One game session per connection. Starting a game replaces whatever was
/// running before.
pub struct Room {
    decisions: DecisionProvider,
    sessions: SessionCounter,
    answers: AnswerHandle,
    task: Option<JoinHandle<()>>,
}

impl Room {
    pub fn new(decisions: DecisionProvider) -> Self {
        Self {
            decisions,
            sessions: SessionCounter::new(),
            answers: AnswerHandle::new(),
            task: None,
        }
    }

    /// Sets the new game up synchronously, then spawns its loop. Setup errors
    /// leave the room idle.
    pub fn start_game(
        &mut self,
        settings: &GameSettings,
        observer: Arc<dyn GameObserver>,
    ) -> Result<(), SetupError> {
        self.reset_game();

        let token = self.sessions.issue();
        let generation = token.generation();
        self.answers = AnswerHandle::new();
        let mut engine = Engine::new(observer, self.decisions.clone(), self.answers.clone(), token);
        engine.setup(settings)?;

        self.task = Some(tokio::spawn(async move {
            match engine.run().await {
                Ok(winner) => info!(generation, ?winner, "session finished"),
                Err(EngineError::Cancelled) | Err(EngineError::Prompt(_)) => {
                    debug!(generation, "session cancelled")
                }
                Err(e) => warn!(generation, error = %e, "session ended abnormally"),
            }
        }));
        Ok(())
    }

    /// Hands the UI's answer to the suspended question, if any.
    pub fn submit_answer(&self, value: impl Into<String>) -> bool {
        self.answers.submit_answer(value)
    }

    pub fn has_pending_question(&self) -> bool {
        self.answers.has_pending()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels the running session. Its pending question resolves to a
    /// cancellation and anything it still produces is dropped.
    pub fn reset_game(&mut self) {
        self.sessions.invalidate();
        self.answers.close();
        if let Some(task) = self.task.take() {
            task.abort();
            info!("session reset");
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.reset_game();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::AiTuning;
    use crate::game::observer::testing::{ObserverEvent, RecordingObserver};
    use crate::game::role::RoleDistribution;
    use crate::types::Role;

    fn room() -> Room {
        Room::new(DecisionProvider::disabled(AiTuning::default()))
    }

    fn settings(player_count: usize) -> GameSettings {
        GameSettings {
            player_name: "Alice".to_string(),
            player_count,
            use_ai: false,
            seed: Some(7),
            ..GameSettings::default()
        }
    }

    /// Every seat acts on the first night, so the human is always asked.
    fn busy_table() -> GameSettings {
        GameSettings {
            role_distribution: Some(
                RoleDistribution::empty()
                    .with(Role::Werewolf, 1)
                    .with(Role::Guard, 2),
            ),
            ..settings(3)
        }
    }

    async fn next_prompt(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ObserverEvent>) {
        loop {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Some(ObserverEvent::Question(_) | ObserverEvent::Options(..))) => return,
                Ok(Some(_)) => continue,
                other => panic!("no prompt arrived: {other:?}"),
            }
        }
    }

    #[test]
    fn provider_is_disabled_without_an_api_key() {
        assert!(!decision_provider(&Config::default()).is_enabled());

        let with_key = Config::from_lookup(|key| {
            (key == "GEMINI_API_KEY").then(|| "test-key".to_string())
        });
        assert!(decision_provider(&with_key).is_enabled());
    }

    #[tokio::test]
    async fn ai_game_without_a_key_says_so() {
        let mut room = Room::new(decision_provider(&Config::default()));
        let (observer, mut rx) = RecordingObserver::new();
        let settings = GameSettings {
            use_ai: true,
            ..busy_table()
        };
        room.start_game(&settings, Arc::new(observer.clone())).unwrap();
        next_prompt(&mut rx).await;

        let notices: Vec<String> = observer
            .messages()
            .into_iter()
            .filter(|m| m.starts_with("AI "))
            .collect();
        assert_eq!(notices, vec!["AI unavailable, NPCs will act randomly.".to_string()]);
    }

    #[tokio::test]
    async fn bad_settings_are_returned_and_nothing_runs() {
        let mut room = room();
        let (observer, _rx) = RecordingObserver::new();
        let err = room
            .start_game(&settings(2), Arc::new(observer.clone()))
            .unwrap_err();
        assert_eq!(err, SetupError::TooFewPlayers { found: 2 });
        assert!(!room.is_running());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn answers_without_a_question_are_rejected() {
        let room = room();
        assert!(!room.submit_answer("0"));
    }

    #[tokio::test]
    async fn reset_cancels_the_waiting_game() {
        let mut room = room();
        let (observer, mut rx) = RecordingObserver::new();
        room.start_game(&busy_table(), Arc::new(observer)).unwrap();
        next_prompt(&mut rx).await;
        assert!(room.has_pending_question());

        room.reset_game();
        assert!(!room.has_pending_question());
        assert!(!room.submit_answer("0"));
    }

    #[tokio::test]
    async fn restarting_silences_the_previous_session() {
        let mut room = room();
        let (first, mut first_rx) = RecordingObserver::new();
        room.start_game(&busy_table(), Arc::new(first.clone())).unwrap();
        next_prompt(&mut first_rx).await;
        let seen_before = first.events().len();

        let (second, mut second_rx) = RecordingObserver::new();
        room.start_game(&busy_table(), Arc::new(second)).unwrap();
        next_prompt(&mut second_rx).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(first.events().len(), seen_before);
        assert!(room.is_running());
    }
}
