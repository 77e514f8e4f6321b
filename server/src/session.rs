use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::content::ContentStore;
use crate::error::{InvalidOperation, SessionError};
use crate::game_logic::{GameState, Presenter, RoundPhase, SessionCommand, StateContext};

const CLOCK_PERIOD: StdDuration = StdDuration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// The command was not valid in the current state. Its effect, if any, is
    /// visible in the reply: `random` without an eligible category still leaves
    /// wildcard mode.
    Ignored(InvalidOperation),
    LoadFailed(String),
}

#[derive(Debug, Clone)]
pub struct CommandReply {
    pub outcome: CommandOutcome,
    pub phase: RoundPhase,
    pub context: StateContext,
}

#[derive(Debug)]
pub enum SessionMessage {
    Execute {
        command: SessionCommand,
        respond_to: oneshot::Sender<CommandReply>,
    },
}

pub struct SessionActor<P: Presenter> {
    receiver: mpsc::Receiver<SessionMessage>,
    game: GameState<P>,
    content_store: Arc<dyn ContentStore>,
}

impl<P: Presenter> SessionActor<P> {
    fn new(
        receiver: mpsc::Receiver<SessionMessage>,
        game: GameState<P>,
        content_store: Arc<dyn ContentStore>,
    ) -> Self {
        SessionActor {
            receiver,
            game,
            content_store,
        }
    }

    async fn handle_message(&mut self, msg: SessionMessage) {
        match msg {
            SessionMessage::Execute {
                command,
                respond_to,
            } => {
                let outcome = self.execute(command).await;
                let (phase, context) = self.game.snapshot();
                if respond_to
                    .send(CommandReply {
                        outcome,
                        phase,
                        context,
                    })
                    .is_err()
                {
                    tracing::debug!("Command caller went away before the reply");
                }
            }
        }
    }

    #[tracing::instrument(skip(self), fields(phase = ?self.game.phase()))]
    async fn execute(&mut self, command: SessionCommand) -> CommandOutcome {
        let result = match command {
            SessionCommand::SelectCategory { category_id } => {
                self.game.select_category(&category_id)
            }
            SessionCommand::SetDifficulty { difficulty } => self.game.set_difficulty(&difficulty),
            SessionCommand::EnterWildcardMode => self.game.enter_wildcard_mode(),
            SessionCommand::ExitWildcardMode => self.game.exit_wildcard_mode(),
            SessionCommand::PickRandomCategory => self.game.pick_random_category(),
            SessionCommand::DrawNext => self.game.draw_next(),
            SessionCommand::Reveal => self.game.reveal(),
            SessionCommand::SwitchLanguage { language } => {
                let loaded = self.content_store.fetch_bundle(&language).await;
                return match self.game.switch_language(&language, loaded) {
                    Ok(()) => CommandOutcome::Applied,
                    Err(err) => CommandOutcome::LoadFailed(err.to_string()),
                };
            }
            SessionCommand::Status => {
                self.game.publish();
                Ok(())
            }
        };

        match result {
            Ok(()) => CommandOutcome::Applied,
            Err(invalid) => {
                tracing::debug!(reason = %invalid, "Command ignored");
                CommandOutcome::Ignored(invalid)
            }
        }
    }
}

#[tracing::instrument(skip(actor))]
pub async fn run_session_actor<P: Presenter>(mut actor: SessionActor<P>) {
    tracing::info!("Session actor started");

    let mut clock = tokio::time::interval_at(Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe_msg = actor.receiver.recv() => {
                match maybe_msg {
                    Some(msg) => {
                        let timer_before = actor.game.timer_id();
                        actor.handle_message(msg).await;
                        if actor.game.timer_running() && actor.game.timer_id() != timer_before {
                            // Count whole seconds from the moment the round started.
                            clock.reset();
                        }
                    }
                    None => {
                        tracing::info!("Session channel closed. Shutting down");
                        break;
                    }
                }
            }
            _ = clock.tick(), if actor.game.timer_running() => {
                actor.game.advance_clock();
            }
        }
    }

    tracing::info!("Session actor stopped");
}

#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub fn spawn<P: Presenter + 'static>(
        buffer_size: usize,
        game: GameState<P>,
        content_store: Arc<dyn ContentStore>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = SessionActor::new(receiver, game, content_store);
        tokio::spawn(run_session_actor(actor));
        Self { sender }
    }

    pub async fn execute(&self, command: SessionCommand) -> Result<CommandReply, SessionError> {
        let (respond_to, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Execute {
                command,
                respond_to,
            })
            .await
            .map_err(|_| SessionError::ActorUnavailable)?;
        rx.await.map_err(|_| SessionError::ResponseDropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::content::ContentBundle;
    use crate::content::test_support::{StaticContentStore, category, question, wildcard};
    use crate::game_logic::ChannelPresenter;
    use crate::game_logic::game_state::PlayMode;
    use crate::game_logic::messages::SessionEvent;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn bundle(prefix: &str) -> ContentBundle {
        ContentBundle {
            categories: vec![category("SCIENCE"), category("ART")],
            questions: vec![
                question("SCIENCE", "hard", &format!("{prefix}-q1")),
                question("SCIENCE", "hard", &format!("{prefix}-q2")),
                question("ART", "easy", &format!("{prefix}-a1")),
            ],
            wildcard_questions: vec![wildcard(&format!("{prefix}-w1"))],
        }
    }

    fn spawn_session() -> (SessionHandle, UnboundedReceiver<SessionEvent>) {
        let store = StaticContentStore::default()
            .with_bundle("en", bundle("en"))
            .with_bundle("sv", bundle("sv"));
        let (presenter, events) = ChannelPresenter::new();
        let game = GameState::with_rng(
            presenter,
            SessionConfig::default(),
            StdRng::seed_from_u64(5),
        );
        (SessionHandle::spawn(8, game, Arc::new(store)), events)
    }

    async fn run(handle: &SessionHandle, line: &str) -> CommandReply {
        handle.execute(line.parse().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_commands_flow_through_actor() {
        let (handle, _events) = spawn_session();

        let reply = run(&handle, "next").await;
        assert_eq!(
            reply.outcome,
            CommandOutcome::Ignored(InvalidOperation::ContentNotLoaded)
        );

        assert_eq!(run(&handle, "lang en").await.outcome, CommandOutcome::Applied);
        run(&handle, "difficulty hard").await;
        run(&handle, "category SCIENCE").await;

        let first = run(&handle, "next").await;
        assert_eq!(first.phase, RoundPhase::QuestionActive);
        assert_eq!(first.context.pool_remaining, Some(1));

        run(&handle, "next").await;
        let exhausted = run(&handle, "next").await;
        assert_eq!(exhausted.phase, RoundPhase::Exhausted);
        assert_eq!(exhausted.context.prompt, None);

        let reveal = run(&handle, "reveal").await;
        assert_eq!(
            reveal.outcome,
            CommandOutcome::Ignored(InvalidOperation::NothingToReveal)
        );
    }

    #[tokio::test]
    async fn test_language_switch_starts_fresh_session() {
        let (handle, mut events) = spawn_session();
        run(&handle, "lang en").await;
        run(&handle, "category ART").await;
        run(&handle, "next").await;
        assert_eq!(run(&handle, "next").await.phase, RoundPhase::Exhausted);

        let switched = run(&handle, "lang sv").await;
        assert_eq!(switched.phase, RoundPhase::Idle);
        assert_eq!(switched.context.language.as_deref(), Some("sv"));

        run(&handle, "category ART").await;
        let reply = run(&handle, "next").await;
        assert_eq!(reply.context.prompt.as_deref(), Some("sv-a1"));

        let failed = run(&handle, "lang xx").await;
        assert!(matches!(failed.outcome, CommandOutcome::LoadFailed(_)));
        assert_eq!(failed.context.language, None);

        let mut saw_load_error = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::LoadError { .. }) {
                saw_load_error = true;
            }
        }
        assert!(saw_load_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_timer_expires_on_the_clock() {
        let (handle, _events) = spawn_session();
        run(&handle, "lang en").await;
        run(&handle, "category ART").await;
        let started = run(&handle, "next").await;
        assert_eq!(started.context.timer_remaining, Some(30));

        tokio::time::sleep(StdDuration::from_millis(10_500)).await;
        let midway = run(&handle, "status").await;
        assert_eq!(midway.phase, RoundPhase::QuestionActive);
        assert_eq!(midway.context.timer_remaining, Some(20));

        tokio::time::sleep(StdDuration::from_secs(21)).await;
        let expired = run(&handle, "status").await;
        assert_eq!(expired.phase, RoundPhase::Revealed);
        assert!(expired.context.timed_out);
        assert_eq!(expired.context.answer.as_deref(), Some("answer to en-a1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_stops_the_clock() {
        let (handle, mut events) = spawn_session();
        run(&handle, "lang en").await;
        run(&handle, "wildcard").await;
        let revealed = run(&handle, "reveal").await;
        assert_eq!(revealed.phase, RoundPhase::Revealed);
        assert_eq!(revealed.context.mode, PlayMode::Wildcard);
        while events.try_recv().is_ok() {}

        tokio::time::sleep(StdDuration::from_secs(45)).await;
        assert!(events.try_recv().is_err());

        let status = run(&handle, "status").await;
        assert!(!status.context.timed_out);
    }

    #[tokio::test]
    async fn test_queued_events_survive_session_shutdown() {
        let (handle, mut events) = spawn_session();
        run(&handle, "lang en").await;
        run(&handle, "category ART").await;
        run(&handle, "next").await;
        drop(handle);

        let mut last = None;
        while let Some(event) = events.recv().await {
            last = Some(event);
        }
        match last {
            Some(SessionEvent::StateChanged { phase, context }) => {
                assert_eq!(phase, RoundPhase::QuestionActive);
                assert_eq!(context.prompt.as_deref(), Some("en-a1"));
            }
            other => panic!("unexpected last event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_random_without_candidates_still_leaves_wildcard() {
        let (handle, mut events) = spawn_session();
        run(&handle, "lang en").await;
        run(&handle, "difficulty impossible").await;
        run(&handle, "wildcard").await;
        while events.try_recv().is_ok() {}

        let reply = run(&handle, "random").await;
        assert_eq!(
            reply.outcome,
            CommandOutcome::Ignored(InvalidOperation::NoEligibleCategory(
                "impossible".to_string()
            ))
        );
        assert_eq!(reply.context.mode, PlayMode::Category);
        assert_eq!(reply.phase, RoundPhase::Idle);
        assert_eq!(reply.context.timer_remaining, None);
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::StateChanged { phase: RoundPhase::Idle, .. })
        ));
    }
}
