use tokio::sync::mpsc;

use crate::game_logic::game_state::{PlayMode, RoundPhase, StateContext};
use crate::game_logic::messages::SessionEvent;

/// Observer of session state. Implementations render; they never mutate the session.
pub trait Presenter: Send {
    fn on_state_changed(&mut self, phase: RoundPhase, context: &StateContext);

    fn on_load_error(&mut self, message: &str);
}

/// Forwards every event to a channel so rendering runs outside the session actor.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Presenter receiver dropped, event discarded");
        }
    }
}

impl Presenter for ChannelPresenter {
    fn on_state_changed(&mut self, phase: RoundPhase, context: &StateContext) {
        self.forward(SessionEvent::StateChanged {
            phase,
            context: context.clone(),
        });
    }

    fn on_load_error(&mut self, message: &str) {
        self.forward(SessionEvent::LoadError {
            message: message.to_string(),
        });
    }
}

/// One line of console text for an event.
pub fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::LoadError { message } => {
            format!("Failed to load questions: {message}")
        }
        SessionEvent::StateChanged { phase, context } => describe_state(*phase, context),
    }
}

fn describe_state(phase: RoundPhase, context: &StateContext) -> String {
    let meta = match context.mode {
        PlayMode::Wildcard => "BRAINFREEZER".to_string(),
        PlayMode::Category => match &context.category_name {
            Some(name) => format!("{name} • {}", context.difficulty),
            None => format!("— • {}", context.difficulty),
        },
    };
    let pool = match (context.pool_remaining, context.pool_total) {
        (Some(left), Some(total)) => format!(" • {left}/{total} left"),
        _ => String::new(),
    };
    let timer = context
        .timer_remaining
        .map(|seconds| format!(" [{seconds}s]"))
        .unwrap_or_default();

    let body = match phase {
        RoundPhase::Idle => "Pick a category, then press “New Question”.".to_string(),
        RoundPhase::CategoryReady => "Category selected. Press “New Question”.".to_string(),
        RoundPhase::WildcardReady => "Brainfreezer ready.".to_string(),
        RoundPhase::QuestionActive => context.prompt.clone().unwrap_or_default(),
        RoundPhase::Revealed => {
            let prompt = context.prompt.clone().unwrap_or_default();
            let answer = context.answer.clone().unwrap_or_default();
            if context.timed_out {
                format!("{prompt} → {answer} (time's up)")
            } else {
                format!("{prompt} → {answer}")
            }
        }
        RoundPhase::Exhausted => match context.mode {
            PlayMode::Wildcard => "No Brainfreezers left (this session).".to_string(),
            PlayMode::Category => {
                "No questions left for this category + difficulty (this session).".to_string()
            }
        },
    };

    format!("[{meta}{pool}]{timer} {body}")
}
