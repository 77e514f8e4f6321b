use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{ExhaustionPolicy, SessionConfig};
use crate::content::{ContentBundle, Identified, Question, WildcardQuestion};
use crate::error::{ContentError, InvalidOperation};
use crate::game_logic::partition::PartitionIndex;
use crate::game_logic::presenter::Presenter;
use crate::game_logic::sampler::{SampleError, Sampler, UsedSet};
use crate::game_logic::timer::{RoundTimer, TimerEvent, TimerId};
use crate::game_logic::utils::partition_pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    Category,
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No category or wildcard play is active.
    Idle,
    CategoryReady,
    WildcardReady,
    /// Question shown, timer running, answer hidden.
    QuestionActive,
    Revealed,
    /// Every item of the active pool was drawn this session.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "question")]
pub enum ActiveQuestion {
    Normal(Question),
    Wildcard(WildcardQuestion),
}

impl ActiveQuestion {
    pub fn prompt(&self) -> &str {
        match self {
            ActiveQuestion::Normal(q) => &q.prompt,
            ActiveQuestion::Wildcard(q) => &q.prompt,
        }
    }

    pub fn answer(&self) -> &str {
        match self {
            ActiveQuestion::Normal(q) => &q.answer,
            ActiveQuestion::Wildcard(q) => &q.answer,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    mode: PlayMode,
    current_category: Option<String>,
    current_difficulty: String,
    current_question: Option<ActiveQuestion>,
    phase: RoundPhase,
    timed_out: bool,
}

impl SessionState {
    fn new(difficulty: String) -> Self {
        Self {
            mode: PlayMode::Category,
            current_category: None,
            current_difficulty: difficulty,
            current_question: None,
            phase: RoundPhase::Idle,
            timed_out: false,
        }
    }

    fn end_round(&mut self) {
        self.current_question = None;
        self.timed_out = false;
    }
}

/// What a presenter needs to render the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateContext {
    pub language: Option<String>,
    pub mode: PlayMode,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub difficulty: String,
    pub pool_remaining: Option<usize>,
    pub pool_total: Option<usize>,
    pub prompt: Option<String>,
    /// Only present once the answer is revealed.
    pub answer: Option<String>,
    pub timer_remaining: Option<u32>,
    pub timed_out: bool,
}

/// The session aggregate: sole owner and mutator of selections, round
/// phase and sampling history.
pub struct GameState<P: Presenter> {
    presenter: P,
    settings: SessionConfig,
    sampler: Sampler,
    rng: StdRng,
    language: Option<String>,
    content: Option<Arc<ContentBundle>>,
    partitions: PartitionIndex,
    timer: RoundTimer,
    session: SessionState,
}

impl<P: Presenter> GameState<P> {
    pub fn new(presenter: P, settings: SessionConfig) -> Self {
        Self::with_rng(presenter, settings, StdRng::from_entropy())
    }

    pub fn with_rng(presenter: P, settings: SessionConfig, rng: StdRng) -> Self {
        let session = SessionState::new(settings.default_difficulty.clone());
        Self {
            presenter,
            sampler: Sampler::new(settings.max_draw_attempts),
            settings,
            rng,
            language: None,
            content: None,
            partitions: PartitionIndex::default(),
            timer: RoundTimer::new(),
            session,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.session.phase
    }

    #[cfg(test)]
    pub fn mode(&self) -> PlayMode {
        self.session.mode
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    #[cfg(test)]
    pub fn current_question(&self) -> Option<&ActiveQuestion> {
        self.session.current_question.as_ref()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn timer_id(&self) -> Option<TimerId> {
        self.timer.current_id()
    }

    pub fn select_category(&mut self, category_id: &str) -> Result<(), InvalidOperation> {
        let content = self.loaded_content()?;
        if content.category(category_id).is_none() {
            tracing::warn!(category.id = %category_id, "Selected category is not listed in content");
        }

        self.timer.cancel();
        self.session.mode = PlayMode::Category;
        self.session.current_category = Some(category_id.to_string());
        self.session.end_round();
        self.session.phase = RoundPhase::CategoryReady;

        tracing::info!(category.id = %category_id, "Category selected");
        self.publish();
        Ok(())
    }

    /// Change difficulty. Ends the round and forces a new category pick;
    /// sampling history is kept.
    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), InvalidOperation> {
        self.timer.cancel();
        self.session.current_difficulty = difficulty.trim().to_string();
        self.session.mode = PlayMode::Category;
        self.session.current_category = None;
        self.session.end_round();
        self.session.phase = RoundPhase::Idle;

        tracing::info!(difficulty = %self.session.current_difficulty, "Difficulty set");
        self.publish();
        Ok(())
    }

    /// Wildcard play is always hot: entering draws immediately.
    pub fn enter_wildcard_mode(&mut self) -> Result<(), InvalidOperation> {
        self.loaded_content()?;

        self.timer.cancel();
        self.session.mode = PlayMode::Wildcard;
        self.session.end_round();
        self.session.phase = RoundPhase::WildcardReady;

        tracing::info!("Entered wildcard mode");
        self.draw_next()
    }

    pub fn exit_wildcard_mode(&mut self) -> Result<(), InvalidOperation> {
        if self.session.mode != PlayMode::Wildcard {
            return Err(InvalidOperation::NotInWildcardMode);
        }

        self.leave_wildcard();
        tracing::info!("Exited wildcard mode");
        self.publish();
        Ok(())
    }

    fn leave_wildcard(&mut self) {
        self.timer.cancel();
        self.session.mode = PlayMode::Category;
        self.session.end_round();
        self.session.phase = if self.session.current_category.is_some() {
            RoundPhase::CategoryReady
        } else {
            RoundPhase::Idle
        };
    }

    /// Pick uniformly among categories with at least one question at the current difficulty.
    pub fn pick_random_category(&mut self) -> Result<(), InvalidOperation> {
        let content = self.loaded_content()?;

        let left_wildcard = self.session.mode == PlayMode::Wildcard;
        if left_wildcard {
            self.leave_wildcard();
        }

        let difficulty = self.session.current_difficulty.clone();
        let eligible: Vec<&str> = content
            .categories
            .iter()
            .filter(|c| !partition_pool(&content.questions, &c.id, &difficulty).is_empty())
            .map(|c| c.id.as_str())
            .collect();

        let Some(&chosen) = eligible.choose(&mut self.rng) else {
            tracing::warn!(difficulty = %difficulty, "No category has questions at this difficulty");
            if left_wildcard {
                self.publish();
            }
            return Err(InvalidOperation::NoEligibleCategory(difficulty));
        };

        self.timer.cancel();
        self.session.mode = PlayMode::Category;
        self.session.current_category = Some(chosen.to_string());
        self.session.end_round();
        self.session.phase = RoundPhase::CategoryReady;

        tracing::info!(
            category.id = %chosen,
            candidates.count = eligible.len(),
            "Random category picked"
        );
        self.publish();
        Ok(())
    }

    /// Draw the next unseen question for the active mode and start the round timer.
    pub fn draw_next(&mut self) -> Result<(), InvalidOperation> {
        let content = self.loaded_content()?;
        if self.session.phase == RoundPhase::Exhausted {
            return Err(InvalidOperation::DrawingDisabled);
        }
        let language = self.language.clone().unwrap_or_default();

        let drawn = match self.session.mode {
            PlayMode::Wildcard => {
                let pool: Vec<&WildcardQuestion> = content.wildcard_questions.iter().collect();
                let used = self.partitions.resolve_wildcard(&language);
                draw_with_policy(
                    &self.sampler,
                    self.settings.exhaustion_policy,
                    &pool,
                    used,
                    &mut self.rng,
                )
                .map(|q| ActiveQuestion::Wildcard(q.clone()))
            }
            PlayMode::Category => {
                let Some(category_id) = self.session.current_category.clone() else {
                    return Err(InvalidOperation::NoCategorySelected);
                };
                let difficulty = &self.session.current_difficulty;
                let pool = partition_pool(&content.questions, &category_id, difficulty);
                let used = self.partitions.resolve(&language, difficulty, &category_id);
                draw_with_policy(
                    &self.sampler,
                    self.settings.exhaustion_policy,
                    &pool,
                    used,
                    &mut self.rng,
                )
                .map(|q| ActiveQuestion::Normal(q.clone()))
            }
        };

        match drawn {
            Ok(question) => {
                tracing::info!(
                    mode = ?self.session.mode,
                    question.prompt = %question.prompt(),
                    "Question drawn"
                );
                self.session.current_question = Some(question);
                self.session.timed_out = false;
                self.session.phase = RoundPhase::QuestionActive;

                let started = self.timer.start(self.settings.round_duration_seconds);
                if started
                    .iter()
                    .any(|event| matches!(event, TimerEvent::Expired { .. }))
                {
                    self.expire_round();
                }
            }
            Err(SampleError::Exhausted) => {
                tracing::info!(
                    mode = ?self.session.mode,
                    category.id = ?self.session.current_category,
                    difficulty = %self.session.current_difficulty,
                    "Pool exhausted"
                );
                self.timer.cancel();
                self.session.end_round();
                self.session.phase = RoundPhase::Exhausted;
            }
        }

        self.publish();
        Ok(())
    }

    pub fn reveal(&mut self) -> Result<(), InvalidOperation> {
        if self.session.phase != RoundPhase::QuestionActive {
            return Err(InvalidOperation::NothingToReveal);
        }

        self.timer.cancel();
        self.session.phase = RoundPhase::Revealed;
        tracing::debug!("Answer revealed");
        self.publish();
        Ok(())
    }

    /// Feed one second of wall-clock (or simulated) time into the round timer.
    pub fn advance_clock(&mut self) {
        for event in self.timer.advance_second() {
            self.on_timer_event(event);
        }
    }

    /// Apply a timer event; events of cancelled or superseded runs are dropped.
    pub fn on_timer_event(&mut self, event: TimerEvent) {
        if !self.timer.owns(&event) {
            tracing::trace!(timer.id = %event.timer_id(), "Discarding stale timer event");
            return;
        }

        match event {
            TimerEvent::Tick { .. } => self.publish(),
            TimerEvent::Expired { .. } => {
                if self.session.phase == RoundPhase::QuestionActive {
                    self.expire_round();
                    tracing::info!("Round time expired, answer revealed");
                    self.publish();
                }
            }
        }
    }

    fn expire_round(&mut self) {
        self.session.phase = RoundPhase::Revealed;
        self.session.timed_out = true;
    }

    /// Start a fresh session for `language` with the outcome of its content fetch.
    /// All sampling history for the language is discarded either way.
    pub fn switch_language(
        &mut self,
        language: &str,
        loaded: Result<ContentBundle, ContentError>,
    ) -> Result<(), ContentError> {
        self.timer.cancel();
        self.partitions.reset_language(language);
        self.session.mode = PlayMode::Category;
        self.session.current_category = None;
        self.session.end_round();
        self.session.phase = RoundPhase::Idle;

        match loaded {
            Ok(bundle) => {
                tracing::info!(
                    content.language = %language,
                    categories.count = bundle.categories.len(),
                    questions.count = bundle.questions.len(),
                    wildcard.count = bundle.wildcard_questions.len(),
                    "Content language switched"
                );
                self.language = Some(language.to_string());
                self.content = Some(Arc::new(bundle));
                self.publish();
                Ok(())
            }
            Err(err) => {
                tracing::error!(content.language = %language, error = %err, "Failed to load content");
                self.language = None;
                self.content = None;
                self.presenter.on_load_error(&err.to_string());
                self.publish();
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> (RoundPhase, StateContext) {
        let session = &self.session;
        let (category_id, category_name) = match (session.mode, &session.current_category) {
            (PlayMode::Category, Some(id)) => {
                let name = self
                    .content
                    .as_ref()
                    .and_then(|c| c.category(id))
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| id.clone());
                (Some(id.clone()), Some(name))
            }
            _ => (None, None),
        };

        let (pool_remaining, pool_total) = self.pool_status();

        let context = StateContext {
            language: self.language.clone(),
            mode: session.mode,
            category_id,
            category_name,
            difficulty: session.current_difficulty.clone(),
            pool_remaining,
            pool_total,
            prompt: session
                .current_question
                .as_ref()
                .map(|q| q.prompt().to_string()),
            answer: match session.phase {
                RoundPhase::Revealed => session
                    .current_question
                    .as_ref()
                    .map(|q| q.answer().to_string()),
                _ => None,
            },
            timer_remaining: self.timer.remaining(),
            timed_out: session.timed_out,
        };

        (session.phase, context)
    }

    /// Re-send the current state to the presenter.
    pub fn publish(&mut self) {
        let (phase, context) = self.snapshot();
        tracing::debug!(
            phase = ?phase,
            pool.remaining = ?context.pool_remaining,
            pool.total = ?context.pool_total,
            timer.remaining = ?context.timer_remaining,
            "State changed"
        );
        self.presenter.on_state_changed(phase, &context);
    }

    fn pool_status(&self) -> (Option<usize>, Option<usize>) {
        let (Some(content), Some(language)) = (&self.content, &self.language) else {
            return (None, None);
        };

        match self.session.mode {
            PlayMode::Wildcard => {
                let pool: Vec<&WildcardQuestion> = content.wildcard_questions.iter().collect();
                let used = self.partitions.peek_wildcard(language);
                (Some(Sampler::remaining(&pool, used)), Some(pool.len()))
            }
            PlayMode::Category => match &self.session.current_category {
                Some(category_id) => {
                    let difficulty = &self.session.current_difficulty;
                    let pool = partition_pool(&content.questions, category_id, difficulty);
                    let used = self.partitions.peek(language, difficulty, category_id);
                    (Some(Sampler::remaining(&pool, used)), Some(pool.len()))
                }
                None => (None, None),
            },
        }
    }

    fn loaded_content(&self) -> Result<Arc<ContentBundle>, InvalidOperation> {
        self.content
            .clone()
            .ok_or(InvalidOperation::ContentNotLoaded)
    }
}

fn draw_with_policy<'a, T>(
    sampler: &Sampler,
    policy: ExhaustionPolicy,
    pool: &[&'a T],
    used: &mut UsedSet,
    rng: &mut StdRng,
) -> Result<&'a T, SampleError>
where
    T: Identified,
{
    match sampler.draw(pool, used, rng) {
        Err(SampleError::Exhausted) if policy == ExhaustionPolicy::Recycle && !pool.is_empty() => {
            tracing::info!(pool.size = pool.len(), "Recycling exhausted pool");
            used.clear();
            sampler.draw(pool, used, rng)
        }
        result => result,
    }
}
