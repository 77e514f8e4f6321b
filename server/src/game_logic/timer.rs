use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one countdown run. Events from any other run are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(Uuid);

impl TimerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum TimerEvent {
    Tick { timer_id: TimerId, remaining: u32 },
    Expired { timer_id: TimerId },
}

impl TimerEvent {
    pub fn timer_id(&self) -> TimerId {
        match self {
            TimerEvent::Tick { timer_id, .. } | TimerEvent::Expired { timer_id } => *timer_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// Fixed-duration countdown. Clock-free: the owner calls
/// [`RoundTimer::advance_second`] once per elapsed second.
#[derive(Debug)]
pub struct RoundTimer {
    current: Option<TimerId>,
    status: TimerStatus,
    remaining: u32,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self {
            current: None,
            status: TimerStatus::Idle,
            remaining: 0,
        }
    }

    /// Start a new run, superseding any running one. The first tick is
    /// reported immediately; a zero duration expires at once.
    pub fn start(&mut self, duration_seconds: u32) -> Vec<TimerEvent> {
        self.cancel();

        let timer_id = TimerId::new();
        self.current = Some(timer_id);
        self.remaining = duration_seconds;
        self.status = TimerStatus::Running;

        tracing::trace!(timer.id = %timer_id, timer.duration = duration_seconds, "Round timer started");

        let mut events = vec![TimerEvent::Tick {
            timer_id,
            remaining: duration_seconds,
        }];
        if duration_seconds == 0 {
            self.status = TimerStatus::Expired;
            events.push(TimerEvent::Expired { timer_id });
        }
        events
    }

    /// Advance the running countdown by one second.
    pub fn advance_second(&mut self) -> Vec<TimerEvent> {
        let timer_id = match (self.status, self.current) {
            (TimerStatus::Running, Some(timer_id)) => timer_id,
            _ => return Vec::new(),
        };

        self.remaining = self.remaining.saturating_sub(1);
        let mut events = vec![TimerEvent::Tick {
            timer_id,
            remaining: self.remaining,
        }];

        if self.remaining == 0 {
            self.status = TimerStatus::Expired;
            tracing::trace!(timer.id = %timer_id, "Round timer expired");
            events.push(TimerEvent::Expired { timer_id });
        }
        events
    }

    /// Stop the running countdown. Returns whether a run was actually cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Cancelled;
        if let Some(timer_id) = self.current {
            tracing::trace!(timer.id = %timer_id, remaining = self.remaining, "Round timer cancelled");
        }
        true
    }

    /// Whether `event` belongs to the current, not cancelled run.
    pub fn owns(&self, event: &TimerEvent) -> bool {
        self.current == Some(event.timer_id())
            && matches!(self.status, TimerStatus::Running | TimerStatus::Expired)
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    #[cfg(test)]
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn current_id(&self) -> Option<TimerId> {
        self.current
    }

    /// Seconds left while running, zero once expired.
    pub fn remaining(&self) -> Option<u32> {
        match self.status {
            TimerStatus::Running | TimerStatus::Expired => Some(self.remaining),
            TimerStatus::Idle | TimerStatus::Cancelled => None,
        }
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new()
    }
}
