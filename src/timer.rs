use log::{debug, info};

use crate::{
    error::ValidationError,
    format,
    ticker::{Scheduler, Target, TickHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Unset,
    Ready,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Finished,
}

/// Countdown measured against a deadline captured on start, so long
/// countdowns don't drift no matter how late the refreshes are.
#[derive(Debug, Default)]
pub struct Timer {
    state: TimerState,
    duration_ms: u64,
    remaining_ms: u64,
    deadline_ms: u64,
    ticker: Option<TickHandle>,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// The configured length in seconds, zero when unset.
    #[must_use]
    pub const fn duration_seconds(&self) -> u64 {
        self.duration_ms / 1000
    }

    #[must_use]
    pub const fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Sets a fresh countdown, replacing whatever was there. Durations too
    /// long to count in milliseconds are rejected.
    pub fn configure(&mut self, total_seconds: u64) -> Result<(), ValidationError> {
        if total_seconds == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        let duration_ms = total_seconds
            .checked_mul(1000)
            .ok_or_else(|| ValidationError::InvalidDuration(format!("{total_seconds}s")))?;
        self.ticker = None;
        self.duration_ms = duration_ms;
        self.remaining_ms = self.duration_ms;
        self.state = TimerState::Ready;
        debug!("timer set to {}", format::format_timer(total_seconds));
        Ok(())
    }

    /// The custom entry form.
    pub fn configure_hms(
        &mut self,
        hours: u64,
        minutes: u64,
        seconds: u64,
    ) -> Result<(), ValidationError> {
        let total = format::hms_seconds(hours, minutes, seconds).ok_or_else(|| {
            ValidationError::InvalidDuration(format!("{hours}h{minutes}m{seconds}s"))
        })?;
        self.configure(total)
    }

    #[must_use]
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.state {
            TimerState::Running => self.deadline_ms.saturating_sub(now_ms),
            _ => self.remaining_ms,
        }
    }

    /// Whole seconds left, rounded up so the display reads zero only when done.
    #[must_use]
    pub fn remaining_seconds(&self, now_ms: u64) -> u64 {
        self.remaining_ms(now_ms).div_ceil(1000)
    }

    /// Only from ready or paused with time left. Returns whether it started.
    pub fn start(&mut self, now_ms: u64, scheduler: &mut dyn Scheduler) -> bool {
        if !matches!(self.state, TimerState::Ready | TimerState::Paused) || self.remaining_ms == 0
        {
            return false;
        }
        self.deadline_ms = now_ms.saturating_add(self.remaining_ms);
        self.state = TimerState::Running;
        self.ticker = Some(scheduler.every(Target::Timer));
        debug!("timer running, {}ms left", self.remaining_ms);
        true
    }

    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.ticker = None;
        self.remaining_ms = self.deadline_ms.saturating_sub(now_ms);
        self.state = TimerState::Paused;
        true
    }

    pub fn toggle(&mut self, now_ms: u64, scheduler: &mut dyn Scheduler) -> TimerState {
        if self.state == TimerState::Running {
            self.pause(now_ms);
        } else {
            self.start(now_ms, scheduler);
        }
        self.state
    }

    /// Back to unset, forgetting the configured duration.
    pub fn reset(&mut self) {
        self.ticker = None;
        self.duration_ms = 0;
        self.remaining_ms = 0;
        self.deadline_ms = 0;
        self.state = TimerState::Unset;
    }

    /// Handles a tick. Reports [`TimerEvent::Finished`] on the tick that
    /// reaches zero and never again after it.
    pub fn refresh(&mut self, token: u64, now_ms: u64) -> Option<TimerEvent> {
        if !self.ticker.as_ref().is_some_and(|ticker| ticker.accepts(token)) {
            return None;
        }
        self.remaining_ms = self.deadline_ms.saturating_sub(now_ms);
        if self.remaining_ms > 0 {
            return None;
        }
        self.ticker = None;
        self.state = TimerState::Finished;
        info!("timer finished");
        Some(TimerEvent::Finished)
    }
}
