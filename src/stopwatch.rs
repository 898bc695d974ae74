use log::debug;

use crate::{
    storage::Persistence,
    ticker::{Scheduler, Target, TickHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopwatchState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Elapsed time is always `accumulated + (now - segment start)` while running,
/// never a count of ticks, so late or dropped refreshes can't skew it.
#[derive(Debug, Default)]
pub struct Stopwatch {
    state: StopwatchState,
    accumulated_ms: u64,
    segment_start_ms: u64,
    shown_ms: u64,
    laps: Vec<u64>,
    ticker: Option<TickHandle>,
}

impl Stopwatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle stopwatch showing the laps of an earlier session.
    #[must_use]
    pub fn with_laps(laps: Vec<u64>) -> Self {
        Self {
            laps,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn load(store: &Persistence) -> Self {
        Self::with_laps(store.load_laps())
    }

    #[must_use]
    pub const fn state(&self) -> StopwatchState {
        self.state
    }

    #[must_use]
    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    /// Whether a refresh callback is live.
    #[must_use]
    pub const fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.state {
            StopwatchState::Running => {
                self.accumulated_ms + now_ms.saturating_sub(self.segment_start_ms)
            }
            StopwatchState::Idle | StopwatchState::Paused => self.accumulated_ms,
        }
    }

    /// The value as of the last refresh.
    #[must_use]
    pub const fn shown_ms(&self) -> u64 {
        self.shown_ms
    }

    /// Returns false if it was already running.
    pub fn start(&mut self, now_ms: u64, scheduler: &mut dyn Scheduler) -> bool {
        if self.state == StopwatchState::Running {
            return false;
        }
        self.segment_start_ms = now_ms;
        self.state = StopwatchState::Running;
        self.ticker = Some(scheduler.every(Target::Stopwatch));
        debug!("stopwatch started at {}ms", self.accumulated_ms);
        true
    }

    /// Returns false if it wasn't running.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.state != StopwatchState::Running {
            return false;
        }
        self.ticker = None;
        self.accumulated_ms += now_ms.saturating_sub(self.segment_start_ms);
        self.shown_ms = self.accumulated_ms;
        self.state = StopwatchState::Paused;
        debug!("stopwatch paused at {}ms", self.accumulated_ms);
        true
    }

    /// The start/pause button.
    pub fn toggle(&mut self, now_ms: u64, scheduler: &mut dyn Scheduler) -> StopwatchState {
        if self.state == StopwatchState::Running {
            self.pause(now_ms);
        } else {
            self.start(now_ms, scheduler);
        }
        self.state
    }

    /// Records the current elapsed time. Only counts while running, and a
    /// lap of zero length isn't recorded.
    pub fn lap(&mut self, now_ms: u64, store: &mut Persistence) -> Option<u64> {
        if self.state != StopwatchState::Running {
            return None;
        }
        let lap = self.elapsed_ms(now_ms);
        if lap == 0 {
            return None;
        }
        self.laps.push(lap);
        store.save_laps(&self.laps);
        Some(lap)
    }

    /// Back to idle from any state, dropping the laps.
    pub fn reset(&mut self, store: &mut Persistence) {
        self.ticker = None;
        self.state = StopwatchState::Idle;
        self.accumulated_ms = 0;
        self.segment_start_ms = 0;
        self.shown_ms = 0;
        self.laps.clear();
        store.save_laps(&self.laps);
    }

    /// Handles a tick, returns whether the shown value changed.
    /// Ticks from a cancelled callback are ignored.
    pub fn refresh(&mut self, token: u64, now_ms: u64) -> bool {
        if !self.ticker.as_ref().is_some_and(|ticker| ticker.accepts(token)) {
            return false;
        }
        let elapsed = self.elapsed_ms(now_ms);
        let changed = elapsed != self.shown_ms;
        self.shown_ms = elapsed;
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;
    use crate::{
        storage::MemoryStore,
        ticker::ManualScheduler,
        time::{MonotonicTime, TimeSource},
    };

    fn store() -> Persistence {
        Persistence::new(MemoryStore::new())
    }

    #[test]
    fn pause_and_resume_keep_time() {
        let mut scheduler = ManualScheduler::new();
        let mut sw = Stopwatch::new();
        assert_eq!(sw.state(), StopwatchState::Idle);
        assert_eq!(sw.elapsed_ms(0), 0);

        assert!(sw.start(1000, &mut scheduler));
        assert_eq!(sw.elapsed_ms(1500), 500);

        assert!(sw.pause(2000));
        assert_eq!(sw.state(), StopwatchState::Paused);
        // stays put while paused
        assert_eq!(sw.elapsed_ms(5000), 1000);
        assert_eq!(sw.shown_ms(), 1000);

        assert!(sw.start(5000, &mut scheduler));
        assert_eq!(sw.elapsed_ms(5500), 1500);
    }

    #[test]
    fn starting_twice_keeps_one_ticker() {
        let mut scheduler = ManualScheduler::new();
        let mut sw = Stopwatch::new();
        assert!(sw.start(0, &mut scheduler));
        assert!(!sw.start(10, &mut scheduler));
        assert_eq!(scheduler.tokens(Target::Stopwatch).len(), 1);
        assert_eq!(sw.elapsed_ms(100), 100);
    }

    #[test]
    fn pause_cancels_ticker() {
        let mut scheduler = ManualScheduler::new();
        let mut sw = Stopwatch::new();
        sw.start(0, &mut scheduler);
        let token = scheduler.active(Target::Stopwatch).unwrap();
        assert!(sw.refresh(token, 30));
        assert_eq!(sw.shown_ms(), 30);

        sw.pause(40);
        assert!(!sw.is_ticking());
        assert_eq!(scheduler.active(Target::Stopwatch), None);
        // a tick already in flight changes nothing
        assert!(!sw.refresh(token, 90));
        assert_eq!(sw.shown_ms(), 40);

        // nor does an old tick after resuming
        sw.start(100, &mut scheduler);
        assert!(!sw.refresh(token, 150));
        let fresh = scheduler.active(Target::Stopwatch).unwrap();
        assert!(sw.refresh(fresh, 150));
        assert_eq!(sw.shown_ms(), 90);
    }

    #[test]
    fn laps_only_while_running() {
        let mut scheduler = ManualScheduler::new();
        let mut store = store();
        let mut sw = Stopwatch::new();
        assert_eq!(sw.lap(0, &mut store), None);

        sw.start(0, &mut scheduler);
        assert_eq!(sw.lap(1200, &mut store), Some(1200));
        assert_eq!(sw.lap(3000, &mut store), Some(3000));
        sw.pause(3500);
        assert_eq!(sw.lap(4000, &mut store), None);

        assert_eq!(sw.laps(), [1200, 3000]);
        assert_eq!(store.load_laps(), vec![1200, 3000]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut scheduler = ManualScheduler::new();
        let mut store = store();
        let mut sw = Stopwatch::with_laps(vec![10, 20]);
        sw.start(0, &mut scheduler);
        sw.lap(500, &mut store);
        sw.reset(&mut store);

        assert_eq!(sw.state(), StopwatchState::Idle);
        assert_eq!(sw.elapsed_ms(10_000), 0);
        assert!(sw.laps().is_empty());
        assert!(store.load_laps().is_empty());
        assert!(!sw.is_ticking());
    }

    #[test]
    fn toggle_flips() {
        let mut scheduler = ManualScheduler::new();
        let mut sw = Stopwatch::new();
        assert_eq!(sw.toggle(0, &mut scheduler), StopwatchState::Running);
        assert_eq!(sw.toggle(250, &mut scheduler), StopwatchState::Paused);
        assert_eq!(sw.elapsed_ms(999), 250);
    }

    #[test]
    fn measures_real_time() {
        let time = MonotonicTime::new();
        let mut scheduler = ManualScheduler::new();
        let mut sw = Stopwatch::new();

        let started = time.now_ms();
        sw.start(started, &mut scheduler);
        thread::sleep(Duration::from_millis(250));
        let paused = time.now_ms();
        sw.pause(paused);

        let measured = paused - started;
        assert!(measured >= 250);
        assert!(sw.elapsed_ms(time.now_ms()).abs_diff(measured) <= 20);
    }
}
