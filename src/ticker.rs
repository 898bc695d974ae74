//! Recurring refresh callbacks.
//!
//! Every running engine owns at most one [`TickHandle`]. The handle's token
//! travels with each tick, and an engine ignores ticks whose token isn't the
//! one it currently holds. Dropping or cancelling the handle therefore stops
//! the refresh immediately, even for a tick that is already queued.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use log::{debug, error};

use crate::communication::Event;

pub const STOPWATCH_INTERVAL: Duration = Duration::from_millis(10);
pub const TIMER_INTERVAL: Duration = Duration::from_millis(100);
pub const CLOCK_INTERVAL: Duration = Duration::from_millis(1000);

/// What a tick refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Stopwatch,
    Timer,
    /// the current time readout
    Clock,
}

impl Target {
    #[must_use]
    pub const fn interval(self) -> Duration {
        match self {
            Self::Stopwatch => STOPWATCH_INTERVAL,
            Self::Timer => TIMER_INTERVAL,
            Self::Clock => CLOCK_INTERVAL,
        }
    }
}

/// Ownership of one recurring callback. Cancelled on drop.
#[derive(Debug)]
pub struct TickHandle {
    target: Target,
    token: u64,
    cancelled: Arc<AtomicBool>,
}

impl TickHandle {
    #[must_use]
    pub fn new(target: Target, token: u64) -> Self {
        Self {
            target,
            token,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub const fn token(&self) -> u64 {
        self.token
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether a tick came from this handle and the handle is still live.
    #[must_use]
    pub fn accepts(&self, token: u64) -> bool {
        self.token == token && !self.is_cancelled()
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if !self.is_cancelled() {
            debug!("stopping {:?} ticker {}", self.target, self.token);
        }
        self.cancel();
    }
}

/// Hands out recurring callbacks at the target's interval.
pub trait Scheduler {
    fn every(&mut self, target: Target) -> TickHandle;
}

/// Runs each recurring callback on its own small thread, which posts
/// [`Event::Tick`] into the controller's channel until cancelled.
#[derive(Debug)]
pub struct ThreadScheduler {
    sender: Sender<Event>,
    next_token: u64,
}

impl ThreadScheduler {
    #[must_use]
    pub const fn new(sender: Sender<Event>) -> Self {
        Self {
            sender,
            next_token: 0,
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn every(&mut self, target: Target) -> TickHandle {
        self.next_token += 1;
        let handle = TickHandle::new(target, self.next_token);
        let cancelled = handle.flag();
        let sender = self.sender.clone();
        let token = handle.token();
        let interval = target.interval();

        let spawned = thread::Builder::new()
            .name(format!("{target:?} ticker"))
            .spawn(move || loop {
                thread::sleep(interval);
                if cancelled.load(Ordering::Acquire) {
                    break;
                }
                if sender.send(Event::Tick { target, token }).is_err() {
                    // the event loop is gone
                    break;
                }
            });
        match spawned {
            Ok(_) => debug!("started {target:?} ticker {token}"),
            // the engines still read the clock directly, only redraws are lost
            Err(e) => error!("couldn't start {target:?} ticker: {e}"),
        }
        handle
    }
}

#[derive(Debug, Clone)]
struct Issued {
    target: Target,
    token: u64,
    cancelled: Arc<AtomicBool>,
}

/// Issues handles without any threads, ticks are delivered by hand.
/// Clones share what has been issued.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    issued: Arc<Mutex<Vec<Issued>>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn issued(&self) -> std::sync::MutexGuard<'_, Vec<Issued>> {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Token of the live callback for `target`, if there is one.
    #[must_use]
    pub fn active(&self, target: Target) -> Option<u64> {
        self.issued()
            .iter()
            .rev()
            .find(|issued| issued.target == target && !issued.cancelled.load(Ordering::Acquire))
            .map(|issued| issued.token)
    }

    /// Every token ever issued for `target`, oldest first.
    #[must_use]
    pub fn tokens(&self, target: Target) -> Vec<u64> {
        self.issued()
            .iter()
            .filter(|issued| issued.target == target)
            .map(|issued| issued.token)
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&mut self, target: Target) -> TickHandle {
        let mut issued = self.issued();
        let token = issued.len() as u64 + 1;
        let handle = TickHandle::new(target, token);
        issued.push(Issued {
            target,
            token,
            cancelled: handle.flag(),
        });
        handle
    }
}
