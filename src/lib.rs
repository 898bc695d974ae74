#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{collections::VecDeque, fmt, ops::Not};

use log::{info, warn};

pub mod alarm;
/// the add/edit alarm form
pub mod alarm_edit;
pub mod communication;
pub mod config;
pub mod error;
pub mod format;
pub mod notify;
pub mod sound;
pub mod stopwatch;
pub mod storage;
pub mod ticker;
pub mod time;
pub mod timer;

use alarm::{AlarmId, AlarmRegistry};
use alarm_edit::{AlarmBuilder, Saved};
use config::{Config, Theme};
use error::{Error, ValidationError};
use notify::{Level, Notice};
use sound::Chime;
use stopwatch::{Stopwatch, StopwatchState};
use storage::Persistence;
use ticker::{Scheduler, Target, TickHandle};
use time::TimeSource;
use timer::{Timer, TimerEvent, TimerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOfDay {
    #[default]
    AM,
    PM,
}

impl Not for TimeOfDay {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::AM => Self::PM,
            Self::PM => Self::AM,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AM => "AM",
            Self::PM => "PM",
        })
    }
}

/// The screens of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Stopwatch,
    Timer,
    Alarms,
}

/// Owns all of the clock's state and the collaborators the engines need.
/// The front end calls into it for every user action and forwards ticks.
pub struct Clock {
    config: Config,
    store: Persistence,
    alarms: AlarmRegistry,
    stopwatch: Stopwatch,
    timer: Timer,
    theme: Theme,
    view: View,
    readout: Option<TickHandle>,
    time: Box<dyn TimeSource>,
    scheduler: Box<dyn Scheduler>,
    chime: Box<dyn Chime>,
    notices: VecDeque<Notice>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("view", &self.view)
            .field("theme", &self.theme)
            .field("alarms", &self.alarms)
            .field("stopwatch", &self.stopwatch)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl Clock {
    /// Restores the alarms, laps and theme from `store`.
    #[must_use]
    pub fn new(
        config: Config,
        store: Persistence,
        time: Box<dyn TimeSource>,
        scheduler: Box<dyn Scheduler>,
        chime: Box<dyn Chime>,
    ) -> Self {
        let alarms = AlarmRegistry::load(&store);
        let stopwatch = Stopwatch::load(&store);
        let theme = store.load_theme();
        info!(
            "loaded {} alarms and {} laps",
            alarms.len(),
            stopwatch.laps().len()
        );
        Self {
            config,
            store,
            alarms,
            stopwatch,
            timer: Timer::new(),
            theme,
            view: View::Dashboard,
            readout: None,
            time,
            scheduler,
            chime,
            notices: VecDeque::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn alarms(&self) -> &AlarmRegistry {
        &self.alarms
    }

    #[must_use]
    pub const fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    #[must_use]
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.notices.push_back(Notice::new(level, message));
    }

    fn report(&mut self, error: &Error) {
        warn!("{error}");
        let level = match error {
            Error::Validation(_) | Error::NotFound(_) => Level::Warning,
            Error::Persistence(_) => Level::Error,
        };
        self.notify(level, error.to_string());
    }

    /// Turns a write failure kept by the store into an error notice.
    fn surface_persistence(&mut self) {
        if let Some(failure) = self.store.take_failure() {
            self.report(&Error::Persistence(failure));
        }
    }

    /// Switches screens. Leaving a screen pauses whatever was running,
    /// the stopwatch and timer screens start out fresh, and the alarm
    /// screen runs the current time readout.
    pub fn navigate(&mut self, view: View) {
        let now = self.now_ms();
        self.stopwatch.pause(now);
        self.timer.pause(now);
        self.readout = None;

        match view {
            View::Stopwatch => {
                self.stopwatch.reset(&mut self.store);
                self.surface_persistence();
            }
            View::Timer => self.timer.reset(),
            View::Alarms => self.readout = Some(self.scheduler.every(Target::Clock)),
            View::Dashboard => {}
        }
        self.view = view;
    }

    /// Routes a tick to whatever scheduled it. Returns whether the screen
    /// needs redrawing.
    pub fn on_tick(&mut self, target: Target, token: u64) -> bool {
        let now = self.now_ms();
        match target {
            Target::Stopwatch => self.stopwatch.refresh(token, now),
            Target::Timer => match self.timer.refresh(token, now) {
                Some(TimerEvent::Finished) => {
                    self.chime.play(self.config.timer_chime);
                    self.notify(Level::Success, "Timer finished!");
                    true
                }
                None => self.timer.is_ticking(),
            },
            Target::Clock => self
                .readout
                .as_ref()
                .is_some_and(|readout| readout.accepts(token)),
        }
    }

    /// Blocks until a playing chime is done.
    pub fn wait_for_chime(&mut self) {
        self.chime.wait();
    }

    // alarms

    /// A blank alarm form.
    #[must_use]
    pub fn new_alarm(&self) -> AlarmBuilder {
        AlarmBuilder::new(&self.config)
    }

    /// The form for editing an alarm, `None` if it no longer exists.
    pub fn edit_alarm(&mut self, id: &AlarmId) -> Option<AlarmBuilder> {
        if let Some(alarm) = self.alarms.get(id) {
            return Some(AlarmBuilder::edit(alarm));
        }
        self.report(&Error::NotFound(id.clone()));
        None
    }

    pub fn save_alarm(&mut self, builder: &AlarmBuilder) -> Option<Saved> {
        let saved = builder.save(&mut self.alarms, &mut self.store);
        match &saved {
            Ok(Saved::Created(_)) => self.notify(Level::Success, "Alarm created"),
            Ok(Saved::Updated(_)) => self.notify(Level::Success, "Alarm updated"),
            Err(e) => self.report(e),
        }
        self.surface_persistence();
        saved.ok()
    }

    /// Deletes after `confirm` agrees. Returns whether the alarm is gone.
    pub fn delete_alarm(&mut self, id: &AlarmId, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm("Delete this alarm?") {
            return false;
        }
        let deleted = match self.alarms.delete(id, &mut self.store) {
            Ok(_) => {
                self.notify(Level::Success, "Alarm deleted");
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        };
        self.surface_persistence();
        deleted
    }

    /// Returns the new enabled state.
    pub fn toggle_alarm(&mut self, id: &AlarmId) -> Option<bool> {
        let toggled = self.alarms.toggle(id, &mut self.store);
        if let Err(e) = &toggled {
            self.report(e);
        }
        self.surface_persistence();
        toggled.ok()
    }

    // stopwatch

    /// The start/pause button.
    pub fn stopwatch_toggle(&mut self) -> StopwatchState {
        let now = self.now_ms();
        self.stopwatch.toggle(now, self.scheduler.as_mut())
    }

    pub fn stopwatch_lap(&mut self) -> Option<u64> {
        let now = self.now_ms();
        let lap = self.stopwatch.lap(now, &mut self.store);
        self.surface_persistence();
        lap
    }

    pub fn stopwatch_reset(&mut self) {
        self.stopwatch.reset(&mut self.store);
        self.surface_persistence();
    }

    #[must_use]
    pub fn stopwatch_display(&self) -> String {
        format::format_stopwatch(self.stopwatch.shown_ms())
    }

    // timer

    /// Sets the countdown, warning the user when the duration is zero or
    /// too long.
    pub fn timer_set(&mut self, seconds: u64) -> bool {
        let configured = self.timer.configure(seconds);
        self.timer_configured(configured)
    }

    pub fn timer_set_hms(&mut self, hours: u64, minutes: u64, seconds: u64) -> bool {
        let configured = self.timer.configure_hms(hours, minutes, seconds);
        self.timer_configured(configured)
    }

    fn timer_configured(&mut self, configured: Result<(), ValidationError>) -> bool {
        match configured {
            Ok(()) => true,
            Err(e) => {
                self.report(&e.into());
                false
            }
        }
    }

    /// Sets one of the configured presets.
    pub fn timer_preset(&mut self, index: usize) -> bool {
        match self.config.timer_presets.get(index).copied() {
            Some(seconds) => self.timer_set(seconds),
            None => {
                self.notify(Level::Warning, format!("no timer preset {}", index + 1));
                false
            }
        }
    }

    pub fn timer_start(&mut self) -> bool {
        let now = self.now_ms();
        self.timer.start(now, self.scheduler.as_mut())
    }

    pub fn timer_toggle(&mut self) -> TimerState {
        let now = self.now_ms();
        self.timer.toggle(now, self.scheduler.as_mut())
    }

    pub fn timer_reset(&mut self) {
        self.timer.reset();
    }

    #[must_use]
    pub fn timer_display(&self) -> String {
        format::format_timer(self.timer.remaining_seconds(self.now_ms()))
    }

    // theme

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.store.save_theme(theme);
        self.surface_persistence();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(!self.theme);
        self.theme
    }

    /// The current time readout, e.g. `07:05 PM`.
    #[must_use]
    pub fn clock_display(&self) -> String {
        format::format_alarm_time(time::local_time())
    }
}
