use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::NaiveTime;
use roosty_clockwork::{
    alarm::{AlarmId, ChimeStyle, Days},
    alarm_edit::Saved,
    config::{Config, Theme},
    notify::{Level, Notice},
    sound::Chime,
    stopwatch::StopwatchState,
    storage::{FileStore, MemoryStore, Persistence, Store, KEY_DARK_MODE},
    ticker::{ManualScheduler, Target},
    time::ManualTime,
    timer::TimerState,
    Clock, View,
};

#[derive(Clone, Default)]
struct CountingChime(Arc<AtomicUsize>);

impl CountingChime {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Chime for CountingChime {
    fn play(&mut self, _style: ChimeStyle) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    clock: Clock,
    time: ManualTime,
    scheduler: ManualScheduler,
    chime: CountingChime,
}

impl Harness {
    fn new(store: impl Store + 'static) -> Self {
        let time = ManualTime::new(0);
        let scheduler = ManualScheduler::new();
        let chime = CountingChime::default();
        let clock = Clock::new(
            Config::default(),
            Persistence::new(store),
            Box::new(time.clone()),
            Box::new(scheduler.clone()),
            Box::new(chime.clone()),
        );
        Self {
            clock,
            time,
            scheduler,
            chime,
        }
    }

    fn tick(&mut self, target: Target) -> bool {
        let token = self.scheduler.active(target).unwrap_or(u64::MAX);
        self.clock.on_tick(target, token)
    }
}

fn levels(notices: &[Notice]) -> Vec<Level> {
    notices.iter().map(|notice| notice.level).collect()
}

#[test]
fn timer_finishes_once_and_chimes() {
    let mut h = Harness::new(MemoryStore::new());
    h.clock.navigate(View::Timer);
    assert!(h.clock.timer_set(5));
    assert!(h.clock.timer_start());
    assert_eq!(h.clock.timer_display(), "00:00:05");

    h.time.advance(2500);
    assert!(h.tick(Target::Timer));
    assert_eq!(h.clock.timer_display(), "00:00:03");
    assert!(h.clock.take_notices().is_empty());

    h.time.advance(2500);
    assert!(h.tick(Target::Timer));
    assert_eq!(h.clock.timer().state(), TimerState::Finished);
    assert_eq!(h.chime.count(), 1);
    assert_eq!(
        h.clock.take_notices(),
        vec![Notice::new(Level::Success, "Timer finished!")]
    );

    // the callback is gone, stray ticks do nothing
    assert_eq!(h.scheduler.active(Target::Timer), None);
    let stale = h.scheduler.tokens(Target::Timer)[0];
    h.time.advance(1000);
    assert!(!h.clock.on_tick(Target::Timer, stale));
    assert_eq!(h.chime.count(), 1);
}

#[test]
fn zero_timer_warns() {
    let mut h = Harness::new(MemoryStore::new());
    assert!(!h.clock.timer_set_hms(0, 0, 0));
    assert!(!h.clock.timer_start());
    let notices = h.clock.take_notices();
    assert_eq!(levels(&notices), vec![Level::Warning]);
    assert_eq!(notices[0].message, "Please set a valid time");
}

#[test]
fn oversized_timer_warns() {
    let mut h = Harness::new(MemoryStore::new());
    assert!(!h.clock.timer_set(u64::MAX));
    assert!(!h.clock.timer_set_hms(u64::MAX / 3600 + 1, 0, 0));
    assert!(!h.clock.timer_start());
    assert_eq!(h.clock.timer().state(), TimerState::Unset);
    assert_eq!(
        levels(&h.clock.take_notices()),
        vec![Level::Warning, Level::Warning]
    );

    assert!(h.clock.timer_set_hms(1, 2, 3));
    assert_eq!(h.clock.timer().duration_seconds(), 3723);
}

#[test]
fn timer_presets() {
    let mut h = Harness::new(MemoryStore::new());
    assert!(h.clock.timer_preset(2));
    assert_eq!(h.clock.timer().duration_seconds(), 300);
    assert!(!h.clock.timer_preset(99));
    assert_eq!(levels(&h.clock.take_notices()), vec![Level::Warning]);
    assert_eq!(h.clock.timer().duration_seconds(), 300);
}

#[test]
fn alarm_without_days_warns() {
    let mut h = Harness::new(MemoryStore::new());
    let mut builder = h.clock.new_alarm();
    builder.set_days(Days::EMPTY);
    assert_eq!(h.clock.save_alarm(&builder), None);
    let notices = h.clock.take_notices();
    assert_eq!(levels(&notices), vec![Level::Warning]);
    assert_eq!(notices[0].message, "Please select at least one day");
    assert!(h.clock.alarms().is_empty());
}

#[test]
fn alarm_lifecycle() {
    let mut h = Harness::new(MemoryStore::new());
    let mut builder = h.clock.new_alarm();
    builder.set_label("standup");
    let Some(Saved::Created(alarm)) = h.clock.save_alarm(&builder) else {
        panic!("expected a new alarm");
    };
    assert_eq!(alarm.time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());

    let mut edit = h.clock.edit_alarm(&alarm.id).unwrap();
    edit.hour_up();
    assert_eq!(
        h.clock.save_alarm(&edit),
        Some(Saved::Updated(alarm.id.clone()))
    );
    assert_eq!(
        h.clock.alarms().get(&alarm.id).unwrap().time,
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    );

    assert_eq!(h.clock.toggle_alarm(&alarm.id), Some(false));
    assert!(!h.clock.delete_alarm(&alarm.id, |_| false));
    assert_eq!(h.clock.alarms().len(), 1);
    assert!(h.clock.delete_alarm(&alarm.id, |prompt| {
        assert_eq!(prompt, "Delete this alarm?");
        true
    }));
    assert!(h.clock.alarms().is_empty());

    let messages: Vec<_> = h
        .clock
        .take_notices()
        .into_iter()
        .map(|notice| notice.message)
        .collect();
    assert_eq!(
        messages,
        vec!["Alarm created", "Alarm updated", "Alarm deleted"]
    );
}

#[test]
fn stale_ids_warn() {
    let mut h = Harness::new(MemoryStore::new());
    let id = AlarmId::from("gone");
    assert!(h.clock.edit_alarm(&id).is_none());
    assert_eq!(h.clock.toggle_alarm(&id), None);
    assert!(!h.clock.delete_alarm(&id, |_| true));
    assert_eq!(
        levels(&h.clock.take_notices()),
        vec![Level::Warning, Level::Warning, Level::Warning]
    );
}

#[test]
fn failed_writes_are_surfaced() {
    let mut h = Harness::new(MemoryStore::read_only());
    let builder = h.clock.new_alarm();
    let Some(Saved::Created(alarm)) = h.clock.save_alarm(&builder) else {
        panic!("the alarm should still be created in memory");
    };
    assert!(h.clock.alarms().get(&alarm.id).is_some());
    assert_eq!(
        levels(&h.clock.take_notices()),
        vec![Level::Success, Level::Error]
    );

    h.clock.stopwatch_toggle();
    h.time.advance(1200);
    assert_eq!(h.clock.stopwatch_lap(), Some(1200));
    assert_eq!(levels(&h.clock.take_notices()), vec![Level::Error]);
    assert_eq!(h.clock.stopwatch().laps(), &[1200]);
}

#[test]
fn state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let mut h = Harness::new(FileStore::new(dir.path()));
        let mut builder = h.clock.new_alarm();
        builder.set_time(NaiveTime::from_hms_opt(6, 45, 0).unwrap());
        builder.set_days(Days::WEEKENDS);
        builder.set_chime_style(ChimeStyle::Rain);
        let Some(Saved::Created(alarm)) = h.clock.save_alarm(&builder) else {
            panic!("expected a new alarm");
        };

        h.clock.navigate(View::Stopwatch);
        h.clock.stopwatch_toggle();
        h.time.advance(1500);
        h.clock.stopwatch_lap();
        h.time.advance(500);
        h.clock.stopwatch_lap();

        assert_eq!(h.clock.toggle_theme(), Theme::Dark);
        assert!(levels(&h.clock.take_notices())
            .iter()
            .all(|level| *level == Level::Success));
        alarm.id
    };

    let h = Harness::new(FileStore::new(dir.path()));
    let alarm = h.clock.alarms().get(&id).unwrap();
    assert_eq!(alarm.time, NaiveTime::from_hms_opt(6, 45, 0).unwrap());
    assert_eq!(alarm.days, Days::WEEKENDS);
    assert_eq!(alarm.chime_style, ChimeStyle::Rain);
    assert_eq!(alarm.label, "Alarm");
    assert!(alarm.enabled);
    assert_eq!(h.clock.stopwatch().laps(), &[1500, 2000]);
    assert_eq!(h.clock.theme(), Theme::Dark);
    assert_eq!(
        std::fs::read_to_string(dir.path().join(KEY_DARK_MODE)).unwrap(),
        "true"
    );
}

#[test]
fn navigation_pauses_and_resets() {
    let mut h = Harness::new(MemoryStore::new());

    h.clock.navigate(View::Stopwatch);
    assert_eq!(h.clock.stopwatch_toggle(), StopwatchState::Running);
    h.time.advance(800);
    h.clock.stopwatch_lap();

    // leaving pauses
    h.clock.navigate(View::Dashboard);
    assert_eq!(h.clock.stopwatch().state(), StopwatchState::Paused);
    assert_eq!(h.clock.stopwatch().elapsed_ms(h.clock.now_ms()), 800);
    assert_eq!(h.scheduler.active(Target::Stopwatch), None);

    // coming back starts fresh
    h.clock.navigate(View::Stopwatch);
    assert_eq!(h.clock.stopwatch().state(), StopwatchState::Idle);
    assert!(h.clock.stopwatch().laps().is_empty());
    assert_eq!(h.clock.stopwatch_display(), "00:00:00.00");

    h.clock.navigate(View::Timer);
    h.clock.timer_set(60);
    h.clock.timer_start();
    h.time.advance(10_000);
    h.clock.navigate(View::Alarms);
    assert_eq!(h.clock.timer().state(), TimerState::Paused);
    assert_eq!(h.clock.timer().remaining_seconds(h.clock.now_ms()), 50);
    assert!(h.scheduler.active(Target::Clock).is_some());
    assert!(h.tick(Target::Clock));

    h.clock.navigate(View::Timer);
    assert_eq!(h.clock.timer().state(), TimerState::Unset);
    assert_eq!(h.scheduler.active(Target::Clock), None);
    assert_eq!(h.clock.view(), View::Timer);
}

#[test]
fn stopwatch_refreshes_from_the_clock() {
    let mut h = Harness::new(MemoryStore::new());
    h.clock.stopwatch_toggle();
    h.time.advance(1234);
    assert!(h.tick(Target::Stopwatch));
    assert_eq!(h.clock.stopwatch_display(), "00:00:01.23");
    assert!(!h.tick(Target::Stopwatch));

    h.clock.stopwatch_toggle();
    h.time.advance(5000);
    assert!(!h.tick(Target::Stopwatch));
    assert_eq!(h.clock.stopwatch_display(), "00:00:01.23");

    h.clock.stopwatch_reset();
    assert_eq!(h.clock.stopwatch().state(), StopwatchState::Idle);
    assert_eq!(h.clock.stopwatch_display(), "00:00:00.00");
}

#[test]
fn real_countdown_on_threads() {
    use std::{sync::mpsc, time::Duration};

    use roosty_clockwork::{communication::Event, ticker::ThreadScheduler, time::MonotonicTime};

    let (tx, rx) = mpsc::channel();
    let chime = CountingChime::default();
    let mut clock = Clock::new(
        Config::default(),
        Persistence::new(MemoryStore::new()),
        Box::new(MonotonicTime::new()),
        Box::new(ThreadScheduler::new(tx)),
        Box::new(chime.clone()),
    );
    clock.navigate(View::Timer);
    assert!(clock.timer_set(1));
    assert!(clock.timer_start());

    let mut ticks = 0;
    while clock.timer().state() != TimerState::Finished {
        let Ok(Event::Tick { target, token }) = rx.recv_timeout(Duration::from_secs(3)) else {
            panic!("the countdown stopped ticking");
        };
        clock.on_tick(target, token);
        ticks += 1;
    }
    assert!(clock.now_ms() >= 1000);
    assert!(ticks >= 5, "only {ticks} ticks");
    assert_eq!(chime.count(), 1);
    assert_eq!(levels(&clock.take_notices()), vec![Level::Success]);
}
