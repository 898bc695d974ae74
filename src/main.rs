use std::{
    error::Error,
    io::{self, BufRead, Write},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Instant,
};

use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use log::{info, warn};
use roosty_clockwork::{
    alarm::{AlarmId, ChimeStyle, Days},
    alarm_edit::{AlarmBuilder, Saved},
    communication::Event,
    config::{Config, Theme},
    format,
    notify::{Level, Notice},
    sound::{Chime, TerminalBell},
    stopwatch::StopwatchState,
    storage::Persistence,
    ticker::ThreadScheduler,
    time::MonotonicTime,
    timer::TimerState,
    Clock, View,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    #[clap(subcommand)]
    Alarm(AlarmCommand),
    /// interactive stopwatch: enter or s to start/pause, l to lap, r to reset, q to quit
    Stopwatch,
    /// show the laps of the last stopwatch session
    Laps,
    /// interactive countdown: p to pause/resume, r to reset, q to quit
    Timer {
        /// e.g. 90, 05:00, 1:30:00 or 1h30m
        #[clap(value_parser = format::parse_duration)]
        duration: Option<u64>,
        /// use one of the configured presets, starting at 1
        #[clap(long, short, conflicts_with = "duration")]
        preset: Option<usize>,
    },
    /// live readout of the current time
    Clock,
    /// show or set the theme, toggles when no theme is given
    Theme {
        #[clap(value_parser = parse_theme)]
        theme: Option<Theme>,
    },
}

#[derive(Subcommand)]
enum AlarmCommand {
    Add {
        /// HH:MM or h:mm am/pm
        #[clap(value_parser = format::parse_time)]
        time: NaiveTime,
        #[clap(flatten)]
        fields: AlarmFields,
    },
    Edit {
        id: AlarmId,
        #[clap(value_parser = format::parse_time)]
        time: Option<NaiveTime>,
        #[clap(flatten)]
        fields: AlarmFields,
    },
    List,
    Toggle {
        id: AlarmId,
    },
    Delete {
        id: AlarmId,
        /// don't ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct AlarmFields {
    #[clap(long, short)]
    label: Option<String>,
    /// weekdays, weekends, daily or a list like mo,we,fr
    #[clap(long, short)]
    days: Option<Days>,
    #[clap(long, short)]
    chime: Option<ChimeStyle>,
    /// minutes
    #[clap(long, short)]
    snooze: Option<u32>,
}

impl AlarmFields {
    fn apply(self, builder: &mut AlarmBuilder) {
        if let Some(label) = self.label {
            builder.set_label(label);
        }
        if let Some(days) = self.days {
            builder.set_days(days);
        }
        if let Some(chime) = self.chime {
            builder.set_chime_style(chime);
        }
        if let Some(snooze) = self.snooze {
            builder.set_snooze_minutes(snooze);
        }
    }
}

fn parse_theme(input: &str) -> Result<Theme, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "dark" | "true" => Ok(Theme::Dark),
        "light" | "false" => Ok(Theme::Light),
        other => Err(format!("unknown theme {other}, expected dark or light")),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    if let Err(e) = simple_file_logger::init_logger!("roosty_clockwork") {
        eprintln!("couldn't initialize logger: {e:?}");
    }

    let args = Args::parse();
    let config_path = Config::config_path()?;

    if let Some(Command::Init { force }) = args.command {
        if force || !Config::is_config_present() {
            let config = Config::new();
            config.save(&config_path)?;
            let sounds = config.sounds_path()?;
            std::fs::create_dir_all(&sounds)?;
            println!("wrote {}", config_path.display());
            println!("put chime sounds (e.g. chimes.mp3) in {}", sounds.display());
        } else {
            println!(
                "{} already exists, use --force to overwrite it",
                config_path.display()
            );
        }
        return Ok(());
    }

    let config = Config::load(&config_path);
    let (tx, rx) = mpsc::channel();
    let mut clock = open_clock(config, tx.clone())?;

    match args.command {
        None => dashboard(&clock),
        Some(Command::Init { .. }) => {}
        Some(Command::Alarm(command)) => alarm(&mut clock, command),
        Some(Command::Laps) => {
            let laps = clock.stopwatch().laps();
            if laps.is_empty() {
                println!("no laps recorded");
            }
            for (n, lap) in laps.iter().enumerate() {
                println!("Lap {:>2}  {}", n + 1, format::format_stopwatch(*lap));
            }
        }
        Some(Command::Theme { theme }) => {
            match theme {
                Some(theme) => clock.set_theme(theme),
                None => {
                    clock.toggle_theme();
                }
            }
            println!("theme: {}", clock.theme());
            print_notices(&mut clock);
        }
        Some(Command::Stopwatch) => stopwatch(&mut clock, tx, &rx),
        Some(Command::Timer { duration, preset }) => timer(&mut clock, duration, preset, tx, &rx),
        Some(Command::Clock) => readout(&mut clock, tx, &rx),
    }
    Ok(())
}

fn open_clock(config: Config, sender: Sender<Event>) -> Result<Clock, Box<dyn Error>> {
    let store = Persistence::new(config.open_store()?);
    let chime = chime(&config);
    Ok(Clock::new(
        config,
        store,
        Box::new(MonotonicTime::new()),
        Box::new(ThreadScheduler::new(sender)),
        chime,
    ))
}

#[cfg(feature = "sound")]
fn chime(config: &Config) -> Box<dyn Chime> {
    match config.sounds_path() {
        Ok(sounds) => Box::new(roosty_clockwork::sound::RodioChime::new(sounds)),
        Err(e) => {
            warn!("no sounds directory: {e}");
            Box::new(TerminalBell)
        }
    }
}

#[cfg(not(feature = "sound"))]
fn chime(_config: &Config) -> Box<dyn Chime> {
    Box::new(TerminalBell)
}

fn print_notices(clock: &mut Clock) {
    for notice in clock.take_notices() {
        match notice.level {
            Level::Info | Level::Success => println!("{notice}"),
            Level::Warning | Level::Error => eprintln!("{notice}"),
        }
    }
}

fn dashboard(clock: &Clock) {
    println!("{}", clock.clock_display());
    let alarms = clock.alarms().list();
    let enabled = alarms.iter().filter(|alarm| alarm.enabled).count();
    println!("{} alarms, {enabled} on", alarms.len());
    for alarm in alarms.iter().filter(|alarm| alarm.enabled) {
        println!("  {alarm}");
    }
    println!("{} laps recorded", clock.stopwatch().laps().len());
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).is_ok()
        && matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn alarm(clock: &mut Clock, command: AlarmCommand) {
    match command {
        AlarmCommand::Add { time, fields } => {
            let mut builder = clock.new_alarm();
            builder.set_time(time);
            fields.apply(&mut builder);
            if let Some(Saved::Created(alarm)) = clock.save_alarm(&builder) {
                println!("{}  {alarm}", alarm.id);
            }
        }
        AlarmCommand::Edit { id, time, fields } => {
            if let Some(mut builder) = clock.edit_alarm(&id) {
                if let Some(time) = time {
                    builder.set_time(time);
                }
                fields.apply(&mut builder);
                if clock.save_alarm(&builder).is_some() {
                    if let Some(alarm) = clock.alarms().get(&id) {
                        println!("{}  {alarm}", alarm.id);
                    }
                }
            }
        }
        AlarmCommand::List => {
            let alarms = clock.alarms().list();
            if alarms.is_empty() {
                println!("no alarms");
            }
            for alarm in alarms {
                println!("{}  {alarm}", alarm.id);
            }
        }
        AlarmCommand::Toggle { id } => {
            if let Some(enabled) = clock.toggle_alarm(&id) {
                println!("{id} is {}", if enabled { "on" } else { "off" });
            }
        }
        AlarmCommand::Delete { id, yes } => {
            clock.delete_alarm(&id, |prompt| yes || confirm(prompt));
        }
    }
    print_notices(clock);
}

/// Feeds stdin lines into the event channel until it closes.
fn spawn_input(sender: Sender<Event>) {
    let spawned = thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(Event::Input(line)).is_err() {
                    return;
                }
            }
            let _ = sender.send(Event::InputClosed);
        });
    if let Err(e) = spawned {
        warn!("couldn't read input: {e}");
    }
}

fn redraw(line: &str) {
    print!("\r{line}   ");
    let _ = io::stdout().flush();
}

/// The newest notice, shown next to the readout until its level's
/// display time runs out.
struct Banner {
    notice: Notice,
    shown: Instant,
}

impl Banner {
    fn is_expired(&self) -> bool {
        self.shown.elapsed() >= self.notice.level.duration()
    }
}

/// Runs the event loop for an interactive view. `on_input` returns `false`
/// to leave, `finished` is checked after every tick.
fn interact(
    clock: &mut Clock,
    events: &Receiver<Event>,
    render: impl Fn(&Clock) -> String,
    mut on_input: impl FnMut(&mut Clock, &str) -> bool,
    finished: impl Fn(&Clock) -> bool,
) {
    let mut banner: Option<Banner> = None;
    let line = |clock: &Clock, banner: Option<&Banner>| match banner {
        Some(banner) => format!("{}  {}", render(clock), banner.notice),
        None => render(clock),
    };

    redraw(&line(clock, banner.as_ref()));
    while let Ok(event) = events.recv() {
        let mut dirty = match event {
            Event::Tick { target, token } => clock.on_tick(target, token),
            Event::Input(input) => {
                if !on_input(clock, input.trim()) {
                    break;
                }
                true
            }
            Event::InputClosed => break,
        };
        if banner.as_ref().is_some_and(Banner::is_expired) {
            banner = None;
            // clear what the longer line left behind
            redraw(&" ".repeat(line(clock, None).len() + 40));
            dirty = true;
        }
        let mut notices = clock.take_notices();
        if let Some(newest) = notices.pop() {
            if !notices.is_empty() {
                println!();
                notices.iter().for_each(|notice| println!("{notice}"));
            }
            banner = Some(Banner {
                notice: newest,
                shown: Instant::now(),
            });
            dirty = true;
        }
        if dirty {
            redraw(&line(clock, banner.as_ref()));
        }
        if finished(clock) {
            break;
        }
    }
    println!();
    clock.navigate(View::Dashboard);
}

fn stopwatch(clock: &mut Clock, tx: Sender<Event>, events: &Receiver<Event>) {
    clock.navigate(View::Stopwatch);
    println!("enter/s start or pause, l lap, r reset, q quit");
    spawn_input(tx);
    interact(
        clock,
        events,
        |clock| {
            let state = match clock.stopwatch().state() {
                StopwatchState::Idle => "",
                StopwatchState::Running => "running",
                StopwatchState::Paused => "paused",
            };
            format!("{} {state}", clock.stopwatch_display())
        },
        |clock, input| {
            match input {
                "" | "s" => {
                    clock.stopwatch_toggle();
                }
                "l" => {
                    if let Some(lap) = clock.stopwatch_lap() {
                        let n = clock.stopwatch().laps().len();
                        println!("\rLap {n:>2}  {}", format::format_stopwatch(lap));
                    }
                }
                "r" => clock.stopwatch_reset(),
                "q" => return false,
                other => println!("\runknown command {other:?}"),
            }
            true
        },
        |_| false,
    );
}

fn timer(
    clock: &mut Clock,
    duration: Option<u64>,
    preset: Option<usize>,
    tx: Sender<Event>,
    events: &Receiver<Event>,
) {
    clock.navigate(View::Timer);
    let set = match (duration, preset) {
        (Some(seconds), _) => clock.timer_set(seconds),
        (None, Some(preset)) => clock.timer_preset(preset.saturating_sub(1)),
        (None, None) => {
            let presets = &clock.config().timer_presets;
            println!("no duration given, presets:");
            for (n, seconds) in presets.iter().enumerate() {
                println!("  {}: {}", n + 1, format::format_timer(*seconds));
            }
            return;
        }
    };
    if !set || !clock.timer_start() {
        print_notices(clock);
        return;
    }
    info!("countdown of {}s started", clock.timer().duration_seconds());
    println!("p pause or resume, r reset, q quit");
    spawn_input(tx);
    interact(
        clock,
        events,
        |clock| {
            let state = match clock.timer().state() {
                TimerState::Paused => "paused",
                TimerState::Finished => "done",
                _ => "",
            };
            format!("{} {state}", clock.timer_display())
        },
        |clock, input| {
            match input {
                "" | "p" => {
                    clock.timer_toggle();
                }
                "r" => {
                    clock.timer_reset();
                    return false;
                }
                "q" => return false,
                other => println!("\runknown command {other:?}"),
            }
            true
        },
        |clock| clock.timer().state() == TimerState::Finished,
    );
    clock.wait_for_chime();
}

fn readout(clock: &mut Clock, tx: Sender<Event>, events: &Receiver<Event>) {
    clock.navigate(View::Alarms);
    println!("q quit");
    spawn_input(tx);
    interact(
        clock,
        events,
        Clock::clock_display,
        |_, input| input != "q",
        |_| false,
    );
}
