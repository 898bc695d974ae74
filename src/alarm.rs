use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    ops::AddAssign,
    str::FromStr,
};

use chrono::{NaiveTime, Timelike, Weekday};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result, ValidationError},
    format,
    storage::Persistence,
};

pub const DEFAULT_LABEL: &str = "Alarm";
pub const DEFAULT_SNOOZE_MINUTES: u32 = 10;

/// Opaque alarm identifier, assigned once when the alarm is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(String);

impl AlarmId {
    /// base 36 wall clock millis followed by a base 36 random token
    fn generate(rng: &mut impl Rng) -> Self {
        let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        let mut id = to_base36(millis);
        id.push_str(&to_base36(rng.gen()));
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlarmId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for AlarmId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.into())
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];
const DAY_NAMES: [&str; 7] = ["Su", "M", "Tu", "W", "Th", "F", "Sa"];

/// Set of weekdays an alarm repeats on.
/// Stored as a bitmask (bit 0 is Sunday) and persisted as a list of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Days(u8);

impl Days {
    pub const EMPTY: Self = Self(0);
    pub const WEEKDAYS: Self = Self(0b011_1110);
    pub const WEEKENDS: Self = Self(0b100_0001);
    pub const EVERY_DAY: Self = Self(0b111_1111);

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn toggle(&mut self, day: Weekday) {
        self.0 ^= Self::bit(day);
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sunday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEK.into_iter().filter(move |day| self.contains(*day))
    }

    /// Indices with 0 as Sunday.
    #[allow(clippy::cast_possible_truncation)]
    pub fn indices(self) -> impl Iterator<Item = u8> {
        self.iter().map(|day| day.num_days_from_sunday() as u8)
    }
}

impl FromIterator<Weekday> for Days {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut days = Self::EMPTY;
        iter.into_iter().for_each(|day| days.insert(day));
        days
    }
}

impl TryFrom<Vec<u8>> for Days {
    type Error = ValidationError;

    /// A stored list must name at least one day.
    fn try_from(indices: Vec<u8>) -> std::result::Result<Self, Self::Error> {
        if indices.is_empty() {
            return Err(ValidationError::NoDays);
        }
        indices
            .into_iter()
            .map(|index| {
                WEEK.get(usize::from(index))
                    .copied()
                    .ok_or_else(|| ValidationError::InvalidDay(index.to_string()))
            })
            .collect()
    }
}

impl From<Days> for Vec<u8> {
    fn from(days: Days) -> Self {
        days.indices().collect()
    }
}

impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter()
            .try_for_each(|day| f.write_str(DAY_NAMES[day.num_days_from_sunday() as usize]))
    }
}

impl FromStr for Days {
    type Err = ValidationError;

    /// `weekdays`, `weekends`, `daily`, or a comma separated list of
    /// indices (`1,3,5`) or names (`mon,wed,fri`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekdays" => return Ok(Self::WEEKDAYS),
            "weekends" => return Ok(Self::WEEKENDS),
            "daily" | "everyday" => return Ok(Self::EVERY_DAY),
            _ => {}
        }
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                if let Ok(index) = part.parse::<u8>() {
                    return WEEK
                        .get(usize::from(index))
                        .copied()
                        .ok_or_else(|| ValidationError::InvalidDay(part.to_string()));
                }
                // chrono only knows monday based names
                part.parse::<Weekday>()
                    .or_else(|_| match part.to_ascii_lowercase().as_str() {
                        "su" => Ok(Weekday::Sun),
                        "mo" | "m" => Ok(Weekday::Mon),
                        "tu" => Ok(Weekday::Tue),
                        "we" | "w" => Ok(Weekday::Wed),
                        "th" => Ok(Weekday::Thu),
                        "fr" | "f" => Ok(Weekday::Fri),
                        "sa" => Ok(Weekday::Sat),
                        _ => Err(()),
                    })
                    .map_err(|()| ValidationError::InvalidDay(part.to_string()))
            })
            .collect()
    }
}

/// The sound an alarm rings with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChimeStyle {
    #[default]
    Chimes,
    Ring,
    BingBong,
    TickTock,
    BeepBeep,
    Rain,
}

impl ChimeStyle {
    pub const ALL: [Self; 6] = [
        Self::Chimes,
        Self::Ring,
        Self::BingBong,
        Self::TickTock,
        Self::BeepBeep,
        Self::Rain,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chimes => "chimes",
            Self::Ring => "ring",
            Self::BingBong => "bing_bong",
            Self::TickTock => "tick_tock",
            Self::BeepBeep => "beep_beep",
            Self::Rain => "rain",
        }
    }

    /// file looked up in the sounds directory
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.mp3", self.name())
    }
}

impl fmt::Display for ChimeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChimeStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|chime| chime.name() == wanted)
            .ok_or_else(|| ValidationError::UnknownChime(s.to_string()))
    }
}

/// Everything about an alarm the user can edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSettings {
    pub time: NaiveTime,
    pub label: String,
    pub days: Days,
    pub chime_style: ChimeStyle,
    pub snooze_minutes: u32,
}

impl AlarmSettings {
    /// Normalizes the settings (seconds dropped, blank label replaced) and
    /// rejects the ones that can't be saved.
    pub fn validate(mut self) -> std::result::Result<Self, ValidationError> {
        if self.days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        if self.snooze_minutes == 0 {
            return Err(ValidationError::ZeroSnooze);
        }
        self.time = NaiveTime::from_hms_opt(self.time.hour(), self.time.minute(), 0)
            .ok_or_else(|| ValidationError::InvalidTime(self.time.to_string()))?;
        if self.label.trim().is_empty() {
            DEFAULT_LABEL.clone_into(&mut self.label);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: AlarmId,
    #[serde(with = "format::hh_mm")]
    pub time: NaiveTime,
    #[serde(default = "default_label")]
    pub label: String,
    pub days: Days,
    #[serde(default)]
    pub chime_style: ChimeStyle,
    #[serde(default = "default_snooze")]
    pub snooze_minutes: u32,
    #[serde(default = "always_true")]
    pub enabled: bool,
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

const fn default_snooze() -> u32 {
    DEFAULT_SNOOZE_MINUTES
}

#[inline]
#[must_use]
pub const fn always_true() -> bool {
    true
}

impl AddAssign<AlarmSettings> for Alarm {
    /// used so that when we edit an alarm we don't lose its id or enabled state
    fn add_assign(&mut self, rhs: AlarmSettings) {
        self.time = rhs.time;
        self.label = rhs.label;
        self.days = rhs.days;
        self.chime_style = rhs.chime_style;
        self.snooze_minutes = rhs.snooze_minutes;
    }
}

impl Alarm {
    #[must_use]
    pub fn settings(&self) -> AlarmSettings {
        AlarmSettings {
            time: self.time,
            label: self.label.clone(),
            days: self.days,
            chime_style: self.chime_style,
            snooze_minutes: self.snooze_minutes,
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {} snooze {}m {}",
            format::format_alarm_time(self.time),
            self.label,
            self.days,
            self.chime_style,
            self.snooze_minutes,
            if self.enabled { "on" } else { "off" }
        )
    }
}

pub trait GetId<T> {
    fn get_id(&self) -> &T;
}

impl GetId<AlarmId> for Alarm {
    fn get_id(&self) -> &AlarmId {
        &self.id
    }
}

/// Serializable collection keyed by id.
/// Remembers insertion order, which is also the order it is persisted in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(from = "Vec<V>", into = "Vec<V>")]
pub struct Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    data: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Replacing an existing id keeps its original position.
    pub fn insert(&mut self, item: V) -> Option<V> {
        let id = item.get_id().to_owned();
        let old = self.data.insert(id.clone(), item);
        if old.is_none() {
            self.order.push(id);
        }
        old
    }

    pub fn remove(&mut self, id: &K) -> Option<V> {
        let removed = self.data.remove(id)?;
        self.order.retain(|key| key != id);
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, id: &K) -> Option<&V> {
        self.data.get(id)
    }

    pub fn get_mut(&mut self, id: &K) -> Option<&mut V> {
        self.data.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &K) -> bool {
        self.data.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// In insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|id| self.data.get(id))
    }
}

impl<K, V> From<Vec<V>> for Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    fn from(value: Vec<V>) -> Self {
        let mut obj: Self = Self::new();
        value.into_iter().for_each(|v| {
            obj.insert(v);
        });
        obj
    }
}

impl<K, V> From<Collection<K, V>> for Vec<V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    fn from(mut val: Collection<K, V>) -> Self {
        val.order
            .iter()
            .filter_map(|id| val.data.remove(id))
            .collect()
    }
}

pub type Alarms = Collection<AlarmId, Alarm>;

/// Owns the configured alarms and persists every change.
#[derive(Debug, Default)]
pub struct AlarmRegistry {
    alarms: Alarms,
}

impl AlarmRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores whatever alarms the store holds.
    #[must_use]
    pub fn load(store: &Persistence) -> Self {
        Self {
            alarms: store.load_alarms(),
        }
    }

    fn fresh_id(&self) -> AlarmId {
        let mut rng = rand::thread_rng();
        loop {
            let id = AlarmId::generate(&mut rng);
            if !self.alarms.contains(&id) {
                return id;
            }
        }
    }

    pub fn create(&mut self, settings: AlarmSettings, store: &mut Persistence) -> Result<Alarm> {
        let AlarmSettings {
            time,
            label,
            days,
            chime_style,
            snooze_minutes,
        } = settings.validate()?;
        let alarm = Alarm {
            id: self.fresh_id(),
            time,
            label,
            days,
            chime_style,
            snooze_minutes,
            enabled: true,
        };
        info!("created alarm {} at {}", alarm.id, format::format_hh_mm(alarm.time));
        self.alarms.insert(alarm.clone());
        store.save_alarms(&self.alarms);
        Ok(alarm)
    }

    pub fn update(
        &mut self,
        id: &AlarmId,
        settings: AlarmSettings,
        store: &mut Persistence,
    ) -> Result<()> {
        let alarm = self
            .alarms
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        *alarm += settings.validate()?;
        info!("updated alarm {id}");
        store.save_alarms(&self.alarms);
        Ok(())
    }

    pub fn delete(&mut self, id: &AlarmId, store: &mut Persistence) -> Result<Alarm> {
        let removed = self
            .alarms
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        info!("deleted alarm {id}");
        store.save_alarms(&self.alarms);
        Ok(removed)
    }

    /// Returns the new enabled state.
    pub fn toggle(&mut self, id: &AlarmId, store: &mut Persistence) -> Result<bool> {
        let alarm = self
            .alarms
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        alarm.enabled = !alarm.enabled;
        let enabled = alarm.enabled;
        debug!("alarm {id} enabled: {enabled}");
        store.save_alarms(&self.alarms);
        Ok(enabled)
    }

    #[must_use]
    pub fn get(&self, id: &AlarmId) -> Option<&Alarm> {
        self.alarms.get(id)
    }

    /// Sorted by time of day, alarms set for the same time keep the order
    /// they were added in.
    #[must_use]
    pub fn list(&self) -> Vec<&Alarm> {
        let mut sorted: Vec<_> = self.alarms.iter().collect();
        sorted.sort_by_key(|alarm| alarm.time);
        sorted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}
