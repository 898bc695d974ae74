use chrono::{NaiveTime, Timelike, Weekday};

use crate::{
    alarm::{Alarm, AlarmId, AlarmRegistry, AlarmSettings, ChimeStyle, Days},
    config::Config,
    error::{Result, ValidationError},
    format::{from_24_hour, to_24_hour},
    storage::Persistence,
    TimeOfDay,
};

/// State of the add/edit alarm form.
///
/// The hour is kept as the 12-hour value shown to the user together with
/// [`TimeOfDay`], and only converted to 24 hours when building the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmBuilder {
    editing: Option<AlarmId>,
    label: String,
    hour: u8,
    minute: u8,
    time_of_day: TimeOfDay,
    days: Days,
    chime_style: ChimeStyle,
    snooze_minutes: u32,
}

/// What saving the form did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    Created(Alarm),
    Updated(AlarmId),
}

impl AlarmBuilder {
    /// A blank form for a new alarm.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let mut builder = Self {
            editing: None,
            label: String::new(),
            hour: 12,
            minute: 0,
            time_of_day: TimeOfDay::AM,
            days: config.default_days,
            chime_style: config.default_chime,
            snooze_minutes: config.default_snooze_minutes,
        };
        builder.set_time(config.default_time);
        builder
    }

    /// The form filled in from an existing alarm.
    #[must_use]
    pub fn edit(alarm: &Alarm) -> Self {
        let mut builder = Self {
            editing: Some(alarm.id.clone()),
            label: alarm.label.clone(),
            hour: 12,
            minute: 0,
            time_of_day: TimeOfDay::AM,
            days: alarm.days,
            chime_style: alarm.chime_style,
            snooze_minutes: alarm.snooze_minutes,
        };
        builder.set_time(alarm.time);
        builder
    }

    #[must_use]
    pub const fn editing(&self) -> Option<&AlarmId> {
        self.editing.as_ref()
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Alarm"
        } else {
            "Add Alarm"
        }
    }

    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    #[must_use]
    pub const fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    #[must_use]
    pub const fn days(&self) -> Days {
        self.days
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn chime_style(&self) -> ChimeStyle {
        self.chime_style
    }

    #[must_use]
    pub const fn snooze_minutes(&self) -> u32 {
        self.snooze_minutes
    }

    /// Direct hour entry, clamped to 1-12.
    pub fn set_hour(&mut self, hour: u8) {
        self.hour = hour.clamp(1, 12);
    }

    /// Direct minute entry, clamped to 0-59.
    pub fn set_minute(&mut self, minute: u8) {
        self.minute = minute.min(59);
    }

    // spinners wrap around instead of clamping
    pub fn hour_up(&mut self) {
        self.hour = self.hour % 12 + 1;
    }

    pub fn hour_down(&mut self) {
        self.hour = (self.hour + 10) % 12 + 1;
    }

    pub fn minute_up(&mut self) {
        self.minute = (self.minute + 1) % 60;
    }

    pub fn minute_down(&mut self) {
        self.minute = (self.minute + 59) % 60;
    }

    pub fn toggle_time_of_day(&mut self) {
        self.time_of_day = !self.time_of_day;
    }

    pub fn set_time_of_day(&mut self, time_of_day: TimeOfDay) {
        self.time_of_day = time_of_day;
    }

    /// Splits a 24-hour time into the form's 12-hour fields.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_time(&mut self, time: NaiveTime) {
        let (hour, time_of_day) = from_24_hour(time.hour() as u8);
        self.hour = hour;
        self.minute = time.minute() as u8;
        self.time_of_day = time_of_day;
    }

    /// The 24-hour time the form currently describes.
    #[must_use]
    pub fn time(&self) -> NaiveTime {
        let hour = to_24_hour(self.hour.clamp(1, 12), self.time_of_day);
        NaiveTime::from_hms_opt(u32::from(hour), u32::from(self.minute.min(59)), 0)
            .unwrap_or_default()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn toggle_day(&mut self, day: Weekday) {
        self.days.toggle(day);
    }

    pub fn set_days(&mut self, days: Days) {
        self.days = days;
    }

    pub fn set_chime_style(&mut self, chime_style: ChimeStyle) {
        self.chime_style = chime_style;
    }

    pub fn set_snooze_minutes(&mut self, snooze_minutes: u32) {
        self.snooze_minutes = snooze_minutes;
    }

    pub fn settings(&self) -> std::result::Result<AlarmSettings, ValidationError> {
        AlarmSettings {
            time: self.time(),
            label: self.label.clone(),
            days: self.days,
            chime_style: self.chime_style,
            snooze_minutes: self.snooze_minutes,
        }
        .validate()
    }

    /// Creates the alarm, or updates the one being edited.
    pub fn save(&self, registry: &mut AlarmRegistry, store: &mut Persistence) -> Result<Saved> {
        let settings = self.settings()?;
        match &self.editing {
            Some(id) => {
                registry.update(id, settings, store)?;
                Ok(Saved::Updated(id.clone()))
            }
            None => registry.create(settings, store).map(Saved::Created),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, storage::MemoryStore};

    #[test]
    fn new_form_defaults() {
        let builder = AlarmBuilder::new(&Config::default());
        assert_eq!(builder.title(), "Add Alarm");
        assert_eq!((builder.hour(), builder.minute()), (9, 0));
        assert_eq!(builder.time_of_day(), TimeOfDay::AM);
        assert_eq!(builder.days(), Days::WEEKDAYS);
        assert_eq!(builder.chime_style(), ChimeStyle::Chimes);
        assert_eq!(builder.snooze_minutes(), 10);
        assert!(builder.label().is_empty());
    }

    #[test]
    fn spinners_wrap() {
        let mut builder = AlarmBuilder::new(&Config::default());
        builder.set_hour(11);
        builder.hour_up();
        assert_eq!(builder.hour(), 12);
        builder.hour_up();
        assert_eq!(builder.hour(), 1);
        builder.hour_down();
        assert_eq!(builder.hour(), 12);
        builder.hour_down();
        assert_eq!(builder.hour(), 11);

        builder.set_minute(59);
        builder.minute_up();
        assert_eq!(builder.minute(), 0);
        builder.minute_down();
        assert_eq!(builder.minute(), 59);
    }

    #[test]
    fn direct_entry_clamps() {
        let mut builder = AlarmBuilder::new(&Config::default());
        builder.set_hour(0);
        assert_eq!(builder.hour(), 1);
        builder.set_hour(40);
        assert_eq!(builder.hour(), 12);
        builder.set_minute(75);
        assert_eq!(builder.minute(), 59);
    }

    #[test]
    fn twelve_hour_fields_map_to_24() {
        let mut builder = AlarmBuilder::new(&Config::default());
        builder.set_hour(12);
        builder.set_minute(30);
        assert_eq!(builder.time(), NaiveTime::from_hms_opt(0, 30, 0).unwrap());
        builder.toggle_time_of_day();
        assert_eq!(builder.time(), NaiveTime::from_hms_opt(12, 30, 0).unwrap());
        builder.set_hour(7);
        assert_eq!(builder.time(), NaiveTime::from_hms_opt(19, 30, 0).unwrap());
    }

    #[test]
    fn no_days_is_rejected() {
        let mut builder = AlarmBuilder::new(&Config::default());
        Days::WEEKDAYS.iter().for_each(|day| builder.toggle_day(day));
        assert_eq!(builder.settings(), Err(ValidationError::NoDays));
    }

    #[test]
    fn save_creates_then_updates() {
        let mut store = Persistence::new(MemoryStore::new());
        let mut registry = AlarmRegistry::new();

        let mut builder = AlarmBuilder::new(&Config::default());
        builder.set_label("gym");
        let Saved::Created(alarm) = builder.save(&mut registry, &mut store).unwrap() else {
            panic!("expected a new alarm");
        };

        let mut edit = AlarmBuilder::edit(&alarm);
        assert_eq!(edit.title(), "Edit Alarm");
        assert_eq!(edit.label(), "gym");
        edit.set_time_of_day(TimeOfDay::PM);
        edit.set_days(Days::WEEKENDS);
        assert_eq!(
            edit.save(&mut registry, &mut store).unwrap(),
            Saved::Updated(alarm.id.clone())
        );

        let updated = registry.get(&alarm.id).unwrap();
        assert_eq!(updated.time, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(updated.days, Days::WEEKENDS);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stale_edit_is_not_found() {
        let mut store = Persistence::new(MemoryStore::new());
        let mut registry = AlarmRegistry::new();
        let alarm = AlarmBuilder::new(&Config::default())
            .save(&mut registry, &mut store)
            .map(|saved| match saved {
                Saved::Created(alarm) => alarm,
                Saved::Updated(_) => unreachable!(),
            })
            .unwrap();
        let edit = AlarmBuilder::edit(&alarm);
        registry.delete(&alarm.id, &mut store).unwrap();
        assert!(matches!(
            edit.save(&mut registry, &mut store),
            Err(Error::NotFound(_))
        ));
        assert!(registry.is_empty());
    }
}
