//! Game clock: converts real elapsed seconds into game time, rolls days
//! and seasons, and fires period, day, season and one-shot notifications.
//!
//! RULES:
//!   - The stored hour is always in [0, 24). Each overflow is one day rollover.
//!   - Seasons change only at day boundaries, every `days_per_season` days.
//!   - Restoring or force-setting time resyncs the period without notifying.
//!   - Listener failures are isolated (see notify.rs).
//!
//! `advance()` both notifies registered listeners and returns the events
//! it produced, so the engine can route them to subsystems afterwards.

use crate::{
    config::ClockConfig,
    document::{restore_lenient, to_document},
    notify::{run_isolated, ListenerId, Notifier},
    subsystem::Persistable,
    types::{Day, Document},
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

pub const HOURS_PER_DAY: f64 = 24.0;
pub const MIN_TIME_SCALE: f64 = 0.1;
pub const MAX_TIME_SCALE: f64 = 10.0;
const MAX_SET_HOUR: f64 = 23.999;
/// Hours this close below midnight count as midnight, absorbing the drift
/// of summing per-frame fractions.
const MIDNIGHT_TOLERANCE: f64 = 1e-6;

// ── Calendar types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning   => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening   => "evening",
            TimePeriod::Night     => "night",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub u64);

/// Everything `advance()` can report, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockEvent {
    PeriodChanged { old: TimePeriod, new: TimePeriod },
    NewDay { day: Day },
    NewSeason { season: Season },
    Scheduled { id: ScheduleId, label: String },
}

// ── Persisted state ───────────────────────────────────────────────────────────

/// The clock's snapshot document, under the `time` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockState {
    pub current_hour:         f64,
    pub current_day:          Day,
    pub current_season_index: usize,
    pub time_scale:           f64,
}

impl ClockState {
    pub fn starting(config: &ClockConfig) -> Self {
        Self {
            current_hour:         config.start_hour.clamp(0.0, MAX_SET_HOUR),
            current_day:          1,
            current_season_index: 0,
            time_scale:           1.0,
        }
    }

    /// Pull every field back into its legal range.
    fn sanitized(mut self, fallback: &ClockState) -> Self {
        self.current_hour = if self.current_hour.is_finite() {
            self.current_hour.rem_euclid(HOURS_PER_DAY)
        } else {
            fallback.current_hour
        };
        self.current_day = self.current_day.max(1);
        self.current_season_index %= Season::ALL.len();
        self.time_scale = if self.time_scale.is_finite() {
            self.time_scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE)
        } else {
            fallback.time_scale
        };
        self
    }
}

impl Default for ClockState {
    fn default() -> Self {
        Self::starting(&ClockConfig::default())
    }
}

struct ScheduledEvent {
    id:       ScheduleId,
    hour:     f64,
    label:    String,
    callback: Option<Box<dyn FnOnce() -> anyhow::Result<()>>>,
}

// ── Clock ─────────────────────────────────────────────────────────────────────

pub struct GameClock {
    config:           ClockConfig,
    state:            ClockState,
    paused:           bool,
    period:           TimePeriod,
    period_listeners: Notifier<(TimePeriod, TimePeriod)>,
    day_listeners:    Notifier<Day>,
    season_listeners: Notifier<Season>,
    scheduled:        Vec<ScheduledEvent>,
    next_schedule_id: u64,
}

impl GameClock {
    pub fn new(mut config: ClockConfig) -> Self {
        let shipped = ClockConfig::default();
        if !(config.real_seconds_per_game_hour.is_finite() && config.real_seconds_per_game_hour > 0.0) {
            log::warn!(
                "clock: real_seconds_per_game_hour={} is unusable; using {}",
                config.real_seconds_per_game_hour, shipped.real_seconds_per_game_hour
            );
            config.real_seconds_per_game_hour = shipped.real_seconds_per_game_hour;
        }
        if config.days_per_season == 0 {
            config.days_per_season = shipped.days_per_season;
        }
        let state = ClockState::starting(&config);
        let mut clock = Self {
            config,
            state,
            paused:           false,
            period:           TimePeriod::Morning,
            period_listeners: Notifier::new("period_change"),
            day_listeners:    Notifier::new("new_day"),
            season_listeners: Notifier::new("new_season"),
            scheduled:        Vec::new(),
            next_schedule_id: 0,
        };
        clock.period = clock.period_at(clock.state.current_hour);
        clock
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    /// Advance by `dt` real seconds. Returns the notifications fired, in order:
    /// season/day rollovers first, then at most one period change, then any
    /// scheduled one-shots that came due.
    ///
    /// This moves time only. Gameplay goes through `GameContext::advance_time`,
    /// which also hands the events to the subsystems and runs the autosave.
    pub fn advance(&mut self, dt: f64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("clock: ignoring advance by dt={dt}");
            return events;
        }

        let game_hours = dt / self.config.real_seconds_per_game_hour * self.state.time_scale;
        self.state.current_hour += game_hours;
        if HOURS_PER_DAY - self.state.current_hour < MIDNIGHT_TOLERANCE {
            self.state.current_hour = self.state.current_hour.max(HOURS_PER_DAY);
        }
        while self.state.current_hour >= HOURS_PER_DAY {
            self.state.current_hour -= HOURS_PER_DAY;
            self.roll_day(&mut events);
        }

        let period = self.period_at(self.state.current_hour);
        if period != self.period {
            let old = self.period;
            self.period = period;
            log::debug!("day={} period {old} -> {period}", self.state.current_day);
            self.period_listeners.dispatch(&(old, period));
            events.push(ClockEvent::PeriodChanged { old, new: period });
        }

        self.fire_due(&mut events);
        events
    }

    fn roll_day(&mut self, events: &mut Vec<ClockEvent>) {
        self.state.current_day += 1;
        let day = self.state.current_day;

        if day > 1 && (day - 1) % self.config.days_per_season == 0 {
            self.state.current_season_index = (self.state.current_season_index + 1) % Season::ALL.len();
            let season = self.current_season();
            log::info!("day={day} season is now {season}");
            self.season_listeners.dispatch(&season);
            events.push(ClockEvent::NewSeason { season });
        }

        log::debug!("day={day} began");
        self.day_listeners.dispatch(&day);
        events.push(ClockEvent::NewDay { day });
    }

    fn fire_due(&mut self, events: &mut Vec<ClockEvent>) {
        let hour = self.state.current_hour;
        if !self.scheduled.iter().any(|e| hour >= e.hour) {
            return;
        }
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.scheduled).into_iter().partition(|e| hour >= e.hour);
        self.scheduled = pending;

        for event in due {
            log::debug!("day={} scheduled '{}' fired at hour {hour:.2}", self.state.current_day, event.label);
            if let Some(callback) = event.callback {
                run_isolated("scheduled", callback);
            }
            events.push(ClockEvent::Scheduled { id: event.id, label: event.label });
        }
    }

    fn period_at(&self, hour: f64) -> TimePeriod {
        if hour >= self.config.evening_start {
            TimePeriod::Evening
        } else if hour >= self.config.afternoon_start {
            TimePeriod::Afternoon
        } else if hour >= self.config.morning_start {
            TimePeriod::Morning
        } else {
            TimePeriod::Night
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn current_hour(&self) -> f64 {
        self.state.current_hour
    }

    pub fn current_day(&self) -> Day {
        self.state.current_day
    }

    pub fn current_season(&self) -> Season {
        Season::from_index(self.state.current_season_index)
    }

    pub fn season_name(&self) -> &'static str {
        self.current_season().as_str()
    }

    /// 1-based day within the current season.
    pub fn day_in_season(&self) -> u32 {
        (self.state.current_day - 1) % self.config.days_per_season + 1
    }

    pub fn period(&self) -> TimePeriod {
        self.period
    }

    /// Whole hour and truncated minute of the current time.
    pub fn hour_minute(&self) -> (u32, u32) {
        let hour = self.state.current_hour.floor();
        let minute = ((self.state.current_hour - hour) * 60.0).floor().min(59.0);
        (hour as u32, minute as u32)
    }

    /// Twelve-hour display, e.g. "8:00 AM", "12:30 PM", "12:00 AM".
    pub fn formatted_time(&self) -> String {
        let (hour, minute) = self.hour_minute();
        let suffix = if hour < 12 { "AM" } else { "PM" };
        let display = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{display}:{minute:02} {suffix}")
    }

    pub fn is_cafe_open(&self) -> bool {
        let hour = self.state.current_hour;
        hour >= self.config.cafe_open_hour && hour < self.config.cafe_close_hour
    }

    pub fn is_daytime(&self) -> bool {
        matches!(self.period, TimePeriod::Morning | TimePeriod::Afternoon)
    }

    pub fn is_nighttime(&self) -> bool {
        self.period == TimePeriod::Night
    }

    /// Ambient light in [night_level, 1.0]; continuous at every breakpoint.
    pub fn light_level(&self) -> f64 {
        let curve = &self.config.light;
        let hour = self.state.current_hour;
        let ramp = |from: f64, to: f64, start: f64, end: f64| {
            let t = ((hour - start) / (end - start)).clamp(0.0, 1.0);
            from + (to - from) * t
        };

        if hour >= curve.dawn_start && hour < curve.day_start {
            ramp(curve.night_level, 1.0, curve.dawn_start, curve.day_start)
        } else if hour >= curve.day_start && hour < curve.dusk_start {
            1.0
        } else if hour >= curve.dusk_start && hour < curve.evening_start {
            ramp(1.0, curve.evening_level, curve.dusk_start, curve.evening_start)
        } else if hour >= curve.evening_start && hour < curve.night_start {
            ramp(curve.evening_level, curve.night_level, curve.evening_start, curve.night_start)
        } else {
            curve.night_level
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f64 {
        self.state.time_scale
    }

    // ── Control ───────────────────────────────────────────────────────────────

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_time_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            log::warn!("clock: ignoring time scale {scale}");
            return;
        }
        let clamped = scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
        if clamped != scale {
            log::warn!("clock: time scale {scale} clamped to {clamped}");
        }
        self.state.time_scale = clamped;
    }

    /// Jump to `hour` on the current day. Does not notify.
    pub fn set_hour(&mut self, hour: f64) {
        if !hour.is_finite() {
            log::warn!("clock: ignoring set_hour({hour})");
            return;
        }
        let clamped = hour.clamp(0.0, MAX_SET_HOUR);
        if clamped != hour {
            log::warn!("clock: hour {hour} clamped to {clamped}");
        }
        self.state.current_hour = clamped;
        self.period = self.period_at(clamped);
    }

    /// Jump to `day`. Does not notify and does not recompute the season.
    pub fn set_day(&mut self, day: Day) {
        if day < 1 {
            log::warn!("clock: day {day} raised to 1");
        }
        self.state.current_day = day.max(1);
    }

    /// Sleep through to the next morning: one forced rollover, then the
    /// period is resynced without a period notification. Gameplay uses
    /// `GameContext::sleep`.
    pub fn skip_to_next_morning(&mut self) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        self.state.current_hour = self.config.morning_start;
        self.roll_day(&mut events);
        self.period = self.period_at(self.state.current_hour);
        events
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    pub fn on_period_change<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(TimePeriod, TimePeriod) -> anyhow::Result<()> + 'static,
    {
        self.period_listeners.subscribe(move |&(old, new)| listener(old, new))
    }

    pub fn on_new_day<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(Day) -> anyhow::Result<()> + 'static,
    {
        self.day_listeners.subscribe(move |&day| listener(day))
    }

    pub fn on_new_season<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(Season) -> anyhow::Result<()> + 'static,
    {
        self.season_listeners.subscribe(move |&season| listener(season))
    }

    /// Register a one-shot that fires on the first `advance()` whose
    /// resulting hour is at or past `hour`.
    pub fn schedule(&mut self, hour: f64, label: impl Into<String>) -> ScheduleId {
        self.push_scheduled(hour, label.into(), None)
    }

    pub fn schedule_with<F>(&mut self, hour: f64, label: impl Into<String>, callback: F) -> ScheduleId
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        self.push_scheduled(hour, label.into(), Some(Box::new(callback)))
    }

    fn push_scheduled(
        &mut self,
        hour: f64,
        label: String,
        callback: Option<Box<dyn FnOnce() -> anyhow::Result<()>>>,
    ) -> ScheduleId {
        let hour = if hour.is_finite() {
            hour.clamp(0.0, MAX_SET_HOUR)
        } else {
            log::warn!("clock: scheduled '{label}' at hour {hour}; firing on next advance");
            0.0
        };
        self.next_schedule_id += 1;
        let id = ScheduleId(self.next_schedule_id);
        self.scheduled.push(ScheduledEvent { id, hour, label, callback });
        id
    }

    pub fn cancel(&mut self, id: ScheduleId) -> bool {
        let before = self.scheduled.len();
        self.scheduled.retain(|e| e.id != id);
        self.scheduled.len() != before
    }

    pub fn clear_scheduled(&mut self) {
        self.scheduled.clear();
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }
}

impl Default for GameClock {
    fn default() -> Self { Self::new(ClockConfig::default()) }
}

impl fmt::Debug for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClock")
            .field("state", &self.state)
            .field("period", &self.period)
            .field("paused", &self.paused)
            .field("scheduled", &self.scheduled.len())
            .finish()
    }
}

impl Persistable for GameClock {
    fn name(&self) -> &'static str { "time" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    /// Replaces time state wholesale, drops pending one-shots and resyncs
    /// the period. Nothing is notified.
    fn restore(&mut self, doc: &Document) {
        let fresh = ClockState::starting(&self.config);
        let state: ClockState = restore_lenient(self.name(), doc, fresh.clone());
        self.state = state.sanitized(&fresh);
        self.scheduled.clear();
        self.period = self.period_at(self.state.current_hour);
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
