//! Clock engine tests: rollover, seasons, periods, one-shots, listener
//! isolation and snapshot/restore.

use dragonhaven_core::{
    clock::{ClockEvent, GameClock, Season, TimePeriod},
    config::GameConfig,
    subsystem::Persistable,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// 30 real seconds per game hour, start at 08:00, 28-day seasons.
fn build() -> GameClock {
    let _ = env_logger::builder().is_test(true).try_init();
    GameClock::new(GameConfig::default_test().clock)
}

const SECONDS_PER_HOUR: f64 = 30.0;

fn new_days(events: &[ClockEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            ClockEvent::NewDay { day } => Some(*day),
            _ => None,
        })
        .collect()
}

/// One large advance and many small ones land on the same time, with the
/// same day rollovers.
#[test]
fn rollover_is_independent_of_frame_size() {
    let mut whole = build();
    let mut chunked = build();
    let total = SECONDS_PER_HOUR * 24.0 * 3.0;

    let whole_events = whole.advance(total);
    let mut chunked_events = Vec::new();
    for _ in 0..(total / 15.0) as usize {
        chunked_events.extend(chunked.advance(15.0));
    }

    assert_eq!(whole.current_day(), 4, "three days after day 1 is day 4, got {}", whole.current_day());
    assert_eq!(whole.current_day(), chunked.current_day());
    assert!(
        (whole.current_hour() - chunked.current_hour()).abs() < 1e-9,
        "hours diverged: {} vs {}",
        whole.current_hour(),
        chunked.current_hour()
    );
    assert_eq!(new_days(&whole_events), vec![2, 3, 4]);
    assert_eq!(new_days(&chunked_events), vec![2, 3, 4]);
}

/// Exactly three game days of frames at common frame rates roll over
/// exactly three times, starting from midnight.
#[test]
fn rollover_holds_at_real_frame_rates() {
    for (dt, frames_per_day) in [(1.0 / 60.0, 43_200), (0.05, 14_400), (0.1, 7_200)] {
        let mut clock = build();
        clock.set_hour(0.0);
        let mut days = Vec::new();
        for frame in 1..=frames_per_day * 3 {
            days.extend(new_days(&clock.advance(dt)));
            if frame % frames_per_day == 0 {
                assert_eq!(
                    clock.current_day(),
                    1 + (frame / frames_per_day) as u32,
                    "dt={dt}: day missed after {frame} frames, hour={}",
                    clock.current_hour()
                );
            }
        }
        assert_eq!(days, vec![2, 3, 4], "dt={dt}");
        assert!(clock.current_hour() < 1e-6, "dt={dt}: expected midnight, got {}", clock.current_hour());
    }
}

/// The hour never reaches 24.
#[test]
fn hour_stays_below_twenty_four() {
    let mut clock = build();
    clock.advance(SECONDS_PER_HOUR * 16.0);
    assert_eq!(clock.current_day(), 2);
    assert!(clock.current_hour() < 24.0, "hour out of range: {}", clock.current_hour());
    assert!((clock.current_hour() - 0.0).abs() < 1e-9, "expected midnight, got {}", clock.current_hour());
}

/// Season changes on day 29 with 28-day seasons, and the season event
/// comes before that day's new-day event.
#[test]
fn season_changes_at_the_day_boundary() {
    let mut clock = build();
    let events = clock.advance(SECONDS_PER_HOUR * 24.0 * 28.0);

    assert_eq!(clock.current_day(), 29);
    assert_eq!(clock.current_season(), Season::Summer);
    assert_eq!(clock.day_in_season(), 1);

    let season_at = events
        .iter()
        .position(|e| matches!(e, ClockEvent::NewSeason { season: Season::Summer }))
        .expect("season event");
    let day_at = events
        .iter()
        .position(|e| matches!(e, ClockEvent::NewDay { day: 29 }))
        .expect("day 29 event");
    assert!(season_at < day_at, "season event at {season_at} should precede day event at {day_at}");
}

/// Four seasons later (day 113) the calendar wraps back to spring.
#[test]
fn season_wraps_after_a_year() {
    let mut clock = build();
    let events = clock.advance(SECONDS_PER_HOUR * 24.0 * 112.0);
    assert_eq!(clock.current_day(), 113);
    assert_eq!(clock.current_season(), Season::Spring);
    let seasons = events.iter().filter(|e| matches!(e, ClockEvent::NewSeason { .. })).count();
    assert_eq!(seasons, 4, "expected four season changes, got {seasons}");
}

/// Crossing from morning into afternoon reports exactly one change.
#[test]
fn period_change_is_reported_once() {
    let mut clock = build();
    assert_eq!(clock.period(), TimePeriod::Morning);

    let events = clock.advance(SECONDS_PER_HOUR * 4.5);
    let changes: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, ClockEvent::PeriodChanged { .. }))
        .collect();
    assert_eq!(
        changes,
        vec![&ClockEvent::PeriodChanged { old: TimePeriod::Morning, new: TimePeriod::Afternoon }]
    );
    assert!(clock.advance(1.0).is_empty(), "no further change within the afternoon");
}

/// Period listeners see (old, new).
#[test]
fn period_listener_receives_old_and_new() {
    let mut clock = build();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    clock.on_period_change(move |old, new| {
        sink.borrow_mut().push((old, new));
        Ok(())
    });

    clock.advance(SECONDS_PER_HOUR * 10.5);
    assert_eq!(*seen.borrow(), vec![(TimePeriod::Morning, TimePeriod::Evening)]);
}

/// Paused clocks and bad deltas do nothing.
#[test]
fn paused_and_invalid_advances_are_no_ops() {
    let mut clock = build();
    clock.pause();
    assert!(clock.advance(SECONDS_PER_HOUR * 5.0).is_empty());
    assert_eq!(clock.current_hour(), 8.0);

    clock.resume();
    for dt in [-1.0, f64::NAN, f64::INFINITY] {
        assert!(clock.advance(dt).is_empty(), "dt={dt} should be ignored");
    }
    assert_eq!(clock.current_hour(), 8.0);
}

/// Time scale multiplies game time and is clamped to [0.1, 10].
#[test]
fn time_scale_is_clamped_and_applied() {
    let mut clock = build();
    clock.set_time_scale(50.0);
    assert_eq!(clock.time_scale(), 10.0);
    clock.set_time_scale(0.0);
    assert_eq!(clock.time_scale(), 0.1);

    clock.set_time_scale(2.0);
    clock.advance(SECONDS_PER_HOUR);
    assert!((clock.current_hour() - 10.0).abs() < 1e-9, "2x scale: expected 10.0, got {}", clock.current_hour());
}

/// One-shots fire in scheduling order, once, and cancelled ones never fire.
#[test]
fn scheduled_events_fire_in_order_once() {
    let mut clock = build();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&fired);
    clock.schedule(10.0, "deliveries");
    clock.schedule_with(9.0, "bell", move || {
        sink.borrow_mut().push("bell");
        Ok(())
    });
    let cancelled = clock.schedule(9.5, "cancelled");
    assert!(clock.cancel(cancelled));
    assert_eq!(clock.scheduled_count(), 2);

    let events = clock.advance(SECONDS_PER_HOUR * 2.5);
    let labels: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ClockEvent::Scheduled { label, .. } => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["deliveries", "bell"]);
    assert_eq!(*fired.borrow(), vec!["bell"]);
    assert_eq!(clock.scheduled_count(), 0);

    let later = clock.advance(SECONDS_PER_HOUR);
    assert!(!later.iter().any(|e| matches!(e, ClockEvent::Scheduled { .. })), "one-shots fire once");
}

/// A failing or panicking listener does not stop the others or the rollover.
#[test]
fn listener_failures_are_isolated() {
    let mut clock = build();
    let days = Rc::new(RefCell::new(Vec::new()));
    clock.on_new_day(|_| anyhow::bail!("listener broke"));
    clock.on_new_day(|_| panic!("listener panicked"));
    let sink = Rc::clone(&days);
    clock.on_new_day(move |day| {
        sink.borrow_mut().push(day);
        Ok(())
    });

    clock.advance(SECONDS_PER_HOUR * 24.0 * 2.0);
    assert_eq!(clock.current_day(), 3);
    assert_eq!(*days.borrow(), vec![2, 3]);
}

/// Forcing the hour resyncs the period silently.
#[test]
fn set_hour_resyncs_period_without_notifying() {
    let mut clock = build();
    clock.set_hour(20.0);
    assert_eq!(clock.period(), TimePeriod::Evening);
    let events = clock.advance(1.0);
    assert!(events.is_empty(), "no spurious period change: {events:?}");
}

/// Sleeping lands on 06:00 of the next day.
#[test]
fn skip_to_next_morning_rolls_one_day() {
    let mut clock = build();
    clock.set_hour(22.0);
    let events = clock.skip_to_next_morning();
    assert_eq!(clock.current_day(), 2);
    assert_eq!(clock.current_hour(), 6.0);
    assert_eq!(clock.period(), TimePeriod::Morning);
    assert_eq!(new_days(&events), vec![2]);
}

#[test]
fn formatted_time_uses_twelve_hour_clock() {
    let mut clock = build();
    assert_eq!(clock.formatted_time(), "8:00 AM");
    clock.set_hour(0.0);
    assert_eq!(clock.formatted_time(), "12:00 AM");
    clock.set_hour(12.5);
    assert_eq!(clock.formatted_time(), "12:30 PM");
    clock.set_hour(21.25);
    assert_eq!(clock.formatted_time(), "9:15 PM");
    assert_eq!(clock.hour_minute(), (21, 15));
}

/// Cafe hours are [8, 22); day/night follow the period.
#[test]
fn operating_window_and_day_night() {
    let mut clock = build();
    clock.set_hour(7.9);
    assert!(!clock.is_cafe_open());
    assert!(clock.is_daytime());
    clock.set_hour(8.0);
    assert!(clock.is_cafe_open());
    clock.set_hour(22.0);
    assert!(!clock.is_cafe_open());
    clock.set_hour(3.0);
    assert!(clock.is_nighttime());
    assert!(!clock.is_daytime());
}

/// Light stays in range and has no jumps at the curve's breakpoints.
#[test]
fn light_level_is_continuous() {
    let mut clock = build();
    let curve = clock.config().light.clone();
    for breakpoint in [curve.dawn_start, curve.day_start, curve.dusk_start, curve.evening_start, curve.night_start] {
        clock.set_hour(breakpoint - 1e-6);
        let before = clock.light_level();
        clock.set_hour(breakpoint);
        let after = clock.light_level();
        assert!((before - after).abs() < 1e-3, "jump at {breakpoint}: {before} -> {after}");
    }
    for tenth in 0..240 {
        clock.set_hour(f64::from(tenth) / 10.0);
        let level = clock.light_level();
        assert!((0.0..=1.0).contains(&level), "light {level} out of range at {}", clock.current_hour());
    }
    clock.set_hour(13.0);
    assert_eq!(clock.light_level(), 1.0);
}

/// Snapshot then restore reproduces the time, silently.
#[test]
fn snapshot_restore_round_trip() {
    let mut source = build();
    source.advance(SECONDS_PER_HOUR * (24.0 * 30.0 + 11.0));
    source.set_time_scale(1.25);
    let snapshot = source.snapshot();

    let mut target = build();
    let notified = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&notified);
    target.on_period_change(move |_, _| {
        *sink.borrow_mut() += 1;
        Ok(())
    });
    target.schedule(23.0, "stale");
    target.restore(&snapshot);

    assert_eq!(target.current_day(), source.current_day());
    assert_eq!(target.current_season(), Season::Summer);
    assert!((target.current_hour() - source.current_hour()).abs() < 1e-9);
    assert_eq!(target.time_scale(), 1.25);
    assert_eq!(target.period(), TimePeriod::Evening);
    assert_eq!(*notified.borrow(), 0, "restore must not notify");
    assert_eq!(target.scheduled_count(), 0, "restore drops pending one-shots");
}

/// An empty document restores the starting time; bad values are pulled
/// into range and unknown keys ignored.
#[test]
fn restore_is_defensive() {
    let mut clock = build();
    clock.advance(SECONDS_PER_HOUR * 40.0);
    clock.restore(&json!({}));
    assert_eq!(clock.current_day(), 1);
    assert_eq!(clock.current_hour(), 8.0);
    assert_eq!(clock.time_scale(), 1.0);

    clock.restore(&json!({
        "current_hour": 30.5,
        "current_day": 0,
        "current_season_index": 6,
        "time_scale": 99.0,
        "weather": "stormy",
    }));
    assert!((clock.current_hour() - 6.5).abs() < 1e-9);
    assert_eq!(clock.current_day(), 1);
    assert_eq!(clock.current_season(), Season::Autumn);
    assert_eq!(clock.time_scale(), 10.0);

    clock.restore(&json!({ "current_hour": "noon", "current_day": 5 }));
    assert_eq!(clock.current_hour(), 8.0, "wrong-typed field falls back to its default");
    assert_eq!(clock.current_day(), 5);
}
