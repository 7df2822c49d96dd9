//! Autosave policy: nothing until enabled, one write per rollover batch,
//! and a failing store never stops the day from turning over.

use dragonhaven_core::{
    config::GameConfig,
    engine::GameContext,
    error::{HavenError, HavenResult},
    store::{SaveBackend, SlotRecord, SlotSummary},
    types::SlotId,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Keeps records in memory and logs every write as (slot, day).
#[derive(Default)]
struct RecordingBackend {
    writes:  Rc<RefCell<Vec<(SlotId, u32)>>>,
    records: BTreeMap<SlotId, SlotRecord>,
    broken:  bool,
}

impl SaveBackend for RecordingBackend {
    fn write(&mut self, record: &SlotRecord) -> HavenResult<()> {
        if self.broken {
            return Err(HavenError::Other(anyhow::anyhow!("disk full")));
        }
        self.writes.borrow_mut().push((record.summary.slot, record.summary.day));
        self.records.insert(record.summary.slot, record.clone());
        Ok(())
    }

    fn read(&self, slot: SlotId) -> HavenResult<Option<String>> {
        Ok(self.records.get(&slot).map(|r| r.document.clone()))
    }

    fn summaries(&self) -> HavenResult<Vec<SlotSummary>> {
        Ok(self.records.values().map(|r| r.summary.clone()).collect())
    }

    fn remove(&mut self, slot: SlotId) -> HavenResult<bool> {
        Ok(self.records.remove(&slot).is_some())
    }
}

const HOUR: f64 = 30.0;
const DAY: f64 = HOUR * 24.0;

fn build(broken: bool) -> (GameContext, Rc<RefCell<Vec<(SlotId, u32)>>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let writes = Rc::new(RefCell::new(Vec::new()));
    let backend = RecordingBackend { writes: Rc::clone(&writes), broken, ..Default::default() };
    let mut ctx = GameContext::new(GameConfig::default_test(), Box::new(backend));
    ctx.new_game();
    (ctx, writes)
}

/// Rollovers before autosave is enabled write nothing.
#[test]
fn no_autosave_until_enabled() {
    let (mut ctx, writes) = build(false);
    ctx.advance_time(DAY * 2.0);
    assert_eq!(ctx.clock.current_day(), 3);
    assert!(writes.borrow().is_empty(), "unexpected writes: {:?}", writes.borrow());
}

/// One long advance crossing several days saves once, for the last day.
#[test]
fn one_save_per_advance_for_the_last_day() {
    let (mut ctx, writes) = build(false);
    assert!(ctx.aggregator.enable_autosave());
    assert!(!ctx.aggregator.enable_autosave(), "enabling twice is a no-op");

    ctx.advance_time(DAY * 3.0);
    assert_eq!(ctx.clock.current_day(), 4);
    assert_eq!(*writes.borrow(), vec![(1, 4)]);

    ctx.advance_time(HOUR);
    assert_eq!(writes.borrow().len(), 1, "no rollover, no save");
}

/// Sleeping rolls the day over and autosaves to the autosave slot.
#[test]
fn sleeping_autosaves() {
    let (mut ctx, writes) = build(false);
    ctx.aggregator.enable_autosave();
    ctx.sleep();
    assert_eq!(*writes.borrow(), vec![(1, 2)]);
    assert_eq!(ctx.saves.most_recent_slot(), Some(1));
}

/// Disabled again (for instance on returning to the title), rollovers stop saving.
#[test]
fn disabling_stops_autosave() {
    let (mut ctx, writes) = build(false);
    ctx.aggregator.enable_autosave();
    ctx.sleep();
    ctx.aggregator.disable_autosave();
    ctx.sleep();
    assert_eq!(writes.borrow().len(), 1);
}

/// A failing store is logged and play goes on.
#[test]
fn failed_autosave_does_not_block_rollover() {
    let (mut ctx, writes) = build(true);
    ctx.aggregator.enable_autosave();
    let events = ctx.advance_time(DAY);
    assert!(!events.is_empty());
    assert_eq!(ctx.clock.current_day(), 2);
    assert!(writes.borrow().is_empty());
    assert!(!ctx.saves.has_any_saves());

    ctx.sleep();
    assert_eq!(ctx.clock.current_day(), 3);
}

/// The clock's own new-day listeners run before the autosave is written,
/// and only time driven through the context autosaves.
#[test]
fn autosave_runs_after_the_rollover_through_the_context() {
    let (mut ctx, writes) = build(false);
    ctx.aggregator.enable_autosave();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let (sink, written) = (Rc::clone(&seen), Rc::clone(&writes));
    ctx.clock.on_new_day(move |day| {
        sink.borrow_mut().push((day, written.borrow().len()));
        Ok(())
    });

    ctx.advance_time(DAY);
    assert_eq!(*seen.borrow(), vec![(2, 0)], "listener runs before the save");
    assert_eq!(*writes.borrow(), vec![(1, 2)]);

    ctx.clock.advance(DAY);
    assert_eq!(ctx.clock.current_day(), 3);
    assert_eq!(writes.borrow().len(), 1, "the bare clock moves time only");
}
