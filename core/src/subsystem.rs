//! Persistable subsystem contract and registry.
//!
//! RULE: Every stateful subsystem implements Persistable.
//! snapshot() produces a self-contained document with no live references.
//! restore() fully replaces the subsystem's state: missing fields default,
//! unknown fields are ignored, and restore(&{}) equals fresh construction.
//! The registry keeps registration order; the aggregator collects and the
//! engine hands out clock events in that order (see engine.rs).

use crate::{clock::ClockEvent, types::Document};
use std::any::Any;

/// The contract every persistable subsystem must fulfill.
pub trait Persistable {
    /// Unique stable name; also the subsystem's top-level key in a save.
    fn name(&self) -> &'static str;

    fn snapshot(&self) -> Document;

    fn restore(&mut self, doc: &Document);

    /// Daily upkeep hook. Called once per clock event, after the clock
    /// has finished advancing.
    fn on_clock_event(&mut self, _event: &ClockEvent) {}

    /// For typed access through the registry.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Default)]
pub struct SubsystemRegistry {
    entries: Vec<Box<dyn Persistable>>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `subsystem`. A second subsystem with an existing name is refused.
    pub fn register(&mut self, subsystem: Box<dyn Persistable>) -> bool {
        let name = subsystem.name();
        if self.entries.iter().any(|s| s.name() == name) {
            log::warn!("subsystem '{name}' is already registered; ignoring duplicate");
            return false;
        }
        log::debug!("registered subsystem '{name}'");
        self.entries.push(subsystem);
        true
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries.iter().find_map(|s| s.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries.iter_mut().find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn Persistable> {
        self.entries.iter().find(|s| s.name() == name).map(|s| s.as_ref())
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Box<dyn Persistable>> {
        self.entries.iter_mut().find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|s| s.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Persistable>> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Box<dyn Persistable>> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
