use crate::{
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

pub const MAX_AFFINITY: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterRecord {
    pub affinity: u32,
    pub met:      bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterState {
    pub characters: BTreeMap<String, CharacterRecord>,
}

pub struct CharacterSubsystem {
    pub state: CharacterState,
}

impl CharacterSubsystem {
    pub fn new() -> Self {
        Self { state: CharacterState::default() }
    }

    pub fn meet(&mut self, character_id: &str) -> bool {
        let record = self.state.characters.entry(character_id.to_string()).or_default();
        let first = !record.met;
        record.met = true;
        first
    }

    /// Shift affinity by `delta`, clamped to 0..=MAX_AFFINITY. Returns the new value.
    pub fn add_affinity(&mut self, character_id: &str, delta: i32) -> u32 {
        let record = self.state.characters.entry(character_id.to_string()).or_default();
        let next = (i64::from(record.affinity) + i64::from(delta)).clamp(0, i64::from(MAX_AFFINITY));
        record.affinity = next as u32;
        record.affinity
    }

    pub fn affinity(&self, character_id: &str) -> u32 {
        self.state.characters.get(character_id).map(|c| c.affinity).unwrap_or(0)
    }

    pub fn has_max_affinity(&self) -> bool {
        self.state.characters.values().any(|c| c.affinity >= MAX_AFFINITY)
    }

    /// Scale every character's affinity by `retention`, keeping `met`.
    pub fn retained(&self, retention: f64) -> CharacterState {
        let characters = self
            .state
            .characters
            .iter()
            .map(|(id, c)| {
                let affinity = (f64::from(c.affinity) * retention).floor().clamp(0.0, f64::from(MAX_AFFINITY));
                (id.clone(), CharacterRecord { affinity: affinity as u32, met: c.met })
            })
            .collect();
        CharacterState { characters }
    }
}

impl Default for CharacterSubsystem {
    fn default() -> Self { Self::new() }
}

impl Persistable for CharacterSubsystem {
    fn name(&self) -> &'static str { "characters" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        let mut state = restore_lenient(self.name(), doc, CharacterState::default());
        for record in state.characters.values_mut() {
            record.affinity = record.affinity.min(MAX_AFFINITY);
        }
        self.state = state;
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
