use crate::{
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueState {
    pub flags: BTreeMap<String, bool>,
}

pub struct DialogueSubsystem {
    pub state: DialogueState,
}

impl DialogueSubsystem {
    pub fn new() -> Self {
        Self { state: DialogueState::default() }
    }

    pub fn set_flag(&mut self, flag: &str, value: bool) {
        self.state.flags.insert(flag.to_string(), value);
    }

    pub fn flag(&self, flag: &str) -> bool {
        self.state.flags.get(flag).copied().unwrap_or(false)
    }
}

impl Default for DialogueSubsystem {
    fn default() -> Self { Self::new() }
}

impl Persistable for DialogueSubsystem {
    fn name(&self) -> &'static str { "dialogue" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        self.state = restore_lenient(self.name(), doc, DialogueState::default());
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
