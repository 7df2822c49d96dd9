use crate::{
    config::NewGameConfig,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

/// Events whose completion marks the end of the story.
pub const FINALE_EVENTS: [&str; 2] = ["finale_end", "chapter_8_complete"];
pub const COMPLETE_CHAPTER: &str = "complete";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoryState {
    pub current_chapter:  String,
    pub completed_events: Vec<String>,
    pub event_queue:      Vec<String>,
    pub flags:            BTreeMap<String, bool>,
}

impl StoryState {
    pub fn starting(config: &NewGameConfig) -> Self {
        Self {
            current_chapter:  config.initial_chapter.clone(),
            completed_events: Vec::new(),
            event_queue:      Vec::new(),
            flags:            BTreeMap::new(),
        }
    }
}

impl Default for StoryState {
    fn default() -> Self {
        Self::starting(&NewGameConfig::default())
    }
}

pub struct StorySubsystem {
    pub state: StoryState,
    fresh:     StoryState,
}

impl StorySubsystem {
    pub fn new(config: &NewGameConfig) -> Self {
        let fresh = StoryState::starting(config);
        Self { state: fresh.clone(), fresh }
    }

    pub fn current_chapter(&self) -> &str {
        &self.state.current_chapter
    }

    pub fn set_chapter(&mut self, chapter: &str) {
        log::info!("story: chapter {} -> {chapter}", self.state.current_chapter);
        self.state.current_chapter = chapter.to_string();
    }

    /// Mark `event_id` complete. Returns false if it already was.
    pub fn complete_event(&mut self, event_id: &str) -> bool {
        if self.is_completed(event_id) {
            return false;
        }
        self.state.event_queue.retain(|e| e != event_id);
        self.state.completed_events.push(event_id.to_string());
        true
    }

    pub fn is_completed(&self, event_id: &str) -> bool {
        self.state.completed_events.iter().any(|e| e == event_id)
    }

    pub fn queue_event(&mut self, event_id: &str) {
        if !self.is_completed(event_id) && !self.state.event_queue.iter().any(|e| e == event_id) {
            self.state.event_queue.push(event_id.to_string());
        }
    }

    pub fn next_event(&self) -> Option<&str> {
        self.state.event_queue.first().map(String::as_str)
    }

    pub fn set_flag(&mut self, flag: &str, value: bool) {
        self.state.flags.insert(flag.to_string(), value);
    }

    pub fn flag(&self, flag: &str) -> bool {
        self.state.flags.get(flag).copied().unwrap_or(false)
    }

    pub fn is_finale_complete(&self) -> bool {
        self.state.current_chapter == COMPLETE_CHAPTER
            || FINALE_EVENTS.iter().any(|e| self.is_completed(e))
    }
}

impl Default for StorySubsystem {
    fn default() -> Self { Self::new(&NewGameConfig::default()) }
}

impl Persistable for StorySubsystem {
    fn name(&self) -> &'static str { "story" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        self.state = restore_lenient(self.name(), doc, self.fresh.clone());
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
