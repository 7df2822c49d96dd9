//! Save slot persistence.
//!
//! RULE: Only back-ends touch durable storage.
//! Callers go through SaveManager; back-ends never see a slot number that
//! failed validation. A write either lands completely or leaves the
//! previous save in that slot intact. A missing save and an unreadable one
//! look the same to callers: `None`.

mod file;
mod sqlite;

pub use file::JsonFileSaveBackend;
pub use sqlite::SqliteSaveBackend;

use crate::{
    aggregator::now_rfc3339,
    clock::Season,
    document::{lookup, UnifiedDocument, SCHEMA_VERSION},
    error::{HavenError, HavenResult},
    types::{Day, SlotId},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What a load screen shows for a slot without reading the full document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSummary {
    pub slot:             SlotId,
    pub schema_version:   u32,
    pub saved_at:         String,
    pub playtime_seconds: f64,
    pub day:              Day,
    pub season:           String,
    pub cafe_level:       u32,
    pub gold:             u32,
    pub dragon_name:      String,
    pub dragon_stage:     String,
    pub playthrough_id:   String,
}

impl Default for SlotSummary {
    fn default() -> Self {
        Self {
            slot:             0,
            schema_version:   SCHEMA_VERSION,
            saved_at:         String::new(),
            playtime_seconds: 0.0,
            day:              1,
            season:           Season::Spring.as_str().to_string(),
            cafe_level:       1,
            gold:             0,
            dragon_name:      String::new(),
            dragon_stage:     String::new(),
            playthrough_id:   String::new(),
        }
    }
}

impl SlotSummary {
    pub fn from_document(slot: SlotId, doc: &UnifiedDocument) -> Self {
        let number = |section: &str, key: &str| {
            doc.section(section).and_then(|s| lookup(s, &[key])).and_then(Value::as_u64)
        };
        let text = |section: &str, key: &str| {
            doc.section(section)
                .and_then(|s| lookup(s, &[key]))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let fallback = Self::default();
        Self {
            slot,
            schema_version:   doc.meta.schema_version,
            saved_at:         doc.meta.saved_at.clone(),
            playtime_seconds: doc.playtime_seconds,
            day:              number("time", "current_day").map_or(fallback.day, |d| d as Day),
            season:           number("time", "current_season_index")
                .map_or(fallback.season, |i| Season::from_index(i as usize).as_str().to_string()),
            cafe_level:       number("cafe", "cafe_level").map_or(fallback.cafe_level, |l| l as u32),
            gold:             number("inventory", "gold").map_or(fallback.gold, |g| g as u32),
            dragon_name:      text("dragon", "name").unwrap_or_default(),
            dragon_stage:     text("dragon", "stage").unwrap_or_default(),
            playthrough_id:   doc.meta.playthrough_id.clone(),
        }
    }
}

/// One slot's worth of stored data.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub summary:  SlotSummary,
    pub document: String,
}

/// Durable storage for save slots.
pub trait SaveBackend {
    /// Replace the slot's record atomically.
    fn write(&mut self, record: &SlotRecord) -> HavenResult<()>;

    /// The stored document text, or `None` when the slot is empty.
    fn read(&self, slot: SlotId) -> HavenResult<Option<String>>;

    /// Summaries of every occupied slot.
    fn summaries(&self) -> HavenResult<Vec<SlotSummary>>;

    /// Returns true when something was removed.
    fn remove(&mut self, slot: SlotId) -> HavenResult<bool>;
}

pub struct SaveManager {
    backend:    Box<dyn SaveBackend>,
    slot_count: SlotId,
}

impl SaveManager {
    pub fn new(backend: Box<dyn SaveBackend>, slot_count: SlotId) -> Self {
        Self { backend, slot_count: slot_count.max(1) }
    }

    pub fn slot_count(&self) -> SlotId {
        self.slot_count
    }

    fn validate(&self, slot: SlotId) -> HavenResult<()> {
        if slot == 0 || slot > self.slot_count {
            return Err(HavenError::InvalidSlot { slot, max: self.slot_count });
        }
        Ok(())
    }

    /// Stamp `doc` with slot and save time and persist it.
    pub fn save(&mut self, slot: SlotId, doc: &UnifiedDocument) -> bool {
        match self.try_save(slot, doc) {
            Ok(()) => {
                log::info!("saved slot {slot}");
                true
            }
            Err(e) => {
                log::error!("save to slot {slot} failed: {e}");
                false
            }
        }
    }

    fn try_save(&mut self, slot: SlotId, doc: &UnifiedDocument) -> HavenResult<()> {
        self.validate(slot)?;
        let mut doc = doc.clone();
        doc.meta.slot = slot;
        doc.meta.schema_version = SCHEMA_VERSION;
        doc.meta.saved_at = now_rfc3339();
        if doc.meta.created_at.is_empty() {
            doc.meta.created_at = doc.meta.saved_at.clone();
        }
        let record = SlotRecord {
            summary:  SlotSummary::from_document(slot, &doc),
            document: doc.to_json()?,
        };
        self.backend.write(&record)
    }

    pub fn load(&self, slot: SlotId) -> Option<UnifiedDocument> {
        if let Err(e) = self.validate(slot) {
            log::warn!("load refused: {e}");
            return None;
        }
        let text = match self.backend.read(slot) {
            Ok(Some(text)) => text,
            Ok(None) => {
                log::debug!("slot {slot} is empty");
                return None;
            }
            Err(e) => {
                log::warn!("slot {slot} could not be read: {e}");
                return None;
            }
        };
        match UnifiedDocument::from_json(&text) {
            Ok(Some(doc)) => {
                log::info!("loaded slot {slot} (schema {})", doc.meta.schema_version);
                Some(doc)
            }
            Ok(None) => {
                log::warn!("slot {slot} holds a non-mapping document; treating as empty");
                None
            }
            Err(e) => {
                log::warn!("slot {slot} is corrupt: {e}");
                None
            }
        }
    }

    /// One entry per valid slot; `None` for empty slots.
    pub fn list_summaries(&self) -> BTreeMap<SlotId, Option<SlotSummary>> {
        let mut listing: BTreeMap<SlotId, Option<SlotSummary>> =
            (1..=self.slot_count).map(|slot| (slot, None)).collect();
        match self.backend.summaries() {
            Ok(summaries) => {
                for summary in summaries {
                    if let Some(entry) = listing.get_mut(&summary.slot) {
                        *entry = Some(summary);
                    }
                }
            }
            Err(e) => log::warn!("could not list save slots: {e}"),
        }
        listing
    }

    pub fn delete(&mut self, slot: SlotId) -> bool {
        if let Err(e) = self.validate(slot) {
            log::warn!("delete refused: {e}");
            return false;
        }
        match self.backend.remove(slot) {
            Ok(removed) => {
                if removed {
                    log::info!("deleted slot {slot}");
                }
                removed
            }
            Err(e) => {
                log::error!("delete of slot {slot} failed: {e}");
                false
            }
        }
    }

    pub fn has_any_saves(&self) -> bool {
        self.list_summaries().values().any(Option::is_some)
    }

    /// The slot with the latest save time.
    pub fn most_recent_slot(&self) -> Option<SlotId> {
        self.list_summaries()
            .into_values()
            .flatten()
            .max_by(|a, b| a.saved_at.cmp(&b.saved_at))
            .map(|s| s.slot)
    }
}
