//! Gatherable spawn points and their respawn countdown.
//!
//! The spawn table is fixed content; only each point's mutable status is
//! persisted. Saved entries for points the table does not know are ignored.

use crate::{
    clock::ClockEvent,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;

pub struct SpawnDef {
    pub id:           &'static str,
    pub zone:         &'static str,
    pub item:         &'static str,
    pub respawn_days: u32,
    pub quantity:     u32,
    pub rare:         bool,
}

pub static SPAWN_TABLE: [SpawnDef; 8] = [
    SpawnDef { id: "grounds_herb_patch",  zone: "cafe_grounds",  item: "wild_herbs",     respawn_days: 1, quantity: 2, rare: false },
    SpawnDef { id: "grounds_berry_bush",  zone: "cafe_grounds",  item: "sweet_berries",  respawn_days: 1, quantity: 3, rare: false },
    SpawnDef { id: "meadow_flowers",      zone: "meadow_fields", item: "honey_blossom",  respawn_days: 2, quantity: 2, rare: false },
    SpawnDef { id: "meadow_mushrooms",    zone: "meadow_fields", item: "meadow_mushroom", respawn_days: 2, quantity: 2, rare: false },
    SpawnDef { id: "forest_truffle",      zone: "forest_depths", item: "golden_truffle", respawn_days: 5, quantity: 1, rare: true  },
    SpawnDef { id: "forest_nuts",         zone: "forest_depths", item: "forest_nuts",    respawn_days: 2, quantity: 3, rare: false },
    SpawnDef { id: "shore_seaweed",       zone: "coastal_shore", item: "sea_kelp",       respawn_days: 1, quantity: 2, rare: false },
    SpawnDef { id: "mountain_crystal",    zone: "mountain_pass", item: "frost_crystal",  respawn_days: 7, quantity: 1, rare: true  },
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnPointState {
    pub is_available:       bool,
    pub days_until_respawn: u32,
    pub current_quality:    u8,
    pub current_quantity:   u32,
}

impl SpawnPointState {
    fn fresh(def: &SpawnDef) -> Self {
        Self {
            is_available:       true,
            days_until_respawn: 0,
            current_quality:    3,
            current_quantity:   def.quantity,
        }
    }
}

impl Default for SpawnPointState {
    fn default() -> Self {
        Self { is_available: true, days_until_respawn: 0, current_quality: 3, current_quantity: 1 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceState {
    pub spawn_points: BTreeMap<String, SpawnPointState>,
}

/// What one harvest yielded.
#[derive(Debug, Clone, PartialEq)]
pub struct Harvest {
    pub item_id:  &'static str,
    pub quantity: u32,
    pub quality:  u8,
    pub rare:     bool,
}

pub struct ResourceSubsystem {
    pub state: ResourceState,
}

impl ResourceSubsystem {
    pub fn new() -> Self {
        Self { state: Self::fresh_state() }
    }

    fn fresh_state() -> ResourceState {
        ResourceState {
            spawn_points: SPAWN_TABLE
                .iter()
                .map(|def| (def.id.to_string(), SpawnPointState::fresh(def)))
                .collect(),
        }
    }

    fn def(point_id: &str) -> Option<&'static SpawnDef> {
        SPAWN_TABLE.iter().find(|d| d.id == point_id)
    }

    /// Spawn points in `zone` that can be harvested right now.
    pub fn available_in(&self, zone: &str) -> Vec<&'static str> {
        SPAWN_TABLE
            .iter()
            .filter(|d| d.zone == zone)
            .filter(|d| self.state.spawn_points.get(d.id).is_some_and(|p| p.is_available))
            .map(|d| d.id)
            .collect()
    }

    pub fn harvest(&mut self, point_id: &str) -> Option<Harvest> {
        let def = Self::def(point_id)?;
        let point = self.state.spawn_points.get_mut(point_id)?;
        if !point.is_available {
            return None;
        }
        let harvest = Harvest {
            item_id:  def.item,
            quantity: point.current_quantity,
            quality:  point.current_quality,
            rare:     def.rare,
        };
        point.is_available = false;
        point.days_until_respawn = def.respawn_days;
        point.current_quantity = 0;
        Some(harvest)
    }

    fn tick_respawns(&mut self) {
        for def in SPAWN_TABLE.iter() {
            let Some(point) = self.state.spawn_points.get_mut(def.id) else { continue };
            if point.is_available {
                continue;
            }
            point.days_until_respawn = point.days_until_respawn.saturating_sub(1);
            if point.days_until_respawn == 0 {
                point.is_available = true;
                point.current_quantity = def.quantity;
            }
        }
    }
}

impl Default for ResourceSubsystem {
    fn default() -> Self { Self::new() }
}

impl Persistable for ResourceSubsystem {
    fn name(&self) -> &'static str { "resources" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        let mut state = Self::fresh_state();
        let saved = doc
            .get("spawn_points")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);
        for (id, point_doc) in &saved {
            match (Self::def(id), state.spawn_points.get_mut(id)) {
                (Some(_), Some(point)) => {
                    *point = restore_lenient("resources.spawn_point", point_doc, point.clone());
                }
                _ => log::debug!("resources: ignoring unknown spawn point '{id}'"),
            }
        }
        self.state = state;
    }

    fn on_clock_event(&mut self, event: &ClockEvent) {
        if let ClockEvent::NewDay { .. } = event {
            self.tick_respawns();
        }
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
