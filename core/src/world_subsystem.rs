use crate::{
    clock::ClockEvent,
    config::NewGameConfig,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;

pub const ZONES: [&str; 7] = [
    "cafe_grounds",
    "meadow_fields",
    "forest_depths",
    "coastal_shore",
    "mountain_pass",
    "ancient_ruins",
    "sky_islands",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Special,
}

impl Weather {
    pub fn closes_cafe(self) -> bool {
        self == Weather::Stormy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldState {
    pub current_zone_id:            String,
    pub weather:                    Weather,
    pub days_since_weather_change:  u32,
    pub unlocked_zones:             BTreeSet<String>,
    pub discovered_resource_points: BTreeSet<String>,
    pub player_x:                   f64,
    pub player_y:                   f64,
}

impl WorldState {
    pub fn starting(config: &NewGameConfig) -> Self {
        Self {
            current_zone_id:            config.initial_zone.clone(),
            weather:                    Weather::Sunny,
            days_since_weather_change:  0,
            unlocked_zones:             BTreeSet::from([config.initial_zone.clone()]),
            discovered_resource_points: BTreeSet::new(),
            player_x:                   0.0,
            player_y:                   0.0,
        }
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::starting(&NewGameConfig::default())
    }
}

pub struct WorldSubsystem {
    pub state: WorldState,
    fresh:     WorldState,
}

impl WorldSubsystem {
    pub fn new(config: &NewGameConfig) -> Self {
        let fresh = WorldState::starting(config);
        Self { state: fresh.clone(), fresh }
    }

    pub fn current_zone(&self) -> &str {
        &self.state.current_zone_id
    }

    pub fn is_unlocked(&self, zone: &str) -> bool {
        self.state.unlocked_zones.contains(zone)
    }

    pub fn unlock_zone(&mut self, zone: &str) -> bool {
        if !ZONES.contains(&zone) {
            log::warn!("world: unknown zone '{zone}'");
            return false;
        }
        self.state.unlocked_zones.insert(zone.to_string())
    }

    /// Move to an unlocked zone. Returns false for locked or unknown zones.
    pub fn travel_to(&mut self, zone: &str) -> bool {
        if !self.is_unlocked(zone) {
            return false;
        }
        if self.state.current_zone_id != zone {
            log::debug!("world: travelled to {zone}");
            self.state.current_zone_id = zone.to_string();
        }
        true
    }

    /// The unlocked zone after (or before) the current one, in `ZONES` order.
    pub fn neighbour_zone(&self, forward: bool) -> Option<&'static str> {
        let unlocked: Vec<&'static str> =
            ZONES.iter().copied().filter(|z| self.is_unlocked(z)).collect();
        let here = unlocked.iter().position(|z| *z == self.state.current_zone_id)?;
        let len = unlocked.len();
        let next = if forward { (here + 1) % len } else { (here + len - 1) % len };
        Some(unlocked[next])
    }

    pub fn discover_point(&mut self, point_id: &str) -> bool {
        self.state.discovered_resource_points.insert(point_id.to_string())
    }

    pub fn set_weather(&mut self, weather: Weather) {
        if weather != self.state.weather {
            self.state.weather = weather;
            self.state.days_since_weather_change = 0;
        }
    }
}

impl Default for WorldSubsystem {
    fn default() -> Self { Self::new(&NewGameConfig::default()) }
}

impl Persistable for WorldSubsystem {
    fn name(&self) -> &'static str { "world" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        let mut state = restore_lenient(self.name(), doc, self.fresh.clone());
        // The zone the player stands in is always reachable.
        state.unlocked_zones.insert(state.current_zone_id.clone());
        self.state = state;
    }

    fn on_clock_event(&mut self, event: &ClockEvent) {
        if let ClockEvent::NewDay { .. } = event {
            self.state.days_since_weather_change += 1;
        }
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
