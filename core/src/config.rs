//! Game configuration: clock constants, save policy, new-game defaults
//! and screen transition timing.
//!
//! `GameConfig::default()` carries the shipped values. `GameConfig::load()`
//! overlays a JSON file on top of them: unknown keys are ignored and
//! missing keys keep their defaults.

use serde::{Deserialize, Serialize};

/// Breakpoints (game hours) and levels of the ambient light curve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightCurve {
    pub dawn_start:    f64,
    pub day_start:     f64,
    pub dusk_start:    f64,
    pub evening_start: f64,
    pub night_start:   f64,
    /// Floor used before dawn and after the evening ramp.
    pub night_level:   f64,
    /// Level reached at the end of dusk.
    pub evening_level: f64,
}

impl Default for LightCurve {
    fn default() -> Self {
        Self {
            dawn_start:    6.0,
            day_start:     8.0,
            dusk_start:    18.0,
            evening_start: 20.0,
            night_start:   22.0,
            night_level:   0.3,
            evening_level: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    pub real_seconds_per_game_hour: f64,
    pub days_per_season:            u32,
    pub morning_start:              f64,
    pub afternoon_start:            f64,
    pub evening_start:              f64,
    pub cafe_open_hour:             f64,
    pub cafe_close_hour:            f64,
    /// Hour a fresh clock (and a new game) starts at.
    pub start_hour:                 f64,
    pub light:                      LightCurve,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            real_seconds_per_game_hour: 30.0,
            days_per_season:            7,
            morning_start:              6.0,
            afternoon_start:            12.0,
            evening_start:              18.0,
            cafe_open_hour:             8.0,
            cafe_close_hour:            22.0,
            start_hour:                 8.0,
            light:                      LightCurve::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SaveConfig {
    pub slot_count:    u8,
    pub autosave_slot: u8,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self { slot_count: 3, autosave_slot: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewGameConfig {
    pub starting_gold:              u32,
    pub default_recipes:            Vec<String>,
    pub initial_chapter:            String,
    pub initial_zone:               String,
    pub ng_plus_gold_bonus:         u32,
    pub ng_plus_reputation:         i32,
    pub ng_plus_affinity_retention: f64,
}

impl Default for NewGameConfig {
    fn default() -> Self {
        Self {
            starting_gold:   150,
            default_recipes: DEFAULT_RECIPES.iter().map(|r| r.to_string()).collect(),
            initial_chapter: "prologue".into(),
            initial_zone:    "cafe_grounds".into(),
            ng_plus_gold_bonus:         500,
            ng_plus_reputation:         50,
            ng_plus_affinity_retention: 0.5,
        }
    }
}

pub const DEFAULT_RECIPES: [&str; 7] = [
    "herb_salad",
    "berry_toast",
    "herb_stew",
    "berry_tart",
    "herb_tea",
    "autumn_harvest_soup",
    "cloud_puffs",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Overlay opacity units per real second.
    pub fade_speed:   f64,
    pub fade_ceiling: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { fade_speed: 500.0, fade_ceiling: 255.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub clock:      ClockConfig,
    pub save:       SaveConfig,
    pub new_game:   NewGameConfig,
    pub transition: TransitionConfig,
}

impl GameConfig {
    /// Read a JSON overlay from `path`. Sections and keys the file leaves
    /// out keep their shipped values.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GameConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config.sanitized())
    }

    /// Test configuration: shipped values, with seasons lasting 28 days.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.clock.days_per_season = 28;
        config
    }

    fn sanitized(mut self) -> Self {
        let shipped = ClockConfig::default();
        if !(self.clock.real_seconds_per_game_hour.is_finite()
            && self.clock.real_seconds_per_game_hour > 0.0)
        {
            log::warn!(
                "real_seconds_per_game_hour={} is unusable; using {}",
                self.clock.real_seconds_per_game_hour, shipped.real_seconds_per_game_hour
            );
            self.clock.real_seconds_per_game_hour = shipped.real_seconds_per_game_hour;
        }
        if self.clock.days_per_season == 0 {
            log::warn!("days_per_season=0 is unusable; using {}", shipped.days_per_season);
            self.clock.days_per_season = shipped.days_per_season;
        }
        if self.save.slot_count == 0 {
            self.save.slot_count = SaveConfig::default().slot_count;
        }
        if self.save.autosave_slot == 0 || self.save.autosave_slot > self.save.slot_count {
            log::warn!("autosave_slot={} outside 1..={}; using 1", self.save.autosave_slot, self.save.slot_count);
            self.save.autosave_slot = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overlay_keeps_shipped_values() {
        let config: GameConfig =
            serde_json::from_str(r#"{"clock": {"days_per_season": 28}, "bogus": 1}"#).unwrap();
        assert_eq!(config.clock.days_per_season, 28);
        assert_eq!(config.clock.real_seconds_per_game_hour, 30.0);
        assert_eq!(config.save.slot_count, 3);
        assert_eq!(config.new_game.starting_gold, 150);
    }

    #[test]
    fn unusable_values_fall_back() {
        let mut config = GameConfig::default();
        config.clock.real_seconds_per_game_hour = 0.0;
        config.save.autosave_slot = 9;
        let config = config.sanitized();
        assert_eq!(config.clock.real_seconds_per_game_hour, 30.0);
        assert_eq!(config.save.autosave_slot, 1);
    }
}
