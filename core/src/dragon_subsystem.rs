//! The player's dragon: growth stage by age, daily needs, and naming.
//!
//! RULES:
//!   - There is at most one dragon. An empty `dragon` section means none.
//!   - Stage is derived from age; it never moves backwards.
//!   - Names are trimmed, non-empty and at most NAME_MAX_LEN characters.

use crate::{
    clock::ClockEvent,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use thiserror::Error;

pub const NAME_MAX_LEN: usize = 20;
pub const DEFAULT_NAME: &str = "Dragon";
pub const MAX_STAT: f64 = 100.0;

// Days spent in each stage before the next one.
const EGG_DAYS:        f64 = 1.0;
const HATCHLING_DAYS:  f64 = 2.0;
const JUVENILE_DAYS:   f64 = 2.0;
const ADOLESCENT_DAYS: f64 = 4.0;

const DAILY_HUNGER_LOSS: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragonStage {
    #[default]
    Egg,
    Hatchling,
    Juvenile,
    Adolescent,
    Adult,
}

impl DragonStage {
    pub const ALL: [DragonStage; 5] = [
        DragonStage::Egg,
        DragonStage::Hatchling,
        DragonStage::Juvenile,
        DragonStage::Adolescent,
        DragonStage::Adult,
    ];

    pub fn for_age_days(days: f64) -> Self {
        let hatchling_end  = EGG_DAYS + HATCHLING_DAYS;
        let juvenile_end   = hatchling_end + JUVENILE_DAYS;
        let adolescent_end = juvenile_end + ADOLESCENT_DAYS;
        if days <= EGG_DAYS {
            DragonStage::Egg
        } else if days <= hatchling_end {
            DragonStage::Hatchling
        } else if days <= juvenile_end {
            DragonStage::Juvenile
        } else if days <= adolescent_end {
            DragonStage::Adolescent
        } else {
            DragonStage::Adult
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DragonStage::Egg        => "egg",
            DragonStage::Hatchling  => "hatchling",
            DragonStage::Juvenile   => "juvenile",
            DragonStage::Adolescent => "adolescent",
            DragonStage::Adult      => "adult",
        }
    }
}

impl fmt::Display for DragonStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,
    #[error("name is longer than {} characters", NAME_MAX_LEN)]
    TooLong,
}

/// Trim and check a proposed dragon name.
pub fn validate_name(raw: &str) -> Result<String, NameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(NameError::TooLong);
    }
    Ok(name.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dragon {
    pub name:            String,
    pub age_hours:       f64,
    pub stage:           DragonStage,
    pub hatched:         bool,
    pub hunger:          f64,
    pub happiness:       f64,
    pub stamina:         f64,
    pub bond:            u32,
    pub is_resting:      bool,
    pub times_fed_today: u32,
}

impl Default for Dragon {
    fn default() -> Self {
        Self {
            name:            String::new(),
            age_hours:       0.0,
            stage:           DragonStage::Egg,
            hatched:         false,
            hunger:          MAX_STAT,
            happiness:       MAX_STAT,
            stamina:         MAX_STAT,
            bond:            0,
            is_resting:      false,
            times_fed_today: 0,
        }
    }
}

impl Dragon {
    pub fn age_days(&self) -> f64 {
        self.age_hours / 24.0
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { DEFAULT_NAME } else { &self.name }
    }

    /// Recompute stage from age. Returns the new stage when it changed.
    fn progress_stage(&mut self) -> Option<DragonStage> {
        let stage = DragonStage::for_age_days(self.age_days()).max(self.stage);
        if stage != DragonStage::Egg {
            self.hatched = true;
        }
        if stage == self.stage {
            return None;
        }
        log::info!("dragon '{}' grew into a {stage}", self.display_name());
        self.stage = stage;
        Some(stage)
    }

    fn clamp_stats(&mut self) {
        for stat in [&mut self.hunger, &mut self.happiness, &mut self.stamina] {
            *stat = if stat.is_finite() { (*stat).clamp(0.0, MAX_STAT) } else { MAX_STAT };
        }
        self.bond = self.bond.min(MAX_STAT as u32);
        if !self.age_hours.is_finite() || self.age_hours < 0.0 {
            self.age_hours = 0.0;
        }
    }
}

pub struct DragonSubsystem {
    dragon:       Option<Dragon>,
    stage_change: Option<DragonStage>,
}

impl DragonSubsystem {
    pub fn new() -> Self {
        Self { dragon: None, stage_change: None }
    }

    /// Replace any current dragon with a fresh, unnamed egg.
    pub fn create_dragon(&mut self) -> &mut Dragon {
        self.stage_change = None;
        self.dragon.insert(Dragon::default())
    }

    pub fn dragon(&self) -> Option<&Dragon> {
        self.dragon.as_ref()
    }

    pub fn dragon_mut(&mut self) -> Option<&mut Dragon> {
        self.dragon.as_mut()
    }

    pub fn stage(&self) -> Option<DragonStage> {
        self.dragon.as_ref().map(|d| d.stage)
    }

    /// A hatched dragon that has not been given a name yet.
    pub fn needs_name(&self) -> bool {
        self.dragon.as_ref().is_some_and(|d| d.hatched && d.name.is_empty())
    }

    pub fn set_name(&mut self, raw: &str) -> Result<(), NameError> {
        let name = validate_name(raw)?;
        if let Some(dragon) = self.dragon.as_mut() {
            dragon.name = name;
        }
        Ok(())
    }

    pub fn feed(&mut self, nourishment: f64) -> bool {
        let Some(dragon) = self.dragon.as_mut() else { return false };
        if dragon.stage == DragonStage::Egg {
            return false;
        }
        dragon.hunger = (dragon.hunger + nourishment).min(MAX_STAT);
        dragon.happiness = (dragon.happiness + nourishment / 4.0).min(MAX_STAT);
        dragon.times_fed_today += 1;
        true
    }

    pub fn add_bond(&mut self, amount: u32) {
        if let Some(dragon) = self.dragon.as_mut() {
            dragon.bond = dragon.bond.saturating_add(amount).min(MAX_STAT as u32);
        }
    }

    /// The stage reached since the last call, if the dragon grew.
    pub fn take_stage_change(&mut self) -> Option<DragonStage> {
        self.stage_change.take()
    }

    fn end_of_day(&mut self) {
        let Some(dragon) = self.dragon.as_mut() else { return };
        dragon.age_hours += 24.0;
        dragon.times_fed_today = 0;
        if dragon.stage != DragonStage::Egg {
            dragon.hunger = (dragon.hunger - DAILY_HUNGER_LOSS).max(0.0);
        }
        dragon.stamina = MAX_STAT;
        dragon.is_resting = false;
        if let Some(stage) = dragon.progress_stage() {
            self.stage_change = Some(stage);
        }
    }
}

impl Default for DragonSubsystem {
    fn default() -> Self { Self::new() }
}

impl Persistable for DragonSubsystem {
    fn name(&self) -> &'static str { "dragon" }

    fn snapshot(&self) -> Document {
        match &self.dragon {
            Some(dragon) => to_document(self.name(), dragon),
            None => Value::Object(Map::new()),
        }
    }

    fn restore(&mut self, doc: &Document) {
        let section = self.name();
        self.stage_change = None;
        let has_dragon = doc.as_object().is_some_and(|fields| !fields.is_empty());
        self.dragon = has_dragon.then(|| {
            let mut dragon = restore_lenient(section, doc, Dragon::default());
            dragon.clamp_stats();
            if dragon.name.chars().count() > NAME_MAX_LEN {
                dragon.name = dragon.name.chars().take(NAME_MAX_LEN).collect();
            }
            dragon.progress_stage();
            dragon
        });
    }

    fn on_clock_event(&mut self, event: &ClockEvent) {
        if let ClockEvent::NewDay { .. } = event {
            self.end_of_day();
        }
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_thresholds() {
        assert_eq!(DragonStage::for_age_days(0.0), DragonStage::Egg);
        assert_eq!(DragonStage::for_age_days(1.0), DragonStage::Egg);
        assert_eq!(DragonStage::for_age_days(2.0), DragonStage::Hatchling);
        assert_eq!(DragonStage::for_age_days(4.0), DragonStage::Juvenile);
        assert_eq!(DragonStage::for_age_days(9.0), DragonStage::Adolescent);
        assert_eq!(DragonStage::for_age_days(10.0), DragonStage::Adult);
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_name("  Ember "), Ok("Ember".to_string()));
        assert_eq!(validate_name("   "), Err(NameError::Empty));
        assert_eq!(validate_name(&"x".repeat(21)), Err(NameError::TooLong));
        assert!(validate_name(&"x".repeat(20)).is_ok());
    }
}
