//! Achievement tracker.
//!
//! RULES:
//!   - Unlocking is idempotent: a second unlock of the same id does nothing.
//!   - Every new unlock queues one notification and informs unlock listeners.
//!   - Conditions are re-checked freely; checks only ever add unlocks.
//!   - Restoring drops queued notifications; they are not game state.

use crate::{
    document::{restore_lenient, to_document},
    dragon_subsystem::DragonStage,
    notify::{ListenerId, Notifier},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;

pub const BOND_TARGET:               u32 = 100;
pub const RECIPE_TARGET:             usize = 50;
pub const INGREDIENT_TARGET:         u32 = 100;
pub const RARE_TARGET:               u32 = 10;
pub const ABILITY_TARGET:            usize = 10;
pub const ZONE_TARGET:               usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Dragon,
    Cafe,
    Exploration,
    Story,
}

#[derive(Debug)]
pub struct AchievementDef {
    pub id:          &'static str,
    pub name:        &'static str,
    pub description: &'static str,
    pub category:    AchievementCategory,
    pub reward_gold: u32,
}

const fn def(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    reward_gold: u32,
) -> AchievementDef {
    AchievementDef { id, name, description, category, reward_gold }
}

use AchievementCategory::{Cafe, Dragon, Exploration, Story};

pub static CATALOGUE: [AchievementDef; 24] = [
    def("dragon_first_steps",      "First Steps",           "Hatch your dragon egg",                          Dragon,      50),
    def("dragon_growing_up",       "Growing Up",            "Raise your dragon to Juvenile stage",            Dragon,      100),
    def("dragon_coming_of_age",    "Coming of Age",         "Raise your dragon to Adolescent stage",          Dragon,      200),
    def("dragon_full_grown",       "Full Grown",            "Raise your dragon to Adult stage",               Dragon,      500),
    def("dragon_best_friends",     "Best Friends",          "Reach maximum bond level (100) with your dragon", Dragon,     300),
    def("cafe_grand_opening",      "Grand Opening",         "Complete your first cafe service",               Cafe,        25),
    def("cafe_rising_star",        "Rising Star",           "Reach 100 reputation",                           Cafe,        100),
    def("cafe_expert_chef",        "Expert Chef",           "Reach 200 reputation",                           Cafe,        200),
    def("cafe_master_chef",        "Master Chef",           "Reach 350 reputation",                           Cafe,        300),
    def("cafe_legendary",          "Legendary Status",      "Reach 500 reputation (Legendary tier)",          Cafe,        500),
    def("cafe_recipe_collector",   "Recipe Collector",      "Unlock 50 recipes",                              Cafe,        250),
    def("explore_all_zones",       "Explorer",              "Visit all exploration zones",                    Exploration, 200),
    def("explore_gatherer",        "Gatherer",              "Collect 100 ingredients total",                  Exploration, 150),
    def("explore_treasure_hunter", "Treasure Hunter",       "Find 10 rare resources",                         Exploration, 300),
    def("explore_dragon_master",   "Dragon Master",         "Unlock all dragon abilities",                    Exploration, 400),
    def("story_chapter_1",         "Chapter I Complete",    "Complete Chapter 1 of the story",                Story,       50),
    def("story_chapter_2",         "Chapter II Complete",   "Complete Chapter 2 of the story",                Story,       75),
    def("story_chapter_3",         "Chapter III Complete",  "Complete Chapter 3 of the story",                Story,       100),
    def("story_chapter_4",         "Chapter IV Complete",   "Complete Chapter 4 of the story",                Story,       125),
    def("story_chapter_5",         "Chapter V Complete",    "Complete Chapter 5 of the story",                Story,       150),
    def("story_chapter_6",         "Chapter VI Complete",   "Complete Chapter 6 of the story",                Story,       175),
    def("story_chapter_7",         "Chapter VII Complete",  "Complete Chapter 7 of the story",                Story,       200),
    def("story_chapter_8",         "Chapter VIII Complete", "Complete the final chapter",                     Story,       500),
    def("story_true_friend",       "True Friend",           "Reach maximum affinity with any character",      Story,       250),
];

const REPUTATION_TIERS: [(i32, &str); 4] = [
    (100, "cafe_rising_star"),
    (200, "cafe_expert_chef"),
    (350, "cafe_master_chef"),
    (500, "cafe_legendary"),
];

pub fn definition(id: &str) -> Option<&'static AchievementDef> {
    CATALOGUE.iter().find(|d| d.id == id)
}

/// Queued for the UI when an achievement unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementNotification {
    pub id:          String,
    pub name:        String,
    pub description: String,
    pub reward_gold: u32,
}

impl From<&AchievementDef> for AchievementNotification {
    fn from(def: &AchievementDef) -> Self {
        Self {
            id:          def.id.to_string(),
            name:        def.name.to_string(),
            description: def.description.to_string(),
            reward_gold: def.reward_gold,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementState {
    pub unlocked:             BTreeSet<String>,
    pub service_count:        u32,
    pub ingredients_gathered: u32,
    pub rare_found:           u32,
    pub zones_visited:        BTreeSet<String>,
}

pub struct AchievementTracker {
    pub state: AchievementState,
    pending:   Vec<AchievementNotification>,
    listeners: Notifier<AchievementNotification>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self {
            state:     AchievementState::default(),
            pending:   Vec::new(),
            listeners: Notifier::new("achievement_unlocked"),
        }
    }

    fn try_unlock(&mut self, id: &str) -> Option<&'static str> {
        let def = definition(id)?;
        if !self.state.unlocked.insert(def.id.to_string()) {
            return None;
        }
        log::info!("achievement unlocked: {} ({})", def.name, def.id);
        let notification = AchievementNotification::from(def);
        self.listeners.dispatch(&notification);
        self.pending.push(notification);
        Some(def.id)
    }

    pub fn on_unlock<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&AchievementNotification) -> anyhow::Result<()> + 'static,
    {
        self.listeners.subscribe(listener)
    }

    // ── Condition checks ──────────────────────────────────────────────────────

    /// Unlocks the milestone for `stage` and every earlier one.
    pub fn check_dragon_stage(&mut self, stage: DragonStage) -> Vec<&'static str> {
        let milestones = [
            (DragonStage::Hatchling,  "dragon_first_steps"),
            (DragonStage::Juvenile,   "dragon_growing_up"),
            (DragonStage::Adolescent, "dragon_coming_of_age"),
            (DragonStage::Adult,      "dragon_full_grown"),
        ];
        milestones
            .iter()
            .filter(|(reached, _)| stage >= *reached)
            .filter_map(|(_, id)| self.try_unlock(id))
            .collect()
    }

    pub fn check_dragon_bond(&mut self, bond: u32) -> Option<&'static str> {
        if bond >= BOND_TARGET {
            return self.try_unlock("dragon_best_friends");
        }
        None
    }

    pub fn check_reputation(&mut self, reputation: i32) -> Vec<&'static str> {
        REPUTATION_TIERS
            .iter()
            .filter(|(threshold, _)| reputation >= *threshold)
            .filter_map(|(_, id)| self.try_unlock(id))
            .collect()
    }

    pub fn check_service_complete(&mut self) -> Option<&'static str> {
        self.state.service_count += 1;
        self.try_unlock("cafe_grand_opening")
    }

    pub fn check_recipes_unlocked(&mut self, count: usize) -> Option<&'static str> {
        if count >= RECIPE_TARGET {
            return self.try_unlock("cafe_recipe_collector");
        }
        None
    }

    pub fn check_zone_visited(&mut self, zone: &str) -> Option<&'static str> {
        self.state.zones_visited.insert(zone.to_string());
        if self.state.zones_visited.len() >= ZONE_TARGET {
            return self.try_unlock("explore_all_zones");
        }
        None
    }

    pub fn check_ingredient_gathered(&mut self, quantity: u32, rare: bool) -> Vec<&'static str> {
        self.state.ingredients_gathered = self.state.ingredients_gathered.saturating_add(quantity);
        if rare {
            self.state.rare_found += 1;
        }
        let mut unlocked = Vec::new();
        if self.state.ingredients_gathered >= INGREDIENT_TARGET {
            unlocked.extend(self.try_unlock("explore_gatherer"));
        }
        if self.state.rare_found >= RARE_TARGET {
            unlocked.extend(self.try_unlock("explore_treasure_hunter"));
        }
        unlocked
    }

    pub fn check_abilities_unlocked(&mut self, count: usize) -> Option<&'static str> {
        if count >= ABILITY_TARGET {
            return self.try_unlock("explore_dragon_master");
        }
        None
    }

    pub fn check_chapter_complete(&mut self, chapter: u32) -> Option<&'static str> {
        if !(1..=8).contains(&chapter) {
            return None;
        }
        self.try_unlock(&format!("story_chapter_{chapter}"))
    }

    pub fn check_max_affinity(&mut self, any_at_max: bool) -> Option<&'static str> {
        if any_at_max {
            return self.try_unlock("story_true_friend");
        }
        None
    }

    /// Unlock by id regardless of conditions. Unknown ids are refused.
    pub fn force_unlock(&mut self, id: &str) -> bool {
        if definition(id).is_none() {
            log::warn!("force_unlock: unknown achievement '{id}'");
            return false;
        }
        self.try_unlock(id).is_some()
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.state.unlocked.contains(id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.state.unlocked.len()
    }

    pub fn total_count(&self) -> usize {
        CATALOGUE.len()
    }

    pub fn progress_percent(&self) -> f64 {
        self.unlocked_count() as f64 / self.total_count() as f64 * 100.0
    }

    /// Catalogue entries in `category`, paired with their unlocked flag.
    pub fn by_category(&self, category: AchievementCategory) -> Vec<(&'static AchievementDef, bool)> {
        CATALOGUE
            .iter()
            .filter(|d| d.category == category)
            .map(|d| (d, self.is_unlocked(d.id)))
            .collect()
    }

    /// Hand over and clear the queued unlock notifications.
    pub fn pending_notifications(&mut self) -> Vec<AchievementNotification> {
        std::mem::take(&mut self.pending)
    }
}

impl Default for AchievementTracker {
    fn default() -> Self { Self::new() }
}

impl Persistable for AchievementTracker {
    fn name(&self) -> &'static str { "achievements" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        let mut state = restore_lenient(self.name(), doc, AchievementState::default());
        state.unlocked.retain(|id| {
            let known = definition(id).is_some();
            if !known {
                log::debug!("achievements: dropping unknown id '{id}'");
            }
            known
        });
        self.state = state;
        self.pending.clear();
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
