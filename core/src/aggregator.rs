//! State aggregator: merges every subsystem's snapshot into one unified
//! document, fans a loaded document back out, tracks playtime, owns the
//! autosave policy and starts new playthroughs.
//!
//! COLLECTION ORDER (fixed, matches registration order in engine.rs):
//!   time, inventory, world, resources, economy, cafe, story, characters,
//!   dialogue, recipes, dragon, achievements
//!
//! RULES:
//!   - apply() only touches subsystems that have a section in the document.
//!   - Autosave failures are logged and never interrupt play.
//!   - new_game() never reads a subsystem's prior state.

use crate::{
    character_subsystem::CharacterSubsystem,
    clock::GameClock,
    config::NewGameConfig,
    document::{Progression, SaveMeta, UnifiedDocument, SCHEMA_VERSION},
    dragon_subsystem::DragonSubsystem,
    recipe_subsystem::RecipeSubsystem,
    store::SaveManager,
    story_subsystem::StorySubsystem,
    subsystem::{Persistable, SubsystemRegistry},
    types::{Day, PlaythroughId, SlotId},
};
use serde_json::{json, Map, Value};

/// Multipliers applied per New Game+ cycle: (name, base, scaling per extra level).
const NG_PLUS_MODIFIERS: [(&str, f64, f64); 5] = [
    ("customer_expectations", 1.2,  1.05),
    ("service_time",          0.9,  0.98),
    ("resource_scarcity",     0.8,  0.95),
    ("gold_bonus",            1.25, 1.05),
    ("reputation_decay",      0.8,  1.0),
];

pub struct StateAggregator {
    config:           NewGameConfig,
    playtime_seconds: f64,
    autosave_enabled: bool,
    progression:      Progression,
    playthrough_id:   PlaythroughId,
    created_at:       String,
}

impl StateAggregator {
    pub fn new(config: NewGameConfig) -> Self {
        Self {
            config,
            playtime_seconds: 0.0,
            autosave_enabled: false,
            progression:      Progression::default(),
            playthrough_id:   new_playthrough_id(),
            created_at:       now_rfc3339(),
        }
    }

    // ── Playtime ──────────────────────────────────────────────────────────────

    pub fn tick(&mut self, dt: f64) {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("aggregator: ignoring playtime tick dt={dt}");
            return;
        }
        self.playtime_seconds += dt;
    }

    pub fn playtime_seconds(&self) -> f64 {
        self.playtime_seconds
    }

    pub fn playthrough_id(&self) -> &str {
        &self.playthrough_id
    }

    // ── Collect / apply ───────────────────────────────────────────────────────

    pub fn collect(&self, clock: &GameClock, registry: &SubsystemRegistry) -> UnifiedDocument {
        let mut doc = UnifiedDocument {
            meta: SaveMeta {
                schema_version: SCHEMA_VERSION,
                created_at:     self.created_at.clone(),
                playthrough_id: self.playthrough_id.clone(),
                ..SaveMeta::default()
            },
            playtime_seconds: self.playtime_seconds,
            progression:      self.progression.clone(),
            sections:         Map::new(),
        };
        doc.set_section(clock.name(), clock.snapshot());
        for subsystem in registry.iter() {
            doc.set_section(subsystem.name(), subsystem.snapshot());
        }
        doc
    }

    /// Restore each subsystem that has a section in `doc`. Subsystems
    /// without one keep their current state; sections nobody owns are skipped.
    pub fn apply(&mut self, doc: &UnifiedDocument, clock: &mut GameClock, registry: &mut SubsystemRegistry) {
        if let Some(section) = doc.section(clock.name()) {
            clock.restore(section);
        }
        for subsystem in registry.iter_mut() {
            if let Some(section) = doc.section(subsystem.name()) {
                subsystem.restore(section);
            }
        }
        for name in doc.sections.keys() {
            if name != clock.name() && registry.by_name(name).is_none() {
                log::debug!("aggregator: no subsystem owns section '{name}'");
            }
        }

        self.playtime_seconds = if doc.playtime_seconds.is_finite() && doc.playtime_seconds >= 0.0 {
            doc.playtime_seconds
        } else {
            0.0
        };
        self.progression = doc.progression.clone();
        if !doc.meta.playthrough_id.is_empty() {
            self.playthrough_id = doc.meta.playthrough_id.clone();
        }
        if !doc.meta.created_at.is_empty() {
            self.created_at = doc.meta.created_at.clone();
        }
    }

    /// Give every registered subsystem (and the clock) a section, inserting
    /// `{}` where the stored document had none, so a loaded game never keeps
    /// state from the session it replaced.
    pub fn fill_missing_sections(doc: &mut UnifiedDocument, clock: &GameClock, registry: &SubsystemRegistry) {
        let names = std::iter::once(clock.name()).chain(registry.iter().map(|s| s.name()));
        for name in names {
            if doc.section(name).is_none() {
                log::info!("aggregator: save has no '{name}' section; using defaults");
                doc.set_section(name, Value::Object(Map::new()));
            }
        }
    }

    // ── Autosave ──────────────────────────────────────────────────────────────

    /// Returns true the first time, false when already enabled.
    pub fn enable_autosave(&mut self) -> bool {
        if self.autosave_enabled {
            return false;
        }
        log::info!("autosave enabled");
        self.autosave_enabled = true;
        true
    }

    pub fn disable_autosave(&mut self) {
        self.autosave_enabled = false;
    }

    pub fn autosave_enabled(&self) -> bool {
        self.autosave_enabled
    }

    /// Day-rollover autosave. Does nothing while autosave is disabled.
    pub fn autosave(
        &mut self,
        day: Day,
        slot: SlotId,
        clock: &GameClock,
        registry: &SubsystemRegistry,
        saves: &mut SaveManager,
    ) -> bool {
        if !self.autosave_enabled {
            return false;
        }
        let doc = self.collect(clock, registry);
        let saved = saves.save(slot, &doc);
        if saved {
            log::info!("day={day} autosaved to slot {slot}");
        } else {
            log::error!("day={day} autosave to slot {slot} failed; play continues");
        }
        saved
    }

    // ── New game ──────────────────────────────────────────────────────────────

    /// Put every subsystem into its new-game state. Progression unlocks and
    /// the dragon-name history survive; the New Game+ level resets.
    pub fn new_game(&mut self, clock: &mut GameClock, registry: &mut SubsystemRegistry) {
        let start_hour = clock.config().start_hour;
        let mut sections = self.starting_sections(start_hour);
        sections.insert("characters".into(), json!({ "characters": {} }));
        sections.insert("recipes".into(), json!({ "unlocked": self.config.default_recipes }));
        sections.insert("achievements".into(), json!({}));

        self.restore_all(&sections, clock, registry);
        self.hatch_fresh_egg(registry);

        self.playtime_seconds = 0.0;
        self.progression.ng_plus_level = 0;
        self.begin_playthrough();
        log::info!("new game started ({})", self.playthrough_id);
    }

    /// Start the next New Game+ cycle. Refused unless unlocked.
    pub fn new_game_plus(&mut self, clock: &mut GameClock, registry: &mut SubsystemRegistry) -> bool {
        if !self.progression.ng_plus_unlocked {
            log::warn!("new game plus requested before it was unlocked");
            return false;
        }

        let recipes = registry.get::<RecipeSubsystem>().map(|r| (r.state.clone(), r.mastered()));
        let characters = registry
            .get::<CharacterSubsystem>()
            .map(|c| c.retained(self.config.ng_plus_affinity_retention));
        if let Some(name) = registry
            .get::<DragonSubsystem>()
            .and_then(|d| d.dragon())
            .map(|d| d.name.clone())
            .filter(|n| !n.is_empty())
        {
            self.progression.dragon_names_history.push(name);
        }

        let start_hour = clock.config().start_hour;
        let mut sections = self.starting_sections(start_hour);
        let gold = self.config.starting_gold + self.config.ng_plus_gold_bonus;
        let (recipe_state, mastered) = match &recipes {
            Some((state, mastered)) => (Some(state), mastered.clone()),
            None => (None, Vec::new()),
        };
        let unlocked = recipe_state
            .map(|s| s.unlocked.clone())
            .unwrap_or_else(|| self.config.default_recipes.clone());
        sections.insert("inventory".into(), json!({
            "gold": gold,
            "unlocked_recipes": unlocked,
            "mastered_recipes": mastered,
        }));
        sections.insert("cafe".into(), json!({
            "reputation": self.config.ng_plus_reputation,
            "cafe_level": 1,
        }));
        if let Some(characters) = &characters {
            sections.insert("characters".into(), crate::document::to_document("characters", characters));
        }
        // recipes and achievements carry over untouched.

        self.restore_all(&sections, clock, registry);
        self.hatch_fresh_egg(registry);

        self.progression.ng_plus_level += 1;
        self.begin_playthrough();
        log::info!("new game plus level {} started", self.progression.ng_plus_level);
        true
    }

    /// Sections every new playthrough starts from.
    fn starting_sections(&self, start_hour: f64) -> Map<String, Value> {
        let mut sections = Map::new();
        sections.insert("time".into(), json!({
            "current_day": 1,
            "current_hour": start_hour,
            "current_season_index": 0,
            "time_scale": 1.0,
        }));
        sections.insert("inventory".into(), json!({
            "gold": self.config.starting_gold,
            "unlocked_recipes": self.config.default_recipes,
            "mastered_recipes": [],
        }));
        sections.insert("cafe".into(), json!({ "reputation": 0, "cafe_level": 1 }));
        sections.insert("story".into(), json!({
            "current_chapter": self.config.initial_chapter,
            "completed_events": [],
            "flags": {},
        }));
        sections.insert("world".into(), json!({ "current_zone_id": self.config.initial_zone }));
        for name in ["resources", "economy", "dialogue", "dragon"] {
            sections.insert(name.into(), json!({}));
        }
        sections
    }

    fn restore_all(&self, sections: &Map<String, Value>, clock: &mut GameClock, registry: &mut SubsystemRegistry) {
        if let Some(time) = sections.get(clock.name()) {
            clock.restore(time);
        }
        for subsystem in registry.iter_mut() {
            if let Some(section) = sections.get(subsystem.name()) {
                subsystem.restore(section);
            }
        }
    }

    fn hatch_fresh_egg(&self, registry: &mut SubsystemRegistry) {
        if let Some(dragon) = registry.get_mut::<DragonSubsystem>() {
            dragon.create_dragon();
        }
    }

    fn begin_playthrough(&mut self) {
        self.playthrough_id = new_playthrough_id();
        self.created_at = now_rfc3339();
    }

    // ── New Game+ progression ─────────────────────────────────────────────────

    /// Unlock New Game+ once the story's finale is done.
    pub fn check_ng_plus_unlock(&mut self, registry: &SubsystemRegistry) -> bool {
        if self.progression.ng_plus_unlocked {
            return true;
        }
        let finished = registry.get::<StorySubsystem>().is_some_and(|s| s.is_finale_complete());
        if finished {
            log::info!("new game plus unlocked");
            self.progression.ng_plus_unlocked = true;
        }
        finished
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn ng_plus_level(&self) -> u32 {
        self.progression.ng_plus_level
    }

    pub fn ng_plus_unlocked(&self) -> bool {
        self.progression.ng_plus_unlocked
    }

    pub fn dragon_names_history(&self) -> &[String] {
        &self.progression.dragon_names_history
    }

    /// 1.0 before the first cycle; otherwise `base * scaling^(level - 1)`.
    /// Unknown modifier names are neutral.
    pub fn ng_plus_modifier(&self, name: &str) -> f64 {
        let level = self.progression.ng_plus_level;
        if level == 0 {
            return 1.0;
        }
        NG_PLUS_MODIFIERS
            .iter()
            .find(|(modifier, _, _)| *modifier == name)
            .map(|(_, base, scaling)| base * scaling.powi(level as i32 - 1))
            .unwrap_or(1.0)
    }
}

fn new_playthrough_id() -> PlaythroughId {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
