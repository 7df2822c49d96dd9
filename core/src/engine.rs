//! The game engine: composition root for Dragon Haven's core.
//!
//! REGISTRATION ORDER (fixed, documented, never reordered):
//!   0. time          (the clock; owned directly, not in the registry)
//!   1. inventory
//!   2. world
//!   3. resources
//!   4. economy
//!   5. cafe
//!   6. story
//!   7. characters
//!   8. dialogue
//!   9. recipes
//!  10. dragon
//!  11. achievements
//!
//! RULES:
//!   - The clock advances first. Subsystems then see every clock event, in
//!     registration order. Autosave runs last, after the rollover is done.
//!   - Several rollovers in one advance produce one autosave, for the last day.
//!   - Modes reach game state only through GameContext.
//!   - Time moves only through `advance_time` and `sleep`.

use crate::{
    achievement_subsystem::AchievementTracker,
    aggregator::StateAggregator,
    cafe_subsystem::CafeSubsystem,
    character_subsystem::CharacterSubsystem,
    clock::{ClockEvent, GameClock},
    config::GameConfig,
    dialogue_subsystem::DialogueSubsystem,
    dragon_subsystem::DragonSubsystem,
    economy_subsystem::EconomySubsystem,
    error::HavenResult,
    inventory_subsystem::InventorySubsystem,
    mode::{Flow, InputEvent, ModeMachine, Surface},
    modes,
    recipe_subsystem::RecipeSubsystem,
    resource_subsystem::{Harvest, ResourceSubsystem},
    settings::Settings,
    store::{SaveBackend, SaveManager, SqliteSaveBackend},
    story_subsystem::StorySubsystem,
    subsystem::SubsystemRegistry,
    types::SlotId,
    world_subsystem::WorldSubsystem,
};
use std::path::PathBuf;

/// Price of one served dish before New Game+ scaling.
pub const BASE_DISH_PRICE: u32 = 25;
/// Hunger restored by one feeding.
pub const FEED_NOURISHMENT: f64 = 25.0;

pub struct GameContext {
    pub config:        GameConfig,
    /// Read freely. Move time with `advance_time` or `sleep`, never through
    /// the clock directly, or subsystems and autosave miss the rollover.
    pub clock:         GameClock,
    pub subsystems:    SubsystemRegistry,
    pub aggregator:    StateAggregator,
    pub saves:         SaveManager,
    pub settings:      Settings,
    pub settings_path: Option<PathBuf>,
}

impl GameContext {
    pub fn new(config: GameConfig, backend: Box<dyn SaveBackend>) -> Self {
        let new_game = &config.new_game;
        let mut subsystems = SubsystemRegistry::new();
        // REGISTRATION ORDER: fixed, matches the module doc above.
        subsystems.register(Box::new(InventorySubsystem::new(new_game)));
        subsystems.register(Box::new(WorldSubsystem::new(new_game)));
        subsystems.register(Box::new(ResourceSubsystem::new()));
        subsystems.register(Box::new(EconomySubsystem::new()));
        subsystems.register(Box::new(CafeSubsystem::new()));
        subsystems.register(Box::new(StorySubsystem::new(new_game)));
        subsystems.register(Box::new(CharacterSubsystem::new()));
        subsystems.register(Box::new(DialogueSubsystem::new()));
        subsystems.register(Box::new(RecipeSubsystem::new(new_game)));
        subsystems.register(Box::new(DragonSubsystem::new()));
        subsystems.register(Box::new(AchievementTracker::new()));

        Self {
            clock:         GameClock::new(config.clock.clone()),
            aggregator:    StateAggregator::new(config.new_game.clone()),
            saves:         SaveManager::new(backend, config.save.slot_count),
            settings:      Settings::default(),
            settings_path: None,
            subsystems,
            config,
        }
    }

    /// Load settings from `path` (defaults if absent), apply them, and
    /// remember the path for later saves.
    pub fn use_settings_file(&mut self, path: PathBuf) {
        self.settings = Settings::load(&path);
        self.settings_path = Some(path);
        self.apply_settings();
    }

    pub fn apply_settings(&mut self) {
        self.clock.set_time_scale(self.settings.game_speed);
    }

    pub fn save_settings(&self) -> bool {
        match &self.settings_path {
            Some(path) => self.settings.save(path),
            None => false,
        }
    }

    pub fn subsystem<T: 'static>(&self) -> Option<&T> {
        self.subsystems.get::<T>()
    }

    pub fn subsystem_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.subsystems.get_mut::<T>()
    }

    // ── Time ──────────────────────────────────────────────────────────────────

    /// Advance the clock by `dt` real seconds, then run subsystem upkeep
    /// and any day-rollover autosave.
    pub fn advance_time(&mut self, dt: f64) -> Vec<ClockEvent> {
        let events = self.clock.advance(dt);
        self.after_clock(&events);
        events
    }

    /// Sleep until the next morning.
    pub fn sleep(&mut self) -> Vec<ClockEvent> {
        let events = self.clock.skip_to_next_morning();
        self.after_clock(&events);
        events
    }

    fn after_clock(&mut self, events: &[ClockEvent]) {
        if events.is_empty() {
            return;
        }
        for subsystem in self.subsystems.iter_mut() {
            for event in events {
                subsystem.on_clock_event(event);
            }
        }
        self.check_progress();

        let last_day = events.iter().rev().find_map(|e| match e {
            ClockEvent::NewDay { day } => Some(*day),
            _ => None,
        });
        if let Some(day) = last_day {
            self.aggregator.autosave(
                day,
                self.config.save.autosave_slot,
                &self.clock,
                &self.subsystems,
                &mut self.saves,
            );
        }
    }

    pub fn record_playtime(&mut self, dt: f64) {
        self.aggregator.tick(dt);
    }

    /// Re-run every achievement condition against current state.
    pub fn check_progress(&mut self) {
        let dragon = self.subsystem_mut::<DragonSubsystem>().map(|d| {
            let grew = d.take_stage_change();
            (grew, d.stage(), d.dragon().map(|dragon| dragon.bond).unwrap_or(0))
        });
        let reputation = self.subsystem::<CafeSubsystem>().map(|c| c.reputation());
        let recipes = self.subsystem::<RecipeSubsystem>().map(|r| r.unlocked_count());
        let any_max_affinity = self
            .subsystem::<CharacterSubsystem>()
            .is_some_and(|c| c.has_max_affinity());

        if let Some(achievements) = self.subsystem_mut::<AchievementTracker>() {
            if let Some((grew, stage, bond)) = dragon {
                if let Some(stage) = grew.or(stage) {
                    achievements.check_dragon_stage(stage);
                }
                achievements.check_dragon_bond(bond);
            }
            if let Some(reputation) = reputation {
                achievements.check_reputation(reputation);
            }
            if let Some(count) = recipes {
                achievements.check_recipes_unlocked(count);
            }
            achievements.check_max_affinity(any_max_affinity);
        }
        self.aggregator.check_ng_plus_unlock(&self.subsystems);
    }

    // ── Saves and playthroughs ────────────────────────────────────────────────

    pub fn save_game(&mut self, slot: SlotId) -> bool {
        let doc = self.aggregator.collect(&self.clock, &self.subsystems);
        self.saves.save(slot, &doc)
    }

    /// Load `slot` over the current session. Sections the save lacks start
    /// from defaults. Returns false, leaving the session untouched, if the
    /// slot is empty or unreadable.
    pub fn load_game(&mut self, slot: SlotId) -> bool {
        let Some(mut doc) = self.saves.load(slot) else {
            return false;
        };
        StateAggregator::fill_missing_sections(&mut doc, &self.clock, &self.subsystems);
        self.aggregator.apply(&doc, &mut self.clock, &mut self.subsystems);
        self.clock.resume();
        self.apply_settings();
        true
    }

    /// Load whichever slot was saved most recently.
    pub fn continue_game(&mut self) -> bool {
        match self.saves.most_recent_slot() {
            Some(slot) => self.load_game(slot),
            None => false,
        }
    }

    pub fn new_game(&mut self) {
        self.aggregator.new_game(&mut self.clock, &mut self.subsystems);
        self.clock.resume();
        self.apply_settings();
    }

    pub fn new_game_plus(&mut self) -> bool {
        let started = self.aggregator.new_game_plus(&mut self.clock, &mut self.subsystems);
        if started {
            self.clock.resume();
            self.apply_settings();
        }
        started
    }

    // ── Gameplay actions ──────────────────────────────────────────────────────

    /// Step to the neighbouring unlocked zone.
    pub fn travel(&mut self, forward: bool) -> Option<String> {
        let world = self.subsystem_mut::<WorldSubsystem>()?;
        let zone = world.neighbour_zone(forward)?;
        world.travel_to(zone);
        self.visit_current_zone();
        Some(zone.to_string())
    }

    pub fn visit_current_zone(&mut self) {
        let Some(zone) = self.subsystem::<WorldSubsystem>().map(|w| w.current_zone().to_string()) else {
            return;
        };
        if let Some(achievements) = self.subsystem_mut::<AchievementTracker>() {
            achievements.check_zone_visited(&zone);
        }
    }

    /// Harvest the first available spawn point in the current zone into
    /// the carried inventory.
    pub fn gather(&mut self) -> Option<Harvest> {
        let zone = self.subsystem::<WorldSubsystem>()?.current_zone().to_string();
        let resources = self.subsystem_mut::<ResourceSubsystem>()?;
        let point = resources.available_in(&zone).into_iter().next()?;
        let harvest = resources.harvest(point)?;

        if let Some(world) = self.subsystem_mut::<WorldSubsystem>() {
            world.discover_point(point);
        }
        if let Some(inventory) = self.subsystem_mut::<InventorySubsystem>() {
            inventory.add_item(harvest.item_id, harvest.quantity);
        }
        if let Some(achievements) = self.subsystem_mut::<AchievementTracker>() {
            achievements.check_ingredient_gathered(harvest.quantity, harvest.rare);
        }
        Some(harvest)
    }

    pub fn feed_dragon(&mut self) -> bool {
        let Some(dragon) = self.subsystem_mut::<DragonSubsystem>() else { return false };
        let fed = dragon.feed(FEED_NOURISHMENT);
        if fed {
            dragon.add_bond(1);
            self.check_progress();
        }
        fed
    }

    /// Align the cafe's phase and menu with the clock.
    pub fn sync_cafe(&mut self) {
        let hour = self.clock.current_hour();
        let (open, close) = (self.config.clock.cafe_open_hour, self.config.clock.cafe_close_hour);
        let menu: Vec<String> = self
            .subsystem::<InventorySubsystem>()
            .map(|i| i.state.unlocked_recipes.iter().take(3).cloned().collect())
            .unwrap_or_default();
        if let Some(cafe) = self.subsystem_mut::<CafeSubsystem>() {
            cafe.sync_to_hour(hour, open, close);
            if cafe.state.current_menu.is_empty() {
                cafe.set_menu(menu);
            }
        }
    }

    /// Serve one customer at `satisfaction` (1..=5). Returns the gold earned.
    pub fn serve_customer(&mut self, satisfaction: u8) -> u32 {
        let bonus = self.aggregator.ng_plus_modifier("gold_bonus");
        let gold = (f64::from(BASE_DISH_PRICE) * bonus).round() as u32;
        let Some(cafe) = self.subsystem_mut::<CafeSubsystem>() else { return 0 };
        cafe.serve_customer(gold, satisfaction);
        if let Some(inventory) = self.subsystem_mut::<InventorySubsystem>() {
            inventory.add_gold(gold);
        }
        if let Some(economy) = self.subsystem_mut::<EconomySubsystem>() {
            economy.record_income(gold, "cafe sale");
        }
        self.check_progress();
        gold
    }

    /// Close today's service. Returns false if it was already closed.
    pub fn finish_service(&mut self) -> bool {
        let completed = self
            .subsystem_mut::<CafeSubsystem>()
            .is_some_and(|cafe| cafe.complete_service());
        if completed {
            if let Some(achievements) = self.subsystem_mut::<AchievementTracker>() {
                achievements.check_service_complete();
            }
            self.check_progress();
        }
        completed
    }
}

pub struct GameEngine {
    pub ctx:   GameContext,
    pub modes: ModeMachine<GameContext>,
}

impl GameEngine {
    /// Build a fully wired engine: every subsystem and mode registered, the
    /// main menu active.
    pub fn build(config: GameConfig, backend: Box<dyn SaveBackend>, settings_path: Option<PathBuf>) -> Self {
        let mut ctx = GameContext::new(config, backend);
        if let Some(path) = settings_path {
            ctx.use_settings_file(path);
        }
        let mut machine = ModeMachine::new(&ctx.config.transition);
        modes::register_all(&mut machine);
        machine.set_mode(modes::MAIN_MENU, false, &mut ctx);
        Self { ctx, modes: machine }
    }

    /// In-memory saves, test configuration, no settings file.
    pub fn build_test() -> HavenResult<Self> {
        let backend = SqliteSaveBackend::in_memory()?;
        Ok(Self::build(GameConfig::default_test(), Box::new(backend), None))
    }

    /// One frame: deliver input, then update the active mode (or transition).
    pub fn frame(&mut self, dt: f64, events: &[InputEvent]) -> Flow {
        for event in events {
            self.modes.handle_event(event, &mut self.ctx);
        }
        self.modes.update(dt, &mut self.ctx)
    }

    /// Run `frames` input-free frames. Stops early on Quit.
    pub fn run_frames(&mut self, frames: u32, dt: f64) -> Flow {
        for _ in 0..frames {
            if self.frame(dt, &[]) == Flow::Quit {
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Run input-free frames until no transition is in flight.
    pub fn settle(&mut self, dt: f64) -> Flow {
        let mut guard = 0;
        while self.modes.is_transitioning() && guard < 10_000 {
            if self.frame(dt, &[]) == Flow::Quit {
                return Flow::Quit;
            }
            guard += 1;
        }
        Flow::Continue
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        self.modes.draw(&self.ctx, surface);
    }

    pub fn current_mode(&self) -> Option<&str> {
        self.modes.current_mode_name()
    }
}
