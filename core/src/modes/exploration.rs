//! Walking the world: time runs, zones are travelled, ingredients gathered.

use super::{CAFE, DRAGON_NAMING, DRAGON_STATUS, INVENTORY, PAUSE_MENU, RECIPE_BOOK};
use crate::{
    achievement_subsystem::AchievementTracker,
    dragon_subsystem::DragonSubsystem,
    engine::GameContext,
    inventory_subsystem::InventorySubsystem,
    mode::{Flow, InputEvent, Key, Mode, Surface},
    world_subsystem::WorldSubsystem,
};

/// Achievement toasts kept on screen.
const MAX_TOASTS: usize = 3;

pub struct ExplorationMode {
    message: Option<String>,
    toasts:  Vec<String>,
    next:    Option<String>,
}

impl Default for ExplorationMode {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplorationMode {
    pub fn new() -> Self {
        Self { message: None, toasts: Vec::new(), next: None }
    }

    fn request(&mut self, mode: &str) {
        if self.next.is_none() {
            self.next = Some(mode.to_string());
        }
    }
}

impl Mode<GameContext> for ExplorationMode {
    fn enter(&mut self, _previous: Option<&str>, ctx: &mut GameContext) {
        self.next = None;
        ctx.aggregator.enable_autosave();
        ctx.visit_current_zone();
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        let InputEvent::Key(key) = event else { return };
        match key {
            Key::Left | Key::Right => {
                self.message = match ctx.travel(*key == Key::Right) {
                    Some(zone) => Some(format!("You travel to {zone}.")),
                    None => Some("The way is blocked.".into()),
                };
            }
            Key::Interact => {
                self.message = match ctx.gather() {
                    Some(h) if h.rare => Some(format!("A rare find! {} x{}", h.item_id, h.quantity)),
                    Some(h) => Some(format!("Gathered {} x{}", h.item_id, h.quantity)),
                    None => Some("Nothing to gather here right now.".into()),
                };
            }
            Key::Cafe => {
                if ctx.clock.is_cafe_open() {
                    self.request(CAFE);
                } else {
                    self.message = Some("The cafe is closed at this hour.".into());
                }
            }
            Key::Inventory => self.request(INVENTORY),
            Key::RecipeBook => self.request(RECIPE_BOOK),
            Key::DragonStatus => self.request(DRAGON_STATUS),
            Key::Pause | Key::Back => self.request(PAUSE_MENU),
            Key::Sleep => {
                ctx.sleep();
                self.message = Some(format!("Good morning! Day {}.", ctx.clock.current_day()));
            }
            _ => {}
        }
    }

    fn update(&mut self, dt: f64, ctx: &mut GameContext) -> Flow {
        ctx.advance_time(dt);

        if ctx.subsystem::<DragonSubsystem>().is_some_and(|d| d.needs_name()) {
            self.request(DRAGON_NAMING);
        }
        if let Some(achievements) = ctx.subsystem_mut::<AchievementTracker>() {
            for unlocked in achievements.pending_notifications() {
                self.toasts.push(format!("Achievement unlocked: {} (+{}g)", unlocked.name, unlocked.reward_gold));
            }
            let overflow = self.toasts.len().saturating_sub(MAX_TOASTS);
            self.toasts.drain(..overflow);
        }

        ctx.record_playtime(dt);
        Flow::Continue
    }

    fn draw(&self, ctx: &GameContext, surface: &mut dyn Surface) {
        let zone = ctx.subsystem::<WorldSubsystem>().map(|w| w.current_zone()).unwrap_or("?");
        let gold = ctx.subsystem::<InventorySubsystem>().map(|i| i.gold()).unwrap_or(0);
        surface.text(&format!(
            "Day {} ({} {}) {}",
            ctx.clock.current_day(),
            ctx.clock.season_name(),
            ctx.clock.day_in_season(),
            ctx.clock.formatted_time(),
        ));
        surface.text(&format!("Zone: {zone}  Gold: {gold}"));
        if let Some(dragon) = ctx.subsystem::<DragonSubsystem>().and_then(|d| d.dragon()) {
            surface.text(&format!("{} the {}", dragon.display_name(), dragon.stage.as_str()));
        }
        if let Some(message) = &self.message {
            surface.text(message);
        }
        for toast in &self.toasts {
            surface.text(toast);
        }
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
