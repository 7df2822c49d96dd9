//! Read-mostly screens opened from exploration or the pause menu. Each one
//! returns to whichever mode opened it.

use super::{EXPLORATION, MAIN_MENU};
use crate::{
    dragon_subsystem::DragonSubsystem,
    engine::GameContext,
    inventory_subsystem::InventorySubsystem,
    mode::{Flow, InputEvent, Key, Mode, Surface},
    recipe_subsystem::RecipeSubsystem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Inventory,
    RecipeBook,
    DragonStatus,
}

impl OverlayKind {
    /// The key that both opens and closes this overlay.
    fn toggle_key(self) -> Key {
        match self {
            OverlayKind::Inventory    => Key::Inventory,
            OverlayKind::RecipeBook   => Key::RecipeBook,
            OverlayKind::DragonStatus => Key::DragonStatus,
        }
    }
}

pub struct OverlayMode {
    kind:      OverlayKind,
    return_to: String,
    message:   Option<String>,
    next:      Option<String>,
}

impl OverlayMode {
    pub fn new(kind: OverlayKind) -> Self {
        Self { kind, return_to: EXPLORATION.into(), message: None, next: None }
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    fn draw_inventory(ctx: &GameContext, surface: &mut dyn Surface) {
        let Some(inventory) = ctx.subsystem::<InventorySubsystem>() else { return };
        surface.text(&format!("Gold: {}", inventory.gold()));
        if inventory.state.carried.is_empty() {
            surface.text("(carrying nothing)");
        }
        for (item, qty) in &inventory.state.carried {
            surface.text(&format!("{item} x{qty}"));
        }
        let stored: u32 = inventory.state.storage.values().sum();
        surface.text(&format!("In storage: {stored} items"));
    }

    fn draw_recipes(ctx: &GameContext, surface: &mut dyn Surface) {
        let Some(recipes) = ctx.subsystem::<RecipeSubsystem>() else { return };
        surface.text(&format!("Recipes known: {}", recipes.unlocked_count()));
        let mastered = recipes.mastered();
        for recipe in &recipes.state.unlocked {
            let star = if mastered.contains(recipe) { " *" } else { "" };
            surface.text(&format!("{recipe}{star}"));
        }
    }

    fn draw_dragon(ctx: &GameContext, surface: &mut dyn Surface) {
        let Some(dragon) = ctx.subsystem::<DragonSubsystem>().and_then(|d| d.dragon()) else {
            surface.text("No dragon yet.");
            return;
        };
        surface.text(&format!("{} - {} ({:.1} days)", dragon.display_name(), dragon.stage.as_str(), dragon.age_days()));
        surface.text(&format!("Hunger {:.0}  Happiness {:.0}  Stamina {:.0}", dragon.hunger, dragon.happiness, dragon.stamina));
        surface.text(&format!("Bond {}", dragon.bond));
    }
}

impl Mode<GameContext> for OverlayMode {
    fn enter(&mut self, previous: Option<&str>, _ctx: &mut GameContext) {
        // Provenance from the main menu is never a real opener.
        self.return_to = previous
            .filter(|p| *p != MAIN_MENU)
            .unwrap_or(EXPLORATION)
            .to_string();
        self.message = None;
        self.next = None;
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        let InputEvent::Key(key) = event else { return };
        match key {
            Key::Back => self.next = Some(self.return_to.clone()),
            k if *k == self.kind.toggle_key() => self.next = Some(self.return_to.clone()),
            Key::Interact if self.kind == OverlayKind::DragonStatus => {
                self.message = Some(if ctx.feed_dragon() {
                    "You feed your dragon. It looks content.".into()
                } else {
                    "Your dragon cannot eat right now.".into()
                });
            }
            Key::Confirm if self.kind == OverlayKind::Inventory => {
                if let Some(inventory) = ctx.subsystem_mut::<InventorySubsystem>() {
                    inventory.deposit_all();
                    self.message = Some("Everything moved to storage.".into());
                }
            }
            _ => {}
        }
    }

    fn update(&mut self, _dt: f64, _ctx: &mut GameContext) -> Flow {
        Flow::Continue
    }

    fn draw(&self, ctx: &GameContext, surface: &mut dyn Surface) {
        match self.kind {
            OverlayKind::Inventory => {
                surface.text("Inventory");
                Self::draw_inventory(ctx, surface);
            }
            OverlayKind::RecipeBook => {
                surface.text("Recipe Book");
                Self::draw_recipes(ctx, surface);
            }
            OverlayKind::DragonStatus => {
                surface.text("Dragon");
                Self::draw_dragon(ctx, surface);
            }
        }
        if let Some(message) = &self.message {
            surface.text(message);
        }
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
