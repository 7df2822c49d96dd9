//! The concrete game modes. Each drives GameContext and asks the machine
//! for transitions through `take_next_mode`; drawing is text only.

mod cafe;
mod exploration;
mod main_menu;
mod naming;
mod overlays;
mod pause;
mod save_load;
mod settings;

pub use cafe::CafeServiceMode;
pub use exploration::ExplorationMode;
pub use main_menu::MainMenuMode;
pub use naming::DragonNamingMode;
pub use overlays::{OverlayKind, OverlayMode};
pub use pause::PauseMode;
pub use save_load::{SaveLoadAction, SaveLoadMode};
pub use settings::SettingsMode;

use crate::{engine::GameContext, mode::ModeMachine};

pub const MAIN_MENU:     &str = "main_menu";
pub const DRAGON_NAMING: &str = "dragon_naming";
pub const EXPLORATION:   &str = "exploration";
pub const CAFE:          &str = "cafe";
pub const INVENTORY:     &str = "inventory";
pub const RECIPE_BOOK:   &str = "recipe_book";
pub const DRAGON_STATUS: &str = "dragon_status";
pub const PAUSE_MENU:    &str = "pause_menu";
pub const SETTINGS:      &str = "settings";
pub const SAVE_LOAD:     &str = "save_load";

/// Modes where the clock runs and the player is in the world.
pub const GAMEPLAY_MODES: [&str; 2] = [EXPLORATION, CAFE];

pub fn register_all(machine: &mut ModeMachine<GameContext>) {
    machine.register(MAIN_MENU, Box::new(MainMenuMode::new()));
    machine.register(DRAGON_NAMING, Box::new(DragonNamingMode::new()));
    machine.register(EXPLORATION, Box::new(ExplorationMode::new()));
    machine.register(CAFE, Box::new(CafeServiceMode::new()));
    machine.register(INVENTORY, Box::new(OverlayMode::new(OverlayKind::Inventory)));
    machine.register(RECIPE_BOOK, Box::new(OverlayMode::new(OverlayKind::RecipeBook)));
    machine.register(DRAGON_STATUS, Box::new(OverlayMode::new(OverlayKind::DragonStatus)));
    machine.register(PAUSE_MENU, Box::new(PauseMode::new()));
    machine.register(SETTINGS, Box::new(SettingsMode::new()));
    machine.register(SAVE_LOAD, Box::new(SaveLoadMode::new()));
}

/// A vertical list with a wrapping cursor.
#[derive(Debug, Clone)]
pub(crate) struct Menu {
    items:    &'static [&'static str],
    selected: usize,
}

impl Menu {
    pub(crate) fn new(items: &'static [&'static str]) -> Self {
        Self { items, selected: 0 }
    }

    pub(crate) fn up(&mut self) {
        let len = self.items.len().max(1);
        self.selected = (self.selected + len - 1) % len;
    }

    pub(crate) fn down(&mut self) {
        self.selected = (self.selected + 1) % self.items.len().max(1);
    }

    pub(crate) fn selected(&self) -> &'static str {
        self.items.get(self.selected).copied().unwrap_or("")
    }

    pub(crate) fn reset(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn draw(&self, surface: &mut dyn crate::mode::Surface) {
        for (i, item) in self.items.iter().enumerate() {
            let marker = if i == self.selected { ">" } else { " " };
            surface.text(&format!("{marker} {item}"));
        }
    }
}
