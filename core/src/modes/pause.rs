//! Pause menu. The clock stops while it (or anything it opens) is showing.

use super::{
    Menu, DRAGON_STATUS, EXPLORATION, GAMEPLAY_MODES, INVENTORY, MAIN_MENU, RECIPE_BOOK, SAVE_LOAD,
    SETTINGS,
};
use crate::{
    engine::GameContext,
    mode::{Flow, InputEvent, Key, Mode, Surface},
};

const ITEMS: [&str; 7] = [
    "Resume",
    "Inventory",
    "Recipe Book",
    "Dragon",
    "Save / Load",
    "Settings",
    "Main Menu",
];

pub struct PauseMode {
    menu:      Menu,
    resume_to: String,
    next:      Option<String>,
}

impl Default for PauseMode {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseMode {
    pub fn new() -> Self {
        Self { menu: Menu::new(&ITEMS), resume_to: EXPLORATION.into(), next: None }
    }

    fn resume(&mut self, ctx: &mut GameContext) {
        ctx.clock.resume();
        self.next = Some(self.resume_to.clone());
    }

    fn activate(&mut self, ctx: &mut GameContext) {
        let target = match self.menu.selected() {
            "Resume" => return self.resume(ctx),
            "Inventory" => INVENTORY,
            "Recipe Book" => RECIPE_BOOK,
            "Dragon" => DRAGON_STATUS,
            "Save / Load" => SAVE_LOAD,
            "Settings" => SETTINGS,
            "Main Menu" => {
                ctx.clock.resume();
                ctx.aggregator.disable_autosave();
                MAIN_MENU
            }
            _ => return,
        };
        self.next = Some(target.into());
    }
}

impl Mode<GameContext> for PauseMode {
    fn enter(&mut self, previous: Option<&str>, ctx: &mut GameContext) {
        // Coming back from a sub-screen keeps the original resume target.
        if let Some(mode) = previous.filter(|p| GAMEPLAY_MODES.contains(p)) {
            self.resume_to = mode.to_string();
            self.menu.reset();
        }
        self.next = None;
        ctx.clock.pause();
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        match event {
            InputEvent::Key(Key::Up) => self.menu.up(),
            InputEvent::Key(Key::Down) => self.menu.down(),
            InputEvent::Key(Key::Confirm) => self.activate(ctx),
            InputEvent::Key(Key::Back | Key::Pause) => self.resume(ctx),
            _ => {}
        }
    }

    fn update(&mut self, _dt: f64, _ctx: &mut GameContext) -> Flow {
        Flow::Continue
    }

    fn draw(&self, ctx: &GameContext, surface: &mut dyn Surface) {
        surface.text("Paused");
        surface.text(&format!("Day {} {}", ctx.clock.current_day(), ctx.clock.formatted_time()));
        self.menu.draw(surface);
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
