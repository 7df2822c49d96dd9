use super::{Menu, EXPLORATION, SETTINGS};
use crate::{
    engine::GameContext,
    mode::{Flow, InputEvent, Key, Mode, Surface},
};

const ITEMS: [&str; 5] = ["New Game", "Continue", "New Game+", "Settings", "Quit"];

pub struct MainMenuMode {
    menu:    Menu,
    message: Option<String>,
    next:    Option<String>,
    quit:    bool,
}

impl Default for MainMenuMode {
    fn default() -> Self {
        Self::new()
    }
}

impl MainMenuMode {
    pub fn new() -> Self {
        Self { menu: Menu::new(&ITEMS), message: None, next: None, quit: false }
    }

    fn activate(&mut self, ctx: &mut GameContext) {
        match self.menu.selected() {
            "New Game" => {
                ctx.new_game();
                self.next = Some(EXPLORATION.into());
            }
            "Continue" => {
                if ctx.continue_game() {
                    self.next = Some(EXPLORATION.into());
                } else {
                    self.message = Some("No saved game to continue.".into());
                }
            }
            "New Game+" => {
                if ctx.new_game_plus() {
                    self.next = Some(EXPLORATION.into());
                } else {
                    self.message = Some("Finish the story to unlock New Game+.".into());
                }
            }
            "Settings" => self.next = Some(SETTINGS.into()),
            "Quit" => self.quit = true,
            _ => {}
        }
    }
}

impl Mode<GameContext> for MainMenuMode {
    fn enter(&mut self, _previous: Option<&str>, _ctx: &mut GameContext) {
        self.menu.reset();
        self.message = None;
        self.next = None;
        self.quit = false;
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        match event {
            InputEvent::Key(Key::Up) => self.menu.up(),
            InputEvent::Key(Key::Down) => self.menu.down(),
            InputEvent::Key(Key::Confirm) => self.activate(ctx),
            InputEvent::Key(Key::Back) => self.quit = true,
            _ => {}
        }
    }

    fn update(&mut self, _dt: f64, _ctx: &mut GameContext) -> Flow {
        if self.quit {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }

    fn draw(&self, ctx: &GameContext, surface: &mut dyn Surface) {
        surface.text("Dragon Haven Cafe");
        self.menu.draw(surface);
        if ctx.saves.has_any_saves() {
            surface.text("(saved games available)");
        }
        if let Some(message) = &self.message {
            surface.text(message);
        }
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
