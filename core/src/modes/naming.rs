//! Naming the freshly hatched dragon. Cancelling keeps the default name.

use super::{EXPLORATION, MAIN_MENU};
use crate::{
    dragon_subsystem::{DragonSubsystem, DEFAULT_NAME, NAME_MAX_LEN},
    engine::GameContext,
    mode::{Flow, InputEvent, Key, Mode, Surface},
};

pub struct DragonNamingMode {
    buffer:    String,
    error:     Option<String>,
    return_to: String,
    next:      Option<String>,
}

impl Default for DragonNamingMode {
    fn default() -> Self {
        Self::new()
    }
}

impl DragonNamingMode {
    pub fn new() -> Self {
        Self {
            buffer:    String::new(),
            error:     None,
            return_to: EXPLORATION.into(),
            next:      None,
        }
    }

    fn commit(&mut self, ctx: &mut GameContext, name: &str) {
        let Some(dragon) = ctx.subsystem_mut::<DragonSubsystem>() else {
            self.next = Some(self.return_to.clone());
            return;
        };
        match dragon.set_name(name) {
            Ok(()) => {
                log::info!("dragon named '{}'", name.trim());
                self.next = Some(self.return_to.clone());
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }
}

impl Mode<GameContext> for DragonNamingMode {
    fn enter(&mut self, previous: Option<&str>, _ctx: &mut GameContext) {
        self.return_to = previous
            .filter(|p| *p != MAIN_MENU)
            .unwrap_or(EXPLORATION)
            .to_string();
        self.buffer.clear();
        self.error = None;
        self.next = None;
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        match event {
            InputEvent::Text(c) if !c.is_control() => {
                if self.buffer.chars().count() < NAME_MAX_LEN {
                    self.buffer.push(*c);
                    self.error = None;
                }
            }
            InputEvent::Key(Key::Backspace) => {
                self.buffer.pop();
            }
            InputEvent::Key(Key::Confirm) => {
                let name = self.buffer.clone();
                self.commit(ctx, &name);
            }
            InputEvent::Key(Key::Back) => self.commit(ctx, DEFAULT_NAME),
            _ => {}
        }
    }

    fn update(&mut self, _dt: f64, _ctx: &mut GameContext) -> Flow {
        Flow::Continue
    }

    fn draw(&self, _ctx: &GameContext, surface: &mut dyn Surface) {
        surface.text("Your dragon has hatched! What will you call it?");
        surface.text(&format!("Name: {}_", self.buffer));
        if let Some(error) = &self.error {
            surface.text(error);
        }
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
