//! Settings screen. Changes apply at once; leaving writes the settings file.

use super::{Menu, MAIN_MENU};
use crate::{
    engine::GameContext,
    mode::{Flow, InputEvent, Key, Mode, Surface},
    settings::VolumeChannel,
};

const ITEMS: [&str; 8] = [
    "Master Volume",
    "SFX Volume",
    "Music Volume",
    "Game Speed",
    "Cooking Difficulty",
    "Fullscreen",
    "Reset Defaults",
    "Back",
];

const VOLUME_STEP: i16 = 10;

pub struct SettingsMode {
    menu:      Menu,
    return_to: String,
    next:      Option<String>,
}

impl Default for SettingsMode {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsMode {
    pub fn new() -> Self {
        Self { menu: Menu::new(&ITEMS), return_to: MAIN_MENU.into(), next: None }
    }

    fn adjust(&mut self, ctx: &mut GameContext, forward: bool) {
        let step = if forward { VOLUME_STEP } else { -VOLUME_STEP };
        let settings = &mut ctx.settings;
        match self.menu.selected() {
            "Master Volume" => { settings.adjust_volume(VolumeChannel::Master, step); }
            "SFX Volume" => { settings.adjust_volume(VolumeChannel::Sfx, step); }
            "Music Volume" => { settings.adjust_volume(VolumeChannel::Music, step); }
            "Game Speed" => { settings.cycle_game_speed(forward); }
            "Cooking Difficulty" => { settings.toggle_difficulty(); }
            "Fullscreen" => settings.fullscreen = !settings.fullscreen,
            _ => return,
        }
        ctx.apply_settings();
    }

    fn reset(&mut self, ctx: &mut GameContext) {
        ctx.settings.reset();
        ctx.apply_settings();
    }

    fn leave(&mut self, ctx: &mut GameContext) {
        if ctx.settings_path.is_some() && !ctx.save_settings() {
            log::warn!("settings could not be saved; changes last for this session only");
        }
        self.next = Some(self.return_to.clone());
    }
}

impl Mode<GameContext> for SettingsMode {
    fn enter(&mut self, previous: Option<&str>, _ctx: &mut GameContext) {
        self.return_to = previous.unwrap_or(MAIN_MENU).to_string();
        self.menu.reset();
        self.next = None;
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        match event {
            InputEvent::Key(Key::Up) => self.menu.up(),
            InputEvent::Key(Key::Down) => self.menu.down(),
            InputEvent::Key(Key::Left) => self.adjust(ctx, false),
            InputEvent::Key(Key::Right) => self.adjust(ctx, true),
            InputEvent::Key(Key::Confirm) => match self.menu.selected() {
                "Reset Defaults" => self.reset(ctx),
                "Back" => self.leave(ctx),
                _ => self.adjust(ctx, true),
            },
            InputEvent::Key(Key::Delete) => self.reset(ctx),
            InputEvent::Key(Key::Back) => self.leave(ctx),
            _ => {}
        }
    }

    fn update(&mut self, _dt: f64, _ctx: &mut GameContext) -> Flow {
        Flow::Continue
    }

    fn draw(&self, ctx: &GameContext, surface: &mut dyn Surface) {
        let s = &ctx.settings;
        surface.text("Settings");
        surface.text(&format!(
            "Master {} | SFX {} | Music {} | Speed {:.2}x | Cooking {:?} | Fullscreen {}",
            s.master_volume, s.sfx_volume, s.music_volume, s.game_speed, s.cooking_difficulty, s.fullscreen,
        ));
        self.menu.draw(surface);
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
