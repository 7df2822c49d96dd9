//! Save slot browser. Opened from the main menu it starts in Load;
//! opened from the game it starts in Save.

use super::{EXPLORATION, MAIN_MENU};
use crate::{
    engine::GameContext,
    mode::{Flow, InputEvent, Key, Mode, Surface},
    store::SlotSummary,
    types::SlotId,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveLoadAction {
    Save,
    Load,
}

pub struct SaveLoadMode {
    action:    SaveLoadAction,
    slots:     BTreeMap<SlotId, Option<SlotSummary>>,
    selected:  SlotId,
    return_to: String,
    message:   Option<String>,
    next:      Option<String>,
}

impl Default for SaveLoadMode {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveLoadMode {
    pub fn new() -> Self {
        Self {
            action:    SaveLoadAction::Save,
            slots:     BTreeMap::new(),
            selected:  1,
            return_to: MAIN_MENU.into(),
            message:   None,
            next:      None,
        }
    }

    pub fn action(&self) -> SaveLoadAction {
        self.action
    }

    pub fn selected_slot(&self) -> SlotId {
        self.selected
    }

    fn refresh(&mut self, ctx: &GameContext) {
        self.slots = ctx.saves.list_summaries();
    }

    fn step(&mut self, ctx: &GameContext, forward: bool) {
        let count = ctx.saves.slot_count().max(1);
        self.selected = if forward {
            self.selected % count + 1
        } else if self.selected <= 1 {
            count
        } else {
            self.selected - 1
        };
    }

    fn confirm(&mut self, ctx: &mut GameContext) {
        let slot = self.selected;
        match self.action {
            SaveLoadAction::Save => {
                self.message = Some(if ctx.save_game(slot) {
                    format!("Saved to slot {slot}.")
                } else {
                    format!("Could not save to slot {slot}.")
                });
                self.refresh(ctx);
            }
            SaveLoadAction::Load => {
                if ctx.load_game(slot) {
                    self.next = Some(EXPLORATION.into());
                } else {
                    self.message = Some(format!("Slot {slot} is empty or unreadable."));
                }
            }
        }
    }
}

impl Mode<GameContext> for SaveLoadMode {
    fn enter(&mut self, previous: Option<&str>, ctx: &mut GameContext) {
        self.return_to = previous.unwrap_or(MAIN_MENU).to_string();
        self.action = if self.return_to == MAIN_MENU {
            SaveLoadAction::Load
        } else {
            SaveLoadAction::Save
        };
        self.selected = 1;
        self.message = None;
        self.next = None;
        self.refresh(ctx);
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        let InputEvent::Key(key) = event else { return };
        match key {
            Key::Up => self.step(ctx, false),
            Key::Down => self.step(ctx, true),
            Key::Left | Key::Right => {
                self.action = match self.action {
                    SaveLoadAction::Save => SaveLoadAction::Load,
                    SaveLoadAction::Load => SaveLoadAction::Save,
                };
            }
            Key::Confirm => self.confirm(ctx),
            Key::Delete => {
                let slot = self.selected;
                if ctx.saves.delete(slot) {
                    self.message = Some(format!("Slot {slot} deleted."));
                }
                self.refresh(ctx);
            }
            Key::Back => self.next = Some(self.return_to.clone()),
            _ => {}
        }
    }

    fn update(&mut self, _dt: f64, _ctx: &mut GameContext) -> Flow {
        Flow::Continue
    }

    fn draw(&self, _ctx: &GameContext, surface: &mut dyn Surface) {
        surface.text(match self.action {
            SaveLoadAction::Save => "Save Game",
            SaveLoadAction::Load => "Load Game",
        });
        for (slot, summary) in &self.slots {
            let marker = if *slot == self.selected { ">" } else { " " };
            let line = match summary {
                Some(s) => format!(
                    "{marker} Slot {slot}: Day {} ({}) {}g {} [{:.0} min]",
                    s.day,
                    s.season,
                    s.gold,
                    if s.dragon_name.is_empty() { "-" } else { s.dragon_name.as_str() },
                    s.playtime_seconds / 60.0,
                ),
                None => format!("{marker} Slot {slot}: empty"),
            };
            surface.text(&line);
        }
        if let Some(message) = &self.message {
            surface.text(message);
        }
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
