//! Cafe service. The clock keeps running; service ends when the player
//! leaves or the cafe closes.

use super::{EXPLORATION, PAUSE_MENU};
use crate::{
    cafe_subsystem::CafeSubsystem,
    engine::GameContext,
    mode::{Flow, InputEvent, Key, Mode, Surface},
};

/// Satisfaction of a customer served straight away.
const PROMPT_SATISFACTION: u8 = 4;

pub struct CafeServiceMode {
    served_now: u32,
    message:    Option<String>,
    next:       Option<String>,
}

impl Default for CafeServiceMode {
    fn default() -> Self {
        Self::new()
    }
}

impl CafeServiceMode {
    pub fn new() -> Self {
        Self { served_now: 0, message: None, next: None }
    }

    fn close_service(&mut self, ctx: &mut GameContext) {
        if ctx.finish_service() {
            log::info!("day={} cafe service complete", ctx.clock.current_day());
        }
        self.next = Some(EXPLORATION.into());
    }
}

impl Mode<GameContext> for CafeServiceMode {
    fn enter(&mut self, previous: Option<&str>, ctx: &mut GameContext) {
        self.next = None;
        if previous != Some(PAUSE_MENU) {
            self.served_now = 0;
            self.message = None;
        }
        ctx.sync_cafe();
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut GameContext) {
        let InputEvent::Key(key) = event else { return };
        match key {
            Key::Confirm => {
                if ctx.clock.is_cafe_open() {
                    let gold = ctx.serve_customer(PROMPT_SATISFACTION);
                    self.served_now += 1;
                    self.message = Some(format!("Customer served (+{gold}g)"));
                }
            }
            Key::Cafe | Key::Back => self.close_service(ctx),
            Key::Pause => self.next = Some(PAUSE_MENU.into()),
            _ => {}
        }
    }

    fn update(&mut self, dt: f64, ctx: &mut GameContext) -> Flow {
        ctx.advance_time(dt);
        ctx.sync_cafe();
        if !ctx.clock.is_cafe_open() && self.next.is_none() {
            self.close_service(ctx);
        }
        ctx.record_playtime(dt);
        Flow::Continue
    }

    fn draw(&self, ctx: &GameContext, surface: &mut dyn Surface) {
        surface.text(&format!("Cafe service - {}", ctx.clock.formatted_time()));
        if let Some(cafe) = ctx.subsystem::<CafeSubsystem>() {
            let stats = &cafe.state.today_stats;
            surface.text(&format!(
                "Served {} | Gold {} | Reputation {}",
                stats.customers_served,
                stats.gold_earned,
                cafe.reputation(),
            ));
            surface.text(&format!("Menu: {}", cafe.state.current_menu.join(", ")));
        }
        if let Some(message) = &self.message {
            surface.text(message);
        }
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}
