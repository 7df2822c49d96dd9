//! Screen/mode state machine.
//!
//! RULES:
//!   - At most one mode is active. The machine is inert until the first
//!     set_mode().
//!   - A faded switch runs fade-out, switch, fade-in. The switch happens
//!     exactly once, on its own update.
//!   - Input is swallowed for the whole transition; update() keeps the
//!     transition moving and does not reach any mode.
//!   - Modes request transitions through take_next_mode(), read once per
//!     update after the active mode has run.
//!   - Unknown mode names are logged and ignored.

use crate::{config::TransitionConfig, error::HavenError};
use std::collections::HashMap;

// ── Input and output surfaces ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Back,
    Backspace,
    Delete,
    Pause,
    Inventory,
    RecipeBook,
    DragonStatus,
    Interact,
    Cafe,
    Sleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    Text(char),
}

/// Whether the frame loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Where modes draw. Headless front-ends collect the text lines.
pub trait Surface {
    fn text(&mut self, line: &str);
    /// Full-screen black overlay at `alpha` (0..=255).
    fn overlay(&mut self, alpha: u8);
}

/// A surface that keeps everything drawn to it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TextSurface {
    pub lines:   Vec<String>,
    pub overlay: Option<u8>,
}

impl Surface for TextSurface {
    fn text(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn overlay(&mut self, alpha: u8) {
        self.overlay = Some(alpha);
    }
}

// ── Mode contract ─────────────────────────────────────────────────────────────

/// The contract every screen mode fulfills. `C` is the context handed to
/// every hook (the game context in production).
pub trait Mode<C> {
    /// Becoming active. `previous` is the mode that was active before.
    fn enter(&mut self, _previous: Option<&str>, _ctx: &mut C) {}

    /// Ceasing to be active.
    fn exit(&mut self, _ctx: &mut C) {}

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut C);

    fn update(&mut self, dt: f64, ctx: &mut C) -> Flow;

    fn draw(&self, ctx: &C, surface: &mut dyn Surface);

    /// A requested transition target, handed over once.
    fn take_next_mode(&mut self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    FadeOut,
    Switch,
    FadeIn,
}

#[derive(Debug, Clone)]
struct Transition {
    target: String,
    phase:  TransitionPhase,
}

pub struct ModeMachine<C> {
    modes:        HashMap<String, Box<dyn Mode<C>>>,
    current:      Option<String>,
    previous:     Option<String>,
    transition:   Option<Transition>,
    fade_alpha:   f64,
    fade_speed:   f64,
    fade_ceiling: f64,
}

impl<C> ModeMachine<C> {
    pub fn new(config: &TransitionConfig) -> Self {
        let defaults = TransitionConfig::default();
        let usable = |v: f64| v.is_finite() && v > 0.0;
        Self {
            modes:        HashMap::new(),
            current:      None,
            previous:     None,
            transition:   None,
            fade_alpha:   0.0,
            fade_speed:   if usable(config.fade_speed) { config.fade_speed } else { defaults.fade_speed },
            fade_ceiling: if usable(config.fade_ceiling) { config.fade_ceiling.min(255.0) } else { defaults.fade_ceiling },
        }
    }

    /// Register under `name`, replacing any mode already registered there.
    pub fn register(&mut self, name: &str, mode: Box<dyn Mode<C>>) {
        if self.modes.insert(name.to_string(), mode).is_some() {
            log::warn!("mode '{name}' re-registered; previous instance replaced");
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    fn require(&self, name: &str) -> Result<(), HavenError> {
        if self.is_registered(name) {
            Ok(())
        } else {
            Err(HavenError::ModeNotRegistered { name: name.to_string() })
        }
    }

    /// Switch to `name`, immediately or through a fade.
    pub fn set_mode(&mut self, name: &str, faded: bool, ctx: &mut C) {
        if let Err(e) = self.require(name) {
            log::warn!("set_mode ignored: {e}");
            return;
        }
        if faded {
            self.start_transition(name);
        } else {
            self.transition = None;
            self.fade_alpha = 0.0;
            self.switch_to(name, ctx);
        }
    }

    /// Begin (or retarget) a faded switch to `name`. A retarget keeps the
    /// current opacity and fades out from there. Returns false for unknown names.
    pub fn start_transition(&mut self, name: &str) -> bool {
        if let Err(e) = self.require(name) {
            log::warn!("transition ignored: {e}");
            return false;
        }
        match self.transition.as_mut() {
            Some(transition) => {
                log::debug!("transition retargeted {} -> {name}", transition.target);
                transition.target = name.to_string();
                if transition.phase == TransitionPhase::FadeIn {
                    transition.phase = TransitionPhase::FadeOut;
                }
            }
            None => {
                self.transition = Some(Transition {
                    target: name.to_string(),
                    phase:  TransitionPhase::FadeOut,
                });
            }
        }
        true
    }

    fn switch_to(&mut self, name: &str, ctx: &mut C) {
        if let Some(mode) = self.current.as_deref().and_then(|c| self.modes.get_mut(c)) {
            mode.exit(ctx);
        }
        self.previous = self.current.replace(name.to_string());
        log::debug!("mode {:?} -> {name}", self.previous);
        if let Some(mode) = self.modes.get_mut(name) {
            mode.enter(self.previous.as_deref(), ctx);
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent, ctx: &mut C) -> bool {
        if self.transition.is_some() {
            return false;
        }
        let Some(mode) = self.current.as_deref().and_then(|c| self.modes.get_mut(c)) else {
            return false;
        };
        mode.handle_event(event, ctx);
        true
    }

    pub fn update(&mut self, dt: f64, ctx: &mut C) -> Flow {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        if self.transition.is_some() {
            self.advance_transition(dt, ctx);
            return Flow::Continue;
        }
        let Some(mode) = self.current.as_deref().and_then(|c| self.modes.get_mut(c)) else {
            return Flow::Continue;
        };
        let flow = mode.update(dt, ctx);
        let next = mode.take_next_mode();
        if let Some(next) = next {
            self.start_transition(&next);
        }
        flow
    }

    fn advance_transition(&mut self, dt: f64, ctx: &mut C) {
        let Some(transition) = self.transition.as_mut() else { return };
        match transition.phase {
            TransitionPhase::FadeOut => {
                self.fade_alpha = (self.fade_alpha + self.fade_speed * dt).min(self.fade_ceiling);
                if self.fade_alpha >= self.fade_ceiling {
                    transition.phase = TransitionPhase::Switch;
                }
            }
            TransitionPhase::Switch => {
                transition.phase = TransitionPhase::FadeIn;
                let target = transition.target.clone();
                self.switch_to(&target, ctx);
            }
            TransitionPhase::FadeIn => {
                self.fade_alpha = (self.fade_alpha - self.fade_speed * dt).max(0.0);
                if self.fade_alpha <= 0.0 {
                    self.transition = None;
                }
            }
        }
    }

    pub fn draw(&self, ctx: &C, surface: &mut dyn Surface) {
        if let Some(mode) = self.current.as_deref().and_then(|c| self.modes.get(c)) {
            mode.draw(ctx, surface);
        }
        if self.fade_alpha > 0.0 {
            surface.overlay(self.fade_alpha.round().clamp(0.0, 255.0) as u8);
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn current_mode_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn previous_mode_name(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn phase(&self) -> Option<TransitionPhase> {
        self.transition.as_ref().map(|t| t.phase)
    }

    pub fn transition_target(&self) -> Option<&str> {
        self.transition.as_ref().map(|t| t.target.as_str())
    }

    pub fn fade_alpha(&self) -> f64 {
        self.fade_alpha
    }
}
