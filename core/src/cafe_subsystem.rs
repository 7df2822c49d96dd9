//! Cafe service: daily phase, reputation and today's service stats.

use crate::{
    clock::ClockEvent,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;

pub const MAX_REPUTATION: i32 = 500;

// Reputation change per customer, indexed by satisfaction 1..=5.
const REPUTATION_BY_SATISFACTION: [i32; 5] = [-5, -5, 0, 3, 5];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CafePhase {
    #[default]
    Closed,
    Prep,
    Service,
    Cleanup,
}

impl CafePhase {
    /// Phase for `hour`: one hour of prep before opening and one hour of
    /// cleanup after closing.
    pub fn for_hour(hour: f64, open: f64, close: f64) -> Self {
        if hour >= open - 1.0 && hour < open {
            CafePhase::Prep
        } else if hour >= open && hour < close {
            CafePhase::Service
        } else if hour >= close && hour < close + 1.0 {
            CafePhase::Cleanup
        } else {
            CafePhase::Closed
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceStats {
    pub customers_served:     u32,
    pub customers_left:       u32,
    pub gold_earned:          u32,
    pub total_satisfaction:   u32,
}

impl ServiceStats {
    pub fn average_satisfaction(&self) -> f64 {
        if self.customers_served == 0 {
            return 0.0;
        }
        f64::from(self.total_satisfaction) / f64::from(self.customers_served)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CafeState {
    pub state:             CafePhase,
    pub current_menu:      Vec<String>,
    pub today_stats:       ServiceStats,
    pub reputation:        i32,
    pub cafe_level:        u32,
    pub day_skipped:       bool,
    pub service_completed: bool,
}

impl Default for CafeState {
    fn default() -> Self {
        Self {
            state:             CafePhase::Closed,
            current_menu:      Vec::new(),
            today_stats:       ServiceStats::default(),
            reputation:        0,
            cafe_level:        1,
            day_skipped:       false,
            service_completed: false,
        }
    }
}

pub struct CafeSubsystem {
    pub state: CafeState,
}

impl CafeSubsystem {
    pub fn new() -> Self {
        Self { state: CafeState::default() }
    }

    pub fn reputation(&self) -> i32 {
        self.state.reputation
    }

    pub fn add_reputation(&mut self, delta: i32) -> i32 {
        self.state.reputation = (self.state.reputation + delta).clamp(0, MAX_REPUTATION);
        self.state.reputation
    }

    pub fn sync_to_hour(&mut self, hour: f64, open: f64, close: f64) -> CafePhase {
        let phase = CafePhase::for_hour(hour, open, close);
        if phase != self.state.state {
            log::debug!("cafe phase {:?} -> {phase:?}", self.state.state);
            self.state.state = phase;
        }
        phase
    }

    pub fn set_menu(&mut self, recipes: Vec<String>) {
        self.state.current_menu = recipes;
    }

    /// Record one served customer. `satisfaction` is 1..=5.
    /// Returns the reputation change applied.
    pub fn serve_customer(&mut self, gold: u32, satisfaction: u8) -> i32 {
        let satisfaction = satisfaction.clamp(1, 5);
        let stats = &mut self.state.today_stats;
        stats.customers_served += 1;
        stats.gold_earned = stats.gold_earned.saturating_add(gold);
        stats.total_satisfaction += u32::from(satisfaction);
        let delta = REPUTATION_BY_SATISFACTION[usize::from(satisfaction - 1)];
        self.add_reputation(delta);
        delta
    }

    pub fn customer_left(&mut self) {
        self.state.today_stats.customers_left += 1;
        self.add_reputation(REPUTATION_BY_SATISFACTION[0]);
    }

    /// Close out today's service. Returns false if it was already completed.
    pub fn complete_service(&mut self) -> bool {
        if self.state.service_completed {
            return false;
        }
        self.state.service_completed = true;
        log::info!(
            "cafe service complete: served={} gold={} rep={}",
            self.state.today_stats.customers_served,
            self.state.today_stats.gold_earned,
            self.state.reputation
        );
        true
    }
}

impl Default for CafeSubsystem {
    fn default() -> Self { Self::new() }
}

impl Persistable for CafeSubsystem {
    fn name(&self) -> &'static str { "cafe" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        let mut state = restore_lenient(self.name(), doc, CafeState::default());
        state.reputation = state.reputation.clamp(0, MAX_REPUTATION);
        state.cafe_level = state.cafe_level.max(1);
        self.state = state;
    }

    fn on_clock_event(&mut self, event: &ClockEvent) {
        if let ClockEvent::NewDay { .. } = event {
            self.state.today_stats = ServiceStats::default();
            self.state.service_completed = false;
            self.state.day_skipped = false;
            self.state.state = CafePhase::Closed;
        }
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
