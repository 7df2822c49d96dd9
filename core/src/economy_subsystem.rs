use crate::{
    clock::ClockEvent,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::{Day, Document},
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

/// Only the most recent transactions are kept.
pub const MAX_TRANSACTIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind:        TransactionKind,
    pub amount:      u32,
    pub description: String,
    pub day:         Day,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EconomyState {
    pub current_day:    Day,
    pub daily_income:   u32,
    pub daily_expenses: u32,
    pub total_earned:   u64,
    pub total_spent:    u64,
    pub upgrade_counts: BTreeMap<String, u32>,
    pub transactions:   Vec<Transaction>,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            current_day:    1,
            daily_income:   0,
            daily_expenses: 0,
            total_earned:   0,
            total_spent:    0,
            upgrade_counts: BTreeMap::new(),
            transactions:   Vec::new(),
        }
    }
}

pub struct EconomySubsystem {
    pub state: EconomyState,
}

impl EconomySubsystem {
    pub fn new() -> Self {
        Self { state: EconomyState::default() }
    }

    pub fn record_income(&mut self, amount: u32, description: &str) {
        self.state.daily_income = self.state.daily_income.saturating_add(amount);
        self.state.total_earned += u64::from(amount);
        self.push(TransactionKind::Income, amount, description);
    }

    pub fn record_expense(&mut self, amount: u32, description: &str) {
        self.state.daily_expenses = self.state.daily_expenses.saturating_add(amount);
        self.state.total_spent += u64::from(amount);
        self.push(TransactionKind::Expense, amount, description);
    }

    pub fn record_upgrade(&mut self, upgrade_id: &str) -> u32 {
        let count = self.state.upgrade_counts.entry(upgrade_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn net_today(&self) -> i64 {
        i64::from(self.state.daily_income) - i64::from(self.state.daily_expenses)
    }

    fn push(&mut self, kind: TransactionKind, amount: u32, description: &str) {
        self.state.transactions.push(Transaction {
            kind,
            amount,
            description: description.to_string(),
            day: self.state.current_day,
        });
        let excess = self.state.transactions.len().saturating_sub(MAX_TRANSACTIONS);
        self.state.transactions.drain(..excess);
    }
}

impl Default for EconomySubsystem {
    fn default() -> Self { Self::new() }
}

impl Persistable for EconomySubsystem {
    fn name(&self) -> &'static str { "economy" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        let mut state = restore_lenient(self.name(), doc, EconomyState::default());
        state.current_day = state.current_day.max(1);
        let excess = state.transactions.len().saturating_sub(MAX_TRANSACTIONS);
        state.transactions.drain(..excess);
        self.state = state;
    }

    fn on_clock_event(&mut self, event: &ClockEvent) {
        if let ClockEvent::NewDay { day } = event {
            log::debug!(
                "day={day} economy closed previous day: income={} expenses={}",
                self.state.daily_income, self.state.daily_expenses
            );
            self.state.current_day = *day;
            self.state.daily_income = 0;
            self.state.daily_expenses = 0;
        }
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
