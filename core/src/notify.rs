//! Listener dispatch with per-listener fault isolation.
//!
//! RULE: one failing listener never stops the others. Listeners run in
//! registration order; an `Err` or a panic is logged and dispatch moves on.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

pub type ListenerFn<E> = Box<dyn FnMut(&E) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct Notifier<E> {
    topic:     &'static str,
    next_id:   u64,
    listeners: Vec<(ListenerId, ListenerFn<E>)>,
}

impl<E> Notifier<E> {
    pub fn new(topic: &'static str) -> Self {
        Self { topic, next_id: 0, listeners: Vec::new() }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&E) -> anyhow::Result<()> + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Invoke every listener with `event`. Returns how many failed.
    pub fn dispatch(&mut self, event: &E) -> usize {
        let mut failures = 0;
        for (_, listener) in self.listeners.iter_mut() {
            if !run_isolated(self.topic, || listener(event)) {
                failures += 1;
            }
        }
        failures
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("topic", &self.topic)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Run one callback, converting an error or a panic into a log line.
/// Returns `true` when the callback completed successfully.
pub fn run_isolated<F>(topic: &str, callback: F) -> bool
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::warn!("{topic} listener failed: {e:#}");
            false
        }
        Err(_) => {
            log::error!("{topic} listener panicked");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn failing_listener_does_not_stop_the_rest() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut notifier: Notifier<u32> = Notifier::new("test");

        let first = Rc::clone(&seen);
        notifier.subscribe(move |v| {
            first.borrow_mut().push(("first", *v));
            Ok(())
        });
        notifier.subscribe(|_| anyhow::bail!("boom"));
        notifier.subscribe(|_| panic!("listener panic"));
        let last = Rc::clone(&seen);
        notifier.subscribe(move |v| {
            last.borrow_mut().push(("last", *v));
            Ok(())
        });

        let failures = notifier.dispatch(&7);
        assert_eq!(failures, 2);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("last", 7)]);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let mut notifier: Notifier<()> = Notifier::new("test");
        let a = notifier.subscribe(|_| Ok(()));
        notifier.subscribe(|_| Ok(()));
        assert!(notifier.unsubscribe(a));
        assert!(!notifier.unsubscribe(a));
        assert_eq!(notifier.len(), 1);
    }
}
