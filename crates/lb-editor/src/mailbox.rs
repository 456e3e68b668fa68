//! Single-slot mailboxes for staged commands.
//!
//! A mailbox holds at most one pending value. Posting over a pending value
//! replaces it (last write wins, no queue). Taking a value empties the slot
//! in the same step, so a value is delivered at most once and a second
//! observation without a new post always sees an empty slot.

/// One staging slot.
#[derive(Debug)]
pub struct Mailbox<T> {
    name: &'static str,
    pending: Option<T>,
    posted: u64,
    delivered: u64,
}

impl<T> Mailbox<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: None,
            posted: 0,
            delivered: 0,
        }
    }

    /// Stage `value`. Returns the value it replaced, if one was still
    /// waiting.
    pub fn post(&mut self, value: T) -> Option<T> {
        self.posted += 1;
        let replaced = self.pending.replace(value);
        if replaced.is_some() {
            log::debug!("{}: pending value overwritten before delivery", self.name);
        } else {
            log::trace!("{}: posted", self.name);
        }
        replaced
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Observe and clear in one step.
    pub fn take(&mut self) -> Option<T> {
        let value = self.pending.take()?;
        self.delivered += 1;
        log::trace!("{}: delivered", self.name);
        Some(value)
    }

    /// Take the pending value and hand it to `consume`. The slot is already
    /// empty when `consume` runs, whatever it returns.
    pub fn deliver<R>(&mut self, consume: impl FnOnce(T) -> R) -> Option<R> {
        self.take().map(consume)
    }

    /// Drop a pending value without delivering it.
    pub fn discard(&mut self) -> Option<T> {
        let dropped = self.pending.take();
        if dropped.is_some() {
            log::debug!("{}: pending value discarded", self.name);
        }
        dropped
    }

    /// Total number of posts, including overwritten ones.
    pub fn posted(&self) -> u64 {
        self.posted
    }

    /// Total number of values handed out.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_exactly_once() {
        let mut slot = Mailbox::new("test");
        assert_eq!(slot.post(1), None);
        assert_eq!(slot.take(), Some(1));
        assert_eq!(slot.take(), None, "second observation must see an empty slot");
        assert_eq!(slot.delivered(), 1);
    }

    #[test]
    fn last_write_wins() {
        let mut slot = Mailbox::new("test");
        slot.post("first");
        assert_eq!(slot.post("second"), Some("first"));
        assert_eq!(slot.take(), Some("second"));
        assert_eq!((slot.posted(), slot.delivered()), (2, 1));
    }

    #[test]
    fn slot_is_empty_while_consumer_runs() {
        let mut slot = Mailbox::new("test");
        slot.post(7);
        let seen = slot.deliver(|v| v * 2);
        assert_eq!(seen, Some(14));
        assert!(!slot.is_pending());
        assert_eq!(slot.deliver(|v: i32| v), None);
    }

    #[test]
    fn discard_does_not_count_as_delivery() {
        let mut slot = Mailbox::new("test");
        slot.post(());
        assert_eq!(slot.discard(), Some(()));
        assert_eq!(slot.delivered(), 0);
        assert_eq!(slot.peek(), None);
    }
}
