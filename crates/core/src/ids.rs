//! Monotonic item id allocation.

use crate::error::GameError;
use crate::types::ItemId;

/// Hands out `ItemId`s in strictly increasing order. Never moves backwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails once the counter has reached `u64::MAX`; the counter is left as is.
    pub fn allocate(&mut self) -> Result<ItemId, GameError> {
        let next = self.next.checked_add(1).ok_or(GameError::IdSpaceExhausted)?;
        let id = ItemId(self.next);
        self.next = next;
        Ok(id)
    }

    /// The value the next `allocate` call will use.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Guarantees the next id is strictly greater than `id`.
    pub fn advance_past(&mut self, id: ItemId) {
        self.advance_to(id.0.saturating_add(1));
    }

    pub fn advance_to(&mut self, next: u64) {
        self.next = self.next.max(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequentially_from_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(), Ok(ItemId(1)));
        assert_eq!(ids.allocate(), Ok(ItemId(2)));
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn advance_past_never_regresses() {
        let mut ids = IdAllocator::new();
        ids.advance_past(ItemId(10));
        assert_eq!(ids.peek(), 11);
        ids.advance_past(ItemId(4));
        assert_eq!(ids.peek(), 11);
        ids.advance_to(2);
        assert_eq!(ids.allocate(), Ok(ItemId(11)));
    }

    #[test]
    fn exhausted_counter_reports_instead_of_wrapping() {
        let mut ids = IdAllocator::new();
        ids.advance_to(u64::MAX - 1);
        assert_eq!(ids.allocate(), Ok(ItemId(u64::MAX - 1)));
        assert_eq!(ids.allocate(), Err(GameError::IdSpaceExhausted));
        assert_eq!(ids.allocate(), Err(GameError::IdSpaceExhausted));
        assert_eq!(ids.peek(), u64::MAX);
    }
}
