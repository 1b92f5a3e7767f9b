use std::collections::VecDeque;

use crate::error::{EngineError, Result};
use crate::fingerprint::Fingerprint;

pub const DEFAULT_CAPACITY: usize = 20;

/// Most recent fingerprints, newest first, bounded by `capacity`.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Fingerprint>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::ZeroHistoryCapacity);
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Inserts at the front, evicting the oldest entry on overflow.
    pub fn push(&mut self, fingerprint: Fingerprint) {
        self.entries.push_front(fingerprint);
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains(fingerprint)
    }

    /// 1-based distance from the front to the newest occurrence of
    /// `fingerprint`, or 0 when absent.
    ///
    /// The all-dead fingerprint yields 0 as well: an empty universe repeats
    /// trivially and has no meaningful period.
    pub fn period_of(&self, fingerprint: &Fingerprint) -> usize {
        if fingerprint.is_zero() {
            return 0;
        }
        self.entries
            .iter()
            .position(|entry| entry == fingerprint)
            .map_or(0, |index| index + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn newest(&self) -> Option<&Fingerprint> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(DEFAULT_CAPACITY + 1),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(value: u128) -> Fingerprint {
        Fingerprint::from_u128(value)
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(History::new(0).unwrap_err(), EngineError::ZeroHistoryCapacity);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut history = History::new(3).unwrap();
        for value in 1..=4 {
            history.push(fp(value));
        }
        assert_eq!(history.len(), 3);
        assert!(!history.contains(&fp(1)));
        assert!(history.contains(&fp(4)));
        assert_eq!(history.newest(), Some(&fp(4)));
    }

    #[test]
    fn test_period_is_position_from_front() {
        let mut history = History::default();
        history.push(fp(10));
        history.push(fp(20));
        history.push(fp(30));
        assert_eq!(history.period_of(&fp(30)), 1);
        assert_eq!(history.period_of(&fp(20)), 2);
        assert_eq!(history.period_of(&fp(10)), 3);
        assert_eq!(history.period_of(&fp(99)), 0);
    }

    #[test]
    fn test_empty_universe_has_no_period() {
        let mut history = History::default();
        history.push(Fingerprint::zero());
        assert!(history.contains(&Fingerprint::zero()));
        assert_eq!(history.period_of(&Fingerprint::zero()), 0);
    }

    #[test]
    fn test_clear() {
        let mut history = History::default();
        history.push(fp(1));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
    }
}
