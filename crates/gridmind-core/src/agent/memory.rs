//! Bounded experience memory.

use std::collections::VecDeque;

use crate::direction::Direction;

/// One remembered step: what the agent saw and felt, what it did, and what followed.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub perception: Vec<f64>,
    pub vitals: Vec<f64>,
    pub action: Direction,
    pub reward: f64,
    pub next_perception: Vec<f64>,
    pub next_vitals: Vec<f64>,
}

/// FIFO buffer of experiences; the oldest record is evicted once capacity is reached.
#[derive(Debug, Clone)]
pub struct Memory {
    capacity: usize,
    records: VecDeque<Experience>,
}

impl Memory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn remember(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(experience);
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> + '_ {
        self.records.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Experience> {
        self.records.back()
    }
}
