//! Time management for the simulation
//!
//! The simulation operates in discrete ticks, one simulated minute each, for a
//! fixed budget of ticks. This module provides deterministic time advancement.

use crate::core::Tick;
use serde::{Deserialize, Serialize};

/// Tracks the current tick against a fixed tick budget
///
/// Ticks are numbered from 0. The tick being processed is `current_tick()`;
/// `advance_tick()` is called once all phases of that tick have run.
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::TimeManager;
///
/// let mut time = TimeManager::new(3);
/// assert_eq!(time.current_tick(), 0);
/// assert!(!time.is_exhausted());
///
/// time.advance_tick();
/// time.advance_tick();
/// time.advance_tick();
/// assert!(time.is_exhausted());
/// assert_eq!(time.ticks_elapsed(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeManager {
    /// Tick currently being processed (== ticks completed so far)
    current_tick: Tick,
    /// Total number of ticks this run may execute
    tick_budget: usize,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Panics
    /// Panics if `tick_budget` is zero. Configuration validation rejects a
    /// zero budget before a TimeManager is built.
    pub fn new(tick_budget: usize) -> Self {
        assert!(tick_budget > 0, "tick_budget must be positive");
        Self {
            current_tick: 0,
            tick_budget,
        }
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// The tick currently being processed
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Number of ticks fully processed so far
    pub fn ticks_elapsed(&self) -> usize {
        self.current_tick
    }

    /// Ticks left before the budget runs out
    pub fn ticks_remaining(&self) -> usize {
        self.tick_budget.saturating_sub(self.current_tick)
    }

    /// True once every tick in the budget has been processed
    pub fn is_exhausted(&self) -> bool {
        self.current_tick >= self.tick_budget
    }

    /// Configured tick budget
    pub fn tick_budget(&self) -> usize {
        self.tick_budget
    }
}
