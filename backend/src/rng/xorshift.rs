//! xorshift64* generator used for scenario generation
//!
//! Same seed, same scenario. The generator is only consulted before the tick
//! loop starts; the loop itself never draws random numbers.

use serde::{Deserialize, Serialize};

/// Seeded xorshift64* generator
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(42);
/// let gap = rng.range_inclusive(2, 6);
/// assert!((2..=6).contains(&gap));
///
/// let picked = rng.sample_indices(10, 3);
/// assert_eq!(picked.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a generator; a zero seed is mapped to 1 (xorshift needs a
    /// non-zero state)
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Next raw 64-bit value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform value in `[min, max)`
    ///
    /// # Panics
    /// Panics if `min >= max`
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let span = (max - min) as u64;
        min + (self.next() % span) as i64
    }

    /// Uniform value in `[min, max]`
    ///
    /// # Panics
    /// Panics if `min > max`
    pub fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "min must not exceed max");
        self.range(min, max + 1)
    }

    /// Uniform index in `[0, len)`
    ///
    /// # Panics
    /// Panics if `len == 0`
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty range");
        (self.next() % len as u64) as usize
    }

    /// `count` distinct indices drawn from `[0, len)`, in draw order
    ///
    /// Partial Fisher-Yates shuffle. `count` is capped at `len`.
    pub fn sample_indices(&mut self, len: usize, count: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..len).collect();
        let count = count.min(len);

        for i in 0..count {
            let j = i + self.index(len - i);
            pool.swap(i, j);
        }
        pool.truncate(count);
        pool
    }

    /// Current internal state
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
