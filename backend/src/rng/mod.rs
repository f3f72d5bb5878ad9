//! Deterministic random number generation
//!
//! All randomness in the crate goes through `RngManager`.

mod xorshift;

pub use xorshift::RngManager;
