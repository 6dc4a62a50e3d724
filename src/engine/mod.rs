//! Deterministic simulation engine primitives.
//!
//! Currently a single concern: reproducible random number generation
//! (PCG with partitioned seeds). The lake model itself lives in
//! [`crate::lake`].

pub mod rng;

pub use rng::SimRng;
