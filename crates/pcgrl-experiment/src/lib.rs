//! PCGRL Experiment: concrete problems and representations for the kernel.
//!
//! This crate ships what the episode controller needs to run end to end:
//! - The binary dungeon problem and the grid analysis it scores with
//! - Narrow, wide and turtle representations sharing per-agent cursors
//! - A registry mapping names to implementations
//! - A seeded random-policy runner with JSON results

pub mod analysis;
pub mod problems;
pub mod registry;
pub mod reps;
pub mod results;
pub mod runner;
