//! PCGRL Kernel: turn-based multi-agent editing of a shared tile grid
//!
//! This crate implements the episode controller for multi-agent procedural
//! content generation. Agents take turns editing one grid in a freshly
//! shuffled order every step. Episodes are bounded by a change budget and an
//! iteration budget, successful edits are tracked in a heatmap, and an
//! optional negative-switch mode hands the grid to the next agent whenever
//! one of them is penalized.
//!
//! What a good grid looks like is a [`Problem`]; how actions become edits is
//! a [`Representation`]. The controller drives both without interpreting
//! either.

pub mod budget;
pub mod config;
pub mod env;
pub mod heatmap;
pub mod ledger;
pub mod observation;
pub mod problem;
pub mod render;
pub mod representation;
pub mod scheduler;
pub mod spaces;
pub mod tiles;

pub use budget::Budget;
pub use config::{EnvConfig, Params, ParamsExt};
pub use env::{EPISODE_REWARD_KEY, Info, PcgrlEnv, StepResult, TurnOutcome};
pub use heatmap::Heatmap;
pub use ledger::RewardLedger;
pub use observation::{HEATMAP_KEY, ObsValue, Observation};
pub use problem::{DebugInfo, Problem, Stats};
pub use render::{RenderMode, RenderOutput, RgbImage, Viewer};
pub use representation::{Edit, Representation};
pub use scheduler::TurnScheduler;
pub use spaces::{Action, ActionSpace, ObservationSpace};
pub use tiles::{NameMap, TileMap};
