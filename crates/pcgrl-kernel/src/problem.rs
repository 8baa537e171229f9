//! Problem trait: what a generated grid is scored against.
//!
//! A problem owns the domain semantics of the grid: which tiles exist, what a
//! good level looks like, when generation is finished and how the grid is
//! drawn. The controller only ever sees derived values (stats, rewards,
//! debug info) and never interprets them.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::config::Params;
use crate::render::RgbImage;
use crate::tiles::NameMap;

/// Statistics computed from a grid.
///
/// Treated as an immutable snapshot: the controller diffs the old against the
/// new one and replaces it wholesale after every successful edit.
///
/// Examples:
/// - `regions`: number of connected passable areas
/// - `path-length`: longest shortest path inside a region
pub type Stats = BTreeMap<String, f64>;

/// Per-agent debug information returned alongside each step.
pub type DebugInfo = BTreeMap<String, Value>;

/// A content-generation problem.
///
/// Implementations must be deterministic given their seed: the same grid
/// and the same prior snapshot produce the same stats, reward and
/// termination decision.
pub trait Problem: Send {
    /// Unique name for this problem.
    fn name(&self) -> &str;

    /// Grid width in tiles.
    fn width(&self) -> usize;

    /// Grid height in tiles.
    fn height(&self) -> usize;

    /// Ordered tile type names; a tile id is an index into this list.
    fn tile_types(&self) -> &[String];

    /// Tile used to pad the grid when rendering.
    fn border_tile(&self) -> &str;

    /// Side of one tile in pixels.
    fn tile_size(&self) -> usize;

    /// Border thickness in tiles, `(horizontal, vertical)`.
    fn border_size(&self) -> (usize, usize);

    /// Initial tile distribution by name, used to generate starting grids.
    fn tile_probabilities(&self) -> &BTreeMap<String, f64>;

    /// Reseed any randomness the problem owns.
    fn seed(&mut self, seed: u64);

    /// Start a new episode whose initial grid has the given stats.
    fn reset(&mut self, start_stats: &Stats);

    /// Compute stats for a grid.
    fn get_stats(&self, map: &NameMap) -> Result<Stats>;

    /// Reward for moving from `old` to `new`.
    fn get_reward(&self, new: &Stats, old: &Stats) -> f64;

    /// Whether the grid described by `new` completes the episode.
    fn get_episode_over(&self, new: &Stats, old: &Stats) -> bool;

    /// Debug information for `agent` after moving from `old` to `new`.
    fn get_debug_info(&self, new: &Stats, old: &Stats, agent: usize) -> DebugInfo;

    /// Draw the grid.
    fn render(&self, map: &NameMap) -> Result<RgbImage>;

    /// Apply options; unknown keys are ignored.
    fn adjust_param(&mut self, params: &Params) -> Result<()>;
}
