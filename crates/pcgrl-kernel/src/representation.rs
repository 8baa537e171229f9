//! Representation trait: how agent actions become grid edits.

use anyhow::Result;

use crate::config::Params;
use crate::observation::Observation;
use crate::render::RgbImage;
use crate::spaces::{Action, ActionSpace, ObservationSpace};
use crate::tiles::TileMap;

/// Outcome of applying one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edit {
    /// Number of cells whose tile actually changed (0 when nothing changed).
    pub change: u64,
    /// Column of the edited cell.
    pub x: usize,
    /// Row of the edited cell.
    pub y: usize,
}

impl Edit {
    /// An action that left the grid untouched.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at(change: u64, x: usize, y: usize) -> Self {
        Self { change, x, y }
    }

    pub fn changed(&self) -> bool {
        self.change > 0
    }
}

/// A representation owns the grid and translates actions into edits.
///
/// Examples:
/// - narrow: each agent walks the grid cell by cell and decides one tile
/// - wide: each agent picks any cell and a tile for it
/// - turtle: each agent moves a cursor and paints under it
///
/// The controller is representation-agnostic; validating actions and agent
/// indices is the representation's job.
pub trait Representation: Send {
    /// Unique name for this representation.
    fn name(&self) -> &str;

    /// Action space for a `width × height` grid with `num_tiles` tile types.
    fn get_action_space(&self, width: usize, height: usize, num_tiles: usize) -> ActionSpace;

    /// Observation space for a `width × height` grid with `num_tiles` tile types.
    fn get_observation_space(
        &self,
        num_tiles: usize,
        width: usize,
        height: usize,
    ) -> ObservationSpace;

    /// Reseed the representation's RNG. Returns the seed actually used.
    fn seed(&mut self, seed: Option<u64>) -> u64;

    /// Generate a fresh grid from the tile probabilities (in tile-id order).
    fn reset(&mut self, width: usize, height: usize, probs: &[f64]) -> Result<()>;

    /// Apply `agent`'s action to the grid.
    fn update(&mut self, action: &Action, agent: usize) -> Result<Edit>;

    /// Observation for `agent`.
    fn get_observation(&self, agent: usize) -> Result<Observation>;

    /// Overlay representation state (cursors) on a rendered grid.
    fn render(
        &self,
        img: RgbImage,
        tile_size: usize,
        border_size: (usize, usize),
    ) -> Result<RgbImage>;

    /// Apply options for a `width × height` grid; unknown keys are ignored.
    fn adjust_param(&mut self, width: usize, height: usize, params: &Params) -> Result<()>;

    /// The current grid of tile ids.
    fn map(&self) -> &TileMap;
}
