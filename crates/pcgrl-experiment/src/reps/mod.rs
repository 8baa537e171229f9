//! Concrete representations.
//!
//! All of them edit one shared grid and keep a cursor per agent. The common
//! state lives in [`RepBase`].

pub mod narrow;
pub mod turtle;
pub mod wide;

pub use narrow::NarrowRepresentation;
pub use turtle::TurtleRepresentation;
pub use wide::WideRepresentation;

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use ndarray::Array2;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use pcgrl_kernel::render::{Rgb, outline_tile};
use pcgrl_kernel::{Edit, ObsValue, ObservationSpace, RgbImage, TileMap};

/// Cursor outline colors, cycled by agent index.
const AGENT_COLORS: [Rgb; 6] = [
    [255, 0, 0],
    [0, 0, 255],
    [0, 200, 0],
    [255, 165, 0],
    [160, 32, 240],
    [0, 200, 200],
];

/// Grid, RNG and per-agent cursors shared by the representations.
pub struct RepBase {
    map: TileMap,
    rng: ChaCha8Rng,
    num_tiles: usize,
    /// `(x, y)` per agent
    positions: Vec<(usize, usize)>,
    /// Place cursors randomly on reset instead of at the origin
    random_start: bool,
}

impl RepBase {
    pub fn new(n_agents: usize, random_start: bool) -> Self {
        Self {
            map: TileMap::zeros((0, 0)),
            rng: ChaCha8Rng::seed_from_u64(0),
            num_tiles: 0,
            positions: vec![(0, 0); n_agents],
            random_start,
        }
    }

    pub fn n_agents(&self) -> usize {
        self.positions.len()
    }

    pub fn width(&self) -> usize {
        self.map.ncols()
    }

    pub fn height(&self) -> usize {
        self.map.nrows()
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Number of tile types of the last generated grid.
    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    pub fn random_start(&self) -> bool {
        self.random_start
    }

    pub fn set_random_start(&mut self, random_start: bool) {
        self.random_start = random_start;
    }

    /// Reseed, picking a random seed when none is given. Returns the seed.
    pub fn seed(&mut self, seed: Option<u64>) -> u64 {
        let seed = seed.unwrap_or_else(rand::random);
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        seed
    }

    /// Generate a new grid and place the cursors.
    pub fn reset(&mut self, width: usize, height: usize, probs: &[f64]) -> Result<()> {
        self.map = gen_random_map(&mut self.rng, width, height, probs)?;
        self.num_tiles = probs.len();
        for agent in 0..self.positions.len() {
            let start = if self.random_start {
                self.random_cell()
            } else {
                (0, 0)
            };
            self.positions[agent] = start;
        }
        Ok(())
    }

    pub fn position(&self, agent: usize) -> Result<(usize, usize)> {
        match self.positions.get(agent) {
            Some(&position) => Ok(position),
            None => bail!(
                "agent {} out of range for {} agents",
                agent,
                self.positions.len()
            ),
        }
    }

    pub fn set_position(&mut self, agent: usize, x: usize, y: usize) -> Result<()> {
        let n_agents = self.positions.len();
        match self.positions.get_mut(agent) {
            Some(position) => {
                *position = (x, y);
                Ok(())
            }
            None => bail!("agent {} out of range for {} agents", agent, n_agents),
        }
    }

    /// A uniformly random cell of the current grid.
    pub fn random_cell(&mut self) -> (usize, usize) {
        let (width, height) = (self.width().max(1), self.height().max(1));
        (
            self.rng.random_range(0..width),
            self.rng.random_range(0..height),
        )
    }

    /// Set the tile at `(x, y)`, reporting whether it changed.
    pub fn set_tile(&mut self, x: usize, y: usize, tile: usize) -> Result<Edit> {
        if tile >= self.num_tiles {
            bail!("tile {} out of range for {} tile types", tile, self.num_tiles);
        }
        let (width, height) = (self.width(), self.height());
        let Some(cell) = self.map.get_mut((y, x)) else {
            bail!("cell ({}, {}) outside the {}x{} grid", x, y, width, height);
        };
        let change = u64::from(*cell != tile);
        *cell = tile;
        Ok(Edit::at(change, x, y))
    }

    pub fn map_observation(&self) -> ObsValue {
        ObsValue::Tiles(self.map.clone())
    }

    pub fn position_observation(&self, agent: usize) -> Result<ObsValue> {
        let (x, y) = self.position(agent)?;
        Ok(ObsValue::Vector(vec![x, y]))
    }

    /// Outline every agent's cursor on a rendered grid.
    pub fn render_cursors(
        &self,
        mut img: RgbImage,
        tile_size: usize,
        border_size: (usize, usize),
    ) -> RgbImage {
        let thickness = (tile_size / 8).max(1);
        for (agent, &(x, y)) in self.positions.iter().enumerate() {
            let color = AGENT_COLORS[agent % AGENT_COLORS.len()];
            outline_tile(
                &mut img,
                x + border_size.0,
                y + border_size.1,
                tile_size,
                thickness,
                color,
            );
        }
        img
    }
}

/// Draw a `height × width` grid of tile ids from `probs`.
pub fn gen_random_map(
    rng: &mut impl Rng,
    width: usize,
    height: usize,
    probs: &[f64],
) -> Result<TileMap> {
    let dist = WeightedIndex::new(probs)?;
    Ok(Array2::from_shape_fn((height, width), |_| dist.sample(rng)))
}

/// Observation space of the grid itself.
pub fn map_space(num_tiles: usize, width: usize, height: usize) -> ObservationSpace {
    ObservationSpace::Box {
        low: 0.0,
        high: num_tiles.saturating_sub(1) as f64,
        shape: vec![height, width],
    }
}

/// Observation space of a grid plus a cursor position.
pub fn map_and_position_space(num_tiles: usize, width: usize, height: usize) -> ObservationSpace {
    let mut spaces = BTreeMap::new();
    spaces.insert(
        "pos".to_string(),
        ObservationSpace::MultiDiscrete {
            nvec: vec![width, height],
        },
    );
    spaces.insert("map".to_string(), map_space(num_tiles, width, height));
    ObservationSpace::Dict { spaces }
}
