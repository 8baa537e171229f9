//! Narrow representation: each agent walks the grid one cell at a time.
//!
//! An action decides the tile under the agent's cursor (or leaves it alone),
//! then the cursor moves on: row-major by default, or to a random cell when
//! `random_tile` is set.

use anyhow::{Result, bail};

use pcgrl_kernel::{
    Action, ActionSpace, Edit, Observation, ObservationSpace, Params, ParamsExt, Representation,
    RgbImage, TileMap,
};

use super::{RepBase, map_and_position_space};

pub struct NarrowRepresentation {
    base: RepBase,
    random_tile: bool,
}

impl NarrowRepresentation {
    pub fn new(n_agents: usize) -> Self {
        Self {
            base: RepBase::new(n_agents, true),
            random_tile: false,
        }
    }

    pub fn position(&self, agent: usize) -> Result<(usize, usize)> {
        self.base.position(agent)
    }

    fn advance(&mut self, agent: usize) -> Result<()> {
        let (x, y) = if self.random_tile {
            self.base.random_cell()
        } else {
            let (x, y) = self.base.position(agent)?;
            let (width, height) = (self.base.width(), self.base.height());
            if x + 1 < width {
                (x + 1, y)
            } else if y + 1 < height {
                (0, y + 1)
            } else {
                (0, 0)
            }
        };
        self.base.set_position(agent, x, y)
    }
}

impl Representation for NarrowRepresentation {
    fn name(&self) -> &str {
        "narrow"
    }

    fn get_action_space(&self, _width: usize, _height: usize, num_tiles: usize) -> ActionSpace {
        ActionSpace::Discrete { n: num_tiles + 1 }
    }

    fn get_observation_space(
        &self,
        num_tiles: usize,
        width: usize,
        height: usize,
    ) -> ObservationSpace {
        map_and_position_space(num_tiles, width, height)
    }

    fn seed(&mut self, seed: Option<u64>) -> u64 {
        self.base.seed(seed)
    }

    fn reset(&mut self, width: usize, height: usize, probs: &[f64]) -> Result<()> {
        self.base.reset(width, height, probs)
    }

    /// `0` keeps the current tile; `k` writes tile `k - 1`.
    fn update(&mut self, action: &Action, agent: usize) -> Result<Edit> {
        let &Action::Discrete(choice) = action else {
            bail!("narrow expects a discrete action, got {:?}", action);
        };
        let (x, y) = self.base.position(agent)?;
        let edit = match choice {
            0 => Edit::none(),
            tile => self.base.set_tile(x, y, tile - 1)?,
        };
        self.advance(agent)?;
        // report the edited cell, not where the cursor went
        Ok(Edit { x, y, ..edit })
    }

    fn get_observation(&self, agent: usize) -> Result<Observation> {
        let mut obs = Observation::new();
        obs.insert("pos".to_string(), self.base.position_observation(agent)?);
        obs.insert("map".to_string(), self.base.map_observation());
        Ok(obs)
    }

    fn render(
        &self,
        img: RgbImage,
        tile_size: usize,
        border_size: (usize, usize),
    ) -> Result<RgbImage> {
        Ok(self.base.render_cursors(img, tile_size, border_size))
    }

    fn adjust_param(&mut self, _width: usize, _height: usize, params: &Params) -> Result<()> {
        if let Some(random_tile) = params.get_bool("random_tile") {
            self.random_tile = random_tile;
        }
        if let Some(random_start) = params.get_bool("random_start") {
            self.base.set_random_start(random_start);
        }
        Ok(())
    }

    fn map(&self) -> &TileMap {
        self.base.map()
    }
}
