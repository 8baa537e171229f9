//! Wide representation: each action picks any cell and a tile for it.

use anyhow::{Result, bail};

use pcgrl_kernel::{
    Action, ActionSpace, Edit, Observation, ObservationSpace, Params, Representation, RgbImage,
    TileMap,
};

use super::{RepBase, map_space};

pub struct WideRepresentation {
    base: RepBase,
}

impl WideRepresentation {
    pub fn new(n_agents: usize) -> Self {
        Self {
            base: RepBase::new(n_agents, false),
        }
    }
}

impl Representation for WideRepresentation {
    fn name(&self) -> &str {
        "wide"
    }

    fn get_action_space(&self, width: usize, height: usize, num_tiles: usize) -> ActionSpace {
        ActionSpace::MultiDiscrete {
            nvec: vec![width, height, num_tiles],
        }
    }

    fn get_observation_space(
        &self,
        num_tiles: usize,
        width: usize,
        height: usize,
    ) -> ObservationSpace {
        let mut space = ObservationSpace::Dict {
            spaces: Default::default(),
        };
        space.insert("map", map_space(num_tiles, width, height));
        space
    }

    fn seed(&mut self, seed: Option<u64>) -> u64 {
        self.base.seed(seed)
    }

    fn reset(&mut self, width: usize, height: usize, probs: &[f64]) -> Result<()> {
        self.base.reset(width, height, probs)
    }

    /// Action `[x, y, tile]`.
    fn update(&mut self, action: &Action, agent: usize) -> Result<Edit> {
        let Action::MultiDiscrete(values) = action else {
            bail!("wide expects [x, y, tile], got {:?}", action);
        };
        let &[x, y, tile] = values.as_slice() else {
            bail!("wide expects 3 action values, got {}", values.len());
        };
        self.base.position(agent)?;
        let edit = self.base.set_tile(x, y, tile)?;
        self.base.set_position(agent, x, y)?;
        Ok(edit)
    }

    fn get_observation(&self, agent: usize) -> Result<Observation> {
        // validates the agent index
        self.base.position(agent)?;
        let mut obs = Observation::new();
        obs.insert("map".to_string(), self.base.map_observation());
        Ok(obs)
    }

    fn render(
        &self,
        img: RgbImage,
        _tile_size: usize,
        _border_size: (usize, usize),
    ) -> Result<RgbImage> {
        Ok(img)
    }

    fn adjust_param(&mut self, _width: usize, _height: usize, _params: &Params) -> Result<()> {
        Ok(())
    }

    fn map(&self) -> &TileMap {
        self.base.map()
    }
}
