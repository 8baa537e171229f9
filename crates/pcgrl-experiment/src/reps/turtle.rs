//! Turtle representation: each agent steers a cursor and paints under it.
//!
//! Actions `0..4` move left, right, up and down; action `4 + t` writes tile
//! `t` at the cursor. Moves are clamped at the grid edge unless `warp` is
//! set, in which case they wrap around.

use anyhow::{Result, bail};

use pcgrl_kernel::{
    Action, ActionSpace, Edit, Observation, ObservationSpace, Params, ParamsExt, Representation,
    RgbImage, TileMap,
};

use super::{RepBase, map_and_position_space};

/// Left, right, up, down as `(dx, dy)`.
const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

pub struct TurtleRepresentation {
    base: RepBase,
    warp: bool,
}

impl TurtleRepresentation {
    pub fn new(n_agents: usize) -> Self {
        Self {
            base: RepBase::new(n_agents, true),
            warp: false,
        }
    }

    pub fn position(&self, agent: usize) -> Result<(usize, usize)> {
        self.base.position(agent)
    }

    fn step_axis(&self, value: usize, delta: isize, size: usize) -> usize {
        let size = size.max(1) as isize;
        let moved = value as isize + delta;
        if self.warp {
            moved.rem_euclid(size) as usize
        } else {
            moved.clamp(0, size - 1) as usize
        }
    }
}

impl Representation for TurtleRepresentation {
    fn name(&self) -> &str {
        "turtle"
    }

    fn get_action_space(&self, _width: usize, _height: usize, num_tiles: usize) -> ActionSpace {
        ActionSpace::Discrete {
            n: DIRECTIONS.len() + num_tiles,
        }
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

    fn update(&mut self, action: &Action, agent: usize) -> Result<Edit> {
        let &Action::Discrete(choice) = action else {
            bail!("turtle expects a discrete action, got {:?}", action);
        };
        let (x, y) = self.base.position(agent)?;

        match DIRECTIONS.get(choice) {
            Some(&(dx, dy)) => {
                let nx = self.step_axis(x, dx, self.base.width());
                let ny = self.step_axis(y, dy, self.base.height());
                self.base.set_position(agent, nx, ny)?;
                Ok(Edit::at(0, nx, ny))
            }
            None => self.base.set_tile(x, y, choice - DIRECTIONS.len()),
        }
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
        if let Some(warp) = params.get_bool("warp") {
            self.warp = warp;
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEFT: usize = 0;
    const RIGHT: usize = 1;
    const UP: usize = 2;
    const DOWN: usize = 3;

    fn turtle(warp: bool) -> TurtleRepresentation {
        let mut rep = TurtleRepresentation::new(2);
        let mut params = Params::new();
        params.insert("random_start".to_string(), json!(false));
        params.insert("warp".to_string(), json!(warp));
        rep.adjust_param(3, 3, &params).unwrap();
        rep.seed(Some(2));
        rep.reset(3, 3, &[1.0, 0.0]).unwrap();
        rep
    }

    fn act(rep: &mut TurtleRepresentation, action: usize, agent: usize) -> Edit {
        rep.update(&Action::Discrete(action), agent).unwrap()
    }

    #[test]
    fn test_moves_clamp_at_edges() {
        let mut rep = turtle(false);
        act(&mut rep, LEFT, 0);
        act(&mut rep, UP, 0);
        assert_eq!(rep.position(0).unwrap(), (0, 0));

        for _ in 0..5 {
            act(&mut rep, RIGHT, 0);
        }
        act(&mut rep, DOWN, 0);
        assert_eq!(rep.position(0).unwrap(), (2, 1));
    }

    #[test]
    fn test_moves_wrap_with_warp() {
        let mut rep = turtle(true);
        act(&mut rep, LEFT, 0);
        act(&mut rep, UP, 0);
        assert_eq!(rep.position(0).unwrap(), (2, 2));
        act(&mut rep, DOWN, 0);
        assert_eq!(rep.position(0).unwrap(), (2, 0));
    }

    #[test]
    fn test_moving_never_changes_tiles() {
        let mut rep = turtle(false);
        let edit = act(&mut rep, RIGHT, 1);
        assert!(!edit.changed());
        assert_eq!((edit.x, edit.y), (1, 0));
        // other agent did not move
        assert_eq!(rep.position(0).unwrap(), (0, 0));
    }

    #[test]
    fn test_paint_under_cursor() {
        let mut rep = turtle(false);
        act(&mut rep, DOWN, 0);
        let edit = act(&mut rep, 4 + 1, 0);
        assert_eq!(edit, Edit::at(1, 0, 1));
        assert_eq!(rep.map()[[1, 0]], 1);

        assert!(rep.update(&Action::Discrete(4 + 2), 0).is_err());
        assert!(rep.update(&Action::Discrete(LEFT), 2).is_err());
    }

    #[test]
    fn test_action_space() {
        let rep = turtle(false);
        assert_eq!(rep.get_action_space(3, 3, 2), ActionSpace::Discrete { n: 6 });
    }
}
