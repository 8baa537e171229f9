//! Binary problem: carve one connected empty region with a long path.
//!
//! The grid holds only `empty` and `solid` tiles. Agents are rewarded for
//! merging empty areas into a single region and for lengthening the longest
//! shortest path through it. The episode is over once there is exactly one
//! region and the path grew by `target_path` since the episode started.

use std::collections::BTreeMap;

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::debug;

use pcgrl_kernel::render::{Rgb, blank_image, fill_tile};
use pcgrl_kernel::{DebugInfo, NameMap, Params, ParamsExt, Problem, RgbImage, Stats};

use crate::analysis::{calc_longest_path, calc_num_regions, get_range_reward};

pub const EMPTY: &str = "empty";
pub const SOLID: &str = "solid";

const REGIONS: &str = "regions";
const PATH_LENGTH: &str = "path-length";
const PATH_IMPROVEMENT: &str = "path-imp";

/// Binary dungeon problem.
pub struct BinaryProblem {
    width: usize,
    height: usize,
    tile_types: Vec<String>,
    border_tile: String,
    tile_size: usize,
    border_size: (usize, usize),
    probs: BTreeMap<String, f64>,
    /// Path growth over the starting grid needed to finish
    target_path: f64,
    /// Draw a new empty/solid split on every reset
    random_probs: bool,
    /// Weight per stat in the reward sum
    rewards: BTreeMap<String, f64>,
    start_stats: Stats,
    rng: ChaCha8Rng,
}

impl BinaryProblem {
    pub fn new() -> Self {
        let mut probs = BTreeMap::new();
        probs.insert(EMPTY.to_string(), 0.5);
        probs.insert(SOLID.to_string(), 0.5);

        let mut rewards = BTreeMap::new();
        rewards.insert(REGIONS.to_string(), 5.0);
        rewards.insert(PATH_LENGTH.to_string(), 1.0);

        Self {
            width: 14,
            height: 14,
            tile_types: vec![EMPTY.to_string(), SOLID.to_string()],
            border_tile: SOLID.to_string(),
            tile_size: 16,
            border_size: (1, 1),
            probs,
            target_path: 20.0,
            random_probs: true,
            rewards,
            start_stats: Stats::new(),
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    pub fn target_path(&self) -> f64 {
        self.target_path
    }

    fn weight(&self, stat: &str) -> f64 {
        self.rewards.get(stat).copied().unwrap_or(0.0)
    }

    fn set_empty_fraction(&mut self, empty: f64) {
        let empty = empty.clamp(0.0, 1.0);
        self.probs.insert(EMPTY.to_string(), empty);
        self.probs.insert(SOLID.to_string(), 1.0 - empty);
    }
}

impl Default for BinaryProblem {
    fn default() -> Self {
        Self::new()
    }
}

fn stat(stats: &Stats, key: &str) -> f64 {
    stats.get(key).copied().unwrap_or(0.0)
}

fn tile_color(name: &str) -> Rgb {
    match name {
        EMPTY => [255, 255, 255],
        SOLID => [0, 0, 0],
        _ => [128, 128, 128],
    }
}

impl Problem for BinaryProblem {
    fn name(&self) -> &str {
        "binary"
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn tile_types(&self) -> &[String] {
        &self.tile_types
    }

    fn border_tile(&self) -> &str {
        &self.border_tile
    }

    fn tile_size(&self) -> usize {
        self.tile_size
    }

    fn border_size(&self) -> (usize, usize) {
        self.border_size
    }

    fn tile_probabilities(&self) -> &BTreeMap<String, f64> {
        &self.probs
    }

    fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn reset(&mut self, start_stats: &Stats) {
        self.start_stats = start_stats.clone();
        if self.random_probs {
            let empty = self.rng.random::<f64>();
            self.set_empty_fraction(empty);
        }
    }

    fn get_stats(&self, map: &NameMap) -> Result<Stats> {
        let mut stats = Stats::new();
        stats.insert(REGIONS.to_string(), calc_num_regions(map, &[EMPTY]) as f64);
        stats.insert(
            PATH_LENGTH.to_string(),
            calc_longest_path(map, &[EMPTY]) as f64,
        );
        Ok(stats)
    }

    fn get_reward(&self, new: &Stats, old: &Stats) -> f64 {
        let regions = get_range_reward(stat(new, REGIONS), stat(old, REGIONS), 1.0, 1.0);
        let path = get_range_reward(
            stat(new, PATH_LENGTH),
            stat(old, PATH_LENGTH),
            f64::INFINITY,
            f64::INFINITY,
        );
        regions * self.weight(REGIONS) + path * self.weight(PATH_LENGTH)
    }

    fn get_episode_over(&self, new: &Stats, _old: &Stats) -> bool {
        stat(new, REGIONS) == 1.0
            && stat(new, PATH_LENGTH) - stat(&self.start_stats, PATH_LENGTH) >= self.target_path
    }

    fn get_debug_info(&self, new: &Stats, _old: &Stats, _agent: usize) -> DebugInfo {
        let path = stat(new, PATH_LENGTH);
        let mut info = DebugInfo::new();
        info.insert(REGIONS.to_string(), Value::from(stat(new, REGIONS)));
        info.insert(PATH_LENGTH.to_string(), Value::from(path));
        info.insert(
            PATH_IMPROVEMENT.to_string(),
            Value::from(path - stat(&self.start_stats, PATH_LENGTH)),
        );
        info
    }

    fn render(&self, map: &NameMap) -> Result<RgbImage> {
        let (height, width) = map.dim();
        let (bx, by) = self.border_size;
        let mut img = blank_image(
            (width + 2 * bx) * self.tile_size,
            (height + 2 * by) * self.tile_size,
            tile_color(&self.border_tile),
        );
        for ((y, x), name) in map.indexed_iter() {
            fill_tile(&mut img, x + bx, y + by, self.tile_size, tile_color(name));
        }
        Ok(img)
    }

    fn adjust_param(&mut self, params: &Params) -> Result<()> {
        if let Some(width) = params.get_usize("width") {
            self.width = width;
        }
        if let Some(height) = params.get_usize("height") {
            self.height = height;
        }
        if let Some(probs) = params.get_f64_map("probs") {
            self.probs = probs.into_iter().collect();
        } else if let Some(empty) = params.get_f64("prob") {
            self.set_empty_fraction(empty);
        }
        if let Some(target_path) = params.get_f64("target_path") {
            self.target_path = target_path;
        }
        if let Some(random_probs) = params.get_bool("random_probs") {
            self.random_probs = random_probs;
        }
        if let Some(rewards) = params.get_f64_map("rewards") {
            // only known stats carry a weight
            for (key, weight) in rewards {
                if let Some(slot) = self.rewards.get_mut(&key) {
                    *slot = weight;
                }
            }
        }

        debug!(
            width = self.width,
            height = self.height,
            target_path = self.target_path,
            random_probs = self.random_probs,
            "Binary problem configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use serde_json::json;

    fn grid(rows: &[&str]) -> NameMap {
        Array2::from_shape_fn((rows.len(), rows[0].len()), |(y, x)| {
            if rows[y].as_bytes()[x] == b'.' {
                EMPTY.to_string()
            } else {
                SOLID.to_string()
            }
        })
    }

    fn stats(regions: f64, path: f64) -> Stats {
        let mut stats = Stats::new();
        stats.insert(REGIONS.to_string(), regions);
        stats.insert(PATH_LENGTH.to_string(), path);
        stats
    }

    #[test]
    fn test_defaults() {
        let problem = BinaryProblem::new();
        assert_eq!((problem.width(), problem.height()), (14, 14));
        assert_eq!(problem.tile_types(), &["empty", "solid"]);
        assert_eq!(problem.border_tile(), "solid");
        assert_eq!(problem.tile_probabilities()["empty"], 0.5);
        assert_eq!(problem.target_path(), 20.0);
    }

    #[test]
    fn test_stats() {
        let problem = BinaryProblem::new();
        let map = grid(&["..#", "#.#", "#.."]);
        assert_eq!(problem.get_stats(&map).unwrap(), stats(1.0, 4.0));

        let split = grid(&[".#.", "###", "..."]);
        assert_eq!(problem.get_stats(&split).unwrap(), stats(3.0, 2.0));
    }

    #[test]
    fn test_reward_prefers_one_region_and_longer_paths() {
        let problem = BinaryProblem::new();

        // merging two regions into one: +5
        assert_eq!(problem.get_reward(&stats(1.0, 4.0), &stats(2.0, 4.0)), 5.0);
        // splitting: -5, path shrinks by 2: -2
        assert_eq!(problem.get_reward(&stats(2.0, 2.0), &stats(1.0, 4.0)), -7.0);
        // path grows by 3 within one region
        assert_eq!(problem.get_reward(&stats(1.0, 7.0), &stats(1.0, 4.0)), 3.0);
    }

    #[test]
    fn test_episode_over_measures_growth_from_start() {
        let mut problem = BinaryProblem::new();
        problem.reset(&stats(1.0, 5.0));

        assert!(!problem.get_episode_over(&stats(1.0, 24.0), &stats(1.0, 20.0)));
        assert!(problem.get_episode_over(&stats(1.0, 25.0), &stats(1.0, 24.0)));
        assert!(!problem.get_episode_over(&stats(2.0, 40.0), &stats(1.0, 24.0)));

        let info = problem.get_debug_info(&stats(1.0, 12.0), &stats(1.0, 10.0), 0);
        assert_eq!(info[PATH_IMPROVEMENT], json!(7.0));
        assert_eq!(info[REGIONS], json!(1.0));
    }

    #[test]
    fn test_reset_randomizes_split_when_enabled() {
        let mut problem = BinaryProblem::new();
        problem.seed(3);
        problem.reset(&Stats::new());
        let probs = problem.tile_probabilities();
        assert!((probs["empty"] + probs["solid"] - 1.0).abs() < 1e-12);

        let mut fixed = BinaryProblem::new();
        let mut params = Params::new();
        params.insert("random_probs".to_string(), json!(false));
        params.insert("prob".to_string(), json!(0.8));
        fixed.adjust_param(&params).unwrap();
        fixed.reset(&Stats::new());
        assert_eq!(fixed.tile_probabilities()["empty"], 0.8);
    }

    #[test]
    fn test_adjust_param() {
        let mut problem = BinaryProblem::new();
        let mut params = Params::new();
        params.insert("width".to_string(), json!(8));
        params.insert("height".to_string(), json!(6));
        params.insert("target_path".to_string(), json!(10));
        params.insert("rewards".to_string(), json!({"regions": 2.0, "unknown": 9.0}));
        problem.adjust_param(&params).unwrap();

        assert_eq!((problem.width(), problem.height()), (8, 6));
        assert_eq!(problem.target_path(), 10.0);
        assert_eq!(problem.get_reward(&stats(1.0, 0.0), &stats(2.0, 0.0)), 2.0);
    }

    #[test]
    fn test_render_pads_border() {
        let problem = BinaryProblem::new();
        let img = problem.render(&grid(&["..", "#."])).unwrap();

        assert_eq!(img.dim(), (64, 64, 3));
        // border is solid
        assert_eq!(img[[0, 0, 0]], 0);
        // first cell is empty
        assert_eq!(img[[16, 16, 0]], 255);
        // cell (0, 1) is solid
        assert_eq!(img[[32, 16, 0]], 0);
    }
}
