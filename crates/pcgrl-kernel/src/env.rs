//! The episode controller: turn-based multi-agent editing under a budget.
//!
//! ## Usage
//!
//! ```ignore
//! use pcgrl_kernel::{EnvConfig, PcgrlEnv};
//!
//! let mut env = PcgrlEnv::new(problem, representation, EnvConfig::with_agents(2))?;
//! let observations = env.reset()?;
//!
//! loop {
//!     let actions = policy(&observations);
//!     let result = env.step(&actions)?;
//!     if result.done() {
//!         // the env has already reset itself for the next episode
//!         break;
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::budget::Budget;
use crate::config::{EnvConfig, Params, ParamsExt};
use crate::heatmap::Heatmap;
use crate::ledger::RewardLedger;
use crate::observation::{HEATMAP_KEY, ObsValue, Observation};
use crate::problem::{DebugInfo, Problem, Stats};
use crate::render::{RenderMode, RenderOutput, TerminalViewer, Viewer};
use crate::representation::{Edit, Representation};
use crate::scheduler::TurnScheduler;
use crate::spaces::{Action, ActionSpace, ObservationSpace};
use crate::tiles::{self, NameMap};

/// Info key carrying each agent's episode reward total on the terminal step.
pub const EPISODE_REWARD_KEY: &str = "reward";

/// Step-wide info: one array slot per agent for every key.
pub type Info = BTreeMap<String, Vec<Value>>;

/// What happened on one agent's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The action was handed to the representation.
    Applied,
    /// Negative-switch mode is on and another agent holds the grid.
    SkippedBecauseInactive,
    /// The episode already ended earlier in this step.
    SkippedBecauseEpisodeEnded,
}

impl TurnOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Result of a single step.
///
/// All vectors are indexed by agent, not by turn order.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observations: Vec<Observation>,
    pub rewards: Vec<f64>,
    pub dones: Vec<bool>,
    pub info: Info,
    /// In negative-switch mode, 1 if the agent edited as the active agent.
    /// Always 0 when the mode is off.
    pub actives: Vec<u8>,
    pub outcomes: Vec<TurnOutcome>,
    /// Turn order used for this step
    pub order: Vec<usize>,
}

impl StepResult {
    /// Whether the episode ended during this step.
    pub fn done(&self) -> bool {
        self.dones.iter().any(|d| *d)
    }

    /// Per-agent episode totals, present only on the terminal step.
    pub fn episode_rewards(&self) -> Option<Vec<f64>> {
        self.info
            .get(EPISODE_REWARD_KEY)
            .map(|values| values.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect())
    }

    /// One agent's value for an info key.
    pub fn info_value(&self, key: &str, agent: usize) -> Option<&Value> {
        self.info.get(key).and_then(|values| values.get(agent))
    }
}

/// Multi-agent PCG environment.
///
/// Owns the turn scheduler, budget, heatmap and reward ledger, and drives a
/// [`Problem`] and a [`Representation`]. A single mutable state machine:
/// callers sharing it across threads must serialize access themselves.
pub struct PcgrlEnv {
    problem: Box<dyn Problem>,
    rep: Box<dyn Representation>,
    n_agents: usize,
    rng: ChaCha8Rng,
    seed: u64,
    budget: Budget,
    heatmap: Heatmap,
    scheduler: TurnScheduler,
    ledger: RewardLedger,
    /// Latest stats snapshot of the grid
    stats: Stats,
    iteration: u64,
    changes: Vec<u64>,
    /// Turns taken while being the active agent
    steps: Vec<u64>,
    step_length: Vec<f64>,
    action_space: ActionSpace,
    observation_space: ObservationSpace,
    viewer: Option<Box<dyn Viewer>>,
}

impl PcgrlEnv {
    /// Create a new environment.
    ///
    /// Seeds from `config.seed` (random when absent) and applies the rest of
    /// the config through [`adjust_param`](Self::adjust_param).
    pub fn new(
        problem: Box<dyn Problem>,
        rep: Box<dyn Representation>,
        config: EnvConfig,
    ) -> Result<Self> {
        let n_agents = config.n_agents;
        if n_agents == 0 {
            bail!("n_agents must be at least 1");
        }

        let (width, height) = (problem.width(), problem.height());
        let num_tiles = problem.tile_types().len();
        let action_space = rep.get_action_space(width, height, num_tiles);
        let observation_space = rep.get_observation_space(num_tiles, width, height);

        let mut env = Self {
            problem,
            rep,
            n_agents,
            rng: ChaCha8Rng::seed_from_u64(0),
            seed: 0,
            budget: Budget::new(width, height),
            heatmap: Heatmap::new(width, height),
            scheduler: TurnScheduler::new(n_agents),
            ledger: RewardLedger::new(n_agents),
            stats: Stats::new(),
            iteration: 0,
            changes: vec![0; n_agents],
            steps: vec![0; n_agents],
            step_length: vec![1.0; n_agents],
            action_space,
            observation_space,
            viewer: None,
        };

        env.seed(config.seed);
        env.adjust_param(&config.to_params())?;

        debug!(
            problem = env.problem.name(),
            representation = env.rep.name(),
            n_agents,
            seed = env.seed,
            "Environment created"
        );
        Ok(env)
    }

    /// Reseed the controller RNG and seed the collaborators from it.
    ///
    /// The representation and the problem each get their own seed drawn from
    /// the reseeded controller stream. Returns the controller seed.
    pub fn seed(&mut self, seed: Option<u64>) -> u64 {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        let rep_seed = self.rng.random();
        self.rep.seed(Some(rep_seed));
        let problem_seed = self.rng.random();
        self.problem.seed(problem_seed);
        self.seed = seed;
        seed
    }

    /// Start a new episode and return one observation per agent.
    pub fn reset(&mut self) -> Result<Vec<Observation>> {
        let (width, height) = self.dims();

        self.changes.fill(0);
        self.steps.fill(0);
        self.iteration = 0;

        let probs = tiles::int_probabilities(
            self.problem.tile_probabilities(),
            self.problem.tile_types(),
        )?;
        self.rep.reset(width, height, &probs)?;
        self.stats = self.problem.get_stats(&self.name_map()?)?;
        self.problem.reset(&self.stats);

        self.heatmap.reset(width, height);
        self.ledger.clear();
        self.scheduler.shuffle(&mut self.rng);

        debug!(width, height, stats = ?self.stats, "Episode reset");

        (0..self.n_agents).map(|agent| self.observe(agent)).collect()
    }

    /// Advance the episode with one action per agent.
    ///
    /// Agents act in a freshly shuffled order. If the episode ends on some
    /// turn, later agents in the order are skipped but still receive a
    /// result. On the terminal step the controller resets itself before
    /// returning: the result describes the finished episode while the
    /// environment already holds a fresh one.
    pub fn step(&mut self, actions: &[Action]) -> Result<StepResult> {
        let n = self.n_agents;
        let order = self.scheduler.shuffle(&mut self.rng).to_vec();
        self.iteration += 1;

        let mut done = false;
        let mut observations: Vec<Option<Observation>> = vec![None; n];
        let mut rewards = vec![0.0; n];
        let mut dones = vec![false; n];
        let mut actives = vec![0u8; n];
        let mut outcomes = vec![TurnOutcome::SkippedBecauseEpisodeEnded; n];
        let mut info = Info::new();

        for &agent in &order {
            let old_stats = self.stats.clone();

            let outcome = if done {
                TurnOutcome::SkippedBecauseEpisodeEnded
            } else if !self.scheduler.may_edit(agent) {
                TurnOutcome::SkippedBecauseInactive
            } else {
                TurnOutcome::Applied
            };

            let edit = match outcome {
                TurnOutcome::Applied => {
                    let action = actions
                        .get(agent)
                        .ok_or_else(|| anyhow!("no action supplied for agent {}", agent))?;
                    self.rep.update(action, agent)?
                }
                _ => Edit::none(),
            };

            if edit.changed() {
                self.changes[agent] += edit.change;
                if !self.heatmap.record(edit.x, edit.y) {
                    warn!(agent, x = edit.x, y = edit.y, "Edit outside the heatmap");
                }
                self.stats = self.problem.get_stats(&self.name_map()?)?;
            }
            if self.scheduler.is_active(agent) {
                self.steps[agent] += 1;
            }

            let reward = self.problem.get_reward(&self.stats, &old_stats);
            done = done
                || self.problem.get_episode_over(&self.stats, &old_stats)
                || self.budget.is_exhausted(self.total_changes(), self.iteration);

            let mut agent_info = self.problem.get_debug_info(&self.stats, &old_stats, agent);
            self.annotate(&mut agent_info, agent);

            observations[agent] = Some(self.observe(agent)?);
            rewards[agent] = reward;
            dones[agent] = done;
            actives[agent] = u8::from(self.scheduler.negative_switch() && outcome.is_applied());
            outcomes[agent] = outcome;
            self.ledger.record(agent, reward);

            if self.scheduler.observe_reward(reward) {
                debug!(
                    from = agent,
                    active = self.scheduler.active_agent(),
                    reward,
                    "Negative reward, switching active agent"
                );
            }

            merge_info(&mut info, agent_info, agent, n);

            trace!(agent, ?outcome, change = edit.change, reward, done, "Turn processed");
        }

        if done {
            let totals = self.ledger.totals();
            debug!(
                iteration = self.iteration,
                changes = self.total_changes(),
                totals = ?totals,
                "Episode over"
            );
            info.insert(
                EPISODE_REWARD_KEY.to_string(),
                totals.into_iter().map(Value::from).collect(),
            );
            self.reset()?;
        }

        Ok(StepResult {
            observations: observations
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
            rewards,
            dones,
            info,
            actives,
            outcomes,
            order,
        })
    }

    /// Apply options to the controller and forward them to the collaborators.
    ///
    /// Recognized here: `negative_switch`, `change_percentage`, `step_length`.
    /// Budgets and spaces are recomputed afterwards, so a problem that changes
    /// its dimensions gets matching limits. A resized grid also restarts the
    /// heatmap at the new dimensions.
    pub fn adjust_param(&mut self, params: &Params) -> Result<()> {
        if let Some(enabled) = params.get_bool("negative_switch") {
            self.scheduler.set_negative_switch(enabled);
        } else if params.contains_key("negative_switch") {
            warn!("Ignoring negative_switch: expected a boolean");
        }

        let change_percentage = params.get_f64("change_percentage");
        if change_percentage.is_none() && params.contains_key("change_percentage") {
            warn!("Ignoring change_percentage: expected a number");
        }

        if let Some(step_length) = params.get_f64_vec("step_length") {
            self.step_length = step_length;
        } else if params.contains_key("step_length") {
            warn!("Ignoring step_length: expected an array of numbers");
        }

        self.problem.adjust_param(params)?;
        let (width, height) = self.dims();
        self.rep.adjust_param(width, height, params)?;
        if (self.heatmap.width(), self.heatmap.height()) != (width, height) {
            self.heatmap.reset(width, height);
        }

        match change_percentage {
            Some(p) => self.budget.set_change_percentage(p, width, height),
            None => self.budget.recompute(width, height),
        }
        self.refresh_spaces();

        debug!(
            negative_switch = self.scheduler.negative_switch(),
            max_changes = self.budget.max_changes(),
            max_iterations = self.budget.max_iterations(),
            "Parameters adjusted"
        );
        Ok(())
    }

    /// Render the current grid.
    pub fn render(&mut self, mode: RenderMode) -> Result<RenderOutput> {
        let img = self.problem.render(&self.name_map()?)?;
        let img = self
            .rep
            .render(img, self.problem.tile_size(), self.problem.border_size())?;

        match mode {
            RenderMode::RgbArray => Ok(RenderOutput::Image(img)),
            RenderMode::Human => {
                let tile_size = self.problem.tile_size();
                let viewer = self
                    .viewer
                    .get_or_insert_with(|| Box::new(TerminalViewer::new(tile_size)));
                viewer.imshow(&img)?;
                Ok(RenderOutput::Displayed(viewer.is_open()))
            }
        }
    }

    /// Use a custom viewer for `RenderMode::Human`.
    pub fn set_viewer(&mut self, viewer: Box<dyn Viewer>) {
        self.close();
        self.viewer = Some(viewer);
    }

    /// Release the viewer, if any.
    pub fn close(&mut self) {
        if let Some(mut viewer) = self.viewer.take() {
            viewer.close();
        }
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn current_seed(&self) -> u64 {
        self.seed
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    pub fn max_changes(&self) -> u64 {
        self.budget.max_changes()
    }

    pub fn max_iterations(&self) -> u64 {
        self.budget.max_iterations()
    }

    pub fn change_percentage(&self) -> f64 {
        self.budget.change_percentage()
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn changes(&self) -> &[u64] {
        &self.changes
    }

    pub fn total_changes(&self) -> u64 {
        self.changes.iter().sum()
    }

    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn active_agent(&self) -> usize {
        self.scheduler.active_agent()
    }

    pub fn negative_switch(&self) -> bool {
        self.scheduler.negative_switch()
    }

    /// Turn order drawn by the last reset or step.
    pub fn agent_order(&self) -> &[usize] {
        self.scheduler.order()
    }

    pub fn step_length(&self) -> &[f64] {
        &self.step_length
    }

    pub fn reward_history(&self, agent: usize) -> &[f64] {
        self.ledger.history(agent)
    }

    /// Number of tile types.
    pub fn num_tiles(&self) -> usize {
        self.problem.tile_types().len()
    }

    /// Tile id used to pad the grid.
    pub fn border_tile(&self) -> Result<usize> {
        tiles::tile_index(self.problem.border_tile(), self.problem.tile_types())
    }

    pub fn problem(&self) -> &dyn Problem {
        self.problem.as_ref()
    }

    pub fn representation(&self) -> &dyn Representation {
        self.rep.as_ref()
    }

    /// The current grid as tile names.
    pub fn name_map(&self) -> Result<NameMap> {
        tiles::to_name_map(self.rep.map(), self.problem.tile_types())
    }

    fn dims(&self) -> (usize, usize) {
        (self.problem.width(), self.problem.height())
    }

    fn observe(&self, agent: usize) -> Result<Observation> {
        let mut observation = self.rep.get_observation(agent)?;
        observation.insert(
            HEATMAP_KEY.to_string(),
            ObsValue::Counts(self.heatmap.snapshot()),
        );
        Ok(observation)
    }

    fn annotate(&self, info: &mut DebugInfo, agent: usize) {
        info.insert("iterations".to_string(), Value::from(self.iteration));
        info.insert("changes".to_string(), Value::from(self.changes[agent]));
        info.insert("steps".to_string(), Value::from(self.steps[agent]));
        info.insert(
            "max_iterations".to_string(),
            Value::from(self.budget.max_iterations()),
        );
        info.insert(
            "max_changes".to_string(),
            Value::from(self.budget.max_changes()),
        );
    }

    fn refresh_spaces(&mut self) {
        let (width, height) = self.dims();
        let num_tiles = self.num_tiles();
        self.action_space = self.rep.get_action_space(width, height, num_tiles);
        let mut observation_space = self.rep.get_observation_space(num_tiles, width, height);
        observation_space.insert(
            HEATMAP_KEY,
            ObservationSpace::Box {
                low: 0.0,
                high: self.budget.max_changes() as f64,
                shape: vec![height, width],
            },
        );
        self.observation_space = observation_space;
    }
}

impl Drop for PcgrlEnv {
    fn drop(&mut self) {
        self.close();
    }
}

/// Fold one agent's info into the step-wide info, sizing every array by the
/// number of agents.
fn merge_info(info: &mut Info, agent_info: DebugInfo, agent: usize, n_agents: usize) {
    for (key, value) in agent_info {
        let slots = info
            .entry(key)
            .or_insert_with(|| vec![Value::Null; n_agents]);
        if let Some(slot) = slots.get_mut(agent) {
            *slot = value;
        }
    }
}
