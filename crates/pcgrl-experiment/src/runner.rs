//! Episode runner: drives an environment with a seeded random policy.
//!
//! Orchestrates a run:
//! 1. Build the environment from the registry
//! 2. Sample one action per agent each step until the episode ends
//! 3. Record the terminal step, and repeat on the auto-reset environment
//! 4. Summarize

use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use pcgrl_kernel::{Action, ActionSpace, EnvConfig, PcgrlEnv};

use crate::registry::{ProblemKind, RepresentationKind, make_env};
use crate::results::{EpisodeResult, RunConfig, RunResults};

/// Offset mixed into the env seed so the policy stream differs from the env's.
const POLICY_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Configuration for the episode runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub problem: ProblemKind,
    pub representation: RepresentationKind,
    pub env: EnvConfig,
    /// Number of episodes to play
    pub episodes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            problem: ProblemKind::Binary,
            representation: RepresentationKind::Narrow,
            env: EnvConfig::default(),
            episodes: 1,
        }
    }
}

/// Uniform random actions drawn from the action space.
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One action per agent.
    pub fn act(&mut self, space: &ActionSpace, n_agents: usize) -> Vec<Action> {
        (0..n_agents).map(|_| space.sample(&mut self.rng)).collect()
    }
}

/// Runs episodes and collects their results.
pub struct EpisodeRunner {
    config: RunnerConfig,
}

impl EpisodeRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Play the configured number of episodes.
    pub fn run(&self) -> Result<RunResults> {
        let mut env = make_env(
            self.config.problem,
            self.config.representation,
            self.config.env.clone(),
        )?;
        let seed = env.current_seed();
        let mut policy = RandomPolicy::new(seed ^ POLICY_SEED_SALT);

        info!(
            problem = self.config.problem.name(),
            representation = self.config.representation.name(),
            agents = env.n_agents(),
            episodes = self.config.episodes,
            seed,
            max_changes = env.max_changes(),
            "Starting run"
        );

        let mut results = RunResults::new(RunConfig {
            problem: self.config.problem.name().to_string(),
            representation: self.config.representation.name().to_string(),
            n_agents: env.n_agents(),
            change_percentage: env.change_percentage(),
            negative_switch: env.negative_switch(),
            seed,
        });

        env.reset()?;
        for episode in 0..self.config.episodes {
            let result = run_episode(&mut env, &mut policy, episode)?;

            info!(
                progress = format!("{}/{}", episode + 1, self.config.episodes),
                iterations = result.iterations,
                changes = result.total_changes(),
                termination = ?result.termination,
                rewards = ?result.total_rewards,
                "Completed episode"
            );
            results.add(result);
        }

        results.compute_summary();
        env.close();
        Ok(results)
    }
}

/// Step `env` with `policy` until the current episode ends.
///
/// Always terminates: every step counts against the iteration budget.
pub fn run_episode(
    env: &mut PcgrlEnv,
    policy: &mut RandomPolicy,
    episode: usize,
) -> Result<EpisodeResult> {
    let started_at = Utc::now();
    let start = Instant::now();
    let space = env.action_space().clone();

    loop {
        let actions = policy.act(&space, env.n_agents());
        let step = env.step(&actions)?;
        if step.done() {
            let duration_ms = start.elapsed().as_millis() as u64;
            debug!(episode, duration_ms, "Episode ended");
            return EpisodeResult::from_terminal_step(episode, &step, started_at, duration_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_policy_is_seeded() {
        let space = ActionSpace::MultiDiscrete {
            nvec: vec![14, 14, 2],
        };
        let mut a = RandomPolicy::new(3);
        let mut b = RandomPolicy::new(3);
        for _ in 0..10 {
            let actions = a.act(&space, 2);
            assert_eq!(actions.len(), 2);
            assert!(actions.iter().all(|action| space.contains(action)));
            assert_eq!(actions, b.act(&space, 2));
        }
    }
}
