//! Results collection and output for PCGRL rollouts.
//!
//! Captures per episode:
//! - Iterations and per-agent changes until termination
//! - Why the episode ended
//! - Per-agent episode reward totals
//! - How many edits landed on the grid

use std::path::Path;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use pcgrl_kernel::StepResult;
use pcgrl_kernel::observation::heatmap_of;

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The problem reported the grid as finished
    Solved,
    /// Cumulative changes reached the change budget
    ChangeBudget,
    /// The iteration budget ran out
    IterationBudget,
}

/// Results from a single episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeResult {
    /// Episode index within the run
    pub episode: usize,
    pub started_at: DateTime<Utc>,
    /// Steps taken until termination
    pub iterations: u64,
    /// Successful edits per agent
    pub changes: Vec<u64>,
    /// Episode reward per agent
    pub total_rewards: Vec<f64>,
    pub termination: Termination,
    /// Edits recorded in the heatmap at termination
    pub heatmap_total: f64,
    pub duration_ms: u64,
}

impl EpisodeResult {
    /// Build a record from the step on which an episode ended.
    pub fn from_terminal_step(
        episode: usize,
        step: &StepResult,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Result<Self> {
        let Some(total_rewards) = step.episode_rewards() else {
            bail!("step {} did not end the episode", episode);
        };

        let iterations = first_u64(step, "iterations");
        let changes: Vec<u64> = step
            .info
            .get("changes")
            .map(|values| values.iter().map(|v| v.as_u64().unwrap_or(0)).collect())
            .unwrap_or_default();
        let total_changes: u64 = changes.iter().sum();

        let termination = if total_changes >= first_u64(step, "max_changes") {
            Termination::ChangeBudget
        } else if iterations >= first_u64(step, "max_iterations") {
            Termination::IterationBudget
        } else {
            Termination::Solved
        };

        // observations are taken turn by turn; the latest holds the fullest heatmap
        let heatmap_total = step
            .observations
            .iter()
            .filter_map(heatmap_of)
            .map(|h| h.sum())
            .fold(0.0, f64::max);

        Ok(Self {
            episode,
            started_at,
            iterations,
            changes,
            total_rewards,
            termination,
            heatmap_total,
            duration_ms,
        })
    }

    pub fn total_changes(&self) -> u64 {
        self.changes.iter().sum()
    }
}

/// First non-null value of an info key, as an integer.
fn first_u64(step: &StepResult, key: &str) -> u64 {
    step.info
        .get(key)
        .and_then(|values| values.iter().find_map(Value::as_u64))
        .unwrap_or(0)
}

/// Configuration a run was made with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub problem: String,
    pub representation: String,
    pub n_agents: usize,
    pub change_percentage: f64,
    pub negative_switch: bool,
    /// Seed actually used by the environment
    pub seed: u64,
}

/// Summary statistics over all episodes of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub episodes: usize,
    pub solve_rate: f64,
    pub avg_iterations: f64,
    /// Standard error of avg_iterations
    pub avg_iterations_se: f64,
    pub min_iterations: u64,
    pub max_iterations: u64,
    pub avg_changes: f64,
    /// Mean episode reward per agent
    pub avg_rewards: Vec<f64>,
}

/// Aggregate results from a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResults {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub config: RunConfig,
    pub episodes: Vec<EpisodeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl RunResults {
    pub fn new(config: RunConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            config,
            episodes: Vec::new(),
            summary: None,
        }
    }

    pub fn add(&mut self, result: EpisodeResult) {
        self.episodes.push(result);
    }

    /// Compute summary statistics. Leaves `summary` empty for an empty run.
    pub fn compute_summary(&mut self) {
        if self.episodes.is_empty() {
            self.summary = None;
            return;
        }

        let episodes = self.episodes.len();
        let n = episodes as f64;
        let solved = self
            .episodes
            .iter()
            .filter(|e| e.termination == Termination::Solved)
            .count();

        let iterations: Vec<f64> = self.episodes.iter().map(|e| e.iterations as f64).collect();
        let avg_iterations = iterations.iter().sum::<f64>() / n;

        // Standard error for continuous: SE = std_dev / sqrt(n)
        let avg_iterations_se = if episodes > 1 {
            let variance = iterations
                .iter()
                .map(|i| (i - avg_iterations).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            variance.sqrt() / n.sqrt()
        } else {
            0.0
        };

        let n_agents = self
            .episodes
            .iter()
            .map(|e| e.total_rewards.len())
            .max()
            .unwrap_or(0);
        let avg_rewards = (0..n_agents)
            .map(|agent| {
                self.episodes
                    .iter()
                    .map(|e| e.total_rewards.get(agent).copied().unwrap_or(0.0))
                    .sum::<f64>()
                    / n
            })
            .collect();

        self.summary = Some(RunSummary {
            episodes,
            solve_rate: solved as f64 / n,
            avg_iterations,
            avg_iterations_se,
            min_iterations: self.episodes.iter().map(|e| e.iterations).min().unwrap_or(0),
            max_iterations: self.episodes.iter().map(|e| e.iterations).max().unwrap_or(0),
            avg_changes: self.episodes.iter().map(|e| e.total_changes() as f64).sum::<f64>() / n,
            avg_rewards,
        });
    }

    /// Save results to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let results = serde_json::from_str(&json)?;
        Ok(results)
    }
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", ms as f64 / 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcgrl_kernel::{Info, TurnOutcome};
    use serde_json::json;

    fn config() -> RunConfig {
        RunConfig {
            problem: "binary".to_string(),
            representation: "narrow".to_string(),
            n_agents: 2,
            change_percentage: 0.2,
            negative_switch: false,
            seed: 7,
        }
    }

    fn episode(episode: usize, iterations: u64, termination: Termination) -> EpisodeResult {
        EpisodeResult {
            episode,
            started_at: Utc::now(),
            iterations,
            changes: vec![3, 4],
            total_rewards: vec![1.0, -1.0 * episode as f64],
            termination,
            heatmap_total: 7.0,
            duration_ms: 5,
        }
    }

    fn terminal_step(changes: [u64; 2], iterations: u64) -> StepResult {
        let mut info = Info::new();
        info.insert("iterations".to_string(), vec![json!(iterations); 2]);
        info.insert("changes".to_string(), vec![json!(changes[0]), json!(changes[1])]);
        info.insert("max_changes".to_string(), vec![json!(39); 2]);
        info.insert("max_iterations".to_string(), vec![json!(7644); 2]);
        info.insert("reward".to_string(), vec![json!(2.5), json!(-1.0)]);
        StepResult {
            observations: vec![Default::default(), Default::default()],
            rewards: vec![0.0, 0.0],
            dones: vec![true, true],
            info,
            actives: vec![0, 0],
            outcomes: vec![TurnOutcome::Applied; 2],
            order: vec![0, 1],
        }
    }

    #[test]
    fn test_from_terminal_step() {
        let result =
            EpisodeResult::from_terminal_step(0, &terminal_step([20, 19], 40), Utc::now(), 3)
                .unwrap();
        assert_eq!(result.iterations, 40);
        assert_eq!(result.changes, vec![20, 19]);
        assert_eq!(result.total_rewards, vec![2.5, -1.0]);
        assert_eq!(result.termination, Termination::ChangeBudget);

        let solved =
            EpisodeResult::from_terminal_step(1, &terminal_step([10, 9], 30), Utc::now(), 3)
                .unwrap();
        assert_eq!(solved.termination, Termination::Solved);
    }

    #[test]
    fn test_from_non_terminal_step_fails() {
        let mut step = terminal_step([1, 1], 1);
        step.info.remove("reward");
        assert!(EpisodeResult::from_terminal_step(0, &step, Utc::now(), 0).is_err());
    }

    #[test]
    fn test_run_summary() {
        let mut results = RunResults::new(config());
        results.add(episode(0, 10, Termination::Solved));
        results.add(episode(1, 20, Termination::ChangeBudget));
        results.add(episode(2, 30, Termination::ChangeBudget));
        results.compute_summary();

        let summary = results.summary.as_ref().unwrap();
        assert_eq!(summary.episodes, 3);
        assert!((summary.solve_rate - 0.333).abs() < 0.01);
        assert_eq!(summary.avg_iterations, 20.0);
        assert!(summary.avg_iterations_se > 0.0);
        assert_eq!((summary.min_iterations, summary.max_iterations), (10, 30));
        assert_eq!(summary.avg_changes, 7.0);
        assert_eq!(summary.avg_rewards, vec![1.0, -1.0]);
    }

    #[test]
    fn test_empty_run_has_no_summary() {
        let mut results = RunResults::new(config());
        results.compute_summary();
        assert!(results.summary.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let mut results = RunResults::new(config());
        results.add(episode(0, 12, Termination::IterationBudget));
        results.compute_summary();

        let path = std::env::temp_dir().join(format!("pcgrl-results-{}.json", results.run_id));
        results.save(&path).unwrap();
        let loaded = RunResults::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.run_id, results.run_id);
        assert_eq!(loaded.episodes.len(), 1);
        assert_eq!(loaded.episodes[0].termination, Termination::IterationBudget);
        assert_eq!(loaded.config.seed, 7);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(90_000), "1.5m");
    }
}
