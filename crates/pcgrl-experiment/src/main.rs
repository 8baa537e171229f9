//! PCGRL Experiment CLI.
//!
//! Commands:
//! - run: Play episodes with a seeded random policy and save the results
//! - generate: Reset an environment and print its starting grid and stats
//! - render: Reset an environment and draw it in the terminal

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pcgrl_experiment::registry::{ProblemKind, RepresentationKind, make_env, parse_env_id};
use pcgrl_experiment::results::format_duration;
use pcgrl_experiment::runner::{EpisodeRunner, RunnerConfig};
use pcgrl_kernel::{EnvConfig, RenderMode};

/// Generate a timestamped output path from the given path.
/// e.g., "results.json" -> "results-20260108-010530.json"
fn timestamped_path(path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}-{}.{}", stem, timestamp, ext))
}

#[derive(Parser)]
#[command(name = "pcgrl-experiment")]
#[command(version)]
#[command(about = "Multi-agent procedural content generation episodes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Environment selection and overrides shared by every command.
#[derive(Args)]
struct EnvArgs {
    /// Environment id such as binary-narrow-v0 (overrides --problem/--representation)
    #[arg(long)]
    env: Option<String>,

    /// Problem to solve
    #[arg(long, default_value = "binary")]
    problem: String,

    /// Representation the agents act through
    #[arg(long, default_value = "narrow")]
    representation: String,

    /// JSON file with an environment config
    #[arg(long, env = "PCGRL_CONFIG")]
    config: Option<PathBuf>,

    /// Number of agents
    #[arg(long)]
    agents: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of the grid that may change per episode
    #[arg(long)]
    change_percentage: Option<f64>,

    /// Hand the grid to the next agent on a negative reward
    #[arg(long)]
    negative_switch: bool,

    /// Extra option forwarded to the problem and representation (key=value)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,
}

impl EnvArgs {
    fn kinds(&self) -> Result<(ProblemKind, RepresentationKind)> {
        match &self.env {
            Some(id) => parse_env_id(id),
            None => Ok((self.problem.parse()?, self.representation.parse()?)),
        }
    }

    fn config(&self) -> Result<EnvConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                EnvConfig::from_json(&json)?
            }
            None => EnvConfig::default(),
        };

        if let Some(agents) = self.agents {
            config.n_agents = agents;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(change_percentage) = self.change_percentage {
            config.change_percentage = change_percentage;
        }
        if self.negative_switch {
            config.negative_switch = true;
        }
        for (key, value) in &self.params {
            config.params.insert(key.clone(), value.clone());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play episodes with a random policy
    Run {
        #[command(flatten)]
        env: EnvArgs,

        /// Number of episodes
        #[arg(long, default_value = "10")]
        episodes: usize,

        /// Output file for results
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a freshly generated grid and its stats
    Generate {
        #[command(flatten)]
        env: EnvArgs,
    },

    /// Draw a freshly generated grid in the terminal
    Render {
        #[command(flatten)]
        env: EnvArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            env,
            episodes,
            output,
        } => {
            let (problem, representation) = env.kinds()?;
            let runner = EpisodeRunner::new(RunnerConfig {
                problem,
                representation,
                env: env.config()?,
                episodes,
            });
            let results = runner.run()?;

            println!("\n=== Run Complete ===");
            println!("Run: {}", results.run_id);
            println!(
                "Environment: {}-{} with {} agents",
                results.config.problem, results.config.representation, results.config.n_agents
            );
            println!("Seed: {}", results.config.seed);

            println!("\nEpisodes:");
            println!(
                "  {:>4} {:>6} {:>8} {:>16} {:>8}",
                "Ep", "Iters", "Changes", "Termination", "Time"
            );
            for episode in &results.episodes {
                println!(
                    "  {:>4} {:>6} {:>8} {:>16} {:>8}",
                    episode.episode,
                    episode.iterations,
                    episode.total_changes(),
                    format!("{:?}", episode.termination),
                    format_duration(episode.duration_ms)
                );
            }

            if let Some(summary) = &results.summary {
                println!("\nSummary:");
                println!("  Solve rate: {:.1}%", summary.solve_rate * 100.0);
                println!(
                    "  Avg iterations: {:.1} (± {:.1})",
                    summary.avg_iterations, summary.avg_iterations_se
                );
                println!("  Avg changes: {:.1}", summary.avg_changes);
                for (agent, reward) in summary.avg_rewards.iter().enumerate() {
                    println!("  Agent {} avg reward: {:.2}", agent, reward);
                }
            }

            if let Some(output) = output {
                let output_path = timestamped_path(&output);
                results.save(&output_path)?;
                info!(path = %output_path.display(), "Saved results");
                println!("\nResults saved to: {}", output_path.display());
            }
        }

        Commands::Generate { env } => {
            let (problem, representation) = env.kinds()?;
            let mut env = make_env(problem, representation, env.config()?)?;
            env.reset()?;

            for row in env.representation().map().rows() {
                let line: String = row.iter().map(|&tile| tile_char(tile)).collect();
                println!("{}", line);
            }
            println!("Seed: {}", env.current_seed());
            println!("Max changes: {}", env.max_changes());
            for (stat, value) in env.stats() {
                println!("{}: {}", stat, value);
            }
        }

        Commands::Render { env } => {
            let (problem, representation) = env.kinds()?;
            let mut env = make_env(problem, representation, env.config()?)?;
            env.reset()?;
            env.render(RenderMode::Human)?;
            env.close();
        }
    }

    Ok(())
}

/// Parse `key=value`, reading the value as JSON and falling back to a string.
fn parse_param(s: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = s.split_once('=') else {
        anyhow::bail!("Invalid param: {}. Expected key=value", s);
    };
    if key.is_empty() {
        anyhow::bail!("Invalid param: {}. Key is empty", s);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Display character for a tile id.
fn tile_char(tile: usize) -> char {
    match tile {
        0 => '.',
        1 => '#',
        other => char::from_digit((other % 10) as u32, 10).unwrap_or('?'),
    }
}
