//! Closed set of problems and representations, and the env factory.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

use pcgrl_kernel::{EnvConfig, PcgrlEnv, Problem, Representation};

use crate::problems::BinaryProblem;
use crate::reps::{NarrowRepresentation, TurtleRepresentation, WideRepresentation};

/// Available problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    Binary,
}

impl ProblemKind {
    pub fn all() -> Vec<Self> {
        vec![Self::Binary]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
        }
    }

    pub fn build(&self) -> Box<dyn Problem> {
        match self {
            Self::Binary => Box::new(BinaryProblem::new()),
        }
    }
}

impl FromStr for ProblemKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            _ => bail!("Unknown problem: {}. Valid: binary", s),
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Available representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationKind {
    Narrow,
    Wide,
    Turtle,
}

impl RepresentationKind {
    pub fn all() -> Vec<Self> {
        vec![Self::Narrow, Self::Wide, Self::Turtle]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Wide => "wide",
            Self::Turtle => "turtle",
        }
    }

    pub fn build(&self, n_agents: usize) -> Box<dyn Representation> {
        match self {
            Self::Narrow => Box::new(NarrowRepresentation::new(n_agents)),
            Self::Wide => Box::new(WideRepresentation::new(n_agents)),
            Self::Turtle => Box::new(TurtleRepresentation::new(n_agents)),
        }
    }
}

impl FromStr for RepresentationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "narrow" => Ok(Self::Narrow),
            "wide" => Ok(Self::Wide),
            "turtle" => Ok(Self::Turtle),
            _ => bail!("Unknown representation: {}. Valid: narrow, wide, turtle", s),
        }
    }
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse an environment id such as `binary-narrow-v0`.
///
/// The version suffix is optional.
pub fn parse_env_id(id: &str) -> Result<(ProblemKind, RepresentationKind)> {
    let mut parts = id.split('-');
    let (Some(problem), Some(rep)) = (parts.next(), parts.next()) else {
        bail!("Invalid environment id: {}. Expected <problem>-<representation>[-v0]", id);
    };
    match parts.next() {
        None | Some("v0") => {}
        Some(other) => bail!("Unsupported environment version: {}", other),
    }
    if parts.next().is_some() {
        bail!("Invalid environment id: {}", id);
    }
    Ok((problem.parse()?, rep.parse()?))
}

/// Build an environment for the given problem and representation.
pub fn make_env(
    problem: ProblemKind,
    representation: RepresentationKind,
    config: EnvConfig,
) -> Result<PcgrlEnv> {
    let rep = representation.build(config.n_agents);
    PcgrlEnv::new(problem.build(), rep, config)
}
