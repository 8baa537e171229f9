//! Action and observation space descriptors.
//!
//! These describe shapes and bounds in the usual Gym vocabulary. They are a
//! schema for callers (policies, samplers); the controller never checks an
//! action against them, representations do their own validation.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One agent's action for a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Discrete(usize),
    MultiDiscrete(Vec<usize>),
}

impl From<usize> for Action {
    fn from(value: usize) -> Self {
        Self::Discrete(value)
    }
}

impl From<Vec<usize>> for Action {
    fn from(values: Vec<usize>) -> Self {
        Self::MultiDiscrete(values)
    }
}

/// Shape of a single agent's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionSpace {
    Discrete { n: usize },
    MultiDiscrete { nvec: Vec<usize> },
}

impl ActionSpace {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Discrete { .. } => vec![1],
            Self::MultiDiscrete { nvec } => vec![nvec.len()],
        }
    }

    /// Sample a uniformly random action. Takes `&mut impl Rng` for determinism.
    pub fn sample(&self, rng: &mut impl Rng) -> Action {
        match self {
            Self::Discrete { n } => Action::Discrete(rng.random_range(0..(*n).max(1))),
            Self::MultiDiscrete { nvec } => Action::MultiDiscrete(
                nvec.iter()
                    .map(|n| rng.random_range(0..(*n).max(1)))
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (Self::Discrete { n }, Action::Discrete(v)) => v < n,
            (Self::MultiDiscrete { nvec }, Action::MultiDiscrete(v)) => {
                v.len() == nvec.len() && v.iter().zip(nvec.iter()).all(|(a, n)| a < n)
            }
            _ => false,
        }
    }
}

/// Shape of a single agent's observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservationSpace {
    /// Bounded array of the given shape (e.g. `[height, width]` for a map).
    Box {
        low: f64,
        high: f64,
        shape: Vec<usize>,
    },
    Discrete {
        n: usize,
    },
    MultiDiscrete {
        nvec: Vec<usize>,
    },
    Dict {
        spaces: BTreeMap<String, ObservationSpace>,
    },
}

impl ObservationSpace {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Box { shape, .. } => shape.clone(),
            Self::Discrete { .. } => vec![1],
            Self::MultiDiscrete { nvec } => vec![nvec.len()],
            Self::Dict { .. } => vec![], // composite; query children
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Dict { spaces } => spaces.values().map(Self::size).sum(),
            _ => self.shape().iter().product(),
        }
    }

    /// Look up a child space of a `Dict`.
    pub fn get(&self, key: &str) -> Option<&ObservationSpace> {
        match self {
            Self::Dict { spaces } => spaces.get(key),
            _ => None,
        }
    }

    /// Insert or replace a child space, turning a non-dict space into a dict
    /// that holds the previous space under `"obs"`.
    pub fn insert(&mut self, key: impl Into<String>, space: ObservationSpace) {
        if !matches!(self, Self::Dict { .. }) {
            let previous = std::mem::replace(
                self,
                Self::Dict {
                    spaces: BTreeMap::new(),
                },
            );
            if let Self::Dict { spaces } = self {
                spaces.insert("obs".to_string(), previous);
            }
        }
        if let Self::Dict { spaces } = self {
            spaces.insert(key.into(), space);
        }
    }
}
