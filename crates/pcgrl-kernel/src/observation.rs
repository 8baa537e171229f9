//! Per-agent observations.

use std::collections::BTreeMap;

use ndarray::Array2;

/// Reserved observation key under which the controller places the heatmap.
pub const HEATMAP_KEY: &str = "heatmap";

/// A single observation entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ObsValue {
    /// A grid of tile ids, `height × width`.
    Tiles(Array2<usize>),
    /// A grid of real-valued counters, `height × width`.
    Counts(Array2<f64>),
    /// A small integer vector such as a cursor position `[x, y]`.
    Vector(Vec<usize>),
}

impl ObsValue {
    pub fn as_tiles(&self) -> Option<&Array2<usize>> {
        match self {
            Self::Tiles(tiles) => Some(tiles),
            _ => None,
        }
    }

    pub fn as_counts(&self) -> Option<&Array2<f64>> {
        match self {
            Self::Counts(counts) => Some(counts),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[usize]> {
        match self {
            Self::Vector(values) => Some(values),
            _ => None,
        }
    }
}

/// Observation for one agent: named entries produced by the representation,
/// plus the heatmap added by the controller.
pub type Observation = BTreeMap<String, ObsValue>;

/// Read the heatmap entry of an observation, if present.
pub fn heatmap_of(observation: &Observation) -> Option<&Array2<f64>> {
    observation.get(HEATMAP_KEY).and_then(ObsValue::as_counts)
}
