//! Conversions between tile ids and tile names.
//!
//! Representations store the grid as tile ids (indices into the problem's
//! ordered tile types); problems reason about tile names.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use ndarray::Array2;

/// Grid of tile ids, `height × width`.
pub type TileMap = Array2<usize>;

/// Grid of tile names, `height × width`.
pub type NameMap = Array2<String>;

/// Express a tile-id grid as tile names.
///
/// Fails if the grid holds an id with no corresponding tile type.
pub fn to_name_map(map: &TileMap, tile_types: &[String]) -> Result<NameMap> {
    if let Some(bad) = map.iter().find(|&&id| id >= tile_types.len()) {
        bail!(
            "tile id {} out of range for {} tile types",
            bad,
            tile_types.len()
        );
    }
    Ok(map.map(|&id| tile_types[id].clone()))
}

/// Index of `name` in `tile_types`.
pub fn tile_index(name: &str, tile_types: &[String]) -> Result<usize> {
    match tile_types.iter().position(|t| t == name) {
        Some(index) => Ok(index),
        None => bail!("unknown tile type: {}", name),
    }
}

/// Turn a named tile distribution into a probability vector in tile-type
/// order, normalized to sum to 1. Missing tiles get probability 0.
pub fn int_probabilities(probs: &BTreeMap<String, f64>, tile_types: &[String]) -> Result<Vec<f64>> {
    let raw: Vec<f64> = tile_types
        .iter()
        .map(|t| probs.get(t).copied().unwrap_or(0.0).max(0.0))
        .collect();
    let total: f64 = raw.iter().sum();
    if total.is_nan() || total <= 0.0 {
        bail!("tile distribution has no positive weight");
    }
    Ok(raw.into_iter().map(|p| p / total).collect())
}

/// Count the cells of each tile name.
pub fn tile_counts(map: &NameMap) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for name in map.iter() {
        *counts.entry(name.clone()).or_insert(0) += 1;
    }
    counts
}
