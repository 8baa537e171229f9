//! Change and iteration budgets for an episode.

use crate::config::DEFAULT_CHANGE_PERCENTAGE;

/// Per-episode limits derived from the grid area.
///
/// The limits persist across episodes; only reconfiguration recomputes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    change_percentage: f64,
    max_changes: u64,
    max_iterations: u64,
}

impl Budget {
    /// Build a budget for a `width × height` grid using the default percentage.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_percentage(DEFAULT_CHANGE_PERCENTAGE, width, height)
    }

    /// Build a budget for a `width × height` grid and the given percentage.
    pub fn with_percentage(change_percentage: f64, width: usize, height: usize) -> Self {
        let mut budget = Self {
            change_percentage: clamp_percentage(change_percentage),
            max_changes: 1,
            max_iterations: 1,
        };
        budget.recompute(width, height);
        budget
    }

    /// Set a new change percentage (clamped to `[0, 1]`) and recompute.
    pub fn set_change_percentage(&mut self, change_percentage: f64, width: usize, height: usize) {
        self.change_percentage = clamp_percentage(change_percentage);
        self.recompute(width, height);
    }

    /// Recompute both limits for the given grid dimensions.
    pub fn recompute(&mut self, width: usize, height: usize) {
        let area = (width * height) as u64;
        let scaled = (self.change_percentage * area as f64).floor() as u64;
        self.max_changes = scaled.max(1);
        self.max_iterations = self.max_changes * area;
    }

    pub fn change_percentage(&self) -> f64 {
        self.change_percentage
    }

    pub fn max_changes(&self) -> u64 {
        self.max_changes
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Whether the accumulated changes or iterations exhaust the budget.
    pub fn is_exhausted(&self, total_changes: u64, iteration: u64) -> bool {
        total_changes >= self.max_changes || iteration >= self.max_iterations
    }
}

// NaN is treated as 0 so a bad option cannot poison the limits.
fn clamp_percentage(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
